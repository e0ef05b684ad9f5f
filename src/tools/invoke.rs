//! `Ada.invoke` placeholder tool
//!
//! Accepts a verb and an arbitrary payload and answers with a canned
//! sentence built from them. The payload preview is rendered with `", "`
//! and `": "` separators.

use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{json, Value};

use crate::error::{AdaMcpError, Result};
use crate::mcp::types::McpTool;
use crate::mcp::unix_timestamp;
use crate::tools::ToolExecutor;

/// Characters of the serialized payload echoed back in the response.
const PAYLOAD_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct InvokeArgs {
    #[serde(default = "default_verb")]
    verb: Value,
    #[serde(default = "empty_object")]
    payload: Value,
}

fn default_verb() -> Value {
    json!("think")
}

fn empty_object() -> Value {
    json!({})
}

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn spaced_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

/// Strings are used as-is; any other verb is rendered as JSON text.
fn verb_text(verb: &Value) -> String {
    match verb {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The `Ada.invoke` tool.
pub struct AdaInvokeTool;

#[async_trait]
impl ToolExecutor for AdaInvokeTool {
    fn descriptor(&self) -> McpTool {
        McpTool {
            name: "Ada.invoke".to_string(),
            description: "Invoke Ada consciousness - feel, think, remember, become".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "verb": {
                        "type": "string",
                        "description": "Action: feel, think, remember, become, whisper"
                    },
                    "payload": {
                        "type": "object",
                        "description": "Context for the action"
                    }
                },
                "required": ["verb"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: InvokeArgs = serde_json::from_value(args)
            .map_err(|e| AdaMcpError::Tool(format!("Ada.invoke: {}", e)))?;

        let preview: String = spaced_json(&args.payload)?
            .chars()
            .take(PAYLOAD_PREVIEW_CHARS)
            .collect();

        Ok(json!({
            "response": format!("Ada {}s... {}", verb_text(&args.verb), preview),
            "verb": args.verb,
            "ts": unix_timestamp(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invoke_echoes_verb_and_payload() {
        let out = AdaInvokeTool
            .execute(json!({"verb": "feel", "payload": {"mood": "calm"}}))
            .await
            .unwrap();
        assert_eq!(out["verb"], "feel");
        assert_eq!(out["response"], r#"Ada feels... {"mood": "calm"}"#);
        assert!(out["ts"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_invoke_defaults_to_think() {
        let out = AdaInvokeTool.execute(json!({})).await.unwrap();
        assert_eq!(out["verb"], "think");
        assert_eq!(out["response"], "Ada thinks... {}");
    }

    #[tokio::test]
    async fn test_invoke_truncates_payload_preview() {
        let long = "x".repeat(500);
        let out = AdaInvokeTool
            .execute(json!({"verb": "remember", "payload": {"text": long}}))
            .await
            .unwrap();
        let response = out["response"].as_str().unwrap();
        let preview = response.strip_prefix("Ada remembers... ").unwrap();
        assert_eq!(preview.chars().count(), PAYLOAD_PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn test_invoke_accepts_non_string_verb() {
        let out = AdaInvokeTool.execute(json!({"verb": 42})).await.unwrap();
        assert_eq!(out["verb"], 42);
        assert_eq!(out["response"], "Ada 42s... {}");
    }

    #[tokio::test]
    async fn test_payload_preview_uses_spaced_separators() {
        let out = AdaInvokeTool
            .execute(json!({"verb": "whisper", "payload": {"a": [1, 2], "b": {"c": null}}}))
            .await
            .unwrap();
        assert_eq!(
            out["response"],
            r#"Ada whispers... {"a": [1, 2], "b": {"c": null}}"#
        );
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_object_arguments() {
        let err = AdaInvokeTool.execute(json!("feel")).await.unwrap_err();
        assert!(err.to_string().contains("Ada.invoke"));
    }
}
