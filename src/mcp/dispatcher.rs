//! JSON-RPC dispatch for `POST /message`
//!
//! Every outcome is a JSON-RPC envelope or an empty acknowledgement; the
//! dispatcher never fails at the transport level.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::store::CredentialStore;
use crate::mcp::types::{
    CallToolParams, CallToolResponse, Implementation, InitializeResponse, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResponse, ServerCapabilities, ToolsCapability,
    INVALID_TOKEN, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;

/// Result of handling one `/message` body.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Send this envelope back.
    Reply(JsonRpcResponse),
    /// A notification: no body.
    Acknowledged,
}

/// Routes JSON-RPC requests to the initialize handshake and the tool
/// registry.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    store: Arc<dyn CredentialStore>,
    identity: Implementation,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        store: Arc<dyn CredentialStore>,
        identity: Implementation,
    ) -> Self {
        Self {
            registry,
            store,
            identity,
        }
    }

    /// Handles a raw request body.
    ///
    /// `credential` is the bearer value from the `Authorization` header, if
    /// any. Only `tools/call` looks at it.
    pub async fn handle(&self, body: &[u8], credential: Option<&str>) -> Dispatch {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected unparseable message");
                return Dispatch::Reply(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        if !value.is_object() {
            return Dispatch::Reply(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request(),
            ));
        }

        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(_) => {
                return match id {
                    None => Dispatch::Acknowledged,
                    Some(id) => Dispatch::Reply(JsonRpcResponse::failure(
                        id,
                        JsonRpcError::invalid_request(),
                    )),
                }
            }
        };

        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Acknowledged notification");
            return Dispatch::Acknowledged;
        };

        tracing::debug!(method = %request.method, id = %id, "Dispatching request");

        let outcome = match request.method.as_str() {
            METHOD_INITIALIZE => Ok(self.initialize()),
            METHOD_TOOLS_LIST => Ok(self.list_tools()),
            METHOD_TOOLS_CALL => self.call_tool(request.params, credential).await,
            // Only meaningful as a notification; with an id it gets an empty result.
            METHOD_INITIALIZED => Ok(Value::Object(Default::default())),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Dispatch::Reply(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::debug!(method = %request.method, code = error.code, "Request failed");
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn initialize(&self) -> Value {
        let response = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(true),
                }),
                resources: Some(Value::Object(Default::default())),
                prompts: Some(Value::Object(Default::default())),
            },
            server_info: self.identity.clone(),
        };
        to_value(&response)
    }

    fn list_tools(&self) -> Value {
        to_value(&ListToolsResponse {
            tools: self.registry.list(),
        })
    }

    async fn call_tool(
        &self,
        params: Option<Value>,
        credential: Option<&str>,
    ) -> Result<Value, JsonRpcError> {
        if let Some(token) = credential {
            if let Err(e) = self.store.lookup_token(token).await.into_result() {
                tracing::info!(reason = %e.description(), "Rejected tools/call with invalid token");
                let mut error = JsonRpcError::new(INVALID_TOKEN, e.error_code());
                error.data = Some(e.to_body());
                return Err(error);
            }
        }

        let params: CallToolParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::unknown_tool(&params.name))?;

        let args = params
            .arguments
            .unwrap_or_else(|| Value::Object(Default::default()));

        let response = match tool.execute(args).await {
            Ok(result) => CallToolResponse::text(result.to_string()),
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "Tool execution failed");
                CallToolResponse::error(e.to_string())
            }
        };
        Ok(to_value(&response))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    // The wire types only contain strings, maps and JSON values.
    serde_json::to_value(value).unwrap_or(Value::Null)
}
