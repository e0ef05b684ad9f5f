//! Consent page rendering for `/authorize`

use crate::auth::issuer::AuthorizeParams;

/// Escapes text for inclusion in HTML element content or a quoted
/// attribute value.
///
/// # Examples
///
/// ```
/// use ada_mcp::auth::consent::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn hidden_field(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape_html(value)
    )
}

/// Renders the consent form. Every request parameter round-trips through a
/// hidden field so the POST carries the same request back.
pub fn render(server_name: &str, params: &AuthorizeParams, error: Option<&str>) -> String {
    let hidden = [
        ("client_id", params.client_id.as_deref()),
        ("redirect_uri", params.redirect_uri.as_deref()),
        ("scope", params.scope.as_deref()),
        ("state", params.state.as_deref()),
        ("code_challenge", params.code_challenge.as_deref()),
        ("code_challenge_method", params.code_challenge_method.as_deref()),
    ]
    .iter()
    .map(|(name, value)| hidden_field(name, value.unwrap_or("")))
    .collect::<Vec<_>>()
    .join("\n      ");

    let error_block = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let client = escape_html(params.client_id.as_deref().unwrap_or(""));
    let scope = escape_html(params.scope.as_deref().unwrap_or(""));
    let server = escape_html(server_name);

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Authorize {client}</title>
    <style>
      body {{ font-family: sans-serif; max-width: 28rem; margin: 4rem auto; }}
      .error {{ color: #b00020; }}
      button {{ margin-right: 0.5rem; }}
    </style>
  </head>
  <body>
    <h1>{server}</h1>
    <p><strong>{client}</strong> is requesting access with scope <code>{scope}</code>.</p>
    {error_block}
    <form method="post" action="/authorize">
      {hidden}
      <label>Shared secret <input type="password" name="secret" autocomplete="off"></label>
      <p>
        <button type="submit" name="action" value="authorize">Authorize</button>
        <button type="submit" name="action" value="deny">Deny</button>
      </p>
    </form>
  </body>
</html>
"#
    )
}
