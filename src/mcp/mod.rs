//! MCP over SSE: wire types, the JSON-RPC dispatcher and the event-stream
//! session manager.

pub mod dispatcher;
pub mod session;
pub mod types;

pub use dispatcher::{Dispatch, Dispatcher};
pub use session::{ConnectionContext, ServerEvent, SessionManager};

/// Current wall-clock time as fractional Unix seconds.
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_timestamp_is_recent() {
        let ts = unix_timestamp();
        let secs = chrono::Utc::now().timestamp() as f64;
        assert!((secs - ts).abs() < 5.0);
    }
}
