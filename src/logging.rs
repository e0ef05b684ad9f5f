//! Logging setup
//!
//! Installs a `tracing` subscriber writing to stderr, either human-readable
//! or as JSON lines. `RUST_LOG` wins over the built-in default directive.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
///
/// # Examples
///
/// ```
/// use ada_mcp::logging::default_directive;
///
/// assert_eq!(default_directive(false), "ada_mcp=info");
/// assert_eq!(default_directive(true), "ada_mcp=debug");
/// ```
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "ada_mcp=debug"
    } else {
        "ada_mcp=info"
    }
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `verbose` - Raise the default level to `debug`
/// * `json` - Emit JSON lines instead of human-readable output
///
/// # Errors
///
/// Returns error if the filter directive is invalid or a subscriber is
/// already installed.
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(EnvFilter::try_new(default_directive(false)).is_ok());
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
