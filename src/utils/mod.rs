//! Utilities: logging setup (level from -v/-q, RUST_LOG override) and
//! small env helpers shared by main and the subcommands.
//!
//! Key items:
//!   derive_level / init_logging
//!   env_nonempty

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Map CLI verbosity flags to a level. Quiet wins over any -v count.
pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Build the filter: RUST_LOG when set, otherwise the derived level.
pub fn log_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber. Logs go to stderr; stdout is reserved for
/// MCP JSON-RPC and machine output.
pub fn init_logging(level: LevelFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read an environment variable, treating blank values as unset.
pub fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(derive_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(derive_level(0, false), LevelFilter::INFO);
        assert_eq!(derive_level(1, false), LevelFilter::DEBUG);
        assert_eq!(derive_level(2, false), LevelFilter::TRACE);
        assert_eq!(derive_level(9, false), LevelFilter::TRACE);
    }

    #[test]
    fn blank_env_is_unset() {
        assert_eq!(env_nonempty("AZMCP_SURELY_UNSET_VARIABLE"), None);
    }
}
