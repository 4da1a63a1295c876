//! Log output.
//!
//! Library crates only emit `tracing` events. Binaries call [`init`] once to
//! print them to stderr, filtered by the `HUB_LOG` environment variable
//! (`EnvFilter` syntax, e.g. `HUB_LOG=hub_dispatch=debug,info`).

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HUB_LOG";
pub const DEFAULT_FILTER: &str = "info";

/// The filter from `HUB_LOG`, or `default` when unset or unparsable.
pub fn filter(default: &str) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(&spec).unwrap_or_else(|e| {
            eprintln!("ignoring invalid {LOG_ENV}={spec}: {e}");
            EnvFilter::new(default)
        }),
        _ => EnvFilter::new(default),
    }
}

/// Installs the global subscriber. Returns `false` when one is already set.
pub fn init(default: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_filter_uses_env() {
        std::env::set_var(LOG_ENV, "hub_dispatch=debug");
        assert_eq!(filter(DEFAULT_FILTER).to_string(), "hub_dispatch=debug");
        std::env::remove_var(LOG_ENV);
    }

    #[test]
    #[serial]
    fn test_filter_falls_back_to_default() {
        std::env::remove_var(LOG_ENV);
        assert_eq!(filter("warn").to_string(), "warn");

        std::env::set_var(LOG_ENV, "   ");
        assert_eq!(filter("warn").to_string(), "warn");

        std::env::set_var(LOG_ENV, "hub=loudly");
        assert_eq!(filter("warn").to_string(), "warn");
        std::env::remove_var(LOG_ENV);
    }

    #[test]
    #[serial]
    fn test_init_only_once() {
        init(DEFAULT_FILTER);
        assert!(!init(DEFAULT_FILTER));
    }
}
