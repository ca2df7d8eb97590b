//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Applications embedding the
//! engine may call [`init`] once to print them.

use crate::config::Config;
use tracing_subscriber::EnvFilter;

/// Filter directive for the configured verbosity.
///
/// 0 = warn, 1 = info, 2+ = debug. Engine step diagnostics
/// (`assetmill::debug`) are added at debug level when `engine.debug_log` is
/// set, independent of the general verbosity.
pub fn filter_directive(config: &Config) -> String {
    let base = match config.logging.verbose {
        0 => "assetmill=warn",
        1 => "assetmill=info",
        _ => "assetmill=debug",
    };

    if config.engine.debug_log {
        format!("{},assetmill::debug=debug", base)
    } else {
        base.to_string()
    }
}

/// Install a global fmt subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init(config: &Config) -> bool {
    let filter = EnvFilter::new(filter_directive(config));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();

    let result = if config.logging.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_follows_verbosity() {
        let mut config = Config::default();
        assert_eq!(filter_directive(&config), "assetmill=warn");
        config.logging.verbose = 1;
        assert_eq!(filter_directive(&config), "assetmill=info");
        config.logging.verbose = 5;
        assert_eq!(filter_directive(&config), "assetmill=debug");
    }

    #[test]
    fn debug_log_enables_engine_target() {
        let mut config = Config::default();
        config.engine.debug_log = true;
        assert_eq!(
            filter_directive(&config),
            "assetmill=warn,assetmill::debug=debug"
        );
    }

    #[test]
    fn second_init_is_not_an_error() {
        let config = Config::default();
        init(&config);
        assert!(!init(&config));
    }
}
