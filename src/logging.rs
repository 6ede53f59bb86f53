//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's call. [`init_tracing`] is what the bundled binary uses.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"`.
    pub default_level: String,
    /// Raise the default filter to `debug` for this crate.
    pub elevated: bool,
    /// Include the event target in each line.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".into(),
            elevated: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Filter directive applied when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        if self.elevated {
            format!("{},cosmetica_auth=debug", self.default_level)
        } else {
            self.default_level.clone()
        }
    }
}

/// Install a compact fmt subscriber. `RUST_LOG` wins over `config`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(config: LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .compact()
        .finish()
        .try_init()
        .is_ok()
}
