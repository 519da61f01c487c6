//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; binaries decide where they go by
//! calling [`init_tracing`] once at startup.

use adflow_domain::LogConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Returns `false` when a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(adflow_domain::constants::DEFAULT_LOG_LEVEL));

    let registry = Registry::default().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let config = LogConfig { level: "adflow=debug".into(), json: true };
        init_tracing(&config);

        // whichever call won, a subscriber is installed by now
        assert!(!init_tracing(&LogConfig::default()));
    }

    #[test]
    fn bad_directive_falls_back_without_panicking() {
        let config = LogConfig { level: "=[not a directive".into(), json: false };
        init_tracing(&config);
    }
}
