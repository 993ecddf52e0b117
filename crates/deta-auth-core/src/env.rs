// Environment detection and logger setup.

use std::sync::OnceLock;

/// Cached environment mode.
static ENV_MODE: OnceLock<EnvMode> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Production,
    Development,
    Test,
}

impl EnvMode {
    fn from_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" | "testing" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Detect the current environment mode from environment variables.
/// Checks `DETA_AUTH_ENV` then `RUST_ENV`.
pub fn detect_env_mode() -> EnvMode {
    *ENV_MODE.get_or_init(|| {
        let env_val = std::env::var("DETA_AUTH_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        EnvMode::from_value(&env_val)
    })
}

pub fn is_production() -> bool {
    detect_env_mode() == EnvMode::Production
}

/// Default `tracing` filter directive for the current mode.
pub fn default_filter() -> &'static str {
    if is_production() {
        "deta_auth=info,deta_auth_memory=info"
    } else {
        "deta_auth=debug,deta_auth_memory=debug"
    }
}

/// Initialize the `tracing` subscriber. `RUST_LOG` wins over the mode default.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
