// Adapter and client configuration.

use std::time::Duration;

use deta_auth_core::error::StoreError;

/// Names of the four collections the adapter uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub users: String,
    pub accounts: String,
    pub sessions: String,
    pub verification_tokens: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            accounts: "accounts".to_string(),
            sessions: "sessions".to_string(),
            verification_tokens: "verificationTokens".to_string(),
        }
    }
}

impl CollectionNames {
    /// Default names with `prefix` prepended, e.g. `"staging_"` → `"staging_users"`.
    pub fn prefixed(prefix: &str) -> Self {
        let defaults = Self::default();
        Self {
            users: format!("{prefix}{}", defaults.users),
            accounts: format!("{prefix}{}", defaults.accounts),
            sessions: format!("{prefix}{}", defaults.sessions),
            verification_tokens: format!("{prefix}{}", defaults.verification_tokens),
        }
    }
}

/// Configuration for `DetaAdapter`.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Collection names.
    pub collections: CollectionNames,

    /// `limit` sent with every scan round-trip of a first-match lookup.
    ///
    /// Default: 1
    pub scan_page_size: usize,

    /// Log every store round-trip at debug level.
    ///
    /// Default: false
    pub debug_logs: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            collections: CollectionNames::default(),
            scan_page_size: 1,
            debug_logs: false,
        }
    }
}

impl AdapterConfig {
    pub fn with_collections(mut self, collections: CollectionNames) -> Self {
        self.collections = collections;
        self
    }

    /// Page sizes below 1 are raised to 1.
    pub fn with_scan_page_size(mut self, size: usize) -> Self {
        self.scan_page_size = size.max(1);
        self
    }

    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }
}

// ─── Hosted Store ────────────────────────────────────────────────

/// Default Base API endpoint.
pub const DEFAULT_BASE_HOST: &str = "https://database.deta.sh/v1";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the hosted Base API.
#[derive(Clone)]
pub struct DetaConfig {
    pub project_key: String,
    pub project_id: String,
    pub host: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for DetaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetaConfig")
            .field("project_id", &self.project_id)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DetaConfig {
    /// Build from a project key of the form `<project id>_<secret>`.
    pub fn new(project_key: impl Into<String>) -> Result<Self, StoreError> {
        let project_key = project_key.into();
        let project_id = match project_key.split_once('_') {
            Some((id, secret)) if !id.is_empty() && !secret.is_empty() => id.to_string(),
            _ => {
                return Err(StoreError::Config(
                    "project key must look like <project id>_<secret>".to_string(),
                ))
            }
        };

        Ok(Self {
            project_key,
            project_id,
            host: DEFAULT_BASE_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `DETA_PROJECT_KEY`, `DETA_BASE_HOST` and `DETA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let key = lookup("DETA_PROJECT_KEY")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StoreError::Config("DETA_PROJECT_KEY is not set".to_string()))?;
        let mut config = Self::new(key)?;

        if let Some(host) = lookup("DETA_BASE_HOST").filter(|h| !h.is_empty()) {
            config = config.with_host(host);
        }
        if let Some(raw) = lookup("DETA_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                StoreError::Config(format!("DETA_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Root URL of one collection.
    pub fn base_url(&self, base_name: &str) -> String {
        format!("{}/{}/{}", self.host, self.project_id, base_name)
    }
}
