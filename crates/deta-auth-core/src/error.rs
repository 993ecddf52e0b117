// Store errors — the only failure type that crosses the adapter boundary.
//
// Absence of a document is never an error: lookups return `Ok(None)` and
// fetch-then-act sequences become no-ops. Everything here is a store-level
// fault and is handed to the caller unchanged, without retries.

/// Errors raised by a document store or while moving documents across it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (DNS, TLS, connection reset, timeout).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected the request.
    #[error("Request rejected ({status}): {message}")]
    Request { status: u16, message: String },

    /// A partial update targeted a key that does not exist.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A document could not be encoded for, or decoded from, the store.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    /// Whether this error only reports that an update target was missing.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for store and adapter operations.
pub type AdapterResult<T> = std::result::Result<T, StoreError>;
