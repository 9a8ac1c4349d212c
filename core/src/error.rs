use thiserror::Error;

/// Error ontology for the sniping pipeline. Transient kinds are retried by
/// the backoff runner; the rest propagate to the caller or abort the message.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("gateway transient error: {0}")]
    GatewayTransient(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("mint not found: {0}")]
    MintNotFound(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("simulation rejected: {0}")]
    SimulationRejected(String),

    #[error("not confirmed: {0}")]
    NotConfirmed(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("retries exhausted for {0}")]
    RetriesExhausted(String),

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(String),

    #[error("integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("initialization error: {0}")]
    Init(String),
}

pub type AppError = CoreError;

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigInvalid(err.to_string())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::TomlSerialization(err.to_string())
    }
}

impl CoreError {
    /// Retriable errors are rate-limited/timeout/gateway-transient indicators.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            CoreError::RateLimited(_) | CoreError::Timeout(_) | CoreError::GatewayTransient(_)
        )
    }

    /// Classify a raw provider error string the way the backoff runner needs to.
    pub fn classify_provider_message(msg: &str) -> Self {
        let lower = msg.to_ascii_lowercase();
        if lower.contains("429") || lower.contains("too many requests") {
            CoreError::RateLimited(msg.to_string())
        } else if lower.contains("timeout") || lower.contains("timed out") {
            CoreError::Timeout(msg.to_string())
        } else if lower.contains("gateway") || lower.contains("502") || lower.contains("503") {
            CoreError::GatewayTransient(msg.to_string())
        } else {
            CoreError::ProviderError(msg.to_string())
        }
    }
}
