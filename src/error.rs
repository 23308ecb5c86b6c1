use thiserror::Error;

/// Classification of a failed transfer, coarse enough for a caller to decide
/// whether to retry, re-authenticate or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkFailure,
    AuthFailure,
    NotFound,
    ServerRejected,
    SerializationFailure,
    InvalidArgument,
    Config,
    Io,
}

/// Main error type for blobrelay operations
#[derive(Debug, Error)]
pub enum BlobRelayError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authorization failed: {0}")]
    AuthError(String),

    #[error("Blob not found: {container}/{name}")]
    NotFound { container: String, name: String },

    #[error("Request rejected by server (HTTP {status}): {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BlobRelayError {
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found<S: Into<String>>(container: S, name: S) -> Self {
        Self::NotFound {
            container: container.into(),
            name: name.into(),
        }
    }

    pub fn server_rejected<S: Into<String>>(status: u16, message: S) -> Self {
        Self::ServerRejected {
            status,
            message: message.into(),
        }
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkError(_) => ErrorKind::NetworkFailure,
            Self::AuthError(_) => ErrorKind::AuthFailure,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ServerRejected { .. } => ErrorKind::ServerRejected,
            Self::SerializationError(_) => ErrorKind::SerializationFailure,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::ConfigError(_) => ErrorKind::Config,
            Self::IoError(_) => ErrorKind::Io,
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    ///
    /// This is only a hint; nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_) => true,
            Self::ServerRejected { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Result type alias for blobrelay operations
pub type Result<T> = std::result::Result<T, BlobRelayError>;

impl From<serde_json::Error> for BlobRelayError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

impl From<url::ParseError> for BlobRelayError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidArgument(format!("invalid URL: {error}"))
    }
}
