use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiItError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    AuthError(String),

    /// Graph transport or HTTP failure. `status` is `None` for network, timeout
    /// and body-decoding failures.
    #[error("{message}")]
    GraphApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    GenerationError(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AiItError>;

pub use AiItError as Error;

/// How a failed Graph call is presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    Forbidden,
    NotFound,
    Other,
}

impl AiItError {
    pub fn graph(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::GraphApiError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by a Graph failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::GraphApiError { status, .. } => *status,
            _ => None,
        }
    }

    pub fn kind(&self) -> GraphErrorKind {
        match self.status_code() {
            Some(403) => GraphErrorKind::Forbidden,
            Some(404) => GraphErrorKind::NotFound,
            _ => GraphErrorKind::Other,
        }
    }
}
