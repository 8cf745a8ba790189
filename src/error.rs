/// Error type shared by startup code and collaborator implementations
#[derive(thiserror::Error, Debug)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out: {0}")]
    Timeout(&'static str),

    #[error("Payload of {0} bytes exceeds the message bound")]
    PayloadTooLarge(usize),

    #[error("Network provisioning failed: {0}")]
    Provisioning(String),
}

impl From<tokio::time::error::Elapsed> for NodeError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        NodeError::Timeout("operation deadline elapsed")
    }
}

pub type Result<T> = core::result::Result<T, NodeError>;
