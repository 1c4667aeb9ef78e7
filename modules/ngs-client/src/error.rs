use thiserror::Error;

pub type Result<T> = std::result::Result<T, NgsError>;

#[derive(Debug, Error)]
pub enum NgsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for NgsError {
    fn from(err: reqwest::Error) -> Self {
        NgsError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NgsError {
    fn from(err: serde_json::Error) -> Self {
        NgsError::Parse(err.to_string())
    }
}
