use thiserror::Error;

pub type Result<T> = std::result::Result<T, UsgsError>;

#[derive(Debug, Error)]
pub enum UsgsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Login returned no API key")]
    NoApiKey,
}

impl From<reqwest::Error> for UsgsError {
    fn from(err: reqwest::Error) -> Self {
        UsgsError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for UsgsError {
    fn from(err: serde_json::Error) -> Self {
        UsgsError::Parse(err.to_string())
    }
}
