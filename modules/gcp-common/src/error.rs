use thiserror::Error;

/// Input validation failures while building a search area.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AreaError {
    #[error("Invalid H3 cell: {0}")]
    InvalidCell(String),

    #[error("At least one H3 cell is required")]
    EmptyInput,

    #[error("Invalid bounding box: {0}")]
    InvalidBounds(String),
}

/// Failures raised by a point source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Transient: network down, bad response, missing archive file.
    #[error("Source {provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    /// Missing credentials or settings. Fatal for that source only.
    #[error("Source {provider} misconfigured: {reason}")]
    Config { provider: String, reason: String },
}

impl SourceError {
    pub fn unavailable(provider: impl ToString, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn config(provider: impl ToString, reason: impl ToString) -> Self {
        SourceError::Config {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that abort a discovery run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Invalid area: {0}")]
    InvalidArea(String),

    #[error("Invalid discovery options: {0}")]
    InvalidOptions(String),

    #[error("Discovery failed: {0}")]
    DiscoveryFailed(#[from] SourceError),
}

impl From<AreaError> for DiscoveryError {
    fn from(err: AreaError) -> Self {
        DiscoveryError::InvalidArea(err.to_string())
    }
}
