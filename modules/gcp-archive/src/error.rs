/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive file not found: {0}")]
    NotFound(String),

    #[error("No KML document inside archive: {0}")]
    NoKml(String),

    #[error("Invalid KMZ archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("KML parse error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive load task failed: {0}")]
    Load(String),
}
