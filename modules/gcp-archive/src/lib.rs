pub mod archive;
pub mod error;
pub mod kmz;

pub use archive::KmzArchive;
pub use error::{ArchiveError, Result};
pub use kmz::{parse_kml, parse_kmz_file, DEFAULT_ARCHIVE_ACCURACY_M};
