// KmzArchive: a local photo-control archive served from memory.
// The KMZ is parsed on first use; concurrent first callers wait on the same
// load, later callers share the immutable snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gcp_common::{BoundingBox, GcpCandidate};
use tokio::sync::OnceCell;

use crate::error::{ArchiveError, Result};
use crate::kmz::parse_kmz_file;

pub struct KmzArchive {
    path: PathBuf,
    records: OnceCell<Arc<Vec<GcpCandidate>>>,
}

impl KmzArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the archive has been parsed successfully.
    pub fn is_loaded(&self) -> bool {
        self.records.initialized()
    }

    /// All records, loading the archive if needed. A failed load leaves the
    /// cache empty so the next call retries.
    pub async fn records(&self) -> Result<Arc<Vec<GcpCandidate>>> {
        let records = self
            .records
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let parsed = tokio::task::spawn_blocking(move || parse_kmz_file(&path))
                    .await
                    .map_err(|e| ArchiveError::Load(e.to_string()))??;
                Ok::<_, ArchiveError>(Arc::new(parsed))
            })
            .await?;
        Ok(records.clone())
    }

    /// Records inside `bbox` (inclusive), in archive order, at most `max_results`.
    pub async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>> {
        let records = self.records().await?;
        Ok(records
            .iter()
            .filter(|r| bbox.contains(r.lat, r.lon))
            .take(max_results)
            .cloned()
            .collect())
    }
}
