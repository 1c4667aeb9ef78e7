// PointSource: the one capability the discovery run depends on.
//
// The USGS, NGS, archive and mock providers all sit behind it, which lets the
// orchestrator be tested with StubSource: no network, no files.

use async_trait::async_trait;
use gcp_archive::{ArchiveError, KmzArchive};
use gcp_common::{BoundingBox, GcpCandidate, Provider, SourceError};

#[async_trait]
pub trait PointSource: Send + Sync {
    /// Provenance tag stamped on every candidate this source emits.
    fn provider(&self) -> Provider;

    /// Candidates inside `bbox`, at most `max_results` of them.
    async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError>;
}

#[async_trait]
impl PointSource for KmzArchive {
    fn provider(&self) -> Provider {
        Provider::NgsArchive
    }

    async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError> {
        // Inherent method, not a recursive trait call.
        KmzArchive::find_by_bbox(self, bbox, max_results)
            .await
            .map_err(|e| match e {
                ArchiveError::NotFound(path) => SourceError::unavailable(
                    Provider::NgsArchive,
                    format!("archive not found: {path}"),
                ),
                other => SourceError::unavailable(Provider::NgsArchive, other),
            })
    }
}
