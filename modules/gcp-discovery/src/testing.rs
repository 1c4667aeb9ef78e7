// Test doubles for the discovery run.
//
// StubSource (PointSource): canned candidates or a canned error, with a call
// counter so tests can assert whether the fallback was consulted.
// Plus helpers for building candidates and evenly spread layouts.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gcp_common::{BoundingBox, GcpCandidate, Provider, SourceError};

use crate::traits::PointSource;

// ---------------------------------------------------------------------------
// StubSource
// ---------------------------------------------------------------------------

pub struct StubSource {
    provider: Provider,
    response: Result<Vec<GcpCandidate>, SourceError>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn returning(provider: Provider, candidates: Vec<GcpCandidate>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|c| GcpCandidate { source: provider, ..c })
            .collect();
        Self {
            provider,
            response: Ok(candidates),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(provider: Provider, error: SourceError) -> Self {
        Self {
            provider,
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointSource for StubSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn find_by_bbox(
        &self,
        _bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map(|c| c.into_iter().take(max_results).collect())
    }
}

// ---------------------------------------------------------------------------
// Candidate helpers
// ---------------------------------------------------------------------------

/// Photo-identifiable candidate with 0.5 m accuracy.
pub fn candidate(id: &str, lat: f64, lon: f64) -> GcpCandidate {
    GcpCandidate {
        id: id.to_string(),
        lat,
        lon,
        elevation: Some(100.0),
        accuracy: Some(0.5),
        kind: "road intersection".to_string(),
        description: String::new(),
        photo_identifiable: true,
        source: Provider::Mock,
    }
}

/// One candidate at the center of each cell of an `n × n` grid over `bbox`,
/// row-major from the south-west corner.
pub fn grid_candidates(prefix: &str, bbox: &BoundingBox, n: usize) -> Vec<GcpCandidate> {
    let mut out = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let lat = bbox.min_lat + (row as f64 + 0.5) / n as f64 * bbox.lat_span();
            let lon = bbox.min_lon + (col as f64 + 0.5) / n as f64 * bbox.lon_span();
            out.push(candidate(&format!("{prefix}_{:04}", row * n + col + 1), lat, lon));
        }
    }
    out
}

/// `n × n` candidates on a lattice that includes the bbox edges and corners.
pub fn lattice_candidates(prefix: &str, bbox: &BoundingBox, n: usize) -> Vec<GcpCandidate> {
    let step = |i: usize| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
    let mut out = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let lat = bbox.min_lat + step(row) * bbox.lat_span();
            let lon = bbox.min_lon + step(col) * bbox.lon_span();
            out.push(candidate(&format!("{prefix}_{:04}", row * n + col + 1), lat, lon));
        }
    }
    out
}

/// `count` candidates bunched in a small patch near the south-west corner.
pub fn clustered_candidates(prefix: &str, bbox: &BoundingBox, count: usize) -> Vec<GcpCandidate> {
    (0..count)
        .map(|i| {
            let step = i as f64 * 0.001;
            candidate(
                &format!("{prefix}_{:04}", i + 1),
                bbox.min_lat + bbox.lat_span() * 0.05 + step,
                bbox.min_lon + bbox.lon_span() * 0.05 + step,
            )
        })
        .collect()
}

/// Standard test area.
pub fn test_bbox() -> BoundingBox {
    BoundingBox {
        min_lat: 40.0,
        min_lon: -75.0,
        max_lat: 41.0,
        max_lon: -74.0,
    }
}
