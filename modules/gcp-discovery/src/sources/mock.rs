use async_trait::async_trait;
use gcp_common::{BoundingBox, GcpCandidate, Provider, SourceError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::traits::PointSource;

pub const DEFAULT_MOCK_SEED: u64 = 42;
pub const DEFAULT_MOCK_COUNT: usize = 25;

const MOCK_TYPES: &[&str] = &[
    "road intersection",
    "building corner",
    "landmark",
    "structure",
    "marker",
];

/// Synthetic points, uniformly placed in the query box. Same seed and box,
/// same points. Never wired in unless asked for.
#[derive(Debug, Clone)]
pub struct MockSource {
    provider: Provider,
    seed: u64,
    count: usize,
    accuracy_range: (f64, f64),
}

impl MockSource {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            seed: DEFAULT_MOCK_SEED,
            count: DEFAULT_MOCK_COUNT,
            accuracy_range: (0.1, 2.0),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Accuracy bounds in meters; swapped if given in reverse.
    pub fn with_accuracy_range(mut self, min: f64, max: f64) -> Self {
        self.accuracy_range = if min <= max { (min, max) } else { (max, min) };
        self
    }

    pub fn generate(&self, bbox: &BoundingBox, max_results: usize) -> Vec<GcpCandidate> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (acc_min, acc_max) = self.accuracy_range;

        (1..=self.count.min(max_results))
            .map(|n| {
                let kind = MOCK_TYPES[rng.random_range(0..MOCK_TYPES.len())];
                GcpCandidate {
                    id: format!("{}_GCP_{n:04}", self.provider.id_prefix()),
                    lat: rng.random_range(bbox.min_lat..=bbox.max_lat),
                    lon: rng.random_range(bbox.min_lon..=bbox.max_lon),
                    elevation: Some(rng.random_range(0.0..=500.0)),
                    accuracy: Some(rng.random_range(acc_min..=acc_max)),
                    kind: kind.to_string(),
                    description: format!("Synthetic {kind}"),
                    photo_identifiable: true,
                    source: self.provider,
                }
            })
            .collect()
    }
}

#[async_trait]
impl PointSource for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError> {
        warn!(
            provider = %self.provider,
            seed = self.seed,
            "MOCK SOURCE IN USE: generated points are synthetic, not surveyed"
        );
        Ok(self.generate(bbox, max_results))
    }
}
