pub mod area;
pub mod file_config;
pub mod finder;
pub mod manifest;
pub mod pipeline;
pub mod sources;
pub mod traits;
pub mod wrs2;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use area::{resolve_cells, AreaSpec, ResolvedArea};
pub use finder::{DiscoveryOptions, DiscoveryOutcome, GcpFinder, RunPhase, Verdict};
pub use pipeline::{DiscoveryStats, DistributionMetrics, FilterOptions, ScoringConfig};
pub use traits::PointSource;
