pub mod dedup;
pub mod filter;
pub mod scoring;
pub mod stats;

pub use dedup::dedup_by_distance;
pub use filter::{filter, FilterOptions, FilterStats};
pub use scoring::{score, DistributionMetrics, ScoringConfig};
pub use stats::{DegradedSource, DiscoveryStats, SourceRole};
