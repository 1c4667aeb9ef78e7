// GcpFinder: one discovery run from area to verdict.
//
// ResolvingArea → QueryPrimary → (QueryFallback?) → Filtering → Scoring →
// Accept | Reject. Every run owns its candidates, metrics and stats; nothing
// is kept on the finder between runs.

use std::sync::Arc;

use gcp_common::{BoundingBox, DiscoveryError, GcpCandidate, SourceError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::area::{AreaSpec, ResolvedArea};
use crate::pipeline::filter::{self, retain_within_cells, FilterOptions, FilterStats};
use crate::pipeline::{
    dedup_by_distance, score, DegradedSource, DiscoveryStats, DistributionMetrics, ScoringConfig,
    SourceRole,
};
use crate::traits::PointSource;

pub const DEFAULT_MIN_GCP_THRESHOLD: usize = 10;
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Per-call knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// Query the fallback when the primary yields fewer accepted points.
    pub min_gcp_threshold: usize,
    pub min_spread_score: Option<f64>,
    pub min_confidence_score: Option<f64>,
    pub filter: FilterOptions,
    /// Cap passed to each source.
    pub max_results: usize,
    /// Opt-in proximity dedup across the merged set.
    pub dedup_radius_m: Option<f64>,
    /// For cell areas, also require each point to lie in a requested cell.
    pub require_within_cells: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            min_gcp_threshold: DEFAULT_MIN_GCP_THRESHOLD,
            min_spread_score: None,
            min_confidence_score: None,
            filter: FilterOptions::default(),
            max_results: DEFAULT_MAX_RESULTS,
            dedup_radius_m: None,
            require_within_cells: false,
        }
    }
}

impl DiscoveryOptions {
    /// Quality thresholds must lie in [0, 1], distances must be finite and
    /// non-negative, and each source must be allowed at least one result.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.max_results == 0 {
            return Err(DiscoveryError::InvalidOptions(
                "max_results must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_spread_score", self.min_spread_score),
            ("min_confidence_score", self.min_confidence_score),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(DiscoveryError::InvalidOptions(format!(
                        "{name} must be within [0, 1], got {v}"
                    )));
                }
            }
        }
        for (name, value) in [
            ("min_accuracy_m", self.filter.min_accuracy_m),
            ("dedup_radius_m", self.dedup_radius_m),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(DiscoveryError::InvalidOptions(format!(
                        "{name} must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    ResolvingArea,
    QueryPrimary,
    QueryFallback,
    Filtering,
    Scoring,
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    /// Quality gate failed. Not an error: metrics are still reported.
    Rejected { reasons: Vec<String> },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Empty when rejected.
    pub accepted: Vec<GcpCandidate>,
    pub metrics: DistributionMetrics,
    pub verdict: Verdict,
    pub bbox: BoundingBox,
    pub phases: Vec<RunPhase>,
    pub stats: DiscoveryStats,
}

/// Dependency bundle for discovery runs.
#[derive(Clone, TypedBuilder)]
pub struct GcpFinder {
    primary: Arc<dyn PointSource>,
    #[builder(default, setter(strip_option))]
    fallback: Option<Arc<dyn PointSource>>,
    #[builder(default)]
    scoring: ScoringConfig,
}

impl GcpFinder {
    pub async fn discover(
        &self,
        area: &AreaSpec,
        options: &DiscoveryOptions,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        let mut stats = DiscoveryStats::new();
        options.validate().inspect_err(|e| {
            warn!(run_id = %stats.run_id, error = %e, "Rejected discovery options");
        })?;
        let mut phases = vec![RunPhase::ResolvingArea];

        let resolved = area.resolve().map_err(|e| {
            warn!(run_id = %stats.run_id, error = %e, "Invalid search area");
            DiscoveryError::from(e)
        })?;
        let bbox = resolved.bbox;
        stats.bbox = Some(bbox);
        info!(run_id = %stats.run_id, %bbox, cells = resolved.cells.len(), "Resolved search area");

        // Primary
        phases.push(RunPhase::QueryPrimary);
        let raw = self
            .query(self.primary.as_ref(), SourceRole::Primary, &bbox, options, &mut stats)
            .await?;
        stats.primary_returned = raw.len() as u32;
        let primary = self.apply_filter(raw, &resolved, options, &mut stats.filtered);
        stats.primary_accepted = primary.len() as u32;
        info!(
            provider = %self.primary.provider(),
            returned = stats.primary_returned,
            accepted = stats.primary_accepted,
            "Primary source done"
        );

        // Fallback
        let mut merged = primary;
        if merged.len() < options.min_gcp_threshold {
            match &self.fallback {
                Some(fallback) => {
                    phases.push(RunPhase::QueryFallback);
                    stats.fallback_queried = true;
                    info!(
                        accepted = merged.len(),
                        threshold = options.min_gcp_threshold,
                        provider = %fallback.provider(),
                        "Below threshold, querying fallback"
                    );
                    let raw = self
                        .query(fallback.as_ref(), SourceRole::Fallback, &bbox, options, &mut stats)
                        .await?;
                    stats.fallback_returned = raw.len() as u32;
                    let extra = self.apply_filter(raw, &resolved, options, &mut stats.filtered);
                    stats.fallback_accepted = extra.len() as u32;
                    merged.extend(extra);
                }
                None => {
                    warn!(
                        accepted = merged.len(),
                        threshold = options.min_gcp_threshold,
                        "Below threshold and no fallback source configured"
                    );
                }
            }
        }

        // Cross-source pass
        phases.push(RunPhase::Filtering);
        let mut merged = self.apply_filter(merged, &resolved, options, &mut stats.filtered);
        if let Some(radius) = options.dedup_radius_m {
            let (kept, dropped) = dedup_by_distance(merged, radius);
            stats.deduplicated = dropped;
            merged = kept;
        }
        if merged.len() < options.min_gcp_threshold {
            warn!(
                count = merged.len(),
                threshold = options.min_gcp_threshold,
                "Fewer GCPs than threshold after all sources"
            );
        }

        // Scoring
        phases.push(RunPhase::Scoring);
        let metrics = score(&merged, &bbox, &self.scoring);
        info!(run_id = %stats.run_id, %metrics, "Scored distribution");

        let reasons = quality_failures(&metrics, options);
        let (accepted, verdict) = if reasons.is_empty() {
            phases.push(RunPhase::Accept);
            (merged, Verdict::Accepted)
        } else {
            phases.push(RunPhase::Reject);
            warn!(run_id = %stats.run_id, reasons = ?reasons, "GCP set rejected");
            (Vec::new(), Verdict::Rejected { reasons })
        };
        stats.final_count = accepted.len() as u32;

        Ok(DiscoveryOutcome {
            accepted,
            metrics,
            verdict,
            bbox,
            phases,
            stats,
        })
    }

    /// Unavailable sources and a misconfigured fallback degrade to zero
    /// candidates; a misconfigured primary fails the run.
    async fn query(
        &self,
        source: &dyn PointSource,
        role: SourceRole,
        bbox: &BoundingBox,
        options: &DiscoveryOptions,
        stats: &mut DiscoveryStats,
    ) -> Result<Vec<GcpCandidate>, DiscoveryError> {
        let provider = source.provider();
        match source.find_by_bbox(bbox, options.max_results).await {
            Ok(mut candidates) => {
                candidates.truncate(options.max_results);
                Ok(candidates)
            }
            Err(err @ SourceError::Config { .. }) if role == SourceRole::Primary => {
                warn!(%provider, error = %err, "Primary source misconfigured");
                Err(DiscoveryError::DiscoveryFailed(err))
            }
            Err(err) => {
                warn!(%provider, %role, error = %err, "Source degraded, continuing with no candidates");
                stats.degraded_sources.push(DegradedSource {
                    provider,
                    role,
                    error: err,
                });
                Ok(Vec::new())
            }
        }
    }

    fn apply_filter(
        &self,
        candidates: Vec<GcpCandidate>,
        area: &ResolvedArea,
        options: &DiscoveryOptions,
        stats: &mut FilterStats,
    ) -> Vec<GcpCandidate> {
        let (kept, pass_stats) = filter::filter(candidates, &area.bbox, &options.filter);
        stats.merge(&pass_stats);
        if options.require_within_cells {
            retain_within_cells(kept, area, stats)
        } else {
            kept
        }
    }
}

fn quality_failures(metrics: &DistributionMetrics, options: &DiscoveryOptions) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(min) = options.min_spread_score {
        if metrics.spread_score < min {
            reasons.push(format!("spread score {:.3} below {min}", metrics.spread_score));
        }
    }
    if let Some(min) = options.min_confidence_score {
        if metrics.confidence_score < min {
            reasons.push(format!(
                "confidence score {:.3} below {min}",
                metrics.confidence_score
            ));
        }
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{candidate, StubSource};
    use gcp_common::Provider;

    fn bbox() -> BoundingBox {
        BoundingBox::new(40.0, -75.0, 41.0, -74.0).unwrap()
    }

    #[tokio::test]
    async fn phases_without_fallback() {
        let primary = Arc::new(StubSource::returning(
            Provider::Usgs,
            (0..12).map(|i| candidate(&format!("P{i}"), 40.5, -74.5)).collect(),
        ));
        let finder = GcpFinder::builder().primary(primary).build();
        let outcome = finder
            .discover(&AreaSpec::BoundingBox(bbox()), &DiscoveryOptions::default())
            .await
            .unwrap();
        assert_eq!(
            outcome.phases,
            vec![
                RunPhase::ResolvingArea,
                RunPhase::QueryPrimary,
                RunPhase::Filtering,
                RunPhase::Scoring,
                RunPhase::Accept
            ]
        );
        assert_eq!(outcome.accepted.len(), 12);
    }

    #[tokio::test]
    async fn misconfigured_primary_fails_the_run() {
        let primary = Arc::new(StubSource::failing(
            Provider::Usgs,
            SourceError::config(Provider::Usgs, "no token"),
        ));
        let fallback = Arc::new(StubSource::returning(Provider::Ngs, vec![candidate("N1", 40.5, -74.5)]));
        let finder = GcpFinder::builder()
            .primary(primary)
            .fallback(fallback.clone())
            .build();

        let err = finder
            .discover(&AreaSpec::BoundingBox(bbox()), &DiscoveryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::DiscoveryFailed(SourceError::Config { .. })));
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn bad_area_never_reaches_sources() {
        let primary = Arc::new(StubSource::returning(Provider::Usgs, vec![]));
        let finder = GcpFinder::builder().primary(primary.clone()).build();
        let err = finder
            .discover(&AreaSpec::Cells(vec![]), &DiscoveryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidArea(_)));
        assert_eq!(primary.call_count(), 0);
    }

    #[test]
    fn options_outside_their_ranges_are_invalid() {
        let bad = [
            DiscoveryOptions {
                max_results: 0,
                ..Default::default()
            },
            DiscoveryOptions {
                min_spread_score: Some(f64::NAN),
                ..Default::default()
            },
            DiscoveryOptions {
                min_confidence_score: Some(1.5),
                ..Default::default()
            },
            DiscoveryOptions {
                dedup_radius_m: Some(-1.0),
                ..Default::default()
            },
            DiscoveryOptions {
                filter: FilterOptions {
                    min_accuracy_m: Some(f64::INFINITY),
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        for options in bad {
            assert!(
                matches!(options.validate(), Err(DiscoveryError::InvalidOptions(_))),
                "{options:?}"
            );
        }

        let edges = DiscoveryOptions {
            min_spread_score: Some(0.0),
            min_confidence_score: Some(1.0),
            max_results: 1,
            ..Default::default()
        };
        assert!(edges.validate().is_ok());
        assert!(DiscoveryOptions::default().validate().is_ok());
    }

    #[tokio::test]
    async fn invalid_options_never_reach_sources() {
        let primary = Arc::new(StubSource::returning(Provider::Usgs, vec![]));
        let finder = GcpFinder::builder().primary(primary.clone()).build();
        let options = DiscoveryOptions {
            min_confidence_score: Some(f64::NAN),
            ..Default::default()
        };
        let err = finder
            .discover(&AreaSpec::BoundingBox(bbox()), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidOptions(_)));
        assert_eq!(primary.call_count(), 0);
    }

    #[test]
    fn quality_gate_reports_each_failed_threshold() {
        let metrics = DistributionMetrics {
            spread_score: 0.4,
            confidence_score: 0.2,
            ..Default::default()
        };
        let options = DiscoveryOptions {
            min_spread_score: Some(0.5),
            min_confidence_score: Some(0.1),
            ..Default::default()
        };
        assert_eq!(quality_failures(&metrics, &options).len(), 1);
    }
}
