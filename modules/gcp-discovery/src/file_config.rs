use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::finder::DiscoveryOptions;
use crate::pipeline::ScoringConfig;
use crate::sources::mock::DEFAULT_MOCK_SEED;

/// TOML-backed tunables. Credentials stay as env vars.
/// Every key is optional; absent keys leave the defaults alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub discovery: DiscoverySection,
    pub filter: FilterSection,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySection {
    pub min_gcp_threshold: Option<usize>,
    pub max_results: Option<usize>,
    pub min_spread_score: Option<f64>,
    pub min_confidence_score: Option<f64>,
    pub dedup_radius_m: Option<f64>,
    pub require_within_cells: Option<bool>,
    pub mock_seed: Option<u64>,
    /// Widen the USGS search with WRS-2 path/row queries.
    pub usgs_wrs2: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSection {
    pub min_accuracy_m: Option<f64>,
    pub require_photo_identifiable: Option<bool>,
    pub require_within_bbox: Option<bool>,
}

impl FileConfig {
    /// Overlay file values onto `options`.
    pub fn apply(&self, options: &mut DiscoveryOptions) {
        let d = &self.discovery;
        if let Some(v) = d.min_gcp_threshold {
            options.min_gcp_threshold = v;
        }
        if let Some(v) = d.max_results {
            options.max_results = v;
        }
        if d.min_spread_score.is_some() {
            options.min_spread_score = d.min_spread_score;
        }
        if d.min_confidence_score.is_some() {
            options.min_confidence_score = d.min_confidence_score;
        }
        if d.dedup_radius_m.is_some() {
            options.dedup_radius_m = d.dedup_radius_m;
        }
        if let Some(v) = d.require_within_cells {
            options.require_within_cells = v;
        }

        let f = &self.filter;
        if f.min_accuracy_m.is_some() {
            options.filter.min_accuracy_m = f.min_accuracy_m;
        }
        if let Some(v) = f.require_photo_identifiable {
            options.filter.require_photo_identifiable = v;
        }
        if let Some(v) = f.require_within_bbox {
            options.filter.require_within_bbox = v;
        }
    }

    pub fn mock_seed(&self) -> u64 {
        self.discovery.mock_seed.unwrap_or(DEFAULT_MOCK_SEED)
    }

    pub fn usgs_wrs2(&self) -> bool {
        self.discovery.usgs_wrs2.unwrap_or(false)
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
