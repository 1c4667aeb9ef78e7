use chrono::{DateTime, Utc};
use gcp_common::{BoundingBox, Provider, SourceError};
use uuid::Uuid;

use super::filter::FilterStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Primary,
    Fallback,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRole::Primary => write!(f, "primary"),
            SourceRole::Fallback => write!(f, "fallback"),
        }
    }
}

/// A source failure the run absorbed as zero candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedSource {
    pub provider: Provider,
    pub role: SourceRole,
    pub error: SourceError,
}

/// Stats from a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryStats {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub bbox: Option<BoundingBox>,
    pub primary_returned: u32,
    pub primary_accepted: u32,
    pub fallback_queried: bool,
    pub fallback_returned: u32,
    pub fallback_accepted: u32,
    pub filtered: FilterStats,
    pub deduplicated: u32,
    pub final_count: u32,
    pub degraded_sources: Vec<DegradedSource>,
}

impl DiscoveryStats {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            bbox: None,
            primary_returned: 0,
            primary_accepted: 0,
            fallback_queried: false,
            fallback_returned: 0,
            fallback_accepted: 0,
            filtered: FilterStats::default(),
            deduplicated: 0,
            final_count: 0,
            degraded_sources: Vec::new(),
        }
    }
}

impl Default for DiscoveryStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DiscoveryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== GCP Discovery Complete ===")?;
        writeln!(f, "Run:                {}", self.run_id)?;
        writeln!(f, "Started:            {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        if let Some(bbox) = &self.bbox {
            writeln!(f, "Bounding box:       {bbox}")?;
        }
        writeln!(f, "Primary returned:   {}", self.primary_returned)?;
        writeln!(f, "Primary accepted:   {}", self.primary_accepted)?;
        if self.fallback_queried {
            writeln!(f, "Fallback returned:  {}", self.fallback_returned)?;
            writeln!(f, "Fallback accepted:  {}", self.fallback_accepted)?;
        } else {
            writeln!(f, "Fallback:           not queried")?;
        }
        writeln!(f, "Filtered out:       {}", self.filtered.total())?;
        if self.filtered.total() > 0 {
            writeln!(f, "  accuracy:         {}", self.filtered.accuracy)?;
            writeln!(f, "  no accuracy:      {}", self.filtered.missing_accuracy)?;
            writeln!(f, "  not visible:      {}", self.filtered.not_photo_identifiable)?;
            writeln!(f, "  outside bbox:     {}", self.filtered.outside_bbox)?;
            writeln!(f, "  outside cells:    {}", self.filtered.outside_cells)?;
        }
        if self.deduplicated > 0 {
            writeln!(f, "Near-duplicates:    {}", self.deduplicated)?;
        }
        writeln!(f, "Final GCPs:         {}", self.final_count)?;
        if !self.degraded_sources.is_empty() {
            writeln!(f, "\nDegraded sources:")?;
            for d in &self.degraded_sources {
                writeln!(f, "  {} ({}): {}", d.provider, d.role, d.error)?;
            }
        }
        Ok(())
    }
}
