use async_trait::async_trait;
use gcp_common::{photo_identifiable_hint, BoundingBox, Config, GcpCandidate, Provider, SourceError};
use ngs_client::{NgsClient, SurveyMark};
use tracing::info;

use crate::traits::PointSource;

/// Fallback provider: NOAA NGS survey marks.
pub struct NgsSource {
    client: NgsClient,
}

impl NgsSource {
    pub fn new(client: NgsClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = match &config.ngs_api_url {
            Some(url) => NgsClient::new().with_base_url(url.clone()),
            None => NgsClient::new(),
        };
        Self::new(client)
    }
}

#[async_trait]
impl PointSource for NgsSource {
    fn provider(&self) -> Provider {
        Provider::Ngs
    }

    async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError> {
        let marks = self
            .client
            .marks_in_bounds(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon)
            .await
            .map_err(|e| SourceError::unavailable(Provider::Ngs, e))?;

        let candidates: Vec<GcpCandidate> =
            marks.iter().map(mark_to_candidate).take(max_results).collect();
        info!(marks = marks.len(), count = candidates.len(), "NGS search complete");
        Ok(candidates)
    }
}

pub fn mark_to_candidate(mark: &SurveyMark) -> GcpCandidate {
    let kind = mark
        .marker_type
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "survey_mark".to_string());
    let description = mark
        .description
        .clone()
        .or_else(|| mark.name.clone())
        .unwrap_or_default();

    GcpCandidate {
        id: mark.pid.clone(),
        lat: mark.lat,
        lon: mark.lon,
        elevation: mark.elevation(),
        accuracy: mark.horiz_accuracy.filter(|a| *a >= 0.0),
        photo_identifiable: photo_identifiable_hint(&kind, &description),
        source: Provider::Ngs,
        kind,
        description,
    }
}
