use std::collections::HashSet;

use async_trait::async_trait;
use gcp_common::{BoundingBox, Config, GcpCandidate, Provider, SourceError};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use usgs_client::{
    SceneFilter, SceneResult, SceneSearchRequest, SpatialFilter, UsgsClient, UsgsError,
};

use crate::traits::PointSource;
use crate::wrs2::covering_path_rows;

const ACCURACY_FIELDS: &[&str] = &["RMSE", "Accuracy", "Horizontal Accuracy", "Geometric RMSE"];
const TYPE_FIELDS: &[&str] = &["Feature Type", "Control Type"];

/// Primary provider backed by the USGS M2M scene search.
pub struct UsgsSource {
    client: Option<UsgsClient>,
    dataset: String,
    wrs2: bool,
    api_key: OnceCell<String>,
}

impl UsgsSource {
    /// Builds a source even without credentials; queries then fail with
    /// `SourceError::Config`.
    pub fn from_config(config: &Config) -> Self {
        let client = config.has_usgs_credentials().then(|| {
            UsgsClient::new(
                config.usgs_username.clone().unwrap_or_default(),
                config.usgs_application_token.clone().unwrap_or_default(),
            )
        });
        Self {
            client,
            dataset: config.usgs_dataset.clone(),
            wrs2: false,
            api_key: OnceCell::new(),
        }
    }

    pub fn with_client(client: UsgsClient, dataset: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            dataset: dataset.into(),
            wrs2: false,
            api_key: OnceCell::new(),
        }
    }

    /// Also search the WRS-2 path/rows around the area before the
    /// rectangle search.
    pub fn with_wrs2(mut self, enabled: bool) -> Self {
        self.wrs2 = enabled;
        self
    }

    async fn api_key(&self, client: &UsgsClient) -> Result<&str, SourceError> {
        let key = self
            .api_key
            .get_or_try_init(|| async { client.login_token().await.map_err(login_error) })
            .await?;
        Ok(key.as_str())
    }

    async fn search(
        &self,
        client: &UsgsClient,
        api_key: &str,
        spatial_filter: SpatialFilter,
        max_results: usize,
    ) -> Result<Vec<SceneResult>, UsgsError> {
        let request = SceneSearchRequest {
            dataset_name: self.dataset.clone(),
            scene_filter: SceneFilter { spatial_filter },
            max_results,
            metadata_type: "full".to_string(),
        };
        Ok(client.scene_search(api_key, &request).await?.results)
    }
}

/// Rejected credentials are a configuration problem; anything else on the
/// login call is treated as the service being unreachable.
fn login_error(err: UsgsError) -> SourceError {
    match err {
        UsgsError::Api { .. } | UsgsError::NoApiKey => {
            SourceError::config(Provider::Usgs, format!("login rejected: {err}"))
        }
        other => SourceError::unavailable(Provider::Usgs, format!("login failed: {other}")),
    }
}

#[async_trait]
impl PointSource for UsgsSource {
    fn provider(&self) -> Provider {
        Provider::Usgs
    }

    async fn find_by_bbox(
        &self,
        bbox: &BoundingBox,
        max_results: usize,
    ) -> Result<Vec<GcpCandidate>, SourceError> {
        let Some(client) = &self.client else {
            return Err(SourceError::config(
                Provider::Usgs,
                "USGS_USERNAME and USGS_APPLICATION_TOKEN must both be set",
            ));
        };

        let api_key = self.api_key(client).await?;

        let mut scenes = Vec::new();
        if self.wrs2 {
            let tiles = covering_path_rows(bbox);
            info!(tiles = tiles.len(), "Searching USGS by WRS-2 path/row");
            for tile in tiles {
                match self
                    .search(client, api_key, SpatialFilter::wrs2(tile.path, tile.row), max_results)
                    .await
                {
                    Ok(found) => scenes.extend(found),
                    Err(e) => warn!(%tile, error = %e, "WRS-2 search failed, skipping tile"),
                }
            }
        }

        let rect = SpatialFilter::mbr(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon);
        let found = self
            .search(client, api_key, rect, max_results)
            .await
            .map_err(|e| SourceError::unavailable(Provider::Usgs, e))?;
        scenes.extend(found);

        let candidates = scenes_to_candidates(&scenes, max_results);
        if candidates.len() < scenes.len() {
            debug!(
                scenes = scenes.len(),
                points = candidates.len(),
                "Skipped USGS scenes without point coverage or seen twice"
            );
        }
        info!(dataset = %self.dataset, count = candidates.len(), "USGS search complete");
        Ok(candidates)
    }
}

/// Point scenes in order, first occurrence of each entity id, capped.
pub fn scenes_to_candidates(scenes: &[SceneResult], max_results: usize) -> Vec<GcpCandidate> {
    let mut seen = HashSet::new();
    scenes
        .iter()
        .filter_map(scene_to_candidate)
        .filter(|c| seen.insert(c.id.clone()))
        .take(max_results)
        .collect()
}

/// A scene becomes a candidate only when its footprint is a single point.
pub fn scene_to_candidate(scene: &SceneResult) -> Option<GcpCandidate> {
    let (lat, lon) = scene.point_coverage()?;
    let kind = scene
        .metadata_value(TYPE_FIELDS)
        .unwrap_or_else(|| "control_point".to_string());
    let description = scene.display_id.clone().unwrap_or_default();
    let accuracy = scene
        .metadata_value(ACCURACY_FIELDS)
        .and_then(|v| v.trim_end_matches('m').trim().parse::<f64>().ok())
        .filter(|a| a.is_finite() && *a >= 0.0);

    Some(GcpCandidate {
        id: scene.entity_id.clone(),
        lat,
        lon,
        elevation: scene.point_elevation(),
        accuracy,
        photo_identifiable: true,
        source: Provider::Usgs,
        description,
        kind,
    })
}
