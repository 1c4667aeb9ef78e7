use serde::{Deserialize, Serialize};

// --- Envelope ---

/// Every M2M response wraps its payload in this envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

// --- Login ---

/// Body for the `login-token` endpoint. M2M names the token field `token`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginTokenRequest {
    pub username: String,
    pub token: String,
}

// --- Scene search ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Scene-search spatial filter: a bounding rectangle or one WRS-2 tile.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "filterType", rename_all = "lowercase")]
pub enum SpatialFilter {
    Mbr {
        #[serde(rename = "lowerLeft")]
        lower_left: Coordinate,
        #[serde(rename = "upperRight")]
        upper_right: Coordinate,
    },
    Wrs2 { path: u16, row: u16 },
}

impl SpatialFilter {
    pub fn mbr(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        SpatialFilter::Mbr {
            lower_left: Coordinate {
                latitude: min_lat,
                longitude: min_lon,
            },
            upper_right: Coordinate {
                latitude: max_lat,
                longitude: max_lon,
            },
        }
    }

    pub fn wrs2(path: u16, row: u16) -> Self {
        SpatialFilter::Wrs2 { path, row }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneFilter {
    #[serde(rename = "spatialFilter")]
    pub spatial_filter: SpatialFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSearchRequest {
    #[serde(rename = "datasetName")]
    pub dataset_name: String,
    #[serde(rename = "sceneFilter")]
    pub scene_filter: SceneFilter,
    #[serde(rename = "maxResults")]
    pub max_results: usize,
    #[serde(rename = "metadataType")]
    pub metadata_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneSearchData {
    #[serde(default)]
    pub results: Vec<SceneResult>,
    #[serde(rename = "totalHits", default)]
    pub total_hits: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneResult {
    #[serde(rename = "entityId")]
    pub entity_id: String,
    #[serde(rename = "displayId", default)]
    pub display_id: Option<String>,
    /// GeoJSON geometry of the scene footprint.
    #[serde(rename = "spatialCoverage", default)]
    pub spatial_coverage: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: Vec<MetadataField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataField {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl SceneResult {
    /// `(lat, lon)` when the footprint is a GeoJSON Point.
    pub fn point_coverage(&self) -> Option<(f64, f64)> {
        let geometry = self.spatial_coverage.as_ref()?;
        if geometry.get("type")?.as_str()? != "Point" {
            return None;
        }
        let coords = geometry.get("coordinates")?.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some((lat, lon))
    }

    /// Optional third GeoJSON ordinate.
    pub fn point_elevation(&self) -> Option<f64> {
        self.spatial_coverage
            .as_ref()?
            .get("coordinates")?
            .as_array()?
            .get(2)?
            .as_f64()
    }

    /// First metadata value whose field name matches one of `names`
    /// (case-insensitive), rendered as a string.
    pub fn metadata_value(&self, names: &[&str]) -> Option<String> {
        self.metadata.iter().find_map(|field| {
            let name = field.field_name.to_lowercase();
            if !names.iter().any(|n| name == n.to_lowercase()) {
                return None;
            }
            match &field.value {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }
}
