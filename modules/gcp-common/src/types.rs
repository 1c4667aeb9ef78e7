use serde::{Deserialize, Serialize};

use crate::error::AreaError;

/// Mean Earth radius used for every distance and area approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lon points.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

// --- Geo Types ---

/// Axis-aligned lat/lon rectangle. No antimeridian wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Build a validated box. Coordinates must be finite, in range, and ordered.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, AreaError> {
        let all = [min_lat, min_lon, max_lat, max_lon];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(AreaError::InvalidBounds(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
            return Err(AreaError::InvalidBounds(format!(
                "latitude out of range: {min_lat}..{max_lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
            return Err(AreaError::InvalidBounds(format!(
                "longitude out of range: {min_lon}..{max_lon}"
            )));
        }
        if min_lat > max_lat || min_lon > max_lon {
            return Err(AreaError::InvalidBounds(format!(
                "min must not exceed max: ({min_lat}, {min_lon}) > ({max_lat}, {max_lon})"
            )));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Inclusive on every edge.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// True when the box has zero extent in either dimension.
    pub fn is_degenerate(&self) -> bool {
        self.lat_span() <= 0.0 || self.lon_span() <= 0.0
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.6}, {:.6})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

// --- Enums ---

/// Which provider produced a candidate. Provenance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// USGS M2M API
    Usgs,
    /// NOAA National Geodetic Survey web service
    Ngs,
    /// NGS photo-control archive (local KMZ)
    NgsArchive,
    /// Seeded generator, demo and tests only
    Mock,
}

impl Provider {
    /// Prefix used when a provider has to mint ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Provider::Usgs => "USGS",
            Provider::Ngs => "NGS",
            Provider::NgsArchive => "NOAA",
            Provider::Mock => "MOCK",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Usgs => write!(f, "usgs"),
            Provider::Ngs => write!(f, "ngs"),
            Provider::NgsArchive => write!(f, "ngs_archive"),
            Provider::Mock => write!(f, "mock"),
        }
    }
}

// --- Candidate ---

/// A ground control point candidate as emitted by a point source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpCandidate {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Meters; datum is whatever the source publishes.
    pub elevation: Option<f64>,
    /// RMSE in meters. `None` when the source does not publish one.
    pub accuracy: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub photo_identifiable: bool,
    pub source: Provider,
}

/// Feature categories that are normally visible from the air.
pub const PHOTO_IDENTIFIABLE_TYPES: &[&str] = &[
    "road intersection",
    "building corner",
    "corner",
    "intersection",
    "landmark",
    "structure",
    "marker",
];

/// Keyword check over a point's type and description.
pub fn photo_identifiable_hint(kind: &str, description: &str) -> bool {
    let kind = kind.to_lowercase();
    let description = description.to_lowercase();
    PHOTO_IDENTIFIABLE_TYPES
        .iter()
        .any(|t| kind.contains(t) || description.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_sf_to_oakland() {
        // SF to Oakland is ~13km
        let dist = haversine_m(37.7749, -122.4194, 37.8044, -122.2712);
        assert!(
            (dist - 13_000.0).abs() < 2_000.0,
            "SF to Oakland should be ~13km, got {dist}"
        );
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let dist = haversine_m(44.9778, -93.265, 44.9778, -93.265);
        assert!(dist < 0.001, "Same point should be 0m, got {dist}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let dist = haversine_m(40.0, -75.0, 41.0, -75.0);
        assert!((dist - 111_195.0).abs() < 100.0, "got {dist}");
    }

    #[test]
    fn bbox_rejects_inverted_bounds() {
        let err = BoundingBox::new(41.0, -75.0, 40.0, -74.0).unwrap_err();
        assert!(matches!(err, AreaError::InvalidBounds(_)));
    }

    #[test]
    fn bbox_rejects_out_of_range_latitude() {
        assert!(BoundingBox::new(-91.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 181.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn bbox_contains_is_inclusive() {
        let bbox = BoundingBox::new(40.0, -75.0, 41.0, -74.0).unwrap();
        assert!(bbox.contains(40.0, -75.0));
        assert!(bbox.contains(41.0, -74.0));
        assert!(bbox.contains(40.5, -74.5));
        assert!(!bbox.contains(41.0001, -74.5));
        assert!(!bbox.contains(40.5, -75.0001));
    }

    #[test]
    fn point_bbox_is_degenerate() {
        let bbox = BoundingBox::new(40.0, -75.0, 40.0, -75.0).unwrap();
        assert!(bbox.is_degenerate());
        assert_eq!(bbox.center(), (40.0, -75.0));
    }

    #[test]
    fn candidate_serializes_kind_as_type() {
        let c = GcpCandidate {
            id: "USGS_GCP_0001".to_string(),
            lat: 40.5,
            lon: -74.5,
            elevation: None,
            accuracy: Some(0.4),
            kind: "road intersection".to_string(),
            description: String::new(),
            photo_identifiable: true,
            source: Provider::Usgs,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "road intersection");
        assert_eq!(json["source"], "usgs");
    }

    #[test]
    fn photo_hint_matches_type_or_description() {
        assert!(photo_identifiable_hint("Road Intersection", ""));
        assert!(photo_identifiable_hint("", "painted corner of parking lot"));
        assert!(!photo_identifiable_hint("DISK", "bronze disk set in bedrock"));
    }
}
