//! Writers for the reference formats photogrammetry and GIS tools import.

pub mod arcgis;
pub mod metashape;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gcp_common::GcpCandidate;

/// Z written when a point has no published elevation.
pub const DEFAULT_ELEVATION_M: f64 = 0.0;
/// Accuracy written when a point has none.
pub const DEFAULT_ACCURACY_M: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    All,
    MetaShape,
    ArcGis,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "metashape" => Ok(Self::MetaShape),
            "arcgis" => Ok(Self::ArcGis),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

pub(crate) fn elevation_or_default(point: &GcpCandidate) -> f64 {
    point.elevation.unwrap_or(DEFAULT_ELEVATION_M)
}

pub(crate) fn accuracy_or_default(point: &GcpCandidate) -> f64 {
    point.accuracy.unwrap_or(DEFAULT_ACCURACY_M)
}

/// Write `points` in `format` under `output_dir`, creating the directory if
/// needed. Returns the files written, in a fixed order.
pub fn export(
    points: &[GcpCandidate],
    output_dir: &Path,
    base_name: &str,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = |suffix: &str| output_dir.join(format!("{base_name}_{suffix}"));
    let mut written = Vec::new();

    if matches!(format, ExportFormat::All | ExportFormat::MetaShape) {
        let txt = path("metashape.txt");
        metashape::export_txt(points, &txt)?;
        written.push(txt);

        let xml = path("metashape.xml");
        metashape::export_markers_xml(points, &xml)?;
        written.push(xml);
    }

    if matches!(format, ExportFormat::All | ExportFormat::ArcGis) {
        let csv = path("arcgis.csv");
        arcgis::export_csv(points, &csv)?;
        written.push(csv);

        let geojson = path("arcgis.geojson");
        arcgis::export_geojson(points, &geojson)?;
        written.push(geojson);

        let shp = path("arcgis.shp");
        arcgis::export_shapefile(points, &shp)?;
        written.push(shp);
    }

    tracing::info!(
        dir = %output_dir.display(),
        files = written.len(),
        points = points.len(),
        "Exported GCPs"
    );
    Ok(written)
}

/// MetaShape text and XML, ArcGIS CSV, GeoJSON and shapefile.
pub fn export_all(points: &[GcpCandidate], output_dir: &Path, base_name: &str) -> Result<Vec<PathBuf>> {
    export(points, output_dir, base_name, ExportFormat::All)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gcp_common::Provider;

    pub(crate) fn sample_points() -> Vec<GcpCandidate> {
        vec![
            GcpCandidate {
                id: "USGS_GCP_0001".into(),
                lat: 40.5,
                lon: -74.5,
                elevation: Some(12.5),
                accuracy: Some(0.25),
                kind: "road_intersection".into(),
                description: "Road intersection, painted".into(),
                photo_identifiable: true,
                source: Provider::Usgs,
            },
            GcpCandidate {
                id: "NOAA_GCP_0002".into(),
                lat: 40.75,
                lon: -74.25,
                elevation: None,
                accuracy: None,
                kind: "survey_mark".into(),
                description: String::new(),
                photo_identifiable: false,
                source: Provider::NgsArchive,
            },
        ]
    }

    #[test]
    fn export_all_writes_every_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let files = export_all(&sample_points(), &out, "site").unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "site_metashape.txt",
                "site_metashape.xml",
                "site_arcgis.csv",
                "site_arcgis.geojson",
                "site_arcgis.shp"
            ]
        );
        assert!(files.iter().all(|p| p.exists()));
    }

    #[test]
    fn single_format_writes_only_its_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = export(&sample_points(), dir.path(), "gcps", ExportFormat::ArcGis).unwrap();
        assert_eq!(files.len(), 3);
        assert!(dir.path().join("gcps_arcgis.dbf").exists());
        assert!(!dir.path().join("gcps_metashape.txt").exists());
    }

    #[test]
    fn empty_input_still_writes_headers() {
        let dir = tempfile::tempdir().unwrap();
        export(&[], dir.path(), "empty", ExportFormat::MetaShape).unwrap();
        let txt = std::fs::read_to_string(dir.path().join("empty_metashape.txt")).unwrap();
        assert_eq!(txt.trim_end(), "Label\tX\tY\tZ\tAccuracy\tEnabled");
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("ArcGIS".parse::<ExportFormat>().unwrap(), ExportFormat::ArcGis);
        assert!("shapefile".parse::<ExportFormat>().is_err());
    }
}
