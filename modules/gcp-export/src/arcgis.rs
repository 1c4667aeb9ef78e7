//! ArcGIS Pro inputs: a point CSV, a GeoJSON feature collection and a point
//! shapefile.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use gcp_common::GcpCandidate;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

use crate::{accuracy_or_default, elevation_or_default};

/// `ID,X,Y,Z,Accuracy,Description`. Description falls back to the point type.
pub fn export_csv(points: &[GcpCandidate], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["ID", "X", "Y", "Z", "Accuracy", "Description"])?;
    for point in points {
        writer.write_record([
            point.id.clone(),
            point.lon.to_string(),
            point.lat.to_string(),
            elevation_or_default(point).to_string(),
            accuracy_or_default(point).to_string(),
            description_or_kind(point).to_string(),
        ])?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), count = points.len(), "Wrote ArcGIS CSV");
    Ok(())
}

pub fn export_geojson(points: &[GcpCandidate], path: &Path) -> Result<()> {
    let features = points.iter().map(to_feature).collect();
    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });

    let json = serde_json::to_string_pretty(&collection)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = points.len(), "Wrote ArcGIS GeoJSON");
    Ok(())
}

fn to_feature(point: &GcpCandidate) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("ID".into(), JsonValue::from(point.id.clone()));
    properties.insert("Z".into(), JsonValue::from(elevation_or_default(point)));
    properties.insert("Accuracy".into(), JsonValue::from(accuracy_or_default(point)));
    properties.insert(
        "Description".into(),
        JsonValue::from(description_or_kind(point).to_string()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![point.lon, point.lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// dBase character fields hold at most this many bytes.
const MAX_TEXT_LEN: usize = 254;

/// Point shapefile (`.shp`, `.shx`, `.dbf`, `.prj`) with ID, Z, Accuracy and
/// Description attributes. `path` names the `.shp`; siblings share its stem.
pub fn export_shapefile(points: &[GcpCandidate], path: &Path) -> Result<()> {
    let table = TableWriterBuilder::new()
        .add_character_field(field_name("ID")?, 64)
        .add_numeric_field(field_name("Z")?, 18, 3)
        .add_numeric_field(field_name("Accuracy")?, 18, 3)
        .add_character_field(field_name("Descr")?, MAX_TEXT_LEN as u8);

    {
        let mut writer = shapefile::Writer::from_path(path, table)
            .map_err(|e| anyhow!("Failed to create {}: {e}", path.display()))?;
        for point in points {
            let mut record = Record::default();
            record.insert("ID".to_string(), FieldValue::Character(Some(truncate(&point.id, 64))));
            record.insert("Z".to_string(), FieldValue::Numeric(Some(elevation_or_default(point))));
            record.insert(
                "Accuracy".to_string(),
                FieldValue::Numeric(Some(accuracy_or_default(point))),
            );
            record.insert(
                "Descr".to_string(),
                FieldValue::Character(Some(truncate(description_or_kind(point), MAX_TEXT_LEN))),
            );
            writer
                .write_shape_and_record(&shapefile::Point::new(point.lon, point.lat), &record)
                .map_err(|e| anyhow!("Failed to write point {} to {}: {e}", point.id, path.display()))?;
        }
    }

    let prj = path.with_extension("prj");
    std::fs::write(&prj, WGS84_PRJ).with_context(|| format!("Failed to write {}", prj.display()))?;

    tracing::debug!(path = %path.display(), count = points.len(), "Wrote ArcGIS shapefile");
    Ok(())
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|e| anyhow!("invalid dBase field name {name}: {e:?}"))
}

fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn description_or_kind(point: &GcpCandidate) -> &str {
    if point.description.is_empty() {
        &point.kind
    } else {
        &point.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_points;

    #[test]
    fn csv_falls_back_to_type_for_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcps_arcgis.csv");
        export_csv(&sample_points(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["ID", "X", "Y", "Z", "Accuracy", "Description"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][5], "Road intersection, painted");
        assert_eq!(&rows[1][5], "survey_mark");
        assert_eq!(&rows[1][1], "-74.25");
    }

    #[test]
    fn geojson_points_are_lon_lat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcps_arcgis.geojson");
        export_geojson(&sample_points(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        let GeoJson::FeatureCollection(fc) = parsed else {
            panic!("expected a feature collection");
        };
        assert_eq!(fc.features.len(), 2);

        let first = &fc.features[0];
        let Some(Geometry { value: Value::Point(coords), .. }) = &first.geometry else {
            panic!("expected a point geometry");
        };
        assert_eq!(coords, &vec![-74.5, 40.5]);

        let props = first.properties.as_ref().unwrap();
        assert_eq!(props["ID"], JsonValue::from("USGS_GCP_0001"));
        assert_eq!(props["Accuracy"], JsonValue::from(0.25));
    }

    fn text(record: &Record, field: &str) -> String {
        match record.get(field) {
            Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
            other => panic!("expected text in {field}, got {other:?}"),
        }
    }

    fn number(record: &Record, field: &str) -> f64 {
        match record.get(field) {
            Some(FieldValue::Numeric(Some(n))) => *n,
            other => panic!("expected a number in {field}, got {other:?}"),
        }
    }

    #[test]
    fn shapefile_points_carry_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcps_arcgis.shp");
        export_shapefile(&sample_points(), &path).unwrap();

        for ext in ["shx", "dbf", "prj"] {
            assert!(path.with_extension(ext).exists(), "missing .{ext}");
        }

        let rows = shapefile::read_as::<_, shapefile::Point, Record>(&path).unwrap();
        assert_eq!(rows.len(), 2);

        let (point, record) = &rows[0];
        assert_eq!((point.x, point.y), (-74.5, 40.5));
        assert_eq!(text(record, "ID"), "USGS_GCP_0001");
        assert!((number(record, "Z") - 12.5).abs() < 1e-9);
        assert!((number(record, "Accuracy") - 0.25).abs() < 1e-9);
        assert_eq!(text(record, "Descr"), "Road intersection, painted");

        let (_, record) = &rows[1];
        assert!((number(record, "Z") - 0.0).abs() < 1e-9);
        assert!((number(record, "Accuracy") - 1.0).abs() < 1e-9);
        assert_eq!(text(record, "Descr"), "survey_mark");
    }

    #[test]
    fn long_text_is_cut_on_a_char_boundary() {
        let long = "é".repeat(200);
        let cut = truncate(&long, MAX_TEXT_LEN);
        assert!(cut.len() <= MAX_TEXT_LEN);
        assert_eq!(cut.chars().count(), MAX_TEXT_LEN / 2);
        assert_eq!(truncate("short", MAX_TEXT_LEN), "short");
    }
}
