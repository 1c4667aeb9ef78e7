//! KMZ/KML reader for the NGS photo-control archive.
//!
//! A KMZ is a zip holding one KML document. Each `Placemark` is one control
//! point. Only the subset of KML the archive uses is handled:
//! - `name` and `description` on the placemark
//! - `Point/coordinates`, falling back to the first `LineString` vertex,
//!   then to any `ExtendedData` value that parses as a coordinate
//! - `ExtendedData/Data[@name]/value` and `SchemaData/SimpleData[@name]`
//!   as free-form metadata
//!
//! Namespace prefixes are ignored, so documents with and without the
//! `http://www.opengis.net/kml/2.2` default namespace both parse.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use gcp_common::{GcpCandidate, Provider};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::error::{ArchiveError, Result};

/// Accuracy assumed for archive points that publish none.
pub const DEFAULT_ARCHIVE_ACCURACY_M: f64 = 0.5;

const DEFAULT_TYPE: &str = "control_point";

const ACCURACY_KEYS: &[&str] = &["accuracy", "rmse", "error", "precision"];

static ACCURACY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ACCURACY_KEYS
        .iter()
        .map(|key| Regex::new(&format!(r"{key}[:\s]+([\d.]+)\s*m")).expect("static pattern"))
        .collect()
});

/// Read every placemark from a KMZ file.
pub fn parse_kmz_file(path: &Path) -> Result<Vec<GcpCandidate>> {
    if !path.exists() {
        return Err(ArchiveError::NotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let kml_name = archive
        .file_names()
        .find(|n| n.to_ascii_lowercase().ends_with(".kml"))
        .map(str::to_owned)
        .ok_or_else(|| ArchiveError::NoKml(path.display().to_string()))?;

    tracing::debug!(archive = %path.display(), entry = %kml_name, "Reading KML from archive");

    let mut content = String::new();
    archive.by_name(&kml_name)?.read_to_string(&mut content)?;

    let points = parse_kml(&content)?;
    tracing::info!(
        archive = %path.display(),
        points = points.len(),
        "Parsed control points from KMZ"
    );
    Ok(points)
}

/// Parse a KML document into candidates, skipping placemarks without usable
/// coordinates.
pub fn parse_kml(content: &str) -> Result<Vec<GcpCandidate>> {
    let mut reader = Reader::from_str(content);

    let mut points = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut placemark: Option<PlacemarkFields> = None;
    let mut placemark_index = 0usize;
    let mut data_name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e);
                match local.as_str() {
                    "Placemark" => placemark = Some(PlacemarkFields::default()),
                    "Data" | "SimpleData" => data_name = name_attr(e),
                    _ => {}
                }
                path.push(local);
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                if placemark.is_some() {
                    match e.unescape() {
                        Ok(text) => text_buf.push_str(&text),
                        Err(_) => text_buf.push_str(&String::from_utf8_lossy(e)),
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if placemark.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(_)) => {
                let local = path.pop().unwrap_or_default();
                let parent = path.last().map(String::as_str).unwrap_or("");
                let text = text_buf.trim().to_string();
                text_buf.clear();

                if local == "Placemark" {
                    if let Some(fields) = placemark.take() {
                        match fields.into_candidate(placemark_index) {
                            Some(point) => points.push(point),
                            None => tracing::debug!(
                                index = placemark_index,
                                "Skipping placemark without usable coordinates"
                            ),
                        }
                    }
                    placemark_index += 1;
                    continue;
                }

                let Some(fields) = placemark.as_mut() else {
                    continue;
                };

                match (local.as_str(), parent) {
                    ("name", "Placemark") if !text.is_empty() => fields.name = Some(text),
                    ("description", "Placemark") => fields.description = text,
                    ("coordinates", "Point") => fields.point = Some(text),
                    ("coordinates", "LineString") if fields.line.is_none() => {
                        fields.line = Some(text)
                    }
                    ("value", "Data") => fields.data.push((data_name.clone(), text)),
                    ("SimpleData", _) => fields.data.push((data_name.take(), text)),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ArchiveError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(points)
}

#[derive(Debug, Default)]
struct PlacemarkFields {
    name: Option<String>,
    description: String,
    point: Option<String>,
    line: Option<String>,
    data: Vec<(Option<String>, String)>,
}

impl PlacemarkFields {
    fn into_candidate(self, index: usize) -> Option<GcpCandidate> {
        let coords = self
            .point
            .as_deref()
            .and_then(parse_coordinates)
            .or_else(|| {
                self.line
                    .as_deref()
                    .and_then(|s| parse_coordinate_list(s).into_iter().next())
            })
            .or_else(|| {
                self.data
                    .iter()
                    .find_map(|(_, value)| parse_coordinates(value))
            })?;

        let (lon, lat, elevation) = coords;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }

        let metadata: HashMap<String, String> = self
            .data
            .into_iter()
            .filter_map(|(name, value)| name.map(|n| (n.to_lowercase(), value)))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        let kind = metadata
            .get("type")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TYPE.to_string());
        let accuracy = extract_accuracy(&metadata, &self.description);

        Some(GcpCandidate {
            id: self
                .name
                .unwrap_or_else(|| format!("{}_GCP_{index:04}", Provider::NgsArchive.id_prefix())),
            lat,
            lon,
            elevation,
            accuracy: Some(accuracy),
            kind,
            description: self.description,
            // Everything in the photo-control archive was chosen to be visible from the air.
            photo_identifiable: true,
            source: Provider::NgsArchive,
        })
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn name_attr(e: &BytesStart) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        if attr.key.local_name().as_ref() == b"name" {
            attr.unescape_value().ok().map(|v| v.trim().to_string())
        } else {
            None
        }
    })
}

/// `lon,lat[,elevation]`
fn parse_coordinates(raw: &str) -> Option<(f64, f64, Option<f64>)> {
    let mut parts = raw.trim().split(',').map(str::trim);
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    let elevation = parts
        .next()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok());
    Some((lon, lat, elevation))
}

/// Whitespace-separated coordinate tuples.
fn parse_coordinate_list(raw: &str) -> Vec<(f64, f64, Option<f64>)> {
    raw.split_whitespace().filter_map(parse_coordinates).collect()
}

fn usable_accuracy(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
}

/// Metadata keys first, then description patterns, then the archive default.
/// Non-finite and negative values are ignored.
fn extract_accuracy(metadata: &HashMap<String, String>, description: &str) -> f64 {
    for key in ACCURACY_KEYS {
        if let Some(value) = metadata.get(*key).and_then(|v| usable_accuracy(v)) {
            return value;
        }
    }

    let lowered = description.to_lowercase();
    for pattern in ACCURACY_PATTERNS.iter() {
        if let Some(value) = pattern
            .captures(&lowered)
            .and_then(|c| c.get(1))
            .and_then(|m| usable_accuracy(m.as_str()))
        {
            return value;
        }
    }

    DEFAULT_ARCHIVE_ACCURACY_M
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NAMESPACED_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>NGS Photo Control</name>
    <Placemark>
      <name>PA0001</name>
      <description><![CDATA[Paint mark at road intersection. RMSE: 0.12 m]]></description>
      <ExtendedData>
        <Data name="Type"><value>road intersection</value></Data>
      </ExtendedData>
      <Point><coordinates>-74.5,40.5,101.2</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>PA0002</name>
      <ExtendedData>
        <Data name="accuracy"><value>0.08</value></Data>
      </ExtendedData>
      <LineString><coordinates>-74.25,40.75 -74.2,40.8</coordinates></LineString>
    </Placemark>
    <Placemark>
      <description>No geometry at all</description>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn parses_points_and_linestrings() {
        let points = parse_kml(NAMESPACED_KML).unwrap();
        assert_eq!(points.len(), 2, "placemark without coordinates is skipped");

        let first = &points[0];
        assert_eq!(first.id, "PA0001");
        assert_eq!((first.lat, first.lon), (40.5, -74.5));
        assert_eq!(first.elevation, Some(101.2));
        assert_eq!(first.kind, "road intersection");
        assert_eq!(first.accuracy, Some(0.12));
        assert!(first.photo_identifiable);
        assert_eq!(first.source, Provider::NgsArchive);

        let second = &points[1];
        assert_eq!((second.lat, second.lon), (40.75, -74.25));
        assert_eq!(second.elevation, None);
        assert_eq!(second.accuracy, Some(0.08));
        assert_eq!(second.kind, "control_point");
    }

    #[test]
    fn un_namespaced_placemark_gets_default_id_and_accuracy() {
        let kml = r#"<kml><Document>
            <Placemark><Point><coordinates>-75.0,40.0</coordinates></Point></Placemark>
            <Placemark><Point><coordinates>-74.9,40.1</coordinates></Point></Placemark>
        </Document></kml>"#;
        let points = parse_kml(kml).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, "NOAA_GCP_0000");
        assert_eq!(points[1].id, "NOAA_GCP_0001");
        assert_eq!(points[0].accuracy, Some(DEFAULT_ARCHIVE_ACCURACY_M));
    }

    #[test]
    fn coordinates_in_extended_data_are_used_as_last_resort() {
        let kml = r#"<kml><Placemark>
            <name>X1</name>
            <ExtendedData><Data name="position"><value>-74.1,40.2,5</value></Data></ExtendedData>
        </Placemark></kml>"#;
        let points = parse_kml(kml).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].lat, points[0].lon), (40.2, -74.1));
    }

    #[test]
    fn out_of_range_coordinates_are_skipped() {
        let kml = r#"<kml><Placemark><Point><coordinates>40.5,-200.0</coordinates></Point></Placemark></kml>"#;
        assert!(parse_kml(kml).unwrap().is_empty());
    }

    #[test]
    fn description_accuracy_patterns() {
        let empty = HashMap::new();
        assert_eq!(extract_accuracy(&empty, "Accuracy: 1.5m horizontal"), 1.5);
        assert_eq!(extract_accuracy(&empty, "precision 0.3 m"), 0.3);
        assert_eq!(extract_accuracy(&empty, "nothing here"), DEFAULT_ARCHIVE_ACCURACY_M);
    }

    #[test]
    fn invalid_metadata_accuracy_falls_through() {
        let kml = r#"<kml><Document>
            <Placemark>
              <name>N1</name>
              <ExtendedData><Data name="accuracy"><value>NaN</value></Data></ExtendedData>
              <Point><coordinates>-74.5,40.5</coordinates></Point>
            </Placemark>
            <Placemark>
              <name>N2</name>
              <description>RMSE: 0.2 m</description>
              <ExtendedData><Data name="rmse"><value>-3</value></Data></ExtendedData>
              <Point><coordinates>-74.4,40.6</coordinates></Point>
            </Placemark>
            <Placemark>
              <name>N3</name>
              <ExtendedData><Data name="accuracy"><value>inf</value></Data></ExtendedData>
              <Point><coordinates>-74.3,40.7</coordinates></Point>
            </Placemark>
        </Document></kml>"#;
        let points = parse_kml(kml).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].accuracy, Some(DEFAULT_ARCHIVE_ACCURACY_M));
        assert_eq!(points[1].accuracy, Some(0.2));
        assert_eq!(points[2].accuracy, Some(DEFAULT_ARCHIVE_ACCURACY_M));
        assert!(points
            .iter()
            .all(|p| p.accuracy.is_some_and(|a| a.is_finite() && a >= 0.0)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = parse_kmz_file(Path::new("/definitely/not/here.kmz")).unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }

    #[test]
    fn reads_kml_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo_control.kmz");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("doc.kml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(NAMESPACED_KML.as_bytes()).unwrap();
        zip.finish().unwrap();

        let points = parse_kmz_file(&path).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn zip_without_kml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.kmz");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"nothing").unwrap();
        zip.finish().unwrap();

        assert!(matches!(
            parse_kmz_file(&path).unwrap_err(),
            ArchiveError::NoKml(_)
        ));
    }

    #[test]
    fn not_a_zip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.kmz");
        std::fs::write(&path, b"this is not a zip").unwrap();
        assert!(matches!(
            parse_kmz_file(&path).unwrap_err(),
            ArchiveError::Zip(_)
        ));
    }
}
