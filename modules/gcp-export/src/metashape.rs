//! Agisoft MetaShape reference files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gcp_common::GcpCandidate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::{accuracy_or_default, elevation_or_default};

/// Tab-separated `Label X Y Z Accuracy Enabled`, X = longitude, Y = latitude.
pub fn export_txt(points: &[GcpCandidate], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(["Label", "X", "Y", "Z", "Accuracy", "Enabled"])?;
    for point in points {
        writer.write_record([
            point.id.clone(),
            point.lon.to_string(),
            point.lat.to_string(),
            elevation_or_default(point).to_string(),
            accuracy_or_default(point).to_string(),
            "1".to_string(),
        ])?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), count = points.len(), "Wrote MetaShape text file");
    Ok(())
}

/// Marker document MetaShape imports via File > Import > Markers.
pub fn export_markers_xml(points: &[GcpCandidate], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    for tag in ["document", "chunks", "chunk", "markers"] {
        writer.write_event(Event::Start(BytesStart::new(tag)))?;
    }

    for point in points {
        let mut marker = BytesStart::new("marker");
        marker.push_attribute(("label", point.id.as_str()));
        marker.push_attribute(("reference", "true"));
        writer.write_event(Event::Start(marker))?;

        let (x, y, z) = (
            point.lon.to_string(),
            point.lat.to_string(),
            elevation_or_default(point).to_string(),
        );
        let mut position = BytesStart::new("position");
        position.push_attribute(("x", x.as_str()));
        position.push_attribute(("y", y.as_str()));
        position.push_attribute(("z", z.as_str()));
        writer.write_event(Event::Empty(position))?;

        let acc = accuracy_or_default(point).to_string();
        let mut accuracy = BytesStart::new("accuracy");
        accuracy.push_attribute(("x", acc.as_str()));
        accuracy.push_attribute(("y", acc.as_str()));
        accuracy.push_attribute(("z", acc.as_str()));
        writer.write_event(Event::Empty(accuracy))?;

        writer.write_event(Event::End(BytesEnd::new("marker")))?;
    }

    for tag in ["markers", "chunk", "chunks", "document"] {
        writer.write_event(Event::End(BytesEnd::new(tag)))?;
    }

    writer.into_inner().flush()?;
    tracing::debug!(path = %path.display(), count = points.len(), "Wrote MetaShape marker XML");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_points;

    #[test]
    fn txt_has_header_and_lon_lat_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcps_metashape.txt");
        export_txt(&sample_points(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Label\tX\tY\tZ\tAccuracy\tEnabled");
        assert_eq!(lines[1], "USGS_GCP_0001\t-74.5\t40.5\t12.5\t0.25\t1");
        assert_eq!(lines[2], "NOAA_GCP_0002\t-74.25\t40.75\t0\t1\t1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn xml_contains_one_marker_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcps_metashape.xml");
        export_markers_xml(&sample_points(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert_eq!(content.matches("<marker ").count(), 2);
        assert!(content.contains(r#"<marker label="USGS_GCP_0001" reference="true">"#));
        assert!(content.contains(r#"<position x="-74.5" y="40.5" z="12.5"/>"#));
        assert!(content.contains(r#"<accuracy x="0.25" y="0.25" z="0.25"/>"#));
        assert!(content.trim_end().ends_with("</document>"));
    }
}
