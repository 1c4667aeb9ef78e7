use gcp_common::{haversine_m, GcpCandidate};

/// Drop candidates within `radius_m` of one already kept. First occurrence
/// wins and order is preserved. Returns the survivors and how many were dropped.
pub fn dedup_by_distance(candidates: Vec<GcpCandidate>, radius_m: f64) -> (Vec<GcpCandidate>, u32) {
    let mut kept: Vec<GcpCandidate> = Vec::with_capacity(candidates.len());
    let mut dropped = 0;

    for candidate in candidates {
        let duplicate = kept
            .iter()
            .any(|k| haversine_m(k.lat, k.lon, candidate.lat, candidate.lon) <= radius_m);
        if duplicate {
            tracing::debug!(id = %candidate.id, source = %candidate.source, "Dropped near-duplicate GCP");
            dropped += 1;
        } else {
            kept.push(candidate);
        }
    }

    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_common::Provider;

    fn at(id: &str, lat: f64, lon: f64, source: Provider) -> GcpCandidate {
        GcpCandidate {
            id: id.to_string(),
            lat,
            lon,
            elevation: None,
            accuracy: Some(0.5),
            kind: "marker".to_string(),
            description: String::new(),
            photo_identifiable: true,
            source,
        }
    }

    #[test]
    fn earlier_point_wins() {
        let input = vec![
            at("usgs-1", 40.5, -74.5, Provider::Usgs),
            at("usgs-2", 40.6, -74.6, Provider::Usgs),
            // ~1.1 m north of usgs-1
            at("ngs-1", 40.50001, -74.5, Provider::Ngs),
        ];
        let (kept, dropped) = dedup_by_distance(input, 5.0);
        assert_eq!(dropped, 1);
        let ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["usgs-1", "usgs-2"]);
    }

    #[test]
    fn clashing_ids_far_apart_are_both_kept() {
        let input = vec![
            at("X1", 40.1, -74.1, Provider::Usgs),
            at("X1", 40.9, -74.9, Provider::Ngs),
        ];
        let (kept, dropped) = dedup_by_distance(input, 10.0);
        assert_eq!((kept.len(), dropped), (2, 0));
    }
}
