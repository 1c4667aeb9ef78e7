//! Candidate usability filter.
//!
//! A pure conjunction of independently toggled predicates. Survivors keep
//! their input order; nothing is reordered, merged or deduplicated here.

use gcp_common::{BoundingBox, GcpCandidate};
use serde::{Deserialize, Serialize};

use crate::area::ResolvedArea;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Reject when accuracy exceeds this many meters. When set, a missing,
    /// negative or non-finite accuracy is also rejected.
    pub min_accuracy_m: Option<f64>,
    pub require_photo_identifiable: bool,
    /// Inclusive on every edge.
    pub require_within_bbox: bool,
}

impl FilterOptions {
    /// Defaults used by the command line: 1 m, photo-identifiable, in the box.
    pub fn strict() -> Self {
        Self {
            min_accuracy_m: Some(1.0),
            require_photo_identifiable: true,
            require_within_bbox: true,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.min_accuracy_m.is_none() && !self.require_photo_identifiable && !self.require_within_bbox
    }
}

/// Why a candidate was dropped. Only the first failing rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Accuracy,
    MissingAccuracy,
    NotPhotoIdentifiable,
    OutsideBbox,
    OutsideCells,
}

/// Counters produced by a filter pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterStats {
    pub accuracy: u32,
    pub missing_accuracy: u32,
    pub not_photo_identifiable: u32,
    pub outside_bbox: u32,
    pub outside_cells: u32,
}

impl FilterStats {
    pub fn total(&self) -> u32 {
        self.accuracy
            + self.missing_accuracy
            + self.not_photo_identifiable
            + self.outside_bbox
            + self.outside_cells
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Accuracy => self.accuracy += 1,
            Rejection::MissingAccuracy => self.missing_accuracy += 1,
            Rejection::NotPhotoIdentifiable => self.not_photo_identifiable += 1,
            Rejection::OutsideBbox => self.outside_bbox += 1,
            Rejection::OutsideCells => self.outside_cells += 1,
        }
    }

    pub fn merge(&mut self, other: &FilterStats) {
        self.accuracy += other.accuracy;
        self.missing_accuracy += other.missing_accuracy;
        self.not_photo_identifiable += other.not_photo_identifiable;
        self.outside_bbox += other.outside_bbox;
        self.outside_cells += other.outside_cells;
    }
}

pub fn check(candidate: &GcpCandidate, bbox: &BoundingBox, options: &FilterOptions) -> Option<Rejection> {
    if let Some(threshold) = options.min_accuracy_m {
        match candidate.accuracy {
            None => return Some(Rejection::MissingAccuracy),
            Some(acc) if !acc.is_finite() || acc < 0.0 || acc > threshold => {
                return Some(Rejection::Accuracy)
            }
            Some(_) => {}
        }
    }
    if options.require_photo_identifiable && !candidate.photo_identifiable {
        return Some(Rejection::NotPhotoIdentifiable);
    }
    if options.require_within_bbox && !bbox.contains(candidate.lat, candidate.lon) {
        return Some(Rejection::OutsideBbox);
    }
    None
}

/// Keep the candidates that pass every enabled rule.
pub fn filter(
    candidates: Vec<GcpCandidate>,
    bbox: &BoundingBox,
    options: &FilterOptions,
) -> (Vec<GcpCandidate>, FilterStats) {
    let mut stats = FilterStats::default();
    if options.is_disabled() {
        return (candidates, stats);
    }

    let accepted = candidates
        .into_iter()
        .filter(|c| match check(c, bbox, options) {
            Some(rejection) => {
                stats.record(rejection);
                false
            }
            None => true,
        })
        .collect();
    (accepted, stats)
}

/// Drop candidates that fall outside every requested cell. No-op for areas
/// given as a rectangle.
pub fn retain_within_cells(
    candidates: Vec<GcpCandidate>,
    area: &ResolvedArea,
    stats: &mut FilterStats,
) -> Vec<GcpCandidate> {
    if area.cells.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| {
            let inside = area.contains_in_cells(c.lat, c.lon);
            if !inside {
                stats.record(Rejection::OutsideCells);
            }
            inside
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_common::Provider;

    fn bbox() -> BoundingBox {
        BoundingBox::new(40.0, -75.0, 41.0, -74.0).unwrap()
    }

    fn candidate(id: &str, lat: f64, lon: f64, accuracy: Option<f64>, photo: bool) -> GcpCandidate {
        GcpCandidate {
            id: id.to_string(),
            lat,
            lon,
            elevation: None,
            accuracy,
            kind: "marker".to_string(),
            description: String::new(),
            photo_identifiable: photo,
            source: Provider::Mock,
        }
    }

    fn mixed() -> Vec<GcpCandidate> {
        vec![
            candidate("a", 40.5, -74.5, Some(0.5), true),
            candidate("b", 40.5, -74.5, Some(1.5), true),
            candidate("c", 40.5, -74.5, None, true),
            candidate("d", 40.5, -74.5, Some(0.2), false),
            candidate("e", 42.0, -74.5, Some(0.2), true),
            candidate("f", 41.0, -74.0, Some(1.0), true),
        ]
    }

    fn ids(v: &[GcpCandidate]) -> Vec<&str> {
        v.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn all_options_off_is_identity() {
        let input = mixed();
        let (out, stats) = filter(input.clone(), &bbox(), &FilterOptions::default());
        assert_eq!(out, input);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn accuracy_threshold_rejects_missing_values() {
        let opts = FilterOptions {
            min_accuracy_m: Some(1.0),
            ..Default::default()
        };
        let (out, stats) = filter(mixed(), &bbox(), &opts);
        assert_eq!(ids(&out), vec!["a", "d", "e", "f"]);
        assert_eq!(stats.accuracy, 1);
        assert_eq!(stats.missing_accuracy, 1);
    }

    #[test]
    fn nan_and_negative_accuracy_fail_threshold() {
        let opts = FilterOptions {
            min_accuracy_m: Some(1.0),
            ..Default::default()
        };
        let input = vec![
            candidate("nan", 40.5, -74.5, Some(f64::NAN), true),
            candidate("neg", 40.5, -74.5, Some(-3.0), true),
            candidate("inf", 40.5, -74.5, Some(f64::INFINITY), true),
            candidate("ok", 40.5, -74.5, Some(0.0), true),
        ];
        let (out, stats) = filter(input, &bbox(), &opts);
        assert_eq!(ids(&out), vec!["ok"]);
        assert_eq!(stats.accuracy, 3);
    }

    #[test]
    fn missing_accuracy_passes_without_threshold() {
        let opts = FilterOptions {
            require_photo_identifiable: true,
            ..Default::default()
        };
        let (out, _) = filter(mixed(), &bbox(), &opts);
        assert!(ids(&out).contains(&"c"));
        assert!(!ids(&out).contains(&"d"));
    }

    #[test]
    fn bbox_edge_is_inside() {
        let opts = FilterOptions {
            require_within_bbox: true,
            ..Default::default()
        };
        let (out, stats) = filter(mixed(), &bbox(), &opts);
        assert_eq!(ids(&out), vec!["a", "b", "c", "d", "f"]);
        assert_eq!(stats.outside_bbox, 1);
    }

    #[test]
    fn strict_output_is_ordered_subsequence_passing_every_rule() {
        let input = mixed();
        let opts = FilterOptions::strict();
        let (out, stats) = filter(input.clone(), &bbox(), &opts);

        assert_eq!(ids(&out), vec!["a", "f"]);
        assert!(out.iter().all(|c| check(c, &bbox(), &opts).is_none()));
        let mut positions = out.iter().map(|c| input.iter().position(|i| i == c).unwrap());
        let first = positions.next().unwrap();
        assert!(positions.all(|p| p > first));
        assert_eq!(stats.total() as usize, input.len() - out.len());
    }
}
