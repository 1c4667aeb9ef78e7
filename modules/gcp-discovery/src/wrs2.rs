//! Approximate Landsat WRS-2 path/row lookup.
//!
//! Paths are 7.5° longitude bands counted east from 180°W; rows are 0.05°
//! latitude steps counted south from 80°N, clamped to the valid range. This
//! is coarse: use it to widen a USGS search, not to label scenes.

use std::collections::BTreeSet;

use gcp_common::BoundingBox;

pub const PATH_COUNT: i64 = 233;
pub const ROW_COUNT: i64 = 248;

const PATH_WIDTH_DEG: f64 = 7.5;
const ROW_HEIGHT_DEG: f64 = 0.05;
const FIRST_ROW_LAT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathRow {
    pub path: u16,
    pub row: u16,
}

impl std::fmt::Display for PathRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}/{:03}", self.path, self.row)
    }
}

impl PathRow {
    fn from_indices(path: i64, row: i64) -> Option<Self> {
        let valid = (1..=PATH_COUNT).contains(&path) && (1..=ROW_COUNT).contains(&row);
        valid.then(|| PathRow {
            path: path as u16,
            row: row as u16,
        })
    }
}

fn indices(lat: f64, lon: f64) -> (i64, i64) {
    let mut path = ((180.0 + lon) / PATH_WIDTH_DEG).trunc() as i64 + 1;
    if path < 1 {
        path += PATH_COUNT;
    } else if path > PATH_COUNT {
        path -= PATH_COUNT;
    }

    // Southern latitudes keep counting away from the first row.
    let offset = if lat >= 0.0 {
        FIRST_ROW_LAT - lat
    } else {
        FIRST_ROW_LAT + lat.abs()
    };
    let row = (offset / ROW_HEIGHT_DEG).trunc() as i64 + 1;
    (path, row.clamp(1, ROW_COUNT))
}

/// Path/row containing a point.
pub fn path_row(lat: f64, lon: f64) -> PathRow {
    let (path, row) = indices(lat, lon);
    PathRow {
        path: path.clamp(1, PATH_COUNT) as u16,
        row: row as u16,
    }
}

/// Path/rows touching the corners and center of `bbox`, each widened by one
/// neighbour in every direction. Sorted, unique.
pub fn covering_path_rows(bbox: &BoundingBox) -> Vec<PathRow> {
    let center = bbox.center();
    let samples = [
        (bbox.min_lat, bbox.min_lon),
        (bbox.min_lat, bbox.max_lon),
        (bbox.max_lat, bbox.min_lon),
        (bbox.max_lat, bbox.max_lon),
        center,
    ];

    let seeds: BTreeSet<PathRow> = samples.iter().map(|&(lat, lon)| path_row(lat, lon)).collect();
    let mut tiles = BTreeSet::new();
    for seed in &seeds {
        for dp in -1..=1 {
            for dr in -1..=1 {
                if let Some(tile) = PathRow::from_indices(seed.path as i64 + dp, seed.row as i64 + dr) {
                    tiles.insert(tile);
                }
            }
        }
    }
    tiles.into_iter().collect()
}
