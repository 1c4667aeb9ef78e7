//! Spatial distribution scoring.
//!
//! Three coverage measures, each in [0, 1], averaged into `spread_score`:
//!
//! - `convex_hull_ratio`: hull area of the points / bbox area
//! - `grid_coverage`: occupied cells of a 3×3 grid over the bbox / 9
//! - `nearest_neighbor_spread`: mean nearest-neighbor distance relative to
//!   `sqrt(bbox_area / n)`, the spacing of an even layout
//!
//! `confidence_score` scales the spread by how close the count is to
//! `target_count`. Areas and distances use a local equirectangular projection
//! in meters centred on the bbox. The result does not depend on input order.

use gcp_common::{BoundingBox, GcpCandidate, EARTH_RADIUS_M};
use geo::{Area, ConvexHull, MultiPoint, Point};
use serde::{Deserialize, Serialize};

pub const GRID_SIZE: usize = 3;
pub const DEFAULT_TARGET_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Point count at which count adequacy saturates.
    pub target_count: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionMetrics {
    pub convex_hull_ratio: f64,
    pub grid_coverage: f64,
    pub nearest_neighbor_spread: f64,
    pub spread_score: f64,
    pub confidence_score: f64,
    pub point_count: usize,
}

impl std::fmt::Display for DistributionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "points={} hull={:.3} grid={:.3} nn={:.3} spread={:.3} confidence={:.3}",
            self.point_count,
            self.convex_hull_ratio,
            self.grid_coverage,
            self.nearest_neighbor_spread,
            self.spread_score,
            self.confidence_score
        )
    }
}

fn clamp01(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Equirectangular projection to meters around the bbox center.
struct LocalProjection {
    lat0: f64,
    lon0: f64,
    cos_lat0: f64,
}

impl LocalProjection {
    fn new(bbox: &BoundingBox) -> Self {
        let (lat0, lon0) = bbox.center();
        Self {
            lat0,
            lon0,
            cos_lat0: lat0.to_radians().cos(),
        }
    }

    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = EARTH_RADIUS_M * (lon - self.lon0).to_radians() * self.cos_lat0;
        let y = EARTH_RADIUS_M * (lat - self.lat0).to_radians();
        (x, y)
    }

    fn bbox_area_m2(&self, bbox: &BoundingBox) -> f64 {
        let width = EARTH_RADIUS_M * bbox.lon_span().to_radians() * self.cos_lat0;
        let height = EARTH_RADIUS_M * bbox.lat_span().to_radians();
        (width * height).abs()
    }
}

pub fn score(points: &[GcpCandidate], bbox: &BoundingBox, config: &ScoringConfig) -> DistributionMetrics {
    let n = points.len();
    if n == 0 {
        return DistributionMetrics::default();
    }

    let projection = LocalProjection::new(bbox);
    let bbox_area = projection.bbox_area_m2(bbox);

    let mut projected: Vec<(f64, f64)> = points
        .iter()
        .map(|p| projection.project(p.lat, p.lon))
        .collect();
    projected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let convex_hull_ratio = hull_ratio(&projected, bbox_area);
    let grid_coverage = grid_coverage(points, bbox);
    let nearest_neighbor_spread = nn_spread(&projected, bbox_area);

    let spread_score = clamp01((convex_hull_ratio + grid_coverage + nearest_neighbor_spread) / 3.0);
    let count_adequacy = if config.target_count == 0 {
        1.0
    } else {
        (n as f64 / config.target_count as f64).min(1.0)
    };

    DistributionMetrics {
        convex_hull_ratio,
        grid_coverage,
        nearest_neighbor_spread,
        spread_score,
        confidence_score: clamp01(spread_score * count_adequacy),
        point_count: n,
    }
}

fn hull_ratio(projected: &[(f64, f64)], bbox_area: f64) -> f64 {
    let mut unique = projected.to_vec();
    unique.dedup();
    if unique.len() < 3 || bbox_area <= 0.0 {
        return 0.0;
    }
    let points: Vec<Point<f64>> = unique.into_iter().map(|(x, y)| Point::new(x, y)).collect();
    let hull = MultiPoint::from(points).convex_hull();
    clamp01(hull.unsigned_area() / bbox_area)
}

/// Index of `v` along one axis, or `None` when outside. The last cell is
/// closed on both ends.
fn grid_index(v: f64, min: f64, span: f64) -> Option<usize> {
    if span <= 0.0 {
        return (v == min).then_some(0);
    }
    let t = (v - min) / span;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(((t * GRID_SIZE as f64).floor() as usize).min(GRID_SIZE - 1))
}

fn grid_coverage(points: &[GcpCandidate], bbox: &BoundingBox) -> f64 {
    let mut occupied = [[false; GRID_SIZE]; GRID_SIZE];
    for p in points {
        let row = grid_index(p.lat, bbox.min_lat, bbox.lat_span());
        let col = grid_index(p.lon, bbox.min_lon, bbox.lon_span());
        if let (Some(r), Some(c)) = (row, col) {
            occupied[r][c] = true;
        }
    }
    let covered = occupied.iter().flatten().filter(|&&o| o).count();
    covered as f64 / (GRID_SIZE * GRID_SIZE) as f64
}

fn nn_spread(projected: &[(f64, f64)], bbox_area: f64) -> f64 {
    let n = projected.len();
    if n < 2 || bbox_area <= 0.0 {
        return 0.0;
    }

    let mut nearest: Vec<f64> = projected
        .iter()
        .enumerate()
        .map(|(i, &(xi, yi))| {
            projected
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &(xj, yj))| (xi - xj).hypot(yi - yj))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    nearest.sort_by(f64::total_cmp);

    let mean = nearest.iter().sum::<f64>() / n as f64;
    let expected = (bbox_area / n as f64).sqrt();
    clamp01(mean / expected)
}
