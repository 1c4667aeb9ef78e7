//! Search-area resolution: H3 cells or an explicit rectangle → bounding box.

use std::str::FromStr;

use gcp_common::{AreaError, BoundingBox};
use h3o::{CellIndex, LatLng};
use serde::{Deserialize, Serialize};

/// How the caller describes the area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaSpec {
    Cells(Vec<String>),
    BoundingBox(BoundingBox),
}

/// A validated area: the rectangle every source is queried with, plus the
/// decoded cells when the area was given as cells.
#[derive(Debug, Clone)]
pub struct ResolvedArea {
    pub bbox: BoundingBox,
    pub cells: Vec<CellIndex>,
}

impl AreaSpec {
    pub fn resolve(&self) -> Result<ResolvedArea, AreaError> {
        match self {
            AreaSpec::Cells(ids) => {
                let cells = decode_cells(ids)?;
                Ok(ResolvedArea {
                    bbox: enclosing_bbox(&cells)?,
                    cells,
                })
            }
            // Fields are public, so re-validate.
            AreaSpec::BoundingBox(b) => Ok(ResolvedArea {
                bbox: BoundingBox::new(b.min_lat, b.min_lon, b.max_lat, b.max_lon)?,
                cells: Vec::new(),
            }),
        }
    }
}

impl ResolvedArea {
    /// True when `(lat, lon)` falls inside one of the cells, at that cell's
    /// resolution. Always true for areas given as a rectangle.
    pub fn contains_in_cells(&self, lat: f64, lon: f64) -> bool {
        if self.cells.is_empty() {
            return true;
        }
        let Ok(point) = LatLng::new(lat, lon) else {
            return false;
        };
        self.cells
            .iter()
            .any(|cell| point.to_cell(cell.resolution()) == *cell)
    }
}

/// Smallest rectangle containing every boundary vertex of every cell.
pub fn resolve_cells<S: AsRef<str>>(cell_ids: &[S]) -> Result<BoundingBox, AreaError> {
    enclosing_bbox(&decode_cells(cell_ids)?)
}

fn decode_cells<S: AsRef<str>>(cell_ids: &[S]) -> Result<Vec<CellIndex>, AreaError> {
    if cell_ids.is_empty() {
        return Err(AreaError::EmptyInput);
    }
    cell_ids
        .iter()
        .map(|id| {
            let id = id.as_ref().trim();
            CellIndex::from_str(id).map_err(|_| AreaError::InvalidCell(id.to_string()))
        })
        .collect()
}

fn enclosing_bbox(cells: &[CellIndex]) -> Result<BoundingBox, AreaError> {
    if cells.is_empty() {
        return Err(AreaError::EmptyInput);
    }

    let mut min_lat = f64::INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut max_lon = f64::NEG_INFINITY;

    for cell in cells {
        for vertex in cell.boundary().iter() {
            min_lat = min_lat.min(vertex.lat());
            max_lat = max_lat.max(vertex.lat());
            min_lon = min_lon.min(vertex.lng());
            max_lon = max_lon.max(vertex.lng());
        }
    }

    BoundingBox::new(min_lat, min_lon, max_lat, max_lon)
}
