/// Polygon to H3 cells
///
/// Computes the H3 cells whose centroid falls inside a polygon, either at a
/// fixed resolution or by searching upward from resolution 0 until enough
/// cells are produced.
///
/// Coordinate order: rings are `(longitude, latitude)` pairs. H3 itself
/// (and `h3o::LatLng::new`) works in `(latitude, longitude)` order, so the
/// ring is handed to the tiler as `geo` coordinates with `x = lng, y = lat`
/// and never as `LatLng` pairs.

use std::collections::BTreeSet;

use geo::{Coord, LineString, Polygon};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, Resolution};
use tracing::{debug, warn};

use crate::constants::MAX_ADAPTIVE_RESOLUTION;
use crate::pole_registry;

/// Cells covering a polygon along with the resolution they were computed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCoverage {
    pub resolution: Resolution,
    pub cells: BTreeSet<CellIndex>,
}

/// Progress of the adaptive resolution search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Next coverage to compute is at this resolution
    Searching(Resolution),
    /// Coverage at this resolution reached `min_cells`
    Found(Resolution),
    /// Coverage at the finest resolution is still below `min_cells`
    CeilingReached(Resolution),
}

impl SearchState {
    /// Advance after computing a coverage of `n_cells` at the current resolution
    pub fn advance(self, n_cells: usize, min_cells: usize) -> SearchState {
        match self {
            SearchState::Searching(res) if n_cells >= min_cells => SearchState::Found(res),
            SearchState::Searching(res) if u8::from(res) >= u8::from(MAX_ADAPTIVE_RESOLUTION) => {
                SearchState::CeilingReached(res)
            }
            SearchState::Searching(res) => match Resolution::try_from(u8::from(res) + 1).ok() {
                Some(next) => SearchState::Searching(next),
                None => SearchState::CeilingReached(res),
            },
            done => done,
        }
    }

    pub fn is_done(&self) -> bool {
        !matches!(self, SearchState::Searching(_))
    }
}

/// Build a closed `geo` polygon from a `(lng, lat)` ring
fn ring_to_polygon(ring: &[(f64, f64)]) -> Polygon<f64> {
    let exterior: LineString<f64> = ring
        .iter()
        .map(|&(lng, lat)| Coord { x: lng, y: lat })
        .collect();
    Polygon::new(exterior, vec![])
}

/// Cells whose centroid lies inside `polygon` at exactly `resolution`
///
/// Invalid or degenerate polygons produce an empty set.
pub fn cells_at_resolution(polygon: &Polygon<f64>, resolution: Resolution) -> BTreeSet<CellIndex> {
    let mut tiler = TilerBuilder::new(resolution)
        .containment_mode(ContainmentMode::ContainsCentroid)
        .build();

    if let Err(err) = tiler.add(polygon.clone()) {
        warn!(resolution = u8::from(resolution), %err, "polygon rejected by tiler");
        return BTreeSet::new();
    }

    tiler.into_coverage().collect()
}

/// Adaptive search: raise the resolution until the coverage reaches
/// `min_cells` or the finest resolution has been computed.
///
/// The last computed coverage is returned even when it stays below
/// `min_cells`.
pub fn search_coverage(polygon: &Polygon<f64>, min_cells: usize) -> CellCoverage {
    let mut state = SearchState::Searching(Resolution::Zero);
    let mut coverage = CellCoverage {
        resolution: Resolution::Zero,
        cells: BTreeSet::new(),
    };

    while let SearchState::Searching(res) = state {
        coverage = CellCoverage {
            resolution: res,
            cells: cells_at_resolution(polygon, res),
        };
        debug!(
            resolution = u8::from(res),
            cells = coverage.cells.len(),
            min_cells,
            "adaptive coverage step"
        );
        state = state.advance(coverage.cells.len(), min_cells);
    }

    if let SearchState::CeilingReached(res) = state {
        debug!(resolution = u8::from(res), min_cells, "adaptive search hit resolution ceiling");
    }

    coverage
}

/// Cells covering a `(lng, lat)` ring.
///
/// With `resolution` set the coverage is computed once at that resolution,
/// otherwise the adaptive search runs with `min_cells` as target. Pole
/// cells are removed after the search so they never affect where it stops.
pub fn polygon_to_cells(
    ring: &[(f64, f64)],
    resolution: Option<Resolution>,
    min_cells: usize,
    exclude_poles: bool,
) -> CellCoverage {
    let polygon = ring_to_polygon(ring);

    let mut coverage = match resolution {
        Some(res) => CellCoverage {
            resolution: res,
            cells: cells_at_resolution(&polygon, res),
        },
        None => search_coverage(&polygon, min_cells),
    };

    if exclude_poles {
        coverage.cells = pole_registry::exclude_poles(coverage.cells);
    }

    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::assert_ge;

    fn square(cx: f64, cy: f64, half: f64) -> Vec<(f64, f64)> {
        vec![
            (cx - half, cy + half),
            (cx - half, cy - half),
            (cx + half, cy - half),
            (cx + half, cy + half),
        ]
    }

    #[test]
    fn test_state_machine_transitions() {
        let start = SearchState::Searching(Resolution::Zero);
        assert_eq!(start.advance(3, 10), SearchState::Searching(Resolution::One));
        assert_eq!(start.advance(10, 10), SearchState::Found(Resolution::Zero));

        let last = SearchState::Searching(Resolution::Fifteen);
        assert_eq!(last.advance(1, 10), SearchState::CeilingReached(Resolution::Fifteen));
        assert_eq!(last.advance(12, 10), SearchState::Found(Resolution::Fifteen));

        let found = SearchState::Found(Resolution::Four);
        assert_eq!(found.advance(0, 10), found);
        assert!(found.is_done());
        assert!(!start.is_done());
    }

    #[test]
    fn test_fixed_resolution_cells_share_resolution() {
        let coverage = polygon_to_cells(&square(10.0, 45.0, 2.0), Some(Resolution::Four), 10, true);
        assert_eq!(coverage.resolution, Resolution::Four);
        assert!(!coverage.cells.is_empty());
        assert!(coverage.cells.iter().all(|c| c.resolution() == Resolution::Four));
    }

    #[test]
    fn test_adaptive_reaches_min_cells() {
        let coverage = polygon_to_cells(&square(-100.0, 40.0, 3.0), None, 25, true);
        assert_ge!(coverage.cells.len(), 25);
        assert!(coverage.cells.iter().all(|c| c.resolution() == coverage.resolution));
    }

    #[test]
    fn test_adaptive_stops_at_first_sufficient_resolution() {
        let polygon = ring_to_polygon(&square(20.0, 0.0, 5.0));
        let coverage = search_coverage(&polygon, 30);
        assert_ge!(coverage.cells.len(), 30);

        if let Some(prev) = u8::from(coverage.resolution).checked_sub(1) {
            let prev = Resolution::try_from(prev).unwrap();
            assert!(cells_at_resolution(&polygon, prev).len() < 30);
        }
    }

    #[test]
    fn test_min_cells_met_at_res0() {
        let coverage = polygon_to_cells(&square(0.0, 0.0, 80.0), None, 1, false);
        assert_eq!(coverage.resolution, Resolution::Zero);
        assert_ge!(coverage.cells.len(), 1);
    }

    #[test]
    fn test_degenerate_polygon_is_empty() {
        let line = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        let coverage = polygon_to_cells(&line, Some(Resolution::Five), 10, true);
        assert!(coverage.cells.is_empty());
    }
}
