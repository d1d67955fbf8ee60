/// Global H3 grid generation
///
/// Expands the 122 resolution-0 base cells down to a target resolution.
/// Expansion is capped at resolution 4 since the full sphere beyond that
/// is too large to build per request.

use std::collections::BTreeSet;

use h3o::{CellIndex, Resolution};
use tracing::debug;

use crate::constants::MAX_GLOBAL_RESOLUTION;
use crate::pole_registry;

/// Clamp a requested global resolution into the supported range [0, 4]
pub fn clamp_global_resolution(resolution: i32) -> Resolution {
    let clamped = resolution.clamp(0, MAX_GLOBAL_RESOLUTION as i32) as u8;
    // 0..=4 is always a valid H3 resolution
    Resolution::try_from(clamped).unwrap_or(Resolution::Zero)
}

/// All H3 cells covering the globe at `resolution` (clamped to [0, 4])
pub fn global_cells(resolution: i32, exclude_poles: bool) -> BTreeSet<CellIndex> {
    let resolution = clamp_global_resolution(resolution);

    let cells: BTreeSet<CellIndex> = if resolution == Resolution::Zero {
        CellIndex::base_cells().collect()
    } else {
        CellIndex::base_cells()
            .flat_map(|base_cell| base_cell.children(resolution))
            .collect()
    };

    debug!(
        resolution = u8::from(resolution),
        cells = cells.len(),
        "expanded global grid"
    );

    if exclude_poles {
        pole_registry::exclude_poles(cells)
    } else {
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RES0_CELL_COUNT;

    #[test]
    fn test_res0_counts() {
        assert_eq!(global_cells(0, false).len(), RES0_CELL_COUNT);
        assert_eq!(global_cells(0, true).len(), RES0_CELL_COUNT - 2);
    }

    #[test]
    fn test_resolution_is_clamped() {
        assert_eq!(clamp_global_resolution(-3), Resolution::Zero);
        assert_eq!(clamp_global_resolution(2), Resolution::Two);
        assert_eq!(clamp_global_resolution(9), Resolution::Four);
        assert_eq!(global_cells(-1, false), global_cells(0, false));
    }

    #[test]
    fn test_res1_count() {
        // 110 hexagons with 7 children, 12 pentagons with 6
        assert_eq!(global_cells(1, false).len(), 842);
    }
}
