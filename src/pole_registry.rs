/// Pole cell registry
///
/// H3 cells (resolutions 0-14) whose boundary contains the north or south pole.
/// The identifiers were enumerated against the H3 indexing scheme and are kept
/// as a fixed table; they are not recomputed at runtime.

use std::collections::{BTreeSet, HashSet};

use h3o::CellIndex;
use once_cell::sync::Lazy;

/// Raw identifiers of every pole-containing cell, ordered by resolution.
pub const POLE_CELL_IDS: [u64; 42] = [
    0x8003fffffffffff,
    0x80f3fffffffffff,
    0x81033ffffffffff,
    0x81f2bffffffffff,
    0x820327fffffffff,
    0x82f297fffffffff,
    0x830326fffffffff,
    0x83f293fffffffff,
    0x8403263ffffffff,
    0x84f2939ffffffff,
    0x8503262bfffffff,
    0x85f29383fffffff,
    0x8603262a7ffffff,
    0x86f293957ffffff,
    0x8703262a6ffffff,
    0x87f293952ffffff,
    0x8803262a69fffff,
    0x88f2939521fffff,
    0x8903262a44bffff,
    0x8903262a697ffff,
    0x89f2939520bffff,
    0x89f2939520fffff,
    0x8a03262a4497fff,
    0x8a03262a6967fff,
    0x8af293952087fff,
    0x8af2939520c7fff,
    0x8b03262a4490fff,
    0x8b03262a6964fff,
    0x8bf293952086fff,
    0x8bf2939520c6fff,
    0x8c03262a4490dff,
    0x8c03262a69643ff,
    0x8cf2939520865ff,
    0x8cf2939520c69ff,
    0x8d03262a4490cff,
    0x8d03262a696433f,
    0x8df2939520864bf,
    0x8df2939520c687f,
    0x8e03262a4490cf7,
    0x8e03262a696431f,
    0x8ef2939520864f7,
    0x8ef2939520c684f,
];

static POLE_CELLS: Lazy<HashSet<CellIndex>> = Lazy::new(|| {
    POLE_CELL_IDS
        .iter()
        .filter_map(|&raw| CellIndex::try_from(raw).ok())
        .collect()
});

/// Check whether a cell is one of the registered pole cells
pub fn is_pole(cell: CellIndex) -> bool {
    POLE_CELLS.contains(&cell)
}

/// Remove every pole cell from a cell set
pub fn exclude_poles(cells: BTreeSet<CellIndex>) -> BTreeSet<CellIndex> {
    cells.into_iter().filter(|cell| !is_pole(*cell)).collect()
}

/// All registered pole cells
#[cfg(test)]
pub fn pole_cells() -> impl Iterator<Item = CellIndex> {
    POLE_CELLS.iter().copied()
}
