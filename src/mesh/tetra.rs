use crate::mesh::point::UNSET;

/// One tetrahedron: four point indices plus the scalar bookkeeping fields
/// named in spec.md §3 (`qual`, `mark`, `flag`) and an optional xtetra
/// index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tetra {
    pub v: [usize; 4],
    pub reference: i32,
    /// Volume/quality scalar, also reused by the interpolation driver to
    /// cache the tet's signed volume (spec.md §4.6 step 1).
    pub qual: f64,
    /// Used as the partitioner's vertex weight.
    pub mark: i64,
    /// Sweep-scoped traversal colour, valid only when `Mesh::base` matches.
    pub flag: usize,
    pub xt: usize,
    pub alive: bool,
}

impl Tetra {
    pub fn new(v: [usize; 4]) -> Self {
        Tetra {
            v,
            reference: 0,
            qual: 0.0,
            mark: 1,
            flag: 0,
            xt: UNSET,
            alive: true,
        }
    }
}

/// For local face `f` (0..4), the three local vertex indices (0..4) that
/// bound it, listed so that walking them in order gives a consistently
/// oriented loop. This is the `idir`/`iarf`-style lookup table used by the
/// group splitter (spec.md §4.5) to find the starting vertex `iploc` and to
/// propagate tags to a face's vertices.
pub const FACE_VERTICES: [[usize; 3]; 4] = [
    [1, 2, 3],
    [0, 3, 2],
    [0, 1, 3],
    [0, 2, 1],
];

/// For local edge `e` (0..6), its two bounding local vertices.
pub const EDGE_VERTICES: [[usize; 2]; 6] = [
    [0, 1],
    [0, 2],
    [0, 3],
    [1, 2],
    [1, 3],
    [2, 3],
];

/// For a given edge index, the two local faces it is shared by (used by the
/// best-effort `PARBDY` edge-shell propagation in spec.md §4.5 "Finalize").
pub const EDGE_FACES: [[usize; 2]; 6] = [
    [2, 3],
    [1, 3],
    [1, 2],
    [0, 3],
    [0, 2],
    [0, 1],
];
