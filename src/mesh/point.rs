use crate::mesh::tags::Tag;

/// Sentinel used throughout the crate for "no value yet" on indices that are
/// otherwise non-negative (node communicator positions, xpoint/xtetra
/// indices, flags). Kept as `usize::MAX` rather than `Option<usize>` in the
/// hot structures below because the algorithms in spec.md §4 compare it
/// routinely against other indices (`SHIFT = |UNSET|+1` in the distributed
/// graph builder) and a dedicated sentinel avoids an `Option` unwrap on
/// every touch of a point/tet during a sweep.
pub const UNSET: usize = usize::MAX;

/// One mesh vertex.
///
/// `tmp` and `flag` are scratch fields: whichever algorithm currently holds
/// the mesh is responsible for resetting them relative to `Mesh::base`
/// before using them (spec.md §3's flag invariant, §5's scratch ownership
/// rule).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub coords: [f64; 3],
    pub reference: i32,
    pub tag: Tag,
    /// Position in the parmesh-wide internal node communicator, or `UNSET`.
    pub tmp: usize,
    /// Sweep-scoped scratch value, valid only when `Mesh::base` matches the
    /// sweep that wrote it.
    pub flag: usize,
    /// Index into the xpoint table, or `UNSET` if this point carries no
    /// surface-normal/ridge data.
    pub xp: usize,
    /// Whether this table slot is alive (packed meshes have no holes, but
    /// unpacked intermediate meshes do).
    pub alive: bool,
}

impl Point {
    pub fn new(coords: [f64; 3]) -> Self {
        Point {
            coords,
            reference: 0,
            tag: Tag::empty(),
            tmp: UNSET,
            flag: 0,
            xp: UNSET,
            alive: true,
        }
    }
}

/// Surface normal / ridge data extending a [`Point`] (spec.md §3, `xPoint`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XPoint {
    pub normal: [f64; 3],
    pub ridge_tangent: Option<[f64; 3]>,
}
