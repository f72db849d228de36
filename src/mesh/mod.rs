//! The local mesh: points, tetrahedra and their boundary extension tables
//! (spec.md §3).

pub mod adja;
pub mod growth;
pub mod point;
pub mod pool;
pub mod tags;
pub mod tetra;

pub use adja::Adja;
pub use point::{Point, XPoint, UNSET};
pub use tags::Tag;
pub use tetra::{Tetra, EDGE_FACES, EDGE_VERTICES, FACE_VERTICES};
pub use xentity::XTetra;

mod xentity {
    pub use crate::mesh::xentity::*;
}

use crate::error::CoreError;
use crate::mesh::growth::{Table, DEFAULT_GAP};

/// Prisms, triangles, quads and edges are carried opaquely through splits:
/// only the vertex indices are remapped (spec.md §3). A single generic
/// struct covers all four since the engine never inspects anything but
/// their vertex list and reference.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueElement<const N: usize> {
    pub v: [usize; N],
    pub reference: i32,
}

pub type Prism = OpaqueElement<6>;
pub type Triangle = OpaqueElement<3>;
pub type Quad = OpaqueElement<4>;
pub type Edge = OpaqueElement<2>;

/// Remaps every opaque element whose vertices are all present under
/// `remap`, dropping one entirely if any of its vertices maps to `None`
/// (spec.md §3: prisms/triangles/quads/edges are "carried opaquely
/// through splits; only the vertex indices are remapped"). Shared by the
/// group splitter and the merge driver, each with their own notion of
/// "old point index -> new point index".
pub fn remap_opaque_elements<const N: usize>(
    elements: &[OpaqueElement<N>],
    remap: impl Fn(usize) -> Option<usize>,
) -> Vec<OpaqueElement<N>> {
    elements
        .iter()
        .filter_map(|e| {
            let mut v = [0usize; N];
            for (i, &src) in e.v.iter().enumerate() {
                v[i] = remap(src)?;
            }
            Some(OpaqueElement { v, reference: e.reference })
        })
        .collect()
}

/// One local submesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    points: Table<Point>,
    tetras: Table<Tetra>,
    xpoints: Table<XPoint>,
    xtetras: Table<XTetra>,
    prisms: Vec<Prism>,
    triangles: Vec<Triangle>,
    quads: Vec<Quad>,
    edges: Vec<Edge>,
    adja: Option<Adja>,
    /// Monotone sweep counter; `point.flag`/`tet.flag` are only meaningful
    /// when they equal the value of `base` the algorithm bumped before its
    /// sweep (spec.md §3's flag invariant).
    pub base: usize,
}

impl Mesh {
    pub fn with_capacity(np: usize, ne: usize) -> Self {
        Mesh {
            points: Table::with_capacity(np),
            tetras: Table::with_capacity(ne),
            xpoints: Table::with_capacity(np / 4 + 1),
            xtetras: Table::with_capacity(ne / 3 + 1),
            prisms: Vec::new(),
            triangles: Vec::new(),
            quads: Vec::new(),
            edges: Vec::new(),
            adja: None,
            base: 0,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn tetra_count(&self) -> usize {
        self.tetras.len()
    }

    /// Number of *live* tetrahedra (the mesh may not be packed).
    pub fn live_tetra_count(&self) -> usize {
        self.tetras.iter().filter(|t| t.alive).count()
    }

    pub fn points(&self) -> &[Point] {
        self.points.as_slice()
    }

    pub fn points_mut(&mut self) -> &mut [Point] {
        self.points.as_mut_slice()
    }

    pub fn tetras(&self) -> &[Tetra] {
        self.tetras.as_slice()
    }

    pub fn tetras_mut(&mut self) -> &mut [Tetra] {
        self.tetras.as_mut_slice()
    }

    pub fn point(&self, i: usize) -> &Point {
        &self.points[i]
    }

    pub fn point_mut(&mut self, i: usize) -> &mut Point {
        &mut self.points[i]
    }

    pub fn tetra(&self, i: usize) -> &Tetra {
        &self.tetras[i]
    }

    pub fn tetra_mut(&mut self, i: usize) -> &mut Tetra {
        &mut self.tetras[i]
    }

    pub fn xtetra(&self, i: usize) -> &XTetra {
        &self.xtetras[i]
    }

    pub fn xtetra_mut(&mut self, i: usize) -> &mut XTetra {
        &mut self.xtetras[i]
    }

    pub fn xpoint(&self, i: usize) -> &XPoint {
        &self.xpoints[i]
    }

    pub fn push_point(&mut self, p: Point) -> Result<usize, CoreError> {
        self.points.push_gap(p, DEFAULT_GAP)
    }

    pub fn push_tetra(&mut self, t: Tetra) -> Result<usize, CoreError> {
        self.tetras.push_double(t)
    }

    pub fn push_xtetra(&mut self, x: XTetra) -> Result<usize, CoreError> {
        self.xtetras.push_double(x)
    }

    pub fn push_xpoint(&mut self, x: XPoint) -> Result<usize, CoreError> {
        self.xpoints.push_gap(x, DEFAULT_GAP)
    }

    pub fn adja(&self) -> Option<&Adja> {
        self.adja.as_ref()
    }

    pub fn adja_mut(&mut self) -> &mut Adja {
        if self.adja.is_none() {
            self.adja = Some(Adja::build(self.tetras.as_slice()));
        }
        self.adja.as_mut().unwrap()
    }

    pub fn set_adja(&mut self, adja: Adja) {
        self.adja = Some(adja);
    }

    /// Ensures `adja` is present and up to date, building it from scratch if
    /// absent (spec.md §4.2 step 1).
    pub fn ensure_adja(&mut self) {
        if self.adja.is_none() {
            self.adja = Some(Adja::build(self.tetras.as_slice()));
        }
    }

    pub fn prisms(&self) -> &[Prism] {
        &self.prisms
    }
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
    pub fn push_triangle(&mut self, t: Triangle) {
        self.triangles.push(t);
    }
    pub fn push_prism(&mut self, p: Prism) {
        self.prisms.push(p);
    }
    pub fn push_quad(&mut self, q: Quad) {
        self.quads.push(q);
    }
    pub fn push_edge(&mut self, e: Edge) {
        self.edges.push(e);
    }

    /// Bumps the sweep counter, invalidating every previously-stored
    /// `flag`/`tmp` reading relative to it (spec.md §3's flag invariant).
    pub fn next_sweep(&mut self) -> usize {
        self.base += 1;
        self.base
    }

    /// Shrinks every table to its exact live count (spec.md §3's final
    /// "clean" step).
    pub fn clean(&mut self) {
        self.points.shrink_to_fit();
        self.tetras.shrink_to_fit();
        self.xpoints.shrink_to_fit();
        self.xtetras.shrink_to_fit();
        self.prisms.shrink_to_fit();
        self.triangles.shrink_to_fit();
        self.quads.shrink_to_fit();
        self.edges.shrink_to_fit();
    }

    /// Whether the mesh is packed: every tetra `0..tetra_count()` is alive.
    /// Group-splitter and dual-graph-builder preconditions both require
    /// this (spec.md §4.2, §4.5).
    pub fn is_packed(&self) -> bool {
        self.tetras.iter().all(|t| t.alive)
    }
}
