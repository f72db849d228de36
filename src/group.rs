//! One process-local group: a [`Mesh`] plus its solutions and the
//! communicator maps that tie its new interfaces back into the parmesh
//! (spec.md §3).

use crate::comm::{Face2Int, Node2Int};
use crate::mesh::Mesh;

/// Metric carried by a group: scalar (size 1, isotropic) or tensor (size 6,
/// the symmetric 3x3 anisotropic metric), dense per point.
#[derive(Debug, Clone)]
pub enum Metric {
    Scalar(Vec<f64>),
    Tensor(Vec<[f64; 6]>),
}

impl Metric {
    pub fn scalar_with_len(n: usize) -> Self {
        Metric::Scalar(vec![0.0; n])
    }

    pub fn tensor_with_len(n: usize) -> Self {
        Metric::Tensor(vec![[0.0; 6]; n])
    }

    pub fn len(&self) -> usize {
        match self {
            Metric::Scalar(v) => v.len(),
            Metric::Tensor(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A zero-value entry, used to pad the metric table when the group
    /// splitter appends a new point (spec.md §4.5: "copy the metric value
    /// at the same stride").
    pub fn push_zero(&mut self) {
        match self {
            Metric::Scalar(v) => v.push(0.0),
            Metric::Tensor(v) => v.push([0.0; 6]),
        }
    }

    pub fn copy_value(&mut self, dst: usize, src_metric: &Metric, src: usize) {
        match (self, src_metric) {
            (Metric::Scalar(dst_v), Metric::Scalar(src_v)) => dst_v[dst] = src_v[src],
            (Metric::Tensor(dst_v), Metric::Tensor(src_v)) => dst_v[dst] = src_v[src],
            _ => unreachable!("metric size class mismatch between groups"),
        }
    }
}

/// An auxiliary scalar/vector solution field (displacement, level-set,
/// or anything else the sequential remesher carries alongside the metric,
/// SPEC_FULL.md §3).
#[derive(Debug, Clone)]
pub struct SolutionField {
    pub name: &'static str,
    pub dim: usize,
    pub values: Vec<f64>,
}

/// One local group: owns its mesh, solutions, and the maps tying its newly
/// introduced interfaces to the parmesh-wide internal communicators.
#[derive(Debug, Clone)]
pub struct Group {
    pub mesh: Mesh,
    pub met: Metric,
    pub ls: Option<Vec<f64>>,
    pub disp: Option<Vec<[f64; 3]>>,
    pub fields: Vec<SolutionField>,
    pub node2int: Node2Int,
    pub face2int: Face2Int,
}

impl Group {
    pub fn new(mesh: Mesh, met: Metric) -> Self {
        Group {
            mesh,
            met,
            ls: None,
            disp: None,
            fields: Vec::new(),
            node2int: Node2Int::default(),
            face2int: Face2Int::default(),
        }
    }

    /// Sum of `tet.mark` over all live tets, used as the group's vertex
    /// weight in the distributed dual graph (spec.md §4.3 step 2).
    pub fn weight(&self) -> i64 {
        self.mesh
            .tetras()
            .iter()
            .filter(|t| t.alive)
            .map(|t| t.mark)
            .sum()
    }
}
