//! Element-level dual-graph builder (spec.md §4.2): converts one packed
//! mesh into a CSR `(xadj, adjncy, adjwgt)` triple suitable for a k-way
//! partitioner.

use crate::algorithms::group_hash::HUGE_WEIGHT;
use crate::error::CoreError;
use crate::mesh::tetra::FACE_VERTICES;
use crate::mesh::{Mesh, Tag};

/// CSR dual graph of one mesh.
#[derive(Debug, Clone, Default)]
pub struct ElementGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub adjwgt: Vec<i64>,
}

/// Builds the element-level dual graph of `mesh`.
///
/// Precondition: `mesh` is packed (no holes). Edge weight is [`HUGE_WEIGHT`]
/// across a face tagged `OLD_PARBDY` (it used to be a process boundary,
/// and re-cutting it would invalidate cached neighbor pairings), `1`
/// otherwise.
pub fn build_element_graph(mesh: &mut Mesh) -> Result<ElementGraph, CoreError> {
    if !mesh.is_packed() {
        return Err(CoreError::StructuralInvariantViolation {
            subsystem: "element_graph",
            detail: "mesh must be packed before building its dual graph".to_string(),
        });
    }
    mesh.ensure_adja();
    let ne = mesh.tetra_count();

    let mut xadj = vec![0usize; ne + 1];
    for k in 0..ne {
        let adja = mesh.adja().unwrap();
        let count = (0..4).filter(|&f| adja.get(k, f).is_some()).count();
        xadj[k + 1] = xadj[k] + count;
    }

    let nadj = xadj[ne];
    let mut adjncy = vec![0usize; nadj];
    let mut adjwgt = vec![1i64; nadj];

    for k in 0..ne {
        let mut cursor = xadj[k];
        for f in 0..4 {
            let adja = mesh.adja().unwrap();
            if let Some((j, _g)) = adja.get(k, f) {
                adjncy[cursor] = j;
                adjwgt[cursor] = if face_is_old_parbdy(mesh, k, f) {
                    HUGE_WEIGHT
                } else {
                    1
                };
                cursor += 1;
            }
        }
    }

    Ok(ElementGraph {
        xadj,
        adjncy,
        adjwgt,
    })
}

fn face_is_old_parbdy(mesh: &Mesh, k: usize, f: usize) -> bool {
    let xt = mesh.tetra(k).xt;
    if xt == crate::mesh::UNSET {
        return false;
    }
    mesh.xtetra(xt).face_tag[f].contains(Tag::OLD_PARBDY)
}

/// Validates the canonical CSR invariants from spec.md §8: `xadj`
/// nondecreasing, `xadj[ne] == len(adjncy) == len(adjwgt)`, every edge
/// `(u, v)` has `v != u` and `v` in range.
pub fn check_csr_invariants(graph: &ElementGraph, n_total: usize) -> Result<(), CoreError> {
    if !graph.xadj.windows(2).all(|w| w[0] <= w[1]) {
        return Err(CoreError::StructuralInvariantViolation {
            subsystem: "element_graph",
            detail: "xadj is not nondecreasing".to_string(),
        });
    }
    let last = *graph.xadj.last().unwrap_or(&0);
    if last != graph.adjncy.len() || last != graph.adjwgt.len() {
        return Err(CoreError::StructuralInvariantViolation {
            subsystem: "element_graph",
            detail: "xadj[ne] does not match adjncy/adjwgt length".to_string(),
        });
    }
    for (u, w) in graph.xadj.windows(2).enumerate() {
        for &v in &graph.adjncy[w[0]..w[1]] {
            if v == u || v >= n_total {
                return Err(CoreError::StructuralInvariantViolation {
                    subsystem: "element_graph",
                    detail: format!("edge ({u}, {v}) is a self-loop or out of range"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Mesh, Tetra};

    fn two_tet_mesh() -> Mesh {
        // Two tets sharing a face: {0,1,2,3} and {1,2,3,4}.
        let mut mesh = Mesh::with_capacity(5, 2);
        for _ in 0..5 {
            mesh.push_point(crate::mesh::Point::new([0.0, 0.0, 0.0])).unwrap();
        }
        mesh.push_tetra(Tetra::new([0, 1, 2, 3])).unwrap();
        mesh.push_tetra(Tetra::new([1, 2, 3, 4])).unwrap();
        mesh
    }

    #[test]
    fn two_tets_share_one_edge_each() {
        let mut mesh = two_tet_mesh();
        let graph = build_element_graph(&mut mesh).unwrap();
        assert_eq!(graph.xadj, vec![0, 1, 2]);
        assert_eq!(graph.adjncy, vec![1, 0]);
        assert_eq!(graph.adjwgt, vec![1, 1]);
        check_csr_invariants(&graph, 2).unwrap();
    }
}
