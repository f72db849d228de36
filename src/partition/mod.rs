//! External KWAY partitioner interfaces (spec.md §6): `KWAY_LOCAL` and
//! `KWAY_DIST` are both modeled as traits so the core stays generic over
//! which real backend is linked in, the same way the teacher's own
//! `tools` crate picks between a `scotch` and a `metis` runner behind a
//! common `ToRunner` shape.

pub mod dist;
#[cfg(feature = "metis")]
pub mod metis_backend;
#[cfg(feature = "scotch")]
pub mod scotch_backend;

use crate::algorithms::element_graph::ElementGraph;
use crate::error::CoreError;

/// Per-call tuning knobs for a sequential `KWAY_LOCAL` partition (spec.md
/// §6: "Options include CONTIG (bool) and a per-constraint imbalance").
#[derive(Debug, Clone, Copy)]
pub struct PartitionOptions {
    pub contiguous: bool,
    pub imbalance: f64,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        PartitionOptions {
            contiguous: false,
            imbalance: 1.03,
        }
    }
}

/// `KWAY_LOCAL(xadj, adjncy, vwgt, adjwgt, nparts, options) -> part[],
/// status` (spec.md §6), sequential, single-process.
pub trait GraphPartitioner {
    fn part_kway(
        &self,
        graph: &ElementGraph,
        vwgt: Option<&[i64]>,
        nparts: usize,
        options: PartitionOptions,
    ) -> Result<Vec<usize>, CoreError>;
}

pub use dist::{CentralizedDistPartitioner, DistGraphPartitioner};
