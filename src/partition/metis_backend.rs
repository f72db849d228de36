//! `GraphPartitioner` over the `metis` crate (spec.md §6's `KWAY_LOCAL`),
//! grounded on `metis::Graph`'s builder shape and its `Input`/`Memory`/
//! `Other` error taxonomy (mirrored by [`crate::error::CoreError`]'s own
//! `From<metis::Error>` impl).

use crate::algorithms::element_graph::ElementGraph;
use crate::error::CoreError;
use crate::partition::{GraphPartitioner, PartitionOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetisPartitioner;

impl GraphPartitioner for MetisPartitioner {
    fn part_kway(
        &self,
        graph: &ElementGraph,
        vwgt: Option<&[i64]>,
        nparts: usize,
        options: PartitionOptions,
    ) -> Result<Vec<usize>, CoreError> {
        let n = graph.xadj.len().saturating_sub(1);
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut xadj: Vec<metis::Idx> = graph.xadj.iter().map(|&x| x as metis::Idx).collect();
        let mut adjncy: Vec<metis::Idx> = graph.adjncy.iter().map(|&x| x as metis::Idx).collect();
        let mut adjwgt: Vec<metis::Idx> = graph.adjwgt.iter().map(|&x| x as metis::Idx).collect();
        let mut vwgt_buf: Vec<metis::Idx> = vwgt
            .map(|w| w.iter().map(|&x| x as metis::Idx).collect())
            .unwrap_or_default();
        let mut part = vec![0 as metis::Idx; n];

        let mut builder = metis::Graph::new(1, nparts as metis::Idx, &mut xadj, &mut adjncy)
            .set_adjwgt(&mut adjwgt);
        if !vwgt_buf.is_empty() {
            builder = builder.set_vwgt(&mut vwgt_buf);
        }
        if options.contiguous {
            builder = builder.set_option(metis::option::Contig(true));
        }

        builder.part_kway(&mut part).map_err(|e| {
            let mut err: CoreError = e.into();
            if let CoreError::PartitionerFailure { kind, .. } = err {
                err = CoreError::PartitionerFailure { kind, nparts };
            }
            err
        })?;

        Ok(part.into_iter().map(|p| p as usize).collect())
    }
}
