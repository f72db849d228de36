//! `GraphPartitioner` over the `scotch` crate, grounded on
//! `tools/src/scotch.rs`'s `Standard` runner (same `Graph::build` +
//! `Architecture::complete` + `mapping(..).compute(..)` shape).

use crate::algorithms::element_graph::ElementGraph;
use crate::error::CoreError;
use crate::partition::{GraphPartitioner, PartitionOptions};
use scotch::graph::Data;
use scotch::Graph;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScotchPartitioner;

impl GraphPartitioner for ScotchPartitioner {
    fn part_kway(
        &self,
        graph: &ElementGraph,
        vwgt: Option<&[i64]>,
        nparts: usize,
        _options: PartitionOptions,
    ) -> Result<Vec<usize>, CoreError> {
        let n = graph.xadj.len().saturating_sub(1);
        if n == 0 {
            return Ok(Vec::new());
        }
        let xadj: Vec<scotch::Num> = graph.xadj.iter().map(|&x| x as scotch::Num).collect();
        let adjncy: Vec<scotch::Num> = graph.adjncy.iter().map(|&x| x as scotch::Num).collect();
        let adjwgt: Vec<scotch::Num> = graph.adjwgt.iter().map(|&x| x as scotch::Num).collect();
        let velotab: Vec<scotch::Num> = match vwgt {
            Some(w) => w.iter().map(|&x| x as scotch::Num).collect(),
            None => Vec::new(),
        };

        let mut strat = scotch::Strategy::new();
        let arch = scotch::Architecture::complete(nparts as scotch::Num);
        let mut part = vec![0 as scotch::Num; n];

        let graph_data = Data::new(0, &xadj, &[], &velotab, &[], &adjncy, &adjwgt);
        let mut built = Graph::build(&graph_data).map_err(|_| CoreError::PartitionerFailure {
            kind: crate::error::PartitionerFailureKind::InvalidInput,
            nparts,
        })?;
        built.check().map_err(|_| CoreError::PartitionerFailure {
            kind: crate::error::PartitionerFailureKind::InvalidInput,
            nparts,
        })?;
        built
            .mapping(&arch, &mut part)
            .compute(&mut strat)
            .map_err(|_| CoreError::PartitionerFailure {
                kind: crate::error::PartitionerFailureKind::Other,
                nparts,
            })?;

        Ok(part.into_iter().map(|p| p as usize).collect())
    }
}
