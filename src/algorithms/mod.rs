//! Partitioning, graph-building and group-management algorithms (spec.md §4).

pub mod distributed_graph;
pub mod element_graph;
pub mod group_hash;
pub mod interpolate;
pub mod postprocess;
pub mod split;
