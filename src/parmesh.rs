//! The process-level container: groups, internal/external communicators,
//! and process-wide state (spec.md §3).

use crate::comm::{ExtComm, IntComm};
use crate::group::Group;

/// Which external KWAY backend to route `part_mesh_elts`/`part_grps_*`
/// through. Mirrors the teacher's `tools` crate feature split
/// (`default = ["scotch", "metis"]`): both are real partitioner crates, one
/// chosen at runtime rather than compile time here since a `ParMesh` is a
/// long-lived, reconfigurable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionerChoice {
    Metis,
    Scotch,
}

/// Process-wide, user-tunable configuration (SPEC_FULL.md §10). No file
/// parsing: building/tuning a `Config` is the caller's job, exactly as
/// `coupe::KMeans`'s settings are built in-process rather than read from a
/// config file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte ceiling consulted by every growable mesh table
    /// (SPEC_FULL.md §3, memory budget accounting).
    pub mem_max: usize,
    pub partitioner: PartitionerChoice,
    /// Whether the caller wants the partitioner to enforce contiguous
    /// parts; may be downgraded to `false` process-wide by
    /// `check_and_reset_contiguity` (spec.md §4.4.2).
    pub contiguous_mode: bool,
    /// Verbosity level consulted by the logging layer to gate `tracing`
    /// events (SPEC_FULL.md §3).
    pub verbosity: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mem_max: 2usize.pow(30),
            partitioner: PartitionerChoice::Metis,
            contiguous_mode: true,
            verbosity: 1,
        }
    }
}

/// Process-level container of groups and communicators.
#[derive(Debug, Clone)]
pub struct ParMesh {
    pub rank: i32,
    pub nprocs: i32,
    pub config: Config,
    pub listgrp: Vec<Group>,
    pub old_listgrp: Option<Vec<Group>>,
    pub int_node_comm: IntComm,
    pub int_face_comm: IntComm,
    pub ext_node_comm: Vec<ExtComm>,
    pub ext_face_comm: Vec<ExtComm>,
}

impl ParMesh {
    pub fn new(rank: i32, nprocs: i32, config: Config) -> Self {
        ParMesh {
            rank,
            nprocs,
            config,
            listgrp: Vec::new(),
            old_listgrp: None,
            int_node_comm: IntComm::default(),
            int_face_comm: IntComm::default(),
            ext_node_comm: Vec::new(),
            ext_face_comm: Vec::new(),
        }
    }

    pub fn ngrp(&self) -> usize {
        self.listgrp.len()
    }

    /// Total number of live tetrahedra across every local group.
    pub fn total_live_tetra(&self) -> usize {
        self.listgrp.iter().map(|g| g.mesh.live_tetra_count()).sum()
    }

    pub fn ext_face_comm(&self, color_out: i32) -> Option<&ExtComm> {
        self.ext_face_comm.iter().find(|c| c.color_out == color_out)
    }

    pub fn ext_face_comm_mut(&mut self, color_out: i32) -> Option<&mut ExtComm> {
        self.ext_face_comm
            .iter_mut()
            .find(|c| c.color_out == color_out)
    }
}
