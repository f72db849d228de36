//! tetrapart: a distributed tetrahedral-mesh partitioning and
//! load-balancing engine.
//!
//! # Crate layout
//!
//! - [`mesh`] — the local submesh: points, tetrahedra, their boundary
//!   extension tables, and the growable-table storage they sit on.
//! - [`group`] — one process-local [`group::Group`]: a mesh plus its
//!   metric and the communicator maps tying new interfaces back into the
//!   parmesh.
//! - [`parmesh`] — the process-level container: every local group plus
//!   the internal/external communicators that glue them into a
//!   consistent global mesh.
//! - [`comm`] — communicator pools and the [`comm::Collectives`]
//!   abstraction over the blocking collectives the algorithms need.
//! - [`algorithms`] — graph building, group splitting, interpolation and
//!   partition post-processing.
//! - [`partition`] — the external `KWAY_LOCAL`/`KWAY_DIST` partitioner
//!   interfaces, with `metis` and `scotch` backends behind feature
//!   flags.
//! - [`remesh`] — the opaque sequential remesher boundary.
//! - [`driver`] — the stable public API a caller drives one remeshing
//!   iteration through.
//! - [`error`] — the core's error taxonomy.

pub mod algorithms;
pub mod comm;
pub mod driver;
pub mod error;
pub mod group;
pub mod mesh;
pub mod parmesh;
pub mod partition;
pub mod remesh;

pub use comm::{Collectives, LoopbackComm};
pub use driver::{
    check_and_reset_contiguity, interp_metrics_and_fields, pack_mesh, part_grps_dist,
    part_grps_seq, part_mesh_elts, split_grps, split_n2m_grps, ExitCode, SplitFit,
};
pub use error::{CoreError, PartitionerFailureKind};
pub use group::{Group, Metric};
pub use mesh::{Mesh, Point, Tag, Tetra, XPoint};
pub use parmesh::{Config, ParMesh, PartitionerChoice};
pub use partition::{DistGraphPartitioner, GraphPartitioner, PartitionOptions};
pub use remesh::{NullRemesher, RemeshOutcome, Remesher};

#[cfg(feature = "mpi")]
pub use comm::MpiComm;
#[cfg(feature = "metis")]
pub use partition::metis_backend::MetisPartitioner;
#[cfg(feature = "scotch")]
pub use partition::scotch_backend::ScotchPartitioner;
