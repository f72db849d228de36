//! The core's error taxonomy (spec.md §7).
//!
//! Every recoverable failure returns a `CoreError` up the call chain; each
//! frame releases what it allocated (see the teacher's own pattern of
//! `.context()`-annotated propagation in `tools/src/bin/apply-part.rs`, here
//! expressed as a typed library error instead of `anyhow`, since this is a
//! library crate rather than a CLI binary).

use thiserror::Error;

/// Error taxonomy for the partitioning/splitting/interpolation core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Table growth or hash overflow.
    #[error("allocation failure in {subsystem}: requested {requested_bytes} bytes")]
    AllocationFailure {
        subsystem: &'static str,
        requested_bytes: usize,
    },

    /// The underlying KWAY partitioner returned a non-OK status.
    #[error("partitioner failure ({kind}) while computing a {nparts}-way partition")]
    PartitionerFailure {
        kind: PartitionerFailureKind,
        nparts: usize,
    },

    /// An internal assertion caught a structural inconsistency (adjacency
    /// index out of range, tet/vertex count mismatch, nonempty communicator
    /// where empty was expected, ...).
    #[error("structural invariant violated in {subsystem}: {detail}")]
    StructuralInvariantViolation {
        subsystem: &'static str,
        detail: String,
    },

    /// A messaging primitive reported a non-success status.
    #[error("communication failure during {operation}")]
    CommunicationFailure { operation: &'static str },

    /// Missing points, inconsistent metric size, or an unsupported mode
    /// (Lagrangian/iso) was requested.
    #[error("invalid input: {0}")]
    InputDataError(String),
}

/// Distinct diagnostics the KWAY backends can report, mirroring the
/// `metis` crate's own `Error::{Input,Memory,Other}` split (spec.md §7:
/// "map the library's input/memory/generic codes to distinct
/// diagnostics").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionerFailureKind {
    InvalidInput,
    OutOfMemory,
    Other,
}

impl std::fmt::Display for PartitionerFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionerFailureKind::InvalidInput => write!(f, "invalid input"),
            PartitionerFailureKind::OutOfMemory => write!(f, "out of memory"),
            PartitionerFailureKind::Other => write!(f, "unspecified error"),
        }
    }
}

#[cfg(feature = "metis")]
impl From<metis::Error> for CoreError {
    fn from(e: metis::Error) -> Self {
        let kind = match e {
            metis::Error::Input => PartitionerFailureKind::InvalidInput,
            metis::Error::Memory => PartitionerFailureKind::OutOfMemory,
            metis::Error::Other => PartitionerFailureKind::Other,
        };
        CoreError::PartitionerFailure { kind, nparts: 0 }
    }
}

impl CoreError {
    /// Whether the driver can still emit a conforming single-group mesh
    /// after this failure (`LOWFAILURE`) or must abort entirely
    /// (`STRONGFAILURE`). Communication and structural failures are always
    /// fatal; allocation/partitioner/input failures are salvageable by
    /// falling back to the pre-split mesh.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            CoreError::CommunicationFailure { .. } | CoreError::StructuralInvariantViolation { .. }
        )
    }
}
