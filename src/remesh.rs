//! The sequential remesher boundary (SPEC_FULL.md §4.8): `REMESH(mesh,
//! metric) -> status` (spec.md §6) is an opaque external collaborator the
//! core calls once per post-split group and never implements itself.

use crate::error::CoreError;
use crate::group::Group;

/// What a remesh pass reports back about the group it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemeshOutcome {
    pub converged: bool,
}

/// An opaque sequential anisotropic remesher, called once per group after
/// each split round (spec.md §6's `REMESH`).
pub trait Remesher {
    fn remesh(&self, group: &mut Group) -> Result<RemeshOutcome, CoreError>;
}

/// No-op remesher test double: reports success without touching the
/// group. Used by driver-level tests that exercise the split/partition
/// machinery without depending on an actual remeshing implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRemesher;

impl Remesher for NullRemesher {
    fn remesh(&self, _group: &mut Group) -> Result<RemeshOutcome, CoreError> {
        Ok(RemeshOutcome { converged: true })
    }
}
