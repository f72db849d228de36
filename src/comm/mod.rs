//! Process-local communicator pools and the collectives abstraction.
//!
//! Design note (spec.md §9, "Cyclic group ↔ int_comm ↔ group"): the
//! internal communicator is the single authority for slot identity; groups
//! only ever store slot indices into it, never back-pointers to each other.

use crate::error::CoreError;

/// The process-local pool of internal communicator slots a group's
/// `node2int`/`face2int` maps reference (spec.md §3: `int_node_comm` /
/// `int_face_comm`).
#[derive(Debug, Clone, Default)]
pub struct IntComm {
    pub nitem: usize,
    /// Scratch column used during distributed graph building (spec.md
    /// §4.3). Any algorithm using it must restore or not assume
    /// persistence (spec.md §5).
    pub intvalues: Vec<i64>,
}

impl IntComm {
    pub fn reserve(&mut self, nitem: usize) {
        self.intvalues.resize(nitem, 0);
    }

    /// Allocates the next free slot, growing `intvalues` to keep pace.
    pub fn alloc_slot(&mut self) -> usize {
        let slot = self.nitem;
        self.nitem += 1;
        if self.intvalues.len() < self.nitem {
            self.intvalues.resize(self.nitem, 0);
        }
        slot
    }
}

/// One external (per-neighbor-rank) communicator (spec.md §3:
/// `ext_face_comm` / `ext_node_comm`).
#[derive(Debug, Clone, Default)]
pub struct ExtComm {
    pub color_out: i32,
    /// Maps peer-shared slot -> local int_comm position.
    pub int_comm_index: Vec<usize>,
    pub itosend: Vec<i64>,
    pub itorecv: Vec<i64>,
}

impl ExtComm {
    pub fn new(color_out: i32) -> Self {
        ExtComm {
            color_out,
            int_comm_index: Vec::new(),
            itosend: Vec::new(),
            itorecv: Vec::new(),
        }
    }

    pub fn nitem(&self) -> usize {
        self.int_comm_index.len()
    }
}

/// `node2int`: parallel arrays mapping a local point id to its position in
/// the parmesh-wide internal node communicator (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct Node2Int {
    pub index1: Vec<usize>,
    pub index2: Vec<usize>,
}

impl Node2Int {
    pub fn push(&mut self, local_point: usize, comm_pos: usize) {
        self.index1.push(local_point);
        self.index2.push(comm_pos);
    }

    pub fn len(&self) -> usize {
        self.index1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index1.is_empty()
    }
}

/// `face2int`: parallel arrays mapping an encoded (tet, face, iploc) triple
/// to its position in the parmesh-wide internal face communicator (spec.md
/// §3). `index1[i] = 12*iel + 3*ifac + iploc` (a tet has 4 faces, `ifac`
/// in `0..4`; a face has 3 vertices, `iploc` in `0..3`).
#[derive(Debug, Clone, Default)]
pub struct Face2Int {
    pub index1: Vec<usize>,
    pub index2: Vec<usize>,
}

impl Face2Int {
    pub fn encode(iel: usize, ifac: usize, iploc: usize) -> usize {
        debug_assert!(ifac < 4, "ifac out of range: {ifac}");
        debug_assert!(iploc < 3, "iploc out of range: {iploc}");
        12 * iel + 3 * ifac + iploc
    }

    pub fn decode(code: usize) -> (usize, usize, usize) {
        let iel = code / 12;
        let rest = code % 12;
        let ifac = rest / 3;
        let iploc = rest % 3;
        (iel, ifac, iploc)
    }

    pub fn push(&mut self, code: usize, comm_pos: usize) {
        self.index1.push(code);
        self.index2.push(comm_pos);
    }

    pub fn len(&self) -> usize {
        self.index1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index1.is_empty()
    }
}

/// The set of blocking collectives named in spec.md §5, abstracted behind
/// a trait so the distributed algorithms are testable against an
/// in-process loopback implementation without requiring an MPI runtime,
/// the same way `other_examples`' `bempp-rs` parallel grid builder is
/// generic over `C: mpi::topology::Communicator` rather than hardcoding
/// `mpi::environment::world()`.
pub trait Collectives {
    fn rank(&self) -> i32;
    fn size(&self) -> i32;

    /// `Allgather(v)`: every rank contributes one `i64`, every rank
    /// receives the full vector, ordered by rank.
    fn allgather_i64(&self, value: i64) -> Result<Vec<i64>, CoreError>;

    /// `Allgatherv`: every rank contributes a variable-length `i64` slice,
    /// every rank receives the concatenation ordered by rank.
    fn allgatherv_i64(&self, values: &[i64]) -> Result<Vec<i64>, CoreError>;

    /// `Allreduce(MIN)` over a single `i32` (used for the contiguous-mode
    /// downgrade, spec.md §4.4.2 / §8).
    fn allreduce_min_i32(&self, value: i32) -> Result<i32, CoreError>;

    /// `Sendrecv` with a single peer rank, both directions using `i64`
    /// payloads (spec.md §4.3 step 5).
    fn sendrecv_i64(&self, peer: i32, send: &[i64]) -> Result<Vec<i64>, CoreError>;

    /// `Scatterv` of `part[]` from the root rank after a centralized
    /// partitioning (spec.md §5).
    fn scatterv_usize(&self, root: i32, counts: &[usize], send: &[usize]) -> Result<Vec<usize>, CoreError>;
}

/// A single-process loopback implementation of [`Collectives`] used by unit
/// and property tests: `size() == 1`, every collective is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackComm;

impl Collectives for LoopbackComm {
    fn rank(&self) -> i32 {
        0
    }

    fn size(&self) -> i32 {
        1
    }

    fn allgather_i64(&self, value: i64) -> Result<Vec<i64>, CoreError> {
        Ok(vec![value])
    }

    fn allgatherv_i64(&self, values: &[i64]) -> Result<Vec<i64>, CoreError> {
        Ok(values.to_vec())
    }

    fn allreduce_min_i32(&self, value: i32) -> Result<i32, CoreError> {
        Ok(value)
    }

    fn sendrecv_i64(&self, _peer: i32, _send: &[i64]) -> Result<Vec<i64>, CoreError> {
        Err(CoreError::CommunicationFailure {
            operation: "sendrecv on single-rank loopback communicator",
        })
    }

    fn scatterv_usize(
        &self,
        _root: i32,
        _counts: &[usize],
        send: &[usize],
    ) -> Result<Vec<usize>, CoreError> {
        Ok(send.to_vec())
    }
}

#[cfg(feature = "mpi")]
mod mpi_backend {
    use super::Collectives;
    use crate::error::CoreError;
    use mpi::collective::SystemOperation;
    use mpi::topology::Communicator as MpiCommunicatorTrait;
    use mpi::traits::*;

    /// Adapts any `mpi::topology::Communicator` to [`Collectives`].
    pub struct MpiComm<'a, C: MpiCommunicatorTrait>(pub &'a C);

    impl<'a, C: MpiCommunicatorTrait> Collectives for MpiComm<'a, C> {
        fn rank(&self) -> i32 {
            self.0.rank()
        }

        fn size(&self) -> i32 {
            self.0.size()
        }

        fn allgather_i64(&self, value: i64) -> Result<Vec<i64>, CoreError> {
            let mut out = vec![0i64; self.0.size() as usize];
            self.0.all_gather_into(&value, &mut out[..]);
            Ok(out)
        }

        fn allgatherv_i64(&self, values: &[i64]) -> Result<Vec<i64>, CoreError> {
            let counts = self.allgather_i64(values.len() as i64)?;
            let counts_i32: Vec<i32> = counts.iter().map(|c| *c as i32).collect();
            let displs: Vec<i32> = counts_i32
                .iter()
                .scan(0i32, |acc, c| {
                    let d = *acc;
                    *acc += c;
                    Some(d)
                })
                .collect();
            let total: i32 = counts_i32.iter().sum();
            let mut out = vec![0i64; total as usize];
            {
                let partition = mpi::datatype::PartitionMut::new(&mut out, counts_i32, displs);
                self.0.all_gather_varcount_into(values, partition);
            }
            Ok(out)
        }

        fn allreduce_min_i32(&self, value: i32) -> Result<i32, CoreError> {
            let mut out = 0i32;
            self.0
                .all_reduce_into(&value, &mut out, SystemOperation::min());
            Ok(out)
        }

        fn sendrecv_i64(&self, peer: i32, send: &[i64]) -> Result<Vec<i64>, CoreError> {
            let partner = self.0.process_at_rank(peer);
            let (recv, _status) = partner.send_receive_with_tag(send, 0, 0);
            Ok(recv)
        }

        fn scatterv_usize(
            &self,
            root: i32,
            counts: &[usize],
            send: &[usize],
        ) -> Result<Vec<usize>, CoreError> {
            let root_process = self.0.process_at_rank(root);
            let my_count = counts[self.rank() as usize];
            let mut recv = vec![0usize; my_count];
            if self.rank() == root {
                let counts_i32: Vec<i32> = counts.iter().map(|c| *c as i32).collect();
                let displs: Vec<i32> = counts_i32
                    .iter()
                    .scan(0i32, |acc, c| {
                        let d = *acc;
                        *acc += c;
                        Some(d)
                    })
                    .collect();
                let partition = mpi::datatype::Partition::new(send, counts_i32, displs);
                root_process.scatter_varcount_into_root(&partition, &mut recv);
            } else {
                root_process.scatter_varcount_into(&mut recv);
            }
            Ok(recv)
        }
    }
}

#[cfg(feature = "mpi")]
pub use mpi_backend::MpiComm;
