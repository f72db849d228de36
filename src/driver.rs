//! The stable public API (spec.md §6): the entry points a caller drives
//! one remeshing iteration through.

use std::collections::HashMap;

use crate::algorithms::distributed_graph::{build_distributed_graph, DistGraph, WgtFlag};
use crate::algorithms::element_graph::{build_element_graph, ElementGraph};
use crate::algorithms::interpolate::interpolate_metrics_and_fields;
use crate::algorithms::postprocess::correct_empty_partitions;
use crate::algorithms::split::split_group;
use crate::comm::Collectives;
use crate::error::CoreError;
use crate::group::{Group, Metric};
use crate::mesh::point::UNSET;
use crate::mesh::{Mesh, Tetra};
use crate::parmesh::ParMesh;
use crate::partition::{DistGraphPartitioner, GraphPartitioner, PartitionOptions};
use crate::remesh::Remesher;

/// `SUCCESS` / `LOWFAILURE` / `STRONGFAILURE` (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// A conforming single-group mesh was salvaged.
    LowFailure,
    /// No salvage was possible.
    StrongFailure,
}

/// How `split_grps`/`split_n2m_grps` derive a subgroup count from a
/// group's live tet count and the caller's `target_size` (spec.md §6's
/// `fit` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitFit {
    /// `ceil(ne / target_size)`, at least 1.
    Ceiling,
    /// The smallest power of two `>= ceil(ne / target_size)`, matching
    /// common recursive-bisection partitioner constraints.
    PowerOfTwo,
}

fn n_new_groups_for(ne: usize, target_size: usize, fit: SplitFit) -> usize {
    let target_size = target_size.max(1);
    let ceiling = ne.div_ceil(target_size).max(1);
    match fit {
        SplitFit::Ceiling => ceiling,
        SplitFit::PowerOfTwo => {
            let mut p = 1usize;
            while p < ceiling {
                p <<= 1;
            }
            p
        }
    }
}

fn record_failure(e: &CoreError, any_failure: &mut bool) -> Option<ExitCode> {
    if e.is_recoverable() {
        *any_failure = true;
        None
    } else {
        Some(ExitCode::StrongFailure)
    }
}

/// Splits every over-sized local group until no live group exceeds
/// `target_size` tets (spec.md §6's `split_grps`).
pub fn split_grps(
    pm: &mut ParMesh,
    partitioner: &dyn GraphPartitioner,
    target_size: usize,
    fit: SplitFit,
) -> ExitCode {
    let n_original = pm.ngrp();
    let mut any_failure = false;
    tracing::debug!(n_original, target_size, "splitting oversized groups");

    // Process from the last original index down: split_group removes the
    // source at `idx` and appends its children at the end, which never
    // shifts any index below `idx`.
    for idx in (0..n_original).rev() {
        let ne = pm.listgrp[idx].mesh.live_tetra_count();
        let n_new = n_new_groups_for(ne, target_size, fit);
        if n_new <= 1 {
            continue;
        }

        let graph = match build_element_graph(&mut pm.listgrp[idx].mesh) {
            Ok(g) => g,
            Err(e) => {
                if let Some(code) = record_failure(&e, &mut any_failure) {
                    return code;
                }
                continue;
            }
        };
        let vwgt: Vec<i64> = pm.listgrp[idx]
            .mesh
            .tetras()
            .iter()
            .filter(|t| t.alive)
            .map(|t| t.mark)
            .collect();
        let options = PartitionOptions {
            contiguous: pm.config.contiguous_mode,
            ..Default::default()
        };
        let mut part = match partitioner.part_kway(&graph, Some(&vwgt), n_new, options) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(group = idx, %e, "partitioner failed ahead of a split");
                if let Some(code) = record_failure(&e, &mut any_failure) {
                    return code;
                }
                continue;
            }
        };
        correct_empty_partitions(&mut part, n_new);

        if let Err(e) = split_group(pm, idx, &part, n_new) {
            tracing::warn!(group = idx, %e, "group split failed");
            if let Some(code) = record_failure(&e, &mut any_failure) {
                return code;
            }
        }
    }

    if any_failure {
        ExitCode::LowFailure
    } else {
        ExitCode::Success
    }
}

/// Merge-then-split driver (SPEC_FULL.md §4.7, grounded on
/// `original_source/src/libparmmg1.c`): flattens every local group back
/// into a single packed mesh, then re-splits it to `target_size`.
pub fn split_n2m_grps(
    pm: &mut ParMesh,
    partitioner: &dyn GraphPartitioner,
    target_size: usize,
    fit: SplitFit,
) -> ExitCode {
    let merged = match merge_groups(pm) {
        Ok(m) => m,
        Err(e) => {
            return if e.is_recoverable() {
                ExitCode::LowFailure
            } else {
                ExitCode::StrongFailure
            }
        }
    };
    pm.listgrp.clear();
    pm.listgrp.push(merged);
    split_grps(pm, partitioner, target_size, fit)
}

/// Flattens every local group of `pm` into one packed [`Group`],
/// deduplicating points shared across a former interface via their
/// `int_node_comm` slot (`point.tmp`) — the reverse of the group
/// splitter's own point-dedup strategy.
fn merge_groups(pm: &ParMesh) -> Result<Group, CoreError> {
    let total_points: usize = pm.listgrp.iter().map(|g| g.mesh.point_count()).sum();
    let total_tets: usize = pm.listgrp.iter().map(|g| g.mesh.live_tetra_count()).sum();
    let mut merged_mesh = Mesh::with_capacity(total_points, total_tets);

    let tensor = matches!(pm.listgrp.first().map(|g| &g.met), Some(Metric::Tensor(_)));
    let mut merged_met = if tensor {
        Metric::tensor_with_len(0)
    } else {
        Metric::scalar_with_len(0)
    };

    let mut slot_to_merged: HashMap<usize, usize> = HashMap::new();

    for g in &pm.listgrp {
        let mut local_to_merged = vec![UNSET; g.mesh.point_count()];
        for pi in 0..g.mesh.point_count() {
            let p = *g.mesh.point(pi);
            if !p.alive {
                continue;
            }
            let merged_idx = if p.tmp != UNSET {
                if let Some(&idx) = slot_to_merged.get(&p.tmp) {
                    idx
                } else {
                    let idx = merged_mesh.push_point(p)?;
                    merged_met.push_zero();
                    merged_met.copy_value(idx, &g.met, pi);
                    slot_to_merged.insert(p.tmp, idx);
                    idx
                }
            } else {
                let idx = merged_mesh.push_point(p)?;
                merged_met.push_zero();
                merged_met.copy_value(idx, &g.met, pi);
                idx
            };
            local_to_merged[pi] = merged_idx;
        }

        for tet in g.mesh.tetras() {
            if !tet.alive {
                continue;
            }
            let v = [
                local_to_merged[tet.v[0]],
                local_to_merged[tet.v[1]],
                local_to_merged[tet.v[2]],
                local_to_merged[tet.v[3]],
            ];
            let mut new_tet = Tetra::new(v);
            new_tet.reference = tet.reference;
            new_tet.qual = tet.qual;
            new_tet.mark = tet.mark;
            merged_mesh.push_tetra(new_tet)?;
        }

        // Prisms/triangles/quads/edges are carried opaquely through the
        // merge (spec.md §3), the reverse of the group splitter's own
        // opaque-element propagation.
        let remap = |v: usize| {
            let idx = local_to_merged[v];
            if idx == UNSET {
                None
            } else {
                Some(idx)
            }
        };
        for t in crate::mesh::remap_opaque_elements(g.mesh.triangles(), remap) {
            merged_mesh.push_triangle(t);
        }
        for p in crate::mesh::remap_opaque_elements(g.mesh.prisms(), remap) {
            merged_mesh.push_prism(p);
        }
        for q in crate::mesh::remap_opaque_elements(g.mesh.quads(), remap) {
            merged_mesh.push_quad(q);
        }
        for e in crate::mesh::remap_opaque_elements(g.mesh.edges(), remap) {
            merged_mesh.push_edge(e);
        }
    }

    pack_mesh(&mut merged_mesh)?;
    Ok(Group::new(merged_mesh, merged_met))
}

/// Drops dead entities and renumbers everything that references them
/// (spec.md §3's "clean" step, applied as an actual compaction rather
/// than `Mesh::clean`'s capacity-only shrink).
pub fn pack_mesh(mesh: &mut Mesh) -> Result<(), CoreError> {
    let np = mesh.point_count();
    let mut point_remap = vec![UNSET; np];
    let mut new_points = Vec::with_capacity(np);
    for i in 0..np {
        let p = *mesh.point(i);
        if p.alive {
            point_remap[i] = new_points.len();
            new_points.push(p);
        }
    }

    let ne = mesh.tetra_count();
    let mut new_tetras = Vec::with_capacity(ne);
    for k in 0..ne {
        let t = *mesh.tetra(k);
        if !t.alive {
            continue;
        }
        let mut nt = t;
        for vi in 0..4 {
            nt.v[vi] = point_remap[t.v[vi]];
        }
        new_tetras.push(nt);
    }

    let mut packed = Mesh::with_capacity(new_points.len(), new_tetras.len());
    for p in new_points {
        packed.push_point(p)?;
    }
    for t in new_tetras {
        packed.push_tetra(t)?;
    }
    *mesh = packed;
    Ok(())
}

/// Partitions a single mesh's elements into `nparts` (spec.md §6's
/// `part_mesh_elts`), used ahead of the very first split when a rank
/// holds exactly one group spanning its whole initial mesh.
pub fn part_mesh_elts(
    mesh: &mut Mesh,
    nparts: usize,
    partitioner: &dyn GraphPartitioner,
    options: PartitionOptions,
) -> Result<Vec<usize>, CoreError> {
    let graph: ElementGraph = build_element_graph(mesh)?;
    let vwgt: Vec<i64> = mesh.tetras().iter().filter(|t| t.alive).map(|t| t.mark).collect();
    partitioner.part_kway(&graph, Some(&vwgt), nparts, options)
}

/// Centralized group-level partition (spec.md §6's `part_grps_seq`):
/// always gathers the distributed group graph to rank 0 and runs a
/// sequential partitioner there.
pub fn part_grps_seq(
    pm: &mut ParMesh,
    nparts: usize,
    partitioner: &dyn GraphPartitioner,
    comm: &dyn Collectives,
) -> Result<Vec<usize>, CoreError> {
    let graph = build_distributed_graph(pm, comm, WgtFlag::Both, 1)?;
    let bridge = crate::partition::CentralizedDistPartitioner {
        inner: partitioner,
        root: 0,
    };
    bridge.part_kway_dist(&graph, nparts, comm)
}

/// Distributed group-level partition (spec.md §6's `part_grps_dist`):
/// delegates to whichever [`DistGraphPartitioner`] the caller plugs in.
pub fn part_grps_dist(
    pm: &mut ParMesh,
    nparts: usize,
    partitioner: &dyn DistGraphPartitioner,
    comm: &dyn Collectives,
) -> Result<Vec<usize>, CoreError> {
    let graph: DistGraph = build_distributed_graph(pm, comm, WgtFlag::Both, 1)?;
    partitioner.part_kway_dist(&graph, nparts, comm)
}

/// Synchronizes `contiguous_mode` process-wide via `Allreduce(MIN)`
/// (spec.md §4.4.2 / §8): if any rank can no longer guarantee contiguous
/// parts, every rank downgrades together.
pub fn check_and_reset_contiguity(pm: &mut ParMesh, comm: &dyn Collectives) -> Result<ExitCode, CoreError> {
    let local_flag = i32::from(pm.config.contiguous_mode);
    let global_min = comm.allreduce_min_i32(local_flag)?;
    pm.config.contiguous_mode = global_min != 0;
    Ok(ExitCode::Success)
}

/// Interpolates the metric (and carried fields) of `pm.old_listgrp` onto
/// `pm.listgrp`, one group at a time, consuming `pm.old_listgrp` (spec.md
/// §6's `interp_metrics_and_fields`). `perms[i]` is the permutation array
/// for group `i` (spec.md §4.6).
pub fn interp_metrics_and_fields(pm: &mut ParMesh, perms: &[Vec<usize>]) -> Result<ExitCode, CoreError> {
    let mut old_listgrp = pm.old_listgrp.take().ok_or_else(|| {
        CoreError::InputDataError("no previous mesh state to interpolate from".to_string())
    })?;
    if old_listgrp.len() != pm.listgrp.len() || perms.len() != pm.listgrp.len() {
        return Err(CoreError::InputDataError(
            "group count mismatch between old and new parmesh states".to_string(),
        ));
    }
    for (i, new_group) in pm.listgrp.iter_mut().enumerate() {
        interpolate_metrics_and_fields(&mut old_listgrp[i], new_group, &perms[i])?;
    }
    Ok(ExitCode::Success)
}

/// Runs one full remeshing iteration: split oversized groups, remesh
/// each, interpolate the metric forward, and resynchronize the
/// contiguity flag. This is the supplemental orchestration layer
/// SPEC_FULL.md §4.8 describes around the opaque [`Remesher`].
pub fn run_iteration(
    pm: &mut ParMesh,
    partitioner: &dyn GraphPartitioner,
    remesher: &dyn Remesher,
    comm: &dyn Collectives,
    target_size: usize,
    fit: SplitFit,
) -> ExitCode {
    let split_code = split_grps(pm, partitioner, target_size, fit);
    if split_code == ExitCode::StrongFailure {
        tracing::error!("split_grps reported a strong failure, aborting the iteration");
        return split_code;
    }

    pm.old_listgrp = Some(pm.listgrp.clone());

    let mut any_failure = split_code == ExitCode::LowFailure;
    for group in pm.listgrp.iter_mut() {
        if let Err(e) = remesher.remesh(group) {
            if !e.is_recoverable() {
                tracing::error!(%e, "remesher reported a fatal failure");
                return ExitCode::StrongFailure;
            }
            any_failure = true;
        }
    }

    if let Err(e) = check_and_reset_contiguity(pm, comm) {
        if !e.is_recoverable() {
            tracing::error!(%e, "contiguity resynchronization reported a fatal failure");
            return ExitCode::StrongFailure;
        }
        any_failure = true;
    }

    tracing::info!(groups = pm.ngrp(), ?any_failure, "finished remeshing iteration");
    if any_failure {
        ExitCode::LowFailure
    } else {
        ExitCode::Success
    }
}
