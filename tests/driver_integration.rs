//! End-to-end coverage of the public driver API (spec.md §8): a
//! deterministic round-robin partitioner stands in for `metis`/`scotch`
//! so these tests don't depend on an external graph-partitioning
//! library being linked in.

use tetrapart::algorithms::element_graph::{check_csr_invariants, ElementGraph};
use tetrapart::comm::LoopbackComm;
use tetrapart::driver::{self, ExitCode, SplitFit};
use tetrapart::error::CoreError;
use tetrapart::group::{Group, Metric};
use tetrapart::mesh::{Mesh, Point, Tetra};
use tetrapart::parmesh::{Config, ParMesh};
use tetrapart::partition::{GraphPartitioner, PartitionOptions};
use tetrapart::remesh::NullRemesher;

/// Assigns cell `i` to part `i % nparts`, ignoring the graph entirely.
/// Deterministic and always balanced to within one element.
struct RoundRobin;

impl GraphPartitioner for RoundRobin {
    fn part_kway(
        &self,
        graph: &ElementGraph,
        _vwgt: Option<&[i64]>,
        nparts: usize,
        _options: PartitionOptions,
    ) -> Result<Vec<usize>, CoreError> {
        let n = graph.xadj.len().saturating_sub(1);
        Ok((0..n).map(|i| i % nparts.max(1)).collect())
    }
}

fn cube_mesh(n: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity((n + 1).pow(3), n * n * n * 6);
    let idx = |x: usize, y: usize, z: usize| x * (n + 1) * (n + 1) + y * (n + 1) + z;
    for x in 0..=n {
        for y in 0..=n {
            for z in 0..=n {
                mesh.push_point(Point::new([x as f64, y as f64, z as f64])).unwrap();
            }
        }
    }
    const KUHN: [[[usize; 3]; 4]; 6] = [
        [[0, 0, 0], [1, 0, 0], [1, 1, 0], [1, 1, 1]],
        [[0, 0, 0], [1, 0, 0], [1, 0, 1], [1, 1, 1]],
        [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 1, 1]],
        [[0, 0, 0], [0, 1, 0], [0, 1, 1], [1, 1, 1]],
        [[0, 0, 0], [0, 0, 1], [1, 0, 1], [1, 1, 1]],
        [[0, 0, 0], [0, 0, 1], [0, 1, 1], [1, 1, 1]],
    ];
    for x in 0..n {
        for y in 0..n {
            for z in 0..n {
                for corners in &KUHN {
                    let v = corners.map(|[dx, dy, dz]| idx(x + dx, y + dy, z + dz));
                    mesh.push_tetra(Tetra::new(v)).unwrap();
                }
            }
        }
    }
    mesh
}

fn single_group_parmesh(n: usize) -> ParMesh {
    let mesh = cube_mesh(n);
    let np = mesh.point_count();
    let mut pm = ParMesh::new(0, 1, Config::default());
    pm.listgrp.push(Group::new(mesh, Metric::scalar_with_len(np)));
    pm
}

#[test]
fn split_grps_partitions_every_tet_exactly_once() {
    let mut pm = single_group_parmesh(4);
    let total_before = pm.total_live_tetra();

    let code = driver::split_grps(&mut pm, &RoundRobin, 50, SplitFit::Ceiling);
    assert_eq!(code, ExitCode::Success);

    assert!(pm.ngrp() > 1, "a 384-tet cube split at target_size=50 should yield multiple groups");
    assert_eq!(pm.total_live_tetra(), total_before);
}

#[test]
fn split_grps_is_a_no_op_when_every_group_already_fits() {
    let mut pm = single_group_parmesh(2);
    let total_before = pm.total_live_tetra();

    let code = driver::split_grps(&mut pm, &RoundRobin, 1_000_000, SplitFit::Ceiling);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(pm.ngrp(), 1);
    assert_eq!(pm.total_live_tetra(), total_before);
}

#[test]
fn split_n2m_grps_preserves_total_tet_count_across_a_merge_then_split_round_trip() {
    let mut pm = single_group_parmesh(4);
    let total_before = pm.total_live_tetra();

    driver::split_grps(&mut pm, &RoundRobin, 50, SplitFit::Ceiling);
    assert!(pm.ngrp() > 1);

    let code = driver::split_n2m_grps(&mut pm, &RoundRobin, 80, SplitFit::Ceiling);
    assert_eq!(code, ExitCode::Success);
    assert_eq!(pm.total_live_tetra(), total_before);
}

#[test]
fn part_mesh_elts_returns_one_label_per_live_tet() {
    let mut mesh = cube_mesh(3);
    let ne = mesh.live_tetra_count();
    let part = driver::part_mesh_elts(&mut mesh, 4, &RoundRobin, PartitionOptions::default()).unwrap();
    assert_eq!(part.len(), ne);
    assert!(part.iter().all(|&p| p < 4));
}

#[test]
fn part_grps_seq_assigns_every_group_a_destination_rank() {
    let mut pm = single_group_parmesh(4);
    driver::split_grps(&mut pm, &RoundRobin, 50, SplitFit::Ceiling);
    let ngrp = pm.ngrp();

    let comm = LoopbackComm;
    let part = driver::part_grps_seq(&mut pm, 2, &RoundRobin, &comm).unwrap();
    assert_eq!(part.len(), ngrp);
    assert!(part.iter().all(|&p| p < 2));
}

#[test]
fn check_and_reset_contiguity_is_a_no_op_on_a_single_rank() {
    let mut pm = single_group_parmesh(2);
    assert!(pm.config.contiguous_mode);
    let code = driver::check_and_reset_contiguity(&mut pm, &LoopbackComm).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(pm.config.contiguous_mode);
}

#[test]
fn run_iteration_reports_success_with_a_null_remesher() {
    let mut pm = single_group_parmesh(4);
    let code = driver::run_iteration(
        &mut pm,
        &RoundRobin,
        &NullRemesher,
        &LoopbackComm,
        50,
        SplitFit::Ceiling,
    );
    assert_eq!(code, ExitCode::Success);
    assert!(pm.old_listgrp.is_some());
}

#[test]
fn interp_metrics_and_fields_requires_a_prior_run_iteration() {
    let mut pm = single_group_parmesh(2);
    let perms = vec![Vec::new(); pm.ngrp()];
    let err = driver::interp_metrics_and_fields(&mut pm, &perms).unwrap_err();
    assert!(matches!(err, CoreError::InputDataError(_)));
}

#[test]
fn dual_graphs_built_after_a_split_satisfy_the_csr_invariants() {
    let mut pm = single_group_parmesh(4);
    driver::split_grps(&mut pm, &RoundRobin, 50, SplitFit::Ceiling);

    for group in pm.listgrp.iter_mut() {
        let graph = tetrapart::algorithms::element_graph::build_element_graph(&mut group.mesh).unwrap();
        check_csr_invariants(&graph, group.mesh.tetra_count()).unwrap();
    }
}
