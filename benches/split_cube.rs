//! Benchmarks the group splitter and the distributed dual-graph builder
//! on a synthetic cube mesh, the same Kuhn-triangulated cartesian grid
//! the teacher's own `rcb_cartesian` bench generates for its geometric
//! algorithms, here cut into tetrahedra instead of sampled as points.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tetrapart::algorithms::distributed_graph::{build_distributed_graph, WgtFlag};
use tetrapart::algorithms::split::split_group;
use tetrapart::comm::LoopbackComm;
use tetrapart::group::{Group, Metric};
use tetrapart::mesh::{Mesh, Point, Tetra};
use tetrapart::parmesh::{Config, ParMesh};

/// Splits the unit cube `[0, n]^3` into `n^3` sub-cubes, each cut into six
/// tetrahedra via the standard Kuhn triangulation.
fn cube_mesh(n: usize) -> Mesh {
    let np = (n + 1).pow(3);
    let ne = n * n * n * 6;
    let mut mesh = Mesh::with_capacity(np, ne);

    let idx = |x: usize, y: usize, z: usize| x * (n + 1) * (n + 1) + y * (n + 1) + z;
    for x in 0..=n {
        for y in 0..=n {
            for z in 0..=n {
                let p = mesh.push_point(Point::new([x as f64, y as f64, z as f64])).unwrap();
                assert_eq!(p, idx(x, y, z));
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

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_group");
    for n in [4usize, 6, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mesh = cube_mesh(n);
                    let np = mesh.point_count();
                    let ne = mesh.live_tetra_count();
                    let mut pm = ParMesh::new(0, 1, Config::default());
                    pm.listgrp.push(Group::new(mesh, Metric::scalar_with_len(np)));
                    let part: Vec<usize> = (0..ne).map(|i| i % 4).collect();
                    (pm, part)
                },
                |(mut pm, part)| split_group(&mut pm, 0, &part, 4).unwrap(),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_distributed_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_distributed_graph");
    let comm = LoopbackComm;
    for n in [4usize, 6, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mesh = cube_mesh(n);
            let np = mesh.point_count();
            let mut pm = ParMesh::new(0, 1, Config::default());
            pm.listgrp.push(Group::new(mesh, Metric::scalar_with_len(np)));
            b.iter(|| build_distributed_graph(&mut pm, &comm, WgtFlag::Both, 1).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split, bench_distributed_graph);
criterion_main!(benches);
