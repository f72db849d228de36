//! Builds a synthetic cube `ParMesh`, runs one `split_grps` +
//! `part_grps_dist` round-trip against a loopback communicator, and
//! prints the resulting group sizes. Deliberately not a mesh-file
//! reader/writer: file I/O is out of scope for this engine.

use anyhow::{Context, Result};
use tetrapart::comm::LoopbackComm;
use tetrapart::driver::{self, SplitFit};
use tetrapart::group::{Group, Metric};
use tetrapart::mesh::{Mesh, Point, Tetra};
use tetrapart::parmesh::{Config, ParMesh};
use tetrapart::partition::DistGraphPartitioner;

const USAGE: &str = "Usage: pmesh-run [options]";

fn cube_mesh(n: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity((n + 1).pow(3), n * n * n * 6);
    let idx = |x: usize, y: usize, z: usize| x * (n + 1) * (n + 1) + y * (n + 1) + z;
    for x in 0..=n {
        for y in 0..=n {
            for z in 0..=n {
                mesh.push_point(Point::new([x as f64, y as f64, z as f64]))
                    .expect("cube mesh point capacity");
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
                    mesh.push_tetra(Tetra::new(v)).expect("cube mesh tet capacity");
                }
            }
        }
    }
    mesh
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("n", "side", "cube side length", "N");
    options.optopt("t", "target-size", "tets per group after splitting", "N");

    let matches = options.parse(std::env::args().skip(1)).context("failed to parse arguments")?;
    if matches.opt_present("h") {
        println!("{}", options.usage(USAGE));
        return Ok(());
    }
    let n: usize = matches.opt_get_default("n", 6).context("invalid value for option 'side'")?;
    let target_size: usize = matches
        .opt_get_default("t", 32)
        .context("invalid value for option 'target-size'")?;

    let mesh = cube_mesh(n);
    let np = mesh.point_count();
    let mut pm = ParMesh::new(0, 1, Config::default());
    pm.listgrp.push(Group::new(mesh, Metric::scalar_with_len(np)));

    let partitioner = tetrapart::partition::metis_backend::MetisPartitioner;

    let split_code = driver::split_grps(&mut pm, &partitioner, target_size, SplitFit::Ceiling);
    tracing::info!(?split_code, groups = pm.ngrp(), "finished splitting");

    let comm = LoopbackComm;
    let bridge = tetrapart::partition::CentralizedDistPartitioner { inner: &partitioner, root: 0 };
    let part = bridge
        .part_kway_dist(
            &tetrapart::algorithms::distributed_graph::build_distributed_graph(
                &mut pm,
                &comm,
                tetrapart::algorithms::distributed_graph::WgtFlag::Both,
                1,
            )?,
            pm.ngrp().max(1),
            &comm,
        )
        .context("group-level partition failed")?;

    for (i, g) in pm.listgrp.iter().enumerate() {
        println!("group {i}: {} tets, assigned part {}", g.mesh.live_tetra_count(), part[i]);
    }

    Ok(())
}
