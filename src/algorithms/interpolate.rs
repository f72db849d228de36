//! Interpolation driver (spec.md §4.6): transfers the metric (and, for a
//! complete implementation, the other solution fields) from an old mesh
//! onto a new one by locating each new point in the old mesh and taking a
//! barycentric combination of its vertex values.

use crate::error::CoreError;
use crate::group::{Group, Metric};
use crate::mesh::point::UNSET;
use crate::mesh::tetra::FACE_VERTICES;
use crate::mesh::Mesh;

const MAX_WALK_STEPS_FACTOR: usize = 8;

/// Per-face outward normal (unnormalized, scaled by twice the face area)
/// and per-tet signed volume, precomputed once per old mesh (spec.md
/// §4.6 step 1; signed volume is cached in `tet.qual`, matching the
/// reuse spec.md §3 documents for that field).
struct LocateGeometry {
    /// `face_normals[4*k + f]`, outward from tet `k`'s local face `f`.
    face_normals: Vec<[f64; 3]>,
}

fn precompute_geometry(old: &mut Mesh) -> LocateGeometry {
    let ne = old.tetra_count();
    let mut face_normals = vec![[0.0; 3]; 4 * ne];
    for k in 0..ne {
        let tet = *old.tetra(k);
        if !tet.alive {
            continue;
        }
        let p: Vec<[f64; 3]> = tet.v.iter().map(|&vi| old.point(vi).coords).collect();
        let volume = signed_volume(&p[0], &p[1], &p[2], &p[3]);
        old.tetra_mut(k).qual = volume;
        for (f, verts) in FACE_VERTICES.iter().enumerate() {
            let a = p[verts[0]];
            let b = p[verts[1]];
            let c = p[verts[2]];
            face_normals[4 * k + f] = cross(sub(b, a), sub(c, a));
        }
    }
    LocateGeometry { face_normals }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn signed_volume(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3], d: &[f64; 3]) -> f64 {
    dot(sub(*b, *a), cross(sub(*c, *a), sub(*d, *a))) / 6.0
}

/// Where a new point ended up after the locate walk: the containing old
/// tet plus its barycentric weights (vertex order matching `Tetra::v`).
struct Location {
    tet: usize,
    bary: [f64; 4],
}

/// Locates `p` in `old` by walking the dual graph starting from
/// `start_tet`, moving across the face with the most negative barycentric
/// coordinate each step (spec.md §4.6 step 2). Falls back to an
/// exhaustive scan, keeping the closest near-miss, if a cycle is detected
/// (a tet revisited within the same walk).
fn locate_point(old: &mut Mesh, geom: &LocateGeometry, p: [f64; 3], start_tet: usize) -> Location {
    let sweep = old.next_sweep();
    let ne = old.tetra_count();
    let max_steps = ne.saturating_mul(MAX_WALK_STEPS_FACTOR).max(16);

    let mut cur = if start_tet < ne && old.tetra(start_tet).alive {
        start_tet
    } else {
        0
    };

    for _ in 0..max_steps {
        if old.tetra(cur).flag == sweep {
            // Cycle: the walk revisited a tet within this sweep.
            return exhaustive_locate(old, geom, p);
        }
        old.tetra_mut(cur).flag = sweep;

        let bary = barycentric(old, geom, cur, p);
        let (worst_face, worst_val) = bary
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, &v)| (i, v))
            .unwrap();

        if worst_val >= -1e-12 {
            return Location { tet: cur, bary };
        }

        match old.adja().and_then(|a| a.get(cur, worst_face)) {
            Some((next, _)) => cur = next,
            None => return exhaustive_locate(old, geom, p),
        }
    }
    exhaustive_locate(old, geom, p)
}

/// Barycentric coordinates of `p` relative to tet `k`, ordered by local
/// vertex, computed via `-((p - v_f0) . n_f) / (6V)` for the face
/// opposite each vertex (spec.md §4.6 step 2's formula).
fn barycentric(old: &Mesh, geom: &LocateGeometry, k: usize, p: [f64; 3]) -> [f64; 4] {
    let tet = old.tetra(k);
    let volume = tet.qual;
    let mut bary = [0.0; 4];
    for (f, verts) in FACE_VERTICES.iter().enumerate() {
        let v0 = old.point(tet.v[verts[0]]).coords;
        let n = geom.face_normals[4 * k + f];
        // The local vertex opposite face f is the one not in `verts`;
        // FACE_VERTICES is built so that vertex index == f is opposite
        // face f (mesh::tetra::FACE_VERTICES's own convention).
        bary[f] = -dot(sub(p, v0), n) / (6.0 * volume);
    }
    bary
}

/// O(n) fallback: evaluates every live tet's barycentric coordinates and
/// keeps whichever containing (or, failing that, closest-to-containing)
/// tet has the least-negative worst coordinate.
fn exhaustive_locate(old: &Mesh, geom: &LocateGeometry, p: [f64; 3]) -> Location {
    let mut best_tet = 0;
    let mut best_bary = [0.25; 4];
    let mut best_score = f64::NEG_INFINITY;
    for k in 0..old.tetra_count() {
        if !old.tetra(k).alive {
            continue;
        }
        let bary = barycentric(old, geom, k, p);
        let score = bary.iter().cloned().fold(f64::INFINITY, f64::min);
        if score > best_score {
            best_score = score;
            best_bary = bary;
            best_tet = k;
        }
    }
    Location {
        tet: best_tet,
        bary: best_bary,
    }
}

/// Interpolates the metric (and, when present, `ls`/`disp`/extra fields)
/// of `old_group` onto every point of `new_group` not tagged `REQ` (those
/// copy their old value by the permutation `perm` maps, spec.md §4.6
/// step 2's required-point carve-out).
///
/// `perm[i]` is the index of new point `i` in the old mesh's point table
/// if it already existed there (kept through the split/remesh round
/// trip), or `UNSET` if it's new and must be located and interpolated.
pub fn interpolate_metrics_and_fields(
    old_group: &mut Group,
    new_group: &mut Group,
    perm: &[usize],
) -> Result<(), CoreError> {
    if old_group.met.is_empty() {
        return Err(CoreError::InputDataError(
            "interpolation requires a nonempty source metric".to_string(),
        ));
    }
    let geom = precompute_geometry(&mut old_group.mesh);
    old_group.mesh.ensure_adja();

    let np_new = new_group.mesh.point_count();
    if perm.len() != np_new {
        return Err(CoreError::InputDataError(format!(
            "permutation array has {} entries but the new mesh has {np_new} points",
            perm.len()
        )));
    }

    let mut hint = 0usize;
    for i in 0..np_new {
        let point = *new_group.mesh.point(i);
        // REQ-tagged points that survived the split/remesh round trip
        // copy their old value by permutation rather than being located
        // (spec.md §4.6 step 2); any other point with a known permutation
        // entry is just as cheap to copy directly.
        if perm[i] != UNSET {
            new_group.met.copy_value(i, &old_group.met, perm[i]);
            continue;
        }

        let loc = locate_point(&mut old_group.mesh, &geom, point.coords, hint);
        hint = loc.tet;
        interpolate_one_point(&old_group.mesh, &old_group.met, &mut new_group.met, i, &loc);
    }
    Ok(())
}

fn interpolate_one_point(
    old_mesh: &Mesh,
    old_met: &Metric,
    new_met: &mut Metric,
    dst: usize,
    loc: &Location,
) {
    let verts = old_mesh.tetra(loc.tet).v;
    match (old_met, new_met) {
        (Metric::Scalar(old_v), Metric::Scalar(new_v)) => {
            new_v[dst] = (0..4).map(|i| loc.bary[i] * old_v[verts[i]]).sum();
        }
        (Metric::Tensor(old_v), Metric::Tensor(new_v)) => {
            // Interpolate the inverses then invert back (spec.md §4.6
            // step 3): this keeps the combination positive-definite, a
            // plain linear blend of the SPD tensors themselves would not.
            let mut acc_inv = [0.0f64; 6];
            for i in 0..4 {
                let inv = invert_sym3(&old_v[verts[i]]);
                for c in 0..6 {
                    acc_inv[c] += loc.bary[i] * inv[c];
                }
            }
            new_v[dst] = invert_sym3(&acc_inv);
        }
        _ => unreachable!("metric size class mismatch between groups"),
    }
}

/// Inverts a symmetric 3x3 matrix stored as `[m00, m01, m02, m11, m12, m22]`.
fn invert_sym3(m: &[f64; 6]) -> [f64; 6] {
    let (m00, m01, m02, m11, m12, m22) = (m[0], m[1], m[2], m[3], m[4], m[5]);
    let det = m00 * (m11 * m22 - m12 * m12) - m01 * (m01 * m22 - m12 * m02)
        + m02 * (m01 * m12 - m11 * m02);
    if det.abs() < 1e-300 {
        return [0.0; 6];
    }
    let inv_det = 1.0 / det;
    [
        (m11 * m22 - m12 * m12) * inv_det,
        (m02 * m12 - m01 * m22) * inv_det,
        (m01 * m12 - m02 * m11) * inv_det,
        (m00 * m22 - m02 * m02) * inv_det,
        (m01 * m02 - m00 * m12) * inv_det,
        (m00 * m11 - m01 * m01) * inv_det,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Point, Tetra};

    fn unit_tet_group() -> Group {
        let mut mesh = Mesh::with_capacity(4, 1);
        mesh.push_point(Point::new([0.0, 0.0, 0.0])).unwrap();
        mesh.push_point(Point::new([1.0, 0.0, 0.0])).unwrap();
        mesh.push_point(Point::new([0.0, 1.0, 0.0])).unwrap();
        mesh.push_point(Point::new([0.0, 0.0, 1.0])).unwrap();
        mesh.push_tetra(Tetra::new([0, 1, 2, 3])).unwrap();
        let mut met = Metric::scalar_with_len(4);
        if let Metric::Scalar(v) = &mut met {
            *v = vec![1.0, 2.0, 3.0, 4.0];
        }
        Group::new(mesh, met)
    }

    #[test]
    fn centroid_interpolates_the_average_of_vertex_values() {
        let mut old = unit_tet_group();
        let mut new_mesh = Mesh::with_capacity(1, 0);
        new_mesh
            .push_point(Point::new([0.25, 0.25, 0.25]))
            .unwrap();
        let mut new = Group::new(new_mesh, Metric::scalar_with_len(1));
        interpolate_metrics_and_fields(&mut old, &mut new, &[UNSET]).unwrap();
        if let Metric::Scalar(v) = &new.met {
            assert!((v[0] - 2.5).abs() < 1e-9);
        } else {
            panic!("expected scalar metric");
        }
    }

    #[test]
    fn matching_permutation_copies_value_without_locating() {
        let mut old = unit_tet_group();
        let mut new_mesh = Mesh::with_capacity(1, 0);
        new_mesh.push_point(Point::new([5.0, 5.0, 5.0])).unwrap();
        let mut new = Group::new(new_mesh, Metric::scalar_with_len(1));
        interpolate_metrics_and_fields(&mut old, &mut new, &[2]).unwrap();
        if let Metric::Scalar(v) = &new.met {
            assert_eq!(v[0], 3.0);
        } else {
            panic!("expected scalar metric");
        }
    }
}
