//! Dual-graph adjacency of one local mesh (spec.md §3, `adja`; glossary
//! "adja").
//!
//! Encoding: slot `4*k + f` (0-based tet `k`, local face `f`) holds `0` if
//! face `f` of tet `k` is a boundary, or `4*j + g + 1` if it is glued to
//! local face `g` of tet `j`. The `+1` keeps the all-zero sentinel distinct
//! from the otherwise-valid `(j=0, g=0)` pairing, the same purpose spec.md's
//! 1-based `4*j+g` formula (with a separate `+5` pad) serves in the
//! original layout.

use crate::mesh::tetra::FACE_VERTICES;
use crate::mesh::tetra::Tetra;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Adja {
    slots: Vec<usize>,
}

impl Adja {
    pub fn with_capacity(ne: usize) -> Self {
        Adja {
            slots: vec![0; ne * 4],
        }
    }

    pub fn resize(&mut self, ne: usize) {
        self.slots.resize(ne * 4, 0);
    }

    #[inline]
    pub fn get(&self, k: usize, f: usize) -> Option<(usize, usize)> {
        let raw = self.slots[4 * k + f];
        if raw == 0 {
            None
        } else {
            let raw = raw - 1;
            Some((raw / 4, raw % 4))
        }
    }

    #[inline]
    pub fn set(&mut self, k: usize, f: usize, neighbor: Option<(usize, usize)>) {
        self.slots[4 * k + f] = match neighbor {
            None => 0,
            Some((j, g)) => 4 * j + g + 1,
        };
    }

    #[inline]
    pub fn is_boundary(&self, k: usize, f: usize) -> bool {
        self.slots[4 * k + f] == 0
    }

    /// Builds the adjacency of a packed mesh from scratch by hashing face
    /// vertex triplets (spec.md §4.2 step 1: "If adja absent, build it").
    pub fn build(tetras: &[Tetra]) -> Adja {
        let ne = tetras.len();
        let mut adja = Adja::with_capacity(ne);
        let mut by_face: HashMap<[usize; 3], (usize, usize)> = HashMap::with_capacity(ne * 2);

        for (k, tet) in tetras.iter().enumerate() {
            if !tet.alive {
                continue;
            }
            for (f, verts) in FACE_VERTICES.iter().enumerate() {
                let mut key = [tet.v[verts[0]], tet.v[verts[1]], tet.v[verts[2]]];
                key.sort_unstable();
                match by_face.remove(&key) {
                    Some((j, g)) => {
                        adja.set(k, f, Some((j, g)));
                        adja.set(j, g, Some((k, f)));
                    }
                    None => {
                        by_face.insert(key, (k, f));
                    }
                }
            }
        }
        adja
    }
}
