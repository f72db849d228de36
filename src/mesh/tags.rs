use bitflags::bitflags;

bitflags! {
    /// Boundary/attribute bits carried on points and on xtetra faces/edges.
    ///
    /// Mirrors the tag bitset described for `Point.tag` and `xTetra`'s
    /// per-face/per-edge tags: boundary, required, corner, parallel-boundary,
    /// no-surf and the "was a process boundary last iteration" bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Tag: u16 {
        /// Domain boundary.
        const BDY              = 1 << 0;
        /// Must not be collapsed/moved by the sequential remesher.
        const REQ               = 1 << 1;
        /// Geometric corner.
        const CORNER            = 1 << 2;
        /// Currently a process/group interface.
        const PARBDY            = 1 << 3;
        /// Surface-unmodifiable (propagated through splits, never cleared).
        const NOSURF            = 1 << 4;
        /// Was a process boundary in the previous remeshing iteration.
        const OLD_PARBDY         = 1 << 5;
        /// Ridge / non-manifold edge.
        const RIDGE              = 1 << 6;
    }
}

impl Tag {
    /// The tag combination new interface faces are stamped with by the
    /// group splitter (spec.md §4.5): `PARBDY | BDY | REQ | NOSURF`.
    pub const NEW_INTERFACE: Tag = Tag::PARBDY.union(Tag::BDY).union(Tag::REQ).union(Tag::NOSURF);

    pub fn is_old_parbdy(self) -> bool {
        self.contains(Tag::OLD_PARBDY)
    }
}
