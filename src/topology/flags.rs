use bitflags::bitflags;

use crate::flat::{EdgeFlags, PolyFlags, VertFlags};

bitflags! {
    /// Header state bits shared by all linked elements.
    ///
    /// Flat flags round-trip through these bits, with one exception: a
    /// hidden element cannot be selected, so `SELECT` on a hidden flat
    /// element is dropped when it is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElemFlags: u8 {
        const SELECT = 1 << 0;
        const HIDDEN = 1 << 1;
        const SEAM = 1 << 2;
        /// Smooth shading; on edges the inverse of [`EdgeFlags::SHARP`].
        const SMOOTH = 1 << 3;
        const DRAW = 1 << 4;
        /// Scratch bit for tools, never persisted.
        const TAG = 1 << 5;
    }
}

impl ElemFlags {
    /// Header bits for a flat vertex, without selection.
    #[must_use]
    pub fn from_vert_flags(flags: VertFlags) -> Self {
        let mut out = ElemFlags::empty();
        out.set(ElemFlags::HIDDEN, flags.contains(VertFlags::HIDDEN));
        out
    }

    /// Flat vertex bits for these header bits.
    #[must_use]
    pub fn to_vert_flags(self) -> VertFlags {
        let mut out = VertFlags::empty();
        out.set(VertFlags::SELECT, self.contains(ElemFlags::SELECT));
        out.set(VertFlags::HIDDEN, self.contains(ElemFlags::HIDDEN));
        out
    }

    /// Header bits for a flat edge, without selection.
    #[must_use]
    pub fn from_edge_flags(flags: EdgeFlags) -> Self {
        let mut out = ElemFlags::empty();
        out.set(ElemFlags::SEAM, flags.contains(EdgeFlags::SEAM));
        out.set(ElemFlags::SMOOTH, !flags.contains(EdgeFlags::SHARP));
        out.set(ElemFlags::HIDDEN, flags.contains(EdgeFlags::HIDDEN));
        out.set(ElemFlags::DRAW, flags.contains(EdgeFlags::DRAW));
        out
    }

    /// Flat edge bits for these header bits.
    #[must_use]
    pub fn to_edge_flags(self) -> EdgeFlags {
        let mut out = EdgeFlags::empty();
        out.set(EdgeFlags::SELECT, self.contains(ElemFlags::SELECT));
        out.set(EdgeFlags::SEAM, self.contains(ElemFlags::SEAM));
        out.set(EdgeFlags::SHARP, !self.contains(ElemFlags::SMOOTH));
        out.set(EdgeFlags::HIDDEN, self.contains(ElemFlags::HIDDEN));
        out.set(EdgeFlags::DRAW, self.contains(ElemFlags::DRAW));
        out
    }

    /// Header bits for a flat polygon, without selection.
    #[must_use]
    pub fn from_poly_flags(flags: PolyFlags) -> Self {
        let mut out = ElemFlags::empty();
        out.set(ElemFlags::SMOOTH, flags.contains(PolyFlags::SMOOTH));
        out.set(ElemFlags::HIDDEN, flags.contains(PolyFlags::HIDDEN));
        out
    }

    /// Flat polygon bits for these header bits.
    #[must_use]
    pub fn to_poly_flags(self) -> PolyFlags {
        let mut out = PolyFlags::empty();
        out.set(PolyFlags::SELECT, self.contains(ElemFlags::SELECT));
        out.set(PolyFlags::SMOOTH, self.contains(ElemFlags::SMOOTH));
        out.set(PolyFlags::HIDDEN, self.contains(ElemFlags::HIDDEN));
        out
    }
}
