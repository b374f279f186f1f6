use super::face::LoopId;
use super::flags::ElemFlags;
use super::vertex::VertId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in a linked mesh.
    pub struct EdgeId;
}

/// Data associated with a linked edge.
///
/// The radial list holds one loop per face corner that runs along this edge:
/// empty for a wire edge, one entry on a boundary, two on a manifold interior.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// First endpoint.
    pub v1: VertId,
    /// Second endpoint.
    pub v2: VertId,
    /// Header state bits.
    pub flags: ElemFlags,
    pub(crate) block: usize,
    pub(crate) index: usize,
    pub(crate) radial: Vec<LoopId>,
}

impl EdgeData {
    pub(crate) fn new(v1: VertId, v2: VertId, block: usize, index: usize) -> Self {
        Self {
            v1,
            v2,
            flags: ElemFlags::empty(),
            block,
            index,
            radial: Vec::new(),
        }
    }

    /// Row of this edge in the edge attribute store.
    #[must_use]
    pub fn block(&self) -> usize {
        self.block
    }

    /// Loops running along this edge.
    #[must_use]
    pub fn radial(&self) -> &[LoopId] {
        &self.radial
    }

    /// Returns `true` if the edge joins `a` and `b` in either direction.
    #[must_use]
    pub fn connects(&self, a: VertId, b: VertId) -> bool {
        (self.v1 == a && self.v2 == b) || (self.v1 == b && self.v2 == a)
    }

    /// The endpoint opposite `v`, if `v` is an endpoint.
    #[must_use]
    pub fn other_vert(&self, v: VertId) -> Option<VertId> {
        if self.v1 == v {
            Some(self.v2)
        } else if self.v2 == v {
            Some(self.v1)
        } else {
            None
        }
    }
}
