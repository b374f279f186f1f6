use crate::math::Vector3;

use super::edge::EdgeId;
use super::flags::ElemFlags;
use super::vertex::VertId;

slotmap::new_key_type! {
    /// Unique identifier for a face in a linked mesh.
    pub struct FaceId;

    /// Unique identifier for a face corner (loop) in a linked mesh.
    pub struct LoopId;
}

/// Data associated with a linked face.
///
/// A face owns a cycle of `len` loops starting at `first`.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// Cached face normal.
    pub no: Vector3,
    /// Material slot.
    pub mat_nr: i16,
    /// Header state bits.
    pub flags: ElemFlags,
    pub(crate) first: LoopId,
    pub(crate) len: usize,
    pub(crate) block: usize,
    pub(crate) index: usize,
}

impl FaceData {
    /// Number of corners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false` for a face in a valid mesh.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First loop of the cycle.
    #[must_use]
    pub fn first_loop(&self) -> LoopId {
        self.first
    }

    /// Row of this face in the face attribute store.
    #[must_use]
    pub fn block(&self) -> usize {
        self.block
    }
}

/// One face corner.
///
/// `edge` runs from `vert` to the vertex of `next`.
#[derive(Debug, Clone)]
pub struct LoopData {
    pub(crate) vert: VertId,
    pub(crate) edge: EdgeId,
    pub(crate) face: FaceId,
    pub(crate) next: LoopId,
    pub(crate) prev: LoopId,
    pub(crate) block: usize,
    pub(crate) index: usize,
}

impl LoopData {
    /// Vertex this corner sits on.
    #[must_use]
    pub fn vert(&self) -> VertId {
        self.vert
    }

    /// Edge from this corner to the next.
    #[must_use]
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// Owning face.
    #[must_use]
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// Next corner in the face cycle.
    #[must_use]
    pub fn next(&self) -> LoopId {
        self.next
    }

    /// Previous corner in the face cycle.
    #[must_use]
    pub fn prev(&self) -> LoopId {
        self.prev
    }

    /// Row of this loop in the loop attribute store.
    #[must_use]
    pub fn block(&self) -> usize {
        self.block
    }
}
