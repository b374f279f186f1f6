use crate::math::{Point3, Vector3};

use super::edge::EdgeId;
use super::flags::ElemFlags;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in a linked mesh.
    pub struct VertId;
}

/// Data associated with a linked vertex.
#[derive(Debug, Clone)]
pub struct VertData {
    /// The 3D position of the vertex.
    pub co: Point3,
    /// Cached vertex normal.
    pub no: Vector3,
    /// Header state bits.
    pub flags: ElemFlags,
    pub(crate) block: usize,
    pub(crate) index: usize,
    /// Edges using this vertex.
    pub(crate) edges: Vec<EdgeId>,
}

impl VertData {
    pub(crate) fn new(co: Point3, block: usize, index: usize) -> Self {
        Self {
            co,
            no: Vector3::zeros(),
            flags: ElemFlags::empty(),
            block,
            index,
            edges: Vec::new(),
        }
    }

    /// Row of this vertex in the vertex attribute store.
    #[must_use]
    pub fn block(&self) -> usize {
        self.block
    }

    /// Edges that use this vertex, in creation order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}
