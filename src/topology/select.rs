use crate::error::TopologyError;
use crate::flat::SelectDomain;

use super::{EdgeId, ElemFlags, FaceId, LinkedMesh, VertId};

/// Reference to any selectable element of a linked mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemRef {
    Vert(VertId),
    Edge(EdgeId),
    Face(FaceId),
}

impl ElemRef {
    /// The selection domain of this element.
    #[must_use]
    pub fn domain(self) -> SelectDomain {
        match self {
            ElemRef::Vert(_) => SelectDomain::Vertex,
            ElemRef::Edge(_) => SelectDomain::Edge,
            ElemRef::Face(_) => SelectDomain::Face,
        }
    }
}

impl LinkedMesh {
    fn flags_mut(&mut self, elem: ElemRef) -> Result<&mut ElemFlags, TopologyError> {
        Ok(match elem {
            ElemRef::Vert(v) => &mut self.vert_mut(v)?.flags,
            ElemRef::Edge(e) => &mut self.edge_mut(e)?.flags,
            ElemRef::Face(f) => &mut self.face_mut(f)?.flags,
        })
    }

    fn set_selected(&mut self, elem: ElemRef, select: bool) -> Result<(), TopologyError> {
        let flags = self.flags_mut(elem)?;
        // Hidden elements cannot become selected.
        if select && flags.contains(ElemFlags::HIDDEN) {
            return Ok(());
        }
        flags.set(ElemFlags::SELECT, select);
        Ok(())
    }

    /// Sets or clears the selection of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex does not exist.
    pub fn select_vert(&mut self, vert: VertId, select: bool) -> Result<(), TopologyError> {
        self.set_selected(ElemRef::Vert(vert), select)
    }

    /// Sets or clears the selection of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn select_edge(&mut self, edge: EdgeId, select: bool) -> Result<(), TopologyError> {
        self.set_selected(ElemRef::Edge(edge), select)
    }

    /// Sets or clears the selection of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn select_face(&mut self, face: FaceId, select: bool) -> Result<(), TopologyError> {
        self.set_selected(ElemRef::Face(face), select)
    }

    /// Number of selected elements in `domain`.
    #[must_use]
    pub fn selected_count(&self, domain: SelectDomain) -> usize {
        let selected = |flags: &ElemFlags| flags.contains(ElemFlags::SELECT);
        match domain {
            SelectDomain::Vertex => self.verts.iter().filter(|(_, v)| selected(&v.flags)).count(),
            SelectDomain::Edge => self.edges.iter().filter(|(_, e)| selected(&e.flags)).count(),
            SelectDomain::Face => self.faces.iter().filter(|(_, f)| selected(&f.flags)).count(),
        }
    }

    /// Returns `true` if `elem` refers to a live element.
    #[must_use]
    pub fn contains(&self, elem: ElemRef) -> bool {
        match elem {
            ElemRef::Vert(v) => self.verts.contains(v),
            ElemRef::Edge(e) => self.edges.contains(e),
            ElemRef::Face(f) => self.faces.contains(f),
        }
    }

    // --- Selection history ---

    /// Selection history, oldest first.
    #[must_use]
    pub fn select_history(&self) -> &[ElemRef] {
        &self.select_history
    }

    /// Appends `elem` unless it is already recorded. Returns `true` if added.
    pub fn select_history_store(&mut self, elem: ElemRef) -> bool {
        if !self.contains(elem) || self.select_history.contains(&elem) {
            return false;
        }
        self.select_history.push(elem);
        true
    }

    /// Appends `elem` without checking for an existing record.
    pub fn select_history_store_notest(&mut self, elem: ElemRef) {
        self.select_history.push(elem);
    }

    /// Drops every record of `elem`. Returns `true` if one was present.
    pub fn select_history_remove(&mut self, elem: ElemRef) -> bool {
        let before = self.select_history.len();
        self.select_history.retain(|&h| h != elem);
        self.select_history.len() != before
    }

    /// Empties the selection history.
    pub fn select_history_clear(&mut self) {
        self.select_history.clear();
    }
}
