use slotmap::Key;

use crate::error::TopologyError;
use crate::math::polygon_3d::newell_normal;
use crate::math::{Point3, Vector3};

use super::select::ElemRef;
use super::{EdgeData, EdgeId, FaceData, FaceId, LinkedMesh, LoopData, LoopId, VertData, VertId};

/// Walks the loop cycle of one face, starting at its first loop.
pub struct FaceLoops<'a> {
    mesh: &'a LinkedMesh,
    next: LoopId,
    remaining: usize,
}

impl<'a> Iterator for FaceLoops<'a> {
    type Item = (LoopId, &'a LoopData);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next;
        let data = self.mesh.loops.get(id)?;
        self.remaining -= 1;
        self.next = data.next;
        Some((id, data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl LinkedMesh {
    // --- Creation ---

    /// Inserts a vertex with a default attribute block and returns its ID.
    pub fn add_vertex(&mut self, co: Point3) -> VertId {
        let block = self.vdata.alloc_block();
        let index = self.verts.len();
        self.verts.insert(VertData::new(co, block, index))
    }

    /// Inserts an edge between two distinct vertices.
    ///
    /// Duplicate edges are allowed; use [`LinkedMesh::edge_between`] first to
    /// reuse an existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is missing or both are the same.
    pub fn add_edge(&mut self, v1: VertId, v2: VertId) -> Result<EdgeId, TopologyError> {
        self.vert(v1)?;
        self.vert(v2)?;
        if v1 == v2 {
            return Err(TopologyError::InvalidTopology(
                "edge endpoints must differ".into(),
            ));
        }
        let block = self.edata.alloc_block();
        let index = self.edges.len();
        let id = self.edges.insert(EdgeData::new(v1, v2, block, index));
        for v in [v1, v2] {
            if let Some(vert) = self.verts.get_mut(v) {
                vert.edges.push(id);
            }
        }
        Ok(id)
    }

    /// The first edge joining `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        let vert = self.verts.get(a)?;
        vert.edges
            .iter()
            .copied()
            .find(|&e| self.edges.get(e).is_some_and(|data| data.connects(a, b)))
    }

    /// Inserts a face over an explicit vertex and edge cycle.
    ///
    /// `edges[i]` must join `verts[i]` and `verts[(i + 1) % len]`. Loops and
    /// attribute blocks are created for every corner; the face normal is left
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle has fewer than three corners, repeats a
    /// vertex, or an edge does not connect its corner pair.
    pub fn add_face(
        &mut self,
        verts: &[VertId],
        edges: &[EdgeId],
    ) -> Result<FaceId, TopologyError> {
        let len = verts.len();
        if len < 3 || edges.len() != len {
            return Err(TopologyError::InvalidTopology(format!(
                "face needs matching vertex and edge cycles of at least 3, got {len} and {}",
                edges.len()
            )));
        }
        for (i, &v) in verts.iter().enumerate() {
            self.vert(v)?;
            if verts[..i].contains(&v) {
                return Err(TopologyError::InvalidTopology(
                    "face uses a vertex twice".into(),
                ));
            }
            let next = verts[(i + 1) % len];
            if !self.edge(edges[i])?.connects(v, next) {
                return Err(TopologyError::InvalidTopology(format!(
                    "edge {i} does not join its corner to the next"
                )));
            }
        }

        let block = self.pdata.alloc_block();
        let index = self.faces.len();
        let face = self.faces.insert(FaceData {
            no: Vector3::zeros(),
            mat_nr: 0,
            flags: super::ElemFlags::empty(),
            first: LoopId::null(),
            len,
            block,
            index,
        });

        self.loops.reserve(len);
        let loop_ids: Vec<LoopId> = verts
            .iter()
            .zip(edges)
            .map(|(&vert, &edge)| {
                let block = self.ldata.alloc_block();
                let index = self.loops.len();
                self.loops.insert(LoopData {
                    vert,
                    edge,
                    face,
                    next: LoopId::null(),
                    prev: LoopId::null(),
                    block,
                    index,
                })
            })
            .collect();

        for (i, &l) in loop_ids.iter().enumerate() {
            let next = loop_ids[(i + 1) % len];
            let prev = loop_ids[(i + len - 1) % len];
            if let Some(data) = self.loops.get_mut(l) {
                data.next = next;
                data.prev = prev;
            }
            if let Some(edge) = self.edges.get_mut(edges[i]) {
                edge.radial.push(l);
            }
        }
        if let Some(data) = self.faces.get_mut(face) {
            data.first = loop_ids[0];
        }
        Ok(face)
    }

    /// Inserts a face over `verts`, reusing existing edges or creating them.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`LinkedMesh::add_face`].
    pub fn add_face_from_verts(&mut self, verts: &[VertId]) -> Result<FaceId, TopologyError> {
        if verts.len() < 3 {
            return Err(TopologyError::InvalidTopology(format!(
                "face needs at least 3 vertices, got {}",
                verts.len()
            )));
        }
        let mut edges = Vec::with_capacity(verts.len());
        for (i, &v) in verts.iter().enumerate() {
            let next = verts[(i + 1) % verts.len()];
            let edge = match self.edge_between(v, next) {
                Some(e) => e,
                None => self.add_edge(v, next)?,
            };
            edges.push(edge);
        }
        self.add_face(verts, &edges)
    }

    // --- Removal ---

    /// Removes a face and its loops. Edges and vertices are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn kill_face(&mut self, face: FaceId) -> Result<(), TopologyError> {
        let loop_ids: Vec<LoopId> = self.face_loops(face)?.map(|(l, _)| l).collect();
        for l in loop_ids {
            if let Some(data) = self.loops.remove(l) {
                if let Some(edge) = self.edges.get_mut(data.edge) {
                    edge.radial.retain(|&r| r != l);
                }
                self.ldata.free_block(data.block);
            }
        }
        if let Some(data) = self.faces.remove(face) {
            self.pdata.free_block(data.block);
        }
        self.forget(ElemRef::Face(face));
        if self.act_face == Some(face) {
            self.act_face = None;
        }
        Ok(())
    }

    /// Removes an edge together with every face using it.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn kill_edge(&mut self, edge: EdgeId) -> Result<(), TopologyError> {
        for face in self.edge_faces(edge)? {
            self.kill_face(face)?;
        }
        if let Some(data) = self.edges.remove(edge) {
            for v in [data.v1, data.v2] {
                if let Some(vert) = self.verts.get_mut(v) {
                    vert.edges.retain(|&e| e != edge);
                }
            }
            self.edata.free_block(data.block);
        }
        self.forget(ElemRef::Edge(edge));
        Ok(())
    }

    /// Removes a vertex together with every edge and face using it.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex does not exist.
    pub fn kill_vertex(&mut self, vert: VertId) -> Result<(), TopologyError> {
        let edges = self.vert(vert)?.edges.clone();
        for edge in edges {
            self.kill_edge(edge)?;
        }
        if let Some(data) = self.verts.remove(vert) {
            self.vdata.free_block(data.block);
        }
        self.forget(ElemRef::Vert(vert));
        Ok(())
    }

    fn forget(&mut self, elem: ElemRef) {
        self.select_history.retain(|&h| h != elem);
    }

    // --- Queries ---

    /// Iterates the loops of `face` in cycle order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn face_loops(&self, face: FaceId) -> Result<FaceLoops<'_>, TopologyError> {
        let data = self.face(face)?;
        Ok(FaceLoops {
            mesh: self,
            next: data.first,
            remaining: data.len,
        })
    }

    /// The corner vertices of `face` in cycle order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not exist.
    pub fn face_verts(&self, face: FaceId) -> Result<Vec<VertId>, TopologyError> {
        Ok(self.face_loops(face)?.map(|(_, l)| l.vert).collect())
    }

    /// Faces using `edge`, in radial order. A face appears once per corner on the edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn edge_faces(&self, edge: EdgeId) -> Result<Vec<FaceId>, TopologyError> {
        Ok(self
            .edge(edge)?
            .radial
            .iter()
            .filter_map(|&l| self.loops.get(l).map(|data| data.face))
            .collect())
    }

    /// Unit normal of `face` by Newell's method; zero when degenerate.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices does not exist.
    pub fn compute_face_normal(&self, face: FaceId) -> Result<Vector3, TopologyError> {
        let points = self
            .face_loops(face)?
            .map(|(_, l)| self.vert(l.vert).map(|v| v.co))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(newell_normal(&points))
    }

    /// Recomputes and stores the normal of `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices does not exist.
    pub fn update_face_normal(&mut self, face: FaceId) -> Result<(), TopologyError> {
        let no = self.compute_face_normal(face)?;
        self.face_mut(face)?.no = no;
        Ok(())
    }

    /// Checks the adjacency invariants of the whole mesh.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] describing the first
    /// violation found.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let invalid = |msg: String| Err(TopologyError::InvalidTopology(msg));

        for (e, edge) in self.edges.iter() {
            for v in [edge.v1, edge.v2] {
                let Some(vert) = self.verts.get(v) else {
                    return invalid(format!("{e:?} references a missing vertex"));
                };
                if !vert.edges.contains(&e) {
                    return invalid(format!("{e:?} is missing from the edge list of {v:?}"));
                }
            }
            for &l in &edge.radial {
                if self.loops.get(l).is_none_or(|data| data.edge != e) {
                    return invalid(format!("{e:?} has a foreign loop in its radial list"));
                }
            }
        }

        for (v, vert) in self.verts.iter() {
            for &e in &vert.edges {
                if self.edges.get(e).is_none_or(|edge| edge.v1 != v && edge.v2 != v) {
                    return invalid(format!("{v:?} lists an edge that does not use it"));
                }
            }
        }

        let mut loops_seen = 0;
        for (f, face) in self.faces.iter() {
            if face.len < 3 {
                return invalid(format!("{f:?} has only {} loops", face.len));
            }
            let mut l = face.first;
            for _ in 0..face.len {
                let Some(data) = self.loops.get(l) else {
                    return invalid(format!("{f:?} cycle references a missing loop"));
                };
                let Some(next) = self.loops.get(data.next) else {
                    return invalid(format!("{f:?} cycle is broken"));
                };
                if data.face != f || next.prev != l {
                    return invalid(format!("{f:?} cycle links are inconsistent"));
                }
                let joins = self
                    .edges
                    .get(data.edge)
                    .is_some_and(|edge| edge.connects(data.vert, next.vert));
                if !joins {
                    return invalid(format!("{f:?} has a loop whose edge skips its corner"));
                }
                if !self.edges.get(data.edge).is_some_and(|edge| edge.radial.contains(&l)) {
                    return invalid(format!("{f:?} has a loop missing from its edge"));
                }
                loops_seen += 1;
                l = data.next;
            }
            if l != face.first {
                return invalid(format!("{f:?} cycle does not close after {} loops", face.len));
            }
        }
        if loops_seen != self.loops.len() {
            return invalid(format!(
                "{} loops belong to no face",
                self.loops.len() - loops_seen
            ));
        }
        Ok(())
    }
}
