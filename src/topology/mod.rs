pub mod edge;
mod edit;
pub mod face;
pub mod flags;
mod select;
pub mod vertex;

pub use edge::{EdgeData, EdgeId};
pub use edit::FaceLoops;
pub use face::{FaceData, FaceId, LoopData, LoopId};
pub use flags::ElemFlags;
pub use select::ElemRef;
pub use vertex::{VertData, VertId};

use slotmap::{Key, SlotMap};

use crate::attribute::{AttributeStore, LayerType, ORIGINDEX_NONE};
use crate::error::TopologyError;
use crate::flat::MeshFeatures;

/// Arena of one element kind plus the validity of its cached indices.
///
/// Any insertion or removal clears `indices_valid`; only a full in-order
/// pass may set it again through [`ElementPool::mark_indices_valid`].
#[derive(Debug, Clone)]
pub struct ElementPool<K: Key, V> {
    elems: SlotMap<K, V>,
    indices_valid: bool,
}

impl<K: Key, V> Default for ElementPool<K, V> {
    fn default() -> Self {
        Self {
            elems: SlotMap::with_key(),
            indices_valid: true,
        }
    }
}

impl<K: Key, V> ElementPool<K, V> {
    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Returns `true` if the pool holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Returns `true` if every element's cached index matches its pool position.
    #[must_use]
    pub fn indices_valid(&self) -> bool {
        self.indices_valid
    }

    pub(crate) fn mark_indices_valid(&mut self) {
        self.indices_valid = true;
    }

    /// The element behind `id`.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&V> {
        self.elems.get(id)
    }

    /// Mutable access to the element behind `id`. Does not affect indices.
    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.elems.get_mut(id)
    }

    /// Returns `true` if `id` refers to a live element.
    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.elems.contains_key(id)
    }

    /// Iterates elements in pool order.
    pub fn iter(&self) -> slotmap::basic::Iter<'_, K, V> {
        self.elems.iter()
    }

    /// Iterates elements mutably in pool order.
    pub fn iter_mut(&mut self) -> slotmap::basic::IterMut<'_, K, V> {
        self.elems.iter_mut()
    }

    /// Element ids in pool order.
    pub fn keys(&self) -> slotmap::basic::Keys<'_, K, V> {
        self.elems.keys()
    }

    pub(crate) fn insert(&mut self, value: V) -> K {
        self.indices_valid = false;
        self.elems.insert(value)
    }

    pub(crate) fn remove(&mut self, id: K) -> Option<V> {
        let removed = self.elems.remove(id);
        if removed.is_some() {
            self.indices_valid = false;
        }
        removed
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.elems.reserve(additional);
    }
}

/// Fully linked editable mesh.
///
/// Elements live in per-kind arenas and reference each other by typed ids.
/// Each element owns one row (block) in its domain's attribute store.
#[derive(Debug, Clone, Default)]
pub struct LinkedMesh {
    pub(crate) verts: ElementPool<VertId, VertData>,
    pub(crate) edges: ElementPool<EdgeId, EdgeData>,
    pub(crate) loops: ElementPool<LoopId, LoopData>,
    pub(crate) faces: ElementPool<FaceId, FaceData>,
    /// Vertex attribute layers, including shape key layers.
    pub vdata: AttributeStore,
    /// Edge attribute layers.
    pub edata: AttributeStore,
    /// Loop attribute layers.
    pub ldata: AttributeStore,
    /// Face attribute layers.
    pub pdata: AttributeStore,
    pub(crate) select_history: Vec<ElemRef>,
    /// The active face, if any.
    pub act_face: Option<FaceId>,
    /// Index of the shape block being edited, if any.
    pub active_shape: Option<usize>,
}

impl LinkedMesh {
    /// Creates a new, empty linked mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mesh has neither elements nor attribute layers.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.verts.is_empty()
            && self.vdata.is_empty()
            && self.edata.is_empty()
            && self.ldata.is_empty()
            && self.pdata.is_empty()
    }

    /// The vertex pool.
    #[must_use]
    pub fn verts(&self) -> &ElementPool<VertId, VertData> {
        &self.verts
    }

    /// The edge pool.
    #[must_use]
    pub fn edges(&self) -> &ElementPool<EdgeId, EdgeData> {
        &self.edges
    }

    /// The loop pool.
    #[must_use]
    pub fn loops(&self) -> &ElementPool<LoopId, LoopData> {
        &self.loops
    }

    /// The face pool.
    #[must_use]
    pub fn faces(&self) -> &ElementPool<FaceId, FaceData> {
        &self.faces
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of loops.
    #[must_use]
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    // --- Element access ---

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn vert(&self, id: VertId) -> Result<&VertData, TopologyError> {
        self.verts
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn vert_mut(&mut self, id: VertId) -> Result<&mut VertData, TopologyError> {
        self.verts
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a reference to the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn loop_(&self, id: LoopId) -> Result<&LoopData, TopologyError> {
        self.loops
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("loop".into()))
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    // --- Cached indices ---

    /// Cached index of a vertex, available while the vertex pool is in order.
    #[must_use]
    pub fn vert_index(&self, id: VertId) -> Option<usize> {
        self.verts
            .indices_valid()
            .then(|| self.verts.get(id).map(|v| v.index))
            .flatten()
    }

    /// Cached index of an edge, available while the edge pool is in order.
    #[must_use]
    pub fn edge_index(&self, id: EdgeId) -> Option<usize> {
        self.edges
            .indices_valid()
            .then(|| self.edges.get(id).map(|e| e.index))
            .flatten()
    }

    /// Cached index of a face, available while the face pool is in order.
    #[must_use]
    pub fn face_index(&self, id: FaceId) -> Option<usize> {
        self.faces
            .indices_valid()
            .then(|| self.faces.get(id).map(|f| f.index))
            .flatten()
    }

    /// Renumbers every element of every pool in pool order.
    ///
    /// Loops are numbered face by face, following each face's cycle.
    pub fn ensure_indices(&mut self) {
        if !self.verts.indices_valid() {
            for (i, (_, v)) in self.verts.iter_mut().enumerate() {
                v.index = i;
            }
            self.verts.mark_indices_valid();
        }
        if !self.edges.indices_valid() {
            for (i, (_, e)) in self.edges.iter_mut().enumerate() {
                e.index = i;
            }
            self.edges.mark_indices_valid();
        }
        if !self.faces.indices_valid() || !self.loops.indices_valid() {
            let mut loop_index = 0;
            let face_ids: Vec<FaceId> = self.faces.keys().collect();
            for (i, f) in face_ids.into_iter().enumerate() {
                let Some(face) = self.faces.get_mut(f) else {
                    continue;
                };
                face.index = i;
                let (first, len) = (face.first, face.len);
                let mut l = first;
                for _ in 0..len {
                    let Some(data) = self.loops.get_mut(l) else {
                        break;
                    };
                    data.index = loop_index;
                    loop_index += 1;
                    l = data.next;
                }
            }
            self.faces.mark_indices_valid();
            self.loops.mark_indices_valid();
        }
    }

    // --- Feature layers ---

    /// Optional scalar fields present as layers on this mesh.
    #[must_use]
    pub fn features(&self) -> MeshFeatures {
        let mut features = MeshFeatures::empty();
        features.set(
            MeshFeatures::VERT_BWEIGHT,
            self.vdata.has_layer(LayerType::BevelWeight),
        );
        features.set(
            MeshFeatures::EDGE_BWEIGHT,
            self.edata.has_layer(LayerType::BevelWeight),
        );
        features.set(
            MeshFeatures::EDGE_CREASE,
            self.edata.has_layer(LayerType::Crease),
        );
        features
    }

    /// Adds or removes feature layers so they match `features` exactly.
    pub fn apply_features(&mut self, features: MeshFeatures) {
        let wanted = [
            (MeshFeatures::VERT_BWEIGHT, LayerType::BevelWeight, true),
            (MeshFeatures::EDGE_BWEIGHT, LayerType::BevelWeight, false),
            (MeshFeatures::EDGE_CREASE, LayerType::Crease, false),
        ];
        for (feature, ty, on_verts) in wanted {
            let store = if on_verts {
                &mut self.vdata
            } else {
                &mut self.edata
            };
            match (features.contains(feature), store.has_layer(ty)) {
                (true, false) => {
                    store.add_layer(ty, "");
                }
                (false, true) => {
                    store.remove_layer(ty);
                }
                _ => {}
            }
        }
    }

    /// Flat index a vertex was built from, if the mesh tracks original indices.
    #[must_use]
    pub fn original_index(&self, vert: VertId) -> Option<usize> {
        let handle = self.vdata.layer_handle(LayerType::ShapeKeyIndex)?;
        let row = self.verts.get(vert)?.block;
        let keyi = *self.vdata.ints(handle).ok()?.get(row)?;
        if keyi == ORIGINDEX_NONE {
            return None;
        }
        usize::try_from(keyi).ok()
    }
}
