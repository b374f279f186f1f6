use tracing::debug;

use crate::attribute::{LayerType, ORIGINDEX_NONE};
use crate::topology::LinkedMesh;

/// Maps each vertex index of the previous flat mesh to its new index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalIndexMap {
    map: Vec<Option<usize>>,
}

impl OriginalIndexMap {
    /// Builds the map for a previous vertex count of `ototvert`.
    ///
    /// New indices are positions in the vertex pool. Without an original-index
    /// layer the first `ototvert` vertices map to themselves. When several
    /// vertices claim the same original index the first one wins, later ones
    /// are more likely duplicates.
    #[must_use]
    pub fn build(linked: &LinkedMesh, ototvert: usize) -> Self {
        let mut map = vec![None; ototvert];
        let key_index = linked
            .vdata
            .layer_handle(LayerType::ShapeKeyIndex)
            .and_then(|h| linked.vdata.ints(h).ok());

        match key_index {
            Some(keys) => {
                for (i, (_, v)) in linked.verts().iter().enumerate() {
                    let keyi = keys[v.block()];
                    if keyi == ORIGINDEX_NONE {
                        continue;
                    }
                    let Ok(keyi) = usize::try_from(keyi) else {
                        continue;
                    };
                    if let Some(slot @ None) = map.get_mut(keyi) {
                        *slot = Some(i);
                    }
                }
            }
            None => {
                for (slot, i) in map.iter_mut().zip(0..linked.num_verts()) {
                    *slot = Some(i);
                }
            }
        }
        Self { map }
    }

    /// New index of original vertex `old`, if it still exists.
    #[must_use]
    pub fn get(&self, old: usize) -> Option<usize> {
        self.map.get(old).copied().flatten()
    }

    /// Previous vertex count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the previous mesh had no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// How an object is parented to vertices of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexParent {
    Single(usize),
    Triple([usize; 3]),
}

impl VertexParent {
    /// Rewrites every index that resolves. Others are left untouched.
    pub fn remap(&mut self, map: &OriginalIndexMap) {
        let remap_one = |index: &mut usize| {
            if let Some(new) = map.get(*index) {
                *index = new;
            }
        };
        match self {
            VertexParent::Single(index) => remap_one(index),
            VertexParent::Triple(indices) => indices.iter_mut().for_each(remap_one),
        }
    }
}

/// Vertex indices a hook deformer is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HookIndices {
    pub name: String,
    pub indices: Vec<usize>,
}

impl HookIndices {
    /// Remaps the bound indices and drops those whose vertex is gone.
    ///
    /// Indices past the previous vertex count never referred to an original
    /// vertex and are kept as they are.
    pub fn remap(&mut self, map: &OriginalIndexMap) {
        let before = self.indices.len();
        self.indices.retain_mut(|index| {
            if *index >= map.len() {
                return true;
            }
            match map.get(*index) {
                Some(new) => {
                    *index = new;
                    true
                }
                None => false,
            }
        });
        if self.indices.len() != before {
            debug!(
                hook = %self.name,
                dropped = before - self.indices.len(),
                "hook lost vertices"
            );
        }
    }
}

/// External references to vertex indices of one mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshDependents {
    pub vertex_parents: Vec<VertexParent>,
    pub hooks: Vec<HookIndices>,
}

impl MeshDependents {
    /// Returns `true` if nothing references the mesh.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex_parents.is_empty() && self.hooks.is_empty()
    }

    /// Remaps every reference against the vertex numbering of `linked`.
    ///
    /// The index map is built at most once, and only if there is something
    /// to remap.
    pub fn remap(&mut self, linked: &LinkedMesh, ototvert: usize) {
        if ototvert == 0 || self.is_empty() {
            return;
        }
        let map = OriginalIndexMap::build(linked, ototvert);
        for parent in &mut self.vertex_parents {
            parent.remap(&map);
        }
        for hook in &mut self.hooks {
            hook.remap(&map);
        }
    }
}
