use crate::error::AttributeError;

use super::{CopyPolicy, Layer, LayerData, LayerMask, LayerType};

/// Position of a layer inside an [`AttributeStore`].
///
/// Handles stay valid until a layer is added to or removed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(usize);

impl LayerHandle {
    /// The layer's position in the store.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Collection of named, typed layers over one element domain.
///
/// Every layer holds exactly [`AttributeStore::rows`] values. Flat meshes use
/// one row per element; linked meshes hand out rows as element blocks and
/// recycle the rows of removed elements.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    layers: Vec<Layer>,
    rows: usize,
    free_rows: Vec<usize>,
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $name:literal) => {
        /// Typed read access to a layer's payload.
        ///
        /// # Errors
        ///
        /// Returns [`AttributeError::TypeMismatch`] if the layer stores another kind.
        pub fn $get(&self, handle: LayerHandle) -> Result<&[$ty], AttributeError> {
            let layer = &self.layers[handle.0];
            match layer.data() {
                LayerData::$variant(values) => Ok(values),
                _ => Err(AttributeError::TypeMismatch {
                    expected: $name,
                    found: layer.ty(),
                }),
            }
        }

        /// Typed write access to a layer's payload.
        ///
        /// # Errors
        ///
        /// Returns [`AttributeError::TypeMismatch`] if the layer stores another kind.
        pub fn $get_mut(&mut self, handle: LayerHandle) -> Result<&mut [$ty], AttributeError> {
            let layer = &mut self.layers[handle.0];
            let found = layer.ty();
            match layer.data_mut() {
                LayerData::$variant(values) => Ok(values),
                _ => Err(AttributeError::TypeMismatch {
                    expected: $name,
                    found,
                }),
            }
        }
    };
}

impl AttributeStore {
    /// Creates an empty store with no layers and no rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layerless store sized for `rows` elements.
    #[must_use]
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Number of rows every layer holds.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the store has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers in storage order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// The layer behind `handle`.
    #[must_use]
    pub fn layer(&self, handle: LayerHandle) -> &Layer {
        &self.layers[handle.0]
    }

    /// Mutable access to the layer behind `handle`.
    pub fn layer_mut(&mut self, handle: LayerHandle) -> &mut Layer {
        &mut self.layers[handle.0]
    }

    /// Creates a new store holding every layer whose type `mask` selects.
    #[must_use]
    pub fn copy(&self, mask: LayerMask, policy: CopyPolicy, element_count: usize) -> Self {
        let mut dst = Self {
            layers: Vec::new(),
            rows: element_count,
            free_rows: Vec::new(),
        };
        for layer in self.layers.iter().filter(|l| mask.selects(l.ty())) {
            dst.layers.push(carry_layer(layer, policy, element_count));
        }
        dst
    }

    /// Adds every layer of `src` selected by `mask` that this store lacks.
    ///
    /// Layers already present are left untouched. Returns `true` if any layer
    /// was added.
    pub fn merge_from(
        &mut self,
        src: &AttributeStore,
        mask: LayerMask,
        policy: CopyPolicy,
    ) -> bool {
        let mut changed = false;
        for layer in src.layers.iter().filter(|l| mask.selects(l.ty())) {
            if self.layers.iter().any(|existing| existing.same_slot(layer)) {
                continue;
            }
            let carried = carry_layer(layer, policy, self.rows);
            self.insert_layer(carried);
            changed = true;
        }
        changed
    }

    /// Adds a default-filled layer.
    pub fn add_layer(&mut self, ty: LayerType, name: &str) -> LayerHandle {
        let data = LayerData::new_default(ty, self.rows);
        self.insert_layer(Layer::new(ty, name, data))
    }

    /// Adds a layer that takes ownership of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload kind does not match `ty` or its length
    /// differs from [`AttributeStore::rows`].
    pub fn add_layer_with_data(
        &mut self,
        ty: LayerType,
        name: &str,
        data: LayerData,
    ) -> Result<LayerHandle, AttributeError> {
        if !data.matches(ty) {
            return Err(AttributeError::TypeMismatch {
                expected: "payload matching the layer type",
                found: ty,
            });
        }
        if data.len() != self.rows {
            return Err(AttributeError::LengthMismatch {
                len: data.len(),
                rows: self.rows,
            });
        }
        Ok(self.insert_layer(Layer::new(ty, name, data)))
    }

    /// Adds a shape key layer bound to a shape block uid.
    pub fn add_shape_layer(&mut self, name: &str, uid: u32) -> LayerHandle {
        let mut layer = Layer::new(
            LayerType::ShapeKey,
            name,
            LayerData::new_default(LayerType::ShapeKey, self.rows),
        );
        layer.set_uid(uid);
        self.insert_layer(layer)
    }

    /// Removes the first layer of type `ty`. Returns `true` if one was removed.
    pub fn remove_layer(&mut self, ty: LayerType) -> bool {
        match self.layers.iter().position(|l| l.ty() == ty) {
            Some(i) => {
                self.layers.remove(i);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if a layer of type `ty` exists.
    #[must_use]
    pub fn has_layer(&self, ty: LayerType) -> bool {
        self.layers.iter().any(|l| l.ty() == ty)
    }

    /// Handle of the first layer of type `ty`.
    #[must_use]
    pub fn layer_handle(&self, ty: LayerType) -> Option<LayerHandle> {
        self.layer_handle_n(ty, 0)
    }

    /// Handle of the `n`-th layer of type `ty`.
    #[must_use]
    pub fn layer_handle_n(&self, ty: LayerType, n: usize) -> Option<LayerHandle> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.ty() == ty)
            .nth(n)
            .map(|(i, _)| LayerHandle(i))
    }

    /// Handle of the layer of type `ty` named `name`.
    #[must_use]
    pub fn layer_named(&self, ty: LayerType, name: &str) -> Option<LayerHandle> {
        self.layers
            .iter()
            .position(|l| l.ty() == ty && l.name() == name)
            .map(LayerHandle)
    }

    /// Handle of the layer of type `ty` carrying `uid`.
    #[must_use]
    pub fn layer_by_uid(&self, ty: LayerType, uid: u32) -> Option<LayerHandle> {
        self.layers
            .iter()
            .position(|l| l.ty() == ty && l.uid() == uid)
            .map(LayerHandle)
    }

    /// Number of layers of type `ty`.
    #[must_use]
    pub fn count_layers(&self, ty: LayerType) -> usize {
        self.layers.iter().filter(|l| l.ty() == ty).count()
    }

    /// Copies every layer value of row `src_row` in `src` into `dst_row` of
    /// this store, matching layers by slot. Unmatched layers are left alone.
    pub fn copy_block_from(&mut self, src: &AttributeStore, src_row: usize, dst_row: usize) {
        for dst_layer in &mut self.layers {
            if let Some(src_layer) = src.layers.iter().find(|l| l.same_slot(dst_layer)) {
                dst_layer
                    .data_mut()
                    .copy_element(dst_row, src_layer.data(), src_row);
            }
        }
    }

    /// Reserves a default-filled row and returns its index.
    pub fn alloc_block(&mut self) -> usize {
        if let Some(row) = self.free_rows.pop() {
            for layer in &mut self.layers {
                let ty = layer.ty();
                layer.data_mut().reset(ty, row);
            }
            return row;
        }
        let row = self.rows;
        self.rows += 1;
        for layer in &mut self.layers {
            let ty = layer.ty();
            layer.data_mut().resize(ty, self.rows);
        }
        row
    }

    /// Returns a row to the free list.
    pub fn free_block(&mut self, row: usize) {
        debug_assert!(row < self.rows && !self.free_rows.contains(&row));
        self.free_rows.push(row);
    }

    /// Rows handed out and not yet freed.
    #[must_use]
    pub fn live_rows(&self) -> usize {
        self.rows - self.free_rows.len()
    }

    fn insert_layer(&mut self, layer: Layer) -> LayerHandle {
        // Same-typed layers stay contiguous so sequence lookups stay stable.
        let at = self
            .layers
            .iter()
            .rposition(|l| l.ty() == layer.ty())
            .map_or(self.layers.len(), |i| i + 1);
        self.layers.insert(at, layer);
        LayerHandle(at)
    }

    typed_access!(floats, floats_mut, Float, f32, "float");
    typed_access!(ints, ints_mut, Int, i32, "int");
    typed_access!(float2s, float2s_mut, Float2, [f32; 2], "float2");
    typed_access!(float3s, float3s_mut, Float3, [f32; 3], "float3");
    typed_access!(colors, colors_mut, Color, [f32; 4], "color");
    typed_access!(bools, bools_mut, Bool, bool, "bool");
}

/// Builds the destination copy of `layer` under `policy`, sized to `rows`.
fn carry_layer(layer: &Layer, policy: CopyPolicy, rows: usize) -> Layer {
    let mut carried = match policy {
        CopyPolicy::Reference => layer.with_shared(layer.shared_data().clone()),
        CopyPolicy::Duplicate => layer.with_shared(std::sync::Arc::new(layer.data().clone())),
        CopyPolicy::ZeroInit => {
            layer.with_shared(std::sync::Arc::new(LayerData::new_default(layer.ty(), rows)))
        }
    };
    if carried.data().len() != rows {
        let ty = carried.ty();
        carried.data_mut().resize(ty, rows);
    }
    carried
}
