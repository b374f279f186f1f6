use std::sync::Arc;

use super::{LayerType, ORIGINDEX_NONE};

/// Dense per-element payload of one attribute layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Float2(Vec<[f32; 2]>),
    Float3(Vec<[f32; 3]>),
    Color(Vec<[f32; 4]>),
    Bool(Vec<bool>),
}

impl LayerData {
    /// Creates `len` default values for the given layer type.
    #[must_use]
    pub fn new_default(ty: LayerType, len: usize) -> Self {
        match ty {
            LayerType::Float | LayerType::BevelWeight | LayerType::Crease => {
                LayerData::Float(vec![0.0; len])
            }
            LayerType::Int => LayerData::Int(vec![0; len]),
            LayerType::ShapeKeyIndex => LayerData::Int(vec![ORIGINDEX_NONE; len]),
            LayerType::Float2 => LayerData::Float2(vec![[0.0; 2]; len]),
            LayerType::Float3 | LayerType::ShapeKey => LayerData::Float3(vec![[0.0; 3]; len]),
            LayerType::Color => LayerData::Color(vec![[0.0; 4]; len]),
            LayerType::Bool => LayerData::Bool(vec![false; len]),
        }
    }

    /// Returns `true` if this payload can back a layer of type `ty`.
    #[must_use]
    pub fn matches(&self, ty: LayerType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&LayerData::new_default(ty, 0))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            LayerData::Float(v) => v.len(),
            LayerData::Int(v) => v.len(),
            LayerData::Float2(v) => v.len(),
            LayerData::Float3(v) => v.len(),
            LayerData::Color(v) => v.len(),
            LayerData::Bool(v) => v.len(),
        }
    }

    /// Returns `true` if the payload has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grows or shrinks to `len`, filling new slots with the type default.
    pub fn resize(&mut self, ty: LayerType, len: usize) {
        match (self, LayerData::new_default(ty, 1)) {
            (LayerData::Float(v), LayerData::Float(d)) => v.resize(len, d[0]),
            (LayerData::Int(v), LayerData::Int(d)) => v.resize(len, d[0]),
            (LayerData::Float2(v), LayerData::Float2(d)) => v.resize(len, d[0]),
            (LayerData::Float3(v), LayerData::Float3(d)) => v.resize(len, d[0]),
            (LayerData::Color(v), LayerData::Color(d)) => v.resize(len, d[0]),
            (LayerData::Bool(v), LayerData::Bool(d)) => v.resize(len, d[0]),
            _ => {}
        }
    }

    /// Resets one element to the type default.
    pub(crate) fn reset(&mut self, ty: LayerType, row: usize) {
        match (self, LayerData::new_default(ty, 1)) {
            (LayerData::Float(v), LayerData::Float(d)) => v[row] = d[0],
            (LayerData::Int(v), LayerData::Int(d)) => v[row] = d[0],
            (LayerData::Float2(v), LayerData::Float2(d)) => v[row] = d[0],
            (LayerData::Float3(v), LayerData::Float3(d)) => v[row] = d[0],
            (LayerData::Color(v), LayerData::Color(d)) => v[row] = d[0],
            (LayerData::Bool(v), LayerData::Bool(d)) => v[row] = d[0],
            _ => {}
        }
    }

    /// Copies element `src_row` of `src` into element `dst_row` of `self`.
    ///
    /// Payloads of different kinds are left untouched.
    pub(crate) fn copy_element(&mut self, dst_row: usize, src: &LayerData, src_row: usize) {
        match (self, src) {
            (LayerData::Float(d), LayerData::Float(s)) => d[dst_row] = s[src_row],
            (LayerData::Int(d), LayerData::Int(s)) => d[dst_row] = s[src_row],
            (LayerData::Float2(d), LayerData::Float2(s)) => d[dst_row] = s[src_row],
            (LayerData::Float3(d), LayerData::Float3(s)) => d[dst_row] = s[src_row],
            (LayerData::Color(d), LayerData::Color(s)) => d[dst_row] = s[src_row],
            (LayerData::Bool(d), LayerData::Bool(s)) => d[dst_row] = s[src_row],
            _ => {}
        }
    }
}

/// A typed, named attribute layer.
///
/// The payload is reference counted so [`super::CopyPolicy::Reference`]
/// copies share storage until one side writes.
#[derive(Debug, Clone)]
pub struct Layer {
    ty: LayerType,
    name: String,
    uid: u32,
    data: Arc<LayerData>,
}

impl Layer {
    pub(crate) fn new(ty: LayerType, name: impl Into<String>, data: LayerData) -> Self {
        Self {
            ty,
            name: name.into(),
            uid: 0,
            data: Arc::new(data),
        }
    }

    pub(crate) fn with_shared(&self, data: Arc<LayerData>) -> Self {
        Self {
            ty: self.ty,
            name: self.name.clone(),
            uid: self.uid,
            data,
        }
    }

    /// The layer's type tag.
    #[must_use]
    pub fn ty(&self) -> LayerType {
        self.ty
    }

    /// The layer's name. May be empty for unnamed layers.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable identifier; meaningful for shape key layers.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub(crate) fn set_uid(&mut self, uid: u32) {
        self.uid = uid;
    }

    /// Read access to the payload.
    #[must_use]
    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub(crate) fn shared_data(&self) -> &Arc<LayerData> {
        &self.data
    }

    /// Write access to the payload, unsharing it first if needed.
    pub fn data_mut(&mut self) -> &mut LayerData {
        Arc::make_mut(&mut self.data)
    }

    /// Returns `true` if `other` describes the same layer slot.
    ///
    /// Shape key layers are identified by uid, everything else by type and name.
    #[must_use]
    pub fn same_slot(&self, other: &Layer) -> bool {
        self.ty == other.ty
            && if self.ty == LayerType::ShapeKey {
                self.uid == other.uid
            } else {
                self.name == other.name
            }
    }

    /// Returns `true` if both layers share one payload allocation.
    #[must_use]
    pub fn shares_payload_with(&self, other: &Layer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_key_index_defaults_to_none() {
        let data = LayerData::new_default(LayerType::ShapeKeyIndex, 3);
        assert_eq!(data, LayerData::Int(vec![-1, -1, -1]));
    }

    #[test]
    fn resize_fills_with_default() {
        let mut data = LayerData::Int(vec![4]);
        data.resize(LayerType::ShapeKeyIndex, 3);
        assert_eq!(data, LayerData::Int(vec![4, -1, -1]));
        data.resize(LayerType::ShapeKeyIndex, 1);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn payload_kind_matches_type() {
        let data = LayerData::new_default(LayerType::Crease, 0);
        assert!(data.matches(LayerType::Float));
        assert!(data.matches(LayerType::BevelWeight));
        assert!(!data.matches(LayerType::Int));
    }

    #[test]
    fn shape_layers_compare_by_uid() {
        let mut a = Layer::new(LayerType::ShapeKey, "Key 1", LayerData::Float3(vec![]));
        let mut b = Layer::new(LayerType::ShapeKey, "Renamed", LayerData::Float3(vec![]));
        a.set_uid(7);
        b.set_uid(7);
        assert!(a.same_slot(&b));
        b.set_uid(8);
        assert!(!a.same_slot(&b));
    }
}
