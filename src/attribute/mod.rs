mod layer;
mod store;

pub use layer::{Layer, LayerData};
pub use store::{AttributeStore, LayerHandle};

use bitflags::bitflags;

/// Element kind an attribute layer or selection record applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Vertex,
    Edge,
    Loop,
    Face,
}

/// Type tag of an attribute layer.
///
/// Several tags share a storage kind (`BevelWeight` and `Crease` are floats,
/// `ShapeKey` is a 3D vector) but are distinct layers with their own masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Generic named float attribute.
    Float,
    /// Generic named integer attribute.
    Int,
    /// Generic named 2D vector attribute (UV maps).
    Float2,
    /// Generic named 3D vector attribute.
    Float3,
    /// RGBA color attribute.
    Color,
    /// Boolean attribute.
    Bool,
    /// Bevel weight, stored as a unit float.
    BevelWeight,
    /// Edge crease, stored as a unit float.
    Crease,
    /// Alternate vertex positions bound to a shape block by uid.
    ShapeKey,
    /// Original flat vertex index, `-1` for vertices created while editing.
    ShapeKeyIndex,
}

/// Original index of an element with no flat counterpart.
pub const ORIGINDEX_NONE: i32 = -1;

impl LayerType {
    /// The mask bit selecting this type.
    #[must_use]
    pub const fn mask(self) -> LayerMask {
        match self {
            LayerType::Float => LayerMask::FLOAT,
            LayerType::Int => LayerMask::INT,
            LayerType::Float2 => LayerMask::FLOAT2,
            LayerType::Float3 => LayerMask::FLOAT3,
            LayerType::Color => LayerMask::COLOR,
            LayerType::Bool => LayerMask::BOOL,
            LayerType::BevelWeight => LayerMask::BEVEL_WEIGHT,
            LayerType::Crease => LayerMask::CREASE,
            LayerType::ShapeKey => LayerMask::SHAPE_KEY,
            LayerType::ShapeKeyIndex => LayerMask::SHAPE_KEY_INDEX,
        }
    }
}

bitflags! {
    /// Selects a set of layer types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerMask: u32 {
        const FLOAT = 1 << 0;
        const INT = 1 << 1;
        const FLOAT2 = 1 << 2;
        const FLOAT3 = 1 << 3;
        const COLOR = 1 << 4;
        const BOOL = 1 << 5;
        const BEVEL_WEIGHT = 1 << 6;
        const CREASE = 1 << 7;
        const SHAPE_KEY = 1 << 8;
        const SHAPE_KEY_INDEX = 1 << 9;

        /// User-facing generic attributes.
        const GENERIC = Self::FLOAT.bits()
            | Self::INT.bits()
            | Self::FLOAT2.bits()
            | Self::FLOAT3.bits()
            | Self::COLOR.bits()
            | Self::BOOL.bits();
    }
}

impl LayerMask {
    /// Returns `true` if `ty` is selected by this mask.
    #[must_use]
    pub fn selects(self, ty: LayerType) -> bool {
        self.contains(ty.mask())
    }
}

/// How layer payloads are carried into a destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    /// Share the source payload; it is copied on first write.
    Reference,
    /// Fill with the type's default value.
    ZeroInit,
    /// Deep-copy the source payload.
    Duplicate,
}

/// One [`LayerMask`] per element domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomainMasks {
    pub vert: LayerMask,
    pub edge: LayerMask,
    pub loops: LayerMask,
    pub face: LayerMask,
}

impl DomainMasks {
    /// Selects nothing.
    pub const NONE: DomainMasks = DomainMasks {
        vert: LayerMask::empty(),
        edge: LayerMask::empty(),
        loops: LayerMask::empty(),
        face: LayerMask::empty(),
    };

    /// Layers the linked representation keeps while editing.
    pub const LINKED: DomainMasks = DomainMasks {
        vert: LayerMask::GENERIC
            .union(LayerMask::BEVEL_WEIGHT)
            .union(LayerMask::SHAPE_KEY)
            .union(LayerMask::SHAPE_KEY_INDEX),
        edge: LayerMask::GENERIC
            .union(LayerMask::BEVEL_WEIGHT)
            .union(LayerMask::CREASE),
        loops: LayerMask::GENERIC,
        face: LayerMask::GENERIC,
    };

    /// Layers persisted on a flat mesh. Weights, creases and shapes live in
    /// element fields and the shape key set instead.
    pub const FLAT: DomainMasks = DomainMasks {
        vert: LayerMask::GENERIC,
        edge: LayerMask::GENERIC,
        loops: LayerMask::GENERIC,
        face: LayerMask::GENERIC,
    };

    /// Layers carried into meshes built for evaluation.
    pub const EVAL: DomainMasks = DomainMasks {
        vert: LayerMask::GENERIC.union(LayerMask::SHAPE_KEY_INDEX),
        edge: LayerMask::GENERIC,
        loops: LayerMask::GENERIC,
        face: LayerMask::GENERIC,
    };

    /// Per-domain union of two mask sets.
    #[must_use]
    pub const fn union(self, other: DomainMasks) -> DomainMasks {
        DomainMasks {
            vert: self.vert.union(other.vert),
            edge: self.edge.union(other.edge),
            loops: self.loops.union(other.loops),
            face: self.face.union(other.face),
        }
    }
}
