use thiserror::Error;

use crate::attribute::LayerType;

/// Top-level error type for mesh conversion.
#[derive(Debug, Error)]
pub enum EditMeshError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors related to linked mesh topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("index {index} is out of range for {domain} (len {len})")]
    IndexOutOfRange {
        domain: &'static str,
        index: usize,
        len: usize,
    },
}

/// Errors related to attribute layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("layer is {found:?}, expected {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: LayerType,
    },

    #[error("data length {len} does not match store size {rows}")]
    LengthMismatch { len: usize, rows: usize },
}

/// Errors for conversion requests that cannot be honored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("destination mesh must be empty, it has {verts} vertices")]
    DestinationNotEmpty { verts: usize },

    #[error("shape key layers cannot be requested for evaluation output")]
    ShapeKeyMaskRequested,
}

/// Convenience type alias for results using [`EditMeshError`].
pub type Result<T> = std::result::Result<T, EditMeshError>;
