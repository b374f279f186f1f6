//! Geometry node request boundary.
//!
//! Nodes read named inputs from an [`ExecParams`] request and write named
//! outputs back. The evaluation engine behind the request is not modelled.

mod object_geometry;
mod set_attribute;

pub use object_geometry::{ChildEvaluator, ObjectGeometryNode};
pub use set_attribute::SetDomainAttributeNode;

use crate::flat::FlatMesh;

/// Identifies an object in the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// Severity of a message attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeWarning {
    Error,
    Warning,
    Info,
}

/// A value flowing through a node socket.
#[derive(Debug, Clone)]
pub enum NodeValue {
    Geometry(FlatMesh),
    Object(ObjectId),
    Int(i32),
    Bool(bool),
    /// Element indices in any order.
    Selection(Vec<usize>),
}

/// Extraction of a typed value from a socket.
pub trait FromNodeValue: Sized {
    fn from_value(value: &NodeValue) -> Option<Self>;
}

impl FromNodeValue for FlatMesh {
    fn from_value(value: &NodeValue) -> Option<Self> {
        match value {
            NodeValue::Geometry(mesh) => Some(mesh.clone()),
            _ => None,
        }
    }
}

impl FromNodeValue for ObjectId {
    fn from_value(value: &NodeValue) -> Option<Self> {
        match value {
            NodeValue::Object(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromNodeValue for i32 {
    fn from_value(value: &NodeValue) -> Option<Self> {
        match value {
            NodeValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromNodeValue for bool {
    fn from_value(value: &NodeValue) -> Option<Self> {
        match value {
            NodeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromNodeValue for Vec<usize> {
    fn from_value(value: &NodeValue) -> Option<Self> {
        match value {
            NodeValue::Selection(indices) => Some(indices.clone()),
            _ => None,
        }
    }
}

/// One node execution request.
pub trait ExecParams {
    /// Raw value of input `name`, if connected or set.
    fn input(&self, name: &str) -> Option<&NodeValue>;

    /// Typed value of input `name`.
    fn get_input<T: FromNodeValue>(&self, name: &str) -> Option<T> {
        self.input(name).and_then(T::from_value)
    }

    fn output_is_required(&self, name: &str) -> bool;

    fn error_message_add(&mut self, severity: NodeWarning, message: &str);

    fn set_output(&mut self, name: &str, value: NodeValue);

    /// Fills every output not yet set with its default value.
    fn set_default_remaining_outputs(&mut self);

    /// The object whose modifier is being evaluated.
    fn self_object(&self) -> ObjectId;
}
