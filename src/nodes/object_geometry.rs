use tracing::debug;

use super::{ExecParams, NodeValue, NodeWarning, ObjectId};
use crate::attribute::DomainMasks;
use crate::operations::to_flat_for_eval;
use crate::topology::LinkedMesh;

/// Evaluates the geometry of another object.
pub trait ChildEvaluator {
    /// Returns the evaluated mesh of `object`, or `None` if evaluation failed.
    fn evaluate_child(&mut self, object: ObjectId, seed: i32) -> Option<LinkedMesh>;
}

/// Retrieves the evaluated geometry of an object as a flat mesh.
///
/// Inputs are `Object` and `Seed`. The single output is `Geometry`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectGeometryNode {
    extra_mask: DomainMasks,
}

impl ObjectGeometryNode {
    #[must_use]
    pub fn new(extra_mask: DomainMasks) -> Self {
        Self { extra_mask }
    }

    pub fn execute<P: ExecParams, C: ChildEvaluator>(&self, params: &mut P, children: &mut C) {
        let Some(object) = params.get_input::<ObjectId>("Object") else {
            params.set_default_remaining_outputs();
            return;
        };
        if !params.output_is_required("Geometry") {
            return;
        }
        if object == params.self_object() {
            params.error_message_add(
                NodeWarning::Error,
                "Geometry cannot be retrieved from the modifier object",
            );
            params.set_default_remaining_outputs();
            return;
        }

        let seed = params.get_input::<i32>("Seed").unwrap_or(0);
        let Some(mut linked) = children.evaluate_child(object, seed) else {
            params.error_message_add(NodeWarning::Error, "Child geometry failed to evaluate");
            params.set_default_remaining_outputs();
            return;
        };

        match to_flat_for_eval(&mut linked, self.extra_mask) {
            Ok(mesh) => {
                debug!(object = object.0, verts = mesh.verts.len(), "child geometry evaluated");
                params.set_output("Geometry", NodeValue::Geometry(mesh));
            }
            Err(err) => {
                params.error_message_add(NodeWarning::Error, &err.to_string());
                params.set_default_remaining_outputs();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attribute::LayerMask;
    use crate::math::Point3;
    use crate::nodes::testing::TestParams;

    /// Counts requests and hands out a single triangle.
    #[derive(Default)]
    struct Children {
        calls: usize,
        fail: bool,
    }

    impl ChildEvaluator for Children {
        fn evaluate_child(&mut self, _object: ObjectId, _seed: i32) -> Option<LinkedMesh> {
            self.calls += 1;
            if self.fail {
                return None;
            }
            let mut mesh = LinkedMesh::new();
            let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
            let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
            let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
            mesh.add_face_from_verts(&[a, b, c]).unwrap();
            Some(mesh)
        }
    }

    fn params() -> TestParams {
        let mut params = TestParams::with_outputs(&["Geometry"]);
        params.self_object = Some(ObjectId(1));
        params
    }

    #[test]
    fn missing_object_sets_defaults() {
        let mut params = params();
        let mut children = Children::default();
        ObjectGeometryNode::default().execute(&mut params, &mut children);
        assert_eq!(children.calls, 0);
        assert!(params.messages.is_empty());
        assert!(params.geometry("Geometry").unwrap().is_empty());
    }

    #[test]
    fn self_object_is_an_error() {
        let mut params = params().with_input("Object", NodeValue::Object(ObjectId(1)));
        let mut children = Children::default();
        ObjectGeometryNode::default().execute(&mut params, &mut children);
        assert_eq!(children.calls, 0);
        assert_eq!(params.messages.len(), 1);
        assert_eq!(params.messages[0].0, NodeWarning::Error);
        assert!(params.geometry("Geometry").unwrap().is_empty());
    }

    #[test]
    fn failed_child_reports_and_defaults() {
        let mut params = params().with_input("Object", NodeValue::Object(ObjectId(2)));
        let mut children = Children {
            fail: true,
            ..Children::default()
        };
        ObjectGeometryNode::default().execute(&mut params, &mut children);
        assert_eq!(children.calls, 1);
        assert_eq!(
            params.messages,
            vec![(NodeWarning::Error, "Child geometry failed to evaluate".to_string())]
        );
        assert!(params.geometry("Geometry").unwrap().is_empty());
    }

    #[test]
    fn child_geometry_is_extracted() {
        let mut params = params()
            .with_input("Object", NodeValue::Object(ObjectId(2)))
            .with_input("Seed", NodeValue::Int(7));
        let mut children = Children::default();
        ObjectGeometryNode::default().execute(&mut params, &mut children);
        let mesh = params.geometry("Geometry").unwrap();
        assert_eq!(mesh.verts.len(), 3);
        assert_eq!(mesh.polys.len(), 1);
        assert!(mesh.deformed_only);
        assert!(params.messages.is_empty());
    }

    #[test]
    fn shape_mask_request_is_reported() {
        let mut params = params().with_input("Object", NodeValue::Object(ObjectId(2)));
        let mask = DomainMasks {
            vert: LayerMask::SHAPE_KEY,
            ..DomainMasks::NONE
        };
        ObjectGeometryNode::new(mask).execute(&mut params, &mut Children::default());
        assert_eq!(params.messages.len(), 1);
        assert!(params.geometry("Geometry").unwrap().is_empty());
    }
}
