use tracing::debug;

use crate::attribute::{CopyPolicy, DomainMasks, LayerMask};
use crate::error::{ConversionError, Result};
use crate::flat::{EdgeFlags, FlatMesh};
use crate::topology::LinkedMesh;

use super::extract::write_arrays;

/// Writes a linked mesh into an empty flat mesh for evaluation.
///
/// Only arrays and attribute layers are written: no selection history, no
/// dependent remapping and no shape keys. Shape layers are never carried. An
/// edge is drawn if it already was or if it bounds a single face. The result
/// is marked [`FlatMesh::deformed_only`] and must not replace an editable
/// document.
///
/// # Errors
///
/// Returns [`ConversionError::DestinationNotEmpty`] if `dest` has elements,
/// or [`ConversionError::ShapeKeyMaskRequested`] if `extra_mask` asks for
/// shape layers on vertices.
pub fn extract_for_eval(
    linked: &mut LinkedMesh,
    dest: &mut FlatMesh,
    extra_mask: DomainMasks,
) -> Result<()> {
    if !dest.is_empty() {
        return Err(ConversionError::DestinationNotEmpty {
            verts: dest.verts.len(),
        }
        .into());
    }
    if extra_mask.vert.contains(LayerMask::SHAPE_KEY) {
        return Err(ConversionError::ShapeKeyMaskRequested.into());
    }

    let mut mask = DomainMasks::EVAL.union(extra_mask);
    mask.vert.remove(LayerMask::SHAPE_KEY);

    let layout = [
        std::mem::take(&mut dest.vdata),
        std::mem::take(&mut dest.edata),
        std::mem::take(&mut dest.ldata),
        std::mem::take(&mut dest.pdata),
    ];
    write_arrays(linked, dest, mask)?;
    let [vdata, edata, ldata, pdata] = layout;
    let no_shapes = LayerMask::all().difference(LayerMask::SHAPE_KEY);
    dest.vdata.merge_from(&vdata, no_shapes, CopyPolicy::ZeroInit);
    dest.edata.merge_from(&edata, LayerMask::all(), CopyPolicy::ZeroInit);
    dest.ldata.merge_from(&ldata, LayerMask::all(), CopyPolicy::ZeroInit);
    dest.pdata.merge_from(&pdata, LayerMask::all(), CopyPolicy::ZeroInit);

    for (i, (_, edge)) in linked.edges().iter().enumerate() {
        if edge.radial().len() == 1 {
            dest.edges[i].flags.insert(EdgeFlags::DRAW);
        }
    }

    dest.act_face = None;
    dest.deformed_only = true;
    debug!(
        mesh = %dest.name,
        verts = dest.verts.len(),
        polys = dest.polys.len(),
        "extracted mesh for evaluation"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attribute::LayerType;
    use crate::error::EditMeshError;
    use crate::flat::ShapeKeySet;
    use crate::math::Point3;
    use crate::operations::build::{BuildLinked, BuildParams};

    fn tri_with_shapes() -> LinkedMesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut flat = FlatMesh::from_polygons("tri", &positions, &[&[0, 1, 2]]).unwrap();
        flat.edges[0].flags = EdgeFlags::empty();
        let mut keys = ShapeKeySet::new();
        keys.add_block("Basis", None, positions.to_vec());
        keys.add_block("Key 1", Some(0), positions.to_vec());
        flat.shape_keys = Some(keys);
        let mut linked = LinkedMesh::new();
        BuildLinked::new(BuildParams::default())
            .execute(&flat, &mut linked)
            .unwrap();
        linked
    }

    #[test]
    fn shape_layers_are_never_carried() {
        let mut linked = tri_with_shapes();
        assert_eq!(linked.vdata.count_layers(LayerType::ShapeKey), 2);
        let mut dest = FlatMesh::new("eval");
        extract_for_eval(&mut linked, &mut dest, DomainMasks::NONE).unwrap();
        assert_eq!(dest.vdata.count_layers(LayerType::ShapeKey), 0);
        assert!(dest.vdata.has_layer(LayerType::ShapeKeyIndex));
        assert!(dest.shape_keys.is_none());
        assert!(dest.deformed_only);
        assert_eq!(dest.verts.len(), 3);
    }

    #[test]
    fn boundary_edges_are_drawn() {
        let mut linked = tri_with_shapes();
        let mut dest = FlatMesh::new("eval");
        extract_for_eval(&mut linked, &mut dest, DomainMasks::NONE).unwrap();
        assert!(dest.edges.iter().all(|e| e.flags.contains(EdgeFlags::DRAW)));
    }

    #[test]
    fn requires_empty_destination() {
        let mut linked = tri_with_shapes();
        let mut dest = FlatMesh::new("eval");
        extract_for_eval(&mut linked, &mut dest, DomainMasks::NONE).unwrap();
        let err = extract_for_eval(&mut linked, &mut dest, DomainMasks::NONE).unwrap_err();
        assert!(matches!(
            err,
            EditMeshError::Conversion(ConversionError::DestinationNotEmpty { verts: 3 })
        ));
    }

    #[test]
    fn rejects_shape_key_mask() {
        let mut linked = tri_with_shapes();
        let mut dest = FlatMesh::new("eval");
        let extra = DomainMasks {
            vert: LayerMask::SHAPE_KEY,
            ..DomainMasks::NONE
        };
        let err = extract_for_eval(&mut linked, &mut dest, extra).unwrap_err();
        assert!(matches!(
            err,
            EditMeshError::Conversion(ConversionError::ShapeKeyMaskRequested)
        ));
        assert!(dest.is_empty());
    }
}
