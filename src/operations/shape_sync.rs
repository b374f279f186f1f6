use tracing::debug;

use crate::attribute::{LayerType, ORIGINDEX_NONE};
use crate::error::Result;
use crate::flat::FlatMesh;
use crate::math::{to_array, Point3, Vector3};
use crate::topology::LinkedMesh;

/// Writes the linked shape layers back into the key set of `dest`.
///
/// `dest.verts` must already hold the extracted vertices. `oldverts` is the
/// previous vertex array, kept only while the linked mesh tracks original
/// indices.
///
/// Shape layers without a block get one. Edits to the active shape are
/// pushed as offsets onto the blocks directly relative to it, and those
/// blocks' layers are updated too so a later pass does not add the same
/// offset again.
pub(crate) fn sync_shape_keys(
    linked: &mut LinkedMesh,
    dest: &mut FlatMesh,
    oldverts: Option<&[Point3]>,
) -> Result<()> {
    let Some(keys) = dest.shape_keys.as_mut() else {
        return Ok(());
    };

    for layer in linked.vdata.layers().filter(|l| l.ty() == LayerType::ShapeKey) {
        if keys.find_by_uid(layer.uid()).is_none() {
            debug!(shape = layer.name(), uid = layer.uid(), "adding block for shape layer");
            keys.add_block_with_uid(layer.name(), layer.uid());
        }
    }

    let verts: Vec<(Point3, usize)> = linked
        .verts()
        .iter()
        .map(|(_, v)| (v.co, v.block()))
        .collect();
    let key_index = linked.vdata.layer_handle(LayerType::ShapeKeyIndex);
    let origins: Option<Vec<Option<usize>>> = match key_index {
        Some(h) => {
            let indices = linked.vdata.ints(h)?;
            Some(
                verts
                    .iter()
                    .map(|&(_, block)| original(indices[block]))
                    .collect(),
            )
        }
        None => None,
    };
    let origin = |i: usize| origins.as_ref().and_then(|o| o[i]);

    let act = linked.active_shape.filter(|&i| i < keys.len());

    let mut ofs: Option<Vec<Vector3>> = None;
    if let (Some(act), Some(_), Some(_)) = (act, oldverts, &origins) {
        if keys.relative && keys.is_basis(act) {
            let old = &keys.blocks()[act].data;
            let mut offsets = Vec::with_capacity(verts.len());
            for (i, &(co, _)) in verts.iter().enumerate() {
                match origin(i).and_then(|keyi| old.get(keyi)) {
                    Some(prev) => offsets.push(co - *prev),
                    None => {
                        debug!("new vertices present, not propagating basis offsets");
                        offsets.clear();
                        break;
                    }
                }
            }
            if offsets.len() == verts.len() {
                ofs = Some(offsets);
            }
        }
    }

    let reference = keys.reference_index();
    for bi in 0..keys.len() {
        let block = &keys.blocks()[bi];
        let layer = linked.vdata.layer_by_uid(LayerType::ShapeKey, block.uid());
        let dependent = act.is_some() && Some(bi) != act && block.relative_to == act;
        let offsets = ofs.as_deref().filter(|_| dependent && layer.is_some());
        let old = std::mem::take(&mut keys.blocks_mut()[bi].data);

        let mut new = Vec::with_capacity(verts.len());
        for (i, &(co, row)) in verts.iter().enumerate() {
            let mut fp = if Some(bi) == act {
                if bi != reference {
                    if let (Some(prev), Some(keyi)) = (oldverts, origin(i)) {
                        if keyi < old.len() {
                            if let Some(prev) = prev.get(keyi) {
                                dest.verts[i].position = *prev;
                            }
                        }
                    }
                }
                co
            } else if let Some(h) = layer {
                Point3::from(linked.vdata.float3s(h)?[row])
            } else if let Some(prev) = origin(i).and_then(|keyi| old.get(keyi)) {
                *prev
            } else {
                dest.verts[i].position
            };

            if let (Some(offsets), Some(h)) = (offsets, layer) {
                fp += offsets[i];
                linked.vdata.float3s_mut(h)?[row] = to_array(&fp);
            }
            new.push(fp);
        }
        keys.blocks_mut()[bi].data = new;
    }
    Ok(())
}

fn original(keyi: i32) -> Option<usize> {
    if keyi == ORIGINDEX_NONE {
        None
    } else {
        usize::try_from(keyi).ok()
    }
}
