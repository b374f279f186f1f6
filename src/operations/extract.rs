use tracing::debug;

use crate::attribute::{CopyPolicy, DomainMasks, LayerType};
use crate::error::Result;
use crate::flat::{Edge, EdgeFlags, FlatMesh, Loop, Polygon, SelectHistoryEntry, Vertex};
use crate::math::{unit_float_to_u8, Point3};
use crate::topology::{EdgeData, ElemRef, FaceId, LinkedMesh};

use super::remap::MeshDependents;
use super::shape_sync::sync_shape_keys;

/// Face normals closer than this leave the shared edge undrawn.
pub const QUICK_DRAW_THRESHOLD: f32 = 0.9995;

/// Parameters for writing a linked mesh back into a flat mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractParams {
    /// Layers to carry in addition to [`DomainMasks::FLAT`].
    pub extra_mask: DomainMasks,
    /// Rewrite vertex parents and hooks in the dependents passed to
    /// [`ExtractFlat::execute`].
    pub recompute_parent_remap: bool,
    /// Renumber the original-index layer to the new vertex order, for a
    /// linked mesh that keeps being edited.
    pub refresh_shape_index_layer: bool,
}

/// Writes a linked mesh into a flat mesh, replacing its contents.
pub struct ExtractFlat {
    params: ExtractParams,
}

impl ExtractFlat {
    /// Creates a new `ExtractFlat` operation.
    #[must_use]
    pub fn new(params: ExtractParams) -> Self {
        Self { params }
    }

    /// Executes the extraction.
    ///
    /// Element order follows the linked pools. Shape blocks in `dest` are
    /// reconciled with the linked shape layers. Linked face normals are
    /// recomputed for the draw flags, while the flat normals are left stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the linked mesh references a missing element or a
    /// layer has an unexpected payload kind.
    pub fn execute(
        &self,
        linked: &mut LinkedMesh,
        dest: &mut FlatMesh,
        deps: Option<&mut MeshDependents>,
    ) -> Result<()> {
        let ototvert = dest.verts.len();
        let old_verts = std::mem::take(&mut dest.verts);
        let keep_old =
            dest.shape_keys.is_some() && linked.vdata.has_layer(LayerType::ShapeKeyIndex);
        let oldverts: Option<Vec<Point3>> =
            keep_old.then(|| old_verts.into_iter().map(|v| v.position).collect());

        let mask = DomainMasks::FLAT.union(self.params.extra_mask);
        write_arrays(linked, dest, mask)?;

        let faces: Vec<FaceId> = linked.faces().keys().collect();
        for face in faces {
            linked.update_face_normal(face)?;
        }
        for (i, (_, edge)) in linked.edges().iter().enumerate() {
            let draw = quick_draw(linked, edge);
            dest.edges[i].flags.set(EdgeFlags::DRAW, draw);
        }

        dest.select_history = linked
            .select_history()
            .iter()
            .filter_map(|&elem| history_entry(linked, elem))
            .collect();

        if self.params.recompute_parent_remap {
            if let Some(deps) = deps {
                deps.remap(linked, ototvert);
            }
        }

        sync_shape_keys(linked, dest, oldverts.as_deref())?;

        if self.params.refresh_shape_index_layer {
            refresh_original_indices(linked)?;
        }

        dest.deformed_only = false;
        debug!(
            mesh = %dest.name,
            verts = dest.verts.len(),
            edges = dest.edges.len(),
            polys = dest.polys.len(),
            "extracted flat mesh"
        );
        Ok(())
    }
}

/// Replaces the arrays and attribute stores of `dest` with the contents of
/// `linked`, in pool order. Edge draw flags are copied as stored.
pub(crate) fn write_arrays(
    linked: &mut LinkedMesh,
    dest: &mut FlatMesh,
    mask: DomainMasks,
) -> Result<()> {
    linked.ensure_indices();

    let (nverts, nedges) = (linked.num_verts(), linked.num_edges());
    let (nloops, nfaces) = (linked.num_loops(), linked.num_faces());
    dest.vdata = linked.vdata.copy(mask.vert, CopyPolicy::ZeroInit, nverts);
    dest.edata = linked.edata.copy(mask.edge, CopyPolicy::ZeroInit, nedges);
    dest.ldata = linked.ldata.copy(mask.loops, CopyPolicy::ZeroInit, nloops);
    dest.pdata = linked.pdata.copy(mask.face, CopyPolicy::ZeroInit, nfaces);

    let vert_bweight = linked.vdata.layer_handle(LayerType::BevelWeight);
    dest.verts.clear();
    dest.verts.reserve(nverts);
    for (i, (_, v)) in linked.verts().iter().enumerate() {
        let bevel_weight = match vert_bweight {
            Some(h) => unit_float_to_u8(linked.vdata.floats(h)?[v.block()]),
            None => 0,
        };
        dest.verts.push(Vertex {
            position: v.co,
            flags: v.flags.to_vert_flags(),
            bevel_weight,
        });
        dest.vdata.copy_block_from(&linked.vdata, v.block(), i);
    }

    let edge_bweight = linked.edata.layer_handle(LayerType::BevelWeight);
    let edge_crease = linked.edata.layer_handle(LayerType::Crease);
    dest.edges.clear();
    dest.edges.reserve(nedges);
    for (i, (_, e)) in linked.edges().iter().enumerate() {
        let weight = |h| -> Result<u8> {
            Ok(unit_float_to_u8(linked.edata.floats(h)?[e.block()]))
        };
        dest.edges.push(Edge {
            v1: linked.vert(e.v1)?.index,
            v2: linked.vert(e.v2)?.index,
            flags: e.flags.to_edge_flags(),
            bevel_weight: edge_bweight.map(weight).transpose()?.unwrap_or(0),
            crease: edge_crease.map(weight).transpose()?.unwrap_or(0),
        });
        dest.edata.copy_block_from(&linked.edata, e.block(), i);
    }

    dest.loops.clear();
    dest.loops.reserve(nloops);
    dest.polys.clear();
    dest.polys.reserve(nfaces);
    dest.act_face = None;
    for (i, (f, face)) in linked.faces().iter().enumerate() {
        dest.polys.push(Polygon {
            loop_start: dest.loops.len(),
            loop_count: face.len(),
            flags: face.flags.to_poly_flags(),
            material: face.mat_nr,
        });
        for (_, l) in linked.face_loops(f)? {
            dest.ldata
                .copy_block_from(&linked.ldata, l.block(), dest.loops.len());
            dest.loops.push(Loop {
                vert: linked.vert(l.vert())?.index,
                edge: linked.edge(l.edge())?.index,
            });
        }
        if linked.act_face == Some(f) {
            dest.act_face = Some(i);
        }
        dest.pdata.copy_block_from(&linked.pdata, face.block(), i);
    }

    dest.features = linked.features();
    dest.tag_normals_dirty();
    Ok(())
}

/// Cheap draw hint: an edge between exactly two nearly coplanar faces is
/// not drawn. Only an approximation of the real crease angle.
fn quick_draw(linked: &LinkedMesh, edge: &EdgeData) -> bool {
    let [l0, l1] = edge.radial() else {
        return true;
    };
    let normal = |l| {
        linked
            .loop_(l)
            .and_then(|data| linked.face(data.face()))
            .map(|f| f.no)
    };
    match (normal(*l0), normal(*l1)) {
        (Ok(n0), Ok(n1)) => n0.dot(&n1) <= QUICK_DRAW_THRESHOLD,
        _ => true,
    }
}

fn history_entry(linked: &LinkedMesh, elem: ElemRef) -> Option<SelectHistoryEntry> {
    let index = match elem {
        ElemRef::Vert(v) => linked.vert_index(v)?,
        ElemRef::Edge(e) => linked.edge_index(e)?,
        ElemRef::Face(f) => linked.face_index(f)?,
    };
    Some(SelectHistoryEntry::new(elem.domain(), index))
}

fn refresh_original_indices(linked: &mut LinkedMesh) -> Result<()> {
    let Some(h) = linked.vdata.layer_handle(LayerType::ShapeKeyIndex) else {
        return Ok(());
    };
    let rows: Vec<usize> = linked.verts().iter().map(|(_, v)| v.block()).collect();
    let indices = linked.vdata.ints_mut(h)?;
    for (i, row) in rows.into_iter().enumerate() {
        indices[row] = i32::try_from(i).unwrap_or(i32::MAX);
    }
    Ok(())
}
