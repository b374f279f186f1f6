use tracing::{debug, warn};

use crate::attribute::{CopyPolicy, DomainMasks, LayerHandle, LayerType};
use crate::error::{Result, TopologyError};
use crate::flat::{EdgeFlags, FlatMesh, MeshFeatures, PolyFlags, SelectDomain, VertFlags};
use crate::math::{to_array, unit_float_from_u8, Point3};
use crate::topology::{EdgeId, ElemFlags, ElemRef, FaceId, LinkedMesh, VertId};

/// Parameters for building a linked mesh from a flat mesh.
#[derive(Debug, Clone, Copy)]
pub struct BuildParams {
    /// Shape block whose positions seed the vertices, and which becomes the
    /// edited shape on a first build.
    pub active_shape: Option<usize>,
    /// Take vertex positions from the active shape block instead of the mesh.
    pub use_shape_positions: bool,
    /// Add the original-index layer even when the mesh has no shape keys.
    pub add_key_index: bool,
    /// Layers to carry in addition to [`DomainMasks::LINKED`].
    pub extra_mask: DomainMasks,
    /// Recompute face normals after each face is built.
    pub calc_face_normals: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            active_shape: None,
            use_shape_positions: false,
            add_key_index: false,
            extra_mask: DomainMasks::NONE,
            calc_face_normals: true,
        }
    }
}

/// An input element the builder could not convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedElement {
    /// Index in the flat array.
    pub index: usize,
    /// Why it was rejected.
    pub reason: TopologyError,
}

/// Per-element failures collected during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub skipped_edges: Vec<SkippedElement>,
    pub skipped_polygons: Vec<SkippedElement>,
}

impl BuildReport {
    /// Returns `true` if every input element was converted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped_edges.is_empty() && self.skipped_polygons.is_empty()
    }
}

/// Layer handles resolved once the linked layout is final.
struct VertTargets {
    bevel_weight: Option<LayerHandle>,
    key_index: Option<LayerHandle>,
    /// Shape layer and the flat block feeding it.
    shapes: Vec<(LayerHandle, usize)>,
}

/// Builds (or rebuilds onto) a linked mesh from a flat mesh.
pub struct BuildLinked {
    params: BuildParams,
}

impl BuildLinked {
    /// Creates a new `BuildLinked` operation.
    #[must_use]
    pub fn new(params: BuildParams) -> Self {
        Self { params }
    }

    /// Executes the build.
    ///
    /// Malformed edges and polygons are skipped and listed in the returned
    /// report; the rest of the mesh is still built.
    ///
    /// # Errors
    ///
    /// Returns an error only if an attribute layer the builder created has an
    /// unexpected payload kind.
    pub fn execute(&self, flat: &FlatMesh, linked: &mut LinkedMesh) -> Result<BuildReport> {
        let is_new = linked.is_blank();
        let mask = DomainMasks::LINKED.union(self.params.extra_mask);
        let mut report = BuildReport::default();

        if flat.verts.is_empty() {
            if is_new {
                linked.vdata = flat.vdata.copy(mask.vert, CopyPolicy::Reference, 0);
                linked.edata = flat.edata.copy(mask.edge, CopyPolicy::Reference, 0);
                linked.ldata = flat.ldata.copy(mask.loops, CopyPolicy::Reference, 0);
                linked.pdata = flat.pdata.copy(mask.face, CopyPolicy::Reference, 0);
            }
            return Ok(report);
        }

        if is_new {
            linked.vdata = flat.vdata.copy(mask.vert, CopyPolicy::ZeroInit, 0);
            linked.edata = flat.edata.copy(mask.edge, CopyPolicy::ZeroInit, 0);
            linked.ldata = flat.ldata.copy(mask.loops, CopyPolicy::ZeroInit, 0);
            linked.pdata = flat.pdata.copy(mask.face, CopyPolicy::ZeroInit, 0);
        } else {
            linked.vdata.merge_from(&flat.vdata, mask.vert, CopyPolicy::ZeroInit);
            linked.edata.merge_from(&flat.edata, mask.edge, CopyPolicy::ZeroInit);
            linked.ldata.merge_from(&flat.ldata, mask.loops, CopyPolicy::ZeroInit);
            linked.pdata.merge_from(&flat.pdata, mask.face, CopyPolicy::ZeroInit);
        }

        let keyco = self.prepare_shape_layers(flat, linked, is_new);

        let features = if is_new {
            flat.features
        } else {
            flat.features | linked.features()
        };
        linked.apply_features(features);

        let targets = VertTargets {
            bevel_weight: flat
                .features
                .contains(MeshFeatures::VERT_BWEIGHT)
                .then(|| linked.vdata.layer_handle(LayerType::BevelWeight))
                .flatten(),
            key_index: (is_new && (has_shape_keys(flat) || self.params.add_key_index))
                .then(|| linked.vdata.layer_handle(LayerType::ShapeKeyIndex))
                .flatten(),
            shapes: shape_targets(flat, linked),
        };

        let vtable = build_verts(flat, linked, keyco, &targets)?;
        let etable = build_edges(flat, linked, &vtable, &mut report)?;
        let ftable = self.build_faces(flat, linked, &vtable, &etable, &mut report)?;

        if is_new {
            linked.verts.mark_indices_valid();
            linked.edges.mark_indices_valid();
            linked.faces.mark_indices_valid();
            linked.loops.mark_indices_valid();
        }

        restore_select_history(flat, linked, vtable, etable, ftable);

        debug!(
            mesh = %flat.name,
            verts = linked.num_verts(),
            edges = linked.num_edges(),
            faces = linked.num_faces(),
            skipped = report.skipped_edges.len() + report.skipped_polygons.len(),
            "built linked mesh"
        );
        Ok(report)
    }

    /// Adds the shape layers and original-index layer, and picks the
    /// position source for new vertices.
    fn prepare_shape_layers<'f>(
        &self,
        flat: &'f FlatMesh,
        linked: &mut LinkedMesh,
        is_new: bool,
    ) -> Option<&'f [Point3]> {
        let blocks = flat.shape_keys.as_ref().filter(|k| !k.is_empty());

        if is_new
            && (blocks.is_some() || self.params.add_key_index)
            && !linked.vdata.has_layer(LayerType::ShapeKeyIndex)
        {
            linked.vdata.add_layer(LayerType::ShapeKeyIndex, "");
        }

        let keys = blocks?;
        if is_new {
            for block in keys.blocks() {
                if block.data.len() == flat.verts.len() {
                    linked.vdata.add_shape_layer(&block.name, block.uid());
                }
            }
        }

        let index = self.params.active_shape?;
        let active = keys.block(index)?;
        if active.data.len() != flat.verts.len() {
            warn!(
                mesh = %flat.name,
                shape = %active.name,
                "active shape block does not match the vertex count, ignoring it"
            );
            return None;
        }
        if is_new {
            linked.active_shape = Some(index);
        }
        self.params
            .use_shape_positions
            .then_some(active.data.as_slice())
    }

    fn build_faces(
        &self,
        flat: &FlatMesh,
        linked: &mut LinkedMesh,
        vtable: &[Option<VertId>],
        etable: &[Option<EdgeId>],
        report: &mut BuildReport,
    ) -> Result<Vec<Option<FaceId>>> {
        let mut ftable = Vec::with_capacity(flat.polys.len());
        for (i, mp) in flat.polys.iter().enumerate() {
            let face = match face_from_poly(flat, i, linked, vtable, etable) {
                Ok(face) => face,
                Err(reason) => {
                    warn!(mesh = %flat.name, index = i, error = %reason, "bad face, skipping");
                    report.skipped_polygons.push(SkippedElement { index: i, reason });
                    ftable.push(None);
                    continue;
                }
            };

            let data = linked.face_mut(face)?;
            data.flags = ElemFlags::from_poly_flags(mp.flags);
            data.mat_nr = mp.material;
            if mp.flags.contains(PolyFlags::SELECT) {
                linked.select_face(face, true)?;
            }
            if flat.act_face == Some(i) {
                linked.act_face = Some(face);
            }

            let loop_blocks: Vec<usize> =
                linked.face_loops(face)?.map(|(_, l)| l.block()).collect();
            for (k, block) in loop_blocks.into_iter().enumerate() {
                linked.ldata.copy_block_from(&flat.ldata, mp.loop_start + k, block);
            }
            let block = linked.face(face)?.block();
            linked.pdata.copy_block_from(&flat.pdata, i, block);

            if self.params.calc_face_normals {
                linked.update_face_normal(face)?;
            }
            ftable.push(Some(face));
        }
        Ok(ftable)
    }
}

fn has_shape_keys(flat: &FlatMesh) -> bool {
    flat.shape_keys.as_ref().is_some_and(|k| !k.is_empty())
}

/// Pairs each shape block with the linked layer carrying its uid.
fn shape_targets(flat: &FlatMesh, linked: &LinkedMesh) -> Vec<(LayerHandle, usize)> {
    let Some(keys) = flat.shape_keys.as_ref() else {
        return Vec::new();
    };
    keys.blocks()
        .iter()
        .enumerate()
        .filter_map(|(bi, block)| {
            if block.data.len() != flat.verts.len() {
                warn!(
                    mesh = %flat.name,
                    shape = %block.name,
                    "shape block does not match the vertex count, not loading it"
                );
                return None;
            }
            linked
                .vdata
                .layer_by_uid(LayerType::ShapeKey, block.uid())
                .map(|h| (h, bi))
        })
        .collect()
}

fn build_verts(
    flat: &FlatMesh,
    linked: &mut LinkedMesh,
    keyco: Option<&[Point3]>,
    targets: &VertTargets,
) -> Result<Vec<Option<VertId>>> {
    let normals = flat.vertex_normals();
    let blocks = flat.shape_keys.as_ref().map(|k| k.blocks());
    let mut vtable = Vec::with_capacity(flat.verts.len());
    linked.verts.reserve(flat.verts.len());

    for (i, mv) in flat.verts.iter().enumerate() {
        let co = keyco.map_or(mv.position, |k| k[i]);
        let v = linked.add_vertex(co);
        let data = linked.vert_mut(v)?;
        data.flags = ElemFlags::from_vert_flags(mv.flags);
        if let Some(normals) = normals {
            data.no = normals[i];
        }
        let block = data.block();
        if mv.flags.contains(VertFlags::SELECT) {
            linked.select_vert(v, true)?;
        }

        linked.vdata.copy_block_from(&flat.vdata, i, block);
        if let Some(h) = targets.bevel_weight {
            linked.vdata.floats_mut(h)?[block] = unit_float_from_u8(mv.bevel_weight);
        }
        if let Some(h) = targets.key_index {
            linked.vdata.ints_mut(h)?[block] = i32::try_from(i).unwrap_or(i32::MAX);
        }
        if let Some(blocks) = blocks {
            for &(h, bi) in &targets.shapes {
                linked.vdata.float3s_mut(h)?[block] = to_array(&blocks[bi].data[i]);
            }
        }
        vtable.push(Some(v));
    }
    Ok(vtable)
}

fn build_edges(
    flat: &FlatMesh,
    linked: &mut LinkedMesh,
    vtable: &[Option<VertId>],
    report: &mut BuildReport,
) -> Result<Vec<Option<EdgeId>>> {
    let bweight = flat
        .features
        .contains(MeshFeatures::EDGE_BWEIGHT)
        .then(|| linked.edata.layer_handle(LayerType::BevelWeight))
        .flatten();
    let crease = flat
        .features
        .contains(MeshFeatures::EDGE_CREASE)
        .then(|| linked.edata.layer_handle(LayerType::Crease))
        .flatten();

    let mut etable = Vec::with_capacity(flat.edges.len());
    linked.edges.reserve(flat.edges.len());
    for (i, me) in flat.edges.iter().enumerate() {
        let endpoints = lookup(vtable, me.v1, "vertex").and_then(|a| {
            lookup(vtable, me.v2, "vertex").map(|b| (a, b))
        });
        let created = endpoints.and_then(|(a, b)| linked.add_edge(a, b));
        let e = match created {
            Ok(e) => e,
            Err(reason) => {
                warn!(mesh = %flat.name, index = i, error = %reason, "bad edge, skipping");
                report.skipped_edges.push(SkippedElement { index: i, reason });
                etable.push(None);
                continue;
            }
        };

        let data = linked.edge_mut(e)?;
        data.flags = ElemFlags::from_edge_flags(me.flags);
        let block = data.block();
        if me.flags.contains(EdgeFlags::SELECT) {
            linked.select_edge(e, true)?;
        }

        linked.edata.copy_block_from(&flat.edata, i, block);
        if let Some(h) = bweight {
            linked.edata.floats_mut(h)?[block] = unit_float_from_u8(me.bevel_weight);
        }
        if let Some(h) = crease {
            linked.edata.floats_mut(h)?[block] = unit_float_from_u8(me.crease);
        }
        etable.push(Some(e));
    }
    Ok(etable)
}

/// Resolves a flat index through a builder table.
fn lookup<K: Copy>(
    table: &[Option<K>],
    index: usize,
    domain: &'static str,
) -> std::result::Result<K, TopologyError> {
    match table.get(index) {
        Some(Some(id)) => Ok(*id),
        Some(None) => Err(TopologyError::InvalidTopology(format!(
            "{domain} {index} was skipped"
        ))),
        None => Err(TopologyError::IndexOutOfRange {
            domain,
            index,
            len: table.len(),
        }),
    }
}

fn face_from_poly(
    flat: &FlatMesh,
    poly: usize,
    linked: &mut LinkedMesh,
    vtable: &[Option<VertId>],
    etable: &[Option<EdgeId>],
) -> std::result::Result<FaceId, TopologyError> {
    let mp = &flat.polys[poly];
    let loops = flat
        .poly_loops(poly)
        .ok_or(TopologyError::IndexOutOfRange {
            domain: "loop",
            index: mp.loop_start.saturating_add(mp.loop_count),
            len: flat.loops.len(),
        })?;

    let mut verts = Vec::with_capacity(loops.len());
    let mut edges = Vec::with_capacity(loops.len());
    for l in loops {
        verts.push(lookup(vtable, l.vert, "vertex")?);
        edges.push(lookup(etable, l.edge, "edge")?);
    }
    linked.add_face(&verts, &edges)
}

/// Replays the serialized selection history. Each element is recorded at
/// most once; later duplicates and unresolvable records are dropped.
fn restore_select_history(
    flat: &FlatMesh,
    linked: &mut LinkedMesh,
    mut vtable: Vec<Option<VertId>>,
    mut etable: Vec<Option<EdgeId>>,
    mut ftable: Vec<Option<FaceId>>,
) {
    if flat.select_history.is_empty() {
        linked.select_history_clear();
        return;
    }
    for entry in &flat.select_history {
        let elem = match entry.domain {
            SelectDomain::Vertex => take(&mut vtable, entry.index).map(ElemRef::Vert),
            SelectDomain::Edge => take(&mut etable, entry.index).map(ElemRef::Edge),
            SelectDomain::Face => take(&mut ftable, entry.index).map(ElemRef::Face),
        };
        if let Some(elem) = elem {
            linked.select_history_store_notest(elem);
        }
    }
}

/// Takes the element at `index` so a repeated history entry finds nothing.
fn take<T>(table: &mut [Option<T>], index: usize) -> Option<T> {
    table.get_mut(index).and_then(Option::take)
}
