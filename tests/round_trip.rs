#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use editmesh::attribute::{DomainMasks, LayerData, LayerType};
use editmesh::flat::{
    EdgeFlags, MeshFeatures, SelectDomain, SelectHistoryEntry, ShapeKeySet, VertFlags,
};
use editmesh::math::{Point3, Vector3};
use editmesh::operations::{
    to_flat, to_flat_for_eval, to_linked, BuildParams, EditSession, ExtractParams, HookIndices,
    MeshDependents, VertexParent,
};
use editmesh::topology::VertId;
use editmesh::{FlatMesh, IndexSet, LinkedMesh};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn p(x: f32, y: f32, z: f32) -> Point3 {
    Point3::new(x, y, z)
}

fn tetrahedron() -> FlatMesh {
    let positions = [
        p(0.0, 0.0, 0.0),
        p(1.0, 0.0, 0.0),
        p(0.0, 1.0, 0.0),
        p(0.0, 0.0, 1.0),
    ];
    FlatMesh::from_polygons(
        "tetra",
        &positions,
        &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]],
    )
    .unwrap()
}

/// Two coplanar triangles sharing the edge 0-2.
fn pair() -> FlatMesh {
    let positions = [
        p(0.0, 0.0, 0.0),
        p(1.0, 0.0, 0.0),
        p(1.0, 1.0, 0.0),
        p(0.0, 1.0, 0.0),
    ];
    FlatMesh::from_polygons("pair", &positions, &[&[0, 1, 2], &[0, 2, 3]]).unwrap()
}

/// A basis and one key lifted by one unit, relative to the basis.
fn with_lift_key(mut flat: FlatMesh) -> FlatMesh {
    let basis: Vec<Point3> = flat.verts.iter().map(|v| v.position).collect();
    let lifted = basis.iter().map(|q| *q + Vector3::z()).collect();
    let mut keys = ShapeKeySet::new();
    keys.add_block("Basis", None, basis);
    keys.add_block("Lift", Some(0), lifted);
    flat.shape_keys = Some(keys);
    flat
}

fn key_data(flat: &FlatMesh, block: usize) -> &[Point3] {
    &flat.shape_keys.as_ref().unwrap().blocks()[block].data
}

fn nth_vert(linked: &LinkedMesh, n: usize) -> VertId {
    linked.verts().keys().nth(n).unwrap()
}

fn edge_between(flat: &FlatMesh, a: usize, b: usize) -> EdgeFlags {
    flat.edges
        .iter()
        .find(|e| (e.v1, e.v2) == (a, b) || (e.v1, e.v2) == (b, a))
        .unwrap()
        .flags
}

// ── round trip ──

#[test]
fn tetrahedron_round_trip_is_identity() {
    init_tracing();
    let mut flat = tetrahedron();
    let uvs: Vec<[f32; 2]> = std::iter::successors(Some(0.0_f32), |u| Some(u + 0.25))
        .take(flat.loops.len())
        .map(|u| [u, 0.5])
        .collect();
    flat.ldata
        .add_layer_with_data(LayerType::Float2, "UVMap", LayerData::Float2(uvs.clone()))
        .unwrap();

    let (mut linked, report) = to_linked(&flat, BuildParams::default()).unwrap();
    assert!(report.is_clean());
    linked.validate().unwrap();

    let mut out = FlatMesh::new("tetra");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();

    assert_eq!(out.verts, flat.verts);
    assert_eq!(out.edges, flat.edges);
    assert_eq!(out.loops, flat.loops);
    assert_eq!(out.polys, flat.polys);
    assert!(out.edges.iter().all(|e| e.flags.contains(EdgeFlags::DRAW)));

    let h = out.ldata.layer_named(LayerType::Float2, "UVMap").unwrap();
    assert_eq!(out.ldata.float2s(h).unwrap(), uvs.as_slice());
}

#[test]
fn weights_and_creases_round_trip() {
    init_tracing();
    let mut flat = pair();
    flat.features = MeshFeatures::VERT_BWEIGHT | MeshFeatures::EDGE_CREASE;
    flat.verts[1].bevel_weight = 128;
    flat.edges[3].crease = 255;

    let (mut linked, _) = to_linked(&flat, BuildParams::default()).unwrap();
    let mut out = FlatMesh::new("pair");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();

    assert_eq!(out.features, flat.features);
    assert_eq!(out.verts[1].bevel_weight, 128);
    assert_eq!(out.edges[3].crease, 255);
    assert!(out.edges.iter().all(|e| e.bevel_weight == 0));
}

#[test]
fn hidden_vertex_drops_its_selection() {
    init_tracing();
    let mut flat = pair();
    flat.verts[1].flags = VertFlags::SELECT | VertFlags::HIDDEN;
    flat.verts[2].flags = VertFlags::SELECT;

    let (mut linked, _) = to_linked(&flat, BuildParams::default()).unwrap();
    let mut out = FlatMesh::new("pair");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();

    assert_eq!(out.verts[1].flags, VertFlags::HIDDEN);
    assert_eq!(out.verts[2].flags, VertFlags::SELECT);
}

// ── edge drawing ──

#[test]
fn folding_a_flat_pair_draws_the_shared_edge() {
    init_tracing();
    let mut flat = pair();
    let (mut linked, _) = to_linked(&flat, BuildParams::default()).unwrap();
    let mut out = FlatMesh::new("pair");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();
    assert!(!edge_between(&out, 0, 2).contains(EdgeFlags::DRAW));

    let mut session = EditSession::begin(&flat, None).unwrap();
    let v3 = nth_vert(session.linked(), 3);
    session.linked_mut().vert_mut(v3).unwrap().co.z = 1.0;
    session.finish(&mut flat, None).unwrap();

    assert!(edge_between(&flat, 0, 2).contains(EdgeFlags::DRAW));
    assert!(flat.edges.iter().all(|e| e.flags.contains(EdgeFlags::DRAW)));
}

#[test]
fn flattening_a_fold_hides_the_shared_edge() {
    init_tracing();
    let mut flat = pair();
    flat.verts[3].position.z = 1.0;
    let mut session = EditSession::begin(&flat, None).unwrap();
    let v3 = nth_vert(session.linked(), 3);
    session.linked_mut().vert_mut(v3).unwrap().co.z = 0.0;
    session.finish(&mut flat, None).unwrap();

    assert!(!edge_between(&flat, 0, 2).contains(EdgeFlags::DRAW));
}

// ── index sets ──

#[test]
fn index_set_slices_rebase_to_zero() {
    let indices = [3, 4, 5, 8, 9];
    let set = IndexSet::from_indices(&indices);
    let mut scratch = Vec::new();

    let contiguous = set.slice_and_offset(0..3, &mut scratch);
    assert_eq!(contiguous.as_range(), Some(0..3));

    let sparse = set.slice_and_offset(1..4, &mut scratch);
    assert!(!sparse.is_range());
    assert_eq!(sparse.iter().collect::<Vec<_>>(), vec![0, 1, 4]);
    assert_eq!(sparse.min_array_size(), 5);
}

// ── shape keys ──

#[test]
fn edited_basis_moves_dependent_keys() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    let mut session = EditSession::begin(&flat, Some(0)).unwrap();
    let v0 = nth_vert(session.linked(), 0);
    session.linked_mut().vert_mut(v0).unwrap().co.x += 0.5;
    session.finish(&mut flat, None).unwrap();

    assert_relative_eq!(flat.verts[0].position, p(0.5, 0.0, 0.0));
    assert_relative_eq!(key_data(&flat, 0)[0], p(0.5, 0.0, 0.0));
    assert_relative_eq!(key_data(&flat, 1)[0], p(0.5, 0.0, 1.0));
    assert_relative_eq!(key_data(&flat, 1)[2], p(1.0, 1.0, 1.0));
}

#[test]
fn new_vertex_disables_offset_propagation() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    let mut session = EditSession::begin(&flat, Some(0)).unwrap();
    let v0 = nth_vert(session.linked(), 0);
    session.linked_mut().vert_mut(v0).unwrap().co.x += 0.5;
    session.linked_mut().add_vertex(p(5.0, 5.0, 0.0));
    session.finish(&mut flat, None).unwrap();

    assert_eq!(flat.verts.len(), 5);
    assert_relative_eq!(key_data(&flat, 0)[0], p(0.5, 0.0, 0.0));
    assert_relative_eq!(key_data(&flat, 1)[0], p(0.0, 0.0, 1.0));
    assert_eq!(key_data(&flat, 1).len(), 5);
}

#[test]
fn repeated_sync_does_not_reapply_offset() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    let mut session = EditSession::begin(&flat, Some(0)).unwrap();
    let v0 = nth_vert(session.linked(), 0);
    session.linked_mut().vert_mut(v0).unwrap().co.x += 0.5;

    session.sync(&mut flat).unwrap();
    assert_relative_eq!(key_data(&flat, 1)[0], p(0.5, 0.0, 1.0));
    session.sync(&mut flat).unwrap();
    assert_relative_eq!(key_data(&flat, 1)[0], p(0.5, 0.0, 1.0));
    session.finish(&mut flat, None).unwrap();
    assert_relative_eq!(key_data(&flat, 1)[0], p(0.5, 0.0, 1.0));
}

#[test]
fn editing_a_key_leaves_mesh_positions_alone() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    let mut session = EditSession::begin(&flat, Some(1)).unwrap();
    let v2 = nth_vert(session.linked(), 2);
    assert_relative_eq!(session.linked().vert(v2).unwrap().co, p(1.0, 1.0, 1.0));
    session.linked_mut().vert_mut(v2).unwrap().co.z = 2.0;
    session.finish(&mut flat, None).unwrap();

    assert_relative_eq!(flat.verts[2].position, p(1.0, 1.0, 0.0));
    assert_relative_eq!(key_data(&flat, 1)[2], p(1.0, 1.0, 2.0));
    assert_relative_eq!(key_data(&flat, 0)[2], p(1.0, 1.0, 0.0));
}

#[test]
fn shape_layer_without_block_gets_one() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    let mut session = EditSession::begin(&flat, Some(0)).unwrap();
    session.linked_mut().vdata.add_shape_layer("Extra", 42);
    session.finish(&mut flat, None).unwrap();

    let keys = flat.shape_keys.as_ref().unwrap();
    assert_eq!(keys.len(), 3);
    let extra = keys.block(keys.find_by_uid(42).unwrap()).unwrap();
    assert_eq!(extra.name, "Extra");
    assert_eq!(extra.relative_to, Some(0));
    assert_eq!(extra.data.len(), 4);
}

#[test]
fn short_shape_block_keeps_its_values() {
    init_tracing();
    let mut flat = pair();
    let basis: Vec<Point3> = flat.verts.iter().map(|v| v.position).collect();
    let short = basis[..3].iter().map(|q| *q + Vector3::z()).collect();
    let mut keys = ShapeKeySet::new();
    keys.add_block("Basis", None, basis);
    keys.add_block("Short", Some(0), short);
    flat.shape_keys = Some(keys);

    let session = EditSession::begin(&flat, Some(0)).unwrap();
    assert_eq!(session.linked().vdata.count_layers(LayerType::ShapeKey), 1);
    session.finish(&mut flat, None).unwrap();

    let data = key_data(&flat, 1);
    assert_eq!(data.len(), 4);
    assert_relative_eq!(data[0], p(0.0, 0.0, 1.0));
    assert_relative_eq!(data[2], p(1.0, 1.0, 1.0));
    assert_relative_eq!(data[3], p(0.0, 1.0, 0.0));
}

#[test]
fn repeated_sessions_reproduce_the_mesh() {
    init_tracing();
    let mut flat = with_lift_key(pair());
    EditSession::begin(&flat, Some(1))
        .unwrap()
        .finish(&mut flat, None)
        .unwrap();
    let first = flat.clone();

    for active in [Some(0), None, Some(1), Some(0)] {
        EditSession::begin(&flat, active)
            .unwrap()
            .finish(&mut flat, None)
            .unwrap();
        assert_eq!(flat.verts, first.verts);
        assert_eq!(flat.edges, first.edges);
        assert_eq!(flat.loops, first.loops);
        assert_eq!(flat.polys, first.polys);
        assert_eq!(flat.shape_keys, first.shape_keys);
    }
    assert_relative_eq!(flat.verts[2].position, p(1.0, 1.0, 0.0));
    assert_relative_eq!(key_data(&flat, 1)[2], p(1.0, 1.0, 1.0));
}

// ── selection history ──

#[test]
fn selection_history_survives_deletion() {
    init_tracing();
    let mut flat = pair();
    flat.select_history = vec![
        SelectHistoryEntry::new(SelectDomain::Vertex, 3),
        SelectHistoryEntry::new(SelectDomain::Edge, 3),
        SelectHistoryEntry::new(SelectDomain::Edge, 0),
        SelectHistoryEntry::new(SelectDomain::Face, 1),
    ];
    let mut session = EditSession::begin(&flat, None).unwrap();
    assert_eq!(session.linked().select_history().len(), 4);
    let v1 = nth_vert(session.linked(), 1);
    session.linked_mut().kill_vertex(v1).unwrap();
    session.finish(&mut flat, None).unwrap();

    assert_eq!(
        flat.select_history,
        vec![
            SelectHistoryEntry::new(SelectDomain::Vertex, 2),
            SelectHistoryEntry::new(SelectDomain::Edge, 1),
            SelectHistoryEntry::new(SelectDomain::Face, 0),
        ]
    );
}

// ── dependents ──

#[test]
fn dependents_follow_deleted_vertex() {
    init_tracing();
    let mut flat = pair();
    let mut session = EditSession::begin(&flat, None).unwrap();
    let v0 = nth_vert(session.linked(), 0);
    session.linked_mut().kill_vertex(v0).unwrap();

    let mut deps = MeshDependents {
        vertex_parents: vec![VertexParent::Triple([1, 2, 3]), VertexParent::Single(0)],
        hooks: vec![HookIndices {
            name: "Hook".into(),
            indices: vec![0, 3],
        }],
    };
    session.finish(&mut flat, Some(&mut deps)).unwrap();

    assert_eq!(flat.verts.len(), 3);
    assert_eq!(deps.vertex_parents[0], VertexParent::Triple([0, 1, 2]));
    assert_eq!(deps.vertex_parents[1], VertexParent::Single(0));
    assert_eq!(deps.hooks[0].indices, vec![2]);
}

#[test]
fn sync_renumbers_before_final_remap() {
    init_tracing();
    let mut flat = pair();
    let mut session = EditSession::begin(&flat, None).unwrap();
    let v0 = nth_vert(session.linked(), 0);
    session.linked_mut().kill_vertex(v0).unwrap();
    session.sync(&mut flat).unwrap();

    let mut deps = MeshDependents {
        vertex_parents: Vec::new(),
        hooks: vec![HookIndices {
            name: "Hook".into(),
            indices: vec![0, 2],
        }],
    };
    session.finish(&mut flat, Some(&mut deps)).unwrap();
    assert_eq!(deps.hooks[0].indices, vec![0, 2]);
}

// ── malformed input ──

#[test]
fn bad_polygon_is_skipped() {
    init_tracing();
    let mut flat = pair();
    flat.loops[4].edge = 99;

    let (mut linked, report) = to_linked(&flat, BuildParams::default()).unwrap();
    assert_eq!(report.skipped_polygons.len(), 1);
    assert_eq!(report.skipped_polygons[0].index, 1);
    assert!(report.skipped_edges.is_empty());
    linked.validate().unwrap();

    let mut out = FlatMesh::new("pair");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();
    assert_eq!(out.verts.len(), 4);
    assert_eq!(out.edges.len(), 5);
    assert_eq!(out.polys.len(), 1);
    assert_eq!(out.loops.len(), 3);
}

#[test]
fn polygon_past_the_loop_array_is_skipped() {
    init_tracing();
    let mut flat = pair();
    flat.polys[1].loop_count = 5;

    let (mut linked, report) = to_linked(&flat, BuildParams::default()).unwrap();
    assert_eq!(report.skipped_polygons.len(), 1);
    assert_eq!(report.skipped_polygons[0].index, 1);
    linked.validate().unwrap();

    let mut out = FlatMesh::new("pair");
    to_flat(&mut linked, &mut out, ExtractParams::default(), None).unwrap();
    assert_eq!(out.polys.len(), 1);
    assert_eq!(out.loops.len(), 3);
    assert_eq!(out.edges.len(), 5);
}

// ── evaluation output ──

#[test]
fn eval_output_carries_no_shape_data() {
    init_tracing();
    let flat = with_lift_key(tetrahedron());
    let mut session = EditSession::begin(&flat, Some(0)).unwrap();
    assert_eq!(session.linked().vdata.count_layers(LayerType::ShapeKey), 2);

    let eval = to_flat_for_eval(session.linked_mut(), DomainMasks::NONE).unwrap();
    assert!(eval.deformed_only);
    assert!(eval.shape_keys.is_none());
    assert_eq!(eval.vdata.count_layers(LayerType::ShapeKey), 0);
    assert_eq!(eval.verts.len(), 4);
    assert_eq!(eval.polys.len(), 4);
    assert!(eval.select_history.is_empty());
}
