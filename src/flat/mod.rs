mod shape;

pub use shape::{ShapeBlock, ShapeKeySet};

use std::collections::HashMap;

use bitflags::bitflags;

use crate::attribute::{AttributeStore, Domain};
use crate::error::TopologyError;
use crate::math::polygon_3d::newell_vector;
use crate::math::{Point3, Vector3};

bitflags! {
    /// Per-vertex state bits of a flat mesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertFlags: u8 {
        const SELECT = 1 << 0;
        const HIDDEN = 1 << 4;
    }

    /// Per-edge state bits of a flat mesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EdgeFlags: u16 {
        const SELECT = 1 << 0;
        /// Derived draw hint, recomputed on every extraction.
        const DRAW = 1 << 1;
        const SEAM = 1 << 2;
        const HIDDEN = 1 << 4;
        const SHARP = 1 << 9;
    }

    /// Per-polygon state bits of a flat mesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PolyFlags: u8 {
        const SMOOTH = 1 << 0;
        const SELECT = 1 << 1;
        const HIDDEN = 1 << 4;
    }

    /// Optional per-element scalar fields the mesh makes use of.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFeatures: u8 {
        const VERT_BWEIGHT = 1 << 0;
        const EDGE_BWEIGHT = 1 << 1;
        const EDGE_CREASE = 1 << 2;
    }
}

/// A flat vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3,
    pub flags: VertFlags,
    pub bevel_weight: u8,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            flags: VertFlags::empty(),
            bevel_weight: 0,
        }
    }
}

/// A flat edge between two vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edge {
    pub v1: usize,
    pub v2: usize,
    pub flags: EdgeFlags,
    pub bevel_weight: u8,
    pub crease: u8,
}

/// A polygon corner: the vertex it sits on and the edge to the next corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loop {
    pub vert: usize,
    pub edge: usize,
}

/// A polygon covering `loop_count` consecutive loops from `loop_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Polygon {
    pub loop_start: usize,
    pub loop_count: usize,
    pub flags: PolyFlags,
    pub material: i16,
}

/// Element kind of a selection history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectDomain {
    Vertex,
    Edge,
    Face,
}

/// One serialized selection history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectHistoryEntry {
    pub domain: SelectDomain,
    pub index: usize,
}

impl SelectHistoryEntry {
    /// Creates a record.
    #[must_use]
    pub fn new(domain: SelectDomain, index: usize) -> Self {
        Self { domain, index }
    }
}

/// Array-of-structures mesh: the persisted representation.
///
/// Each domain's [`AttributeStore`] holds exactly one row per element.
#[derive(Debug, Clone, Default)]
pub struct FlatMesh {
    pub name: String,
    pub verts: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub loops: Vec<Loop>,
    pub polys: Vec<Polygon>,
    pub vdata: AttributeStore,
    pub edata: AttributeStore,
    pub ldata: AttributeStore,
    pub pdata: AttributeStore,
    pub shape_keys: Option<ShapeKeySet>,
    pub select_history: Vec<SelectHistoryEntry>,
    pub act_face: Option<usize>,
    pub features: MeshFeatures,
    /// Set when the mesh was produced for evaluation and carries positions only.
    pub deformed_only: bool,
    vertex_normals: Vec<Vector3>,
    normals_dirty: bool,
}

impl FlatMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normals_dirty: true,
            ..Self::default()
        }
    }

    /// Builds a mesh from positions and polygon corner lists, deriving edges.
    ///
    /// Every derived edge carries [`EdgeFlags::DRAW`].
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if a corner references a
    /// missing vertex, or [`TopologyError::InvalidTopology`] for polygons with
    /// fewer than three corners.
    pub fn from_polygons(
        name: impl Into<String>,
        positions: &[Point3],
        polygons: &[&[usize]],
    ) -> Result<Self, TopologyError> {
        let mut mesh = Self::new(name);
        mesh.verts = positions
            .iter()
            .map(|&position| Vertex {
                position,
                ..Vertex::default()
            })
            .collect();

        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        for (pi, corners) in polygons.iter().enumerate() {
            if corners.len() < 3 {
                return Err(TopologyError::InvalidTopology(format!(
                    "polygon {pi} has {} corners",
                    corners.len()
                )));
            }
            let loop_start = mesh.loops.len();
            for (i, &v) in corners.iter().enumerate() {
                let next = corners[(i + 1) % corners.len()];
                for index in [v, next] {
                    if index >= positions.len() {
                        return Err(TopologyError::IndexOutOfRange {
                            domain: "vertex",
                            index,
                            len: positions.len(),
                        });
                    }
                }
                let key = (v.min(next), v.max(next));
                let edges = &mut mesh.edges;
                let edge = *edge_map.entry(key).or_insert_with(|| {
                    edges.push(Edge {
                        v1: v,
                        v2: next,
                        flags: EdgeFlags::DRAW,
                        ..Edge::default()
                    });
                    edges.len() - 1
                });
                mesh.loops.push(Loop { vert: v, edge });
            }
            mesh.polys.push(Polygon {
                loop_start,
                loop_count: corners.len(),
                ..Polygon::default()
            });
        }

        mesh.vdata = AttributeStore::with_rows(mesh.verts.len());
        mesh.edata = AttributeStore::with_rows(mesh.edges.len());
        mesh.ldata = AttributeStore::with_rows(mesh.loops.len());
        mesh.pdata = AttributeStore::with_rows(mesh.polys.len());
        Ok(mesh)
    }

    /// Returns `true` if the mesh has no elements in any domain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
            && self.edges.is_empty()
            && self.loops.is_empty()
            && self.polys.is_empty()
    }

    /// Number of elements in `domain`.
    #[must_use]
    pub fn domain_size(&self, domain: Domain) -> usize {
        match domain {
            Domain::Vertex => self.verts.len(),
            Domain::Edge => self.edges.len(),
            Domain::Loop => self.loops.len(),
            Domain::Face => self.polys.len(),
        }
    }

    /// The attribute store of `domain`.
    #[must_use]
    pub fn store(&self, domain: Domain) -> &AttributeStore {
        match domain {
            Domain::Vertex => &self.vdata,
            Domain::Edge => &self.edata,
            Domain::Loop => &self.ldata,
            Domain::Face => &self.pdata,
        }
    }

    /// Mutable attribute store of `domain`.
    pub fn store_mut(&mut self, domain: Domain) -> &mut AttributeStore {
        match domain {
            Domain::Vertex => &mut self.vdata,
            Domain::Edge => &mut self.edata,
            Domain::Loop => &mut self.ldata,
            Domain::Face => &mut self.pdata,
        }
    }

    /// The loops of polygon `poly`, or `None` if its range is out of bounds.
    #[must_use]
    pub fn poly_loops(&self, poly: usize) -> Option<&[Loop]> {
        let p = self.polys.get(poly)?;
        let end = p.loop_start.checked_add(p.loop_count)?;
        self.loops.get(p.loop_start..end)
    }

    /// Cached vertex normals, if they are up to date.
    #[must_use]
    pub fn vertex_normals(&self) -> Option<&[Vector3]> {
        (!self.normals_dirty && self.vertex_normals.len() == self.verts.len())
            .then_some(self.vertex_normals.as_slice())
    }

    /// Marks cached normals stale; they are rebuilt on next request.
    pub fn tag_normals_dirty(&mut self) {
        self.normals_dirty = true;
    }

    /// Returns up-to-date vertex normals, recomputing them if stale.
    ///
    /// Each vertex normal is the area-weighted sum of its polygons' normals.
    pub fn ensure_vertex_normals(&mut self) -> &[Vector3] {
        if self.vertex_normals().is_none() {
            let mut normals = vec![Vector3::zeros(); self.verts.len()];
            let mut corners = Vec::new();
            for poly in 0..self.polys.len() {
                let Some(loops) = self.poly_loops(poly) else {
                    continue;
                };
                corners.clear();
                corners.extend(loops.iter().map(|l| self.verts[l.vert].position));
                let weighted = newell_vector(&corners);
                for l in loops {
                    normals[l.vert] += weighted;
                }
            }
            for n in &mut normals {
                *n = n.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            }
            self.vertex_normals = normals;
            self.normals_dirty = false;
        }
        &self.vertex_normals
    }
}
