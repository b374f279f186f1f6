use crate::attribute::DomainMasks;
use crate::error::Result;
use crate::flat::FlatMesh;
use crate::topology::LinkedMesh;

use super::build::{BuildLinked, BuildParams, BuildReport};
use super::extract::{ExtractFlat, ExtractParams};
use super::extract_eval::extract_for_eval;
use super::remap::MeshDependents;

/// Builds a new linked mesh from `flat`.
///
/// # Errors
///
/// Returns an error if the build fails; see [`BuildLinked::execute`].
pub fn to_linked(flat: &FlatMesh, params: BuildParams) -> Result<(LinkedMesh, BuildReport)> {
    let mut linked = LinkedMesh::new();
    let report = BuildLinked::new(params).execute(flat, &mut linked)?;
    Ok((linked, report))
}

/// Writes `linked` back into `flat`, replacing its geometry.
///
/// # Errors
///
/// Returns an error if the extraction fails; see [`ExtractFlat::execute`].
pub fn to_flat(
    linked: &mut LinkedMesh,
    flat: &mut FlatMesh,
    params: ExtractParams,
    deps: Option<&mut MeshDependents>,
) -> Result<()> {
    ExtractFlat::new(params).execute(linked, flat, deps)
}

/// Produces a fresh evaluation mesh from `linked`.
///
/// # Errors
///
/// Returns an error if `extra` requests shape layers.
pub fn to_flat_for_eval(linked: &mut LinkedMesh, extra: DomainMasks) -> Result<FlatMesh> {
    let mut flat = FlatMesh::new("");
    extract_for_eval(linked, &mut flat, extra)?;
    Ok(flat)
}

/// An editing session over one flat mesh.
///
/// The linked mesh tracks original vertex indices for the whole session so
/// shape offsets and dependents can be carried across each write-back.
#[derive(Debug, Clone)]
pub struct EditSession {
    linked: LinkedMesh,
    report: BuildReport,
}

impl EditSession {
    /// Starts editing `flat`, seeding positions from `active_shape` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails.
    pub fn begin(flat: &FlatMesh, active_shape: Option<usize>) -> Result<Self> {
        let params = BuildParams {
            active_shape,
            use_shape_positions: true,
            add_key_index: true,
            ..BuildParams::default()
        };
        let (linked, report) = to_linked(flat, params)?;
        Ok(Self { linked, report })
    }

    /// The mesh being edited.
    #[must_use]
    pub fn linked(&self) -> &LinkedMesh {
        &self.linked
    }

    /// Mutable access to the mesh being edited.
    pub fn linked_mut(&mut self) -> &mut LinkedMesh {
        &mut self.linked
    }

    /// Elements skipped when the session began.
    #[must_use]
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Writes the current state into `flat` and keeps editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction fails.
    pub fn sync(&mut self, flat: &mut FlatMesh) -> Result<()> {
        let params = ExtractParams {
            refresh_shape_index_layer: true,
            ..ExtractParams::default()
        };
        to_flat(&mut self.linked, flat, params, None)
    }

    /// Writes the final state into `flat`, remapping `deps`, and ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction fails.
    pub fn finish(mut self, flat: &mut FlatMesh, deps: Option<&mut MeshDependents>) -> Result<()> {
        let params = ExtractParams {
            recompute_parent_remap: true,
            ..ExtractParams::default()
        };
        to_flat(&mut self.linked, flat, params, deps)
    }
}
