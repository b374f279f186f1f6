//! Conversion between flat polygon meshes and fully linked editable meshes.
//!
//! A [`FlatMesh`] stores elements in contiguous arrays. A [`LinkedMesh`]
//! connects them through disk and radial cycles so they can be edited in
//! place. Attribute layers, shape keys and selection history survive the
//! trip in both directions.

pub mod attribute;
pub mod error;
pub mod flat;
pub mod index_set;
pub mod math;
pub mod nodes;
pub mod operations;
pub mod topology;

pub use error::{EditMeshError, Result};
pub use flat::FlatMesh;
pub use index_set::IndexSet;
pub use operations::{BuildLinked, EditSession, ExtractFlat};
pub use topology::LinkedMesh;
