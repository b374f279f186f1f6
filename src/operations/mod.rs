mod build;
mod convert;
mod extract;
mod extract_eval;
mod remap;
mod shape_sync;

pub use build::{BuildLinked, BuildParams, BuildReport, SkippedElement};
pub use convert::{to_flat, to_flat_for_eval, to_linked, EditSession};
pub use extract::{ExtractFlat, ExtractParams, QUICK_DRAW_THRESHOLD};
pub use extract_eval::extract_for_eval;
pub use remap::{HookIndices, MeshDependents, OriginalIndexMap, VertexParent};
