use tracing::debug;

use super::{ExecParams, NodeValue, NodeWarning};
use crate::attribute::{Domain, LayerType};
use crate::flat::FlatMesh;
use crate::index_set::IndexSet;

/// Writes an integer attribute on the selected elements of one domain.
///
/// Inputs are `Geometry`, `Selection` and `Value`. A missing selection
/// covers the whole domain. The layer is created when absent.
#[derive(Debug, Clone)]
pub struct SetDomainAttributeNode {
    domain: Domain,
    name: String,
}

impl SetDomainAttributeNode {
    #[must_use]
    pub fn new(domain: Domain, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }

    pub fn execute<P: ExecParams>(&self, params: &mut P) {
        let Some(mut geometry) = params.get_input::<FlatMesh>("Geometry") else {
            params.set_default_remaining_outputs();
            return;
        };
        let value = params.get_input::<i32>("Value").unwrap_or(0);
        let size = geometry.domain_size(self.domain);

        if size == 0 {
            params.error_message_add(
                NodeWarning::Warning,
                "Input geometry has no elements in the attribute domain",
            );
        } else {
            let selection = match params.get_input::<Vec<usize>>("Selection") {
                Some(indices) => IndexSet::from_vec(indices),
                None => IndexSet::from_range(0..size),
            };
            if selection.min_array_size() > size {
                params.error_message_add(
                    NodeWarning::Warning,
                    "Selection has indices past the end of the domain",
                );
            }
            self.write(&mut geometry, &selection, value);
        }
        params.set_output("Geometry", NodeValue::Geometry(geometry));
    }

    fn write(&self, geometry: &mut FlatMesh, selection: &IndexSet<'_>, value: i32) {
        let store = geometry.store_mut(self.domain);
        let handle = match store.layer_named(LayerType::Int, &self.name) {
            Some(h) => h,
            None => store.add_layer(LayerType::Int, &self.name),
        };
        let Ok(values) = store.ints_mut(handle) else {
            return;
        };
        let mut written = 0;
        for i in selection.iter() {
            if let Some(slot) = values.get_mut(i) {
                *slot = value;
                written += 1;
            }
        }
        debug!(attribute = %self.name, written, "attribute written");
    }
}
