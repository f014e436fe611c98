//! Form rendering: the aggregated field set to an ordered list of inputs.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregatedFieldSet;
use crate::field::{resolve, slots_for, FieldKey, FieldSpec, FormMode, InitialValues};

/// Ordered inputs of a rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedForm {
    pub mode: FormMode,
    fields: Vec<FieldSpec>,
}

impl RenderedForm {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| &f.key == key)
    }

    /// Generated keys in render order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.to_string()).collect()
    }

    /// Key of the first input rendered for the field labelled `label`.
    pub fn key_for_label(&self, label: &str) -> Option<FieldKey> {
        self.fields
            .iter()
            .find(|f| f.field_name == label)
            .map(|f| f.key)
    }
}

impl<'a> IntoIterator for &'a RenderedForm {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Render every field of `set` in order.
///
/// Key allocation is a fold over the set: each field receives the running
/// slot and returns the next one, so keys depend only on position.
pub fn render(
    set: &AggregatedFieldSet,
    initial: Option<&InitialValues>,
    mode: FormMode,
) -> RenderedForm {
    let (_, fields) = set.fields().iter().fold(
        (0usize, Vec::with_capacity(set.len())),
        |(slot, mut fields), field| {
            fields.extend(resolve(field, slot, initial, mode));
            (slot + slots_for(&field.kind, mode), fields)
        },
    );

    debug!(
        subsystem = "forms",
        component = "renderer",
        ?mode,
        field_count = fields.len(),
        "Rendered form"
    );
    RenderedForm { mode, fields }
}
