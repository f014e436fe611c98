//! # dms-forms
//!
//! Turns the metadata templates bound to a document type into form inputs
//! and turns submitted values back into typed index values.
//!
//! The flow is [`aggregate`] → [`render`] → (client input) → [`normalize`].
//! Rendering and normalization are pure; only aggregation reads the
//! template store.

pub mod aggregate;
pub mod field;
pub mod normalize;
pub mod render;

pub use aggregate::{aggregate, aggregate_template, aggregate_templates, AggregatedField, AggregatedFieldSet};
pub use field::{resolve, slots_for, FieldKey, FieldSpec, FormMode, InitialValues};
pub use normalize::{
    normalize, InvalidValue, NormalizedEntry, NormalizedIndexSet, NormalizedValue,
    SubmittedIndexSet,
};
pub use render::{render, RenderedForm};
