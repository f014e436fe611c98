//! Parallel-key and single-key autocomplete.
//!
//! Fields in a template's parallel group tend to travel together across
//! documents (an employee ID and the employee's name). Given a partially
//! typed value for one of them, the resolver returns the values the other
//! members of the group carried on previously indexed documents.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use dms_core::{DocumentStore, MetadataTemplate, Result, SecondaryIndexMap};

/// Distinct observed values of one field, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValues {
    pub label: String,
    pub values: Vec<String>,
}

impl FieldValues {
    fn add(&mut self, value: &str) {
        if !self.values.iter().any(|v| v == value) {
            self.values.push(value.to_string());
        }
    }
}

/// Values of the partner fields, keyed by label.
///
/// Labels are matched case-insensitively; the first-seen casing is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParallelSuggestions(Vec<FieldValues>);

impl ParallelSuggestions {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|f| f.values.is_empty())
    }

    pub fn fields(&self) -> &[FieldValues] {
        &self.0
    }

    /// Values recorded for `label`, matched case-insensitively.
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
            .map(|f| f.values.as_slice())
    }

    pub fn to_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.0
            .iter()
            .filter(|f| !f.values.is_empty())
            .map(|f| (f.label.clone(), f.values.iter().cloned().collect()))
            .collect()
    }

    fn add(&mut self, label: &str, value: &str) {
        match self.0.iter_mut().find(|f| f.label.eq_ignore_ascii_case(label)) {
            Some(field) => field.add(value),
            None => self.0.push(FieldValues {
                label: label.to_string(),
                values: vec![value.to_string()],
            }),
        }
    }
}

/// Labels sharing a parallel group with `field_label` across `templates`.
///
/// Empty when the field belongs to no group in any template.
pub fn partners_of(templates: &[MetadataTemplate], field_label: &str) -> Vec<String> {
    let mut partners: Vec<String> = Vec::new();
    for partner in templates
        .iter()
        .filter_map(|t| t.parallel_partners(field_label))
        .flatten()
    {
        if !partners.contains(&partner) {
            partners.push(partner);
        }
    }
    partners
}

/// Whether `field_label` is declared uppercase in any of `templates`.
pub fn is_uppercase_field(templates: &[MetadataTemplate], field_label: &str) -> bool {
    templates.iter().any(|t| {
        t.field_by_label(field_label)
            .is_some_and(|(_, def)| def.field_type.eq_ignore_ascii_case("string") && def.wants_uppercase())
    })
}

/// Normalize a typed prefix the way stored values of the field were normalized.
pub fn prepare_prefix(templates: &[MetadataTemplate], field_label: &str, partial: &str) -> String {
    let trimmed = partial.trim();
    if is_uppercase_field(templates, field_label) {
        trimmed.to_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// Accumulate partner values from the secondary indexes of matching documents.
pub fn collect_parallel(partners: &[String], hits: &[SecondaryIndexMap]) -> ParallelSuggestions {
    let mut out = ParallelSuggestions::default();
    for indexes in hits {
        for (label, value) in indexes {
            if value.is_empty() {
                continue;
            }
            if partners.iter().any(|p| p.eq_ignore_ascii_case(label)) {
                out.add(label, value);
            }
        }
    }
    out
}

/// Resolve parallel suggestions for a partially typed value.
///
/// `templates` are the templates bound to `docrule_id`. When `field_label`
/// is in no parallel group the result is empty and the store is not queried.
pub async fn resolve_parallel<S>(
    store: &S,
    templates: &[MetadataTemplate],
    docrule_id: &str,
    field_label: &str,
    partial_value: &str,
) -> Result<ParallelSuggestions>
where
    S: DocumentStore + ?Sized,
{
    let partners = partners_of(templates, field_label);
    if partners.is_empty() {
        debug!(
            subsystem = "search",
            component = "parallel",
            docrule_id,
            field = field_label,
            "Field is in no parallel group"
        );
        return Ok(ParallelSuggestions::default());
    }

    let prefix = prepare_prefix(templates, field_label, partial_value);
    let hits = store
        .find_by_field_prefix(docrule_id, field_label, &prefix)
        .await?;
    let suggestions = collect_parallel(&partners, &hits);

    debug!(
        subsystem = "search",
        component = "parallel",
        docrule_id,
        field = field_label,
        result_count = hits.len(),
        "Resolved parallel keys"
    );
    Ok(suggestions)
}

/// Distinct values of `field_label` itself starting with the prefix.
pub async fn suggest_values<S>(
    store: &S,
    templates: &[MetadataTemplate],
    docrule_id: &str,
    field_label: &str,
    partial_value: &str,
) -> Result<FieldValues>
where
    S: DocumentStore + ?Sized,
{
    let prefix = prepare_prefix(templates, field_label, partial_value);
    let hits = store
        .find_by_field_prefix(docrule_id, field_label, &prefix)
        .await?;

    let mut values = FieldValues {
        label: field_label.to_string(),
        values: Vec::new(),
    };
    for value in hits.iter().filter_map(|h| h.get(field_label)) {
        values.add(value);
    }
    Ok(values)
}

/// Autocomplete answer for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestions {
    /// The field is parallel: the matched values plus partner values.
    Parallel {
        matched: FieldValues,
        partners: ParallelSuggestions,
    },
    /// The field stands alone: its own distinct values.
    Single(FieldValues),
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Parallel { matched, partners } => matched.values.is_empty() && partners.is_empty(),
            Self::Single(values) => values.values.is_empty(),
        }
    }
}

/// Parallel suggestions when the field is grouped, single-key otherwise.
pub async fn suggest<S>(
    store: &S,
    templates: &[MetadataTemplate],
    docrule_id: &str,
    field_label: &str,
    partial_value: &str,
) -> Result<Suggestions>
where
    S: DocumentStore + ?Sized,
{
    let matched = suggest_values(store, templates, docrule_id, field_label, partial_value).await?;
    if partners_of(templates, field_label).is_empty() {
        return Ok(Suggestions::Single(matched));
    }
    let partners =
        resolve_parallel(store, templates, docrule_id, field_label, partial_value).await?;
    Ok(Suggestions::Parallel { matched, partners })
}
