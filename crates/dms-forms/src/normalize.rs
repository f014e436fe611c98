//! Submission normalization: raw posted values to typed index values.
//!
//! Values are read by generated key, trimmed, uppercased when the field asks
//! for it, and coerced according to the field kind. A value that fails
//! coercion is kept as trimmed text and recorded in
//! [`NormalizedIndexSet::invalid`]; nothing fails at this layer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dms_core::defaults::{KEY_DATE, KEY_DESCRIPTION, KEY_END_DATE, RESERVED_KEYS};
use dms_core::{
    DateRange, DmsConfig, Error, FieldKind, IndexValue, Result, SecondaryIndexMap,
};

use crate::field::{FieldKey, FieldSpec};
use crate::render::RenderedForm;

/// Raw key/value pairs as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedIndexSet(BTreeMap<String, String>);

impl SubmittedIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value under `key`, trimmed; blank values read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.get(KEY_DESCRIPTION)
    }

    /// Creation date range from the reserved `date` / `end_date` keys.
    ///
    /// Blank bounds are unbounded; a bound in no accepted format is an error.
    pub fn creation_range(&self, config: &DmsConfig) -> Result<DateRange> {
        let bound = |key: &str| self.get(key).map(|v| config.parse_date(v)).transpose();
        Ok(DateRange::new(bound(KEY_DATE)?, bound(KEY_END_DATE)?))
    }

    /// Creation date for indexing: the `date` key, or `today` when absent.
    pub fn creation_date(&self, config: &DmsConfig, today: NaiveDate) -> Result<NaiveDate> {
        match self.get(KEY_DATE) {
            Some(v) => config.parse_date(v),
            None => Ok(today),
        }
    }

    /// Keys that are neither reserved nor generated field keys.
    pub fn unexpected_keys<'a>(&'a self, form: &'a RenderedForm) -> impl Iterator<Item = &'a str> {
        self.0.keys().map(String::as_str).filter(move |k| {
            !RESERVED_KEYS.contains(k)
                && !k
                    .parse::<FieldKey>()
                    .map(|key| form.get(&key).is_some())
                    .unwrap_or(false)
        })
    }
}

impl FromIterator<(String, String)> for SubmittedIndexSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for SubmittedIndexSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// A normalized value: a single value, or a range from a From/To pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum NormalizedValue {
    Single(IndexValue),
    Range {
        from: Option<IndexValue>,
        to: Option<IndexValue>,
    },
}

/// One normalized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEntry {
    pub label: String,
    pub kind: FieldKind,
    pub value: NormalizedValue,
}

/// A value kept as text after failing coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidValue {
    pub label: String,
    pub value: String,
    pub expected: String,
}

impl From<&InvalidValue> for Error {
    fn from(invalid: &InvalidValue) -> Self {
        Error::InvalidFieldValue {
            field: invalid.label.clone(),
            value: invalid.value.clone(),
            expected: invalid.expected.clone(),
        }
    }
}

/// Normalized values keyed by field label, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedIndexSet {
    pub entries: Vec<NormalizedEntry>,
    pub description: Option<String>,
    pub invalid: Vec<InvalidValue>,
}

impl NormalizedIndexSet {
    pub fn get(&self, label: &str) -> Option<&NormalizedValue> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail with the first recorded coercion failure.
    pub fn validate(&self) -> Result<()> {
        match self.invalid.first() {
            Some(invalid) => Err(invalid.into()),
            None => Ok(()),
        }
    }

    /// Canonical stored form of the single values; ranges are search-only.
    pub fn to_secondary_indexes(&self) -> SecondaryIndexMap {
        self.entries
            .iter()
            .filter_map(|e| match &e.value {
                NormalizedValue::Single(v) => Some((e.label.clone(), v.canonical())),
                NormalizedValue::Range { .. } => None,
            })
            .collect()
    }
}

/// Normalize `submitted` against the inputs of `form`.
///
/// Submitted keys the form did not render are ignored. A date From/To pair
/// given under `n_from`/`n_to` is a range; a date given under the bare slot
/// key `n` with nothing under `n + 1` is a single value.
pub fn normalize(
    form: &RenderedForm,
    submitted: &SubmittedIndexSet,
    config: &DmsConfig,
) -> NormalizedIndexSet {
    let mut out = NormalizedIndexSet {
        description: submitted.description().map(str::to_string),
        ..Default::default()
    };

    for spec in form.iter() {
        match spec.key {
            FieldKey::Single(slot) => {
                if let Some(raw) = submitted.get(&slot.to_string()) {
                    let value = coerce(spec, raw, config, &mut out.invalid);
                    push(&mut out, spec, NormalizedValue::Single(value));
                }
            }
            FieldKey::From(slot) => {
                let explicit = (
                    submitted.get(&FieldKey::From(slot).to_string()),
                    submitted.get(&FieldKey::To(slot).to_string()),
                );
                let value = match explicit {
                    (None, None) => {
                        match (
                            submitted.get(&slot.to_string()),
                            submitted.get(&(slot + 1).to_string()),
                        ) {
                            (None, None) => None,
                            (Some(raw), None) => Some(NormalizedValue::Single(coerce(
                                spec,
                                raw,
                                config,
                                &mut out.invalid,
                            ))),
                            (from, to) => Some(range(spec, from, to, config, &mut out.invalid)),
                        }
                    }
                    (from, to) => Some(range(spec, from, to, config, &mut out.invalid)),
                };
                if let Some(value) = value {
                    push(&mut out, spec, value);
                }
            }
            // Consumed together with its From half.
            FieldKey::To(_) => {}
        }
    }

    let ignored = submitted.unexpected_keys(form).count();
    debug!(
        subsystem = "forms",
        component = "normalizer",
        field_count = out.entries.len(),
        invalid_count = out.invalid.len(),
        ignored_keys = ignored,
        "Normalized submission"
    );
    out
}

fn push(out: &mut NormalizedIndexSet, spec: &FieldSpec, value: NormalizedValue) {
    out.entries.push(NormalizedEntry {
        label: spec.field_name.clone(),
        kind: spec.kind,
        value,
    });
}

fn range(
    spec: &FieldSpec,
    from: Option<&str>,
    to: Option<&str>,
    config: &DmsConfig,
    invalid: &mut Vec<InvalidValue>,
) -> NormalizedValue {
    NormalizedValue::Range {
        from: from.map(|raw| coerce(spec, raw, config, invalid)),
        to: to.map(|raw| coerce(spec, raw, config, invalid)),
    }
}

/// Coerce one trimmed raw value according to the field kind.
fn coerce(
    spec: &FieldSpec,
    raw: &str,
    config: &DmsConfig,
    invalid: &mut Vec<InvalidValue>,
) -> IndexValue {
    let mut reject = |expected: String| {
        warn!(
            subsystem = "forms",
            component = "normalizer",
            field = %spec.field_name,
            value = raw,
            %expected,
            "Keeping raw value after failed coercion"
        );
        invalid.push(InvalidValue {
            label: spec.field_name.clone(),
            value: raw.to_string(),
            expected,
        });
    };

    match spec.kind {
        FieldKind::Integer => match raw.parse::<i64>() {
            Ok(n) => IndexValue::Integer(n),
            Err(_) => {
                reject("integer".to_string());
                IndexValue::Text(raw.to_string())
            }
        },
        FieldKind::Date => match config.parse_date(raw) {
            Ok(d) => IndexValue::Date(d),
            Err(_) => {
                reject(format!("date in format {}", config.display_date_format));
                IndexValue::Text(raw.to_string())
            }
        },
        FieldKind::Text {
            max_length,
            uppercase,
        } => {
            let value = if uppercase {
                raw.to_uppercase()
            } else {
                raw.to_string()
            };
            if value.chars().count() > max_length {
                reject(format!("at most {} characters", max_length));
            }
            IndexValue::Text(value)
        }
    }
}
