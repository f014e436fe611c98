//! Field type resolution: one field definition to one or two input fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dms_core::defaults::{KEY_FROM_SUFFIX, KEY_TO_SUFFIX, LABEL_FROM_SUFFIX, LABEL_TO_SUFFIX};
use dms_core::{Error, FieldKind};

use crate::aggregate::AggregatedField;

/// Initial values keyed by generated field key (`"0"`, `"2_from"`, ...).
pub type InitialValues = BTreeMap<String, String>;

/// What the form is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    /// Indexing a document: one input per field.
    #[default]
    Index,
    /// Searching: date fields expand into From/To inputs.
    Search,
}

/// Generated key of a rendered input.
///
/// A date field in search mode occupies slots `n` and `n + 1` and renders as
/// `n_from` and `n_to`, so the pair is carried by the key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FieldKey {
    Single(usize),
    From(usize),
    To(usize),
}

impl FieldKey {
    /// Counter slot the key was allocated from.
    pub fn slot(&self) -> usize {
        match self {
            Self::Single(n) | Self::From(n) | Self::To(n) => *n,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{}", n),
            Self::From(n) => write!(f, "{}{}", n, KEY_FROM_SUFFIX),
            Self::To(n) => write!(f, "{}{}", n, KEY_TO_SUFFIX),
        }
    }
}

impl FromStr for FieldKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |n: &str| {
            n.parse::<usize>()
                .map_err(|_| Error::InvalidInput(format!("not a generated field key: {}", s)))
        };
        if let Some(n) = s.strip_suffix(KEY_FROM_SUFFIX) {
            Ok(Self::From(parse(n)?))
        } else if let Some(n) = s.strip_suffix(KEY_TO_SUFFIX) {
            Ok(Self::To(parse(n)?))
        } else {
            Ok(Self::Single(parse(s)?))
        }
    }
}

impl From<FieldKey> for String {
    fn from(key: FieldKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for FieldKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A concrete input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    /// Display label; date range halves carry ` From` / ` To`.
    pub label: String,
    /// Label of the source field, used when storing and searching.
    pub field_name: String,
    pub help_text: String,
    pub kind: FieldKind,
    pub mdt_id: String,
    pub initial: Option<String>,
}

impl FieldSpec {
    /// Whether submitted values are uppercased.
    pub fn is_uppercase(&self) -> bool {
        self.kind.is_uppercase()
    }

    /// Maximum accepted length, for text fields.
    pub fn max_length(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Text { max_length, .. } => Some(max_length),
            _ => None,
        }
    }

    pub fn is_range_bound(&self) -> bool {
        !matches!(self.key, FieldKey::Single(_))
    }
}

/// Counter slots a field consumes.
pub fn slots_for(kind: &FieldKind, mode: FormMode) -> usize {
    match (kind, mode) {
        (FieldKind::Date, FormMode::Search) => 2,
        _ => 1,
    }
}

/// Resolve one aggregated field allocated at `slot`.
///
/// In search mode a date field yields a From/To pair. The From half takes the
/// initial value under its own key, falling back to the bare slot key; the To
/// half looks under its own key, falling back to the next slot.
pub fn resolve(
    field: &AggregatedField,
    slot: usize,
    initial: Option<&InitialValues>,
    mode: FormMode,
) -> Vec<FieldSpec> {
    let lookup = |keys: &[String]| -> Option<String> {
        let values = initial?;
        keys.iter()
            .filter_map(|k| values.get(k))
            .find(|v| !v.is_empty())
            .cloned()
    };

    let spec = |key: FieldKey, label: String, initial: Option<String>| FieldSpec {
        key,
        label,
        field_name: field.label.clone(),
        help_text: field.help_text.clone(),
        kind: field.kind,
        mdt_id: field.mdt_id.clone(),
        initial,
    };

    if field.kind.is_date() && mode == FormMode::Search {
        let from = FieldKey::From(slot);
        let to = FieldKey::To(slot);
        let from_initial = lookup(&[from.to_string(), slot.to_string()]);
        let to_initial = lookup(&[to.to_string(), (slot + 1).to_string()]);
        return vec![
            spec(from, format!("{}{}", field.label, LABEL_FROM_SUFFIX), from_initial),
            spec(to, format!("{}{}", field.label, LABEL_TO_SUFFIX), to_initial),
        ];
    }

    let key = FieldKey::Single(slot);
    vec![spec(key, field.label.clone(), lookup(&[key.to_string()]))]
}
