//! Data model for metadata templates, typed index values and indexed documents.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DmsConfig;
use crate::defaults::UPPERCASE_FLAG;
use crate::error::{Error, Result};
use crate::temporal::format_iso;

/// Secondary indexes of a stored document: field label to canonical value.
pub type SecondaryIndexMap = BTreeMap<String, String>;

// =============================================================================
// METADATA TEMPLATES
// =============================================================================

/// A field declaration inside a metadata template, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Declared type tag: `integer`, `string` or `date`.
    #[serde(rename = "type")]
    pub field_type: String,

    /// Human label; also the key the value is stored under.
    pub field_name: String,

    /// Help text.
    #[serde(default)]
    pub description: String,

    /// Maximum length (string fields only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// `"yes"` turns on uppercase normalization (string fields only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uppercase: Option<String>,
}

impl FieldDefinition {
    /// Integer field.
    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_type("integer", name, description)
    }

    /// String field with the default length.
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_type("string", name, description)
    }

    /// Date field.
    pub fn date(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_type("date", name, description)
    }

    fn with_type(
        field_type: &str,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            field_type: field_type.to_string(),
            field_name: name.into(),
            description: description.into(),
            length: None,
            uppercase: None,
        }
    }

    /// Set the maximum length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Turn on uppercase normalization.
    pub fn uppercased(mut self) -> Self {
        self.uppercase = Some(UPPERCASE_FLAG.to_string());
        self
    }

    /// Whether the uppercase flag is set to `"yes"`.
    pub fn wants_uppercase(&self) -> bool {
        self.uppercase.as_deref() == Some(UPPERCASE_FLAG)
    }
}

/// Closed set of field kinds with their kind-specific settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    /// Free text with a length bound; `uppercase` only exists here.
    Text { max_length: usize, uppercase: bool },
    Date,
}

impl FieldKind {
    /// Resolve the stored type tag of `def` into a kind.
    ///
    /// Unknown tags fail with [`Error::UnsupportedFieldType`] naming the
    /// template and position so the broken template can be found.
    pub fn from_definition(
        def: &FieldDefinition,
        mdt_id: &str,
        position: u32,
        config: &DmsConfig,
    ) -> Result<Self> {
        match def.field_type.trim().to_ascii_lowercase().as_str() {
            "integer" => Ok(Self::Integer),
            "string" => Ok(Self::Text {
                max_length: def.length.unwrap_or(config.default_string_length),
                uppercase: def.wants_uppercase(),
            }),
            "date" => Ok(Self::Date),
            _ => Err(Error::UnsupportedFieldType {
                mdt_id: mdt_id.to_string(),
                position,
                type_name: def.field_type.clone(),
            }),
        }
    }

    /// The type tag as written in templates.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text { .. } => "string",
            Self::Date => "date",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date)
    }

    pub fn is_uppercase(&self) -> bool {
        matches!(self, Self::Text { uppercase: true, .. })
    }
}

/// A metadata template (MDT): typed secondary index fields for document types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTemplate {
    #[serde(rename = "_id", alias = "mdt_id", alias = "id")]
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Document types this template applies to.
    #[serde(default)]
    pub docrule_id: Vec<String>,

    /// Field position to definition, ordered by position.
    #[serde(default)]
    pub fields: BTreeMap<u32, FieldDefinition>,

    /// Parallel group id to the field positions that travel together.
    #[serde(default)]
    pub parallel: BTreeMap<String, Vec<String>>,
}

impl MetadataTemplate {
    /// Empty template with the given id.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            docrule_id: Vec::new(),
            fields: BTreeMap::new(),
            parallel: BTreeMap::new(),
        }
    }

    /// Bind the template to a document type.
    pub fn for_docrule(mut self, docrule_id: impl Into<String>) -> Self {
        self.docrule_id.push(docrule_id.into());
        self
    }

    /// Add a field at `position`.
    pub fn with_field(mut self, position: u32, field: FieldDefinition) -> Self {
        self.fields.insert(position, field);
        self
    }

    /// Declare a parallel group over field positions.
    pub fn with_parallel(mut self, group: impl Into<String>, positions: &[u32]) -> Self {
        self.parallel.insert(
            group.into(),
            positions.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn applies_to(&self, docrule_id: &str) -> bool {
        self.docrule_id.iter().any(|d| d == docrule_id)
    }

    /// Position and definition of the field labelled `label`.
    pub fn field_by_label(&self, label: &str) -> Option<(u32, &FieldDefinition)> {
        self.fields
            .iter()
            .find(|(_, def)| def.field_name == label)
            .map(|(pos, def)| (*pos, def))
    }

    /// Labels sharing a parallel group with `label`, excluding `label` itself.
    ///
    /// Returns `None` when the field belongs to no parallel group.
    pub fn parallel_partners(&self, label: &str) -> Option<Vec<String>> {
        let (position, _) = self.field_by_label(label)?;
        let position = position.to_string();

        let mut partners: Vec<String> = Vec::new();
        let mut grouped = false;
        for members in self.parallel.values() {
            if !members.iter().any(|m| m.trim() == position) {
                continue;
            }
            grouped = true;
            for member in members {
                let Ok(pos) = member.trim().parse::<u32>() else {
                    continue;
                };
                if let Some(def) = self.fields.get(&pos) {
                    if def.field_name != label && !partners.contains(&def.field_name) {
                        partners.push(def.field_name.clone());
                    }
                }
            }
        }

        grouped.then_some(partners)
    }

    /// Whether `label` belongs to any parallel group.
    pub fn is_parallel(&self, label: &str) -> bool {
        self.parallel_partners(label).is_some()
    }
}

// =============================================================================
// INDEX VALUES
// =============================================================================

/// A normalized, typed secondary index value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IndexValue {
    Integer(i64),
    Text(String),
    Date(NaiveDate),
}

impl IndexValue {
    /// Canonical stored representation (dates in ISO form).
    pub fn canonical(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::Date(d) => format_iso(*d),
        }
    }

    /// Representation for display (dates in the configured format).
    pub fn display(&self, config: &DmsConfig) -> String {
        match self {
            Self::Date(d) => config.format_date(*d),
            other => other.canonical(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(v) if v.is_empty())
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// A document filed under a document type with its indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Primary document code (e.g. `ADL-0001`).
    pub code: String,

    pub docrule_id: String,

    /// Document creation date (the top-level `date` index).
    pub creation_date: NaiveDate,

    #[serde(default)]
    pub description: String,

    /// Secondary indexes keyed by field label.
    #[serde(default, alias = "mdt_indexes")]
    pub secondary_indexes: SecondaryIndexMap,

    /// Stored revision names.
    #[serde(default)]
    pub revisions: Vec<String>,
}

impl IndexedDocument {
    pub fn new(
        code: impl Into<String>,
        docrule_id: impl Into<String>,
        creation_date: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            docrule_id: docrule_id.into(),
            creation_date,
            description: String::new(),
            secondary_indexes: SecondaryIndexMap::new(),
            revisions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_index(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.secondary_indexes.insert(label.into(), value.into());
        self
    }

    pub fn with_revision(mut self, name: impl Into<String>) -> Self {
        self.revisions.push(name.into());
        self
    }

    pub fn index(&self, label: &str) -> Option<&str> {
        self.secondary_indexes.get(label).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdt1() -> MetadataTemplate {
        MetadataTemplate::new("mdt1", "Test MDT Number 1")
            .for_docrule("2")
            .with_field(1, FieldDefinition::integer("Friends ID", "ID of Friend"))
            .with_field(
                2,
                FieldDefinition::string("Friends Name", "Name").with_length(60),
            )
            .with_field(3, FieldDefinition::date("Required Date", "Date key"))
            .with_parallel("1", &[1, 2])
    }

    #[test]
    fn test_template_deserializes_stored_shape() {
        let json = r#"{
            "_id": "mdt4",
            "docrule_id": ["8"],
            "description": "Test MDT Number 4",
            "fields": {
                "1": {
                    "type": "string",
                    "uppercase": "yes",
                    "field_name": "Tests Uppercase Field",
                    "description": "Uppercase"
                }
            },
            "parallel": {}
        }"#;
        let mdt: MetadataTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(mdt.id, "mdt4");
        assert!(mdt.applies_to("8"));
        assert!(!mdt.applies_to("2"));
        assert!(mdt.fields[&1].wants_uppercase());
    }

    #[test]
    fn test_fields_ordered_by_numeric_position() {
        let mdt = MetadataTemplate::new("m", "")
            .with_field(10, FieldDefinition::string("Tenth", ""))
            .with_field(2, FieldDefinition::string("Second", ""));
        let labels: Vec<&str> = mdt.fields.values().map(|f| f.field_name.as_str()).collect();
        assert_eq!(labels, vec!["Second", "Tenth"]);
    }

    #[test]
    fn test_field_kind_resolution() {
        let config = DmsConfig::default();
        let text = FieldDefinition::string("Name", "");
        assert_eq!(
            FieldKind::from_definition(&text, "m", 1, &config).unwrap(),
            FieldKind::Text {
                max_length: 100,
                uppercase: false
            }
        );

        let upper = FieldDefinition::string("Code", "").with_length(3).uppercased();
        let kind = FieldKind::from_definition(&upper, "m", 2, &config).unwrap();
        assert!(kind.is_uppercase());
        assert_eq!(kind.type_name(), "string");
    }

    #[test]
    fn test_uppercase_flag_ignored_for_non_string() {
        let config = DmsConfig::default();
        let def = FieldDefinition::integer("ID", "").uppercased();
        let kind = FieldKind::from_definition(&def, "m", 1, &config).unwrap();
        assert_eq!(kind, FieldKind::Integer);
        assert!(!kind.is_uppercase());
    }

    #[test]
    fn test_unknown_field_type_is_an_error() {
        let config = DmsConfig::default();
        let def = FieldDefinition::with_type("boolean", "Flag", "");
        let err = FieldKind::from_definition(&def, "mdt9", 4, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFieldType { ref mdt_id, position: 4, ref type_name }
                if mdt_id == "mdt9" && type_name == "boolean"
        ));
    }

    #[test]
    fn test_parallel_partners() {
        let mdt = mdt1();
        assert_eq!(
            mdt.parallel_partners("Friends ID"),
            Some(vec!["Friends Name".to_string()])
        );
        assert_eq!(
            mdt.parallel_partners("Friends Name"),
            Some(vec!["Friends ID".to_string()])
        );
        assert_eq!(mdt.parallel_partners("Required Date"), None);
        assert_eq!(mdt.parallel_partners("Unknown"), None);
        assert!(mdt.is_parallel("Friends ID"));
    }

    #[test]
    fn test_index_value_representations() {
        let config = DmsConfig::default();
        let date = IndexValue::Date(NaiveDate::from_ymd_opt(2012, 3, 7).unwrap());
        assert_eq!(date.canonical(), "2012-03-07");
        assert_eq!(date.display(&config), "07/03/2012");
        assert_eq!(IndexValue::Integer(123).to_string(), "123");
        assert!(IndexValue::Text(String::new()).is_empty());
        assert!(!IndexValue::Integer(0).is_empty());
    }

    #[test]
    fn test_document_accepts_legacy_index_key() {
        let json = r#"{
            "code": "ADL-0001",
            "docrule_id": "2",
            "creation_date": "2012-03-06",
            "mdt_indexes": {"Employee Name": "Iurii Garmash"},
            "revisions": ["1", "2"]
        }"#;
        let doc: IndexedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.index("Employee Name"), Some("Iurii Garmash"));
        assert_eq!(doc.revisions.len(), 2);
    }
}
