//! Indexing support: building stored documents and spotting new parallel keys.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use dms_core::defaults::NEW_KEY_WARNING;
use dms_core::{DocumentStore, IndexedDocument, MetadataTemplate, Result, SecondaryIndexMap};
use dms_forms::NormalizedIndexSet;

/// A parallel field value no earlier document of the type carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIndexKey {
    pub label: String,
    pub value: String,
}

impl fmt::Display for NewIndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", NEW_KEY_WARNING, self.label, self.value)
    }
}

/// Report each submitted parallel value that is new for the document type.
///
/// Fields are checked in template order; only fields in a parallel group
/// are considered.
pub async fn detect_new_keys<S>(
    store: &S,
    templates: &[MetadataTemplate],
    docrule_id: &str,
    indexes: &SecondaryIndexMap,
) -> Result<Vec<NewIndexKey>>
where
    S: DocumentStore + ?Sized,
{
    let mut new_keys = Vec::new();

    for template in templates {
        for def in template.fields.values() {
            let label = &def.field_name;
            if !template.is_parallel(label) || new_keys.iter().any(|k: &NewIndexKey| &k.label == label) {
                continue;
            }
            let Some(value) = indexes.get(label).filter(|v| !v.is_empty()) else {
                continue;
            };

            let hits = store.find_by_field_prefix(docrule_id, label, value).await?;
            let seen = hits
                .iter()
                .any(|h| h.get(label).is_some_and(|v| v == value));
            if !seen {
                let key = NewIndexKey {
                    label: label.clone(),
                    value: value.clone(),
                };
                warn!(
                    subsystem = "search",
                    component = "indexing",
                    docrule_id,
                    field = %key.label,
                    "{}",
                    key
                );
                new_keys.push(key);
            }
        }
    }

    Ok(new_keys)
}

/// Assemble the stored document for a normalized submission.
pub fn build_document(
    code: &str,
    docrule_id: &str,
    creation_date: NaiveDate,
    normalized: &NormalizedIndexSet,
) -> IndexedDocument {
    IndexedDocument {
        code: code.to_string(),
        docrule_id: docrule_id.to_string(),
        creation_date,
        description: normalized.description.clone().unwrap_or_default(),
        secondary_indexes: normalized.to_secondary_indexes(),
        revisions: Vec::new(),
    }
}
