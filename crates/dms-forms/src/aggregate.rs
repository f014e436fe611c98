//! Template aggregation: every MDT bound to a document type merged into one
//! ordered field list.
//!
//! Templates are concatenated, never merged by name: two templates declaring
//! the same label contribute two fields. Order is template order (as returned
//! by the store), then field position within each template.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, trace};

use dms_core::{DmsConfig, Error, FieldKind, MetadataTemplate, Result, TemplateStore};

/// One field of the aggregated set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedField {
    /// Zero-based position in the concatenation.
    pub ordinal: usize,
    /// Field label (`field_name` in the template).
    pub label: String,
    pub help_text: String,
    pub kind: FieldKind,
    /// Template the field came from.
    pub mdt_id: String,
    /// Position inside the source template.
    pub position: u32,
}

/// Ordered fields of every template bound to a document type.
///
/// Rebuilt per request; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedFieldSet {
    template_ids: Vec<String>,
    fields: Vec<AggregatedField>,
}

impl AggregatedFieldSet {
    pub fn fields(&self) -> &[AggregatedField] {
        &self.fields
    }

    /// Ids of the contributing templates, in aggregation order.
    pub fn template_ids(&self) -> &[String] {
        &self.template_ids
    }

    /// True when templates exist but declare no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field_by_label(&self, label: &str) -> Option<&AggregatedField> {
        self.fields.iter().find(|f| f.label == label)
    }
}

/// Concatenate the fields of `templates` in order.
///
/// Fails with [`Error::UnsupportedFieldType`] on the first field whose type
/// tag is unknown.
pub fn aggregate_templates(
    templates: &[MetadataTemplate],
    config: &DmsConfig,
) -> Result<AggregatedFieldSet> {
    let mut set = AggregatedFieldSet::default();

    for template in templates {
        set.template_ids.push(template.id.clone());
        for (position, def) in &template.fields {
            let kind = FieldKind::from_definition(def, &template.id, *position, config)?;
            trace!(
                mdt_id = %template.id,
                position,
                field = %def.field_name,
                kind = kind.type_name(),
                "Aggregating field"
            );
            set.fields.push(AggregatedField {
                ordinal: set.fields.len(),
                label: def.field_name.clone(),
                help_text: def.description.clone(),
                kind,
                mdt_id: template.id.clone(),
                position: *position,
            });
        }
    }

    Ok(set)
}

/// Aggregate every template bound to `docrule_id`.
///
/// No bound templates is reported as [`Error::NoTemplatesConfigured`], distinct
/// from templates that declare no fields (an empty set).
pub async fn aggregate<S>(store: &S, docrule_id: &str, config: &DmsConfig) -> Result<AggregatedFieldSet>
where
    S: TemplateStore + ?Sized,
{
    let start = Instant::now();
    let templates = store.get_templates_for_docrule(docrule_id).await?;

    if templates.is_empty() {
        debug!(
            subsystem = "forms",
            component = "aggregator",
            docrule_id,
            "No metadata templates found"
        );
        return Err(Error::NoTemplatesConfigured {
            docrule_id: docrule_id.to_string(),
        });
    }

    let set = aggregate_templates(&templates, config)?;
    debug!(
        subsystem = "forms",
        component = "aggregator",
        op = "aggregate",
        docrule_id,
        template_count = templates.len(),
        field_count = set.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Aggregated metadata templates"
    );
    Ok(set)
}

/// Aggregate a single template selected by id.
pub async fn aggregate_template<S>(
    store: &S,
    mdt_id: &str,
    config: &DmsConfig,
) -> Result<(MetadataTemplate, AggregatedFieldSet)>
where
    S: TemplateStore + ?Sized,
{
    let template = store
        .get_template(mdt_id)
        .await?
        .ok_or_else(|| Error::TemplateNotFound(mdt_id.to_string()))?;
    let set = aggregate_templates(std::slice::from_ref(&template), config)?;
    debug!(
        subsystem = "forms",
        component = "aggregator",
        op = "aggregate_template",
        mdt_id,
        field_count = set.len(),
        "Aggregated single metadata template"
    );
    Ok((template, set))
}
