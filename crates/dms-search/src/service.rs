//! Search orchestration over the template and document stores.
//!
//! Each call performs the full request flow: aggregate the templates,
//! render the form, normalize the submission, build predicates and query
//! the document store.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use dms_core::{
    DmsConfig, DocumentStore, Error, IndexedDocument, MetadataTemplate, Result, SearchPredicateSet,
    TemplateStore,
};
use dms_forms::{
    aggregate, aggregate_template, aggregate_templates, normalize, render, FormMode, InitialValues, RenderedForm,
    SubmittedIndexSet,
};

use crate::indexing::{build_document, detect_new_keys, NewIndexKey};
use crate::parallel::{self, FieldValues, ParallelSuggestions, Suggestions};
use crate::predicates::build_predicates;

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub predicates: SearchPredicateSet,
    /// Human readable criteria, creation date first.
    pub criteria: Vec<String>,
    pub documents: Vec<IndexedDocument>,
}

/// Result of indexing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexOutcome {
    pub document: IndexedDocument,
    /// Parallel values seen for the first time under the document type.
    pub new_keys: Vec<NewIndexKey>,
}

/// Form, search, suggestion and indexing operations bound to two stores.
#[derive(Clone)]
pub struct SearchService {
    templates: Arc<dyn TemplateStore>,
    documents: Arc<dyn DocumentStore>,
    config: DmsConfig,
}

impl SearchService {
    pub fn new(templates: Arc<dyn TemplateStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            templates,
            documents,
            config: DmsConfig::default(),
        }
    }

    /// Service over a single store implementing both traits.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TemplateStore + DocumentStore + 'static,
    {
        Self::new(store.clone(), store)
    }

    pub fn with_config(mut self, config: DmsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    /// Render the form of every template bound to `docrule_id`.
    pub async fn form(
        &self,
        docrule_id: &str,
        mode: FormMode,
        initial: Option<&InitialValues>,
    ) -> Result<RenderedForm> {
        let set = aggregate(self.templates.as_ref(), docrule_id, &self.config).await?;
        Ok(render(&set, initial, mode))
    }

    /// Render the search form of a single template.
    pub async fn template_form(
        &self,
        mdt_id: &str,
        initial: Option<&InitialValues>,
    ) -> Result<(MetadataTemplate, RenderedForm)> {
        let (template, set) =
            aggregate_template(self.templates.as_ref(), mdt_id, &self.config).await?;
        Ok((template, render(&set, initial, FormMode::Search)))
    }

    /// Search documents of `docrule_id`.
    ///
    /// Fails with `NoSearchCriteria` when nothing constrains the search and
    /// `confirmed_all` is false.
    pub async fn search(
        &self,
        docrule_id: &str,
        submitted: &SubmittedIndexSet,
        confirmed_all: bool,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();
        let form = self.form(docrule_id, FormMode::Search, None).await?;
        let predicates = self.predicates_for(&form, submitted, confirmed_all)?;
        let documents = self.documents.find_documents(docrule_id, &predicates).await?;

        info!(
            subsystem = "search",
            component = "service",
            op = "search",
            docrule_id,
            predicate_count = predicates.predicates.len(),
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(self.outcome(predicates, documents))
    }

    /// Search with the fields of one template across every document type it
    /// is bound to. Results are merged by code, first occurrence kept.
    pub async fn search_template(
        &self,
        mdt_id: &str,
        submitted: &SubmittedIndexSet,
        confirmed_all: bool,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();
        let (template, form) = self.template_form(mdt_id, None).await?;
        let predicates = self.predicates_for(&form, submitted, confirmed_all)?;

        let mut documents: Vec<IndexedDocument> = Vec::new();
        for docrule_id in &template.docrule_id {
            for doc in self.documents.find_documents(docrule_id, &predicates).await? {
                if !documents.iter().any(|d| d.code == doc.code) {
                    documents.push(doc);
                }
            }
        }

        info!(
            subsystem = "search",
            component = "service",
            op = "search_template",
            mdt_id,
            docrule_count = template.docrule_id.len(),
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Template search complete"
        );
        Ok(self.outcome(predicates, documents))
    }

    fn predicates_for(
        &self,
        form: &RenderedForm,
        submitted: &SubmittedIndexSet,
        confirmed_all: bool,
    ) -> Result<SearchPredicateSet> {
        let normalized = normalize(form, submitted, &self.config);
        let creation = submitted.creation_range(&self.config)?;
        let predicates = build_predicates(&normalized, creation.from, creation.to, &self.config)?;
        predicates.require_criteria(confirmed_all)?;
        Ok(predicates)
    }

    fn outcome(&self, predicates: SearchPredicateSet, documents: Vec<IndexedDocument>) -> SearchOutcome {
        SearchOutcome {
            criteria: predicates.describe(&self.config),
            predicates,
            documents,
        }
    }

    /// Parallel partner values for a partially typed field value.
    pub async fn resolve_parallel(
        &self,
        docrule_id: &str,
        field_label: &str,
        partial_value: &str,
    ) -> Result<ParallelSuggestions> {
        let templates = self.templates.get_templates_for_docrule(docrule_id).await?;
        parallel::resolve_parallel(
            self.documents.as_ref(),
            &templates,
            docrule_id,
            field_label,
            partial_value,
        )
        .await
    }

    /// Distinct values of the field itself.
    pub async fn suggest_values(
        &self,
        docrule_id: &str,
        field_label: &str,
        partial_value: &str,
    ) -> Result<FieldValues> {
        let templates = self.templates.get_templates_for_docrule(docrule_id).await?;
        parallel::suggest_values(
            self.documents.as_ref(),
            &templates,
            docrule_id,
            field_label,
            partial_value,
        )
        .await
    }

    /// Parallel suggestions for grouped fields, single-key values otherwise.
    pub async fn suggest(
        &self,
        docrule_id: &str,
        field_label: &str,
        partial_value: &str,
    ) -> Result<Suggestions> {
        let templates = self.templates.get_templates_for_docrule(docrule_id).await?;
        parallel::suggest(
            self.documents.as_ref(),
            &templates,
            docrule_id,
            field_label,
            partial_value,
        )
        .await
    }

    /// Validate a submission and store it as document `code`.
    ///
    /// The creation date comes from the `date` key, or `today`. Replacing an
    /// existing document keeps its revisions.
    pub async fn index_document(
        &self,
        docrule_id: &str,
        code: &str,
        submitted: &SubmittedIndexSet,
        today: NaiveDate,
    ) -> Result<IndexOutcome> {
        let templates = self.templates.get_templates_for_docrule(docrule_id).await?;
        if templates.is_empty() {
            return Err(Error::NoTemplatesConfigured {
                docrule_id: docrule_id.to_string(),
            });
        }
        let form = render(
            &aggregate_templates(&templates, &self.config)?,
            None,
            FormMode::Index,
        );
        let normalized = normalize(&form, submitted, &self.config);
        normalized.validate()?;

        let creation_date = submitted.creation_date(&self.config, today)?;
        let mut document = build_document(code, docrule_id, creation_date, &normalized);
        let new_keys = detect_new_keys(
            self.documents.as_ref(),
            &templates,
            docrule_id,
            &document.secondary_indexes,
        )
        .await?;

        if let Some(existing) = self.documents.get_document(code).await? {
            document.revisions = existing.revisions;
        }
        self.documents.save_document(document.clone()).await?;

        info!(
            subsystem = "search",
            component = "service",
            op = "index",
            docrule_id,
            code,
            field_count = document.secondary_indexes.len(),
            new_key_count = new_keys.len(),
            "Document indexed"
        );
        Ok(IndexOutcome { document, new_keys })
    }
}
