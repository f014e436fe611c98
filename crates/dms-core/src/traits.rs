//! Store traits for the external template and document databases.
//!
//! These traits define the boundary contracts the form and search layers
//! rely on, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{IndexedDocument, MetadataTemplate, SecondaryIndexMap};
use crate::search::SearchPredicateSet;

// =============================================================================
// TEMPLATE STORE
// =============================================================================

/// Storage of metadata templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Every template bound to the document type, in insertion order.
    async fn get_templates_for_docrule(&self, docrule_id: &str) -> Result<Vec<MetadataTemplate>>;

    /// Fetch one template by id.
    async fn get_template(&self, mdt_id: &str) -> Result<Option<MetadataTemplate>>;

    /// Insert or replace a template.
    async fn save_template(&self, template: MetadataTemplate) -> Result<()>;

    /// Delete a template. Deleting a missing template is not an error.
    async fn delete_template(&self, mdt_id: &str) -> Result<()>;
}

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Storage of indexed documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of the type matching every predicate in the set.
    async fn find_documents(
        &self,
        docrule_id: &str,
        predicates: &SearchPredicateSet,
    ) -> Result<Vec<IndexedDocument>>;

    /// Secondary indexes of documents whose `field_label` value starts with `prefix`.
    async fn find_by_field_prefix(
        &self,
        docrule_id: &str,
        field_label: &str,
        prefix: &str,
    ) -> Result<Vec<SecondaryIndexMap>>;

    /// Insert or replace a document, keyed by code.
    async fn save_document(&self, document: IndexedDocument) -> Result<()>;

    /// Fetch one document by code.
    async fn get_document(&self, code: &str) -> Result<Option<IndexedDocument>>;

    /// Every stored document ordered by code.
    async fn list_documents(&self) -> Result<Vec<IndexedDocument>>;
}
