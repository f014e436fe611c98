//! In-memory template and document store.
//!
//! Backs the test suites and the CLI's fixture mode. A [`Fixture`] is the
//! JSON shape the store loads from and saves to.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use dms_core::{
    DmsConfig, DocumentStore, IndexedDocument, MetadataTemplate, Result, SearchPredicateSet,
    SecondaryIndexMap, TemplateStore,
};

/// Serialized contents of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub templates: Vec<MetadataTemplate>,
    #[serde(default)]
    pub documents: Vec<IndexedDocument>,
}

/// Store holding everything in process memory.
///
/// Templates keep insertion order; documents are ordered by code.
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: DmsConfig,
    templates: RwLock<Vec<MetadataTemplate>>,
    documents: RwLock<BTreeMap<String, IndexedDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` when evaluating date predicates.
    pub fn with_config(mut self, config: DmsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut templates: Vec<MetadataTemplate> = Vec::with_capacity(fixture.templates.len());
        for template in fixture.templates {
            match templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => *existing = template,
                None => templates.push(template),
            }
        }
        let documents = fixture
            .documents
            .into_iter()
            .map(|d| (d.code.clone(), d))
            .collect();

        Self {
            config: DmsConfig::default(),
            templates: RwLock::new(templates),
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON fixture file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        debug!(
            subsystem = "database",
            component = "memory",
            path = %path.display(),
            template_count = fixture.templates.len(),
            document_count = fixture.documents.len(),
            "Loaded fixture"
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Snapshot of the current contents.
    pub async fn to_fixture(&self) -> Fixture {
        Fixture {
            templates: self.templates.read().await.clone(),
            documents: self.documents.read().await.values().cloned().collect(),
        }
    }

    /// Write the current contents as pretty JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_fixture().await)?;
        tokio::fs::write(path.as_ref(), json).await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_templates_for_docrule(&self, docrule_id: &str) -> Result<Vec<MetadataTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .filter(|t| t.applies_to(docrule_id))
            .cloned()
            .collect())
    }

    async fn get_template(&self, mdt_id: &str) -> Result<Option<MetadataTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.id == mdt_id)
            .cloned())
    }

    async fn save_template(&self, template: MetadataTemplate) -> Result<()> {
        let mut templates = self.templates.write().await;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
        Ok(())
    }

    async fn delete_template(&self, mdt_id: &str) -> Result<()> {
        self.templates.write().await.retain(|t| t.id != mdt_id);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_documents(
        &self,
        docrule_id: &str,
        predicates: &SearchPredicateSet,
    ) -> Result<Vec<IndexedDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.docrule_id == docrule_id && predicates.matches(d, &self.config))
            .cloned()
            .collect())
    }

    async fn find_by_field_prefix(
        &self,
        docrule_id: &str,
        field_label: &str,
        prefix: &str,
    ) -> Result<Vec<SecondaryIndexMap>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.docrule_id == docrule_id)
            .filter(|d| d.index(field_label).is_some_and(|v| v.starts_with(prefix)))
            .map(|d| d.secondary_indexes.clone())
            .collect())
    }

    async fn save_document(&self, document: IndexedDocument) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(document.code.clone(), document);
        Ok(())
    }

    async fn get_document(&self, code: &str) -> Result<Option<IndexedDocument>> {
        Ok(self.documents.read().await.get(code).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }
}
