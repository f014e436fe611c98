//! PostgreSQL document store.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use dms_core::{
    DmsConfig, DocumentStore, Error, IndexedDocument, Result, SearchPredicateSet,
    SecondaryIndexMap,
};

use crate::escape_like;
use crate::index_filter::{IndexFilterQueryBuilder, QueryParam};

const DOCUMENT_COLUMNS: &str =
    "d.code, d.docrule_id, d.creation_date, d.description, d.secondary_indexes, d.revisions";

/// PostgreSQL implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Pool<Postgres>,
    config: DmsConfig,
}

impl PgDocumentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            config: DmsConfig::default(),
        }
    }

    /// Use `config` for the unbounded date floor and ceiling.
    pub fn with_config(mut self, config: DmsConfig) -> Self {
        self.config = config;
        self
    }
}

fn row_to_document(row: &PgRow) -> Result<IndexedDocument> {
    Ok(IndexedDocument {
        code: row.get("code"),
        docrule_id: row.get("docrule_id"),
        creation_date: row.get("creation_date"),
        description: row.get("description"),
        secondary_indexes: serde_json::from_value(row.get("secondary_indexes"))?,
        revisions: row.get::<Vec<String>, _>("revisions"),
    })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_documents(
        &self,
        docrule_id: &str,
        predicates: &SearchPredicateSet,
    ) -> Result<Vec<IndexedDocument>> {
        let start = Instant::now();
        let (filter_clause, filter_params) =
            IndexFilterQueryBuilder::new(predicates, &self.config, 1).build();

        let sql = format!(
            "SELECT {} FROM indexed_document d WHERE d.docrule_id = $1 AND {} ORDER BY d.code",
            DOCUMENT_COLUMNS, filter_clause
        );

        let mut q = sqlx::query(&sql).bind(docrule_id);
        for param in &filter_params {
            q = match param {
                QueryParam::String(s) => q.bind(s),
                QueryParam::Date(d) => q.bind(d),
            };
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let documents = rows.iter().map(row_to_document).collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "database",
            component = "documents",
            op = "find",
            docrule_id,
            predicate_count = predicates.predicates.len(),
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document search complete"
        );
        Ok(documents)
    }

    async fn find_by_field_prefix(
        &self,
        docrule_id: &str,
        field_label: &str,
        prefix: &str,
    ) -> Result<Vec<SecondaryIndexMap>> {
        let rows = sqlx::query(
            r#"
            SELECT d.secondary_indexes
            FROM indexed_document d
            WHERE d.docrule_id = $1
              AND d.secondary_indexes ->> $2 LIKE $3 ESCAPE '\'
            ORDER BY d.code
            "#,
        )
        .bind(docrule_id)
        .bind(field_label)
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                serde_json::from_value::<SecondaryIndexMap>(row.get("secondary_indexes"))
                    .map_err(Error::from)
            })
            .collect()
    }

    async fn save_document(&self, document: IndexedDocument) -> Result<()> {
        let indexes = serde_json::to_value(&document.secondary_indexes)?;

        sqlx::query(
            r#"
            INSERT INTO indexed_document (code, docrule_id, creation_date, description, secondary_indexes, revisions)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO UPDATE SET
                docrule_id = EXCLUDED.docrule_id,
                creation_date = EXCLUDED.creation_date,
                description = EXCLUDED.description,
                secondary_indexes = EXCLUDED.secondary_indexes,
                revisions = EXCLUDED.revisions,
                updated_at_utc = now()
            "#,
        )
        .bind(&document.code)
        .bind(&document.docrule_id)
        .bind(document.creation_date)
        .bind(&document.description)
        .bind(indexes)
        .bind(&document.revisions)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "documents",
            code = %document.code,
            docrule_id = %document.docrule_id,
            "Saved document"
        );
        Ok(())
    }

    async fn get_document(&self, code: &str) -> Result<Option<IndexedDocument>> {
        let sql = format!(
            "SELECT {} FROM indexed_document d WHERE d.code = $1",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        let sql = format!(
            "SELECT {} FROM indexed_document d ORDER BY d.code",
            DOCUMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(row_to_document).collect()
    }
}
