//! PostgreSQL template store.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use dms_core::{Error, MetadataTemplate, Result, TemplateStore};

/// PostgreSQL implementation of [`TemplateStore`].
///
/// Templates are returned in insertion order (`seq`); replacing a template
/// keeps its original position.
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: Pool<Postgres>,
}

impl PgTemplateStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_template(row: &PgRow) -> Result<MetadataTemplate> {
    Ok(MetadataTemplate {
        id: row.get("id"),
        description: row.get("description"),
        docrule_id: row.get::<Vec<String>, _>("docrule_ids"),
        fields: serde_json::from_value(row.get("fields"))?,
        parallel: serde_json::from_value(row.get("parallel"))?,
    })
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn get_templates_for_docrule(&self, docrule_id: &str) -> Result<Vec<MetadataTemplate>> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, docrule_ids, fields, parallel
            FROM metadata_template
            WHERE $1 = ANY(docrule_ids)
            ORDER BY seq
            "#,
        )
        .bind(docrule_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "templates",
            docrule_id,
            result_count = rows.len(),
            "Fetched templates for document type"
        );
        rows.iter().map(row_to_template).collect()
    }

    async fn get_template(&self, mdt_id: &str) -> Result<Option<MetadataTemplate>> {
        let row = sqlx::query(
            r#"
            SELECT id, description, docrule_ids, fields, parallel
            FROM metadata_template
            WHERE id = $1
            "#,
        )
        .bind(mdt_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(row_to_template).transpose()
    }

    async fn save_template(&self, template: MetadataTemplate) -> Result<()> {
        let fields = serde_json::to_value(&template.fields)?;
        let parallel = serde_json::to_value(&template.parallel)?;

        sqlx::query(
            r#"
            INSERT INTO metadata_template (id, description, docrule_ids, fields, parallel)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                description = EXCLUDED.description,
                docrule_ids = EXCLUDED.docrule_ids,
                fields = EXCLUDED.fields,
                parallel = EXCLUDED.parallel,
                updated_at_utc = now()
            "#,
        )
        .bind(&template.id)
        .bind(&template.description)
        .bind(&template.docrule_id)
        .bind(fields)
        .bind(parallel)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "templates",
            mdt_id = %template.id,
            field_count = template.fields.len(),
            "Saved metadata template"
        );
        Ok(())
    }

    async fn delete_template(&self, mdt_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM metadata_template WHERE id = $1")
            .bind(mdt_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
