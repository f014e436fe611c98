//! # dms-db
//!
//! Storage adapters for metadata templates and indexed documents.
//!
//! This crate provides:
//! - [`MemoryStore`], an in-process store loadable from a JSON fixture
//! - PostgreSQL stores keeping secondary indexes in a JSONB column
//! - Connection pool management and schema migration
//!
//! ## Example
//!
//! ```rust,ignore
//! use dms_db::{Database, TemplateStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/dms").await?;
//!     let templates = db.templates.get_templates_for_docrule("2").await?;
//!     println!("{} templates", templates.len());
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod index_filter;
pub mod memory;
pub mod pool;
pub mod templates;

// Always compiled so integration tests (in tests/) and dependent crates can use the sample data
pub mod test_fixtures;

pub use dms_core::*;

pub use documents::PgDocumentStore;
pub use index_filter::{IndexFilterQueryBuilder, QueryParam};
pub use memory::{Fixture, MemoryStore};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use templates::PgTemplateStore;

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// PostgreSQL stores sharing one pool.
#[derive(Clone)]
pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
    pub templates: PgTemplateStore,
    pub documents: PgDocumentStore,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            templates: PgTemplateStore::new(pool.clone()),
            documents: PgDocumentStore::new(pool.clone()),
            pool,
        }
    }

    /// Evaluate date bounds with `config`.
    pub fn with_config(mut self, config: DmsConfig) -> Self {
        self.documents = self.documents.with_config(config);
        self
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
