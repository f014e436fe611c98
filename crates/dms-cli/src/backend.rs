//! Store selection: a JSON fixture file or a PostgreSQL database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use dms_core::DmsConfig;
use dms_db::{Database, MemoryStore, PoolConfig};
use dms_search::SearchService;

/// Where templates and documents live for this invocation.
pub enum Backend {
    /// In-memory store loaded from, and written back to, a JSON file.
    Fixture {
        store: Arc<MemoryStore>,
        path: PathBuf,
    },
    Postgres(Database),
}

impl Backend {
    /// Open the fixture file when given, the database otherwise.
    pub async fn open(
        data: Option<&Path>,
        database_url: Option<&str>,
        config: &DmsConfig,
    ) -> anyhow::Result<Self> {
        match (data, database_url) {
            (Some(path), _) => {
                let store = MemoryStore::load(path)
                    .await
                    .with_context(|| format!("loading fixture {}", path.display()))?
                    .with_config(config.clone());
                info!(
                    subsystem = "cli",
                    component = "backend",
                    path = %path.display(),
                    "Using fixture store"
                );
                Ok(Self::Fixture {
                    store: Arc::new(store),
                    path: path.to_path_buf(),
                })
            }
            (None, Some(url)) => {
                let db = Database::connect_with_config(url, PoolConfig::from_env())
                    .await
                    .context("connecting to database")?
                    .with_config(config.clone());
                info!(subsystem = "cli", component = "backend", "Using PostgreSQL store");
                Ok(Self::Postgres(db))
            }
            (None, None) => bail!("no store configured: pass --data <FILE> or set DATABASE_URL"),
        }
    }

    pub fn service(&self, config: DmsConfig) -> SearchService {
        match self {
            Self::Fixture { store, .. } => SearchService::from_store(store.clone()),
            Self::Postgres(db) => SearchService::new(
                Arc::new(db.templates.clone()),
                Arc::new(db.documents.clone()),
            ),
        }
        .with_config(config)
    }

    /// Write fixture contents back to their file. No-op for PostgreSQL.
    pub async fn persist(&self) -> anyhow::Result<()> {
        if let Self::Fixture { store, path } = self {
            store
                .save(path)
                .await
                .with_context(|| format!("writing fixture {}", path.display()))?;
        }
        Ok(())
    }

    /// Apply schema migrations. Only meaningful for PostgreSQL.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        match self {
            Self::Postgres(db) => {
                db.migrate().await.context("running migrations")?;
                Ok(())
            }
            Self::Fixture { .. } => bail!("migrations apply to PostgreSQL only"),
        }
    }
}
