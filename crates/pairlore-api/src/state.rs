//! Application state wiring the store and scheduler together.
//!
//! AppState holds the concrete instances used by the CLI commands. The
//! core components are generic over the store trait, but AppState pins
//! them to the SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use pairlore_core::retention::RetentionScheduler;
use pairlore_core::store::AssociationStore;
use pairlore_infra::config::{load_config, resolve_data_dir};
use pairlore_infra::sqlite::association::SqliteAssociationStore;
use pairlore_infra::sqlite::pool::DatabasePool;
use pairlore_types::config::PairloreConfig;

/// Shared application state holding the store and retention scheduler.
pub struct AppState {
    pub store: Arc<SqliteAssociationStore>,
    pub scheduler: Arc<RetentionScheduler<SqliteAssociationStore>>,
    pub config: PairloreConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: connect to the DB, arm the
    /// scheduler, and re-arm pending evictions.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("pairlore.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let store = Arc::new(SqliteAssociationStore::new(db_pool.clone()));
        let scheduler = Arc::new(RetentionScheduler::new(
            Arc::clone(&store),
            config.retention_interval(),
        ));
        scheduler.start()?;

        // Pending evictions are in-memory only and do not survive a
        // restart; re-arm one per persisted chat.
        let chats = store.list_chats().await?;
        for chat in &chats {
            scheduler.schedule(chat.id, None);
        }
        tracing::debug!(
            data_dir = %data_dir.display(),
            rearmed = chats.len(),
            "application state initialized"
        );

        Ok(Self {
            store,
            scheduler,
            config,
            data_dir,
        })
    }
}
