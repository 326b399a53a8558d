//! Service wiring.

use std::sync::Arc;

use filetree_core::config::AppConfig;
use filetree_core::result::AppResult;
use filetree_core::traits::BlobStore;
use filetree_database::{DatabasePool, NodeRepository};
use filetree_service::{
    DashboardService, LifecycleService, NodeService, PathResolver, TreeIntegrity,
};
use filetree_storage::LocalBlobStore;

/// Every service a command may need, sharing one pool and one blob store.
#[derive(Debug, Clone)]
pub struct App {
    pub config: AppConfig,
    pub nodes: NodeService,
    pub lifecycle: LifecycleService,
    pub paths: PathResolver,
    pub dashboard: DashboardService,
}

impl App {
    /// Connect to the node store and blob store described by `config`.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let pool = DatabasePool::connect(&config.database).await?;
        let repo: Arc<dyn NodeRepository> = Arc::new(pool.node_repository());
        let blobs: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(&config.storage.root_path).await?);
        Ok(Self::wire(config, repo, blobs))
    }

    /// Build the services over already-constructed stores.
    pub fn wire(
        config: AppConfig,
        repo: Arc<dyn NodeRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let integrity = TreeIntegrity::new(repo.clone(), config.tree.max_depth);
        Self {
            nodes: NodeService::new(
                repo.clone(),
                blobs.clone(),
                integrity.clone(),
                config.storage.clone(),
            ),
            lifecycle: LifecycleService::new(
                repo.clone(),
                blobs,
                integrity.clone(),
                config.tree.clone(),
            ),
            paths: PathResolver::new(integrity),
            dashboard: DashboardService::new(repo),
            config,
        }
    }
}
