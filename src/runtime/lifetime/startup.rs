use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::get_config;
use crate::services::{
    RecipeService, RelationService, ShoppingListService, ShortLinkService, UserService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 服务器运行所需的共享状态
#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub user_service: Arc<UserService>,
    pub recipe_service: Arc<RecipeService>,
    pub relation_service: Arc<RelationService>,
    pub shopping_service: Arc<ShoppingListService>,
    pub short_link_service: Arc<ShortLinkService>,
}

impl StartupContext {
    /// 基于已有存储组装全部服务
    pub fn from_storage(storage: Arc<SeaOrmStorage>) -> crate::errors::Result<Self> {
        let config = get_config();
        let short_link_service = Arc::new(ShortLinkService::new(storage.clone(), &config.links)?);

        Ok(Self {
            user_service: Arc::new(UserService::new(storage.clone())),
            recipe_service: Arc::new(RecipeService::new(
                storage.clone(),
                short_link_service.clone(),
            )),
            relation_service: Arc::new(RelationService::new(storage.clone())),
            shopping_service: Arc::new(ShoppingListService::new(storage.clone())),
            short_link_service,
            storage,
        })
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let context =
        StartupContext::from_storage(storage).context("Failed to initialize services")?;

    match context.storage.count_short_links().await {
        Ok(count) => debug!("{} short links present", count),
        Err(e) => debug!("Failed to count short links: {}", e),
    }

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
