//! Server mode
//!
//! Configures the HTTP server with the API, redirect and health routes.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, NormalizePath, TrailingSlash},
    web,
};
use anyhow::Result;
use tracing::info;

use crate::api::middleware::TokenAuth;
use crate::api::services::{api_routes, health_routes, redirect_routes};
use crate::config::get_config;
use crate::errors::FoodgramError;
use crate::runtime::lifetime::{self, StartupContext};

/// 请求体上限
const JSON_LIMIT_BYTES: usize = 2 * 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| FoodgramError::validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| FoodgramError::validation(err.to_string()).into())
}

/// 注册共享状态与全部路由
pub fn configure(ctx: StartupContext) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(ctx.storage))
            .app_data(web::Data::new(ctx.user_service))
            .app_data(web::Data::new(ctx.recipe_service))
            .app_data(web::Data::new(ctx.relation_service))
            .app_data(web::Data::new(ctx.shopping_service))
            .app_data(web::Data::new(ctx.short_link_service))
            .service(api_routes())
            .service(health_routes())
            .service(redirect_routes());
    }
}

/// 启动 HTTP 服务器，直到收到关闭信号
pub async fn run_server() -> Result<()> {
    let config = get_config();
    let startup = lifetime::prepare_server_startup().await?;

    let cpu_count = config.server.cpu_count.max(1);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let storage_for_shutdown = startup.storage.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TokenAuth)
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(Compress::default())
            .configure(configure(startup.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    info!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&storage_for_shutdown) => {
            info!("Graceful shutdown completed");
        }
    }

    Ok(())
}
