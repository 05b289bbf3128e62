use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

use super::error_code::ErrorCode;
use super::helpers::{error_response, json_response};
use super::types::HealthResponse;

/// Health Service
///
/// 直接调用 storage，不经过业务层。
pub struct HealthService;

impl HealthService {
    /// 就绪检查：数据库可用返回 200，否则 503
    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        let start = Instant::now();
        match tokio::time::timeout(Duration::from_secs(5), storage.ping()).await {
            Ok(Ok(())) => {
                trace!("Readiness check passed");
                json_response(
                    StatusCode::OK,
                    &HealthResponse {
                        status: "healthy".to_string(),
                        storage: storage.backend_name().to_string(),
                        response_time_ms: start.elapsed().as_millis() as u64,
                    },
                )
            }
            Ok(Err(e)) => {
                error!("Readiness check failed: {}", e);
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::ServiceUnavailable,
                    "Storage unavailable",
                )
            }
            Err(_) => {
                error!("Readiness check timed out");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::ServiceUnavailable,
                    "Storage check timed out",
                )
            }
        }
    }

    /// 存活检查
    pub async fn liveness_check() -> impl Responder {
        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("OK")
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("/ready/", web::get().to(HealthService::readiness_check))
        .route("/ready/", web::head().to(HealthService::readiness_check))
        .route("/live/", web::get().to(HealthService::liveness_check))
        .route("/live/", web::head().to(HealthService::liveness_check))
}
