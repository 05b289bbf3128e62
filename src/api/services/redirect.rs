use std::sync::Arc;

use actix_web::{HttpResponse, web};
use tracing::{debug, trace};

use crate::services::ShortLinkService;

use super::helpers::ApiResult;

pub struct RedirectService;

impl RedirectService {
    /// GET /s/{code}/ -> 302 到菜谱地址
    pub async fn handle_redirect(
        path: web::Path<String>,
        links: web::Data<Arc<ShortLinkService>>,
    ) -> ApiResult {
        let code = path.into_inner();
        trace!("Redirect request for code: {}", code);

        let target = links.resolve(&code).await?;
        debug!("Redirecting {} -> {}", code, target);
        Ok(HttpResponse::Found()
            .insert_header(("Location", target))
            .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
            .finish())
    }
}

/// 短链接跳转路由 `/s`
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("/s")
        .route("/{code}/", web::get().to(RedirectService::handle_redirect))
        .route("/{code}/", web::head().to(RedirectService::handle_redirect))
}
