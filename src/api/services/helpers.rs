//! API 帮助函数：错误响应、分页、站点地址

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::config::get_config;
use crate::errors::FoodgramError;
use crate::storage::models::PageRequest;

use super::error_code::ErrorCode;
use super::types::{ErrorBody, PaginatedResponse};

pub type ApiResult = Result<HttpResponse, FoodgramError>;

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ErrorBody {
            code: code as i32,
            message: message.to_string(),
        })
}

/// 从 FoodgramError 构建错误响应（内部错误不暴露细节）
pub fn error_from_foodgram(err: &FoodgramError) -> HttpResponse {
    let status = err.http_status();
    if err.is_internal() {
        error!("{} [{}]: {}", err.error_type(), err.code(), err.message());
        return error_response(status, ErrorCode::from(err), "Internal server error");
    }
    error_response(status, ErrorCode::from(err), err.message())
}

impl ResponseError for FoodgramError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        error_from_foodgram(self)
    }
}

/// JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 请求的站点根地址，例如 `http://localhost:8080`
pub fn request_base_url(req: &HttpRequest) -> String {
    if let Some(base) = get_config()
        .links
        .public_base_url
        .as_deref()
        .filter(|b| !b.is_empty())
    {
        return base.trim_end_matches('/').to_string();
    }
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// 由 `page`、`limit` 参数得到分页请求
///
/// 偏移量 `(page - 1) * limit` 超出 i64 时返回 Validation 错误
pub fn page_request(page: Option<u64>, limit: Option<u64>) -> Result<PageRequest, FoodgramError> {
    let api = &get_config().api;
    let max_limit = api.max_page_size.clamp(1, i64::MAX as u64);
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(api.page_size).clamp(1, max_limit);

    let offset_fits = (page - 1)
        .checked_mul(limit)
        .is_some_and(|offset| offset <= i64::MAX as u64);
    if !offset_fits {
        return Err(FoodgramError::validation(format!("Invalid page: {}", page)));
    }
    Ok(PageRequest { page, limit })
}

/// 替换当前 URL 中的 page 参数
fn page_url(req: &HttpRequest, page: u64) -> Option<String> {
    let info = req.connection_info();
    let raw = format!("{}://{}{}", info.scheme(), info.host(), req.uri());
    let mut url = url::Url::parse(&raw).ok()?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        if page > 1 {
            pairs.append_pair("page", &page.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Some(url.to_string())
}

/// 组装 `{count, next, previous, results}`
pub fn paginated<T: Serialize>(
    req: &HttpRequest,
    page: PageRequest,
    total: u64,
    results: Vec<T>,
) -> PaginatedResponse<T> {
    let last_page = total.div_ceil(page.limit).max(1);
    let next = (page.page < last_page)
        .then(|| page_url(req, page.page + 1))
        .flatten();
    let previous = (page.page > 1)
        .then(|| page_url(req, (page.page - 1).min(last_page)))
        .flatten();

    PaginatedResponse {
        count: total,
        next,
        previous,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_paginated_links() {
        let req = TestRequest::get()
            .uri("/api/recipes/?limit=2&page=2&tags=lunch")
            .insert_header(("Host", "food.test"))
            .to_http_request();
        let page = PageRequest { page: 2, limit: 2 };
        let body = paginated(&req, page, 5, vec![1, 2]);

        assert_eq!(body.count, 5);
        assert_eq!(
            body.next.as_deref(),
            Some("http://food.test/api/recipes/?limit=2&tags=lunch&page=3")
        );
        assert_eq!(
            body.previous.as_deref(),
            Some("http://food.test/api/recipes/?limit=2&tags=lunch")
        );
    }

    #[test]
    fn test_single_page_has_no_links() {
        let req = TestRequest::get()
            .uri("/api/users/")
            .to_http_request();
        let body = paginated(&req, PageRequest { page: 1, limit: 6 }, 3, vec!["a"]);
        assert!(body.next.is_none());
        assert!(body.previous.is_none());
    }

    #[test]
    fn test_page_request_rejects_oversized_offset() {
        let page = page_request(Some(3), Some(2)).expect("small page");
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 2);

        let first = page_request(Some(0), None).expect("page clamps to 1");
        assert_eq!(first.page, 1);

        assert!(matches!(
            page_request(Some(u64::MAX), Some(100)),
            Err(FoodgramError::Validation(_))
        ));
        assert!(matches!(
            page_request(Some(i64::MAX as u64 + 2), Some(1)),
            Err(FoodgramError::Validation(_))
        ));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let resp = error_from_foodgram(&FoodgramError::database_operation("secret sql"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
