//! 用户、令牌与订阅接口

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{info, trace};

use crate::api::middleware::{AuthUser, MaybeUser};
use crate::services::{RegisterInput, RelationService, UserService};

use super::helpers::{ApiResult, json_response, page_request, paginated};
use super::types::{
    CreatedUserResponse, ListQuery, LoginRequest, SetPasswordRequest, SubscriptionQuery,
    SubscriptionResponse, TokenResponse, UserResponse,
};

/// POST /users/
pub async fn register(
    body: web::Json<RegisterInput>,
    users: web::Data<Arc<UserService>>,
) -> ApiResult {
    let user = users.register(body.into_inner()).await?;
    Ok(json_response(
        StatusCode::CREATED,
        &CreatedUserResponse::from(user),
    ))
}

/// GET /users/
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<ListQuery>,
    viewer: MaybeUser,
    users: web::Data<Arc<UserService>>,
) -> ApiResult {
    let page = page_request(query.page, query.limit)?;
    let found = users.list(page).await?;
    let ids: Vec<i32> = found.items.iter().map(|u| u.id).collect();
    let subscribed = users.subscribed_among(viewer.id(), &ids).await?;
    trace!("list_users: {} of {}", found.items.len(), found.total);

    let results = found
        .items
        .iter()
        .map(|u| UserResponse::new(u, subscribed.contains(&u.id)))
        .collect();
    Ok(json_response(
        StatusCode::OK,
        &paginated(&req, page, found.total, results),
    ))
}

/// GET /users/{id}/
pub async fn get_user(
    path: web::Path<i32>,
    viewer: MaybeUser,
    users: web::Data<Arc<UserService>>,
) -> ApiResult {
    let user = users.get(path.into_inner()).await?;
    let subscribed = users.subscribed_among(viewer.id(), &[user.id]).await?;
    Ok(json_response(
        StatusCode::OK,
        &UserResponse::new(&user, subscribed.contains(&user.id)),
    ))
}

/// GET /users/me/
pub async fn me(AuthUser(user): AuthUser) -> ApiResult {
    Ok(json_response(StatusCode::OK, &UserResponse::new(&user, false)))
}

/// POST /users/set_password/
pub async fn set_password(
    AuthUser(user): AuthUser,
    body: web::Json<SetPasswordRequest>,
    users: web::Data<Arc<UserService>>,
) -> ApiResult {
    users
        .set_password(&user, &body.current_password, &body.new_password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /auth/token/login/
pub async fn login(body: web::Json<LoginRequest>, users: web::Data<Arc<UserService>>) -> ApiResult {
    let auth_token = users.login(&body.email, &body.password).await?;
    Ok(json_response(StatusCode::OK, &TokenResponse { auth_token }))
}

/// POST /auth/token/logout/
pub async fn logout(AuthUser(user): AuthUser, users: web::Data<Arc<UserService>>) -> ApiResult {
    users.logout(user.id).await?;
    info!("User {} logged out", user.id);
    Ok(HttpResponse::NoContent().finish())
}

/// GET /users/subscriptions/
pub async fn subscriptions(
    req: HttpRequest,
    AuthUser(user): AuthUser,
    query: web::Query<SubscriptionQuery>,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    let page = page_request(query.page, query.limit)?;
    let found = relations
        .subscriptions(user.id, page, query.recipes_limit)
        .await?;
    let results = found
        .items
        .into_iter()
        .map(SubscriptionResponse::from)
        .collect();
    Ok(json_response(
        StatusCode::OK,
        &paginated(&req, page, found.total, results),
    ))
}

/// POST /users/{id}/subscribe/
pub async fn subscribe(
    path: web::Path<i32>,
    AuthUser(user): AuthUser,
    query: web::Query<SubscriptionQuery>,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    let item = relations
        .subscribe(user.id, path.into_inner(), query.recipes_limit)
        .await?;
    Ok(json_response(
        StatusCode::CREATED,
        &SubscriptionResponse::from(item),
    ))
}

/// DELETE /users/{id}/subscribe/
pub async fn unsubscribe(
    path: web::Path<i32>,
    AuthUser(user): AuthUser,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    relations.unsubscribe(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
