//! 菜谱接口：CRUD、收藏、购物车、短链接、购物清单下载

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, trace};

use crate::api::middleware::{AuthUser, MaybeUser};
use crate::services::shopping_list::SHOPPING_LIST_FILENAME;
use crate::services::{
    RecipeInput, RecipeService, RelationService, ShoppingListService, ShortLinkService,
};
use crate::storage::RelationKind;
use crate::storage::models::{PageRequest, RecipeFilter};

use super::helpers::{ApiResult, json_response, page_request, paginated, request_base_url};
use super::types::{RecipeResponse, ShortLinkResponse, ShortRecipeResponse};

/// 列表查询参数（`tags` 可重复，无法用 `web::Query` 直接反序列化）
#[derive(Debug, Default)]
pub struct RecipeListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeListParams {
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => params.page = value.parse().ok(),
                "limit" => params.limit = value.parse().ok(),
                "author" => params.author = value.parse().ok(),
                "tags" if !value.is_empty() => params.tags.push(value.into_owned()),
                "is_favorited" => params.is_favorited = is_truthy(&value),
                "is_in_shopping_cart" => params.is_in_shopping_cart = is_truthy(&value),
                _ => {}
            }
        }
        params
    }

    /// 收藏/购物车过滤只对登录用户生效
    pub fn to_filter(&self, viewer: Option<i32>) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            favorited_by: viewer.filter(|_| self.is_favorited),
            in_cart_of: viewer.filter(|_| self.is_in_shopping_cart),
        }
    }

    pub fn page(&self) -> crate::errors::Result<PageRequest> {
        page_request(self.page, self.limit)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

/// GET /recipes/
pub async fn list_recipes(
    req: HttpRequest,
    viewer: MaybeUser,
    recipes: web::Data<Arc<RecipeService>>,
) -> ApiResult {
    let params = RecipeListParams::parse(req.query_string());
    let page = params.page()?;
    let found = recipes.list(&params.to_filter(viewer.id()), page).await?;
    trace!("list_recipes: {:?} -> {}", params, found.total);

    let results: Vec<RecipeResponse> = recipes
        .annotate(viewer.id(), found.items)
        .await?
        .into_iter()
        .map(RecipeResponse::from)
        .collect();
    Ok(json_response(
        StatusCode::OK,
        &paginated(&req, page, found.total, results),
    ))
}

/// GET /recipes/{id}/
pub async fn get_recipe(
    path: web::Path<i32>,
    viewer: MaybeUser,
    recipes: web::Data<Arc<RecipeService>>,
) -> ApiResult {
    let record = recipes.get(path.into_inner()).await?;
    respond_with_recipe(StatusCode::OK, viewer.id(), record, &recipes).await
}

/// POST /recipes/
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    body: web::Json<RecipeInput>,
    recipes: web::Data<Arc<RecipeService>>,
) -> ApiResult {
    let record = recipes.create(user.id, body.into_inner()).await?;
    respond_with_recipe(StatusCode::CREATED, Some(user.id), record, &recipes).await
}

/// PATCH /recipes/{id}/
pub async fn update_recipe(
    path: web::Path<i32>,
    AuthUser(user): AuthUser,
    body: web::Json<RecipeInput>,
    recipes: web::Data<Arc<RecipeService>>,
) -> ApiResult {
    let record = recipes
        .update(user.id, path.into_inner(), body.into_inner())
        .await?;
    respond_with_recipe(StatusCode::OK, Some(user.id), record, &recipes).await
}

/// DELETE /recipes/{id}/
pub async fn delete_recipe(
    path: web::Path<i32>,
    AuthUser(user): AuthUser,
    recipes: web::Data<Arc<RecipeService>>,
) -> ApiResult {
    recipes.delete(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn respond_with_recipe(
    status: StatusCode,
    viewer: Option<i32>,
    record: crate::storage::models::RecipeRecord,
    recipes: &RecipeService,
) -> ApiResult {
    let view = recipes
        .annotate(viewer, vec![record])
        .await?
        .pop()
        .map(RecipeResponse::from);
    Ok(json_response(status, &view))
}

/// POST /recipes/{id}/favorite/
pub async fn add_favorite(
    path: web::Path<i32>,
    user: AuthUser,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    add_relation(RelationKind::Favorite, path.into_inner(), user, &relations).await
}

/// DELETE /recipes/{id}/favorite/
pub async fn remove_favorite(
    path: web::Path<i32>,
    user: AuthUser,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    remove_relation(RelationKind::Favorite, path.into_inner(), user, &relations).await
}

/// POST /recipes/{id}/shopping_cart/
pub async fn add_to_cart(
    path: web::Path<i32>,
    user: AuthUser,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    add_relation(RelationKind::ShoppingCart, path.into_inner(), user, &relations).await
}

/// DELETE /recipes/{id}/shopping_cart/
pub async fn remove_from_cart(
    path: web::Path<i32>,
    user: AuthUser,
    relations: web::Data<Arc<RelationService>>,
) -> ApiResult {
    remove_relation(RelationKind::ShoppingCart, path.into_inner(), user, &relations).await
}

async fn add_relation(
    kind: RelationKind,
    recipe_id: i32,
    AuthUser(user): AuthUser,
    relations: &RelationService,
) -> ApiResult {
    let recipe = relations.add(kind, user.id, recipe_id).await?;
    Ok(json_response(
        StatusCode::CREATED,
        &ShortRecipeResponse::from(recipe),
    ))
}

async fn remove_relation(
    kind: RelationKind,
    recipe_id: i32,
    AuthUser(user): AuthUser,
    relations: &RelationService,
) -> ApiResult {
    relations.remove(kind, user.id, recipe_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /recipes/{id}/get-link/
pub async fn get_link(
    req: HttpRequest,
    path: web::Path<i32>,
    links: web::Data<Arc<ShortLinkService>>,
) -> ApiResult {
    let base_url = request_base_url(&req);
    let link = links
        .get_or_create_link(path.into_inner(), &base_url)
        .await?;
    debug!("get-link: recipe {} -> {}", link.recipe_id, link.code);
    Ok(json_response(
        StatusCode::OK,
        &ShortLinkResponse {
            short_link: link.short_url,
        },
    ))
}

/// GET /recipes/download_shopping_cart/
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    shopping: web::Data<Arc<ShoppingListService>>,
) -> ApiResult {
    let body = shopping.render_for(user.id).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                SHOPPING_LIST_FILENAME.to_string(),
            )],
        })
        .body(body))
}
