//! 标签与配料（只读，不分页）

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web;

use crate::errors::FoodgramError;
use crate::storage::SeaOrmStorage;

use super::helpers::{ApiResult, json_response};
use super::types::{IngredientQuery, IngredientResponse, TagResponse};

/// GET /tags/
pub async fn list_tags(storage: web::Data<Arc<SeaOrmStorage>>) -> ApiResult {
    let tags: Vec<TagResponse> = storage
        .list_tags()
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();
    Ok(json_response(StatusCode::OK, &tags))
}

/// GET /tags/{id}/
pub async fn get_tag(path: web::Path<i32>, storage: web::Data<Arc<SeaOrmStorage>>) -> ApiResult {
    let tag_id = path.into_inner();
    let tag = storage
        .find_tag(tag_id)
        .await?
        .ok_or_else(|| FoodgramError::not_found(format!("Tag {} not found", tag_id)))?;
    Ok(json_response(StatusCode::OK, &TagResponse::from(tag)))
}

/// GET /ingredients/?name=
pub async fn list_ingredients(
    query: web::Query<IngredientQuery>,
    storage: web::Data<Arc<SeaOrmStorage>>,
) -> ApiResult {
    let items: Vec<IngredientResponse> = storage
        .list_ingredients(query.name.as_deref())
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();
    Ok(json_response(StatusCode::OK, &items))
}

/// GET /ingredients/{id}/
pub async fn get_ingredient(
    path: web::Path<i32>,
    storage: web::Data<Arc<SeaOrmStorage>>,
) -> ApiResult {
    let ingredient_id = path.into_inner();
    let item = storage
        .find_ingredient(ingredient_id)
        .await?
        .ok_or_else(|| {
            FoodgramError::not_found(format!("Ingredient {} not found", ingredient_id))
        })?;
    Ok(json_response(StatusCode::OK, &IngredientResponse::from(item)))
}
