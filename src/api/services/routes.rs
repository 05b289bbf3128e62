//! API 路由配置
//!
//! 所有路径以 `/` 结尾（服务器使用 `NormalizePath` 统一补全）。

use actix_web::web;

use super::catalog::{get_ingredient, get_tag, list_ingredients, list_tags};
use super::recipes::{
    add_favorite, add_to_cart, create_recipe, delete_recipe, download_shopping_cart, get_link,
    get_recipe, list_recipes, remove_favorite, remove_from_cart, update_recipe,
};
use super::users::{
    get_user, list_users, login, logout, me, register, set_password, subscribe, subscriptions,
    unsubscribe,
};

/// 用户路由 `/users`
///
/// 固定路径必须在 `/{id}/` 之前注册
pub fn users_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("/", web::get().to(list_users))
        .route("/", web::post().to(register))
        .route("/me/", web::get().to(me))
        .route("/set_password/", web::post().to(set_password))
        .route("/subscriptions/", web::get().to(subscriptions))
        .route(r"/{id:\d+}/", web::get().to(get_user))
        .route(r"/{id:\d+}/subscribe/", web::post().to(subscribe))
        .route(r"/{id:\d+}/subscribe/", web::delete().to(unsubscribe))
}

/// 令牌路由 `/auth/token`
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth/token")
        .route("/login/", web::post().to(login))
        .route("/logout/", web::post().to(logout))
}

pub fn tags_routes() -> actix_web::Scope {
    web::scope("/tags")
        .route("/", web::get().to(list_tags))
        .route(r"/{id:\d+}/", web::get().to(get_tag))
}

pub fn ingredients_routes() -> actix_web::Scope {
    web::scope("/ingredients")
        .route("/", web::get().to(list_ingredients))
        .route(r"/{id:\d+}/", web::get().to(get_ingredient))
}

/// 菜谱路由 `/recipes`
///
/// 包含：
/// - GET/POST /recipes/ - 列表、创建
/// - GET /recipes/download_shopping_cart/ - 下载购物清单
/// - GET/PATCH/DELETE /recipes/{id}/
/// - POST/DELETE /recipes/{id}/favorite/、/recipes/{id}/shopping_cart/
/// - GET /recipes/{id}/get-link/
pub fn recipes_routes() -> actix_web::Scope {
    web::scope("/recipes")
        .route("/", web::get().to(list_recipes))
        .route("/", web::post().to(create_recipe))
        .route(
            "/download_shopping_cart/",
            web::get().to(download_shopping_cart),
        )
        .route(r"/{id:\d+}/", web::get().to(get_recipe))
        .route(r"/{id:\d+}/", web::patch().to(update_recipe))
        .route(r"/{id:\d+}/", web::delete().to(delete_recipe))
        .route(r"/{id:\d+}/favorite/", web::post().to(add_favorite))
        .route(r"/{id:\d+}/favorite/", web::delete().to(remove_favorite))
        .route(r"/{id:\d+}/shopping_cart/", web::post().to(add_to_cart))
        .route(
            r"/{id:\d+}/shopping_cart/",
            web::delete().to(remove_from_cart),
        )
        .route(r"/{id:\d+}/get-link/", web::get().to(get_link))
}

/// `/api` 下的全部路由
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(users_routes())
        .service(auth_routes())
        .service(tags_routes())
        .service(ingredients_routes())
        .service(recipes_routes())
}
