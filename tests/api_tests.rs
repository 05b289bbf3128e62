//! HTTP API integration tests
//!
//! Runs the full route table with token auth and path normalization.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::test::{self, TestRequest};
use actix_web::App;
use serde_json::{Value, json};

use foodgram::api::middleware::TokenAuth;
use foodgram::runtime::modes::server::configure;

use common::{TestEnv, seed_ingredients, seed_tag, setup};

// =============================================================================
// Test Setup
// =============================================================================

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .wrap(TokenAuth)
                .wrap(NormalizePath::new(TrailingSlash::Always))
                .configure(configure($env.ctx.clone())),
        )
        .await
    };
}

fn auth(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Token {}", token))
}

/// 注册并登录，返回 (用户 id, 令牌)
async fn signup(env: &TestEnv, username: &str) -> (i32, String) {
    let user = common::register(env, username).await;
    let token = env
        .user_service
        .login(&user.email, "s3cret-pass")
        .await
        .expect("login succeeds");
    (user.id, token)
}

fn recipe_body(tag: i32, ingredients: &[(i32, i64)]) -> Value {
    json!({
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({"id": id, "amount": amount}))
            .collect::<Vec<_>>(),
        "tags": [tag],
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "name": "Pancakes",
        "text": "Mix and fry",
        "cooking_time": 20
    })
}

// =============================================================================
// Users & tokens
// =============================================================================

#[actix_rt::test]
async fn test_register_login_and_me() {
    let env = setup("api_users").await;
    let app = init_app!(env);

    let req = TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "Vasya@Example.com",
            "username": "vasya",
            "first_name": "Vasya",
            "last_name": "Pupkin",
            "password": "Qwerty123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["email"], "vasya@example.com");
    assert!(body.get("password").is_none());

    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "vasya@example.com", "password": "Qwerty123!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["auth_token"].as_str().unwrap().to_string();

    let req = TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "vasya");
    assert_eq!(body["is_subscribed"], false);

    let req = TestRequest::post()
        .uri("/api/auth/token/logout/")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_me_requires_authentication() {
    let env = setup("api_me_anon").await;
    let app = init_app!(env);

    let req = TestRequest::get().uri("/api/users/me/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_bad_credentials_and_malformed_json() {
    let env = setup("api_bad_login").await;
    let app = init_app!(env);
    signup(&env, "alice").await;

    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "alice@example.com", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_subscribe_flow() {
    let env = setup("api_subscribe").await;
    let app = init_app!(env);
    let (reader_id, reader) = signup(&env, "reader").await;
    let (author_id, _) = signup(&env, "author").await;

    let uri = format!("/api/users/{}/subscribe/", author_id);
    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], author_id);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 0);

    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", reader_id))
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::get()
        .uri("/api/users/subscriptions/")
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);

    let req = TestRequest::delete()
        .uri(&uri)
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_rt::test]
async fn test_oversized_recipes_limit_is_rejected() {
    let env = setup("api_recipes_limit").await;
    let app = init_app!(env);
    let (_, reader) = signup(&env, "reader").await;
    let (author_id, _) = signup(&env, "author").await;

    let req = TestRequest::post()
        .uri(&format!(
            "/api/users/{}/subscribe/?recipes_limit=18446744073709551615",
            author_id
        ))
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/?recipes_limit=4294967295", author_id))
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = TestRequest::get()
        .uri("/api/users/subscriptions/?recipes_limit=9223372036854775808")
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::get()
        .uri("/api/users/subscriptions/?recipes_limit=1")
        .insert_header(auth(&reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Recipes
// =============================================================================

#[actix_rt::test]
async fn test_oversized_page_is_rejected() {
    let env = setup("api_huge_page").await;
    let app = init_app!(env);
    let (_, token) = signup(&env, "pager").await;

    for uri in [
        "/api/recipes/?page=9223372036854775809&limit=1",
        "/api/recipes/?page=18446744073709551615&limit=100",
        "/api/users/?page=18446744073709551615",
    ] {
        let req = TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    let req = TestRequest::get()
        .uri("/api/users/subscriptions/?page=18446744073709551615")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 超出末页但偏移量合法时返回空结果
    let req = TestRequest::get().uri("/api/recipes/?page=1000&limit=6").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
async fn test_create_recipe_and_list() {
    let env = setup("api_recipes").await;
    let app = init_app!(env);
    let (_, token) = signup(&env, "chef").await;
    let tag = seed_tag(&env, "breakfast").await;
    let ing = seed_ingredients(&env, &[("flour", "g"), ("milk", "ml")]).await;

    let req = TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(auth(&token))
        .set_json(recipe_body(tag, &[(ing[0].id, 200), (ing[1].id, 300)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["tags"][0]["slug"], "breakfast");
    assert_eq!(body["is_favorited"], false);

    let req = TestRequest::get()
        .uri("/api/recipes/?tags=breakfast")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());

    let req = TestRequest::get().uri("/api/recipes/?tags=dinner").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["count"], 0);
}

#[actix_rt::test]
async fn test_create_recipe_validation() {
    let env = setup("api_recipe_validation").await;
    let app = init_app!(env);
    let (_, token) = signup(&env, "chef").await;
    let tag = seed_tag(&env, "lunch").await;
    let ing = seed_ingredients(&env, &[("rice", "g")]).await;

    for body in [
        recipe_body(tag, &[(ing[0].id, 0)]),
        recipe_body(tag, &[]),
        recipe_body(tag, &[(ing[0].id, 10), (ing[0].id, 20)]),
        recipe_body(tag, &[(9999, 10)]),
    ] {
        let req = TestRequest::post()
            .uri("/api/recipes/")
            .insert_header(auth(&token))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = TestRequest::post()
        .uri("/api/recipes/")
        .set_json(recipe_body(tag, &[(ing[0].id, 10)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_only_author_can_modify() {
    let env = setup("api_recipe_author").await;
    let app = init_app!(env);
    let (author_id, _) = signup(&env, "chef").await;
    let (_, other) = signup(&env, "other").await;
    let tag = seed_tag(&env, "soup").await;
    let ing = seed_ingredients(&env, &[("beet", "g")]).await;
    let author = env.user_service.get(author_id).await.unwrap();
    let record = common::create_recipe(&env, &author, "Borscht", tag, &[(ing[0].id, 300)]).await;

    let uri = format!("/api/recipes/{}/", record.recipe.id);
    let req = TestRequest::patch()
        .uri(&uri)
        .insert_header(auth(&other))
        .set_json(recipe_body(tag, &[(ing[0].id, 1)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::delete()
        .uri(&uri)
        .insert_header(auth(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::get().uri("/api/recipes/424242/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_favorite_and_cart_duplicates() {
    let env = setup("api_relations").await;
    let app = init_app!(env);
    let (user_id, token) = signup(&env, "chef").await;
    let tag = seed_tag(&env, "dessert").await;
    let ing = seed_ingredients(&env, &[("sugar", "g")]).await;
    let user = env.user_service.get(user_id).await.unwrap();
    let record = common::create_recipe(&env, &user, "Fudge", tag, &[(ing[0].id, 100)]).await;

    for kind in ["favorite", "shopping_cart"] {
        let uri = format!("/api/recipes/{}/{}/", record.recipe.id, kind);

        let req = TestRequest::post().uri(&uri).insert_header(auth(&token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], record.recipe.id);
        assert_eq!(body["cooking_time"], 15);

        let req = TestRequest::post().uri(&uri).insert_header(auth(&token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = TestRequest::delete().uri(&uri).insert_header(auth(&token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = TestRequest::delete().uri(&uri).insert_header(auth(&token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = TestRequest::post()
        .uri("/api/recipes/424242/favorite/")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Shopping list download & short links
// =============================================================================

#[actix_rt::test]
async fn test_download_shopping_cart() {
    let env = setup("api_download").await;
    let app = init_app!(env);
    let (user_id, token) = signup(&env, "buyer").await;
    let tag = seed_tag(&env, "breakfast").await;
    let ing = seed_ingredients(&env, &[("sugar", "g")]).await;
    let user = env.user_service.get(user_id).await.unwrap();
    let a = common::create_recipe(&env, &user, "Porridge", tag, &[(ing[0].id, 150)]).await;
    let b = common::create_recipe(&env, &user, "Cocoa", tag, &[(ing[0].id, 50)]).await;

    for record in [&a, &b] {
        let req = TestRequest::post()
            .uri(&format!("/api/recipes/{}/shopping_cart/", record.recipe.id))
            .insert_header(auth(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(auth(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("shopping_list.txt"));

    let body = test::read_body(resp).await;
    assert_eq!(body, "sugar 200 g\n");

    let req = TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_get_link_and_redirect() {
    let env = setup("api_links").await;
    let app = init_app!(env);
    let (user_id, _) = signup(&env, "chef").await;
    let tag = seed_tag(&env, "dinner").await;
    let ing = seed_ingredients(&env, &[("pasta", "g")]).await;
    let user = env.user_service.get(user_id).await.unwrap();
    let record = common::create_recipe(&env, &user, "Carbonara", tag, &[(ing[0].id, 200)]).await;

    let uri = format!("/api/recipes/{}/get-link/", record.recipe.id);
    let req = TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let short = body["short-link"].as_str().unwrap().to_string();
    assert!(short.contains("/s/"));

    let req = TestRequest::get().uri(&uri).to_request();
    let again: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(again["short-link"], short.as_str());

    let code = short.rsplit("/s/").next().unwrap().to_string();
    let req = TestRequest::get().uri(&format!("/s/{}", code)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.ends_with(&format!("/recipes/{}", record.recipe.id)));

    let swapped: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect();
    if swapped != code {
        let req = TestRequest::get().uri(&format!("/s/{}/", swapped)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let req = TestRequest::get().uri("/s/nope/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/api/recipes/424242/get-link/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Catalog & health
// =============================================================================

#[actix_rt::test]
async fn test_ingredient_prefix_search() {
    let env = setup("api_catalog").await;
    let app = init_app!(env);
    seed_ingredients(&env, &[("Sugar", "g"), ("salt", "g"), ("milk", "ml")]).await;

    let req = TestRequest::get().uri("/api/ingredients/?name=s").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Sugar"));
    assert!(names.contains(&"salt"));

    let req = TestRequest::get().uri("/api/tags/").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_health_endpoints() {
    let env = setup("api_health").await;
    let app = init_app!(env);

    let req = TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}
