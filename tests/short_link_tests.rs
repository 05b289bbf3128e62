//! Short link allocation and resolution tests

mod common;

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use foodgram::config::LinksConfig;
use foodgram::errors::FoodgramError;
use foodgram::services::{CodeGenerator, ShortLinkService};

use common::{TestEnv, create_recipe, register, seed_ingredients, seed_tag, setup};

const BASE: &str = "http://foodgram.test";

// =============================================================================
// Test Setup
// =============================================================================

/// 依次返回预设短码，用完后重复最后一个
struct ScriptedGenerator {
    codes: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedGenerator {
    fn new(codes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            last: Mutex::new(codes.last().map(|c| c.to_string()).unwrap_or_default()),
        })
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        match self.codes.lock().unwrap().pop_front() {
            Some(code) => {
                *self.last.lock().unwrap() = code.clone();
                code
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

fn links_config(max_attempts: u32) -> LinksConfig {
    LinksConfig {
        max_attempts,
        ..LinksConfig::default()
    }
}

fn scripted_service(env: &TestEnv, codes: &[&str], max_attempts: u32) -> ShortLinkService {
    ShortLinkService::with_generator(
        env.storage.clone(),
        &links_config(max_attempts),
        ScriptedGenerator::new(codes),
    )
    .expect("valid links config")
}

/// 创建 n 个菜谱，返回 id
async fn seed_recipes(env: &TestEnv, n: usize) -> Vec<i32> {
    let author = register(env, "author").await;
    let tag = seed_tag(env, "misc").await;
    let ing = seed_ingredients(env, &[("water", "ml")]).await;
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let record = create_recipe(env, &author, &format!("Recipe {}", i), tag, &[(ing[0].id, 100)]).await;
        ids.push(record.recipe.id);
    }
    ids
}

// =============================================================================
// Allocation
// =============================================================================

#[tokio::test]
async fn test_link_is_idempotent_per_recipe() {
    let env = setup("links_idempotent").await;
    let ids = seed_recipes(&env, 1).await;

    let first = env
        .short_link_service
        .get_or_create_link(ids[0], BASE)
        .await
        .unwrap();
    let second = env
        .short_link_service
        .get_or_create_link(ids[0], BASE)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.code.chars().count(), 3);
    assert_eq!(first.short_url, format!("{}/s/{}", BASE, first.code));
    assert_eq!(first.original_url, format!("{}/recipes/{}", BASE, ids[0]));
    assert_eq!(env.storage.count_short_links().await.unwrap(), 1);
}

#[tokio::test]
async fn test_distinct_recipes_get_distinct_codes() {
    let env = setup("links_distinct").await;
    let ids = seed_recipes(&env, 20).await;

    let mut codes = HashSet::new();
    for id in &ids {
        let link = env
            .short_link_service
            .get_or_create_link(*id, BASE)
            .await
            .unwrap();
        assert!(env.short_link_service.is_valid_code(&link.code));
        codes.insert(link.code);
    }
    assert_eq!(codes.len(), ids.len());
    assert_eq!(env.storage.count_short_links().await.unwrap(), ids.len() as u64);
}

#[tokio::test]
async fn test_collision_draws_another_code() {
    let env = setup("links_collision").await;
    let ids = seed_recipes(&env, 2).await;

    let first = scripted_service(&env, &["aaa"], 5)
        .get_or_create_link(ids[0], BASE)
        .await
        .unwrap();
    assert_eq!(first.code, "aaa");

    let second = scripted_service(&env, &["aaa", "aaa", "bbb"], 5)
        .get_or_create_link(ids[1], BASE)
        .await
        .unwrap();
    assert_eq!(second.code, "bbb");
}

#[tokio::test]
async fn test_exhausted_attempts_report_error() {
    let env = setup("links_exhausted").await;
    let ids = seed_recipes(&env, 2).await;

    scripted_service(&env, &["zzz"], 1)
        .get_or_create_link(ids[0], BASE)
        .await
        .unwrap();

    let err = scripted_service(&env, &["zzz"], 3)
        .get_or_create_link(ids[1], BASE)
        .await
        .unwrap_err();
    assert!(matches!(err, FoodgramError::AllocationExhausted(_)));
    assert_eq!(env.storage.count_short_links().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_recipe_is_not_found() {
    let env = setup("links_missing").await;
    let err = env
        .short_link_service
        .get_or_create_link(4242, BASE)
        .await
        .unwrap_err();
    assert!(matches!(err, FoodgramError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_link() {
    let env = setup("links_concurrent").await;
    let ids = seed_recipes(&env, 1).await;
    let service = env.short_link_service.clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let id = ids[0];
            tokio::spawn(async move { service.get_or_create_link(id, BASE).await })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        codes.insert(handle.await.unwrap().unwrap().code);
    }
    assert_eq!(codes.len(), 1);
    assert_eq!(env.storage.count_short_links().await.unwrap(), 1);
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_returns_original_url() {
    let env = setup("links_resolve").await;
    let ids = seed_recipes(&env, 1).await;
    let link = env
        .short_link_service
        .get_or_create_link(ids[0], BASE)
        .await
        .unwrap();

    let target = env.short_link_service.resolve(&link.code).await.unwrap();
    assert_eq!(target, link.original_url);

    // 第二次走缓存
    let cached = env.short_link_service.resolve(&link.code).await.unwrap();
    assert_eq!(cached, target);
}

#[tokio::test]
async fn test_resolve_unknown_and_malformed_codes() {
    let env = setup("links_unknown").await;

    for code in ["xyz", "", "a-b", "toolongcodetoolongcodetoolongcode"] {
        let err = env.short_link_service.resolve(code).await.unwrap_err();
        assert!(matches!(err, FoodgramError::NotFound(_)), "code {:?}", code);
    }
}

#[tokio::test]
async fn test_deleted_recipe_link_stops_resolving() {
    let env = setup("links_deleted").await;
    let author = register(&env, "owner").await;
    let tag = seed_tag(&env, "misc").await;
    let ing = seed_ingredients(&env, &[("oil", "ml")]).await;
    let record = create_recipe(&env, &author, "Fries", tag, &[(ing[0].id, 30)]).await;

    let link = env
        .short_link_service
        .get_or_create_link(record.recipe.id, BASE)
        .await
        .unwrap();
    env.short_link_service.resolve(&link.code).await.unwrap();

    env.recipe_service
        .delete(author.id, record.recipe.id)
        .await
        .unwrap();

    let err = env.short_link_service.resolve(&link.code).await.unwrap_err();
    assert!(matches!(err, FoodgramError::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let env = setup("links_config").await;
    let bad = [
        LinksConfig {
            code_length: 0,
            ..LinksConfig::default()
        },
        LinksConfig {
            alphabet: String::new(),
            ..LinksConfig::default()
        },
        LinksConfig {
            max_attempts: 0,
            ..LinksConfig::default()
        },
    ];

    for config in &bad {
        let result = ShortLinkService::new(env.storage.clone(), config);
        assert!(matches!(result, Err(FoodgramError::Validation(_))));
    }
}
