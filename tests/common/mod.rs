//! Shared setup for integration tests
//!
//! Each test gets its own SQLite file inside a `TempDir`; keep the returned
//! `TestEnv` alive for the duration of the test.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use tempfile::TempDir;

use foodgram::config::init_config;
use foodgram::runtime::lifetime::StartupContext;
use foodgram::services::{RecipeInput, RegisterInput};
use foodgram::storage::StorageFactory;
use foodgram::storage::models::{IngredientSeed, RecipeRecord, TagSeed};
use foodgram::services::recipe_service::IngredientAmountInput;

use migration::entities::{ingredient, user};

static INIT: Once = Once::new();

pub fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

pub struct TestEnv {
    pub ctx: StartupContext,
    _dir: TempDir,
}

impl std::ops::Deref for TestEnv {
    type Target = StartupContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

pub async fn setup(name: &str) -> TestEnv {
    init_static_config();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join(format!("{}.db", name));
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = StorageFactory::create_with_url(&db_url)
        .await
        .expect("Failed to create storage");
    let ctx = StartupContext::from_storage(Arc::clone(&storage)).expect("Failed to build services");

    TestEnv { ctx, _dir: dir }
}

pub async fn register(env: &TestEnv, username: &str) -> user::Model {
    env.user_service
        .register(RegisterInput {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "s3cret-pass".to_string(),
        })
        .await
        .expect("Failed to register user")
}

/// 导入配料并按名称返回
pub async fn seed_ingredients(env: &TestEnv, items: &[(&str, &str)]) -> Vec<ingredient::Model> {
    let seeds = items
        .iter()
        .map(|(name, unit)| IngredientSeed {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .collect();
    env.storage
        .import_ingredients(seeds)
        .await
        .expect("Failed to import ingredients");

    let all = env.storage.list_ingredients(None).await.unwrap();
    items
        .iter()
        .map(|(name, unit)| {
            all.iter()
                .find(|i| i.name == *name && i.measurement_unit == *unit)
                .cloned()
                .expect("ingredient was imported")
        })
        .collect()
}

pub async fn seed_tag(env: &TestEnv, slug: &str) -> i32 {
    env.storage
        .import_tags(vec![TagSeed {
            name: slug.to_uppercase(),
            slug: slug.to_string(),
        }])
        .await
        .unwrap();
    env.storage
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.slug == slug)
        .map(|t| t.id)
        .expect("tag was imported")
}

pub fn recipe_input(name: &str, tag: i32, ingredients: &[(i32, i64)]) -> RecipeInput {
    RecipeInput {
        ingredients: Some(
            ingredients
                .iter()
                .map(|(id, amount)| IngredientAmountInput {
                    id: *id,
                    amount: *amount,
                })
                .collect(),
        ),
        tags: Some(vec![tag]),
        image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
        name: Some(name.to_string()),
        text: Some(format!("How to cook {}", name)),
        cooking_time: Some(15),
    }
}

pub async fn create_recipe(
    env: &TestEnv,
    author: &user::Model,
    name: &str,
    tag: i32,
    ingredients: &[(i32, i64)],
) -> RecipeRecord {
    env.recipe_service
        .create(author.id, recipe_input(name, tag, ingredients))
        .await
        .expect("Failed to create recipe")
}
