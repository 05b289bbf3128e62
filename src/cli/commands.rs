use std::path::Path;

use colored::Colorize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::StaticConfig;
use crate::errors::{FoodgramError, Result};
use crate::storage::SeaOrmStorage;
use crate::storage::models::{IngredientSeed, TagSeed};

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

fn read_json<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FoodgramError::file_operation(format!("Failed to read {}: {}", path, e)))?;
    serde_json::from_str(&content).map_err(|e| {
        FoodgramError::serialization(format!("Invalid JSON in {}: {}", path, e))
    })
}

/// 导入食材和标签，已存在的记录跳过
///
/// 返回 (新增食材数, 新增标签数)
pub async fn load_data(
    storage: &SeaOrmStorage,
    ingredients_path: &str,
    tags_path: Option<&str>,
) -> Result<(u64, u64)> {
    let ingredients: Vec<IngredientSeed> = read_json(ingredients_path)?;
    let read_count = ingredients.len();
    let inserted_ingredients = storage.import_ingredients(ingredients).await?;
    info!(
        "Loaded {} of {} ingredients from {}",
        inserted_ingredients, read_count, ingredients_path
    );

    let inserted_tags = match tags_path {
        Some(path) => {
            let tags: Vec<TagSeed> = read_json(path)?;
            let inserted = storage.import_tags(tags).await?;
            info!("Loaded {} tags from {}", inserted, path);
            inserted
        }
        None => 0,
    };

    println!(
        "{} {} ingredients, {} tags",
        "Imported".green().bold(),
        inserted_ingredients,
        inserted_tags
    );
    Ok((inserted_ingredients, inserted_tags))
}

/// 写出示例配置
pub fn generate_config(output_path: Option<&str>) -> Result<()> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_PATH);
    if Path::new(path).exists() {
        return Err(FoodgramError::file_operation(format!(
            "{} already exists",
            path
        )));
    }
    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| FoodgramError::file_operation(e.to_string()))?;
    println!("{} {}", "Sample configuration written to".green(), path);
    Ok(())
}
