//! Recipe business logic
//!
//! Validation depends on [`RecipeWriteMode`]: creation needs every field,
//! a partial update only needs the ingredient and tag sets.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::errors::{FoodgramError, Result};
use crate::services::ShortLinkService;
use crate::storage::models::{
    IngredientAmount, NewRecipe, Page, PageRequest, RecipeChanges, RecipeFilter, RecipeRecord,
};
use crate::storage::{RelationKind, SeaOrmStorage};

/// 菜谱名称最大长度
pub const RECIPE_NAME_MAX_LEN: usize = 256;

/// 写操作类型，决定哪些字段必填
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeWriteMode {
    Create,
    Update,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountInput {
    pub id: i32,
    pub amount: i64,
}

/// 客户端提交的菜谱（未校验）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmountInput>>,
    #[serde(default)]
    pub tags: Option<Vec<i32>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<i64>,
}

/// 校验通过的写入内容
#[derive(Debug, Clone)]
pub struct ValidatedRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

impl RecipeInput {
    /// 不访问数据库的字段校验
    pub fn validate(self, mode: RecipeWriteMode) -> Result<ValidatedRecipe> {
        let ingredients = self
            .ingredients
            .filter(|items| !items.is_empty())
            .ok_or_else(|| FoodgramError::validation("ingredients: at least one is required"))?;
        let tags = self
            .tags
            .filter(|items| !items.is_empty())
            .ok_or_else(|| FoodgramError::validation("tags: at least one is required"))?;

        let mut seen = HashSet::new();
        let mut amounts = Vec::with_capacity(ingredients.len());
        for item in ingredients {
            if !seen.insert(item.id) {
                return Err(FoodgramError::validation(format!(
                    "ingredients: ingredient {} is listed twice",
                    item.id
                )));
            }
            let amount = i32::try_from(item.amount)
                .ok()
                .filter(|a| *a >= 1)
                .ok_or_else(|| {
                    FoodgramError::validation(format!(
                        "ingredients: amount of ingredient {} must be at least 1",
                        item.id
                    ))
                })?;
            amounts.push(IngredientAmount {
                ingredient_id: item.id,
                amount,
            });
        }

        let mut seen_tags = HashSet::new();
        if let Some(dup) = tags.iter().find(|t| !seen_tags.insert(**t)) {
            return Err(FoodgramError::validation(format!(
                "tags: tag {} is listed twice",
                dup
            )));
        }

        let required = mode == RecipeWriteMode::Create;
        let name = check_optional(self.name, "name", required)?;
        if let Some(name) = &name
            && name.chars().count() > RECIPE_NAME_MAX_LEN
        {
            return Err(FoodgramError::validation(format!(
                "name: at most {} characters",
                RECIPE_NAME_MAX_LEN
            )));
        }
        let text = check_optional(self.text, "text", required)?;
        let image = check_optional(self.image, "image", required)?;

        let cooking_time = match self.cooking_time {
            Some(value) => Some(
                i32::try_from(value)
                    .ok()
                    .filter(|v| *v >= 1)
                    .ok_or_else(|| {
                        FoodgramError::validation("cooking_time: must be at least 1")
                    })?,
            ),
            None if required => {
                return Err(FoodgramError::validation("cooking_time: this field is required"));
            }
            None => None,
        };

        Ok(ValidatedRecipe {
            name,
            text,
            image,
            cooking_time,
            ingredients: amounts,
            tags,
        })
    }
}

/// 字符串字段：提供时不得为空白，`required` 时必须提供
fn check_optional(value: Option<String>, field: &str, required: bool) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(FoodgramError::validation(format!(
            "{}: may not be blank",
            field
        ))),
        Some(v) => Ok(Some(v)),
        None if required => Err(FoodgramError::validation(format!(
            "{}: this field is required",
            field
        ))),
        None => Ok(None),
    }
}

/// 带当前用户视角标记的菜谱
#[derive(Debug, Clone)]
pub struct RecipeView {
    pub record: RecipeRecord,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub author_subscribed: bool,
}

pub struct RecipeService {
    storage: Arc<SeaOrmStorage>,
    short_links: Arc<ShortLinkService>,
}

impl RecipeService {
    pub fn new(storage: Arc<SeaOrmStorage>, short_links: Arc<ShortLinkService>) -> Self {
        Self {
            storage,
            short_links,
        }
    }

    pub async fn create(&self, author_id: i32, input: RecipeInput) -> Result<RecipeRecord> {
        let valid = input.validate(RecipeWriteMode::Create)?;
        self.check_references(&valid).await?;

        let (Some(name), Some(text), Some(image), Some(cooking_time)) =
            (valid.name, valid.text, valid.image, valid.cooking_time)
        else {
            return Err(FoodgramError::validation("missing required recipe fields"));
        };

        let recipe_id = self
            .storage
            .create_recipe(
                author_id,
                NewRecipe {
                    name,
                    text,
                    image,
                    cooking_time,
                    ingredients: valid.ingredients,
                    tags: valid.tags,
                },
            )
            .await?;
        self.get(recipe_id).await
    }

    /// 仅作者可修改
    pub async fn update(
        &self,
        user_id: i32,
        recipe_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeRecord> {
        self.ensure_author(user_id, recipe_id).await?;
        let valid = input.validate(RecipeWriteMode::Update)?;
        self.check_references(&valid).await?;

        self.storage
            .update_recipe(
                recipe_id,
                RecipeChanges {
                    name: valid.name,
                    text: valid.text,
                    image: valid.image,
                    cooking_time: valid.cooking_time,
                    ingredients: valid.ingredients,
                    tags: valid.tags,
                },
            )
            .await?;
        self.get(recipe_id).await
    }

    /// 仅作者可删除
    pub async fn delete(&self, user_id: i32, recipe_id: i32) -> Result<()> {
        self.ensure_author(user_id, recipe_id).await?;
        if self.storage.delete_recipe(recipe_id).await? {
            // 短链接随菜谱级联删除
            self.short_links.invalidate_cache();
            info!("Recipe {} deleted by user {}", recipe_id, user_id);
        }
        Ok(())
    }

    pub async fn get(&self, recipe_id: i32) -> Result<RecipeRecord> {
        self.storage
            .recipe_record(recipe_id)
            .await?
            .ok_or_else(|| FoodgramError::not_found(format!("Recipe {} not found", recipe_id)))
    }

    pub async fn list(&self, filter: &RecipeFilter, page: PageRequest) -> Result<Page<RecipeRecord>> {
        self.storage.list_recipes(filter, page).await
    }

    /// 为查看者标注收藏、购物车、订阅状态；匿名用户全部为 false
    pub async fn annotate(
        &self,
        viewer: Option<i32>,
        records: Vec<RecipeRecord>,
    ) -> Result<Vec<RecipeView>> {
        let Some(viewer_id) = viewer else {
            return Ok(records
                .into_iter()
                .map(|record| RecipeView {
                    record,
                    is_favorited: false,
                    is_in_shopping_cart: false,
                    author_subscribed: false,
                })
                .collect());
        };

        let recipe_ids: Vec<i32> = records.iter().map(|r| r.recipe.id).collect();
        let author_ids: Vec<i32> = records.iter().map(|r| r.author.id).collect();
        let favorited = self
            .storage
            .marked_recipes(RelationKind::Favorite, viewer_id, &recipe_ids)
            .await?;
        let in_cart = self
            .storage
            .marked_recipes(RelationKind::ShoppingCart, viewer_id, &recipe_ids)
            .await?;
        let followed = self.storage.followed_among(viewer_id, &author_ids).await?;

        Ok(records
            .into_iter()
            .map(|record| RecipeView {
                is_favorited: favorited.contains(&record.recipe.id),
                is_in_shopping_cart: in_cart.contains(&record.recipe.id),
                author_subscribed: followed.contains(&record.author.id),
                record,
            })
            .collect())
    }

    async fn ensure_author(&self, user_id: i32, recipe_id: i32) -> Result<()> {
        let recipe = self
            .storage
            .find_recipe(recipe_id)
            .await?
            .ok_or_else(|| FoodgramError::not_found(format!("Recipe {} not found", recipe_id)))?;
        if recipe.author_id != user_id {
            return Err(FoodgramError::forbidden(
                "Only the author can modify this recipe",
            ));
        }
        Ok(())
    }

    /// 配料与标签必须存在
    async fn check_references(&self, valid: &ValidatedRecipe) -> Result<()> {
        let ingredient_ids: Vec<i32> = valid.ingredients.iter().map(|i| i.ingredient_id).collect();
        let existing = self.storage.existing_ingredient_ids(&ingredient_ids).await?;
        if let Some(missing) = ingredient_ids.iter().find(|id| !existing.contains(id)) {
            return Err(FoodgramError::validation(format!(
                "ingredients: ingredient {} does not exist",
                missing
            )));
        }

        let existing_tags = self.storage.existing_tag_ids(&valid.tags).await?;
        if let Some(missing) = valid.tags.iter().find(|id| !existing_tags.contains(id)) {
            return Err(FoodgramError::validation(format!(
                "tags: tag {} does not exist",
                missing
            )));
        }
        Ok(())
    }
}
