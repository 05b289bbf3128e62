//! 菜谱读写
//!
//! 写操作在事务内完成：菜谱行、配料行、标签行要么全部写入，要么全部回滚。

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, RelationTrait, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::{SeaOrmStorage, retry};
use crate::errors::{FoodgramError, Result};
use crate::storage::models::{
    IngredientAmount, NewRecipe, Page, PageRequest, RecipeChanges, RecipeFilter,
    RecipeIngredientRow, RecipeRecord,
};

use migration::entities::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
};

impl SeaOrmStorage {
    /// 新建菜谱，返回 id
    pub async fn create_recipe(&self, author_id: i32, new_recipe: NewRecipe) -> Result<i32> {
        let txn = self.db.begin().await?;

        let created = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(new_recipe.name),
            text: Set(new_recipe.text),
            image: Set(Some(new_recipe.image)),
            cooking_time: Set(new_recipe.cooking_time),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        write_ingredients(&txn, created.id, &new_recipe.ingredients).await?;
        write_tags(&txn, created.id, &new_recipe.tags).await?;
        txn.commit().await?;

        info!(
            "Recipe created: id={} author={} ingredients={}",
            created.id,
            author_id,
            new_recipe.ingredients.len()
        );
        Ok(created.id)
    }

    /// 部分更新菜谱；配料与标签整体替换
    pub async fn update_recipe(&self, recipe_id: i32, changes: RecipeChanges) -> Result<()> {
        let txn = self.db.begin().await?;

        let mut active = recipe::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(recipe_id),
            ..Default::default()
        };
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(image) = changes.image {
            active.image = Set(Some(image));
        }
        if let Some(cooking_time) = changes.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if active.is_changed() {
            active.update(&txn).await?;
        }

        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        write_ingredients(&txn, recipe_id, &changes.ingredients).await?;
        write_tags(&txn, recipe_id, &changes.tags).await?;

        txn.commit().await?;
        info!("Recipe updated: id={}", recipe_id);
        Ok(())
    }

    /// 删除菜谱（级联删除配料、标签、收藏、购物车、短链接）
    pub async fn delete_recipe(&self, recipe_id: i32) -> Result<bool> {
        let res = recipe::Entity::delete_by_id(recipe_id)
            .exec(&self.db)
            .await?;
        if res.rows_affected > 0 {
            info!("Recipe deleted: id={}", recipe_id);
        }
        Ok(res.rows_affected > 0)
    }

    pub async fn find_recipe(&self, recipe_id: i32) -> Result<Option<recipe::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_recipe", self.retry_config, || async {
            recipe::Entity::find_by_id(recipe_id).one(db).await
        })
        .await?;
        Ok(found)
    }

    /// 读取完整菜谱
    pub async fn recipe_record(&self, recipe_id: i32) -> Result<Option<RecipeRecord>> {
        let Some(model) = self.find_recipe(recipe_id).await? else {
            return Ok(None);
        };
        Ok(self.assemble_records(vec![model]).await?.pop())
    }

    /// 分页列出菜谱，新的在前
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<Page<RecipeRecord>> {
        let mut query = recipe::Entity::find();

        if let Some(author_id) = filter.author {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }
        if !filter.tags.is_empty() {
            let tagged = recipe_tag::Entity::find()
                .select_only()
                .column(recipe_tag::Column::RecipeId)
                .join(JoinType::InnerJoin, recipe_tag::Relation::Tag.def())
                .filter(tag::Column::Slug.is_in(filter.tags.iter().cloned()))
                .into_query();
            query = query.filter(recipe::Column::Id.in_subquery(tagged));
        }
        if let Some(user_id) = filter.favorited_by {
            let favorited = favorite::Entity::find()
                .select_only()
                .column(favorite::Column::RecipeId)
                .filter(favorite::Column::UserId.eq(user_id))
                .into_query();
            query = query.filter(recipe::Column::Id.in_subquery(favorited));
        }
        if let Some(user_id) = filter.in_cart_of {
            let in_cart = shopping_cart::Entity::find()
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .into_query();
            query = query.filter(recipe::Column::Id.in_subquery(in_cart));
        }

        let paginator = query
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .paginate(&self.db, page.limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        debug!(
            "list_recipes: page={} limit={} total={}",
            page.page, page.limit, total
        );

        let items = self.assemble_records(models).await?;
        Ok(Page { items, total })
    }

    /// 作者的菜谱（新的在前）及总数
    pub async fn author_recipes(
        &self,
        author_id: i32,
        limit: Option<u32>,
    ) -> Result<(Vec<recipe::Model>, u64)> {
        let base = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author_id));
        let count = base.clone().count(&self.db).await?;
        let recipes = base
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .limit(limit.map(u64::from))
            .all(&self.db)
            .await?;
        Ok((recipes, count))
    }

    /// 批量补全作者、标签和配料，保持传入顺序
    async fn assemble_records(&self, models: Vec<recipe::Model>) -> Result<Vec<RecipeRecord>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let recipe_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<i32> = models.iter().map(|m| m.author_id).collect();

        let authors: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let tag_rows: Vec<(i32, i32, String, String)> = recipe_tag::Entity::find()
            .select_only()
            .column(recipe_tag::Column::RecipeId)
            .column_as(tag::Column::Id, "tag_id")
            .column(tag::Column::Name)
            .column(tag::Column::Slug)
            .join(JoinType::InnerJoin, recipe_tag::Relation::Tag.def())
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(tag::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;
        let mut tags: HashMap<i32, Vec<tag::Model>> = HashMap::new();
        for (recipe_id, id, name, slug) in tag_rows {
            tags.entry(recipe_id)
                .or_default()
                .push(tag::Model { id, name, slug });
        }

        let ingredient_rows: Vec<(i32, i32, String, String, i32)> =
            recipe_ingredient::Entity::find()
                .select_only()
                .column(recipe_ingredient::Column::RecipeId)
                .column_as(ingredient::Column::Id, "ingredient_id")
                .column(ingredient::Column::Name)
                .column(ingredient::Column::MeasurementUnit)
                .column(recipe_ingredient::Column::Amount)
                .join(
                    JoinType::InnerJoin,
                    recipe_ingredient::Relation::Ingredient.def(),
                )
                .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
                .order_by_asc(recipe_ingredient::Column::Id)
                .into_tuple()
                .all(&self.db)
                .await?;
        let mut ingredients: HashMap<i32, Vec<RecipeIngredientRow>> = HashMap::new();
        for (recipe_id, id, name, measurement_unit, amount) in ingredient_rows {
            ingredients
                .entry(recipe_id)
                .or_default()
                .push(RecipeIngredientRow {
                    id,
                    name,
                    measurement_unit,
                    amount,
                });
        }

        models
            .into_iter()
            .map(|recipe| {
                // 外键级联保证作者存在
                let author = authors
                    .get(&recipe.author_id)
                    .cloned()
                    .ok_or_else(|| {
                        FoodgramError::database_operation(format!(
                            "author {} of recipe {} is missing",
                            recipe.author_id, recipe.id
                        ))
                    })?;
                Ok(RecipeRecord {
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    author,
                    recipe,
                })
            })
            .collect()
    }
}

async fn write_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    items: &[IngredientAmount],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let rows = items.iter().map(|item| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.ingredient_id),
        amount: Set(item.amount),
        ..Default::default()
    });
    recipe_ingredient::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn write_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let rows = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });
    recipe_tag::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
