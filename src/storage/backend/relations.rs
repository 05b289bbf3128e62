//! 收藏、购物车、关注
//!
//! 重复关系由唯一索引拒绝，映射为 `Conflict`。

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Set,
};
use tracing::{debug, info};

use super::{SeaOrmStorage, is_foreign_key_violation, is_unique_violation};
use crate::errors::{FoodgramError, Result};
use crate::storage::models::{Page, PageRequest};

use migration::entities::{favorite, follow, shopping_cart, user};

/// 用户与菜谱之间的关系类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping cart",
        }
    }
}

impl SeaOrmStorage {
    /// 添加收藏 / 加入购物车
    pub async fn add_relation(&self, kind: RelationKind, user_id: i32, recipe_id: i32) -> Result<()> {
        let now = Utc::now();
        let inserted = match kind {
            RelationKind::Favorite => favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(|_| ()),
            RelationKind::ShoppingCart => shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(|_| ()),
        };

        match inserted {
            Ok(()) => {
                info!(
                    "Recipe {} added to {} of user {}",
                    recipe_id,
                    kind.label(),
                    user_id
                );
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(FoodgramError::conflict(format!(
                "Recipe is already in {}",
                kind.label()
            ))),
            Err(e) if is_foreign_key_violation(&e) => Err(FoodgramError::not_found(format!(
                "Recipe {} not found",
                recipe_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// 移除关系；不存在时返回 false
    pub async fn remove_relation(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        let removed = match kind {
            RelationKind::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
            RelationKind::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
        };
        debug!(
            "remove_relation {:?} user={} recipe={} -> {}",
            kind, user_id, recipe_id, removed
        );
        Ok(removed > 0)
    }

    /// 给定菜谱中被该用户标记的那些
    pub async fn marked_recipes(
        &self,
        kind: RelationKind,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = recipe_ids.iter().copied();
        let found: Vec<i32> = match kind {
            RelationKind::Favorite => {
                favorite::Entity::find()
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.is_in(ids))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            }
            RelationKind::ShoppingCart => {
                shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(ids))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            }
        };
        Ok(found.into_iter().collect())
    }

    pub async fn follow(&self, follower_id: i32, author_id: i32) -> Result<()> {
        let active = follow::ActiveModel {
            follower_id: Set(follower_id),
            author_id: Set(author_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        match active.insert(&self.db).await {
            Ok(_) => {
                info!("User {} now follows {}", follower_id, author_id);
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(FoodgramError::conflict(
                "Already subscribed to this author",
            )),
            Err(e) if is_foreign_key_violation(&e) => Err(FoodgramError::not_found(format!(
                "User {} not found",
                author_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn unfollow(&self, follower_id: i32, author_id: i32) -> Result<bool> {
        let res = follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// 给定作者中被 follower 关注的那些
    pub async fn followed_among(&self, follower_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = follow::Entity::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::AuthorId.is_in(author_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(found.into_iter().collect())
    }

    /// follower 关注的作者（分页，按用户名排序）
    pub async fn followed_authors(
        &self,
        follower_id: i32,
        page: PageRequest,
    ) -> Result<Page<user::Model>> {
        let followed = follow::Entity::find()
            .select_only()
            .column(follow::Column::AuthorId)
            .filter(follow::Column::FollowerId.eq(follower_id))
            .into_query();

        let paginator = user::Entity::find()
            .filter(user::Column::Id.in_subquery(followed))
            .order_by_asc(user::Column::Username)
            .paginate(&self.db, page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        Ok(Page { items, total })
    }
}
