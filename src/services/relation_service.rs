//! Favorites, shopping cart and follows

use std::sync::Arc;

use crate::errors::{FoodgramError, Result};
use crate::storage::models::{AuthorWithRecipes, Page, PageRequest};
use crate::storage::{RelationKind, SeaOrmStorage};

use migration::entities::{recipe, user};

pub struct RelationService {
    storage: Arc<SeaOrmStorage>,
}

impl RelationService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 收藏或加入购物车，返回菜谱
    pub async fn add(&self, kind: RelationKind, user_id: i32, recipe_id: i32) -> Result<recipe::Model> {
        let recipe = self.require_recipe(recipe_id).await?;
        self.storage.add_relation(kind, user_id, recipe_id).await?;
        Ok(recipe)
    }

    /// 取消收藏或移出购物车；原本不存在时报 400
    pub async fn remove(&self, kind: RelationKind, user_id: i32, recipe_id: i32) -> Result<()> {
        self.require_recipe(recipe_id).await?;
        if !self.storage.remove_relation(kind, user_id, recipe_id).await? {
            return Err(FoodgramError::validation(format!(
                "Recipe is not in {}",
                kind.label()
            )));
        }
        Ok(())
    }

    pub async fn subscribe(
        &self,
        follower_id: i32,
        author_id: i32,
        recipes_limit: Option<u32>,
    ) -> Result<AuthorWithRecipes> {
        let author = self.require_user(author_id).await?;
        if follower_id == author_id {
            return Err(FoodgramError::validation("You cannot subscribe to yourself"));
        }
        self.storage.follow(follower_id, author_id).await?;
        self.with_recipes(author, recipes_limit).await
    }

    pub async fn unsubscribe(&self, follower_id: i32, author_id: i32) -> Result<()> {
        self.require_user(author_id).await?;
        if !self.storage.unfollow(follower_id, author_id).await? {
            return Err(FoodgramError::validation(
                "You are not subscribed to this author",
            ));
        }
        Ok(())
    }

    /// 当前用户关注的作者，每位附带最新的若干菜谱
    pub async fn subscriptions(
        &self,
        follower_id: i32,
        page: PageRequest,
        recipes_limit: Option<u32>,
    ) -> Result<Page<AuthorWithRecipes>> {
        let authors = self.storage.followed_authors(follower_id, page).await?;
        let mut items = Vec::with_capacity(authors.items.len());
        for author in authors.items {
            items.push(self.with_recipes(author, recipes_limit).await?);
        }
        Ok(Page {
            items,
            total: authors.total,
        })
    }

    async fn with_recipes(
        &self,
        author: user::Model,
        recipes_limit: Option<u32>,
    ) -> Result<AuthorWithRecipes> {
        let (recipes, recipes_count) = self.storage.author_recipes(author.id, recipes_limit).await?;
        Ok(AuthorWithRecipes {
            author,
            recipes,
            recipes_count,
        })
    }

    async fn require_recipe(&self, recipe_id: i32) -> Result<recipe::Model> {
        self.storage
            .find_recipe(recipe_id)
            .await?
            .ok_or_else(|| FoodgramError::not_found(format!("Recipe {} not found", recipe_id)))
    }

    async fn require_user(&self, user_id: i32) -> Result<user::Model> {
        self.storage
            .find_user(user_id)
            .await?
            .ok_or_else(|| FoodgramError::not_found(format!("User {} not found", user_id)))
    }
}
