//! 用户与登录令牌

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};

use super::{SeaOrmStorage, is_unique_violation, retry};
use crate::errors::{FoodgramError, Result};
use crate::storage::models::{Page, PageRequest};

use migration::entities::{auth_token, user};

/// 注册用字段（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl SeaOrmStorage {
    pub async fn create_user(&self, new_user: NewUser) -> Result<user::Model> {
        let active = user::ActiveModel {
            email: Set(new_user.email),
            username: Set(new_user.username),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(new_user.password_hash),
            role: Set("user".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match active.insert(&self.db).await {
            Ok(model) => {
                info!("User registered: {} (id={})", model.username, model.id);
                Ok(model)
            }
            Err(e) if is_unique_violation(&e) => Err(FoodgramError::conflict(
                "A user with that email or username already exists",
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user(&self, user_id: i32) -> Result<Option<user::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_user", self.retry_config, || async {
            user::Entity::find_by_id(user_id).one(db).await
        })
        .await?;
        Ok(found)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_user_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(db)
                .await
        })
        .await?;
        Ok(found)
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Page<user::Model>> {
        let paginator = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        debug!("list_users: page={} total={}", page.page, total);
        Ok(Page { items, total })
    }

    pub async fn update_password_hash(&self, user_id: i32, password_hash: String) -> Result<()> {
        let active = user::ActiveModel {
            id: Set(user_id),
            password_hash: Set(password_hash),
            ..Default::default()
        };
        active.update(&self.db).await?;
        info!("Password changed for user {}", user_id);
        Ok(())
    }

    /// 获取用户令牌，没有则用 `new_key` 创建；每个用户只有一个令牌
    pub async fn get_or_create_token(&self, user_id: i32, new_key: String) -> Result<String> {
        if let Some(existing) = self.find_token_of(user_id).await? {
            return Ok(existing.key);
        }

        let active = auth_token::ActiveModel {
            key: Set(new_key),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        };

        match active.insert(&self.db).await {
            Ok(model) => Ok(model.key),
            // 并发登录：另一请求先写入
            Err(e) if is_unique_violation(&e) => self
                .find_token_of(user_id)
                .await?
                .map(|t| t.key)
                .ok_or_else(|| FoodgramError::database_operation("token vanished after conflict")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_token_of(&self, user_id: i32) -> Result<Option<auth_token::Model>> {
        let token = auth_token::Entity::find()
            .filter(auth_token::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(token)
    }

    /// 通过令牌查找用户
    pub async fn find_user_by_token(&self, key: &str) -> Result<Option<user::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_user_by_token", self.retry_config, || async {
            auth_token::Entity::find_by_id(key.to_string())
                .find_also_related(user::Entity)
                .one(db)
                .await
        })
        .await?;
        Ok(found.and_then(|(_, user)| user))
    }

    pub async fn delete_token(&self, user_id: i32) -> Result<()> {
        auth_token::Entity::delete_many()
            .filter(auth_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        debug!("Token removed for user {}", user_id);
        Ok(())
    }
}
