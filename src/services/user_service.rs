//! Accounts: registration, token login, password change

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::{FoodgramError, Result};
use crate::storage::models::{Page, PageRequest};
use crate::storage::{NewUser, SeaOrmStorage};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::{generate_token_key, is_valid_username};

use migration::entities::user;

const EMAIL_MAX_LEN: usize = 254;
const NAME_MAX_LEN: usize = 150;
/// 与 `/users/me/` 冲突
const RESERVED_USERNAME: &str = "me";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.chars().count() > EMAIL_MAX_LEN {
            return Err(FoodgramError::validation("email: enter a valid email address"));
        }
        if !is_valid_username(&self.username) || self.username.chars().count() > NAME_MAX_LEN {
            return Err(FoodgramError::validation(
                "username: letters, digits and @/./+/-/_ only, at most 150 characters",
            ));
        }
        if self.username == RESERVED_USERNAME {
            return Err(FoodgramError::validation("username: 'me' is reserved"));
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().is_empty() || value.chars().count() > NAME_MAX_LEN {
                return Err(FoodgramError::validation(format!(
                    "{}: required, at most {} characters",
                    field, NAME_MAX_LEN
                )));
            }
        }
        if self.password.is_empty() {
            return Err(FoodgramError::validation("password: this field is required"));
        }
        Ok(())
    }
}

pub struct UserService {
    storage: Arc<SeaOrmStorage>,
}

impl UserService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<user::Model> {
        input.validate()?;
        let password_hash = hash_password(&input.password)?;
        self.storage
            .create_user(NewUser {
                email: input.email.trim().to_lowercase(),
                username: input.username,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
            })
            .await
    }

    /// 校验邮箱和密码，返回该用户唯一的令牌
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let bad_credentials =
            || FoodgramError::validation("Unable to log in with provided credentials");

        let user = self
            .storage
            .find_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(bad_credentials)?;
        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(bad_credentials());
        }

        let key = self
            .storage
            .get_or_create_token(user.id, generate_token_key())
            .await?;
        info!("User {} logged in", user.id);
        Ok(key)
    }

    pub async fn logout(&self, user_id: i32) -> Result<()> {
        self.storage.delete_token(user_id).await
    }

    /// 令牌对应的用户
    pub async fn authenticate(&self, key: &str) -> Result<Option<user::Model>> {
        self.storage.find_user_by_token(key).await
    }

    pub async fn set_password(
        &self,
        user: &user::Model,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(FoodgramError::validation("new_password: this field is required"));
        }
        if !verify_password(current_password, &user.password_hash)? {
            return Err(FoodgramError::validation("current_password: incorrect password"));
        }
        let hash = hash_password(new_password)?;
        self.storage.update_password_hash(user.id, hash).await
    }

    pub async fn get(&self, user_id: i32) -> Result<user::Model> {
        self.storage
            .find_user(user_id)
            .await?
            .ok_or_else(|| FoodgramError::not_found(format!("User {} not found", user_id)))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<user::Model>> {
        self.storage.list_users(page).await
    }

    /// 给定用户中被 viewer 关注的那些
    pub async fn subscribed_among(
        &self,
        viewer: Option<i32>,
        user_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        match viewer {
            Some(viewer_id) => self.storage.followed_among(viewer_id, user_ids).await,
            None => Ok(HashSet::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterInput {
        RegisterInput {
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            password: "pass-word-1".into(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(valid().validate().is_ok());

        let mut input = valid();
        input.username = "me".into();
        assert!(input.validate().is_err());

        let mut input = valid();
        input.email = "no-at-sign".into();
        assert!(input.validate().is_err());

        let mut input = valid();
        input.username = "has space".into();
        assert!(input.validate().is_err());

        let mut input = valid();
        input.password.clear();
        assert!(input.validate().is_err());
    }
}
