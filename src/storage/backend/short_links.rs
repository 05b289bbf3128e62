use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};

use super::{SeaOrmStorage, retry};
use crate::errors::Result;

use migration::entities::short_link;

impl SeaOrmStorage {
    pub async fn find_short_link_by_recipe(
        &self,
        recipe_id: i32,
    ) -> Result<Option<short_link::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_short_link_by_recipe", self.retry_config, || async {
            short_link::Entity::find()
                .filter(short_link::Column::RecipeId.eq(recipe_id))
                .one(db)
                .await
        })
        .await?;
        Ok(found)
    }

    /// 按短码精确查找（区分大小写）
    pub async fn find_short_link_by_code(&self, code: &str) -> Result<Option<short_link::Model>> {
        let db = &self.db;
        let found = retry::with_retry("find_short_link_by_code", self.retry_config, || async {
            short_link::Entity::find()
                .filter(short_link::Column::Code.eq(code))
                .one(db)
                .await
        })
        .await?;
        Ok(exact_code_match(found, code))
    }

    /// 插入短链接；唯一约束冲突原样返回 `DbErr`，由调用方区分是哪一列
    pub async fn insert_short_link(
        &self,
        recipe_id: i32,
        code: &str,
        original_url: &str,
    ) -> std::result::Result<short_link::Model, DbErr> {
        short_link::ActiveModel {
            recipe_id: Set(recipe_id),
            code: Set(code.to_string()),
            original_url: Set(original_url.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    pub async fn count_short_links(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(short_link::Entity::find().count(&self.db).await?)
    }
}

/// MySQL 默认排序规则不区分大小写，`WHERE code = ?` 可能命中大小写不同的短码
fn exact_code_match(found: Option<short_link::Model>, code: &str) -> Option<short_link::Model> {
    found.filter(|link| link.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(code: &str) -> short_link::Model {
        short_link::Model {
            id: 1,
            recipe_id: 7,
            code: code.to_string(),
            original_url: "http://food.test/recipes/7".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_exact_code_match_is_case_sensitive() {
        assert!(exact_code_match(Some(link("AB3")), "AB3").is_some());
        assert!(exact_code_match(Some(link("AB3")), "ab3").is_none());
        assert!(exact_code_match(Some(link("AB3")), "aB3").is_none());
        assert!(exact_code_match(None, "AB3").is_none());
    }
}
