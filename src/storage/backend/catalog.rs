//! 标签与配料（只读目录 + 导入）

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, EntityTrait, ExprTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func, OnConflict},
};
use tracing::{debug, info};

use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::{IngredientSeed, TagSeed};

use migration::entities::{ingredient, tag};

impl SeaOrmStorage {
    pub async fn list_tags(&self) -> Result<Vec<tag::Model>> {
        let db = &self.db;
        let tags = retry::with_retry("list_tags", self.retry_config, || async {
            tag::Entity::find().order_by_asc(tag::Column::Name).all(db).await
        })
        .await?;
        Ok(tags)
    }

    pub async fn find_tag(&self, tag_id: i32) -> Result<Option<tag::Model>> {
        Ok(tag::Entity::find_by_id(tag_id).one(&self.db).await?)
    }

    /// 按名称前缀（不区分大小写）过滤配料
    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> Result<Vec<ingredient::Model>> {
        let mut query = ingredient::Entity::find().order_by_asc(ingredient::Column::Name);

        if let Some(prefix) = name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
            let pattern = format!("{}%", prefix.to_lowercase());
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(ingredient::Column::Name))).like(pattern),
            );
        }

        let db = &self.db;
        let items = retry::with_retry("list_ingredients", self.retry_config, || {
            let query = query.clone();
            async move { query.all(db).await }
        })
        .await?;
        debug!("list_ingredients: {} rows", items.len());
        Ok(items)
    }

    pub async fn find_ingredient(&self, ingredient_id: i32) -> Result<Option<ingredient::Model>> {
        Ok(ingredient::Entity::find_by_id(ingredient_id)
            .one(&self.db)
            .await?)
    }

    /// 返回给定 id 中实际存在的配料 id
    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = ingredient::Entity::find()
            .select_only()
            .column(ingredient::Column::Id)
            .filter(ingredient::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(found.into_iter().collect())
    }

    /// 返回给定 id 中实际存在的标签 id
    pub async fn existing_tag_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i32> = tag::Entity::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(found.into_iter().collect())
    }

    /// 批量导入配料，已存在的 (name, measurement_unit) 跳过
    pub async fn import_ingredients(&self, seeds: Vec<IngredientSeed>) -> Result<u64> {
        if seeds.is_empty() {
            return Ok(0);
        }
        let total = seeds.len();
        let models = seeds.into_iter().map(|seed| ingredient::ActiveModel {
            name: Set(seed.name),
            measurement_unit: Set(seed.measurement_unit),
            ..Default::default()
        });

        let inserted = ingredient::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    ingredient::Column::Name,
                    ingredient::Column::MeasurementUnit,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        info!("Imported {} of {} ingredients", inserted, total);
        Ok(inserted)
    }

    /// 批量导入标签，已存在的 slug 跳过
    pub async fn import_tags(&self, seeds: Vec<TagSeed>) -> Result<u64> {
        if seeds.is_empty() {
            return Ok(0);
        }
        let total = seeds.len();
        let models = seeds.into_iter().map(|seed| tag::ActiveModel {
            name: Set(seed.name),
            slug: Set(seed.slug),
            ..Default::default()
        });

        let inserted = tag::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(tag::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        info!("Imported {} of {} tags", inserted, total);
        Ok(inserted)
    }
}
