use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    RelationTrait, TransactionTrait,
};
use tracing::debug;

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::{CartSnapshot, IngredientLine};

use migration::entities::{ingredient, recipe_ingredient, shopping_cart};

impl SeaOrmStorage {
    /// 在同一事务中读取用户购物车及其配料行
    ///
    /// 行按加入购物车的顺序排列，同一菜谱内按配料录入顺序。
    pub async fn cart_snapshot(&self, user_id: i32) -> Result<CartSnapshot> {
        let txn = self.db.begin().await?;

        let recipe_ids: Vec<i32> = shopping_cart::Entity::find()
            .select_only()
            .column(shopping_cart::Column::RecipeId)
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .order_by_asc(shopping_cart::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        let in_cart = shopping_cart::Entity::find()
            .select_only()
            .column(shopping_cart::Column::RecipeId)
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .into_query();

        let rows: Vec<(i32, String, String, i32)> = recipe_ingredient::Entity::find()
            .select_only()
            .column(recipe_ingredient::Column::RecipeId)
            .column(ingredient::Column::Name)
            .column(ingredient::Column::MeasurementUnit)
            .column(recipe_ingredient::Column::Amount)
            .join(
                JoinType::InnerJoin,
                recipe_ingredient::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredient::Column::RecipeId.in_subquery(in_cart))
            .order_by_asc(recipe_ingredient::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        txn.commit().await?;

        let position: HashMap<i32, usize> = recipe_ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();
        let mut lines: Vec<IngredientLine> = rows
            .into_iter()
            .map(|(recipe_id, name, measurement_unit, amount)| IngredientLine {
                recipe_id: Some(recipe_id),
                name,
                measurement_unit,
                amount: u64::try_from(amount).unwrap_or(0),
            })
            .collect();
        // 稳定排序，保留同一菜谱内的顺序
        lines.sort_by_key(|line| {
            line.recipe_id
                .and_then(|id| position.get(&id).copied())
                .unwrap_or(usize::MAX)
        });

        debug!(
            "cart_snapshot: user={} recipes={} lines={}",
            user_id,
            recipe_ids.len(),
            lines.len()
        );
        Ok(CartSnapshot { recipe_ids, lines })
    }
}
