//! Shopping list aggregation
//!
//! Merges the ingredient lines of every recipe in a user's cart into one
//! total per `(name, measurement_unit)`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::storage::SeaOrmStorage;
use crate::storage::models::IngredientLine;

/// 导出文件名
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// 合并后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: u64,
}

/// 按 (name, unit) 汇总购物车中菜谱的配料
///
/// 只统计 recipe_id 出现在 `cart_recipe_ids` 中的行；引用为空的行直接跳过。
/// 输出按首次出现的顺序，不做单位换算。
pub fn aggregate(cart_recipe_ids: &[i32], lines: &[IngredientLine]) -> Vec<ShoppingLine> {
    let cart: HashSet<i32> = cart_recipe_ids.iter().copied().collect();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut merged: Vec<ShoppingLine> = Vec::new();

    for line in lines {
        let Some(recipe_id) = line.recipe_id else {
            continue;
        };
        if !cart.contains(&recipe_id) {
            continue;
        }

        let key = (line.name.as_str(), line.measurement_unit.as_str());
        match index.get(&key) {
            Some(&pos) => {
                merged[pos].total = merged[pos].total.saturating_add(line.amount);
            }
            None => {
                index.insert(key, merged.len());
                merged.push(ShoppingLine {
                    name: line.name.clone(),
                    measurement_unit: line.measurement_unit.clone(),
                    total: line.amount,
                });
            }
        }
    }

    merged
}

/// 每行 `"{name} {total} {unit}\n"`
pub fn render(lines: &[ShoppingLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} {} {}\n", l.name, l.total, l.measurement_unit))
        .collect()
}

pub struct ShoppingListService {
    storage: Arc<SeaOrmStorage>,
}

impl ShoppingListService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 该用户购物车的汇总结果
    pub async fn build(&self, user_id: i32) -> Result<Vec<ShoppingLine>> {
        let snapshot = self.storage.cart_snapshot(user_id).await?;
        let merged = aggregate(&snapshot.recipe_ids, &snapshot.lines);
        debug!(
            "Shopping list for user {}: {} recipes -> {} lines",
            user_id,
            snapshot.recipe_ids.len(),
            merged.len()
        );
        Ok(merged)
    }

    /// 渲染为纯文本
    pub async fn render_for(&self, user_id: i32) -> Result<String> {
        Ok(render(&self.build(user_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(recipe_id: Option<i32>, name: &str, unit: &str, amount: u64) -> IngredientLine {
        IngredientLine {
            recipe_id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_merges_same_name_and_unit() {
        let lines = vec![
            line(Some(1), "flour", "g", 200),
            line(Some(1), "milk", "ml", 300),
            line(Some(2), "flour", "g", 50),
        ];
        let merged = aggregate(&[1, 2], &lines);
        assert_eq!(
            merged,
            vec![
                ShoppingLine {
                    name: "flour".into(),
                    measurement_unit: "g".into(),
                    total: 250
                },
                ShoppingLine {
                    name: "milk".into(),
                    measurement_unit: "ml".into(),
                    total: 300
                },
            ]
        );
    }

    #[test]
    fn test_two_recipes_with_sugar() {
        let lines = vec![
            line(Some(10), "sugar", "g", 100),
            line(Some(11), "sugar", "g", 100),
        ];
        assert_eq!(render(&aggregate(&[10, 11], &lines)), "sugar 200 g\n");
    }

    #[test]
    fn test_different_units_stay_separate() {
        let lines = vec![
            line(Some(1), "salt", "g", 5),
            line(Some(1), "salt", "pinch", 1),
        ];
        assert_eq!(render(&aggregate(&[1], &lines)), "salt 5 g\nsalt 1 pinch\n");
    }

    #[test]
    fn test_skips_dangling_and_foreign_lines() {
        let lines = vec![
            line(None, "ghost", "g", 999),
            line(Some(3), "egg", "pcs", 2),
            line(Some(4), "butter", "g", 10),
        ];
        let merged = aggregate(&[3], &lines);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "egg");
    }

    #[test]
    fn test_empty_cart_renders_empty() {
        let lines = vec![line(Some(1), "rice", "g", 100)];
        assert!(aggregate(&[], &lines).is_empty());
        assert_eq!(render(&[]), "");
    }
}
