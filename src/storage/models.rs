use serde::{Deserialize, Serialize};

use migration::entities::{ingredient, recipe, tag, user};

/// 菜谱中的一条配料（已关联配料名称与单位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredientRow {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// 组装完成的菜谱（作者、标签、配料）
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub recipe: recipe::Model,
    pub author: user::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<RecipeIngredientRow>,
}

/// 写入用的配料引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// 新建菜谱所需字段（已通过校验）
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

/// 部分更新；配料与标签整体替换
#[derive(Debug, Clone)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

/// 菜谱列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// 任一标签匹配即可
    pub tags: Vec<String>,
    /// 仅返回该用户收藏的菜谱
    pub favorited_by: Option<i32>,
    /// 仅返回该用户购物车中的菜谱
    pub in_cart_of: Option<i32>,
}

/// 分页请求（page 从 1 开始）
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

/// 一页数据及总数
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// 购物清单的原始行；recipe_id 为空表示引用已失效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub recipe_id: Option<i32>,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u64,
}

/// 同一事务内读取的购物车快照
#[derive(Debug, Clone, Default)]
pub struct CartSnapshot {
    /// 按加入购物车的顺序
    pub recipe_ids: Vec<i32>,
    pub lines: Vec<IngredientLine>,
}

/// 关注关系中的作者及其菜谱统计
#[derive(Debug, Clone)]
pub struct AuthorWithRecipes {
    pub author: user::Model,
    pub recipes: Vec<recipe::Model>,
    pub recipes_count: u64,
}

/// load-data 导入用的配料
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

/// load-data 导入用的标签
#[derive(Debug, Clone, Deserialize)]
pub struct TagSeed {
    pub name: String,
    pub slug: String,
}

pub type Ingredient = ingredient::Model;
pub type Tag = tag::Model;
