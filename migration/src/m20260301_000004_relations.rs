use sea_orm_migration::prelude::*;

use crate::m20260301_000001_accounts::User;
use crate::m20260301_000003_recipes::Recipe;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // favorites 与 shopping_cart 结构相同：(user_id, recipe_id) 唯一
        for (table, fk_user, fk_recipe, uq) in [
            (
                UserRecipe::Favorites,
                "fk_favorites_user",
                "fk_favorites_recipe",
                "uq_favorites_user_recipe",
            ),
            (
                UserRecipe::ShoppingCart,
                "fk_shopping_cart_user",
                "fk_shopping_cart_recipe",
                "uq_shopping_cart_user_recipe",
            ),
        ] {
            manager
                .create_table(
                    Table::create()
                        .table(table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserRecipe::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(UserRecipe::UserId).integer().not_null())
                        .col(ColumnDef::new(UserRecipe::RecipeId).integer().not_null())
                        .col(
                            ColumnDef::new(UserRecipe::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(fk_user)
                                .from(table, UserRecipe::UserId)
                                .to(User::Table, User::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(fk_recipe)
                                .from(table, UserRecipe::RecipeId)
                                .to(Recipe::Table, Recipe::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name(uq)
                        .table(table)
                        .col(UserRecipe::UserId)
                        .col(UserRecipe::RecipeId)
                        .to_owned(),
                )
                .await?;
        }

        // 创建 follows 表
        manager
            .create_table(
                Table::create()
                    .table(Follow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follow::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follow::FollowerId).integer().not_null())
                    .col(ColumnDef::new(Follow::AuthorId).integer().not_null())
                    .col(
                        ColumnDef::new(Follow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_follower")
                            .from(Follow::Table, Follow::FollowerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_author")
                            .from(Follow::Table, Follow::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_follows_follower_author")
                    .table(Follow::Table)
                    .col(Follow::FollowerId)
                    .col(Follow::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follow::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserRecipe::ShoppingCart).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserRecipe::Favorites).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum UserRecipe {
    #[sea_orm(iden = "favorites")]
    Favorites,
    #[sea_orm(iden = "shopping_cart")]
    ShoppingCart,
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Follow {
    #[sea_orm(iden = "follows")]
    Table,
    Id,
    FollowerId,
    AuthorId,
    CreatedAt,
}
