use sea_orm_migration::prelude::*;

use crate::m20260301_000003_recipes::Recipe;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 short_links 表
        manager
            .create_table(
                Table::create()
                    .table(ShortLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLink::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortLink::RecipeId).integer().not_null())
                    .col(ColumnDef::new(ShortLink::Code).string_len(32).not_null())
                    .col(ColumnDef::new(ShortLink::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(ShortLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_short_links_recipe")
                            .from(ShortLink::Table, ShortLink::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个菜谱至多一个短链接
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_short_links_recipe")
                    .table(ShortLink::Table)
                    .col(ShortLink::RecipeId)
                    .to_owned(),
            )
            .await?;

        // 短码全局唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("uq_short_links_code")
                    .table(ShortLink::Table)
                    .col(ShortLink::Code)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShortLink::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortLink {
    #[sea_orm(iden = "short_links")]
    Table,
    Id,
    RecipeId,
    Code,
    OriginalUrl,
    CreatedAt,
}
