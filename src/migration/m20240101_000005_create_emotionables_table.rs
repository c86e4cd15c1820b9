use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Emotionables {
    Table,
    Id,
    UserId,
    EmotionId,
    TargetKind,
    TargetId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Emotions {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Emotionables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Emotionables::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Emotionables::UserId).integer().not_null())
                    .col(ColumnDef::new(Emotionables::EmotionId).integer().not_null())
                    .col(
                        ColumnDef::new(Emotionables::TargetKind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Emotionables::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(Emotionables::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Emotionables::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_emotionables_user_id")
                            .from(Emotionables::Table, Emotionables::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_emotionables_emotion_id")
                            .from(Emotionables::Table, Emotionables::EmotionId)
                            .to(Emotions::Table, Emotions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reaction per user and target
        manager
            .create_index(
                Index::create()
                    .name("idx_emotionables_unique")
                    .table(Emotionables::Table)
                    .col(Emotionables::UserId)
                    .col(Emotionables::TargetKind)
                    .col(Emotionables::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_emotionables_target")
                    .table(Emotionables::Table)
                    .col(Emotionables::TargetKind)
                    .col(Emotionables::TargetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Emotionables::Table).to_owned())
            .await
    }
}
