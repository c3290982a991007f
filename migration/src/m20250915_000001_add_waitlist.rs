use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum WaitlistEntries {
    Table,
    Id,
    TicketTypeId,
    UserId,
    Email,
    Quantity,
    Status,
    NotifiedAt,
    ReservationExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("waitlist_status"))
                    .values(vec![
                        Alias::new("waiting"),
                        Alias::new("notified"),
                        Alias::new("converted"),
                        Alias::new("expired"),
                        Alias::new("cancelled"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WaitlistEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitlistEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::TicketTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::Status)
                            .custom(Alias::new("waitlist_status"))
                            .not_null()
                            .default(Expr::cust("'waiting'::waitlist_status")),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::NotifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::ReservationExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitlistEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_waitlist_entries_type_status")
                    .table(WaitlistEntries::Table)
                    .col(WaitlistEntries::TicketTypeId)
                    .col(WaitlistEntries::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_waitlist_entries_status_expires")
                    .table(WaitlistEntries::Table)
                    .col(WaitlistEntries::Status)
                    .col(WaitlistEntries::ReservationExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WaitlistEntries::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("waitlist_status")).to_owned())
            .await?;
        Ok(())
    }
}
