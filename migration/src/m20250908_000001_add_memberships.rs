use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Memberships {
    Table,
    Id,
    UserId,
    Tier,
    Status,
    TicketCreditsRemaining,
    RenewsAt,
    StripePaymentIntentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CreditTransactions {
    Table,
    Id,
    MembershipId,
    UserId,
    Kind,
    Amount,
    BalanceAfter,
    OrderId,
    TicketId,
    Note,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("membership_tier"))
                    .values(vec![Alias::new("plus"), Alias::new("premier")])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("membership_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("active"),
                        Alias::new("cancelled"),
                        Alias::new("expired"),
                        Alias::new("suspended"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("credit_transaction_kind"))
                    .values(vec![
                        Alias::new("grant"),
                        Alias::new("redemption"),
                        Alias::new("adjustment"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Memberships::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Memberships::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Memberships::Tier)
                            .custom(Alias::new("membership_tier"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Memberships::Status)
                            .custom(Alias::new("membership_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::membership_status")),
                    )
                    .col(
                        ColumnDef::new(Memberships::TicketCreditsRemaining)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Memberships::RenewsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Memberships::StripePaymentIntentId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Memberships::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Memberships::UpdatedAt)
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
                    .name("idx_memberships_user")
                    .table(Memberships::Table)
                    .col(Memberships::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_memberships_status_renews")
                    .table(Memberships::Table)
                    .col(Memberships::Status)
                    .col(Memberships::RenewsAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CreditTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::MembershipId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::Kind)
                            .custom(Alias::new("credit_transaction_kind"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::OrderId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::TicketId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CreditTransactions::Note).string_len(255).null())
                    .col(
                        ColumnDef::new(CreditTransactions::CreatedAt)
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
                    .name("idx_credit_transactions_membership")
                    .table(CreditTransactions::Table)
                    .col(CreditTransactions::MembershipId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_credit_transactions_user")
                    .table(CreditTransactions::Table)
                    .col(CreditTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;
        for name in ["credit_transaction_kind", "membership_status", "membership_tier"] {
            manager
                .drop_type(Type::drop().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
