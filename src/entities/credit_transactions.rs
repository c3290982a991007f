use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "credit_transaction_kind"
)]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionKind {
    #[sea_orm(string_value = "grant")]
    Grant,
    #[sea_orm(string_value = "redemption")]
    Redemption,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl std::fmt::Display for CreditTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreditTransactionKind::Grant => write!(f, "grant"),
            CreditTransactionKind::Redemption => write!(f, "redemption"),
            CreditTransactionKind::Adjustment => write!(f, "adjustment"),
        }
    }
}

/// 额度流水，只插入不修改
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "credit_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub membership_id: i64,
    pub user_id: i64,
    pub kind: CreditTransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub order_id: Option<i64>,
    pub ticket_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
