use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "membership_tier")]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[sea_orm(string_value = "plus")]
    Plus,
    #[sea_orm(string_value = "premier")]
    Premier,
}

impl std::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipTier::Plus => write!(f, "plus"),
            MembershipTier::Premier => write!(f, "premier"),
        }
    }
}

impl MembershipTier {
    /// 各档位年费（美分）
    pub fn price_cents(&self) -> i64 {
        match self {
            MembershipTier::Plus => 4900,
            MembershipTier::Premier => 12900,
        }
    }

    /// 各档位每个周期附带的门票额度
    pub fn ticket_credits(&self) -> i64 {
        match self {
            MembershipTier::Plus => 4,
            MembershipTier::Premier => 12,
        }
    }
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "membership_status")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Pending => write!(f, "pending"),
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Cancelled => write!(f, "cancelled"),
            MembershipStatus::Expired => write!(f, "expired"),
            MembershipStatus::Suspended => write!(f, "suspended"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub tier: MembershipTier,
    pub status: MembershipStatus,
    pub ticket_credits_remaining: i64,
    pub renews_at: Option<DateTime<Utc>>,
    pub stripe_payment_intent_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_pricing() {
        assert_eq!(MembershipTier::Plus.price_cents(), 4900);
        assert_eq!(MembershipTier::Premier.price_cents(), 12900);
        assert!(MembershipTier::Premier.ticket_credits() > MembershipTier::Plus.ticket_credits());
    }
}
