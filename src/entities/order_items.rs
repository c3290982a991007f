use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "order_item_type")]
#[serde(rename_all = "snake_case")]
pub enum OrderItemType {
    #[sea_orm(string_value = "ticket")]
    Ticket,
    #[sea_orm(string_value = "product")]
    Product,
}

impl std::fmt::Display for OrderItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderItemType::Ticket => write!(f, "ticket"),
            OrderItemType::Product => write!(f, "product"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub item_type: OrderItemType,
    pub ticket_type_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
