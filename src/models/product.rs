use crate::entities::product_entity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub stock_quantity: i64,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            price: m.price,
            stock_quantity: m.stock_quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    pub stock_quantity: i64,
}
