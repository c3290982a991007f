use crate::entities::{OrderItemType, OrderStatus, PaymentMethod, order_entity, order_item_entity};
use crate::models::TicketResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 结算购物车里的一行。单价由服务端按商品目录取，不从客户端读。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutLineItem {
    pub item_type: OrderItemType,
    pub reference_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLineItem>,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    pub payment_intent_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmOrderRequest {
    pub order_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            order_number: m.order_number,
            total_amount: m.total_amount,
            status: m.status,
            payment_method: m.payment_method,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub item_type: OrderItemType,
    pub ticket_type_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: i64,
}

impl From<order_item_entity::Model> for OrderItemResponse {
    fn from(m: order_item_entity::Model) -> Self {
        Self {
            item_type: m.item_type,
            ticket_type_id: m.ticket_type_id,
            product_id: m.product_id,
            quantity: m.quantity,
            unit_price: m.unit_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub tickets: Vec<TicketResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
}
