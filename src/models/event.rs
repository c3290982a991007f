use crate::entities::{event_entity, ticket_type_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub venue: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
}

impl From<event_entity::Model> for EventResponse {
    fn from(m: event_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            venue: m.venue,
            description: m.description,
            starts_at: m.starts_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketTypeResponse {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity_available: i64,
    pub quantity_sold: i64,
    pub remaining: i64,
}

impl From<ticket_type_entity::Model> for TicketTypeResponse {
    fn from(m: ticket_type_entity::Model) -> Self {
        let remaining = m.remaining();
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            price: m.price,
            quantity_available: m.quantity_available,
            quantity_sold: m.quantity_sold,
            remaining,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub ticket_types: Vec<TicketTypeResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub venue: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketTypeRequest {
    pub event_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity_available: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdjustCapacityRequest {
    pub quantity_available: i64,
}
