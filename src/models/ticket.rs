use crate::entities::{TicketStatus, ticket_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: i64,
    pub order_id: i64,
    pub ticket_type_id: i64,
    pub status: TicketStatus,
    pub code: String,
    pub attendee_name: Option<String>,
    pub scanned_at: Option<DateTime<Utc>>,
}

impl From<ticket_entity::Model> for TicketResponse {
    fn from(m: ticket_entity::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            ticket_type_id: m.ticket_type_id,
            status: m.status,
            code: m.code,
            attendee_name: m.attendee_name,
            scanned_at: m.scanned_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanTicketRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanTicketResponse {
    pub ticket: TicketResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<TicketStatus>,
}
