use crate::entities::{WaitlistStatus, waitlist_entry_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    pub ticket_type_id: i64,
    pub quantity: i32,
    /// 不填时使用账号邮箱
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WaitlistEntryResponse {
    pub id: i64,
    pub ticket_type_id: i64,
    pub quantity: i32,
    pub status: WaitlistStatus,
    pub notified_at: Option<DateTime<Utc>>,
    pub reservation_expires_at: Option<DateTime<Utc>>,
}

impl From<waitlist_entry_entity::Model> for WaitlistEntryResponse {
    fn from(m: waitlist_entry_entity::Model) -> Self {
        Self {
            id: m.id,
            ticket_type_id: m.ticket_type_id,
            quantity: m.quantity,
            status: m.status,
            notified_at: m.notified_at,
            reservation_expires_at: m.reservation_expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromoteWaitlistResponse {
    pub processed_count: i64,
    pub emails_sent: i64,
}
