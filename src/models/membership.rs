use crate::entities::{MembershipStatus, MembershipTier, membership_entity};
use crate::models::{OrderResponse, TicketResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMembershipIntentRequest {
    pub tier: MembershipTier,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMembershipIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub tier: MembershipTier,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmMembershipRequest {
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipResponse {
    pub id: i64,
    pub tier: MembershipTier,
    pub status: MembershipStatus,
    pub ticket_credits_remaining: i64,
    pub renews_at: Option<DateTime<Utc>>,
}

impl From<membership_entity::Model> for MembershipResponse {
    fn from(m: membership_entity::Model) -> Self {
        Self {
            id: m.id,
            tier: m.tier,
            status: m.status,
            ticket_credits_remaining: m.ticket_credits_remaining,
            renews_at: m.renews_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmMembershipResponse {
    pub membership: MembershipResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemCreditRequest {
    pub ticket_type_id: i64,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemCreditResponse {
    pub order: OrderResponse,
    pub ticket: TicketResponse,
    pub credits_remaining: i64,
}
