use crate::entities::{
    CreditTransactionKind, MembershipStatus, OrderItemType, OrderStatus, PaymentMethod,
    TicketStatus, credit_transaction_entity as credit_transactions,
    membership_entity as memberships, order_entity as orders, order_item_entity as order_items,
    ticket_entity as tickets, ticket_type_entity as ticket_types,
};
use crate::error::{AppError, AppResult};
use crate::external::StripeService;
use crate::models::*;
use crate::utils::{generate_order_number, generate_unique_ticket_code};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct MembershipService {
    pool: DatabaseConnection,
    stripe_service: StripeService,
}

impl MembershipService {
    pub fn new(pool: DatabaseConnection, stripe_service: StripeService) -> Self {
        Self {
            pool,
            stripe_service,
        }
    }

    async fn find_active_membership(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<Option<memberships::Model>> {
        Ok(memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active))
            .one(txn)
            .await?)
    }

    pub async fn create_membership_intent(
        &self,
        user_id: i64,
        request: CreateMembershipIntentRequest,
    ) -> AppResult<CreateMembershipIntentResponse> {
        // 一个用户同时只能有一份生效的会员
        let existing = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Already has an active membership".to_string(),
            ));
        }

        let tier = request.tier.clone();
        let amount = tier.price_cents();
        let payment_intent = self
            .stripe_service
            .create_payment_intent(
                amount,
                user_id,
                "membership",
                Some(format!("User {user_id} purchases {tier} membership")),
            )
            .await?;

        memberships::ActiveModel {
            user_id: Set(user_id),
            tier: Set(tier.clone()),
            status: Set(MembershipStatus::Pending),
            ticket_credits_remaining: Set(0),
            stripe_payment_intent_id: Set(Some(payment_intent.id.clone())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(CreateMembershipIntentResponse {
            payment_intent_id: payment_intent.id,
            client_secret: payment_intent.client_secret,
            amount,
            tier,
        })
    }

    /// 支付确认后激活会员并发放本周期的门票额度。
    /// 激活、额度写入、流水记录在同一事务内；重复确认幂等。
    pub async fn confirm_membership(
        &self,
        user_id: i64,
        request: ConfirmMembershipRequest,
    ) -> AppResult<ConfirmMembershipResponse> {
        let payment_intent = self
            .stripe_service
            .retrieve_payment_intent(&request.payment_intent_id)
            .await?;
        if !payment_intent.is_succeeded() {
            return Err(AppError::ValidationError("Payment not successful".to_string()));
        }

        let txn = self.pool.begin().await?;

        let rec = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(
                memberships::Column::StripePaymentIntentId.eq(request.payment_intent_id.clone()),
            )
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership purchase not found".to_string()))?;

        if rec.status == MembershipStatus::Active {
            let resp = MembershipResponse::from(rec);
            txn.commit().await?;
            return Ok(ConfirmMembershipResponse { membership: resp });
        }
        if rec.status != MembershipStatus::Pending {
            return Err(AppError::ValidationError(
                "Membership purchase is no longer confirmable".to_string(),
            ));
        }

        // 支付窗口内可能又开了一份会员，激活前在事务里重查
        if self.find_active_membership(&txn, user_id).await?.is_some() {
            return Err(AppError::ValidationError(
                "Already has an active membership".to_string(),
            ));
        }

        let credits = rec.tier.ticket_credits();
        let membership_id = rec.id;
        let mut am = rec.into_active_model();
        am.status = Set(MembershipStatus::Active);
        am.ticket_credits_remaining = Set(credits);
        am.renews_at = Set(Some(Utc::now() + Duration::days(365)));
        am.updated_at = Set(Some(Utc::now()));
        let rec = am.update(&txn).await?;

        credit_transactions::ActiveModel {
            membership_id: Set(membership_id),
            user_id: Set(user_id),
            kind: Set(CreditTransactionKind::Grant),
            amount: Set(credits),
            balance_after: Set(credits),
            note: Set(Some(format!("{} membership activation", rec.tier))),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        log::info!("Membership {membership_id} activated for user {user_id}, {credits} credits granted");
        Ok(ConfirmMembershipResponse {
            membership: MembershipResponse::from(rec),
        })
    }

    pub async fn get_membership(&self, user_id: i64) -> AppResult<MembershipResponse> {
        let rec = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::Status.ne(MembershipStatus::Pending))
            .order_by_desc(memberships::Column::CreatedAt)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("No membership".to_string()))?;

        Ok(MembershipResponse::from(rec))
    }

    pub async fn cancel_membership(&self, user_id: i64) -> AppResult<MembershipResponse> {
        let result = memberships::Entity::update_many()
            .set(memberships::ActiveModel {
                status: Set(MembershipStatus::Cancelled),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(memberships::Column::UserId.eq(user_id))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("No active membership".to_string()));
        }
        self.get_membership(user_id).await
    }

    /// 会员额度换票。订单、票、额度扣减、流水在一个事务里落库，
    /// 任何一步失败整体回滚，不存在“票发了额度没扣”的中间态。
    pub async fn redeem_credit(
        &self,
        user_id: i64,
        request: RedeemCreditRequest,
    ) -> AppResult<RedeemCreditResponse> {
        let txn = self.pool.begin().await?;

        let membership = self
            .find_active_membership(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::ValidationError("No active membership".to_string()))?;

        if membership.ticket_credits_remaining < 1 {
            return Err(AppError::ValidationError(
                "No ticket credits remaining".to_string(),
            ));
        }

        let tt = ticket_types::Entity::find_by_id(request.ticket_type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

        // 原子扣减额度；并发换票时输掉的那个请求在这里得到 0 行
        let result = memberships::Entity::update_many()
            .col_expr(
                memberships::Column::TicketCreditsRemaining,
                Expr::col(memberships::Column::TicketCreditsRemaining).sub(1),
            )
            .filter(memberships::Column::Id.eq(membership.id))
            .filter(memberships::Column::Status.eq(MembershipStatus::Active))
            .filter(memberships::Column::TicketCreditsRemaining.gte(1))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "No ticket credits remaining".to_string(),
            ));
        }

        // 额度换票同样占座位库存
        if tt.remaining() < 1 {
            return Err(AppError::CapacityError(format!(
                "'{}' is sold out",
                tt.name
            )));
        }
        let result = ticket_types::Entity::update_many()
            .col_expr(
                ticket_types::Column::QuantitySold,
                Expr::col(ticket_types::Column::QuantitySold).add(1),
            )
            .filter(ticket_types::Column::Id.eq(tt.id))
            .filter(ticket_types::Column::QuantitySold.lte(tt.quantity_available - 1))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::CapacityError(format!(
                "'{}' just sold out",
                tt.name
            )));
        }

        // 0 元已完成订单，支付方式标记为会员额度
        let order = orders::ActiveModel {
            order_number: Set(generate_order_number()),
            user_id: Set(user_id),
            total_amount: Set(0),
            status: Set(OrderStatus::Completed),
            payment_method: Set(PaymentMethod::MembershipCredit),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        order_items::ActiveModel {
            order_id: Set(order.id),
            item_type: Set(OrderItemType::Ticket),
            ticket_type_id: Set(Some(tt.id)),
            quantity: Set(1),
            unit_price: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let code = generate_unique_ticket_code(&txn).await?;
        let ticket = tickets::ActiveModel {
            order_id: Set(order.id),
            ticket_type_id: Set(tt.id),
            status: Set(TicketStatus::Active),
            code: Set(code),
            attendee_name: Set(request.attendee_name),
            attendee_email: Set(request.attendee_email),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 扣减后的真实余额做流水，避免并发下 balance_after 失真
        let refreshed = memberships::Entity::find_by_id(membership.id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;

        credit_transactions::ActiveModel {
            membership_id: Set(membership.id),
            user_id: Set(user_id),
            kind: Set(CreditTransactionKind::Redemption),
            amount: Set(-1),
            balance_after: Set(refreshed.ticket_credits_remaining),
            order_id: Set(Some(order.id)),
            ticket_id: Set(Some(ticket.id)),
            note: Set(Some(format!("Redeemed for '{}'", tt.name))),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "User {user_id} redeemed 1 credit for ticket type {}, {} credits left",
            tt.id,
            refreshed.ticket_credits_remaining
        );
        Ok(RedeemCreditResponse {
            order: OrderResponse::from(order),
            ticket: TicketResponse::from(ticket),
            credits_remaining: refreshed.ticket_credits_remaining,
        })
    }

    /// 到期会员下线（定时任务调用）
    pub async fn expire_memberships(&self) -> AppResult<i64> {
        let result = memberships::Entity::update_many()
            .set(memberships::ActiveModel {
                status: Set(MembershipStatus::Expired),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(memberships::Column::Status.eq(MembershipStatus::Active))
            .filter(memberships::Column::RenewsAt.lt(Utc::now()))
            .exec(&self.pool)
            .await?;

        Ok(result.rows_affected as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripeConfig;
    use crate::entities::MembershipTier;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn stripe() -> StripeService {
        StripeService::new(StripeConfig {
            secret_key: "sk_test_unused".to_string(),
            webhook_secret: String::new(),
        })
    }

    fn membership(credits: i64) -> memberships::Model {
        memberships::Model {
            id: 3,
            user_id: 9,
            tier: MembershipTier::Plus,
            status: MembershipStatus::Active,
            ticket_credits_remaining: credits,
            renews_at: Some(Utc::now() + Duration::days(100)),
            stripe_payment_intent_id: Some("pi_test".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    fn redeem_request() -> RedeemCreditRequest {
        RedeemCreditRequest {
            ticket_type_id: 1,
            attendee_name: None,
            attendee_email: None,
        }
    }

    #[tokio::test]
    async fn test_redeem_without_membership_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<memberships::Model>::new()])
            .into_connection();
        let svc = MembershipService::new(db, stripe());

        let err = svc.redeem_credit(9, redeem_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("No active membership")));
    }

    #[tokio::test]
    async fn test_redeem_with_zero_credits_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![membership(0)]])
            .into_connection();
        let svc = MembershipService::new(db, stripe());

        let err = svc.redeem_credit(9, redeem_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("credits")));
    }

    #[tokio::test]
    async fn test_redeem_losing_debit_race_is_rejected() {
        // 读到还剩 1 点，但并发请求先扣掉了：条件更新 0 行，整个事务回滚
        let tt = ticket_types::Model {
            id: 1,
            event_id: 1,
            name: "GA".to_string(),
            price: 2500,
            quantity_available: 100,
            quantity_sold: 0,
            created_at: None,
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![membership(1)]])
            .append_query_results([vec![tt]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = MembershipService::new(db, stripe());

        let err = svc.redeem_credit(9, redeem_request()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("credits")));
    }
}
