use crate::entities::{
    OrderItemType, OrderStatus, PaymentMethod, TicketStatus, WaitlistStatus,
    event_entity as events, order_entity as orders, order_item_entity as order_items,
    ticket_entity as tickets, ticket_type_entity as ticket_types, user_entity as users,
    waitlist_entry_entity as waitlist,
};
use crate::error::{AppError, AppResult};
use crate::external::{EmailService, StripeService};
use crate::models::*;
use crate::utils::{generate_order_number, generate_unique_ticket_code, validate_email};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// 候补转正后的购票窗口
const RESERVATION_WINDOW_HOURS: i64 = 24;
const MAX_WAITLIST_QUANTITY: i32 = 10;

#[derive(Clone)]
pub struct WaitlistService {
    pool: DatabaseConnection,
    stripe_service: StripeService,
    email_service: EmailService,
}

impl WaitlistService {
    pub fn new(
        pool: DatabaseConnection,
        stripe_service: StripeService,
        email_service: EmailService,
    ) -> Self {
        Self {
            pool,
            stripe_service,
            email_service,
        }
    }

    pub async fn join_waitlist(
        &self,
        user_id: i64,
        request: JoinWaitlistRequest,
    ) -> AppResult<WaitlistEntryResponse> {
        if request.quantity < 1 || request.quantity > MAX_WAITLIST_QUANTITY {
            return Err(AppError::ValidationError(format!(
                "候补数量必须在1-{MAX_WAITLIST_QUANTITY}之间"
            )));
        }

        ticket_types::Entity::find_by_id(request.ticket_type_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

        // 通知邮箱默认用账号邮箱
        let email = match request.email {
            Some(email) => {
                validate_email(&email)?;
                email
            }
            None => {
                users::Entity::find_by_id(user_id)
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
                    .email
            }
        };

        // 同一票档一人一条在途候补
        let existing = waitlist::Entity::find()
            .filter(waitlist::Column::UserId.eq(user_id))
            .filter(waitlist::Column::TicketTypeId.eq(request.ticket_type_id))
            .filter(
                waitlist::Column::Status
                    .is_in([WaitlistStatus::Waiting, WaitlistStatus::Notified]),
            )
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Already on the waitlist for this ticket type".to_string(),
            ));
        }

        let entry = waitlist::ActiveModel {
            ticket_type_id: Set(request.ticket_type_id),
            user_id: Set(user_id),
            email: Set(email),
            quantity: Set(request.quantity),
            status: Set(WaitlistStatus::Waiting),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(WaitlistEntryResponse::from(entry))
    }

    pub async fn get_user_entries(&self, user_id: i64) -> AppResult<Vec<WaitlistEntryResponse>> {
        let entries = waitlist::Entity::find()
            .filter(waitlist::Column::UserId.eq(user_id))
            .order_by_desc(waitlist::Column::CreatedAt)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(WaitlistEntryResponse::from)
            .collect();
        Ok(entries)
    }

    /// 库存释放后把候补队列转成限时购票资格。
    ///
    /// 选取策略：按入队时间 FIFO，装不下的条目跳过，后面更小的请求仍有机会。
    /// 每个条目单独一个事务占库存；邮件在事务之外逐个发送，单个收件人
    /// 失败只记日志，不影响其余条目。
    pub async fn promote(&self, ticket_type_id: i64) -> AppResult<PromoteWaitlistResponse> {
        let tt = ticket_types::Entity::find_by_id(ticket_type_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

        let mut remaining = tt.remaining();
        if remaining <= 0 {
            // 没有可分配的库存，一个条目都不处理
            return Ok(PromoteWaitlistResponse {
                processed_count: 0,
                emails_sent: 0,
            });
        }

        let event = events::Entity::find_by_id(tt.event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let entries = waitlist::Entity::find()
            .filter(waitlist::Column::TicketTypeId.eq(ticket_type_id))
            .filter(waitlist::Column::Status.eq(WaitlistStatus::Waiting))
            .order_by_asc(waitlist::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let mut promoted: Vec<(waitlist::Model, DateTime<Utc>)> = Vec::new();
        for entry in entries {
            if remaining <= 0 {
                break;
            }
            let quantity = entry.quantity as i64;
            if quantity > remaining {
                continue;
            }

            let txn = self.pool.begin().await?;

            let reserve = ticket_types::Entity::update_many()
                .col_expr(
                    ticket_types::Column::QuantitySold,
                    Expr::col(ticket_types::Column::QuantitySold).add(quantity),
                )
                .filter(ticket_types::Column::Id.eq(ticket_type_id))
                .filter(ticket_types::Column::QuantitySold.lte(tt.quantity_available - quantity))
                .exec(&txn)
                .await?;
            if reserve.rows_affected == 0 {
                // 库存被正常售卖抢走了，队列后面的也不会有更多余量
                txn.rollback().await?;
                break;
            }

            let deadline = Utc::now() + Duration::hours(RESERVATION_WINDOW_HOURS);
            let updated = waitlist::Entity::update_many()
                .set(waitlist::ActiveModel {
                    status: Set(WaitlistStatus::Notified),
                    notified_at: Set(Some(Utc::now())),
                    reservation_expires_at: Set(Some(deadline)),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                })
                .filter(waitlist::Column::Id.eq(entry.id))
                .filter(waitlist::Column::Status.eq(WaitlistStatus::Waiting))
                .exec(&txn)
                .await?;
            if updated.rows_affected == 0 {
                // 条目已被取消或被别的 promote 处理，回滚本条占用
                txn.rollback().await?;
                continue;
            }

            txn.commit().await?;
            remaining -= quantity;
            promoted.push((entry, deadline));
        }

        // 通知放在事务之外：邮件失败不应影响已经占好的资格
        let mut emails_sent = 0i64;
        for (entry, deadline) in &promoted {
            if !self.email_service.is_configured() {
                log::warn!(
                    "Email service not configured, skipping notification for waitlist entry {}",
                    entry.id
                );
                continue;
            }
            match self
                .email_service
                .send_waitlist_promotion(&entry.email, &event.name, &tt.name, entry.quantity, deadline)
                .await
            {
                Ok(()) => emails_sent += 1,
                Err(e) => {
                    log::error!(
                        "Failed to notify waitlist entry {} ({}): {e:?}",
                        entry.id,
                        entry.email
                    );
                }
            }
        }

        log::info!(
            "Waitlist promotion for ticket type {ticket_type_id}: {} promoted, {emails_sent} notified",
            promoted.len()
        );
        Ok(PromoteWaitlistResponse {
            processed_count: promoted.len() as i64,
            emails_sent,
        })
    }

    /// 把在有效期内的候补资格转成待支付订单。
    /// 库存在转正时已经占住，这里不再动库存。
    pub async fn checkout_reservation(
        &self,
        user_id: i64,
        entry_id: i64,
    ) -> AppResult<CheckoutResponse> {
        let txn = self.pool.begin().await?;

        let entry = waitlist::Entity::find_by_id(entry_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Waitlist entry not found".to_string()))?;
        if entry.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }
        if entry.status != WaitlistStatus::Notified {
            return Err(AppError::ValidationError(
                "Waitlist entry has no live reservation".to_string(),
            ));
        }
        if entry.reservation_expires_at.is_none_or(|at| at < Utc::now()) {
            return Err(AppError::ValidationError(
                "Reservation has expired".to_string(),
            ));
        }

        let tt = ticket_types::Entity::find_by_id(entry.ticket_type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

        let total_amount = tt.price * entry.quantity as i64;
        let payment_intent = self
            .stripe_service
            .create_payment_intent(
                total_amount,
                user_id,
                "waitlist_order",
                Some(format!("Waitlist reservation {entry_id} checkout")),
            )
            .await?;

        let order = orders::ActiveModel {
            order_number: Set(generate_order_number()),
            user_id: Set(user_id),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Pending),
            payment_method: Set(PaymentMethod::Card),
            stripe_payment_intent_id: Set(Some(payment_intent.id.clone())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        order_items::ActiveModel {
            order_id: Set(order.id),
            item_type: Set(OrderItemType::Ticket),
            ticket_type_id: Set(Some(tt.id)),
            quantity: Set(entry.quantity),
            unit_price: Set(tt.price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for _ in 0..entry.quantity {
            let code = generate_unique_ticket_code(&txn).await?;
            tickets::ActiveModel {
                order_id: Set(order.id),
                ticket_type_id: Set(tt.id),
                status: Set(TicketStatus::Pending),
                code: Set(code),
                attendee_email: Set(Some(entry.email.clone())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let converted = waitlist::Entity::update_many()
            .set(waitlist::ActiveModel {
                status: Set(WaitlistStatus::Converted),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(waitlist::Column::Id.eq(entry.id))
            .filter(waitlist::Column::Status.eq(WaitlistStatus::Notified))
            .exec(&txn)
            .await?;
        if converted.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Reservation is no longer available".to_string(),
            ));
        }

        txn.commit().await?;

        log::info!(
            "Waitlist entry {entry_id} converted to order {}",
            order.order_number
        );
        Ok(CheckoutResponse {
            order: OrderResponse::from(order),
            payment_intent_id: payment_intent.id,
            client_secret: payment_intent.client_secret,
        })
    }

    /// 购票窗口过期的资格作废并释放占用的库存（定时任务调用）
    pub async fn expire_reservations(&self) -> AppResult<i64> {
        let stale = waitlist::Entity::find()
            .filter(waitlist::Column::Status.eq(WaitlistStatus::Notified))
            .filter(waitlist::Column::ReservationExpiresAt.lt(Utc::now()))
            .order_by_asc(waitlist::Column::ReservationExpiresAt)
            .limit(100)
            .all(&self.pool)
            .await?;

        let mut expired = 0i64;
        for entry in stale {
            let txn = self.pool.begin().await?;

            let result = waitlist::Entity::update_many()
                .set(waitlist::ActiveModel {
                    status: Set(WaitlistStatus::Expired),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                })
                .filter(waitlist::Column::Id.eq(entry.id))
                .filter(waitlist::Column::Status.eq(WaitlistStatus::Notified))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                txn.rollback().await?;
                continue;
            }

            ticket_types::Entity::update_many()
                .col_expr(
                    ticket_types::Column::QuantitySold,
                    Expr::col(ticket_types::Column::QuantitySold).sub(entry.quantity as i64),
                )
                .filter(ticket_types::Column::Id.eq(entry.ticket_type_id))
                .filter(ticket_types::Column::QuantitySold.gte(entry.quantity as i64))
                .exec(&txn)
                .await?;

            txn.commit().await?;
            expired += 1;
        }

        if expired > 0 {
            log::info!("Expired {expired} waitlist reservations");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmailConfig, StripeConfig};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> WaitlistService {
        WaitlistService::new(
            db,
            StripeService::new(StripeConfig {
                secret_key: "sk_test_unused".to_string(),
                webhook_secret: String::new(),
            }),
            // 未配置邮件服务：转正照常，只是跳过通知
            EmailService::new(EmailConfig::default()),
        )
    }

    fn ticket_type(quantity_available: i64, quantity_sold: i64) -> ticket_types::Model {
        ticket_types::Model {
            id: 1,
            event_id: 2,
            name: "GA".to_string(),
            price: 2500,
            quantity_available,
            quantity_sold,
            created_at: None,
            updated_at: None,
        }
    }

    fn entry(id: i64, quantity: i32) -> waitlist::Model {
        waitlist::Model {
            id,
            ticket_type_id: 1,
            user_id: 40 + id,
            email: format!("fan{id}@example.com"),
            quantity,
            status: WaitlistStatus::Waiting,
            notified_at: None,
            reservation_expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_promote_with_no_availability_is_a_noop() {
        // 已售罄：必须处理 0 条、发 0 封邮件，也不查询队列
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket_type(10, 10)]])
            .into_connection();
        let svc = service(db);

        let resp = svc.promote(1).await.unwrap();
        assert_eq!(resp.processed_count, 0);
        assert_eq!(resp.emails_sent, 0);
    }

    #[tokio::test]
    async fn test_promote_with_oversold_inventory_is_a_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket_type(10, 12)]])
            .into_connection();
        let svc = service(db);

        let resp = svc.promote(1).await.unwrap();
        assert_eq!(resp.processed_count, 0);
    }

    #[tokio::test]
    async fn test_promote_skips_entries_that_do_not_fit() {
        // 剩 2 张：队首要 5 张装不下被跳过，第二条要 2 张被转正
        let event = events::Model {
            id: 2,
            name: "Night Show".to_string(),
            venue: "Main Hall".to_string(),
            description: None,
            starts_at: Utc::now(),
            created_at: None,
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket_type(10, 8)]])
            .append_query_results([vec![event]])
            .append_query_results([vec![entry(1, 5), entry(2, 2)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let svc = service(db);

        let resp = svc.promote(1).await.unwrap();
        assert_eq!(resp.processed_count, 1);
        // 邮件服务未配置，不应计为已发送
        assert_eq!(resp.emails_sent, 0);
    }

    #[tokio::test]
    async fn test_join_waitlist_rejects_bad_quantity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = service(db);

        let err = svc
            .join_waitlist(
                9,
                JoinWaitlistRequest {
                    ticket_type_id: 1,
                    quantity: 0,
                    email: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
