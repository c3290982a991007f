use crate::entities::{
    OrderItemType, OrderStatus, PaymentMethod, TicketStatus, order_entity as orders,
    order_item_entity as order_items, product_entity as products, ticket_entity as tickets,
    ticket_type_entity as ticket_types,
};
use crate::error::{AppError, AppResult};
use crate::external::StripeService;
use crate::models::*;
use crate::utils::{
    PaginatedResponse, PaginationParams, generate_order_number, generate_unique_ticket_code,
};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    stripe_service: StripeService,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection, stripe_service: StripeService) -> Self {
        Self {
            pool,
            stripe_service,
        }
    }

    /// 结算购物车：在一个事务里完成库存占用、订单/订单行/票的写入。
    /// 任何一行容量不足整单失败，不会留下半个订单。
    pub async fn checkout(
        &self,
        user_id: i64,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutResponse> {
        if request.items.is_empty() {
            return Err(AppError::ValidationError("购物车不能为空".to_string()));
        }
        for item in &request.items {
            if item.quantity < 1 {
                return Err(AppError::ValidationError(
                    "每行数量必须至少为1".to_string(),
                ));
            }
        }

        let txn = self.pool.begin().await?;

        // 先占库存并按目录价计算总额
        let mut total_amount = 0i64;
        let mut priced_items: Vec<(CheckoutLineItem, i64)> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let unit_price = match item.item_type {
                OrderItemType::Ticket => {
                    let tt = Self::reserve_ticket_quantity(&txn, item.reference_id, item.quantity)
                        .await?;
                    tt.price
                }
                OrderItemType::Product => {
                    let p = Self::reserve_product_stock(&txn, item.reference_id, item.quantity)
                        .await?;
                    p.price
                }
            };
            total_amount += unit_price * item.quantity as i64;
            priced_items.push((item.clone(), unit_price));
        }

        // 支付意图失败时事务直接回滚，库存不会泄漏
        let payment_intent = self
            .stripe_service
            .create_payment_intent(
                total_amount,
                user_id,
                "order",
                Some(format!("Order checkout for user {user_id}")),
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

        for (item, unit_price) in &priced_items {
            order_items::ActiveModel {
                order_id: Set(order.id),
                item_type: Set(item.item_type.clone()),
                ticket_type_id: Set(matches!(item.item_type, OrderItemType::Ticket)
                    .then_some(item.reference_id)),
                product_id: Set(matches!(item.item_type, OrderItemType::Product)
                    .then_some(item.reference_id)),
                quantity: Set(item.quantity),
                unit_price: Set(*unit_price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            // 每张票一条记录，核销码即时生成
            if item.item_type == OrderItemType::Ticket {
                for _ in 0..item.quantity {
                    let code = generate_unique_ticket_code(&txn).await?;
                    tickets::ActiveModel {
                        order_id: Set(order.id),
                        ticket_type_id: Set(item.reference_id),
                        status: Set(TicketStatus::Pending),
                        code: Set(code),
                        attendee_name: Set(request.attendee_name.clone()),
                        attendee_email: Set(request.attendee_email.clone()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;

        log::info!(
            "Order {} created for user {user_id}, total {total_amount} cents",
            order.order_number
        );
        Ok(CheckoutResponse {
            order: OrderResponse::from(order),
            payment_intent_id: payment_intent.id,
            client_secret: payment_intent.client_secret,
        })
    }

    /// 原子占用票档库存：guard 写在 UPDATE 的 WHERE 里，
    /// 并发下超卖的那一方 rows_affected 为 0。
    async fn reserve_ticket_quantity(
        txn: &DatabaseTransaction,
        ticket_type_id: i64,
        quantity: i32,
    ) -> AppResult<ticket_types::Model> {
        let tt = ticket_types::Entity::find_by_id(ticket_type_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

        if tt.remaining() < quantity as i64 {
            return Err(AppError::CapacityError(format!(
                "Only {} of '{}' left",
                tt.remaining().max(0),
                tt.name
            )));
        }

        let result = ticket_types::Entity::update_many()
            .col_expr(
                ticket_types::Column::QuantitySold,
                Expr::col(ticket_types::Column::QuantitySold).add(quantity as i64),
            )
            .filter(ticket_types::Column::Id.eq(ticket_type_id))
            .filter(
                ticket_types::Column::QuantitySold
                    .lte(tt.quantity_available - quantity as i64),
            )
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::CapacityError(format!(
                "'{}' just sold out",
                tt.name
            )));
        }

        Ok(tt)
    }

    async fn reserve_product_stock(
        txn: &DatabaseTransaction,
        product_id: i64,
        quantity: i32,
    ) -> AppResult<products::Model> {
        let product = products::Entity::find_by_id(product_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if product.stock_quantity < quantity as i64 {
            return Err(AppError::CapacityError(format!(
                "Only {} of '{}' in stock",
                product.stock_quantity.max(0),
                product.name
            )));
        }

        let result = products::Entity::update_many()
            .col_expr(
                products::Column::StockQuantity,
                Expr::col(products::Column::StockQuantity).sub(quantity as i64),
            )
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::StockQuantity.gte(quantity as i64))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::CapacityError(format!(
                "'{}' just went out of stock",
                product.name
            )));
        }

        Ok(product)
    }

    /// 确认支付：pending -> completed，同一事务里激活整单的票。重复确认幂等。
    pub async fn confirm_payment(
        &self,
        user_id: i64,
        request: ConfirmOrderRequest,
    ) -> AppResult<OrderDetailResponse> {
        let order = orders::Entity::find()
            .filter(orders::Column::OrderNumber.eq(request.order_number.clone()))
            .filter(orders::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        match order.status {
            OrderStatus::Completed => {
                // 已处理过，直接返回
                return self.load_order_detail(&self.pool, order).await;
            }
            OrderStatus::Cancelled => {
                return Err(AppError::ValidationError(
                    "Order was cancelled".to_string(),
                ));
            }
            OrderStatus::Pending => {}
        }

        let payment_intent_id = order
            .stripe_payment_intent_id
            .clone()
            .ok_or_else(|| AppError::ValidationError("Order has no payment intent".to_string()))?;
        let payment_intent = self
            .stripe_service
            .retrieve_payment_intent(&payment_intent_id)
            .await?;
        if !payment_intent.is_succeeded() {
            return Err(AppError::ValidationError("Payment not successful".to_string()));
        }

        let txn = self.pool.begin().await?;

        let result = orders::Entity::update_many()
            .set(orders::ActiveModel {
                status: Set(OrderStatus::Completed),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::Status.eq(OrderStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 1 {
            tickets::Entity::update_many()
                .set(tickets::ActiveModel {
                    status: Set(TicketStatus::Active),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                })
                .filter(tickets::Column::OrderId.eq(order.id))
                .filter(tickets::Column::Status.eq(TicketStatus::Pending))
                .exec(&txn)
                .await?;
        }
        // rows_affected == 0: 并发确认已经完成了状态迁移，继续读最新状态返回

        txn.commit().await?;

        let order = orders::Entity::find_by_id(order.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.load_order_detail(&self.pool, order).await
    }

    pub async fn get_user_orders(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut find = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .order_by_desc(orders::Column::CreatedAt);
        if let Some(status) = &query.status {
            find = find.filter(orders::Column::Status.eq(status.clone()));
        }

        let paginator = find.paginate(&self.pool, params.get_per_page() as u64);
        let total = paginator.num_items().await? as i64;
        let items = paginator
            .fetch_page((params.get_page() - 1) as u64)
            .await?
            .into_iter()
            .map(OrderResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_order(
        &self,
        user_id: i64,
        order_number: &str,
    ) -> AppResult<OrderDetailResponse> {
        let order = orders::Entity::find()
            .filter(orders::Column::OrderNumber.eq(order_number.to_string()))
            .filter(orders::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        self.load_order_detail(&self.pool, order).await
    }

    async fn load_order_detail<C: ConnectionTrait>(
        &self,
        db: &C,
        order: orders::Model,
    ) -> AppResult<OrderDetailResponse> {
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(db)
            .await?
            .into_iter()
            .map(OrderItemResponse::from)
            .collect();
        let order_tickets = tickets::Entity::find()
            .filter(tickets::Column::OrderId.eq(order.id))
            .all(db)
            .await?
            .into_iter()
            .map(TicketResponse::from)
            .collect();

        Ok(OrderDetailResponse {
            order: OrderResponse::from(order),
            items,
            tickets: order_tickets,
        })
    }

    /// 清理超时未支付的订单：取消订单和票，并把占用的库存放回去。
    /// 定时任务与管理端手动触发共用。
    pub async fn expire_pending_orders(&self, ttl: Duration) -> AppResult<i64> {
        let cutoff = Utc::now() - ttl;
        let stale = orders::Entity::find()
            .filter(orders::Column::Status.eq(OrderStatus::Pending))
            .filter(orders::Column::CreatedAt.lt(cutoff))
            .order_by_asc(orders::Column::CreatedAt)
            .limit(100)
            .all(&self.pool)
            .await?;

        let mut expired = 0i64;
        for order in stale {
            match self.expire_one(&order).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => {
                    log::error!("Failed to expire order {}: {e:?}", order.order_number);
                }
            }
        }
        Ok(expired)
    }

    async fn expire_one(&self, order: &orders::Model) -> AppResult<bool> {
        let txn = self.pool.begin().await?;

        // 用户可能恰好在此刻完成支付，guard 在 pending 上
        let result = orders::Entity::update_many()
            .set(orders::ActiveModel {
                status: Set(OrderStatus::Cancelled),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::Status.eq(OrderStatus::Pending))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.commit().await?;
            return Ok(false);
        }

        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&txn)
            .await?;
        for item in items {
            match item.item_type {
                OrderItemType::Ticket => {
                    if let Some(ticket_type_id) = item.ticket_type_id {
                        ticket_types::Entity::update_many()
                            .col_expr(
                                ticket_types::Column::QuantitySold,
                                Expr::col(ticket_types::Column::QuantitySold)
                                    .sub(item.quantity as i64),
                            )
                            .filter(ticket_types::Column::Id.eq(ticket_type_id))
                            .filter(ticket_types::Column::QuantitySold.gte(item.quantity as i64))
                            .exec(&txn)
                            .await?;
                    }
                }
                OrderItemType::Product => {
                    if let Some(product_id) = item.product_id {
                        products::Entity::update_many()
                            .col_expr(
                                products::Column::StockQuantity,
                                Expr::col(products::Column::StockQuantity)
                                    .add(item.quantity as i64),
                            )
                            .filter(products::Column::Id.eq(product_id))
                            .exec(&txn)
                            .await?;
                    }
                }
            }
        }

        tickets::Entity::update_many()
            .set(tickets::ActiveModel {
                status: Set(TicketStatus::Cancelled),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(tickets::Column::OrderId.eq(order.id))
            .filter(tickets::Column::Status.eq(TicketStatus::Pending))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!("Expired pending order {}", order.order_number);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripeConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn stripe() -> StripeService {
        StripeService::new(StripeConfig {
            secret_key: "sk_test_unused".to_string(),
            webhook_secret: String::new(),
        })
    }

    fn ticket_type(quantity_available: i64, quantity_sold: i64) -> ticket_types::Model {
        ticket_types::Model {
            id: 1,
            event_id: 1,
            name: "GA".to_string(),
            price: 2500,
            quantity_available,
            quantity_sold,
            created_at: None,
            updated_at: None,
        }
    }

    fn line(quantity: i32) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CheckoutLineItem {
                item_type: OrderItemType::Ticket,
                reference_id: 1,
                quantity,
            }],
            attendee_name: None,
            attendee_email: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = OrderService::new(db, stripe());

        let err = svc
            .checkout(
                1,
                CheckoutRequest {
                    items: vec![],
                    attendee_name: None,
                    attendee_email: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_checkout_rejects_zero_quantity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = OrderService::new(db, stripe());

        let err = svc.checkout(1, line(0)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_checkout_fails_when_sold_out() {
        // 10 张全部售出，结算 1 张必须整单失败
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket_type(10, 10)]])
            .into_connection();
        let svc = OrderService::new(db, stripe());

        let err = svc.checkout(7, line(1)).await.unwrap_err();
        assert!(matches!(err, AppError::CapacityError(_)));
    }

    #[tokio::test]
    async fn test_checkout_fails_when_losing_the_last_unit_race() {
        // 读到还剩 1 张，但条件更新没命中任何行：并发请求先占走了
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket_type(10, 9)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = OrderService::new(db, stripe());

        let err = svc.checkout(7, line(1)).await.unwrap_err();
        assert!(matches!(err, AppError::CapacityError(_)));
    }
}
