use crate::entities::{TicketStatus, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{PaginatedResponse, PaginationParams};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

#[derive(Clone)]
pub struct TicketService {
    pool: DatabaseConnection,
}

impl TicketService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 入场核销：active -> used，单向且只成功一次。
    /// 状态迁移通过条件更新完成，两个闸机同时扫同一张票只有一台会成功。
    pub async fn scan(&self, code: &str) -> AppResult<ScanTicketResponse> {
        let ticket = tickets::Entity::find()
            .filter(tickets::Column::Code.eq(code.to_string()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        match ticket.status {
            TicketStatus::Used => {
                return Err(AppError::ValidationError(
                    "Ticket already used".to_string(),
                ));
            }
            TicketStatus::Pending => {
                return Err(AppError::ValidationError(
                    "Ticket is not activated (payment pending)".to_string(),
                ));
            }
            TicketStatus::Cancelled => {
                return Err(AppError::ValidationError("Ticket was cancelled".to_string()));
            }
            TicketStatus::Active => {}
        }

        let result = tickets::Entity::update_many()
            .set(tickets::ActiveModel {
                status: Set(TicketStatus::Used),
                scanned_at: Set(Some(Utc::now())),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(tickets::Column::Id.eq(ticket.id))
            .filter(tickets::Column::Status.eq(TicketStatus::Active))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            // 读到 active 之后被别的闸机抢先核销了
            return Err(AppError::ValidationError(
                "Ticket already used".to_string(),
            ));
        }

        let ticket = tickets::Entity::find_by_id(ticket.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        log::info!("Ticket {} scanned", ticket.id);
        Ok(ScanTicketResponse {
            ticket: TicketResponse::from(ticket),
        })
    }

    /// 按码查询（验票页展示用，不改状态）
    pub async fn get_by_code(&self, code: &str) -> AppResult<TicketResponse> {
        let ticket = tickets::Entity::find()
            .filter(tickets::Column::Code.eq(code.to_string()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        Ok(TicketResponse::from(ticket))
    }

    pub async fn get_user_tickets(
        &self,
        user_id: i64,
        query: &TicketQuery,
    ) -> AppResult<PaginatedResponse<TicketResponse>> {
        use crate::entities::order_entity as orders;

        let params = PaginationParams::new(query.page, query.per_page);

        // 票不直接挂用户，经订单归属过滤
        let order_ids: Vec<i64> = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .select_only()
            .column(orders::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut find = tickets::Entity::find()
            .filter(tickets::Column::OrderId.is_in(order_ids))
            .order_by_desc(tickets::Column::CreatedAt);
        if let Some(status) = &query.status {
            find = find.filter(tickets::Column::Status.eq(status.clone()));
        }

        let paginator = find.paginate(&self.pool, params.get_per_page() as u64);
        let total = paginator.num_items().await? as i64;
        let items = paginator
            .fetch_page((params.get_page() - 1) as u64)
            .await?
            .into_iter()
            .map(TicketResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn ticket(status: TicketStatus) -> tickets::Model {
        tickets::Model {
            id: 11,
            order_id: 5,
            ticket_type_id: 1,
            status,
            code: "T3STT3STT3STT3STT3STT3STT3STT3ST".to_string(),
            attendee_name: None,
            attendee_email: None,
            scanned_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_scan_active_ticket_succeeds() {
        let mut used = ticket(TicketStatus::Used);
        used.scanned_at = Some(Utc::now());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket(TicketStatus::Active)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![used]])
            .into_connection();
        let svc = TicketService::new(db);

        let resp = svc.scan("T3STT3STT3STT3STT3STT3STT3STT3ST").await.unwrap();
        assert_eq!(resp.ticket.status, TicketStatus::Used);
        assert!(resp.ticket.scanned_at.is_some());
    }

    #[tokio::test]
    async fn test_scan_used_ticket_is_rejected_without_update() {
        // 第二次核销：读到 used 直接报错，不发任何 UPDATE（scanned_at 不会被改写）
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket(TicketStatus::Used)]])
            .into_connection();
        let svc = TicketService::new(db);

        let err = svc
            .scan("T3STT3STT3STT3STT3STT3STT3STT3ST")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("already used")));
    }

    #[tokio::test]
    async fn test_scan_pending_ticket_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket(TicketStatus::Pending)]])
            .into_connection();
        let svc = TicketService::new(db);

        let err = svc
            .scan("T3STT3STT3STT3STT3STT3STT3STT3ST")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("not activated")));
    }

    #[tokio::test]
    async fn test_scan_loses_race_reports_already_used() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ticket(TicketStatus::Active)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let svc = TicketService::new(db);

        let err = svc
            .scan("T3STT3STT3STT3STT3STT3STT3STT3ST")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("already used")));
    }
}
