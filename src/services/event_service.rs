use crate::entities::{event_entity as events, ticket_type_entity as ticket_types};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{PaginatedResponse, PaginationParams};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct EventService {
    pool: DatabaseConnection,
}

impl EventService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_events(&self, query: &EventQuery) -> AppResult<PaginatedResponse<EventResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let paginator = events::Entity::find()
            .order_by_asc(events::Column::StartsAt)
            .paginate(&self.pool, params.get_per_page() as u64);
        let total = paginator.num_items().await? as i64;
        let items = paginator
            .fetch_page((params.get_page() - 1) as u64)
            .await?
            .into_iter()
            .map(EventResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_event(&self, event_id: i64) -> AppResult<EventDetailResponse> {
        let event = events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let ticket_types = ticket_types::Entity::find()
            .filter(ticket_types::Column::EventId.eq(event_id))
            .order_by_asc(ticket_types::Column::Price)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(TicketTypeResponse::from)
            .collect();

        Ok(EventDetailResponse {
            event: EventResponse::from(event),
            ticket_types,
        })
    }

    pub async fn get_ticket_type(&self, ticket_type_id: i64) -> AppResult<ticket_types::Model> {
        ticket_types::Entity::find_by_id(ticket_type_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))
    }

    pub async fn create_event(&self, request: CreateEventRequest) -> AppResult<EventResponse> {
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("活动名称不能为空".to_string()));
        }

        let event = events::ActiveModel {
            name: Set(request.name.trim().to_string()),
            venue: Set(request.venue.trim().to_string()),
            description: Set(request.description),
            starts_at: Set(request.starts_at),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Event created: {} ({})", event.id, event.name);
        Ok(EventResponse::from(event))
    }

    pub async fn create_ticket_type(
        &self,
        request: CreateTicketTypeRequest,
    ) -> AppResult<TicketTypeResponse> {
        if request.price < 0 {
            return Err(AppError::ValidationError("票价不能为负数".to_string()));
        }
        if request.quantity_available < 0 {
            return Err(AppError::ValidationError("库存不能为负数".to_string()));
        }
        // 活动必须存在
        events::Entity::find_by_id(request.event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let ticket_type = ticket_types::ActiveModel {
            event_id: Set(request.event_id),
            name: Set(request.name.trim().to_string()),
            price: Set(request.price),
            quantity_available: Set(request.quantity_available),
            quantity_sold: Set(0),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(TicketTypeResponse::from(ticket_type))
    }

    /// 调整某票档的总容量。调小不能低于已售数；返回调整后的票档以及
    /// 容量是否增加（增加时调用方会触发候补转正）。
    pub async fn adjust_capacity(
        &self,
        ticket_type_id: i64,
        request: AdjustCapacityRequest,
    ) -> AppResult<(TicketTypeResponse, bool)> {
        if request.quantity_available < 0 {
            return Err(AppError::ValidationError("库存不能为负数".to_string()));
        }

        let ticket_type = self.get_ticket_type(ticket_type_id).await?;
        let increased = request.quantity_available > ticket_type.quantity_available;

        // 条件更新：已售数可能在读取后继续增长，guard 防止容量被压到已售之下
        let result = ticket_types::Entity::update_many()
            .col_expr(
                ticket_types::Column::QuantityAvailable,
                Expr::value(request.quantity_available),
            )
            .filter(ticket_types::Column::Id.eq(ticket_type_id))
            .filter(ticket_types::Column::QuantitySold.lte(request.quantity_available))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Capacity cannot be set below the quantity already sold".to_string(),
            ));
        }

        let updated = self.get_ticket_type(ticket_type_id).await?;
        Ok((TicketTypeResponse::from(updated), increased))
    }
}
