use crate::models::*;
use crate::services::{EventService, OrderService, ProductService, UserService, WaitlistService};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Duration;
use serde_json::json;

/// 待支付订单超时时长（与定时任务一致）
const PENDING_ORDER_TTL_MINUTES: i64 = 30;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/admin/events",
    tag = "admin",
    request_body = CreateEventRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建活动成功", body = EventResponse),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn create_event(
    event_service: web::Data<EventService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match event_service.create_event(request.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/ticket-types",
    tag = "admin",
    request_body = CreateTicketTypeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建票档成功", body = TicketTypeResponse),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn create_ticket_type(
    event_service: web::Data<EventService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<CreateTicketTypeRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match event_service.create_ticket_type(request.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/ticket-types/{id}/capacity",
    tag = "admin",
    params(("id" = i64, Path, description = "票档ID")),
    request_body = AdjustCapacityRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "调整容量成功；扩容会触发候补转正", body = TicketTypeResponse),
        (status = 400, description = "容量低于已售数"),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn adjust_capacity(
    event_service: web::Data<EventService>,
    waitlist_service: web::Data<WaitlistService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AdjustCapacityRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    let ticket_type_id = path.into_inner();
    match event_service
        .adjust_capacity(ticket_type_id, request.into_inner())
        .await
    {
        Ok((resp, increased)) => {
            // 扩容释放了库存，顺手处理候补队列
            let mut promotion: Option<PromoteWaitlistResponse> = None;
            if increased {
                match waitlist_service.promote(ticket_type_id).await {
                    Ok(outcome) => promotion = Some(outcome),
                    Err(e) => {
                        log::error!(
                            "Waitlist promotion after capacity increase failed: {e:?}"
                        );
                    }
                }
            }
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": {
                    "ticket_type": resp,
                    "waitlist_promotion": promotion
                }
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/products",
    tag = "admin",
    request_body = CreateProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建商品成功", body = ProductResponse),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn create_product(
    product_service: web::Data<ProductService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match product_service.create_product(request.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/waitlist/{ticket_type_id}/promote",
    tag = "admin",
    params(("ticket_type_id" = i64, Path, description = "票档ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "候补转正完成", body = PromoteWaitlistResponse),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn promote_waitlist(
    waitlist_service: web::Data<WaitlistService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match waitlist_service.promote(path.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": resp,
            "message": "候补转正完成"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/orders/expire-pending",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "清理超时订单完成"),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn expire_pending_orders(
    order_service: web::Data<OrderService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match order_service
        .expire_pending_orders(Duration::minutes(PENDING_ORDER_TTL_MINUTES))
        .await
    {
        Ok(count) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "expired_count": count },
            "message": "超时订单清理完成"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/events", web::post().to(create_event))
            .route("/ticket-types", web::post().to(create_ticket_type))
            .route(
                "/ticket-types/{id}/capacity",
                web::put().to(adjust_capacity),
            )
            .route("/products", web::post().to(create_product))
            .route(
                "/waitlist/{ticket_type_id}/promote",
                web::post().to(promote_waitlist),
            )
            .route("/orders/expire-pending", web::post().to(expire_pending_orders)),
    );
}
