use crate::models::*;
use crate::services::{TicketService, UserService};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/tickets",
    tag = "ticket",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "票状态")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取我的票列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_tickets(
    ticket_service: web::Data<TicketService>,
    req: HttpRequest,
    query: web::Query<TicketQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match ticket_service.get_user_tickets(user_id, &query).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/tickets/{code}",
    tag = "ticket",
    params(("code" = String, Path, description = "核销码")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "查询票成功", body = TicketResponse),
        (status = 404, description = "票不存在")
    )
)]
pub async fn get_ticket(
    ticket_service: web::Data<TicketService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match ticket_service.get_by_code(&path.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/tickets/scan",
    tag = "ticket",
    request_body = ScanTicketRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "核销成功", body = ScanTicketResponse),
        (status = 400, description = "票已核销或状态不允许"),
        (status = 403, description = "无核销权限")
    )
)]
pub async fn scan_ticket(
    ticket_service: web::Data<TicketService>,
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<ScanTicketRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    // 核销是场馆侧操作，仅管理角色可用
    if let Err(e) = user_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match ticket_service.scan(&request.code).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("", web::get().to(get_tickets))
            .route("/scan", web::post().to(scan_ticket))
            .route("/{code}", web::get().to(get_ticket)),
    );
}
