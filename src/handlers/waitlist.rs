use crate::models::*;
use crate::services::WaitlistService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/waitlist",
    tag = "waitlist",
    request_body = JoinWaitlistRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "加入候补成功", body = WaitlistEntryResponse),
        (status = 400, description = "已在候补或参数错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn join_waitlist(
    waitlist_service: web::Data<WaitlistService>,
    req: HttpRequest,
    request: web::Json<JoinWaitlistRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match waitlist_service
        .join_waitlist(user_id, request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/waitlist",
    tag = "waitlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取我的候补列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_waitlist_entries(
    waitlist_service: web::Data<WaitlistService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match waitlist_service.get_user_entries(user_id).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/waitlist/{id}/checkout",
    tag = "waitlist",
    params(("id" = i64, Path, description = "候补条目ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "候补资格下单成功", body = CheckoutResponse),
        (status = 400, description = "资格已过期或状态不允许"),
        (status = 401, description = "未授权")
    )
)]
pub async fn checkout_reservation(
    waitlist_service: web::Data<WaitlistService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match waitlist_service
        .checkout_reservation(user_id, path.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn waitlist_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/waitlist")
            .route("", web::post().to(join_waitlist))
            .route("", web::get().to(get_waitlist_entries))
            .route("/{id}/checkout", web::post().to(checkout_reservation)),
    );
}
