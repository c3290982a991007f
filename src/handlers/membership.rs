use crate::models::*;
use crate::services::MembershipService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/memberships/create-payment-intent",
    tag = "membership",
    request_body = CreateMembershipIntentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "创建会员支付意图成功", body = CreateMembershipIntentResponse),
        (status = 400, description = "已有生效会员或参数错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_membership_intent(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
    request: web::Json<CreateMembershipIntentRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service
        .create_membership_intent(user_id, request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/memberships/confirm",
    tag = "membership",
    request_body = ConfirmMembershipRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "确认会员支付成功", body = ConfirmMembershipResponse),
        (status = 400, description = "支付未完成"),
        (status = 401, description = "未授权")
    )
)]
pub async fn confirm_membership(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
    request: web::Json<ConfirmMembershipRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service
        .confirm_membership(user_id, request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/memberships/me",
    tag = "membership",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取会员状态成功", body = MembershipResponse),
        (status = 404, description = "没有会员记录")
    )
)]
pub async fn get_membership(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service.get_membership(user_id).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/memberships/cancel",
    tag = "membership",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "取消会员成功", body = MembershipResponse),
        (status = 404, description = "没有生效中的会员")
    )
)]
pub async fn cancel_membership(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service.cancel_membership(user_id).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/memberships/redeem",
    tag = "membership",
    request_body = RedeemCreditRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "额度换票成功", body = RedeemCreditResponse),
        (status = 400, description = "额度不足或容量不足"),
        (status = 401, description = "未授权")
    )
)]
pub async fn redeem_credit(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
    request: web::Json<RedeemCreditRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service
        .redeem_credit(user_id, request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn membership_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/memberships")
            .route(
                "/create-payment-intent",
                web::post().to(create_membership_intent),
            )
            .route("/confirm", web::post().to(confirm_membership))
            .route("/me", web::get().to(get_membership))
            .route("/cancel", web::post().to(cancel_membership))
            .route("/redeem", web::post().to(redeem_credit)),
    );
}
