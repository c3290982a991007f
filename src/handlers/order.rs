use crate::models::*;
use crate::services::OrderService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/orders/checkout",
    tag = "order",
    request_body = CheckoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "下单成功", body = CheckoutResponse),
        (status = 400, description = "容量不足或参数错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn checkout(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service.checkout(user_id, request.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/confirm",
    tag = "order",
    request_body = ConfirmOrderRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "确认支付成功", body = OrderDetailResponse),
        (status = 400, description = "支付未完成"),
        (status = 401, description = "未授权")
    )
)]
pub async fn confirm(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<ConfirmOrderRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service
        .confirm_payment(user_id, request.into_inner())
        .await
    {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "订单状态")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取订单列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service.get_user_orders(user_id, &query).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{order_number}",
    tag = "order",
    params(("order_number" = String, Path, description = "订单号")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "获取订单详情成功", body = OrderDetailResponse),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service.get_order(user_id, &path.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(get_orders))
            .route("/checkout", web::post().to(checkout))
            .route("/confirm", web::post().to(confirm))
            .route("/{order_number}", web::get().to(get_order)),
    );
}
