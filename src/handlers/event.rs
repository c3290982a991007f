use crate::models::*;
use crate::services::{EventService, ProductService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/events",
    tag = "event",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    responses(
        (status = 200, description = "获取活动列表成功")
    )
)]
pub async fn list_events(
    event_service: web::Data<EventService>,
    query: web::Query<EventQuery>,
) -> Result<HttpResponse> {
    match event_service.list_events(&query).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "event",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "获取活动详情成功", body = EventDetailResponse),
        (status = 404, description = "活动不存在")
    )
)]
pub async fn get_event(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match event_service.get_event(path.into_inner()).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "product",
    responses(
        (status = 200, description = "获取商品列表成功")
    )
)]
pub async fn list_products(product_service: web::Data<ProductService>) -> Result<HttpResponse> {
    match product_service.list_products().await {
        Ok(resp) => Ok(HttpResponse::Ok().json(json!({"success": true, "data": resp}))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("/{id}", web::get().to(get_event)),
    );
    cfg.service(web::scope("/products").route("", web::get().to(list_products)));
}
