use crate::external::EmailService;
use crate::models::*;
use actix_web::{HttpResponse, Result, web};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::json;
use std::time::Instant;

/// 数据库往返超过该阈值视为降级
const DB_LATENCY_DEGRADED_MS: u64 = 1000;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务正常或降级", body = HealthResponse),
        (status = 503, description = "服务不可用", body = HealthResponse)
    )
)]
pub async fn health(
    pool: web::Data<DatabaseConnection>,
    email_service: web::Data<EmailService>,
) -> Result<HttpResponse> {
    let backend = pool.get_database_backend();
    let started = Instant::now();
    let database = match pool
        .execute(Statement::from_string(backend, "SELECT 1".to_owned()))
        .await
    {
        Ok(_) => {
            let latency_ms = started.elapsed().as_millis() as u64;
            let status = if latency_ms > DB_LATENCY_DEGRADED_MS {
                HealthStatus::Degraded
            } else {
                HealthStatus::Ok
            };
            ComponentHealth {
                status,
                latency_ms: Some(latency_ms),
            }
        }
        Err(e) => {
            log::error!("Health check database probe failed: {e}");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
            }
        }
    };

    let email = ComponentHealth {
        status: if email_service.is_configured() {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        latency_ms: None,
    };

    let resp = HealthResponse::overall(database, email);
    let unhealthy = resp.status == HealthStatus::Unhealthy;
    let body = json!({"success": !unhealthy, "data": resp});
    if unhealthy {
        Ok(HttpResponse::ServiceUnavailable().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
