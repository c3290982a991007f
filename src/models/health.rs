use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: ComponentHealth,
    pub email: ComponentHealth,
}

impl HealthResponse {
    /// 整体状态取各组件里最差的一档
    pub fn overall(database: ComponentHealth, email: ComponentHealth) -> Self {
        let status = match (&database.status, &email.status) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Ok,
        };
        Self {
            status,
            database,
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_takes_worst_component() {
        let resp = HealthResponse::overall(
            ComponentHealth {
                status: HealthStatus::Ok,
                latency_ms: Some(12),
            },
            ComponentHealth {
                status: HealthStatus::Degraded,
                latency_ms: None,
            },
        );
        assert_eq!(resp.status, HealthStatus::Degraded);

        let resp = HealthResponse::overall(
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
            },
            ComponentHealth {
                status: HealthStatus::Ok,
                latency_ms: None,
            },
        );
        assert_eq!(resp.status, HealthStatus::Unhealthy);
    }
}
