/// Health endpoints for probes and load balancers
use crate::db::Repositories;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

const SERVICE_NAME: &str = "socially-service";

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize, Debug)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Debug)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

/// GET /api/health
pub async fn health_summary(repos: web::Data<Repositories>) -> HttpResponse {
    match repos.health.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": SERVICE_NAME,
            }))
        }
    }
}

/// GET /api/health/ready
pub async fn readiness(repos: web::Data<Repositories>) -> HttpResponse {
    let start = Instant::now();
    let result = repos.health.ping().await;
    let latency_ms = Some(start.elapsed().as_millis() as u64);

    let postgres = match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: "PostgreSQL connection failed".to_string(),
                latency_ms,
            }
        }
    };

    let ready = postgres.status == ComponentStatus::Healthy;
    let mut checks = HashMap::new();
    checks.insert("postgresql".to_string(), postgres);

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// GET /api/health/live
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "alive": true }))
}
