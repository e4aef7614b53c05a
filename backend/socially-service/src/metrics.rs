//! Prometheus metrics for socially-service.
//!
//! Domain counters plus the `/metrics` handler. HTTP request metrics come
//! from `actix_middleware::MetricsMiddleware`, pool gauges from `db_pool`.

use actix_web::HttpResponse;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static::lazy_static! {
    /// Social actions by kind (post_created, like, unlike, follow, ...)
    pub static ref SOCIAL_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "socially_actions_total",
        "Social actions performed by users",
        &["action"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Notification writes by kind and outcome
    pub static ref NOTIFICATIONS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "socially_notifications_recorded_total",
        "Notifications recorded for recipients",
        &["kind", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub fn record_action(action: &str) {
    SOCIAL_ACTIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
