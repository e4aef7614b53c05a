/// Notification handlers
use crate::db::Repositories;
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::Identity;
use crate::services::NotificationService;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// GET /api/notifications
pub async fn list_notifications(
    repos: web::Data<Repositories>,
    identity: Identity,
) -> Result<HttpResponse> {
    let feed = NotificationService::new(repos.get_ref().clone())
        .list(&identity)
        .await?;

    Ok(HttpResponse::Ok().json(feed))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read(
    repos: web::Data<Repositories>,
    identity: Identity,
    notification_id: web::Path<String>,
) -> Result<HttpResponse> {
    let notification_id = parse_id(&notification_id, "Invalid notification ID")?;
    NotificationService::new(repos.get_ref().clone())
        .mark_read(&identity, notification_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    repos: web::Data<Repositories>,
    identity: Identity,
) -> Result<HttpResponse> {
    let updated = NotificationService::new(repos.get_ref().clone())
        .mark_all_read(&identity)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}
