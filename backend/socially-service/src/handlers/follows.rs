/// Follow handlers
use crate::db::Repositories;
use crate::error::Result;
use crate::middleware::Identity;
use crate::services::FollowService;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn follow_status(
    repos: web::Data<Repositories>,
    identity: Identity,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let following = FollowService::new(repos.get_ref().clone())
        .status(&identity, &username)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "following": following })))
}

/// Follow or unfollow; 201 when a follow was added
pub async fn toggle_follow(
    repos: web::Data<Repositories>,
    identity: Identity,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let following = FollowService::new(repos.get_ref().clone())
        .toggle(&identity, &username)
        .await?;

    let body = json!({ "following": following });
    Ok(if following {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}
