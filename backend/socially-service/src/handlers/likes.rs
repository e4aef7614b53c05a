/// Like handlers
use crate::db::Repositories;
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::Identity;
use crate::services::LikeService;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn list_likes(
    repos: web::Data<Repositories>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, "Invalid post ID")?;
    let likes = LikeService::new(repos.get_ref().clone()).list(post_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "likes": likes })))
}

/// Like or unlike; 201 when a like was added
pub async fn toggle_like(
    repos: web::Data<Repositories>,
    identity: Identity,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, "Invalid post ID")?;
    let liked = LikeService::new(repos.get_ref().clone())
        .toggle(&identity, post_id)
        .await?;

    let body = json!({ "liked": liked });
    Ok(if liked {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}
