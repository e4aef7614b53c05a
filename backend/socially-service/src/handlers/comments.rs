/// Comment handlers
use crate::db::Repositories;
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::Identity;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}

pub async fn list_comments(
    repos: web::Data<Repositories>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, "Invalid post ID")?;
    let comments = CommentService::new(repos.get_ref().clone())
        .list(post_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "comments": comments })))
}

pub async fn create_comment(
    repos: web::Data<Repositories>,
    identity: Identity,
    post_id: web::Path<String>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, "Invalid post ID")?;
    let comment = CommentService::new(repos.get_ref().clone())
        .create(&identity, post_id, req.into_inner().content)
        .await?;

    Ok(HttpResponse::Created().json(json!({ "comment": comment })))
}

pub async fn delete_comment(
    repos: web::Data<Repositories>,
    identity: Identity,
    comment_id: web::Path<String>,
) -> Result<HttpResponse> {
    let comment_id = parse_id(&comment_id, "Invalid comment ID")?;
    CommentService::new(repos.get_ref().clone())
        .delete(&identity, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
