/// Post handlers - HTTP endpoints for post operations
use crate::db::Repositories;
use crate::error::{AppError, Result};
use crate::handlers::parse_id;
use crate::middleware::Identity;
use crate::services::{FeedPage, PostService};
use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;
use serde_json::json;

const INVALID_POST_ID: &str = "Invalid post ID";

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Fields are optional so that missing content is reported after the
/// caller and post checks
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub content: Option<String>,
    pub image: Option<String>,
}

/// All posts, newest first
pub async fn list_posts(
    repos: web::Data<Repositories>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let page = FeedPage::new(query.limit, query.offset);
    let posts = PostService::new(repos.get_ref().clone()).feed(page).await?;

    Ok(HttpResponse::Ok().json(json!({ "posts": posts })))
}

/// Create a new post
pub async fn create_post(
    repos: web::Data<Repositories>,
    identity: Identity,
    req: web::Json<PostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let post = PostService::new(repos.get_ref().clone())
        .create(&identity, req.content, req.image)
        .await?;

    Ok(HttpResponse::Created().json(json!({ "post": post })))
}

/// Get a post by ID
pub async fn get_post(
    repos: web::Data<Repositories>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, INVALID_POST_ID)?;
    let post = PostService::new(repos.get_ref().clone()).get(post_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "post": post })))
}

pub async fn update_post(
    repos: web::Data<Repositories>,
    identity: Identity,
    post_id: web::Path<String>,
    req: web::Json<PostRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, INVALID_POST_ID)?;
    let req = req.into_inner();
    let post = PostService::new(repos.get_ref().clone())
        .update(&identity, post_id, req.content, req.image)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "post": post })))
}

pub async fn delete_post(
    repos: web::Data<Repositories>,
    identity: Identity,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_id(&post_id, INVALID_POST_ID)?;
    PostService::new(repos.get_ref().clone())
        .delete(&identity, post_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Whether the caller owns the post
///
/// Error bodies also carry `isOwner: false` so the post page can hide its
/// delete button without inspecting the status.
pub async fn check_ownership(
    repos: web::Data<Repositories>,
    identity: Option<Identity>,
    post_id: web::Path<String>,
) -> HttpResponse {
    let result = async {
        let identity = identity.ok_or_else(AppError::unauthorized)?;
        let post_id = parse_id(&post_id, INVALID_POST_ID)?;
        PostService::new(repos.get_ref().clone())
            .check_ownership(&identity, post_id)
            .await
    };

    match result.await {
        Ok(ownership) => HttpResponse::Ok().json(ownership),
        Err(err) => {
            let mut body = err.body();
            body["isOwner"] = json!(false);
            HttpResponse::build(err.status_code()).json(body)
        }
    }
}
