/// User handlers - profiles and the caller's own row
use crate::db::Repositories;
use crate::error::Result;
use crate::middleware::Identity;
use crate::services::{ProfileChanges, SyncUserInput, UserService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct SyncUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// GET /api/users
pub async fn get_current_user(
    repos: web::Data<Repositories>,
    identity: Identity,
) -> Result<HttpResponse> {
    let user = UserService::new(repos.get_ref().clone())
        .current_user(&identity)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// POST /api/users - create or refresh the caller's row
pub async fn sync_user(
    repos: web::Data<Repositories>,
    identity: Identity,
    req: Option<web::Json<SyncUserRequest>>,
) -> Result<HttpResponse> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let input = SyncUserInput {
        username: req.username,
        name: req.name,
        bio: req.bio,
        location: req.location,
        website: req.website,
    };

    let (user, created) = UserService::new(repos.get_ref().clone())
        .sync(&identity, input)
        .await?;

    let body = json!({ "user": user });
    Ok(if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}

/// GET /api/users/profile - created on first call
pub async fn get_profile(
    repos: web::Data<Repositories>,
    identity: Identity,
) -> Result<HttpResponse> {
    let (user, created) = UserService::new(repos.get_ref().clone())
        .get_or_create(&identity)
        .await?;

    let body = json!({ "user": user, "isNewUser": created });
    Ok(if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}

/// PATCH /api/users/profile
pub async fn update_profile(
    repos: web::Data<Repositories>,
    identity: Identity,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let changes = ProfileChanges {
        name: req.name,
        username: req.username,
        bio: req.bio,
        image: req.image,
        location: req.location,
        website: req.website,
    };

    let user = UserService::new(repos.get_ref().clone())
        .update_profile(&identity, changes)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": user,
        "message": "Profile updated successfully",
    })))
}

/// GET /api/users/{username}
pub async fn get_user_profile(
    repos: web::Data<Repositories>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = UserService::new(repos.get_ref().clone())
        .profile(&username)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "user": profile })))
}

pub async fn list_followers(
    repos: web::Data<Repositories>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let followers = UserService::new(repos.get_ref().clone())
        .followers(&username)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "followers": followers })))
}

pub async fn list_following(
    repos: web::Data<Repositories>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let following = UserService::new(repos.get_ref().clone())
        .following(&username)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "following": following })))
}
