/// HTTP handlers for socially-service
///
/// Every route lives under `/api`. Bodies and query strings that fail to
/// parse are answered with the same JSON error shape as everything else.
use crate::error::AppError;
use actix_web::{error, web, HttpRequest};

pub mod comments;
pub mod follows;
pub mod health;
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod users;

/// Parse a numeric path segment
pub(crate) fn parse_id(raw: &str, message: &'static str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::bad_request(message))
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected JSON body");
    AppError::bad_request("Invalid JSON body").into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected query string");
    AppError::bad_request("Invalid query parameters").into()
}

/// Register every route plus the extractor configs
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/health")
                        .route("", web::get().to(health::health_summary))
                        .route("/ready", web::get().to(health::readiness))
                        .route("/live", web::get().to(health::liveness)),
                )
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        .service(
                            web::resource("/comments/{comment_id}")
                                .route(web::delete().to(comments::delete_comment)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(posts::get_post))
                                .route(web::patch().to(posts::update_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .service(
                            web::resource("/{post_id}/check-ownership")
                                .route(web::get().to(posts::check_ownership)),
                        )
                        .service(
                            web::resource("/{post_id}/comments")
                                .route(web::get().to(comments::list_comments))
                                .route(web::post().to(comments::create_comment)),
                        )
                        .service(
                            web::resource("/{post_id}/likes")
                                .route(web::get().to(likes::list_likes))
                                .route(web::post().to(likes::toggle_like)),
                        ),
                )
                .service(
                    web::scope("/users")
                        .service(
                            web::resource("")
                                .route(web::get().to(users::get_current_user))
                                .route(web::post().to(users::sync_user)),
                        )
                        .service(
                            web::resource("/profile")
                                .route(web::get().to(users::get_profile))
                                .route(web::patch().to(users::update_profile)),
                        )
                        .service(
                            web::resource("/{username}")
                                .route(web::get().to(users::get_user_profile)),
                        )
                        .service(
                            web::resource("/{username}/follow")
                                .route(web::get().to(follows::follow_status))
                                .route(web::post().to(follows::toggle_follow)),
                        )
                        .service(
                            web::resource("/{username}/followers")
                                .route(web::get().to(users::list_followers)),
                        )
                        .service(
                            web::resource("/{username}/following")
                                .route(web::get().to(users::list_following)),
                        ),
                )
                .service(
                    web::scope("/notifications")
                        .route("", web::get().to(notifications::list_notifications))
                        .route("/read-all", web::post().to(notifications::mark_all_read))
                        .route("/{id}/read", web::patch().to(notifications::mark_read)),
                ),
        );
}
