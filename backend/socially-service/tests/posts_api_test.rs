//! Posts, comments and likes over the HTTP surface

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::{authed, token_for, MemoryStore};
use serde_json::json;

#[actix_rt::test]
async fn test_create_and_fetch_post() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let token = token_for("user_ada", "ada");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &token));

    let (status, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &token)
            .set_json(json!({ "content": "  Hello world  ", "image": "https://img/1.png" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["post"]["content"], "Hello world");
    let post_id = body["post"]["id"].as_i64().unwrap();

    let (status, body) = send!(
        app,
        TestRequest::get().uri(&format!("/api/posts/{post_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["author"]["username"], "ada");
    assert_eq!(body["post"]["image"], "https://img/1.png");
    assert_eq!(body["post"]["likes"], json!([]));
    assert_eq!(body["post"]["comments"], json!([]));
}

#[actix_rt::test]
async fn test_create_post_requires_content_and_profile() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let token = token_for("user_ada", "ada");

    // No profile row yet
    let (status, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &token)
            .set_json(json!({ "content": "hi" }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &token));

    for payload in [json!({}), json!({ "content": "" }), json!({ "content": "   " })] {
        let (status, body) = send!(
            app,
            authed(TestRequest::post().uri("/api/posts"), &token).set_json(payload)
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Content is required");
    }
}

#[actix_rt::test]
async fn test_invalid_and_missing_post_ids() {
    let store = MemoryStore::new();
    let app = test_app!(store);

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts/abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid post ID", "status": 400 }));

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts/999"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");
}

#[actix_rt::test]
async fn test_only_the_owner_may_edit_or_delete() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let ada = token_for("user_ada", "ada");
    let bob = token_for("user_bob", "bob");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &ada));
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &bob));

    let (_, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &ada)
            .set_json(json!({ "content": "Mine", "image": "https://img/a.png" }))
    );
    let uri = format!("/api/posts/{}", body["post"]["id"]);

    let (status, body) = send!(
        app,
        authed(TestRequest::patch().uri(&uri), &bob).set_json(json!({ "content": "Yours now" }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized to update this post");

    let (status, body) = send!(app, authed(TestRequest::delete().uri(&uri), &bob));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized to delete this post");

    let (status, body) = send!(
        app,
        authed(TestRequest::get().uri(&format!("{uri}/check-ownership")), &bob)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isOwner"], false);

    // Omitted image is kept
    let (status, body) = send!(
        app,
        authed(TestRequest::patch().uri(&uri), &ada).set_json(json!({ "content": "Edited" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["content"], "Edited");
    assert_eq!(body["post"]["image"], "https://img/a.png");

    // Blank image clears it
    let (_, body) = send!(
        app,
        authed(TestRequest::patch().uri(&uri), &ada).set_json(json!({ "image": "" }))
    );
    assert!(body["post"]["image"].is_null());
    assert_eq!(body["post"]["content"], "Edited");

    let (status, body) = send!(app, authed(TestRequest::delete().uri(&uri), &ada));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = send!(app, TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_like_toggle_returns_to_original_state() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let ada = token_for("user_ada", "ada");
    let bob = token_for("user_bob", "bob");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &ada));
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &bob));

    let (_, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &ada).set_json(json!({ "content": "Like me" }))
    );
    let likes_uri = format!("/api/posts/{}/likes", body["post"]["id"]);

    let (status, body) = send!(app, authed(TestRequest::post().uri(&likes_uri), &bob));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "liked": true }));

    let (_, body) = send!(app, TestRequest::get().uri(&likes_uri));
    assert_eq!(body["likes"][0]["user"]["username"], "bob");

    let (status, body) = send!(app, authed(TestRequest::post().uri(&likes_uri), &bob));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "liked": false }));

    let (_, body) = send!(app, TestRequest::get().uri(&likes_uri));
    assert_eq!(body["likes"], json!([]));
    assert_eq!(store.like_count(), 0);
}

#[actix_rt::test]
async fn test_like_on_missing_post_is_not_found() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let token = token_for("user_ada", "ada");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &token));

    let (status, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts/42/likes"), &token)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");
}

#[actix_rt::test]
async fn test_comments_lifecycle_and_permissions() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let ada = token_for("user_ada", "ada");
    let bob = token_for("user_bob", "bob");
    let cy = token_for("user_cy", "cy");
    for token in [&ada, &bob, &cy] {
        send!(app, authed(TestRequest::get().uri("/api/users/profile"), token));
    }

    let (_, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &ada).set_json(json!({ "content": "Thoughts?" }))
    );
    let comments_uri = format!("/api/posts/{}/comments", body["post"]["id"]);

    let (status, body) = send!(
        app,
        authed(TestRequest::post().uri(&comments_uri), &bob).set_json(json!({ "content": " " }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment content is required");

    let (status, first) = send!(
        app,
        authed(TestRequest::post().uri(&comments_uri), &bob).set_json(json!({ "content": "First" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["comment"]["author"]["username"], "bob");

    let (_, second) = send!(
        app,
        authed(TestRequest::post().uri(&comments_uri), &bob).set_json(json!({ "content": "Second" }))
    );

    let (_, body) = send!(app, TestRequest::get().uri(&comments_uri));
    assert_eq!(body["comments"][0]["content"], "Second");
    assert_eq!(body["comments"][1]["content"], "First");

    let first_uri = format!("/api/posts/comments/{}", first["comment"]["id"]);
    let second_uri = format!("/api/posts/comments/{}", second["comment"]["id"]);

    // Neither author nor post owner
    let (status, body) = send!(app, authed(TestRequest::delete().uri(&first_uri), &cy));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized to delete this comment");

    // Comment author
    let (status, _) = send!(app, authed(TestRequest::delete().uri(&first_uri), &bob));
    assert_eq!(status, StatusCode::OK);

    // Post owner
    let (status, _) = send!(app, authed(TestRequest::delete().uri(&second_uri), &ada));
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send!(app, authed(TestRequest::delete().uri(&first_uri), &bob));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Comment not found");
    assert_eq!(store.comment_count(), 0);
}

#[actix_rt::test]
async fn test_deleting_a_post_removes_its_activity() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let ada = token_for("user_ada", "ada");
    let bob = token_for("user_bob", "bob");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &ada));
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &bob));

    let (_, body) = send!(
        app,
        authed(TestRequest::post().uri("/api/posts"), &ada).set_json(json!({ "content": "Short-lived" }))
    );
    let uri = format!("/api/posts/{}", body["post"]["id"]);

    send!(app, authed(TestRequest::post().uri(&format!("{uri}/likes")), &bob));
    send!(
        app,
        authed(TestRequest::post().uri(&format!("{uri}/comments")), &bob)
            .set_json(json!({ "content": "Nice" }))
    );
    assert_eq!(store.notification_count(), 2);

    let (status, _) = send!(app, authed(TestRequest::delete().uri(&uri), &ada));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.like_count(), 0);
    assert_eq!(store.comment_count(), 0);
    assert_eq!(store.notification_count(), 0);
}

#[actix_rt::test]
async fn test_feed_is_newest_first_and_paginated() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let token = token_for("user_ada", "ada");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &token));

    for n in 1..=5 {
        send!(
            app,
            authed(TestRequest::post().uri("/api/posts"), &token)
                .set_json(json!({ "content": format!("post {n}") }))
        );
    }

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts"));
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 5);
    assert_eq!(posts[0]["content"], "post 5");
    assert_eq!(posts[0]["author"]["username"], "ada");

    let (_, body) = send!(app, TestRequest::get().uri("/api/posts?limit=2&offset=1"));
    let contents: Vec<&str> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["post 4", "post 3"]);

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts?limit=abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid query parameters");
}

#[actix_rt::test]
async fn test_feed_without_limit_returns_every_post() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let token = token_for("user_ada", "ada");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &token));

    for n in 1..=60 {
        send!(
            app,
            authed(TestRequest::post().uri("/api/posts"), &token)
                .set_json(json!({ "content": format!("post {n}") }))
        );
    }

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts"));
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 60);
    assert_eq!(posts[59]["content"], "post 1");

    let (_, body) = send!(app, TestRequest::get().uri("/api/posts?limit=10"));
    assert_eq!(body["posts"].as_array().unwrap().len(), 10);

    let (_, body) = send!(app, TestRequest::get().uri("/api/posts?offset=55"));
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);
}

#[actix_rt::test]
async fn test_ownership_errors_report_not_owner() {
    let store = MemoryStore::new();
    let app = test_app!(store);
    let ada = token_for("user_ada", "ada");
    send!(app, authed(TestRequest::get().uri("/api/users/profile"), &ada));

    let (status, body) = send!(app, TestRequest::get().uri("/api/posts/1/check-ownership"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "error": "Unauthorized", "status": 401, "isOwner": false })
    );

    let (status, body) = send!(
        app,
        authed(TestRequest::get().uri("/api/posts/999/check-ownership"), &ada)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");
    assert_eq!(body["isOwner"], false);

    let (status, body) = send!(
        app,
        authed(TestRequest::get().uri("/api/posts/abc/check-ownership"), &ada)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["isOwner"], false);
}
