//! 电影目录 API 集成测试

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{assert_error_body, create_test_app, TestApp};

struct Tokens {
    admin: String,
    regular: String,
}

async fn setup() -> (TestApp, Tokens) {
    let app = create_test_app();
    let admin = app.admin_token("root", "root-pass").await;
    app.register("alice", "pw1").await;
    let regular = app.login("alice", "pw1").await;

    (app, Tokens { admin, regular })
}

#[tokio::test]
async fn test_create_and_read_movie() {
    let (app, tokens) = setup().await;

    let (status, movie) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.admin),
            Some(json!({
                "title": "A New Hope",
                "director": "George Lucas",
                "releaseDate": "1977-05-25",
                "externalId": "1"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movie["title"], "A New Hope");
    assert_eq!(movie["releaseDate"], "1977-05-25");
    // externalId 只由同步任务写入
    assert!(movie["externalId"].is_null());

    let (status, list) = app.get("/movies", Some(&tokens.regular)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, list) = app.get("/movies", Some(&tokens.admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/movies/{}", movie["id"].as_str().unwrap());
    let (status, fetched) = app.get(&uri, Some(&tokens.regular)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, movie);
}

#[tokio::test]
async fn test_regular_user_cannot_modify_catalogue() {
    let (app, tokens) = setup().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.regular),
            Some(json!({ "title": "The Phantom Menace" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_body(&body, 403);

    let (_, movie) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.admin),
            Some(json!({ "title": "The Phantom Menace" })),
        )
        .await;
    let uri = format!("/movies/{}", movie["id"].as_str().unwrap());

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&tokens.regular), Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&tokens.regular), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_requires_title() {
    let (app, tokens) = setup().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.admin),
            Some(json!({ "director": "Irvin Kershner" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Movie title is required");
}

#[tokio::test]
async fn test_update_movie() {
    let (app, tokens) = setup().await;

    let (_, movie) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.admin),
            Some(json!({ "title": "Empire", "director": "Irvin Kershner" })),
        )
        .await;
    let uri = format!("/movies/{}", movie["id"].as_str().unwrap());

    let (status, updated) = app
        .request(
            Method::PUT,
            &uri,
            Some(&tokens.admin),
            Some(json!({ "title": "The Empire Strikes Back" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "The Empire Strikes Back");
    assert_eq!(updated["director"], "Irvin Kershner");

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&tokens.admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_movie() {
    let (app, tokens) = setup().await;

    let (_, movie) = app
        .request(
            Method::POST,
            "/movies",
            Some(&tokens.admin),
            Some(json!({ "title": "Attack of the Clones" })),
        )
        .await;
    let uri = format!("/movies/{}", movie["id"].as_str().unwrap());

    let (status, body) = app.request(Method::DELETE, &uri, Some(&tokens.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Movie deleted");

    let (status, _) = app.get(&uri, Some(&tokens.regular)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&tokens.admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_movie_id_is_not_found() {
    let (app, tokens) = setup().await;

    let (status, body) = app.get("/movies/42", Some(&tokens.regular)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Movie not found");
}
