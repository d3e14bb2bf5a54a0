//! Integration tests for sign-in, registration, documents and sign-out.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use cartoon_cart_integration_tests::{LOGIN, TAKEN_LOGIN, TOKEN, TestContext};
use cartoon_cart_storefront::storage::Storage;
use serde_json::json;

#[tokio::test]
async fn test_account_requires_sign_in() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.get("/account").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not signed in");
}

#[tokio::test]
async fn test_login_persists_token_and_profile() {
    let ctx = TestContext::new().await;
    let body = ctx.sign_in().await;
    assert_eq!(body["user"]["login"], LOGIN);
    assert_eq!(body["user"]["firstName"], "Ivan");

    let storage = ctx.local_storage();
    assert_eq!(storage.get("token").unwrap().as_deref(), Some(TOKEN));
    let profile: serde_json::Value =
        serde_json::from_str(&storage.get("userData").unwrap().unwrap()).unwrap();
    assert_eq!(profile["lastName"], "Petrov");

    let (status, account) = ctx.get("/account").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["user"]["login"], LOGIN);

    let (_, home) = ctx.get("/").await;
    assert_eq!(home["user"]["login"], LOGIN);
}

#[tokio::test]
async fn test_login_rejected_surfaces_api_error() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post("/auth/login", &json!({ "login": LOGIN, "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid login or password");
    assert!(ctx.local_storage().get("token").unwrap().is_none());
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post("/auth/login", &json!({ "login": "", "password": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Login and password are required");

    let (status, body) = ctx
        .post("/auth/login", &json!({ "login": 42, "password": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = ctx.post("/auth/register", &json!(["aziza"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let mut ctx = TestContext::new().await;
    ctx.sign_in().await;
    ctx.restart();

    let (status, account) = ctx.get("/account").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["user"]["login"], LOGIN);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let (status, _) = ctx.post("/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let storage = ctx.local_storage();
    assert!(storage.get("token").unwrap().is_none());
    assert!(storage.get("userData").unwrap().is_none());

    let (status, _) = ctx.get("/account").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signing out twice is harmless
    let (status, _) = ctx.post("/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_register() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post(
            "/auth/register",
            &json!({
                "firstName": "Aziza",
                "lastName": "Karimova",
                "login": "aziza",
                "password": "s3cret"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Registered successfully! Please sign in.");

    // Registration does not sign in
    assert!(ctx.local_storage().get("token").unwrap().is_none());
}

#[tokio::test]
async fn test_register_conflict() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx
        .post(
            "/auth/register",
            &json!({ "firstName": "A", "lastName": "B", "login": TAKEN_LOGIN, "password": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn test_submit_documents() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let (status, body) = ctx
        .post_multipart(
            "/account/documents",
            &[
                ("subject", None, b"Admission"),
                ("recipient", None, b"Dean's office"),
                ("content", None, b"Documents attached."),
                ("passport", Some("passport.pdf"), b"%PDF-1.7 passport"),
                ("photo", Some("photo.jpg"), b"\xff\xd8\xff"),
                ("boshqa", Some(""), b""),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Documents received");

    let uploads = ctx.collaborators.uploads();
    let names: Vec<&str> = uploads.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["subject", "recipient", "content", "passport", "photo"]);
    assert_eq!(uploads[3].1.as_deref(), Some("passport.pdf"));
}

#[tokio::test]
async fn test_submit_documents_requires_sign_in() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx
        .post_multipart(
            "/account/documents",
            &[
                ("subject", None, b"a"),
                ("recipient", None, b"b"),
                ("content", None, b"c"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(ctx.collaborators.uploads().is_empty());
}

#[tokio::test]
async fn test_submit_documents_validation() {
    let ctx = TestContext::new().await;
    ctx.sign_in().await;

    let (status, body) = ctx
        .post_multipart(
            "/account/documents",
            &[("subject", None, b"Admission"), ("content", None, b"text")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Subject, recipient and content are required");

    let (status, body) = ctx
        .post_multipart(
            "/account/documents",
            &[
                ("subject", None, b"a"),
                ("recipient", None, b"b"),
                ("content", None, b"c"),
                ("resume", Some("cv.pdf"), b"%PDF"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown attachment field: resume");
    assert!(ctx.collaborators.uploads().is_empty());
}

#[tokio::test]
async fn test_submit_documents_rejected_token() {
    let ctx = TestContext::new().await;
    ctx.local_storage().set("token", "stale-token").unwrap();

    let (status, body) = ctx
        .post_multipart(
            "/account/documents",
            &[
                ("subject", None, b"a"),
                ("recipient", None, b"b"),
                ("content", None, b"c"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}
