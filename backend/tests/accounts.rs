mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp};
use serde_json::Value;

async fn is_writer(app: &TestApp, username: &str) -> bool {
    sqlx::query_scalar("SELECT is_writer FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn registration_grants_writer_when_the_role_exists() {
    let app = TestApp::spawn().await;
    let cookie = app.register("alice").await;

    assert!(is_writer(&app, "alice").await);

    let page = app.get("/post/new/", Some(&cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn registration_without_the_role_still_creates_a_reader() {
    let app = TestApp::spawn().await;
    sqlx::query("DELETE FROM roles")
        .execute(&app.pool)
        .await
        .unwrap();

    let cookie = app.register("alice").await;
    assert!(!is_writer(&app, "alice").await);

    let profile_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.username = ?",
    )
    .bind("alice")
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(profile_rows, 1);

    let response = app.get("/post/new/", Some(&cookie)).await;
    assert!(response.is_redirect_to("/"));
}

#[tokio::test]
async fn registration_rejects_taken_usernames_in_any_case() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app
        .post_form(
            "/register/",
            &[
                ("username", "ALICE"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("A user with that username already exists."));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn registration_rejects_mismatched_passwords() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/register/",
            &[
                ("username", "dave"),
                ("password1", PASSWORD),
                ("password2", "something-else-entirely"),
            ],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.session_cookie.is_none());
    assert!(response.body.contains("errorlist"));
}

#[tokio::test]
async fn login_honours_a_local_next_and_ignores_foreign_ones() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app
        .post_form(
            "/accounts/login/",
            &[("username", "alice"), ("password", PASSWORD), ("next", "/profile/")],
            None,
        )
        .await;
    assert!(response.is_redirect_to("/profile/"));
    let cookie = response.session_cookie.expect("session cookie after login");

    let profile = app.get("/profile/", Some(&cookie)).await;
    assert_eq!(profile.status, StatusCode::OK);

    let response = app
        .post_form(
            "/accounts/login/",
            &[
                ("username", "alice"),
                ("password", PASSWORD),
                ("next", "https://evil.example/"),
            ],
            None,
        )
        .await;
    assert!(response.is_redirect_to("/"));
}

#[tokio::test]
async fn wrong_password_shows_a_generic_error() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app
        .post_form(
            "/accounts/login/",
            &[("username", "alice"), ("password", "not-the-password")],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please enter a correct username and password."));
    assert!(response.session_cookie.is_none());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn().await;
    let cookie = app.register("alice").await;

    let response = app.post_form("/accounts/logout/", &[], Some(&cookie)).await;
    assert!(response.is_redirect_to("/"));

    let response = app.get("/profile/", Some(&cookie)).await;
    assert!(response.is_redirect_to("/accounts/login/?next=%2Fprofile%2F"));
}

#[tokio::test]
async fn check_username_reports_availability() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app.get("/check-username/?username=Alice", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let json: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["is_available"], false);

    let response = app.get("/check-username/?username=zed", None).await;
    let json: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["is_available"], true);
}

#[tokio::test]
async fn check_username_requires_a_candidate() {
    let app = TestApp::spawn().await;

    for path in ["/check-username/", "/check-username/?username="] {
        let response = app.get(path, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(json["error"], "Username not provided");
    }
}

#[tokio::test]
async fn login_redirect_keeps_the_query_string() {
    let app = TestApp::spawn().await;
    app.register("alice").await;

    let response = app.get("/profile/?tab=stats", None).await;
    assert!(response.is_redirect_to("/accounts/login/?next=%2Fprofile%2F%3Ftab%3Dstats"));

    let response = app
        .post_form(
            "/accounts/login/",
            &[
                ("username", "alice"),
                ("password", PASSWORD),
                ("next", "/profile/?tab=stats"),
            ],
            None,
        )
        .await;
    assert!(response.is_redirect_to("/profile/?tab=stats"));
}
