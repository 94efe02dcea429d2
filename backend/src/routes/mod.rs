pub mod accounts;
pub mod posts;
pub mod profiles;
pub mod search;

use crate::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::{MemoryStore, SessionManagerLayer, cookie::SameSite};

pub const SESSION_COOKIE: &str = "inkpost_session";

pub fn create_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(state.config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true);

    let mut router = Router::new()
        .merge(post_routes())
        .merge(profile_routes())
        .merge(account_routes())
        .route("/search/", get(search::search))
        .route("/check-username/", get(search::check_username));

    if state.config.media.serve {
        router = router.nest_service(
            state.media.base_url(),
            ServeDir::new(state.media.root()),
        );
    }

    router
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/my-posts/", get(posts::my_posts))
        .route("/post/new/", get(posts::new_post).post(posts::create_post))
        .route("/post/{id}/", get(posts::post_detail).post(posts::add_comment))
        .route("/post/{id}/edit/", get(posts::edit_post).post(posts::update_post))
        .route(
            "/post/{id}/delete/",
            get(posts::confirm_delete).post(posts::delete_post),
        )
        .route("/post/{id}/vote/", post(posts::vote))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile/",
            get(profiles::own_profile).post(profiles::update_profile),
        )
        .route("/user/{username}/", get(profiles::public_profile))
        .route("/user/{username}/follow/", post(profiles::follow))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register/",
            get(accounts::register_form).post(accounts::register),
        )
        .route(
            "/accounts/login/",
            get(accounts::login_form).post(accounts::login),
        )
        .route(
            "/accounts/logout/",
            get(accounts::logout).post(accounts::logout),
        )
}
