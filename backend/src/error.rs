use crate::templates::ErrorTemplate;
use askama::Template;
use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Media storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Writer access required")]
    WriterRequired,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn login_required(next: impl Into<String>) -> Self {
        AppError::LoginRequired { next: next.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let page = ErrorTemplate {
        viewer: None,
        status: status.as_u16(),
        message: message.to_string(),
    };
    match page.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("Failed to render error page: {:?}", e);
            (status, message.to_string()).into_response()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => error_page(StatusCode::NOT_FOUND, "Resource not found"),
            AppError::LoginRequired { next } => {
                Redirect::to(&crate::auth::login_url(&next)).into_response()
            }
            AppError::WriterRequired => Redirect::to("/").into_response(),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::Multipart(ref e) => {
                error!("Multipart Error: {:?}", e);
                error_page(StatusCode::BAD_REQUEST, "Malformed upload")
            }
            AppError::Database(ref e) => {
                error!("Database Error: {:?}", e);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
            ref other => {
                error!("System Error: {:?}", other);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}
