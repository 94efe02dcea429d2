use crate::{
    db,
    error::AppError,
    extractors::CurrentUser,
    media::MediaStore,
    params::{SearchParams, UsernameParams},
    templates::{SearchTemplate, render},
};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::Html,
};
use serde::Serialize;
use sqlx::SqlitePool;

pub async fn search(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    CurrentUser(viewer): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, AppError> {
    let query = params.query().to_string();
    let results = db::posts::search(&pool, &query).await?;

    render(&SearchTemplate {
        viewer,
        query,
        results,
        media_url: media.base_url().to_string(),
    })
}

#[derive(Serialize)]
pub struct UsernameAvailability {
    pub is_available: bool,
}

pub async fn check_username(
    State(pool): State<SqlitePool>,
    params: Result<Query<UsernameParams>, QueryRejection>,
) -> Result<Json<UsernameAvailability>, AppError> {
    let Query(params) = params.map_err(|e| AppError::bad_request(e.body_text()))?;
    let username = params
        .username()
        .ok_or_else(|| AppError::bad_request("Username not provided"))?;

    let taken = db::users::username_taken(&pool, username, None).await?;
    Ok(Json(UsernameAvailability {
        is_available: !taken,
    }))
}
