use crate::auth::USER_ID_KEY;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts, Path},
    http::request::Parts,
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::debug;

/// The signed-in user, if the session names one that still exists.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(CurrentUser(None));
        };

        let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
            return Ok(CurrentUser(None));
        };

        let pool = SqlitePool::from_ref(state);
        let user = db::users::find_by_id(&pool, user_id).await?;
        if user.is_none() {
            debug!("Session refers to missing user {}", user_id);
        }

        Ok(CurrentUser(user))
    }
}

/// A signed-in user. Anonymous callers are sent to the login page.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        user.map(AuthUser)
            .ok_or_else(|| AppError::login_required(next))
    }
}

/// A signed-in user holding the writer capability. Readers are sent back to
/// the post list.
pub struct Writer(pub User);

impl<S> FromRequestParts<S> for Writer
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_writer {
            debug!(user = %user.username, "Writer-only route refused");
            return Err(AppError::WriterRequired);
        }
        Ok(Writer(user))
    }
}

/// Numeric post id from the path. Anything else is a missing post.
pub struct PostId(pub i64);

impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        Ok(PostId(id))
    }
}
