use crate::models::{Reaction, Vote};
use sqlx::{SqliteConnection, SqlitePool};

async fn current(
    conn: &mut SqliteConnection,
    post_id: i64,
    user_id: i64,
) -> Result<Reaction, sqlx::Error> {
    let kind = sqlx::query_scalar::<_, String>(
        "SELECT kind FROM post_reactions WHERE post_id = ? AND user_id = ?",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(Reaction::from_kind(kind.as_deref()))
}

pub async fn reaction_of(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
) -> Result<Reaction, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    current(&mut conn, post_id, user_id).await
}

/// Applies a like/dislike toggle and returns the resulting reaction.
///
/// Read and write share a transaction, but two simultaneous requests from the
/// same user may still both observe the old state.
pub async fn apply_vote(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
    vote: Vote,
) -> Result<Reaction, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let next = current(&mut tx, post_id, user_id).await?.apply(vote);

    match next.kind() {
        Some(kind) => {
            sqlx::query(
                r#"
                INSERT INTO post_reactions (post_id, user_id, kind)
                VALUES (?, ?, ?)
                ON CONFLICT (post_id, user_id)
                DO UPDATE SET kind = EXCLUDED.kind
                "#,
            )
            .bind(post_id)
            .bind(user_id)
            .bind(kind)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query("DELETE FROM post_reactions WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(next)
}
