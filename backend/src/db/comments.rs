use crate::models::Comment;
use chrono::Utc;
use sqlx::SqlitePool;

pub async fn list_for_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c.id,
            c.post_id,
            c.author_id,
            u.username AS author_username,
            c.body,
            c.created_at
        FROM
            comments c
        JOIN
            users u ON u.id = c.author_id
        WHERE
            c.post_id = ?
        ORDER BY
            c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Comments are append-only: there is no edit or delete counterpart.
pub async fn create(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    body: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO comments (post_id, author_id, body, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(body)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
