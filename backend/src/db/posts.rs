use crate::models::Post;
use chrono::Utc;
use sqlx::SqlitePool;

const POST_SELECT: &str = r#"
    SELECT
        p.id,
        p.author_id,
        u.username AS author_username,
        p.title,
        p.content,
        p.cover_image,
        p.created_at,
        (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.kind = 'like') AS like_count,
        (SELECT COUNT(*) FROM post_reactions r WHERE r.post_id = p.id AND r.kind = 'dislike') AS dislike_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM
        posts p
    JOIN
        users u ON u.id = p.author_id
"#;

// Ties on the timestamp fall back to insertion order.
const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Post>, sqlx::Error> {
    let query = format!("{POST_SELECT} {NEWEST_FIRST}");
    sqlx::query_as::<_, Post>(&query).fetch_all(pool).await
}

pub async fn list_by_author(pool: &SqlitePool, author_id: i64) -> Result<Vec<Post>, sqlx::Error> {
    let query = format!("{POST_SELECT} WHERE p.author_id = ? {NEWEST_FIRST}");
    sqlx::query_as::<_, Post>(&query)
        .bind(author_id)
        .fetch_all(pool)
        .await
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Post>, sqlx::Error> {
    let query = format!("{POST_SELECT} WHERE p.id = ?");
    sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Case-insensitive literal substring match over title and body.
/// An empty query matches nothing.
pub async fn search(pool: &SqlitePool, needle: &str) -> Result<Vec<Post>, sqlx::Error> {
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "{POST_SELECT}
        WHERE
            instr(lower(p.title), lower(?)) > 0
        OR
            instr(lower(p.content), lower(?)) > 0
        {NEWEST_FIRST}"
    );
    sqlx::query_as::<_, Post>(&query)
        .bind(needle)
        .bind(needle)
        .fetch_all(pool)
        .await
}

pub struct PostFields<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub cover_image: Option<&'a str>,
}

pub async fn create(
    pool: &SqlitePool,
    author_id: i64,
    fields: PostFields<'_>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO posts (
                author_id,
                title,
                content,
                cover_image,
                created_at
            ) VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(author_id)
    .bind(fields.title)
    .bind(fields.content)
    .bind(fields.cover_image)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Rewrites the editable fields. Author and creation time are never touched.
pub async fn update(pool: &SqlitePool, id: i64, fields: PostFields<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE
                posts
            SET
                title = ?,
                content = ?,
                cover_image = ?
            WHERE
                id = ?
        "#,
    )
    .bind(fields.title)
    .bind(fields.content)
    .bind(fields.cover_image)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Comments and reactions go with the post through `ON DELETE CASCADE`.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
