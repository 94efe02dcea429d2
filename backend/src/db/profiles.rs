use crate::models::{FollowOutcome, Profile, ProfileStats};
use sqlx::{SqliteConnection, SqlitePool};

/// Returns the user's profile, creating a blank one on first touch.
pub async fn get_or_create(pool: &SqlitePool, user_id: i64) -> Result<Profile, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    ensure(&mut conn, user_id).await
}

async fn ensure(conn: &mut SqliteConnection, user_id: i64) -> Result<Profile, sqlx::Error> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES (?) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, Profile>("SELECT user_id, bio, picture FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn update(
    conn: &mut SqliteConnection,
    user_id: i64,
    bio: Option<&str>,
    picture: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE profiles SET bio = ?, picture = ? WHERE user_id = ?")
        .bind(bio)
        .bind(picture)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn stats(pool: &SqlitePool, user_id: i64) -> Result<ProfileStats, sqlx::Error> {
    sqlx::query_as::<_, ProfileStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM posts WHERE author_id = ?) AS post_count,
            (SELECT COUNT(*)
                FROM post_reactions r
                JOIN posts p ON p.id = r.post_id
                WHERE p.author_id = ? AND r.kind = 'like') AS total_likes,
            (SELECT COUNT(*)
                FROM comments c
                JOIN posts p ON p.id = c.post_id
                WHERE p.author_id = ?) AS total_comments,
            (SELECT COUNT(*) FROM follows WHERE followed_id = ?) AS follower_count,
            (SELECT COUNT(*) FROM follows WHERE follower_id = ?) AS following_count
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn is_following(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ? AND followed_id = ?)",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_one(pool)
    .await
}

/// Adds the follower → followed edge if absent, removes it if present.
/// Following yourself is ignored.
pub async fn toggle_follow(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<FollowOutcome, sqlx::Error> {
    if follower_id == followed_id {
        return Ok(FollowOutcome::Ignored);
    }

    let mut tx = pool.begin().await?;
    ensure(&mut tx, follower_id).await?;
    ensure(&mut tx, followed_id).await?;

    let removed = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let outcome = if removed > 0 {
        FollowOutcome::Unfollowed
    } else {
        sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(followed_id)
            .execute(&mut *tx)
            .await?;
        FollowOutcome::Followed
    };

    tx.commit().await?;
    Ok(outcome)
}
