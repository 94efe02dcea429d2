use crate::models::User;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_writer, date_joined";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Handles are matched exactly here; see [`username_taken`] for the
/// case-insensitive availability check.
pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE BINARY");
    sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    except_user: Option<i64>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM users
            WHERE username = ?
            AND (? IS NULL OR id <> ?)
        )",
    )
    .bind(username)
    .bind(except_user)
    .bind(except_user)
    .fetch_one(pool)
    .await
}

/// The handle column is `UNIQUE COLLATE NOCASE`, so a registration or rename
/// that lost a race with [`username_taken`] fails here.
pub fn is_username_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => {
            e.is_unique_violation() && e.message().contains("users.username")
        }
        _ => false,
    }
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    username: &str,
    email: &str,
    password_hash: &str,
    is_writer: bool,
) -> Result<User, sqlx::Error> {
    let query = format!(
        "INSERT INTO users (username, email, password_hash, is_writer, date_joined)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_writer)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(user.id)
        .execute(&mut *conn)
        .await?;

    Ok(user)
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Creates a user and its profile. The account is a writer when `writer_role`
/// exists; a missing role is an operator error that still lets the account in.
pub async fn register(
    pool: &SqlitePool,
    account: NewAccount<'_>,
    writer_role: &str,
) -> Result<User, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let role_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM roles WHERE name = ?)")
            .bind(writer_role)
            .fetch_one(&mut *tx)
            .await?;

    let user = insert(
        &mut tx,
        account.username,
        account.email,
        account.password_hash,
        role_exists,
    )
    .await?;

    tx.commit().await?;

    if role_exists {
        info!(user = %user.username, "Registered writer");
    } else {
        error!(
            role = writer_role,
            user = %user.username,
            "CRITICAL: writer role not found, account created without publishing rights"
        );
    }

    Ok(user)
}

pub async fn update_identity(
    conn: &mut SqliteConnection,
    user_id: i64,
    username: &str,
    email: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET username = ?, email = ? WHERE id = ?")
        .bind(username)
        .bind(email)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}
