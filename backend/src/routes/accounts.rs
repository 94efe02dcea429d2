use crate::{
    auth,
    config::AppConfig,
    db::{self, users::NewAccount},
    error::AppError,
    extractors::CurrentUser,
    forms::{FormErrors, LoginForm, RegistrationForm, USERNAME_TAKEN},
    params::LoginParams,
    templates::{LoginTemplate, RegisterTemplate, render},
};
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub async fn register_form(CurrentUser(viewer): CurrentUser) -> Result<Response, AppError> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let page = render(&RegisterTemplate {
        viewer: None,
        username: String::new(),
        email: String::new(),
        errors: FormErrors::default(),
    })?;
    Ok(page.into_response())
}

fn registration_page(form: &RegistrationForm, errors: FormErrors) -> Result<Response, AppError> {
    let page = render(&RegisterTemplate {
        viewer: None,
        username: form.username.clone(),
        email: form.email.clone(),
        errors,
    })?;
    Ok(page.into_response())
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<AppConfig>,
    session: Session,
    CurrentUser(viewer): CurrentUser,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    if viewer.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.trim();
    let mut errors = form.clean();
    if !errors.has("username") && db::users::username_taken(&pool, username, None).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return registration_page(&form, errors);
    }

    let password_hash = auth::hash_password(&form.password1)?;
    let account = NewAccount {
        username,
        email: form.email.trim(),
        password_hash: &password_hash,
    };
    let user = match db::users::register(&pool, account, &config.writer_role).await {
        Ok(user) => user,
        Err(e) if db::users::is_username_conflict(&e) => {
            warn!("Username claimed by a concurrent registration");
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            return registration_page(&form, errors);
        }
        Err(e) => return Err(e.into()),
    };

    auth::log_in(&session, user.id).await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn login_form(
    CurrentUser(viewer): CurrentUser,
    Query(params): Query<LoginParams>,
) -> Result<Response, AppError> {
    let next = auth::safe_next(params.next.as_deref()).to_string();
    if viewer.is_some() {
        return Ok(Redirect::to(&next).into_response());
    }

    let page = render(&LoginTemplate {
        viewer: None,
        username: String::new(),
        next,
        errors: FormErrors::default(),
    })?;
    Ok(page.into_response())
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = auth::safe_next(form.next.as_deref()).to_string();

    let user = db::users::find_by_username(&pool, &form.username).await?;
    match user {
        Some(user) if auth::verify_password(&form.password, &user.password_hash) => {
            auth::log_in(&session, user.id).await?;
            info!("Logged in");
            Ok(Redirect::to(&next).into_response())
        }
        _ => {
            warn!("Failed login attempt");
            let mut errors = FormErrors::default();
            errors.add(FormErrors::NON_FIELD, BAD_CREDENTIALS);
            let page = render(&LoginTemplate {
                viewer: None,
                username: form.username.clone(),
                next,
                errors,
            })?;
            Ok(page.into_response())
        }
    }
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    auth::log_out(&session).await?;
    Ok(Redirect::to("/"))
}
