use crate::{
    auth,
    db,
    error::AppError,
    extractors::{AuthUser, CurrentUser},
    forms::{FormErrors, ProfileForm, USERNAME_TAKEN},
    media::{MediaStore, PROFILE_PICS_DIR},
    models::{Profile, User},
    templates::{ProfileTemplate, PublicProfileTemplate, render},
};
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, instrument};

const PROFILE_UPDATED: &str = "Your profile has been updated!";

fn public_url(username: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/user/{}/", encoded)
}

/// Renders the owner's profile page. Stats are recomputed on every call.
async fn render_own_profile(
    pool: &SqlitePool,
    media: &MediaStore,
    user: User,
    profile: Profile,
    values: ProfileForm,
    errors: FormErrors,
    flash: Option<String>,
) -> Result<Html<String>, AppError> {
    let stats = db::profiles::stats(pool, user.id).await?;

    render(&ProfileTemplate {
        viewer: Some(user),
        username: values.username,
        email: values.email,
        bio: values.bio,
        picture: profile.picture,
        stats,
        errors,
        flash,
        media_url: media.base_url().to_string(),
    })
}

pub async fn own_profile(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<Html<String>, AppError> {
    let profile = db::profiles::get_or_create(&pool, user.id).await?;
    let flash = auth::take_flash(&session).await?;

    let values = ProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        bio: profile.bio.clone().unwrap_or_default(),
        picture: None,
    };
    render_own_profile(&pool, &media, user, profile, values, FormErrors::default(), flash).await
}

#[instrument(skip_all, fields(user = %user.username))]
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    session: Session,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let profile = db::profiles::get_or_create(&pool, user.id).await?;
    let form = ProfileForm::from_multipart(multipart).await?;

    let mut clean = form.clean();
    if let Ok(values) = &clean {
        if db::users::username_taken(&pool, &values.username, Some(user.id)).await? {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            clean = Err(errors);
        }
    }

    let clean = match clean {
        Ok(clean) => clean,
        Err(errors) => {
            let page =
                render_own_profile(&pool, &media, user, profile, form, errors, None).await?;
            return Ok(page.into_response());
        }
    };

    let new_picture = match &clean.picture {
        Some(image) => Some(media.save(PROFILE_PICS_DIR, image).await?),
        None => None,
    };
    let picture = new_picture.as_deref().unwrap_or(&profile.picture);

    let saved = async {
        let mut tx = pool.begin().await?;
        db::users::update_identity(&mut tx, user.id, &clean.username, &clean.email).await?;
        db::profiles::update(&mut tx, user.id, clean.bio.as_deref(), picture).await?;
        tx.commit().await
    }
    .await;
    if let Err(e) = saved {
        if let Some(reference) = &new_picture {
            media.remove(reference).await;
        }
        if !db::users::is_username_conflict(&e) {
            return Err(e.into());
        }

        let mut errors = FormErrors::default();
        errors.add("username", USERNAME_TAKEN);
        let page = render_own_profile(&pool, &media, user, profile, form, errors, None).await?;
        return Ok(page.into_response());
    }

    if new_picture.is_some() {
        media.remove(&profile.picture).await;
    }

    auth::set_flash(&session, PROFILE_UPDATED).await?;
    info!("Profile updated");
    Ok(Redirect::to("/profile/").into_response())
}

pub async fn public_profile(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let profile_user = db::users::find_by_username(&pool, &username)
        .await?
        .ok_or(AppError::NotFound)?;
    let profile = db::profiles::get_or_create(&pool, profile_user.id).await?;
    let posts = db::posts::list_by_author(&pool, profile_user.id).await?;
    let stats = db::profiles::stats(&pool, profile_user.id).await?;

    let (is_following, is_self) = match &viewer {
        Some(me) => (
            db::profiles::is_following(&pool, me.id, profile_user.id).await?,
            me.id == profile_user.id,
        ),
        None => (false, false),
    };

    render(&PublicProfileTemplate {
        viewer,
        profile_user,
        profile,
        posts,
        stats,
        is_following,
        is_self,
        media_url: media.base_url().to_string(),
    })
}

#[instrument(skip_all, fields(follower = %user.username, target = %username))]
pub async fn follow(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    let target = db::users::find_by_username(&pool, &username)
        .await?
        .ok_or(AppError::NotFound)?;

    let outcome = db::profiles::toggle_follow(&pool, user.id, target.id).await?;
    info!(?outcome, "Follow toggled");

    Ok(Redirect::to(&public_url(&target.username)))
}
