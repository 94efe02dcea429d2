use crate::{
    db::{self, posts::PostFields},
    error::AppError,
    extractors::{AuthUser, CurrentUser, PostId, Writer},
    forms::{CommentForm, FormErrors, PostForm, VoteForm},
    media::{MediaStore, POST_COVERS_DIR},
    models::{Post, Reaction, User, Vote},
    templates::{
        PostDeleteTemplate, PostDetailTemplate, PostFormTemplate, PostListTemplate, render,
    },
};
use axum::{
    Form,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

fn detail_url(id: i64) -> String {
    format!("/post/{}/", id)
}

pub async fn list_posts(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    CurrentUser(viewer): CurrentUser,
) -> Result<Html<String>, AppError> {
    let posts = db::posts::list_all(&pool).await?;

    render(&PostListTemplate {
        viewer,
        heading: "All posts".to_string(),
        posts,
        media_url: media.base_url().to_string(),
    })
}

pub async fn my_posts(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Writer(user): Writer,
) -> Result<Html<String>, AppError> {
    let posts = db::posts::list_by_author(&pool, user.id).await?;

    render(&PostListTemplate {
        viewer: Some(user),
        heading: "My posts".to_string(),
        posts,
        media_url: media.base_url().to_string(),
    })
}

async fn render_detail(
    pool: &SqlitePool,
    media: &MediaStore,
    viewer: Option<User>,
    post: Post,
    comment_body: String,
    errors: FormErrors,
) -> Result<Html<String>, AppError> {
    let comments = db::comments::list_for_post(pool, post.id).await?;
    let reaction = match &viewer {
        Some(user) => db::reactions::reaction_of(pool, post.id, user.id).await?,
        None => Reaction::None,
    };
    let is_author = viewer.as_ref().is_some_and(|u| u.id == post.author_id);

    render(&PostDetailTemplate {
        viewer,
        post,
        comments,
        comment_body,
        errors,
        reaction,
        is_author,
        media_url: media.base_url().to_string(),
    })
}

pub async fn post_detail(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    CurrentUser(viewer): CurrentUser,
    PostId(id): PostId,
) -> Result<Html<String>, AppError> {
    let post = db::posts::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    render_detail(&pool, &media, viewer, post, String::new(), FormErrors::default()).await
}

#[instrument(skip_all, fields(post_id = id, user = %user.username))]
pub async fn add_comment(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    AuthUser(user): AuthUser,
    PostId(id): PostId,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let post = db::posts::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    match form.clean() {
        Ok(body) => {
            db::comments::create(&pool, post.id, user.id, &body).await?;
            info!("Comment added");
            Ok(Redirect::to(&detail_url(post.id)).into_response())
        }
        Err(errors) => {
            let page = render_detail(&pool, &media, Some(user), post, form.body, errors).await?;
            Ok(page.into_response())
        }
    }
}

struct PostFormPage {
    kind: &'static str,
    form_action: String,
}

impl PostFormPage {
    fn create() -> Self {
        Self {
            kind: "Create",
            form_action: "/post/new/".to_string(),
        }
    }

    fn update(id: i64) -> Self {
        Self {
            kind: "Update",
            form_action: format!("/post/{}/edit/", id),
        }
    }

    fn render(
        self,
        viewer: User,
        media: &MediaStore,
        title: String,
        content: String,
        current_cover: Option<String>,
        errors: FormErrors,
    ) -> Result<Html<String>, AppError> {
        render(&PostFormTemplate {
            viewer: Some(viewer),
            kind: self.kind.to_string(),
            form_action: self.form_action,
            title,
            content,
            current_cover,
            errors,
            media_url: media.base_url().to_string(),
        })
    }
}

pub async fn new_post(
    State(media): State<MediaStore>,
    Writer(user): Writer,
) -> Result<Html<String>, AppError> {
    PostFormPage::create().render(
        user,
        &media,
        String::new(),
        String::new(),
        None,
        FormErrors::default(),
    )
}

#[instrument(skip_all, fields(author = %user.username))]
pub async fn create_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Writer(user): Writer,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = PostForm::from_multipart(multipart).await?;
    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => {
            let page = PostFormPage::create().render(
                user,
                &media,
                form.title,
                form.content,
                None,
                errors,
            )?;
            return Ok(page.into_response());
        }
    };

    let cover = match &clean.cover_image {
        Some(image) => Some(media.save(POST_COVERS_DIR, image).await?),
        None => None,
    };

    let fields = PostFields {
        title: &clean.title,
        content: &clean.content,
        cover_image: cover.as_deref(),
    };
    let id = match db::posts::create(&pool, user.id, fields).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(reference) = &cover {
                media.remove(reference).await;
            }
            return Err(e.into());
        }
    };

    info!(post_id = id, "Post created");
    Ok(Redirect::to(&detail_url(id)).into_response())
}

/// Loads the post and checks the caller wrote it. `Err` carries the response
/// to send instead: not-found, or a redirect to the post list for strangers.
async fn owned_post(
    pool: &SqlitePool,
    id: i64,
    user: &User,
) -> Result<Result<Post, Response>, AppError> {
    let post = db::posts::find(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if post.author_id != user.id {
        debug!(post_id = id, user = %user.username, "Refusing access to another writer's post");
        return Ok(Err(Redirect::to("/").into_response()));
    }
    Ok(Ok(post))
}

pub async fn edit_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Writer(user): Writer,
    PostId(id): PostId,
) -> Result<Response, AppError> {
    let post = match owned_post(&pool, id, &user).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let page = PostFormPage::update(post.id).render(
        user,
        &media,
        post.title,
        post.content,
        post.cover_image,
        FormErrors::default(),
    )?;
    Ok(page.into_response())
}

#[instrument(skip_all, fields(post_id = id, author = %user.username))]
pub async fn update_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Writer(user): Writer,
    PostId(id): PostId,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let post = match owned_post(&pool, id, &user).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let form = PostForm::from_multipart(multipart).await?;
    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => {
            let page = PostFormPage::update(post.id).render(
                user,
                &media,
                form.title,
                form.content,
                post.cover_image,
                errors,
            )?;
            return Ok(page.into_response());
        }
    };

    let new_cover = match &clean.cover_image {
        Some(image) => Some(media.save(POST_COVERS_DIR, image).await?),
        None => None,
    };
    let cover = match (&new_cover, clean.clear_cover) {
        (Some(reference), _) => Some(reference.clone()),
        (None, true) => None,
        (None, false) => post.cover_image.clone(),
    };

    let fields = PostFields {
        title: &clean.title,
        content: &clean.content,
        cover_image: cover.as_deref(),
    };
    if let Err(e) = db::posts::update(&pool, post.id, fields).await {
        if let Some(reference) = &new_cover {
            media.remove(reference).await;
        }
        return Err(e.into());
    }

    if let Some(old) = &post.cover_image {
        if cover.as_ref() != Some(old) {
            media.remove(old).await;
        }
    }

    info!("Post updated");
    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

pub async fn confirm_delete(
    State(pool): State<SqlitePool>,
    Writer(user): Writer,
    PostId(id): PostId,
) -> Result<Response, AppError> {
    let post = match owned_post(&pool, id, &user).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let page = render(&PostDeleteTemplate {
        viewer: Some(user),
        post,
    })?;
    Ok(page.into_response())
}

#[instrument(skip_all, fields(post_id = id, author = %user.username))]
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    Writer(user): Writer,
    PostId(id): PostId,
) -> Result<Response, AppError> {
    let post = match owned_post(&pool, id, &user).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    db::posts::delete(&pool, post.id).await?;
    if let Some(cover) = &post.cover_image {
        media.remove(cover).await;
    }

    info!("Post deleted");
    Ok(Redirect::to("/").into_response())
}

#[instrument(skip_all, fields(post_id = id, user = %user.username))]
pub async fn vote(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    PostId(id): PostId,
    Form(form): Form<VoteForm>,
) -> Result<Redirect, AppError> {
    let post = db::posts::find(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    match form.vote.as_deref().and_then(Vote::parse) {
        Some(vote) => {
            let reaction = db::reactions::apply_vote(&pool, post.id, user.id, vote).await?;
            debug!(?reaction, "Vote applied");
        }
        None => debug!(vote = ?form.vote, "Ignoring unrecognised vote"),
    }

    Ok(Redirect::to(&detail_url(post.id)))
}
