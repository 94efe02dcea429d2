//! Askama page templates. Every page carries the signed-in user, if any,
//! for the navigation bar.

use crate::error::AppError;
use crate::forms::FormErrors;
use crate::models::{Comment, Post, Profile, ProfileStats, Reaction, User};
use askama::Template;
use axum::response::Html;

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

/// Post list page, shared by the front page and "my posts"
#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListTemplate {
    pub viewer: Option<User>,
    pub heading: String,
    pub posts: Vec<Post>,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<User>,
    pub post: Post,
    pub comments: Vec<Comment>,
    /// Comment text to put back in the box after a failed submission.
    pub comment_body: String,
    pub errors: FormErrors,
    pub reaction: Reaction,
    pub is_author: bool,
    pub media_url: String,
}

/// Create and edit share one form
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub viewer: Option<User>,
    pub kind: String,
    pub form_action: String,
    pub title: String,
    pub content: String,
    pub current_cover: Option<String>,
    pub errors: FormErrors,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "post_confirm_delete.html")]
pub struct PostDeleteTemplate {
    pub viewer: Option<User>,
    pub post: Post,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchTemplate {
    pub viewer: Option<User>,
    pub query: String,
    pub results: Vec<Post>,
    pub media_url: String,
}

/// The signed-in user's own profile and edit form
#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<User>,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub picture: String,
    pub stats: ProfileStats,
    pub errors: FormErrors,
    pub flash: Option<String>,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "public_profile.html")]
pub struct PublicProfileTemplate {
    pub viewer: Option<User>,
    pub profile_user: User,
    pub profile: Profile,
    pub posts: Vec<Post>,
    pub stats: ProfileStats,
    pub is_following: bool,
    pub is_self: bool,
    pub media_url: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub viewer: Option<User>,
    pub username: String,
    pub email: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub viewer: Option<User>,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub viewer: Option<User>,
    pub status: u16,
    pub message: String,
}
