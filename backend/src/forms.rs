//! Form payloads and their validation.
//!
//! Each form cleans its raw input into the values that get stored, or reports
//! field-level errors so the page can be re-rendered with the input intact.

use crate::error::AppError;
use crate::media::{ImageUpload, Upload};
use axum::extract::Multipart;
use email_address::EmailAddress;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

pub const TITLE_MAX_CHARS: usize = 200;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

const REQUIRED: &str = "This field is required.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Field name → messages. `__all__` carries errors not tied to one field.
#[derive(Debug, Default, Clone)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        self.get(Self::NON_FIELD)
    }
}

/// Text values and file parts of a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartFields {
    texts: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartFields {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    let upload = Upload { file_name, bytes };
                    if !upload.is_empty() {
                        fields.files.insert(name, upload);
                    }
                }
                None => {
                    let text = field.text().await?;
                    fields.texts.insert(name, text);
                }
            }
        }
        Ok(fields)
    }

    pub fn text(&self, name: &str) -> String {
        self.texts.get(name).cloned().unwrap_or_default()
    }

    pub fn checked(&self, name: &str) -> bool {
        self.texts
            .get(name)
            .is_some_and(|v| matches!(v.as_str(), "on" | "true" | "1"))
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

fn clean_image(
    upload: Option<&Upload>,
    field: &str,
    errors: &mut FormErrors,
) -> Option<ImageUpload> {
    let upload = upload?;
    match ImageUpload::from_upload(upload) {
        Some(image) => Some(image),
        None => {
            errors.add(field, INVALID_IMAGE);
            None
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub cover_image: Option<Upload>,
    pub clear_cover: bool,
}

#[derive(Debug)]
pub struct CleanPost {
    pub title: String,
    pub content: String,
    pub cover_image: Option<ImageUpload>,
    pub clear_cover: bool,
}

impl PostForm {
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            title: fields.text("title"),
            content: fields.text("content"),
            cover_image: fields.take_file("cover_image"),
            clear_cover: fields.checked("clear_cover"),
        })
    }

    pub fn clean(&self) -> Result<CleanPost, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    TITLE_MAX_CHARS,
                    title.chars().count()
                ),
            );
        }

        let content = self.content.trim();
        if content.is_empty() {
            errors.add("content", REQUIRED);
        }

        let cover_image = clean_image(self.cover_image.as_ref(), "cover_image", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanPost {
            title: title.to_string(),
            content: content.to_string(),
            cover_image,
            clear_cover: self.clear_cover,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub body: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let body = self.body.trim();
        if body.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("body", REQUIRED);
            return Err(errors);
        }
        Ok(body.to_string())
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct VoteForm {
    pub vote: Option<String>,
}

fn check_username(username: &str, errors: &mut FormErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
        return;
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        errors.add(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX_CHARS} characters."),
        );
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(email: &str, required: bool, errors: &mut FormErrors) {
    if email.is_empty() {
        if required {
            errors.add("email", REQUIRED);
        }
    } else if !EmailAddress::is_valid(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Checks everything that does not need the database. Username
    /// uniqueness is checked by the handler.
    pub fn clean(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        check_username(self.username.trim(), &mut errors);
        check_email(self.email.trim(), false, &mut errors);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn\u{2019}t match.");
        } else {
            if self.password1.chars().count() < PASSWORD_MIN_CHARS {
                errors.add(
                    "password2",
                    format!(
                        "This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."
                    ),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", "This password is entirely numeric.");
            }
        }
        errors
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub bio: String,
    pub picture: Option<Upload>,
}

#[derive(Debug)]
pub struct CleanProfile {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub picture: Option<ImageUpload>,
}

impl ProfileForm {
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            username: fields.text("username"),
            email: fields.text("email"),
            bio: fields.text("bio"),
            picture: fields.take_file("profile_pic"),
        })
    }

    /// Username uniqueness is checked by the handler.
    pub fn clean(&self) -> Result<CleanProfile, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        let email = self.email.trim();
        check_username(username, &mut errors);
        check_email(email, true, &mut errors);
        let picture = clean_image(self.picture.as_ref(), "profile_pic", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        let bio = self.bio.trim();
        Ok(CleanProfile {
            username: username.to_string(),
            email: email.to_string(),
            bio: (!bio.is_empty()).then(|| bio.to_string()),
            picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::sample_image;
    use axum::body::Bytes;
    use rstest::rstest;

    fn post(title: &str, content: &str) -> PostForm {
        PostForm {
            title: title.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_post_is_trimmed() {
        let clean = post("  Hello World ", "first post\n").clean().unwrap();
        assert_eq!(clean.title, "Hello World");
        assert_eq!(clean.content, "first post");
        assert!(clean.cover_image.is_none());
    }

    #[rstest]
    #[case("", "body", "title")]
    #[case("   ", "body", "title")]
    #[case("title", "", "content")]
    #[case("title", " \n\t", "content")]
    fn blank_post_fields_are_required(
        #[case] title: &str,
        #[case] content: &str,
        #[case] field: &str,
    ) {
        let errors = post(title, content).clean().unwrap_err();
        assert_eq!(errors.get(field), [REQUIRED.to_string()]);
    }

    #[test]
    fn title_length_is_bounded_in_characters() {
        let at_limit = "é".repeat(TITLE_MAX_CHARS);
        assert!(post(&at_limit, "body").clean().is_ok());

        let over = "é".repeat(TITLE_MAX_CHARS + 1);
        let errors = post(&over, "body").clean().unwrap_err();
        assert!(errors.has("title"));
    }

    #[test]
    fn cover_must_be_an_image() {
        let mut form = post("t", "c");
        form.cover_image = Some(Upload {
            file_name: "notes.txt".to_string(),
            bytes: Bytes::from_static(b"just text"),
        });
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.get("cover_image"), [INVALID_IMAGE.to_string()]);

        let mut corrupt = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        corrupt.extend_from_slice(b"not really a png");
        form.cover_image = Some(Upload {
            file_name: "cover.png".to_string(),
            bytes: Bytes::from(corrupt),
        });
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.get("cover_image"), [INVALID_IMAGE.to_string()]);

        form.cover_image = Some(Upload {
            file_name: "cover.png".to_string(),
            bytes: Bytes::from(sample_image(image::ImageFormat::Png)),
        });
        assert!(form.clean().unwrap().cover_image.is_some());
    }

    #[test]
    fn blank_comment_is_rejected() {
        let form = CommentForm { body: "   ".to_string() };
        assert!(form.clean().unwrap_err().has("body"));
        let form = CommentForm { body: " hi ".to_string() };
        assert_eq!(form.clean().unwrap(), "hi");
    }

    fn registration(username: &str, email: &str, p1: &str, p2: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        let form = registration("alice", "alice@example.com", "s3cret-pass", "s3cret-pass");
        assert!(form.clean().is_empty());
        let form = registration("bob.b+1@x", "", "s3cret-pass", "s3cret-pass");
        assert!(form.clean().is_empty());
    }

    #[rstest]
    #[case(registration("", "", "s3cret-pass", "s3cret-pass"), "username")]
    #[case(registration("bad name", "", "s3cret-pass", "s3cret-pass"), "username")]
    #[case(registration(&"a".repeat(151), "", "s3cret-pass", "s3cret-pass"), "username")]
    #[case(registration("alice", "not-an-email", "s3cret-pass", "s3cret-pass"), "email")]
    #[case(registration("alice", "", "", ""), "password1")]
    #[case(registration("alice", "", "s3cret-pass", "other-pass"), "password2")]
    #[case(registration("alice", "", "short", "short"), "password2")]
    #[case(registration("alice", "", "1234567890", "1234567890"), "password2")]
    fn invalid_registration_reports_field(#[case] form: RegistrationForm, #[case] field: &str) {
        let errors = form.clean();
        assert!(errors.has(field), "expected error on {field}: {errors:?}");
    }

    #[test]
    fn profile_requires_valid_email_and_keeps_optional_bio() {
        let form = ProfileForm {
            username: "alice".to_string(),
            email: String::new(),
            bio: String::new(),
            picture: None,
        };
        assert!(form.clean().unwrap_err().has("email"));

        let form = ProfileForm {
            email: "alice@example.com".to_string(),
            ..form
        };
        let clean = form.clean().unwrap();
        assert!(clean.bio.is_none());
        assert!(clean.picture.is_none());
    }
}
