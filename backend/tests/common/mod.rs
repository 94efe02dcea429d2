//! Shared harness for the HTTP-level tests: an in-memory database, a
//! throwaway media root, and a router driven through `oneshot`.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use inkpost::{
    AppState,
    config::{AppConfig, MediaConfig},
    db, routes,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "inkpost-test-boundary";

/// A small but fully decodable image in the given format.
pub fn image_bytes(format: image::ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([40, 120, 200]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

pub fn png() -> Vec<u8> {
    image_bytes(image::ImageFormat::Png)
}

pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
    pub media_root: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub session_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn is_redirect_to(&self, path: &str) -> bool {
        self.status.is_redirection() && self.location.as_deref() == Some(path)
    }
}

pub fn test_config(media_root: &TempDir) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        run_migrations: true,
        max_connections: 1,
        server_addr: "127.0.0.1:0".to_string(),
        writer_role: "Writers".to_string(),
        secure_cookies: false,
        media: MediaConfig {
            root: media_root.path().to_string_lossy().into_owned(),
            url: "/media".to_string(),
            serve: true,
            max_upload_bytes: 1024 * 1024,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let media_root = tempfile::tempdir().expect("temp media root");
        let config = test_config(&media_root);
        let pool = db::setup_database(&config).await.expect("database");
        let router = routes::create_router(AppState::new(pool.clone(), config));
        Self {
            router,
            pool,
            media_root,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let session_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(routes::SESSION_COOKIE))
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .next();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        TestResponse {
            status,
            location,
            session_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::get(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    /// Posts a multipart form. `files` entries are `(field, file name, bytes)`.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut request = Request::post(path).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    /// Registers an account through the public form and returns its session cookie.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .post_form(
                "/register/",
                &[
                    ("username", username),
                    ("email", ""),
                    ("password1", PASSWORD),
                    ("password2", PASSWORD),
                ],
                None,
            )
            .await;
        assert!(
            response.is_redirect_to("/"),
            "registration of {username} failed: {}",
            response.body
        );
        response.session_cookie.expect("session cookie after registration")
    }

    pub async fn create_post(&self, cookie: &str, title: &str, content: &str) -> i64 {
        let response = self
            .post_multipart(
                "/post/new/",
                &[("title", title), ("content", content)],
                &[],
                Some(cookie),
            )
            .await;
        let location = response.location.expect("redirect to the new post");
        location
            .trim_start_matches("/post/")
            .trim_end_matches('/')
            .parse()
            .expect("numeric post id")
    }
}
