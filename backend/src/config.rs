use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory uploaded images are written to.
    pub root: String,
    /// URL prefix uploaded images are served under.
    pub url: String,
    /// Serve uploads from this process. Production deployments leave this to
    /// the fronting web server.
    pub serve: bool,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub run_migrations: bool,
    pub max_connections: u32,
    pub server_addr: String,
    /// Name of the role granted to newly registered accounts.
    pub writer_role: String,
    pub secure_cookies: bool,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("database_url", "sqlite://inkpost.db")?
            .set_default("run_migrations", true)?
            .set_default("max_connections", 5)?
            .set_default("server_addr", "127.0.0.1:8000")?
            .set_default("writer_role", "Writers")?
            .set_default("secure_cookies", false)?
            .set_default("media.root", "media")?
            .set_default("media.url", "/media")?
            .set_default("media.serve", true)?
            .set_default("media.max_upload_bytes", 5 * 1024 * 1024)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("INKPOST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
