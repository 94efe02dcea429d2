use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct SearchParams {
    pub q: Option<String>,
}

impl SearchParams {
    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UsernameParams {
    pub username: Option<String>,
}

impl UsernameParams {
    /// The candidate handle, if one was supplied and is non-empty.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginParams {
    pub next: Option<String>,
}
