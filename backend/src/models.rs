use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_writer: bool,
    pub date_joined: DateTime<Utc>,
}

/// A post joined with its author's handle and its engagement counts.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
}

impl Post {
    pub fn created_display(&self) -> String {
        self.created_at.format("%B %-d, %Y, %H:%M").to_string()
    }

    /// First 200 characters of the body, for list pages.
    pub fn excerpt(&self) -> String {
        const LIMIT: usize = 200;
        match self.content.char_indices().nth(LIMIT) {
            Some((idx, _)) => format!("{}…", &self.content[..idx]),
            None => self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn created_display(&self) -> String {
        self.created_at.format("%B %-d, %Y, %H:%M").to_string()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub bio: Option<String>,
    pub picture: String,
}

/// Aggregates shown on profile pages. Always computed from live rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProfileStats {
    pub post_count: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    /// Anything other than `like` or `dislike` is not a vote.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Vote::Like),
            "dislike" => Some(Vote::Dislike),
            _ => None,
        }
    }
}

/// Where a user stands on a single post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reaction {
    #[default]
    None,
    Liked,
    Disliked,
}

impl Reaction {
    /// Repeating the current vote clears it; any other vote replaces it.
    pub fn apply(self, vote: Vote) -> Reaction {
        match (self, vote) {
            (Reaction::Liked, Vote::Like) | (Reaction::Disliked, Vote::Dislike) => Reaction::None,
            (_, Vote::Like) => Reaction::Liked,
            (_, Vote::Dislike) => Reaction::Disliked,
        }
    }

    pub(crate) fn from_kind(kind: Option<&str>) -> Reaction {
        match kind {
            Some("like") => Reaction::Liked,
            Some("dislike") => Reaction::Disliked,
            _ => Reaction::None,
        }
    }

    pub(crate) fn kind(self) -> Option<&'static str> {
        match self {
            Reaction::None => None,
            Reaction::Liked => Some("like"),
            Reaction::Disliked => Some("dislike"),
        }
    }

    pub fn is_liked(&self) -> bool {
        *self == Reaction::Liked
    }

    pub fn is_disliked(&self) -> bool {
        *self == Reaction::Disliked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
    /// Self-follow attempts are dropped.
    Ignored,
}
