//! Data model shared by the store, the services and the HTTP API

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Catalog entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "movie" => Ok(ContentKind::Movie),
            "series" => Ok(ContentKind::Series),
            other => Err(Error::InvalidInput(format!("unknown content kind: {}", other))),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a comment or chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum CommentBody {
    Text(String),
    Emoji(String),
    /// Image URL (usually a sticker)
    Image(String),
}

impl CommentBody {
    /// Discriminator stored in the `body_type` column
    pub fn kind(&self) -> &'static str {
        match self {
            CommentBody::Text(_) => "text",
            CommentBody::Emoji(_) => "emoji",
            CommentBody::Image(_) => "image",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CommentBody::Text(v) | CommentBody::Emoji(v) | CommentBody::Image(v) => v,
        }
    }

    /// Rebuild a body from its stored columns
    pub fn from_parts(kind: &str, value: String) -> Result<Self> {
        match kind {
            "text" => Ok(CommentBody::Text(value)),
            "emoji" => Ok(CommentBody::Emoji(value)),
            "image" => Ok(CommentBody::Image(value)),
            other => Err(Error::InvalidInput(format!("unknown body type: {}", other))),
        }
    }
}

/// A comment on a content item
///
/// `author_name` and `author_avatar` are resolved from the author's profile
/// when the comment is read; only `author_id` is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    /// Epoch milliseconds, assigned by the server
    pub timestamp: i64,
    pub body: CommentBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A message in the global chat room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub timestamp: i64,
    pub body: CommentBody,
}

/// Announcement of newly published content or a new episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub content_id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Epoch milliseconds
    pub created_at: i64,
    pub kind: ContentKind,
}

/// User profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    pub is_admin: bool,
    /// Suspension end, epoch milliseconds
    pub suspended_until: Option<i64>,
}

impl UserProfile {
    /// Avatar URL derived from the e-mail address (or uid when absent)
    pub fn avatar_url(&self) -> String {
        avatar_url_for(self.email.as_deref().unwrap_or(&self.uid))
    }

    pub fn is_suspended(&self, now_ms: i64) -> bool {
        matches!(self.suspended_until, Some(until) if until > now_ms)
    }

    /// Whether `self` may change the role or suspension of `target`
    ///
    /// Only admins moderate, never themselves and never another admin.
    pub fn can_moderate(&self, target: &UserProfile) -> bool {
        self.is_admin && !target.is_admin && self.uid != target.uid
    }
}

/// Avatar URL for an identity string
pub fn avatar_url_for(identity: &str) -> String {
    format!("https://avatar.vercel.sh/{}.png", identity)
}

/// Episode of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// 1-based
    pub episode_number: i64,
    pub title: String,
    /// Empty when the episode is announced but not yet available
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub description: String,
}

impl Episode {
    pub fn is_available(&self) -> bool {
        !self.video_url.trim().is_empty()
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub genres: Vec<String>,
    pub in_emission: bool,
    pub likes: i64,
    pub liked_by: Vec<String>,
    pub created_at: i64,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Content {
    pub fn is_liked_by(&self, uid: &str) -> bool {
        self.liked_by.iter().any(|u| u == uid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    Image,
    Emoji,
}

impl StickerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StickerKind::Image => "image",
            StickerKind::Emoji => "emoji",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(StickerKind::Image),
            "emoji" => Ok(StickerKind::Emoji),
            other => Err(Error::InvalidInput(format!("unknown sticker kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StickerKind,
    pub value: String,
}
