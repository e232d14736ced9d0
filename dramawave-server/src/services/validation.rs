//! Input validation shared by the write paths
//!
//! Everything here runs before the store is touched.

use dramawave_common::models::CommentBody;

use crate::error::{ApiError, ApiResult};

/// Maximum characters in an emoji body
pub const MAX_EMOJI_LEN: usize = 8;

/// Display name bounds (characters)
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 20;

/// Absolute http(s) URL
pub fn is_valid_url(value: &str) -> bool {
    match reqwest::Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn require_url(field: &str, value: &str) -> ApiResult<()> {
    if is_valid_url(value) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("{} must be a valid URL", field)))
    }
}

/// Trim and check a comment or chat body
pub fn normalize_body(body: CommentBody, max_text_len: usize) -> ApiResult<CommentBody> {
    match body {
        CommentBody::Text(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(ApiError::BadRequest("comment cannot be empty".to_string()));
            }
            if text.chars().count() > max_text_len {
                return Err(ApiError::BadRequest(format!(
                    "comment cannot exceed {} characters",
                    max_text_len
                )));
            }
            Ok(CommentBody::Text(text))
        }
        CommentBody::Emoji(emoji) => {
            let emoji = emoji.trim().to_string();
            let len = emoji.chars().count();
            if len == 0 || len > MAX_EMOJI_LEN {
                return Err(ApiError::BadRequest("invalid emoji".to_string()));
            }
            Ok(CommentBody::Emoji(emoji))
        }
        CommentBody::Image(url) => {
            require_url("image", &url)?;
            Ok(CommentBody::Image(url.trim().to_string()))
        }
    }
}

/// Trimmed display name within bounds
pub fn display_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://cdn.example.com/poster.jpg"));
        assert!(is_valid_url("http://localhost:8080/v.mp4"));
        assert!(!is_valid_url("poster.jpg"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_text_body_rules() {
        let ok = normalize_body(CommentBody::Text("  hola  ".into()), 500).unwrap();
        assert_eq!(ok, CommentBody::Text("hola".into()));

        assert!(normalize_body(CommentBody::Text("   ".into()), 500).is_err());
        assert!(normalize_body(CommentBody::Text("x".repeat(501)), 500).is_err());
        // limit counts characters, not bytes
        assert!(normalize_body(CommentBody::Text("ñ".repeat(500)), 500).is_ok());
    }

    #[test]
    fn test_emoji_and_image_rules() {
        assert!(normalize_body(CommentBody::Emoji("😂".into()), 500).is_ok());
        assert!(normalize_body(CommentBody::Emoji("".into()), 500).is_err());
        assert!(normalize_body(CommentBody::Emoji("abcdefghij".into()), 500).is_err());
        assert!(normalize_body(CommentBody::Image("https://x.io/s.png".into()), 500).is_ok());
        assert!(normalize_body(CommentBody::Image("not a url".into()), 500).is_err());
    }

    #[test]
    fn test_display_name_bounds() {
        assert_eq!(display_name("  Ana ").unwrap(), "Ana");
        assert!(display_name("A").is_err());
        assert!(display_name(&"a".repeat(21)).is_err());
        assert!(display_name(&"a".repeat(20)).is_ok());
    }
}
