//! Sticker catalogue management

use dramawave_common::events::DramaEvent;
use dramawave_common::ids::push_key;
use dramawave_common::models::{Sticker, StickerKind};
use serde::Deserialize;
use tracing::info;

use super::validation::{require_url, MAX_EMOJI_LEN};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

/// Exactly one of `image_url` or `emoji`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSticker {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl NewSticker {
    pub fn into_sticker(self, id: String) -> ApiResult<Sticker> {
        let image = self.image_url.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let emoji = self.emoji.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (image, emoji) {
            (Some(url), None) => {
                require_url("image_url", &url)?;
                Ok(Sticker { id, kind: StickerKind::Image, value: url })
            }
            (None, Some(emoji)) if emoji.chars().count() <= MAX_EMOJI_LEN => {
                Ok(Sticker { id, kind: StickerKind::Emoji, value: emoji })
            }
            (None, Some(_)) => Err(ApiError::BadRequest("invalid emoji".to_string())),
            _ => Err(ApiError::BadRequest(
                "provide exactly one of image_url or emoji".to_string(),
            )),
        }
    }
}

pub async fn add_sticker(
    state: &AppState,
    session: &Session,
    input: NewSticker,
) -> ApiResult<Sticker> {
    session.require_admin()?;
    let sticker = input.into_sticker(push_key())?;

    db::stickers::insert_sticker(&state.db, &sticker, dramawave_common::time::now_millis())
        .await?;

    info!(sticker_id = %sticker.id, kind = sticker.kind.as_str(), "Sticker added by {}", session.uid());
    state.event_bus.emit_lossy(DramaEvent::StickersChanged {
        added: Some(sticker.clone()),
        removed: None,
        timestamp: dramawave_common::time::now(),
    });
    Ok(sticker)
}

pub async fn remove_sticker(state: &AppState, session: &Session, id: &str) -> ApiResult<()> {
    session.require_admin()?;
    if !db::stickers::delete_sticker(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("sticker {}", id)));
    }

    info!(sticker_id = id, "Sticker removed by {}", session.uid());
    state.event_bus.emit_lossy(DramaEvent::StickersChanged {
        added: None,
        removed: Some(id.to_string()),
        timestamp: dramawave_common::time::now(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_value() {
        let image = NewSticker {
            image_url: Some("https://img.example.com/s.png".into()),
            emoji: None,
        };
        assert_eq!(image.into_sticker("a".into()).unwrap().kind, StickerKind::Image);

        let emoji = NewSticker { image_url: None, emoji: Some(" 🎉 ".into()) };
        let sticker = emoji.into_sticker("b".into()).unwrap();
        assert_eq!(sticker.kind, StickerKind::Emoji);
        assert_eq!(sticker.value, "🎉");

        let both = NewSticker {
            image_url: Some("https://img.example.com/s.png".into()),
            emoji: Some("🎉".into()),
        };
        assert!(both.into_sticker("c".into()).is_err());
        assert!(NewSticker::default().into_sticker("d".into()).is_err());
    }

    #[test]
    fn test_image_must_be_url() {
        let bad = NewSticker { image_url: Some("sticker.png".into()), emoji: None };
        assert!(matches!(bad.into_sticker("x".into()), Err(ApiError::BadRequest(_))));
    }
}
