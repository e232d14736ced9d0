//! Daily recommendation card

use axum::{extract::State, Json};
use dramawave_common::events::DramaEvent;

use crate::error::ApiResult;
use crate::services::recommendation::DailyRecommendation;
use crate::session::MaybeSession;
use crate::AppState;

/// GET /api/recommendations/daily
///
/// Anyone may read a filled cache; only signed-in callers trigger a fill.
pub async fn daily(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> ApiResult<Json<DailyRecommendation>> {
    let now = dramawave_common::time::now_millis();
    let card = state.recommendations.daily(session.is_some(), now).await?;

    if let DailyRecommendation::Generated { date, .. } = &card {
        state.event_bus.emit_lossy(DramaEvent::RecommendationUpdated {
            date: date.clone(),
            timestamp: dramawave_common::time::now(),
        });
    }
    Ok(Json(card))
}
