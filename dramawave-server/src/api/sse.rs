//! Server-Sent Events for store changes

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only forward events about this content item
    pub content_id: Option<String>,
}

/// GET /api/events[?content_id=] - SSE stream of DramaEvent
///
/// Streams a `ConnectionStatus` frame, then one frame per event named after
/// its type. Clients re-read the affected resource on each event.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    dramawave_common::sse::create_event_sse_stream(
        "dramawave-server",
        &state.event_bus,
        query.content_id.filter(|id| !id.is_empty()),
    )
}
