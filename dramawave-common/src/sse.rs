//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::events::{DramaEvent, EventBus};

/// Keep-alive interval for every SSE connection
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Convert a DramaEvent into an SSE frame named after its type
pub fn to_sse_event(event: &DramaEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("SSE: failed to serialize {}: {}", event.event_type(), e);
            None
        }
    }
}

/// Stream every bus event to one SSE client
///
/// The first frame is a `ConnectionStatus` event. A client that lags behind
/// the bus skips the lost events; the gap is logged and the stream carries on.
/// When `content_filter` is set, only events about that content item (and
/// events not tied to any content) are forwarded.
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
    content_filter: Option<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let rx = event_bus.subscribe();
    let initial = futures::stream::once(async {
        Ok::<_, Infallible>(Event::default().event("ConnectionStatus").data("connected"))
    });

    let events = BroadcastStream::new(rx).filter_map(move |item| match item {
        Ok(event) => {
            let wanted = match (&content_filter, event.content_id()) {
                (Some(filter), Some(id)) => filter == id,
                _ => true,
            };
            if !wanted {
                return None;
            }
            debug!("SSE: forwarding {}", event.event_type());
            to_sse_event(&event).map(Ok)
        }
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("SSE: client lagged, {} events dropped", skipped);
            None
        }
    });

    Sse::new(futures::StreamExt::chain(initial, events))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat"))
}
