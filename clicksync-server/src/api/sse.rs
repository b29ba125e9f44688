//! Server-Sent Events (SSE) broadcaster
//!
//! Streams clicks and parameter changes to players and control clients.
//! Every stream opens with the current parameters, so a client never has
//! to poll for the initial state.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use clicksync_common::events::ClickSyncEvent;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /api/v1/events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    // Subscribe before reading the snapshot: no change can slip in between
    let mut rx = ctx.events.subscribe();
    let initial = ctx.scheduler.snapshot().await;

    let stream = async_stream::stream! {
        match initial {
            Ok(config) => {
                if let Some(event) = to_sse(&ClickSyncEvent::Parameters(config)) {
                    yield Ok(event);
                }
            }
            Err(e) => warn!("SSE: no initial parameters: {}", e),
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(event) = to_sse(&event) {
                        yield Ok(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE client lagged, {} event(s) dropped", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: event bus closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse(event: &ClickSyncEvent) -> Option<Event> {
    match event.payload_json() {
        Ok(json) => {
            debug!("Broadcasting SSE event: {}", event.event_name());
            Some(Event::default().event(event.event_name()).data(json))
        }
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
