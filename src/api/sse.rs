//! Server-Sent Events support

use crate::conversation::ConversationSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Stream the current snapshot as `init`, then one `snapshot` event per change
pub fn sse_stream(
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = WatchStream::new(snapshot_rx)
        .enumerate()
        .map(|(index, snapshot)| {
            let kind = if index == 0 { "init" } else { "snapshot" };
            Ok(snapshot_to_event(kind, &snapshot))
        });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn snapshot_to_event(kind: &str, snapshot: &ConversationSnapshot) -> Event {
    let data = serde_json::to_string(snapshot).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize snapshot");
        "{}".to_string()
    });
    Event::default().event(kind).data(data)
}
