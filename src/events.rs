//! Server-sent events that tell connected clients their workspace data changed.
//!
//! Write endpoints publish a [ChangeEvent] after committing, and the dashboard
//! subscribes via [get_event_stream] to refresh itself without polling.

use std::convert::Infallible;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use crate::{AppState, auth::RequestContext, database_id::DatabaseId};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The kind of data that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTopic {
    /// A time entry was created, updated or deleted.
    Timesheet,
    /// A board or task changed.
    Boards,
    /// A journal entry or account changed.
    Journal,
    /// A payroll, payroll transaction or transaction item changed.
    Payroll,
    /// A workspace or its membership changed.
    Workspace,
}

/// A change notification broadcast to dashboard clients.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    /// The workspace whose data changed.
    pub workspace_id: DatabaseId,
    /// What kind of data changed.
    pub topic: ChangeTopic,
}

/// A handle for broadcasting [ChangeEvent]s to connected clients.
///
/// Cloning is cheap, all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct ChangeEvents {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeEvents {
    /// Create a new event channel with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self { sender }
    }

    /// Notify subscribers that data in `workspace_id` changed.
    ///
    /// Publishing with no connected subscribers is not an error.
    pub fn publish(&self, workspace_id: DatabaseId, topic: ChangeTopic) {
        let _ = self.sender.send(ChangeEvent {
            workspace_id,
            topic,
        });
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// The state needed to serve the event stream.
#[derive(Debug, Clone)]
pub struct EventStreamState {
    /// The shared event channel.
    pub events: ChangeEvents,
}

impl FromRef<AppState> for EventStreamState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            events: state.events.clone(),
        }
    }
}

/// An SSE stream of change events for the caller's active workspace.
///
/// Events for other workspaces are filtered out server-side. Receivers that
/// fall behind skip the missed events, the client refreshes on the next one.
pub async fn get_event_stream(
    State(state): State<EventStreamState>,
    Extension(context): Extension<RequestContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let workspace_id = context.workspace_id;

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |result| {
        let event = match result {
            Ok(event) if event.workspace_id == workspace_id => event,
            _ => return None,
        };

        let data = match serde_json::to_string(&event) {
            Ok(data) => data,
            Err(error) => {
                tracing::error!("could not serialize change event: {error}");
                return None;
            }
        };

        Some(Ok(Event::default().event("change").data(data)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
