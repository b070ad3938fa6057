//! Conversation runtime executor

use super::{ConversationHandle, Event};
use crate::conversation::{ConversationController, ConversationSnapshot, Disposition, OpenSession};
use crate::streaming::StreamingClient;
use tokio::sync::{mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct ConversationRuntime {
    controller: ConversationController,
    client: StreamingClient,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the runtime stops once every handle and session is gone
    event_tx: mpsc::WeakSender<Event>,
    snapshot_tx: watch::Sender<ConversationSnapshot>,
}

impl ConversationRuntime {
    /// Start the runtime on a background task and return a handle to it
    pub fn spawn(controller: ConversationController, client: StreamingClient) -> ConversationHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let runtime = Self {
            controller,
            client,
            event_rx,
            event_tx: event_tx.downgrade(),
            snapshot_tx,
        };
        tokio::spawn(runtime.run());

        ConversationHandle::new(event_tx, snapshot_rx)
    }

    pub async fn run(mut self) {
        tracing::info!("Starting conversation runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!("Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let changed = match event {
            Event::UserMessage { text } => match self.controller.send(&text) {
                Some(open) => {
                    self.open_session(open);
                    true
                }
                None => false,
            },
            Event::UserCancel => self.controller.cancel(),
            Event::Stream(event) => self.controller.apply(event) == Disposition::Applied,
        };

        // Full copy of the log per change, so cost grows with conversation length
        if changed {
            self.snapshot_tx.send_replace(self.controller.snapshot());
        }
    }

    fn open_session(&mut self, open: OpenSession) {
        let Some(events) = self.event_tx.upgrade() else {
            tracing::warn!(session = %open.session, "No handles left, not opening session");
            self.controller.cancel();
            return;
        };
        // Detached: the session reports back through the event channel
        drop(self.client.open(open, events));
    }
}
