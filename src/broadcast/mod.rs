// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bridges store events to real-time viewer connections.
//!
//! The broadcaster subscribes once to the store's change notifications and
//! fans every event out over a tokio broadcast channel. Viewer transports
//! (WebSocket tasks) each hold a [`ViewerSession`]; a session that closes,
//! errors, or lags is skipped, never queued or retried, and never fails the
//! mutation that produced the event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::CanvasMessage;
use crate::store::{now_millis, CanvasStore};

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out hub for the push channel.
///
/// Cheap to clone; all clones share the same channel and viewer counter.
#[derive(Debug, Clone)]
pub struct CanvasBroadcaster {
    tx: broadcast::Sender<CanvasMessage>,
    viewers: Arc<AtomicUsize>,
}

impl CanvasBroadcaster {
    /// Create a broadcaster and register it as a store listener. Events are
    /// forwarded in emission order; having no connected viewer is not an
    /// error.
    pub fn attach(store: &mut CanvasStore) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let sender = tx.clone();
        store.on_change(move |event| {
            let _ = sender.send(CanvasMessage::from(event.clone()));
        });
        Self {
            tx,
            viewers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Admit a new viewer.
    ///
    /// Must be called while the caller holds the store lock: subscribing and
    /// snapshotting under the same lock cuts the event stream at one point,
    /// so the viewer receives `initial_elements` (then `sync_status`)
    /// strictly before any later incremental event.
    pub fn join(&self, store: &CanvasStore) -> ViewerSession {
        let rx = self.tx.subscribe();
        let greeting = vec![
            CanvasMessage::InitialElements {
                elements: store.get_all(),
            },
            CanvasMessage::SyncStatus {
                element_count: store.len(),
                timestamp: now_millis(),
            },
        ];
        self.viewers.fetch_add(1, Ordering::Relaxed);
        ViewerSession {
            greeting,
            rx,
            viewers: self.viewers.clone(),
        }
    }

    /// Push a message that does not originate from a store mutation (e.g. a
    /// Mermaid conversion request handled client-side). Returns the number
    /// of sessions the message was handed to.
    pub fn broadcast_message(&self, message: CanvasMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Live connection count, for health/diagnostic reporting.
    pub fn viewer_count(&self) -> usize {
        self.viewers.load(Ordering::Relaxed)
    }
}

/// One viewer's end of the push channel.
///
/// `greeting` holds the two join messages in their required order; the
/// transport must flush them before draining `recv`.
pub struct ViewerSession {
    pub greeting: Vec<CanvasMessage>,
    rx: broadcast::Receiver<CanvasMessage>,
    viewers: Arc<AtomicUsize>,
}

impl ViewerSession {
    /// Next incremental message, or `None` once the channel is gone. A slow
    /// viewer that lagged past the channel capacity silently loses the
    /// missed messages rather than stalling the store.
    pub async fn recv(&mut self) -> Option<CanvasMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.viewers.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::CanvasBroadcaster;
    use crate::model::ElementType;
    use crate::ops::CreateElement;
    use crate::protocol::CanvasMessage;
    use crate::store::CanvasStore;

    fn rectangle(x: f64, y: f64) -> CreateElement {
        CreateElement::new(ElementType::Rectangle, x, y)
    }

    #[tokio::test]
    async fn viewer_receives_snapshot_before_any_incremental_event() {
        let mut store = CanvasStore::new();
        let broadcaster = CanvasBroadcaster::attach(&mut store);
        store.create(rectangle(0.0, 0.0));

        // Joining cuts the stream: the snapshot covers the first create, the
        // subscription covers everything after.
        let mut session = broadcaster.join(&store);
        store.create(rectangle(10.0, 0.0));

        let CanvasMessage::InitialElements { elements } = &session.greeting[0] else {
            panic!("expected initial_elements first, got {:?}", session.greeting[0]);
        };
        assert_eq!(elements.len(), 1);
        let CanvasMessage::SyncStatus { element_count, .. } = &session.greeting[1] else {
            panic!("expected sync_status second, got {:?}", session.greeting[1]);
        };
        assert_eq!(*element_count, 1);

        let incremental = session.recv().await.expect("incremental event");
        assert!(matches!(incremental, CanvasMessage::ElementCreated { .. }));
    }

    #[tokio::test]
    async fn every_session_receives_every_event_in_order() {
        let mut store = CanvasStore::new();
        let broadcaster = CanvasBroadcaster::attach(&mut store);

        let mut first = broadcaster.join(&store);
        let mut second = broadcaster.join(&store);
        assert_eq!(broadcaster.viewer_count(), 2);

        let element = store.create(rectangle(0.0, 0.0));
        store.delete(element.id.as_str()).expect("delete");

        for session in [&mut first, &mut second] {
            let created = session.recv().await.expect("created");
            assert!(matches!(created, CanvasMessage::ElementCreated { .. }));
            let deleted = session.recv().await.expect("deleted");
            assert_eq!(deleted, CanvasMessage::ElementDeleted { id: element.id.clone() });
        }
    }

    #[tokio::test]
    async fn manual_broadcast_reaches_viewers_without_touching_the_store() {
        let mut store = CanvasStore::new();
        let broadcaster = CanvasBroadcaster::attach(&mut store);
        let mut session = broadcaster.join(&store);

        let delivered = broadcaster.broadcast_message(CanvasMessage::MermaidConvert {
            mermaid: "flowchart TD; A-->B".to_owned(),
        });
        assert_eq!(delivered, 1);
        assert!(store.is_empty());

        let message = session.recv().await.expect("message");
        assert_eq!(
            message,
            CanvasMessage::MermaidConvert {
                mermaid: "flowchart TD; A-->B".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn dropping_a_session_updates_the_viewer_count() {
        let mut store = CanvasStore::new();
        let broadcaster = CanvasBroadcaster::attach(&mut store);

        let session = broadcaster.join(&store);
        assert_eq!(broadcaster.viewer_count(), 1);
        drop(session);
        assert_eq!(broadcaster.viewer_count(), 0);

        // With no audience the send is a no-op, not a failure.
        assert_eq!(
            broadcaster.broadcast_message(CanvasMessage::MermaidConvert {
                mermaid: String::new()
            }),
            0
        );
    }
}
