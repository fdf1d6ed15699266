// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Process-wide shared state.
//!
//! Both request surfaces and every WebSocket task hold the same
//! [`SharedCanvas`]; the store sits behind one async mutex, so mutations from
//! any surface serialize and their change notifications interleave in
//! acceptance order.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};

use crate::broadcast::CanvasBroadcaster;
use crate::store::CanvasStore;

pub type SharedCanvas = Arc<CanvasState>;

/// The store, its broadcaster, and housekeeping counters.
pub struct CanvasState {
    store: Mutex<CanvasStore>,
    broadcaster: CanvasBroadcaster,
    activity: ActivityTracker,
    started_at: Instant,
    shutdown: watch::Sender<bool>,
}

impl CanvasState {
    /// Build the store with the broadcaster already attached as a listener,
    /// so no mutation can ever slip past the push channel.
    pub fn new() -> SharedCanvas {
        let mut store = CanvasStore::new();
        let broadcaster = CanvasBroadcaster::attach(&mut store);
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            store: Mutex::new(store),
            broadcaster,
            activity: ActivityTracker::new(),
            started_at: Instant::now(),
            shutdown,
        })
    }

    pub fn store(&self) -> &Mutex<CanvasStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &CanvasBroadcaster {
        &self.broadcaster
    }

    /// Record activity; every API request, tool call, and WebSocket frame
    /// counts, keeping the idle watchdog at bay.
    pub fn touch(&self) {
        self.activity.touch();
    }

    pub fn idle_for(&self) -> Duration {
        self.activity.idle_for()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Tell long-lived connection tasks to wind down. Viewer sockets must
    /// close before the HTTP listener can finish draining.
    pub fn begin_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// A receiver that resolves once [`begin_shutdown`](Self::begin_shutdown)
    /// has been called, including when that happened before subscribing.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Tracks the instant of the most recent activity.
///
/// Uses a std mutex: the critical section is a single `Instant` store/load
/// and never held across an await point.
struct ActivityTracker {
    last: StdMutex<Instant>,
}

impl ActivityTracker {
    fn new() -> Self {
        Self {
            last: StdMutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        let last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        last.elapsed()
    }
}

/// Sleep until the canvas has seen no activity for `timeout`, polling
/// coarsely. Returns when the watchdog fires; the caller decides what
/// shutdown means.
pub async fn idle_watchdog(state: SharedCanvas, timeout: Duration) {
    let poll = (timeout / 4).clamp(Duration::from_millis(100), Duration::from_secs(30));
    loop {
        tokio::time::sleep(poll).await;
        let idle = state.idle_for();
        if idle >= timeout {
            tracing::info!(idle_secs = idle.as_secs(), "idle timeout reached");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::CanvasState;
    use crate::model::ElementType;
    use crate::ops::CreateElement;
    use crate::protocol::CanvasMessage;

    #[tokio::test]
    async fn state_wires_the_broadcaster_into_the_store() {
        let state = CanvasState::new();
        let mut session = {
            let store = state.store().lock().await;
            state.broadcaster().join(&store)
        };

        state
            .store()
            .lock()
            .await
            .create(CreateElement::new(ElementType::Rectangle, 0.0, 0.0));

        let message = session.recv().await.expect("broadcast message");
        assert!(matches!(message, CanvasMessage::ElementCreated { .. }));
    }

    #[tokio::test]
    async fn touch_resets_the_idle_clock() {
        let state = CanvasState::new();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(state.idle_for() >= Duration::from_millis(10));

        state.touch();
        assert!(state.idle_for() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn idle_watchdog_fires_only_after_a_quiet_window() {
        let state = CanvasState::new();
        let watchdog = tokio::spawn(super::idle_watchdog(
            state.clone(),
            Duration::from_millis(500),
        ));

        // Regular activity keeps the window from ever filling up.
        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            state.touch();
        }
        assert!(!watchdog.is_finished());

        tokio::time::timeout(Duration::from_secs(3), watchdog)
            .await
            .expect("watchdog fires once activity stops")
            .expect("watchdog task");
    }
}
