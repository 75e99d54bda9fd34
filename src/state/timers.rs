//! Cancellable per-room timers, keyed `(room, purpose)`.
//!
//! Arming always aborts any pending predecessor for the same key, so a
//! purpose can never fire twice for one round. Callbacks re-enter the
//! state machine and re-validate phase before acting.

use super::AppState;
use crate::types::RoomId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Auto-trigger the honest player's reveal if they take no action
    ForcedReveal,
    /// Close the reveal window after `answer_view_seconds`
    HideAnswer,
    /// Roll an ended round into the next one
    AutoAdvance,
}

#[derive(Clone)]
pub(super) struct TimerTable {
    inner: Arc<Mutex<HashMap<(RoomId, TimerPurpose), JoinHandle<()>>>>,
}

impl TimerTable {
    pub(super) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a timer handle, aborting any pending one for the same key
    pub(super) async fn store(&self, room_id: &str, purpose: TimerPurpose, handle: JoinHandle<()>) {
        let mut timers = self.inner.lock().await;
        if let Some(previous) = timers.insert((room_id.to_string(), purpose), handle) {
            previous.abort();
        }
    }

    pub(super) async fn cancel(&self, room_id: &str, purpose: TimerPurpose) {
        let mut timers = self.inner.lock().await;
        if let Some(handle) = timers.remove(&(room_id.to_string(), purpose)) {
            handle.abort();
        }
    }

    /// Drop every pending timer for a room (room closure)
    pub(super) async fn cancel_room(&self, room_id: &str) {
        let mut timers = self.inner.lock().await;
        timers.retain(|(id, _), handle| {
            if id == room_id {
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub(super) async fn is_armed(&self, room_id: &str, purpose: TimerPurpose) -> bool {
        let timers = self.inner.lock().await;
        timers
            .get(&(room_id.to_string(), purpose))
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl AppState {
    /// Schedule a phase-machine re-entry after `delay`, replacing any
    /// pending timer with the same purpose for this room.
    ///
    /// Returns an explicitly-boxed `Send` future: the timer callback
    /// re-enters the phase machine, which arms further timers, so the
    /// future type is mutually recursive. Boxing with a declared `Send`
    /// bound breaks the otherwise-unresolvable auto-trait inference cycle.
    pub(super) fn arm_timer<'a>(
        self: &'a Arc<Self>,
        room_id: &'a str,
        purpose: TimerPurpose,
        delay: Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let state = Arc::clone(self);
            let fire_room = room_id.to_string();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                match purpose {
                    TimerPurpose::ForcedReveal => state.forced_reveal_fired(&fire_room).await,
                    TimerPurpose::HideAnswer => state.hide_answer_fired(&fire_room).await,
                    TimerPurpose::AutoAdvance => state.auto_advance_fired(&fire_room).await,
                }
            });
            self.timers.store(room_id, purpose, handle).await;
        })
    }

    pub(super) async fn cancel_timer(&self, room_id: &str, purpose: TimerPurpose) {
        self.timers.cancel(room_id, purpose).await;
    }

    pub(super) async fn cancel_room_timers(&self, room_id: &str) {
        self.timers.cancel_room(room_id).await;
    }

    #[cfg(test)]
    pub(crate) async fn timer_armed(&self, room_id: &str, purpose: TimerPurpose) -> bool {
        self.timers.is_armed(room_id, purpose).await
    }
}
