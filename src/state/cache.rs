//! Room list snapshot cache.
//!
//! Lobby clients see a derived summary of all non-completed rooms. The
//! snapshot is memoized for a short window to absorb bursts of
//! membership churn; mutations invalidate the memo and mark the list
//! dirty, and a background loop (`tasks::spawn_room_list_broadcaster`)
//! pushes at most one fresh copy per debounce window while dirty.

use super::AppState;
use crate::protocol::RoomSummary;
use crate::types::RoomPhase;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(super) struct RoomListCache {
    snapshot: Arc<Mutex<Option<(Instant, Vec<RoomSummary>)>>>,
    dirty: Arc<AtomicBool>,
}

impl RoomListCache {
    pub(super) fn new() -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(None)),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl AppState {
    /// Current lobby summaries, memoized for the debounce window
    pub async fn room_list_snapshot(&self) -> Vec<RoomSummary> {
        {
            let cached = self.room_list.snapshot.lock().await;
            if let Some((computed_at, rooms)) = cached.as_ref() {
                if computed_at.elapsed() < self.config.room_list_debounce {
                    return rooms.clone();
                }
            }
        }

        let mut summaries: Vec<RoomSummary> = {
            let rooms = self.rooms.read().await;
            rooms
                .values()
                .filter(|room| room.phase != RoomPhase::Completed)
                .map(RoomSummary::from)
                .collect()
        };
        summaries.sort_by(|a, b| a.id.cmp(&b.id));

        let mut cached = self.room_list.snapshot.lock().await;
        *cached = Some((Instant::now(), summaries.clone()));
        summaries
    }

    /// Drop the memo after a membership or phase mutation and mark a
    /// broadcast as owed. The broadcast itself is debounced.
    pub async fn invalidate_room_list(&self) {
        *self.room_list.snapshot.lock().await = None;
        self.room_list.dirty.store(true, Ordering::Release);
    }

    /// Whether a broadcast is owed. Clears the flag when it was set.
    pub fn take_room_list_dirty(&self) -> bool {
        self.room_list.dirty.swap(false, Ordering::AcqRel)
    }
}
