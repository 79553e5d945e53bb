//! Debounced dirty-to-flash persistence protocol.
//!
//! A three-state machine stepped once per host-loop iteration:
//!
//! ```text
//!            request()                 countdown == 0
//!   Idle ───────────────▶ Pending ─────────────────────▶ write
//!    ▲                     │  ▲                            │
//!    │                     │  └── request(false) reloads   │
//!    │                     └───── request(true) zeroes     │
//!    └──────────────────────────────────────────────────────┘
//! ```
//!
//! Bursts of edits coalesce into one write: every non-immediate dirty
//! notification restarts the full debounce window, an immediate one
//! short-circuits it. The write itself runs under the pause handshake,
//! so the RT core is parked for exactly the write duration plus the
//! park latency on either side.
//!
//! A failed write is not retried here. The in-memory record stays
//! authoritative and the next dirty notification restarts the whole
//! cycle; the caller decides what to log.

use crate::config::ControllerConfig;
use crate::hal::{Storage, StorageError, Timing};
use crate::pause::PauseHandshake;

/// Debounce window in host-loop iterations.
///
/// Tick-counted against loop iterations rather than a wall-clock timer;
/// at the typical sub-millisecond service rate this is on the order of
/// a couple of seconds of quiet before a write lands.
pub const SAVE_DEBOUNCE_TICKS: u32 = 2000;

/// Persistence machine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveState {
    /// No pending write.
    Idle,
    /// Dirty; counting down the debounce window.
    Pending { ticks_left: u32 },
}

/// What one scheduler step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing pending.
    Idle,
    /// Still inside the debounce window.
    Counting,
    /// Record written to storage.
    Saved,
    /// Storage rejected the write; not retried.
    WriteFailed(StorageError),
}

pub struct SaveScheduler {
    state: SaveState,
    saved: u32,
    failed: u32,
}

impl SaveScheduler {
    pub const fn new() -> Self {
        Self {
            state: SaveState::Idle,
            saved: 0,
            failed: 0,
        }
    }

    /// Dirty notification: the record changed and should be persisted.
    ///
    /// `immediate` collapses the debounce window so the write happens
    /// on the next step; otherwise the full window restarts, coalescing
    /// a burst of edits into a single write.
    pub fn request(&mut self, immediate: bool) {
        self.state = SaveState::Pending {
            ticks_left: if immediate { 0 } else { SAVE_DEBOUNCE_TICKS },
        };
    }

    #[inline]
    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Completed writes since boot.
    pub fn saved_count(&self) -> u32 {
        self.saved
    }

    /// Failed writes since boot.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }

    /// Run one protocol step.
    ///
    /// Decrements the countdown; on expiry parks the RT core, writes
    /// the full record, and releases the handshake before returning.
    pub fn step<S: Storage, T: Timing>(
        &mut self,
        config: &ControllerConfig,
        storage: &mut S,
        pause: &PauseHandshake,
        timing: &mut T,
    ) -> SaveOutcome {
        match self.state {
            SaveState::Idle => SaveOutcome::Idle,
            SaveState::Pending { ticks_left: 0 } => {
                self.state = SaveState::Idle;
                match write_now(config, storage, pause, timing) {
                    Ok(()) => {
                        self.saved += 1;
                        SaveOutcome::Saved
                    }
                    Err(e) => {
                        self.failed += 1;
                        SaveOutcome::WriteFailed(e)
                    }
                }
            }
            SaveState::Pending { ticks_left } => {
                self.state = SaveState::Pending {
                    ticks_left: ticks_left - 1,
                };
                SaveOutcome::Counting
            }
        }
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the record right now, under the pause handshake.
///
/// Also the factory-reset persist path, which bypasses the debounce.
/// At most one write can be in flight: the handshake is held for the
/// whole call and `requested` is only cleared after the write returns.
pub fn write_now<S: Storage, T: Timing>(
    config: &ControllerConfig,
    storage: &mut S,
    pause: &PauseHandshake,
    timing: &mut T,
) -> Result<(), StorageError> {
    pause.request();
    pause.wait_parked(timing);
    let result = storage.write(config);
    pause.release();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_requested() {
        let sched = SaveScheduler::new();
        assert_eq!(sched.state(), SaveState::Idle);
    }

    #[test]
    fn test_request_arms_countdown() {
        let mut sched = SaveScheduler::new();
        sched.request(false);
        assert_eq!(
            sched.state(),
            SaveState::Pending {
                ticks_left: SAVE_DEBOUNCE_TICKS
            }
        );
    }

    #[test]
    fn test_immediate_request_zeroes_countdown() {
        let mut sched = SaveScheduler::new();
        sched.request(false);
        sched.request(true);
        assert_eq!(sched.state(), SaveState::Pending { ticks_left: 0 });
    }

    #[test]
    fn test_non_immediate_request_reloads_window() {
        let mut sched = SaveScheduler::new();
        sched.request(true);
        sched.request(false);
        assert_eq!(
            sched.state(),
            SaveState::Pending {
                ticks_left: SAVE_DEBOUNCE_TICKS
            }
        );
    }
}
