//! Persistence protocol: debounce, coalescing, write exclusion, no-retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rust_iidx_controller::config::Hsv;
use rust_iidx_controller::hal::{Storage, StorageError, Timing};
use rust_iidx_controller::save::SAVE_DEBOUNCE_TICKS;
use rust_iidx_controller::{
    ControllerConfig, PauseHandshake, SaveOutcome, SaveScheduler, SaveState,
};

struct YieldTiming;

impl Timing for YieldTiming {
    fn delay_ms(&mut self, _ms: u32) {
        thread::yield_now();
    }
    fn now_us(&mut self) -> i64 {
        0
    }
}

#[derive(Default)]
struct RecordingStorage {
    writes: Vec<ControllerConfig>,
    fail_next: bool,
}

impl Storage for RecordingStorage {
    fn load(&mut self) -> ControllerConfig {
        ControllerConfig::DEFAULT
    }

    fn write(&mut self, config: &ControllerConfig) -> Result<(), StorageError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(StorageError::Io(-1));
        }
        self.writes.push(*config);
        Ok(())
    }
}

/// Run `body` with a background thread standing in for the RT core:
/// it parks whenever the handshake asks, so blocking writes can finish.
fn with_rt_sim(pause: &PauseHandshake, body: impl FnOnce()) {
    let stop = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(Ordering::Relaxed) {
                if pause.is_requested() {
                    pause.park(&mut YieldTiming);
                }
                thread::yield_now();
            }
        });
        body();
        stop.store(true, Ordering::Relaxed);
    });
}

#[test]
fn test_burst_of_edits_coalesces_into_one_write() {
    let pause = PauseHandshake::new();
    let mut sched = SaveScheduler::new();
    let mut storage = RecordingStorage::default();
    let mut config = ControllerConfig::DEFAULT;

    with_rt_sim(&pause, || {
        // Five dirty notifications well inside the debounce window,
        // each editing the record a bit more.
        for i in 0..5u8 {
            config.key_on[0] = Hsv::new(i, i, i);
            sched.request(false);
            for _ in 0..10 {
                assert_eq!(
                    sched.step(&config, &mut storage, &pause, &mut YieldTiming),
                    SaveOutcome::Counting
                );
            }
        }

        // Quiet period: let the countdown run out.
        let mut saved = 0;
        for _ in 0..=SAVE_DEBOUNCE_TICKS {
            if sched.step(&config, &mut storage, &pause, &mut YieldTiming) == SaveOutcome::Saved {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
    });

    // One write, containing the latest record state at write time.
    assert_eq!(storage.writes.len(), 1);
    assert_eq!(storage.writes[0].key_on[0], Hsv::new(4, 4, 4));
    assert_eq!(sched.saved_count(), 1);
}

#[test]
fn test_immediate_request_short_circuits_debounce() {
    let pause = PauseHandshake::new();
    let mut sched = SaveScheduler::new();
    let mut storage = RecordingStorage::default();
    let config = ControllerConfig::DEFAULT;

    with_rt_sim(&pause, || {
        sched.request(false);
        sched.request(true);
        assert_eq!(
            sched.step(&config, &mut storage, &pause, &mut YieldTiming),
            SaveOutcome::Saved
        );
    });

    assert_eq!(storage.writes.len(), 1);
}

#[test]
fn test_non_immediate_request_restarts_window() {
    let pause = PauseHandshake::new();
    let mut sched = SaveScheduler::new();
    let mut storage = RecordingStorage::default();
    let config = ControllerConfig::DEFAULT;

    sched.request(false);
    // Burn half the window, then a new non-immediate edit arrives.
    for _ in 0..SAVE_DEBOUNCE_TICKS / 2 {
        sched.step(&config, &mut storage, &pause, &mut YieldTiming);
    }
    sched.request(false);
    assert_eq!(
        sched.state(),
        SaveState::Pending {
            ticks_left: SAVE_DEBOUNCE_TICKS
        }
    );
    assert!(storage.writes.is_empty());
}

#[test]
fn test_write_failure_not_retried_until_next_notification() {
    let pause = PauseHandshake::new();
    let mut sched = SaveScheduler::new();
    let mut storage = RecordingStorage {
        fail_next: true,
        ..Default::default()
    };
    let config = ControllerConfig::DEFAULT;

    with_rt_sim(&pause, || {
        sched.request(true);
        assert_eq!(
            sched.step(&config, &mut storage, &pause, &mut YieldTiming),
            SaveOutcome::WriteFailed(StorageError::Io(-1))
        );

        // No retry on its own: the machine went back to Idle.
        for _ in 0..100 {
            assert_eq!(
                sched.step(&config, &mut storage, &pause, &mut YieldTiming),
                SaveOutcome::Idle
            );
        }
        assert!(storage.writes.is_empty());

        // The next dirty notification restarts the whole cycle.
        sched.request(true);
        assert_eq!(
            sched.step(&config, &mut storage, &pause, &mut YieldTiming),
            SaveOutcome::Saved
        );
    });

    assert_eq!(storage.writes.len(), 1);
    assert_eq!(sched.failed_count(), 1);
    assert_eq!(sched.saved_count(), 1);
}

#[test]
fn test_handshake_released_after_write() {
    let pause = PauseHandshake::new();
    let mut sched = SaveScheduler::new();
    let mut storage = RecordingStorage::default();
    let config = ControllerConfig::DEFAULT;

    with_rt_sim(&pause, || {
        sched.request(true);
        sched.step(&config, &mut storage, &pause, &mut YieldTiming);
    });

    assert!(!pause.is_requested());
    assert!(!pause.is_parked());
}
