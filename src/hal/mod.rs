//! Hardware collaborator interfaces.
//!
//! The coordination core never touches a peripheral directly; it talks
//! to these traits. Driver internals (angle decoding, LED rendering,
//! the TinyUSB stack, flash block I/O) live behind them and are
//! deliberately not part of this crate's logic: the loops only care
//! about the contracts below. Business logic stays in core modules,
//! HAL is just I/O.

use crate::config::{ControllerConfig, Hsv};
use crate::report::reduce_angle;

/// Rotary sensor, sampled once per real-time cycle.
///
/// Owned exclusively by the RT core; the host side reads the published
/// angle byte from the shared report instead.
pub trait Turntable {
    /// Raw angle, full sensor resolution.
    fn raw_angle(&mut self) -> u16;

    /// Reduced-precision angle byte as published in the report.
    fn reduced_angle(&mut self) -> u8 {
        reduce_angle(self.raw_angle())
    }

    /// Periodic housekeeping hook (filtering, counters).
    fn update(&mut self);
}

/// Addressable lighting engine.
///
/// Consumed by both cores, so every method takes `&self`: the RT core
/// feeds the angle and drives the refresh, the host core sets button
/// colors and overrides. Implementations handle interior mutability.
pub trait Lighting: Sync {
    /// Feed the current raw angle into the ring animation.
    fn set_angle(&self, raw_angle: u16);

    /// Render one frame. The expensive step; the RT loop throttles it.
    fn refresh(&self);

    /// Light per-key LEDs from the pressed-button mask.
    fn set_button_lights(&self, buttons: u16);

    /// Setup-menu override: draw exactly these colors instead of the
    /// normal per-button state.
    fn force_display(&self, keys: &[Hsv], tt: &[Hsv]);

    /// Apply a host-supplied per-key lighting payload (one byte per
    /// lit button). The caller has already validated the length.
    fn set_host_lights(&self, payload: &[u8]);
}

/// Button matrix, read as a bitmask (see [`crate::chord`] for layout).
pub trait Buttons {
    fn read(&mut self) -> u16;
}

/// USB HID transport.
pub trait HidTransport {
    /// Service pending transport work (the TinyUSB task equivalent).
    fn poll(&mut self);

    /// Whether a report can be sent right now. Not-ready is normal:
    /// the loop just skips transmission for that iteration.
    fn ready(&self) -> bool;

    /// Send a report keyed by report id.
    fn send(&mut self, report_id: u8, data: &[u8]);

    /// Fetch a host-to-device lighting payload received since the last
    /// poll, copied into `buf`. Returns the payload length.
    fn take_light_payload(&mut self, buf: &mut [u8]) -> Option<usize>;
}

/// Interactive setup/menu collaborator.
pub trait SetupUi {
    /// Run one menu step. Mutations to `config` are reported through
    /// `saves` as dirty notifications. Returns true while the menu
    /// owns the display.
    fn step(
        &mut self,
        config: &mut ControllerConfig,
        saves: &mut crate::save::SaveScheduler,
        buttons: u16,
        angle: u8,
    ) -> bool;

    /// Override colors for the key LEDs while the menu owns the display.
    fn key_leds(&self) -> &[Hsv];

    /// Override colors for the turntable ring while the menu owns the display.
    fn tt_leds(&self) -> &[Hsv];

    /// Activate the hidden behavior mode. Called once at the end of
    /// boot when the stored flag (or a boot chord this boot) left it
    /// enabled.
    fn enter_hidden_mode(&mut self);
}

/// Storage write failure, surfaced to the caller and logged there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// Backend rejected the write; carries the backend error code.
    Io(i32),
}

/// Non-volatile storage for the configuration record.
///
/// Writes are blocking and only ever issued while the RT core is
/// parked by the pause handshake.
pub trait Storage {
    /// Read the record at startup; compiled-in defaults if absent or
    /// corrupt.
    fn load(&mut self) -> ControllerConfig;

    /// Persist the full record. Not retried by the persistence
    /// protocol; the in-memory record stays authoritative either way.
    fn write(&mut self, config: &ControllerConfig) -> Result<(), StorageError>;
}

/// Restart/bootloader collaborator.
///
/// On hardware, `enter_update_mode` and `restart` do not return; the
/// signatures stay `()` so host tests can observe the calls.
pub trait System {
    /// Reboot into the flash-update bootloader.
    fn enter_update_mode(&mut self);

    /// Unconditional device restart.
    fn restart(&mut self);

    /// Whether the current boot was caused by the watchdog.
    fn watchdog_caused_reboot(&self) -> bool;
}

/// Time source and delay provider for one execution context.
pub trait Timing {
    fn delay_ms(&mut self, ms: u32);

    /// Microsecond timestamp for log entries.
    fn now_us(&mut self) -> i64;
}
