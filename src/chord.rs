//! Button bitmask layout and chord decoding.
//!
//! Chords are exact bitmask patterns that trigger irreversible actions
//! (firmware-update mode, factory reset, hidden-mode toggle). Runtime
//! chords require an *exact* match: a superset of a chord's bits never
//! triggers, so normal play input cannot fire one by partial overlap.
//!
//! Evaluated at two points:
//! - once at boot ([`boot_action`], [`hidden_mode_action`])
//! - every host-loop iteration ([`runtime_action`])

/// Total buttons in the bitmask: 7 main keys (bits 0..=6), the four
/// effect knob buttons (bits 7..=10) and the YES/NO pair on top.
pub const BUTTON_COUNT: u32 = 13;

/// Buttons that carry an RGB LED (YES/NO are not lit).
pub const LIT_BUTTON_COUNT: usize = 11;

/// Highest-numbered button ("YES", conventionally confirm).
pub const KEY_YES: u16 = 1 << (BUTTON_COUNT - 1);

/// Second-highest button ("NO", conventionally cancel).
pub const KEY_NO: u16 = 1 << (BUTTON_COUNT - 2);

/// Firmware-update chord: YES + NO + keys 1/3/5/7 (0x1855).
pub const UPDATE_CHORD: u16 = KEY_YES | KEY_NO | 1 << 0 | 1 << 2 | 1 << 4 | 1 << 6;

/// Factory-reset chord: YES + NO + keys 2/4/6 (0x182a).
pub const FACTORY_CHORD: u16 = KEY_YES | KEY_NO | 1 << 1 | 1 << 3 | 1 << 5;

/// Irreversible action requested at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootAction {
    /// Reboot into the flash-update bootloader; normal operation never starts.
    EnterUpdateMode,
}

/// Irreversible action requested while running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeAction {
    /// Reboot into the flash-update bootloader.
    EnterUpdateMode,
    /// Restore compiled-in defaults, persist them, restart. One-way.
    FactoryReset,
}

/// Boot-time update-mode check.
///
/// Holding both YES and NO at power-on enters update mode, *unless* the
/// boot was caused by the watchdog. A crash-induced reboot while the pair
/// happens to be physically held must not strand the device in the
/// bootloader.
///
/// Unlike the runtime chords this is a "both bits held" test, not an
/// exact match: at power-on there is no play input to collide with.
pub fn boot_action(buttons: u16, watchdog_caused_reboot: bool) -> Option<BootAction> {
    let pair = KEY_YES | KEY_NO;
    if !watchdog_caused_reboot && (buttons & pair) == pair {
        Some(BootAction::EnterUpdateMode)
    } else {
        None
    }
}

/// Boot-time hidden-mode toggle.
///
/// Exactly YES held → `Some(true)` (enable hidden mode), exactly NO held
/// → `Some(false)` (disable). Anything else leaves the stored setting
/// untouched. The caller queues a save so the toggle survives reboot.
pub fn hidden_mode_action(buttons: u16) -> Option<bool> {
    if buttons == KEY_YES {
        Some(true)
    } else if buttons == KEY_NO {
        Some(false)
    } else {
        None
    }
}

/// Runtime chord check, run once per host-loop iteration.
///
/// Exact equality only. `None` for every other bitmask, including
/// supersets of a chord.
#[inline]
pub fn runtime_action(buttons: u16) -> Option<RuntimeAction> {
    match buttons {
        UPDATE_CHORD => Some(RuntimeAction::EnterUpdateMode),
        FACTORY_CHORD => Some(RuntimeAction::FactoryReset),
        _ => None,
    }
}
