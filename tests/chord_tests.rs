//! Chord decoder properties: exact matching, boot guards, hidden mode.

use rust_iidx_controller::chord::{
    boot_action, hidden_mode_action, runtime_action, BootAction, RuntimeAction, BUTTON_COUNT,
    FACTORY_CHORD, KEY_NO, KEY_YES, UPDATE_CHORD,
};

#[test]
fn test_runtime_chords_decode() {
    assert_eq!(
        runtime_action(UPDATE_CHORD),
        Some(RuntimeAction::EnterUpdateMode)
    );
    assert_eq!(
        runtime_action(FACTORY_CHORD),
        Some(RuntimeAction::FactoryReset)
    );
}

#[test]
fn test_no_other_bitmask_triggers() {
    // Exhaustive sweep of every possible button combination: only the
    // two exact chord values may decode to an action.
    for mask in 0..(1u32 << BUTTON_COUNT) {
        let mask = mask as u16;
        let expected = match mask {
            UPDATE_CHORD => Some(RuntimeAction::EnterUpdateMode),
            FACTORY_CHORD => Some(RuntimeAction::FactoryReset),
            _ => None,
        };
        assert_eq!(runtime_action(mask), expected, "mask {:#06x}", mask);
    }
}

#[test]
fn test_superset_of_chord_does_not_trigger() {
    // Holding a chord plus one more key must do nothing.
    for extra in 0..BUTTON_COUNT {
        let bit = 1u16 << extra;
        if UPDATE_CHORD & bit == 0 {
            assert_eq!(runtime_action(UPDATE_CHORD | bit), None);
        }
        if FACTORY_CHORD & bit == 0 {
            assert_eq!(runtime_action(FACTORY_CHORD | bit), None);
        }
    }
}

#[test]
fn test_boot_update_pair() {
    let pair = KEY_YES | KEY_NO;
    assert_eq!(boot_action(pair, false), Some(BootAction::EnterUpdateMode));

    // Extra keys held alongside the pair still count at boot
    assert_eq!(
        boot_action(pair | 1 << 4, false),
        Some(BootAction::EnterUpdateMode)
    );

    // Either key alone does not
    assert_eq!(boot_action(KEY_YES, false), None);
    assert_eq!(boot_action(KEY_NO, false), None);
    assert_eq!(boot_action(0, false), None);
}

#[test]
fn test_watchdog_reboot_suppresses_update_mode() {
    // A crash-induced reboot with the pair physically held must boot
    // normally instead of stranding the device in the bootloader.
    let pair = KEY_YES | KEY_NO;
    assert_eq!(boot_action(pair, true), None);
    assert_eq!(boot_action(pair | 1 << 2, true), None);
}

#[test]
fn test_hidden_mode_boot_chord() {
    assert_eq!(hidden_mode_action(KEY_YES), Some(true));
    assert_eq!(hidden_mode_action(KEY_NO), Some(false));

    // Single-button only: combinations leave the setting untouched
    assert_eq!(hidden_mode_action(KEY_YES | KEY_NO), None);
    assert_eq!(hidden_mode_action(KEY_YES | 1 << 6), None);
    assert_eq!(hidden_mode_action(1 << 0), None);
}
