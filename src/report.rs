//! Shared HID input report.
//!
//! The one in-memory structure both cores write: the real-time loop
//! publishes the turntable angle bytes, the host loop publishes the
//! button mask and effect parameters, then snapshots the whole thing
//! into a wire report each iteration.
//!
//! All fields are independent relaxed atomics. A reader may see values
//! up to one loop iteration stale; at millisecond cadence that skew is
//! imperceptible and needs no stronger ordering.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::config::Effects;

/// HID report id for the periodic joystick report.
pub const REPORT_ID_JOYSTICK: u8 = 1;

/// HID report id for the host-to-device lighting report.
pub const REPORT_ID_LIGHTS: u8 = 2;

/// Reduce a raw sensor angle to the published byte.
///
/// The sensor delivers more resolution than the report carries; the
/// report keeps the top bits (`raw >> 4`, truncated to a byte).
#[inline]
pub const fn reduce_angle(raw: u16) -> u8 {
    (raw >> 4) as u8
}

/// Cross-core input report slot.
///
/// Joy byte layout:
///
/// ```text
/// [0] reduced turntable angle      (RT loop)
/// [1] complement, 255 - angle      (RT loop)
/// [2] effects: play volume         (host loop)
/// [3] effects: filter              (host loop)
/// [4] effects: EQ low              (host loop)
/// [5] effects: EQ high             (host loop)
/// ```
pub struct SharedReport {
    buttons: AtomicU16,
    joy: [AtomicU8; 6],
}

impl SharedReport {
    pub const fn new() -> Self {
        const ZERO: AtomicU8 = AtomicU8::new(0);
        Self {
            buttons: AtomicU16::new(0),
            joy: [ZERO; 6],
        }
    }

    /// Publish the button bitmask (host loop).
    #[inline]
    pub fn set_buttons(&self, buttons: u16) {
        self.buttons.store(buttons, Ordering::Relaxed);
    }

    /// Publish the reduced angle and its complement (RT loop).
    #[inline]
    pub fn set_angle(&self, angle: u8) {
        self.joy[0].store(angle, Ordering::Relaxed);
        self.joy[1].store(255 - angle, Ordering::Relaxed);
    }

    /// Last published reduced angle.
    ///
    /// The host loop reads this instead of touching the sensor driver,
    /// which is owned by the RT core.
    #[inline]
    pub fn angle(&self) -> u8 {
        self.joy[0].load(Ordering::Relaxed)
    }

    /// Publish the four effect parameter bytes (host loop).
    #[inline]
    pub fn set_effects(&self, effects: &Effects) {
        self.joy[2].store(effects.play_vol, Ordering::Relaxed);
        self.joy[3].store(effects.filter, Ordering::Relaxed);
        self.joy[4].store(effects.eq_low, Ordering::Relaxed);
        self.joy[5].store(effects.eq_hi, Ordering::Relaxed);
    }

    /// Snapshot the current report for transmission.
    pub fn snapshot(&self) -> JoystickReport {
        let mut joy = [0u8; 6];
        for (dst, src) in joy.iter_mut().zip(self.joy.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        JoystickReport {
            buttons: self.buttons.load(Ordering::Relaxed),
            joy,
        }
    }
}

impl Default for SharedReport {
    fn default() -> Self {
        Self::new()
    }
}

/// One composed joystick report, rebuilt every host-loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoystickReport {
    pub buttons: u16,
    pub joy: [u8; 6],
}

impl JoystickReport {
    /// Wire encoding: little-endian button mask, then the six joy bytes.
    pub fn to_bytes(&self) -> [u8; 8] {
        let b = self.buttons.to_le_bytes();
        [
            b[0], b[1], self.joy[0], self.joy[1], self.joy[2], self.joy[3], self.joy[4],
            self.joy[5],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_angle() {
        assert_eq!(reduce_angle(0), 0);
        assert_eq!(reduce_angle(16), 1);
        assert_eq!(reduce_angle(1023), 63);
    }

    #[test]
    fn test_angle_complement() {
        let report = SharedReport::new();
        report.set_angle(0);
        let snap = report.snapshot();
        assert_eq!(snap.joy[0], 0);
        assert_eq!(snap.joy[1], 255);

        report.set_angle(200);
        let snap = report.snapshot();
        assert_eq!(snap.joy[0], 200);
        assert_eq!(snap.joy[1], 55);
    }

    #[test]
    fn test_wire_encoding() {
        let report = SharedReport::new();
        report.set_buttons(0x1855);
        report.set_angle(0x40);
        let bytes = report.snapshot().to_bytes();
        assert_eq!(bytes[0], 0x55);
        assert_eq!(bytes[1], 0x18);
        assert_eq!(bytes[2], 0x40);
        assert_eq!(bytes[3], 255 - 0x40);
    }
}
