//! Controller configuration record.
//!
//! One fixed-layout aggregate, allocated at startup, owned by the host
//! loop and mutated in place. Persistence sees it as an opaque byte
//! blob: every byte field is independently valid across its full range,
//! so a blob of the right size always decodes (validity of combinations
//! is the setup menu's business, enforced before anything is marked
//! dirty).
//!
//! Layout is `#[repr(C)]` with byte-sized fields only (no padding), so
//! the record round-trips through flash via bytemuck without a
//! serializer.

pub mod nvs;

use bytemuck::checked;
use bytemuck::{CheckedBitPattern, NoUninit, Pod, Zeroable};

use crate::chord::LIT_BUTTON_COUNT;

/// Size of the persisted blob in bytes.
pub const CONFIG_SIZE: usize = core::mem::size_of::<ControllerConfig>();

/// One LED color as hue/saturation/value, one byte each.
///
/// All-`u8` and padding-free, so it is `Pod`: the color arrays in the
/// record decode through bytemuck's array impls, which want `Pod`
/// elements (and `Pod` already implies `NoUninit` + every bit pattern
/// being valid).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Turntable LED strip descriptor.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, NoUninit, CheckedBitPattern)]
pub struct TtLight {
    /// First LED of the ring within the strip.
    pub start: u8,
    /// Number of LEDs in the ring.
    pub num: u8,
    /// Effect id, interpreted by the lighting engine.
    pub effect: u8,
    /// Effect parameter, interpreted by the lighting engine.
    pub param: u8,
    pub brightness: u8,
    /// Render the ring in reverse LED order.
    pub reversed: bool,
}

/// Audio effect knob parameters, mirrored into the HID report.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, NoUninit, CheckedBitPattern)]
pub struct Effects {
    pub play_vol: u8,
    pub filter: u8,
    pub eq_low: u8,
    pub eq_hi: u8,
}

/// The persistent configuration record.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, NoUninit, CheckedBitPattern)]
pub struct ControllerConfig {
    /// Per-key color while the key is released.
    pub key_off: [Hsv; LIT_BUTTON_COUNT],
    /// Per-key color while the key is pressed.
    pub key_on: [Hsv; LIT_BUTTON_COUNT],
    pub tt_light: TtLight,
    /// Turntable rotation sense is inverted.
    pub tt_sensor_reversed: bool,
    pub effects: Effects,
    /// Hidden behavior mode, toggled by the boot chord. Survives reboot.
    pub hidden_mode: bool,
}

impl ControllerConfig {
    /// Compiled-in defaults: dim blue keys that light up white, full
    /// 24-LED ring at half brightness, centered effect knobs.
    pub const DEFAULT: Self = Self {
        key_off: [Hsv::new(170, 255, 8); LIT_BUTTON_COUNT],
        key_on: [Hsv::new(0, 0, 255); LIT_BUTTON_COUNT],
        tt_light: TtLight {
            start: 0,
            num: 24,
            effect: 0,
            param: 0,
            brightness: 128,
            reversed: false,
        },
        tt_sensor_reversed: false,
        effects: Effects {
            play_vol: 255,
            filter: 128,
            eq_low: 128,
            eq_hi: 128,
        },
        hidden_mode: false,
    };

    /// Restore every field to its compiled-in default.
    pub fn factory_reset(&mut self) {
        *self = Self::DEFAULT;
    }

    /// View the record as the persisted byte blob.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode a previously persisted blob.
    ///
    /// Returns `None` on wrong size or invalid bit patterns (the two
    /// `bool` fields are the only bytes with invalid encodings); the
    /// caller falls back to [`ControllerConfig::DEFAULT`].
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        checked::try_from_bytes::<Self>(bytes).ok().copied()
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
