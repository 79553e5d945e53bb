//! # rust-iidx-controller
//!
//! Runtime core of a dual-core rhythm game controller: a turntable
//! sensor, 13 buttons, addressable RGB lighting, a USB HID joystick
//! report, and a configuration record persisted to flash.
//!
//! ## Architecture
//!
//! Two perpetual loops, one per core:
//! - [`rt::RtLoop`] samples the sensor and drives the lighting at a
//!   fixed ~1 ms cadence; it never blocks on flash or USB.
//! - [`host::HostLoop`] services the transport, decodes buttons and
//!   chords, runs the setup menu and the persistence protocol.
//!
//! They share exactly two things: the atomic [`report::SharedReport`]
//! bytes and the [`pause::PauseHandshake`] that parks the RT core for
//! the duration of a flash write. No queues, no mutexes.
//!
//! Hardware drivers live behind the traits in [`hal`]; everything in
//! this crate builds and tests on the host.

#![cfg_attr(not(test), no_std)]

pub mod chord;
pub mod config;
pub mod hal;
pub mod host;
pub mod logging;
pub mod pause;
pub mod report;
pub mod rt;
pub mod save;

pub use chord::{BootAction, RuntimeAction, FACTORY_CHORD, UPDATE_CHORD};
pub use config::ControllerConfig;
pub use host::{HostEvent, HostLoop};
pub use logging::{LogLevel, LogStream};
pub use pause::PauseHandshake;
pub use report::{JoystickReport, SharedReport};
pub use rt::RtLoop;
pub use save::{SaveOutcome, SaveScheduler, SaveState};
