//! Real-time loop, pinned to the second core.
//!
//! Runs at a fixed ~1 ms cadence: sample the turntable, feed the
//! lighting engine, publish the angle bytes, refresh the LEDs at half
//! rate (a full render is far more expensive than a sensor sample and
//! doesn't need per-cycle granularity). Nothing here may block on
//! storage or the USB transport; the only external wait is the pause
//! handshake park at the cycle boundary.

use crate::hal::{Lighting, Timing, Turntable};
use crate::pause::PauseHandshake;
use crate::report::SharedReport;

/// Minimum cycle period.
pub const RT_TICK_MS: u32 = 1;

/// Lighting refresh runs every Nth cycle.
pub const LIGHTING_REFRESH_DIVIDER: u32 = 2;

pub struct RtLoop<'a> {
    report: &'a SharedReport,
    pause: &'a PauseHandshake,
    frame: u32,
}

impl<'a> RtLoop<'a> {
    pub const fn new(report: &'a SharedReport, pause: &'a PauseHandshake) -> Self {
        Self {
            report,
            pause,
            frame: 0,
        }
    }

    /// Cycles completed since start.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// One real-time cycle.
    ///
    /// The pause check sits after all I/O for the cycle: once parked,
    /// no sensor or lighting access happens until the host core
    /// releases the handshake.
    pub fn cycle<S, L, T>(&mut self, turntable: &mut S, lighting: &L, timing: &mut T)
    where
        S: Turntable,
        L: Lighting + ?Sized,
        T: Timing,
    {
        let raw = turntable.raw_angle();
        lighting.set_angle(raw);

        self.report.set_angle(turntable.reduced_angle());

        if self.frame % LIGHTING_REFRESH_DIVIDER == 0 {
            lighting.refresh();
        }
        turntable.update();
        self.frame = self.frame.wrapping_add(1);

        timing.delay_ms(RT_TICK_MS);
        if self.pause.is_requested() {
            self.pause.park(timing);
        }
    }

    /// The unbounded loop. Only a device reset leaves it.
    pub fn run<S, L, T>(&mut self, turntable: &mut S, lighting: &L, timing: &mut T) -> !
    where
        S: Turntable,
        L: Lighting + ?Sized,
        T: Timing,
    {
        loop {
            self.cycle(turntable, lighting, timing);
        }
    }
}
