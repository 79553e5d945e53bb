//! Host-facing loop, pinned to the first core.
//!
//! Services the USB transport, decodes buttons, evaluates the
//! irreversible chords, runs the setup menu and the persistence
//! protocol, and composes the outgoing joystick report. No fixed
//! period; each iteration costs whatever transport servicing costs.
//!
//! The loop owns the configuration record outright; the RT core never
//! touches it. The only cross-core traffic is the shared report bytes
//! and the pause handshake.

use crate::chord::{self, RuntimeAction, LIT_BUTTON_COUNT};
use crate::config::ControllerConfig;
use crate::hal::{Buttons, HidTransport, Lighting, SetupUi, Storage, System, Timing};
use crate::logging::LogStream;
use crate::pause::PauseHandshake;
use crate::report::{SharedReport, REPORT_ID_JOYSTICK};
use crate::save::{self, SaveOutcome, SaveScheduler};
use crate::{fw_debug, fw_error, fw_info};

/// Largest accepted host-to-device lighting payload.
pub const MAX_LIGHT_PAYLOAD: usize = 64;

/// What one host-loop iteration decided.
///
/// On hardware the two exit variants are unreachable return values;
/// the system collaborator never returns from them. Host tests observe
/// them instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Continue,
    EnteredUpdateMode,
    FactoryReset,
}

pub struct HostLoop<'a, L, B, H, U, S, Y, T>
where
    L: Lighting + ?Sized,
    B: Buttons,
    H: HidTransport,
    U: SetupUi,
    S: Storage,
    Y: System,
    T: Timing,
{
    report: &'a SharedReport,
    pause: &'a PauseHandshake,
    lighting: &'a L,
    log: &'a LogStream,
    config: ControllerConfig,
    saves: SaveScheduler,
    buttons: B,
    hid: H,
    setup: U,
    storage: S,
    system: Y,
    timing: T,
}

impl<'a, L, B, H, U, S, Y, T> HostLoop<'a, L, B, H, U, S, Y, T>
where
    L: Lighting + ?Sized,
    B: Buttons,
    H: HidTransport,
    U: SetupUi,
    S: Storage,
    Y: System,
    T: Timing,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        report: &'a SharedReport,
        pause: &'a PauseHandshake,
        lighting: &'a L,
        log: &'a LogStream,
        buttons: B,
        hid: H,
        setup: U,
        storage: S,
        system: Y,
        timing: T,
    ) -> Self {
        Self {
            report,
            pause,
            lighting,
            log,
            config: ControllerConfig::DEFAULT,
            saves: SaveScheduler::new(),
            buttons,
            hid,
            setup,
            storage,
            system,
            timing,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn saves(&self) -> &SaveScheduler {
        &self.saves
    }

    /// Boot-time sequence, before either loop starts.
    ///
    /// Order matters: the update-mode check runs first so a bricked
    /// config can never block reflashing; only then is the record
    /// loaded, the hidden-mode chord applied, and the hidden behavior
    /// activated if the resulting flag is set.
    pub fn boot(&mut self) -> HostEvent {
        let buttons = self.buttons.read();

        if chord::boot_action(buttons, self.system.watchdog_caused_reboot()).is_some() {
            fw_info!(
                self.log,
                self.timing.now_us(),
                "update chord held at boot, entering update mode"
            );
            self.system.enter_update_mode();
            return HostEvent::EnteredUpdateMode;
        }

        self.config = self.storage.load();

        if let Some(enable) = chord::hidden_mode_action(buttons) {
            self.config.hidden_mode = enable;
            // Enabling is saved as soon as possible; disabling rides
            // the normal debounce window.
            self.saves.request(enable);
            fw_info!(
                self.log,
                self.timing.now_us(),
                "hidden mode {} via boot chord",
                if enable { "enabled" } else { "disabled" }
            );
        }

        // Whether stored from a previous session or toggled just now,
        // the flag only has an effect once the collaborator acts on it.
        if self.config.hidden_mode {
            self.setup.enter_hidden_mode();
            fw_info!(self.log, self.timing.now_us(), "hidden mode active");
        }

        HostEvent::Continue
    }

    /// One host-loop iteration.
    pub fn cycle(&mut self) -> HostEvent {
        self.hid.poll();

        // Host-to-device lighting: one byte per lit button, anything
        // shorter is silently dropped.
        let mut payload = [0u8; MAX_LIGHT_PAYLOAD];
        if let Some(len) = self.hid.take_light_payload(&mut payload) {
            if len >= LIT_BUTTON_COUNT {
                self.lighting.set_host_lights(&payload[..LIT_BUTTON_COUNT]);
            }
        }

        let buttons = self.buttons.read();

        match chord::runtime_action(buttons) {
            Some(RuntimeAction::EnterUpdateMode) => {
                fw_info!(self.log, self.timing.now_us(), "update chord, rebooting to bootloader");
                self.system.enter_update_mode();
                return HostEvent::EnteredUpdateMode;
            }
            Some(RuntimeAction::FactoryReset) => {
                self.config.factory_reset();
                if let Err(e) =
                    save::write_now(&self.config, &mut self.storage, self.pause, &mut self.timing)
                {
                    fw_error!(
                        self.log,
                        self.timing.now_us(),
                        "factory reset write failed: {:?}",
                        e
                    );
                }
                self.system.restart();
                return HostEvent::FactoryReset;
            }
            None => {}
        }

        let angle = self.report.angle();

        if self.setup.step(&mut self.config, &mut self.saves, buttons, angle) {
            // Menu owns the display: no report composition, no
            // persistence stepping, lighting is overridden outright.
            self.lighting
                .force_display(self.setup.key_leds(), self.setup.tt_leds());
        } else {
            self.report.set_buttons(buttons);
            self.lighting.set_button_lights(buttons);

            match self
                .saves
                .step(&self.config, &mut self.storage, self.pause, &mut self.timing)
            {
                SaveOutcome::Saved => {
                    fw_debug!(self.log, self.timing.now_us(), "config persisted");
                }
                SaveOutcome::WriteFailed(e) => {
                    fw_error!(self.log, self.timing.now_us(), "config write failed: {:?}", e);
                }
                SaveOutcome::Idle | SaveOutcome::Counting => {}
            }
        }

        self.report.set_effects(&self.config.effects);

        // Not-ready is not an error; just skip this iteration's send.
        if self.hid.ready() {
            let snapshot = self.report.snapshot();
            self.hid.send(REPORT_ID_JOYSTICK, &snapshot.to_bytes());
        }

        HostEvent::Continue
    }

    /// The unbounded loop. On hardware the exit variants never come
    /// back from the system collaborator.
    pub fn run(&mut self) -> ! {
        loop {
            self.cycle();
        }
    }
}
