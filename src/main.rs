//! Controller firmware entry point.
//!
//! Wires the two loops to the hardware: the real-time loop gets pinned
//! to core 1 as a FreeRTOS task, the host-facing loop runs on core 0
//! in the main task and doubles as the log drain.
//!
//! Driver bindings below are placeholders: sensor decoding, the LED
//! renderer and the TinyUSB glue are separate bring-up work and not
//! part of the coordination core.

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::sys as esp_idf_sys;

    use rust_iidx_controller::chord::LIT_BUTTON_COUNT;
    use rust_iidx_controller::config::nvs::NvsStorage;
    use rust_iidx_controller::config::{ControllerConfig, Hsv};
    use rust_iidx_controller::hal::{
        Buttons, HidTransport, Lighting, SetupUi, System, Timing,
    };
    use rust_iidx_controller::logging::format_entry;
    use rust_iidx_controller::{
        fw_info, HostEvent, HostLoop, LogStream, PauseHandshake, RtLoop, SaveScheduler,
        SharedReport,
    };

    // The only cross-core state: report bytes, pause handshake, log ring.
    static REPORT: SharedReport = SharedReport::new();
    static PAUSE: PauseHandshake = PauseHandshake::new();
    static LOG: LogStream = LogStream::new();
    static LIGHTING: StubLighting = StubLighting;

    /// FreeRTOS-backed delays and the microsecond timer.
    struct EspTiming;

    impl Timing for EspTiming {
        fn delay_ms(&mut self, ms: u32) {
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
        }

        fn now_us(&mut self) -> i64 {
            // SAFETY: esp_timer_get_time is always safe to call
            unsafe { esp_idf_sys::esp_timer_get_time() }
        }
    }

    struct EspSystem;

    impl System for EspSystem {
        fn enter_update_mode(&mut self) {
            // TODO: strap the USB-serial-JTAG ROM download mode before
            // resetting, so the host sees a flashable device
            unsafe { esp_idf_sys::esp_restart() }
        }

        fn restart(&mut self) {
            unsafe { esp_idf_sys::esp_restart() }
        }

        fn watchdog_caused_reboot(&self) -> bool {
            let reason = unsafe { esp_idf_sys::esp_reset_reason() };
            matches!(
                reason,
                esp_idf_sys::esp_reset_reason_t_ESP_RST_WDT
                    | esp_idf_sys::esp_reset_reason_t_ESP_RST_TASK_WDT
                    | esp_idf_sys::esp_reset_reason_t_ESP_RST_INT_WDT
            )
        }
    }

    // --- Placeholder drivers (to be replaced with real bring-up) ---

    /// TODO: magnetic angle sensor driver (AS5600 over I2C)
    #[derive(Default)]
    struct StubTurntable;

    impl rust_iidx_controller::hal::Turntable for StubTurntable {
        fn raw_angle(&mut self) -> u16 {
            0
        }
        fn update(&mut self) {}
    }

    /// TODO: WS2812 renderer on RMT
    struct StubLighting;

    impl Lighting for StubLighting {
        fn set_angle(&self, _raw_angle: u16) {}
        fn refresh(&self) {}
        fn set_button_lights(&self, _buttons: u16) {}
        fn force_display(&self, _keys: &[Hsv], _tt: &[Hsv]) {}
        fn set_host_lights(&self, _payload: &[u8]) {}
    }

    /// TODO: GPIO button matrix scan
    #[derive(Default)]
    struct StubButtons;

    impl Buttons for StubButtons {
        fn read(&mut self) -> u16 {
            0
        }
    }

    /// TODO: TinyUSB HID interface glue
    #[derive(Default)]
    struct StubHid;

    impl HidTransport for StubHid {
        fn poll(&mut self) {}
        fn ready(&self) -> bool {
            false
        }
        fn send(&mut self, _report_id: u8, _data: &[u8]) {}
        fn take_light_payload(&mut self, _buf: &mut [u8]) -> Option<usize> {
            None
        }
    }

    /// TODO: interactive setup menu
    struct StubSetup {
        key_leds: [Hsv; LIT_BUTTON_COUNT],
        tt_leds: [Hsv; 24],
    }

    impl Default for StubSetup {
        fn default() -> Self {
            Self {
                key_leds: [Hsv::new(0, 0, 0); LIT_BUTTON_COUNT],
                tt_leds: [Hsv::new(0, 0, 0); 24],
            }
        }
    }

    impl SetupUi for StubSetup {
        fn step(
            &mut self,
            _config: &mut ControllerConfig,
            _saves: &mut SaveScheduler,
            _buttons: u16,
            _angle: u8,
        ) -> bool {
            false
        }
        fn key_leds(&self) -> &[Hsv] {
            &self.key_leds
        }
        fn tt_leds(&self) -> &[Hsv] {
            &self.tt_leds
        }
        fn enter_hidden_mode(&mut self) {
            // TODO: remap the effect buttons for the hidden layout
        }
    }

    /// RT loop task, pinned to core 1. Never returns.
    extern "C" fn rt_task(_arg: *mut core::ffi::c_void) {
        let mut turntable = StubTurntable;
        let mut timing = EspTiming;
        let mut rt = RtLoop::new(&REPORT, &PAUSE);
        rt.run(&mut turntable, &LIGHTING, &mut timing);
    }

    fn drain_logs() {
        while let Some(entry) = LOG.drain() {
            let mut line = String::new();
            if format_entry(&entry, &mut line).is_ok() {
                println!("{line}");
            }
        }
    }

    pub fn main() {
        esp_idf_sys::link_patches();

        let storage = NvsStorage::take().expect("NVS partition unavailable");

        let mut host = HostLoop::new(
            &REPORT,
            &PAUSE,
            &LIGHTING,
            &LOG,
            StubButtons,
            StubHid,
            StubSetup::default(),
            storage,
            EspSystem,
            EspTiming,
        );

        // Boot chords run before any loop starts; on hardware the
        // update-mode branch does not come back.
        if host.boot() == HostEvent::EnteredUpdateMode {
            return;
        }

        // TODO: Bluetooth bring-up for the wireless report path
        println!("{}", env!("VERSION_STRING"));
        fw_info!(&LOG, EspTiming.now_us(), "boot chords done, starting loops");

        // SAFETY: plain FFI task spawn; rt_task only touches statics.
        unsafe {
            esp_idf_sys::xTaskCreatePinnedToCore(
                Some(rt_task),
                b"rt_loop\0".as_ptr() as *const _,
                4096,
                core::ptr::null_mut(),
                10,
                core::ptr::null_mut(),
                1,
            );
        }

        loop {
            host.cycle();
            drain_logs();
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() {
    firmware::main();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("this firmware targets ESP-IDF; build for the esp32s3 target");
}
