//! Shared report properties: angle reduction, complement, wire layout.

use rust_iidx_controller::config::Effects;
use rust_iidx_controller::report::{reduce_angle, REPORT_ID_JOYSTICK, REPORT_ID_LIGHTS};
use rust_iidx_controller::SharedReport;

#[test]
fn test_reduction_and_complement_full_sensor_range() {
    let report = SharedReport::new();
    for raw in 0u16..=1023 {
        report.set_angle(reduce_angle(raw));
        let snap = report.snapshot();
        assert_eq!(snap.joy[0], (raw >> 4) as u8, "raw {}", raw);
        assert_eq!(snap.joy[1], 255 - (raw >> 4) as u8, "raw {}", raw);
    }
}

#[test]
fn test_zero_angle_boundary() {
    let report = SharedReport::new();
    report.set_angle(reduce_angle(0));
    let snap = report.snapshot();
    assert_eq!(snap.joy[0], 0);
    assert_eq!(snap.joy[1], 255);
}

#[test]
fn test_effects_bytes_published() {
    let report = SharedReport::new();
    report.set_effects(&Effects {
        play_vol: 10,
        filter: 20,
        eq_low: 30,
        eq_hi: 40,
    });
    let snap = report.snapshot();
    assert_eq!(&snap.joy[2..], &[10, 20, 30, 40]);
}

#[test]
fn test_wire_layout() {
    let report = SharedReport::new();
    report.set_buttons(0x0102);
    report.set_angle(7);
    report.set_effects(&Effects {
        play_vol: 1,
        filter: 2,
        eq_low: 3,
        eq_hi: 4,
    });

    let bytes = report.snapshot().to_bytes();
    assert_eq!(bytes, [0x02, 0x01, 7, 248, 1, 2, 3, 4]);
}

#[test]
fn test_report_ids_distinct() {
    assert_ne!(REPORT_ID_JOYSTICK, REPORT_ID_LIGHTS);
}
