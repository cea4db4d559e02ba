//! Unit tests for measurement frame decoding and rolling counters.

use pedalsim::sensors::frame::{
    decode_csc, decode_cycling_power, ACCUMULATED_ENERGY, CUMULATIVE_CRANK_REVOLUTIONS,
    CUMULATIVE_WHEEL_REVOLUTIONS, CYCLING_POWER_MEASUREMENT, INSTANTANEOUS_POWER,
    LAST_CRANK_EVENT_TIME, LAST_WHEEL_EVENT_TIME, PEDAL_POWER_BALANCE,
};
use pedalsim::sensors::{wheel_speed_mps, RollingCounter, SensorError};

#[test]
fn test_power_only_frame() {
    // Flags 0x0000, power 200 W
    let frame = decode_cycling_power(&[0x00, 0x00, 0xC8, 0x00]).unwrap();
    assert_eq!(frame.get(INSTANTANEOUS_POWER), Some(200));
    assert_eq!(frame.len(), 1);
}

#[test]
fn test_crank_frame() {
    // Flags 0x0020: power 150 W, 10 revolutions, event time 2048
    let frame =
        decode_cycling_power(&[0x20, 0x00, 0x96, 0x00, 0x0A, 0x00, 0x00, 0x08]).unwrap();
    assert_eq!(frame.get(INSTANTANEOUS_POWER), Some(150));
    assert_eq!(frame.get(CUMULATIVE_CRANK_REVOLUTIONS), Some(10));
    assert_eq!(frame.get(LAST_CRANK_EVENT_TIME), Some(2048));
    assert!(!frame.contains(CUMULATIVE_WHEEL_REVOLUTIONS));
}

#[test]
fn test_combined_mask_keeps_schema_order() {
    // Flags 0x0831: balance, wheel data, crank data, accumulated energy
    let bytes = [
        0x31, 0x08, // flags
        0xFA, 0x00, // power 250
        0x64, // balance 100
        0x10, 0x27, 0x00, 0x00, // wheel revolutions 10000
        0x00, 0x04, // wheel event time 1024
        0x05, 0x00, // crank revolutions 5
        0x00, 0x02, // crank event time 512
        0x2C, 0x01, // energy 300
    ];
    let frame = decode_cycling_power(&bytes).unwrap();

    let names: Vec<&str> = frame.names().collect();
    assert_eq!(
        names,
        vec![
            INSTANTANEOUS_POWER,
            PEDAL_POWER_BALANCE,
            CUMULATIVE_WHEEL_REVOLUTIONS,
            LAST_WHEEL_EVENT_TIME,
            CUMULATIVE_CRANK_REVOLUTIONS,
            LAST_CRANK_EVENT_TIME,
            ACCUMULATED_ENERGY,
        ]
    );
    assert_eq!(frame.get(CUMULATIVE_WHEEL_REVOLUTIONS), Some(10000));
    assert_eq!(frame.get(ACCUMULATED_ENERGY), Some(300));
}

#[test]
fn test_layout_length_matches_mask() {
    assert_eq!(CYCLING_POWER_MEASUREMENT.layout_len(0x0000), 4);
    assert_eq!(CYCLING_POWER_MEASUREMENT.layout_len(0x0020), 8);
    assert_eq!(CYCLING_POWER_MEASUREMENT.layout_len(0x0831), 17);
}

#[test]
fn test_truncated_frame_is_rejected() {
    let err = decode_cycling_power(&[0x20, 0x00, 0x96, 0x00, 0x0A]).unwrap_err();
    assert_eq!(
        err,
        SensorError::MalformedFrame {
            schema: "cycling_power_measurement",
            expected: 8,
            actual: 5,
        }
    );
}

#[test]
fn test_empty_frame_is_rejected() {
    assert!(matches!(
        decode_csc(&[]),
        Err(SensorError::MalformedFrame { .. })
    ));
}

#[test]
fn test_csc_wheel_only_has_no_crank_fields() {
    let frame = decode_csc(&[0x01, 0x64, 0x00, 0x00, 0x00, 0x00, 0x04]).unwrap();
    assert_eq!(frame.get(CUMULATIVE_WHEEL_REVOLUTIONS), Some(100));
    assert_eq!(frame.get(LAST_WHEEL_EVENT_TIME), Some(1024));
    assert!(!frame.contains(CUMULATIVE_CRANK_REVOLUTIONS));
}

#[test]
fn test_counter_cadence() {
    let mut counter = RollingCounter::new();
    assert_eq!(counter.update(100, 1024), 0.0);
    // 2 revolutions in 1.5 s
    assert!((counter.update(102, 2560) - 80.0).abs() < 1e-9);
}

#[test]
fn test_counter_wraparound() {
    let mut counter = RollingCounter::with_previous(65534, 65000);
    // Both counters roll over 65536: 4 revolutions in 1560/1024 s
    let rpm = counter.update(2, 1024);
    let expected = 4.0 / (1560.0 / 1024.0) * 60.0;
    assert!((rpm - expected).abs() < 1e-9, "Cadence was {}", rpm);
}

#[test]
fn test_repeated_event_time_reads_zero() {
    let mut counter = RollingCounter::with_previous(10, 4000);
    assert_eq!(counter.update(10, 4000), 0.0);
}

#[test]
fn test_wheel_speed() {
    // 60 rpm on a 2.1 m wheel is 2.1 m/s
    assert!((wheel_speed_mps(60.0, 2.1) - 2.1).abs() < 1e-9);
}
