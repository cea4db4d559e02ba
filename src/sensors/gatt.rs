//! GATT endpoints of the supported meters and the heart-rate measurement parser.
//!
//! Power and CSC measurements are schema-driven (see [`crate::sensors::frame`]);
//! heart rate switches the width of its first field on a flag, so it gets
//! its own parser.

use crate::sensors::frame::FieldKind;
use crate::sensors::types::SensorError;
use uuid::Uuid;

/// Full UUID of a 16-bit Bluetooth SIG assigned number.
const fn assigned(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_0080_5f9b_34fb)
}

/// A measurement characteristic and the service exposing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattEndpoint {
    pub service: Uuid,
    pub characteristic: Uuid,
}

/// Cycling Power Service (0x1818), Cycling Power Measurement (0x2A63)
pub const CYCLING_POWER: GattEndpoint = GattEndpoint {
    service: assigned(0x1818),
    characteristic: assigned(0x2A63),
};

/// Cycling Speed and Cadence Service (0x1816), CSC Measurement (0x2A5B)
pub const CYCLING_SPEED_CADENCE: GattEndpoint = GattEndpoint {
    service: assigned(0x1816),
    characteristic: assigned(0x2A5B),
};

/// Heart Rate Service (0x180D), Heart Rate Measurement (0x2A37)
pub const HEART_RATE: GattEndpoint = GattEndpoint {
    service: assigned(0x180D),
    characteristic: assigned(0x2A37),
};

const BPM_U16: u8 = 0x01;
const CONTACT_DETECTED: u8 = 0x02;
const CONTACT_SUPPORTED: u8 = 0x04;
const ENERGY_EXPENDED: u8 = 0x08;
const RR_INTERVALS: u8 = 0x10;

/// Parsed Heart Rate Measurement notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartRateData {
    pub heart_rate_bpm: u16,
    /// RR intervals in 1/1024 s
    pub rr_intervals: Vec<u16>,
    /// Energy expended in kJ
    pub energy_expended: Option<u16>,
    pub sensor_contact: bool,
}

/// Parse a Heart Rate Measurement notification.
///
/// Only the flags byte and the heart rate are required. A truncated energy
/// field is ignored and an odd trailing RR byte is dropped.
pub fn parse_heart_rate_measurement(data: &[u8]) -> Result<HeartRateData, SensorError> {
    let flags = data.first().copied().unwrap_or(0);
    let bpm_kind = if flags & BPM_U16 != 0 {
        FieldKind::U16
    } else {
        FieldKind::U8
    };

    let required = 1 + bpm_kind.width();
    if data.len() < required {
        return Err(SensorError::MalformedFrame {
            schema: "heart_rate_measurement",
            expected: required,
            actual: data.len(),
        });
    }

    let heart_rate_bpm = bpm_kind.read(&data[1..]) as u16;
    let mut rest = &data[required..];

    let energy_expended = if flags & ENERGY_EXPENDED != 0 && rest.len() >= 2 {
        let energy = FieldKind::U16.read(rest) as u16;
        rest = &rest[2..];
        Some(energy)
    } else {
        None
    };

    let rr_intervals = if flags & RR_INTERVALS != 0 {
        rest.chunks_exact(2)
            .map(|pair| FieldKind::U16.read(pair) as u16)
            .collect()
    } else {
        Vec::new()
    };

    Ok(HeartRateData {
        heart_rate_bpm,
        rr_intervals,
        energy_expended,
        sensor_contact: flags & CONTACT_SUPPORTED != 0 && flags & CONTACT_DETECTED != 0,
    })
}
