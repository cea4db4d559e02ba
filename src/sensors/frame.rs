//! Flag-driven layout decoding for GATT measurement characteristics.
//!
//! A schema is an ordered list of `(flag, fields)` entries. Flag 0 entries
//! are always present; any other entry is present when its bit is set in the
//! frame's leading mask. Fields are laid out back to back in declaration
//! order, so the schema order fixes every byte offset.

use crate::sensors::types::SensorError;

/// Wire encoding of one field. Multi-byte kinds are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U24,
    U32,
}

impl FieldKind {
    /// Width in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U24 => 3,
            FieldKind::U32 => 4,
        }
    }

    /// Read a value from the start of `bytes`; the caller guarantees the width.
    pub(crate) fn read(self, bytes: &[u8]) -> i64 {
        match self {
            FieldKind::U8 => bytes[0] as i64,
            FieldKind::I8 => bytes[0] as i8 as i64,
            FieldKind::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            FieldKind::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            FieldKind::U24 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) as i64,
            FieldKind::U32 => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
            }
        }
    }
}

/// A named field in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Fields present when `flag` is set (always present for flag 0).
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub flag: u16,
    pub fields: &'static [FieldSpec],
}

/// Width of the flags mask at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskWidth {
    Bits8,
    Bits16,
}

impl MaskWidth {
    pub const fn bytes(self) -> usize {
        match self {
            MaskWidth::Bits8 => 1,
            MaskWidth::Bits16 => 2,
        }
    }
}

/// Layout description for one characteristic.
#[derive(Debug, Clone, Copy)]
pub struct FrameSchema {
    pub name: &'static str,
    pub mask_width: MaskWidth,
    pub entries: &'static [SchemaEntry],
}

pub const INSTANTANEOUS_POWER: &str = "instantaneous_power";
pub const PEDAL_POWER_BALANCE: &str = "pedal_power_balance";
pub const ACCUMULATED_TORQUE: &str = "accumulated_torque";
pub const CUMULATIVE_WHEEL_REVOLUTIONS: &str = "cumulative_wheel_revolutions";
pub const LAST_WHEEL_EVENT_TIME: &str = "last_wheel_event_time";
pub const CUMULATIVE_CRANK_REVOLUTIONS: &str = "cumulative_crank_revolutions";
pub const LAST_CRANK_EVENT_TIME: &str = "last_crank_event_time";
pub const MAXIMUM_FORCE_MAGNITUDE: &str = "maximum_force_magnitude";
pub const MINIMUM_FORCE_MAGNITUDE: &str = "minimum_force_magnitude";
pub const MAXIMUM_TORQUE_MAGNITUDE: &str = "maximum_torque_magnitude";
pub const MINIMUM_TORQUE_MAGNITUDE: &str = "minimum_torque_magnitude";
pub const MAXIMUM_MINIMUM_ANGLE: &str = "maximum_minimum_angle";
pub const TOP_DEAD_SPOT_ANGLE: &str = "top_dead_spot_angle";
pub const BOTTOM_DEAD_SPOT_ANGLE: &str = "bottom_dead_spot_angle";
pub const ACCUMULATED_ENERGY: &str = "accumulated_energy";

const WHEEL_REVOLUTION_DATA: &[FieldSpec] = &[
    field(CUMULATIVE_WHEEL_REVOLUTIONS, FieldKind::U32),
    field(LAST_WHEEL_EVENT_TIME, FieldKind::U16),
];

const CRANK_REVOLUTION_DATA: &[FieldSpec] = &[
    field(CUMULATIVE_CRANK_REVOLUTIONS, FieldKind::U16),
    field(LAST_CRANK_EVENT_TIME, FieldKind::U16),
];

/// Cycling Power Measurement (0x2A63).
pub const CYCLING_POWER_MEASUREMENT: FrameSchema = FrameSchema {
    name: "cycling_power_measurement",
    mask_width: MaskWidth::Bits16,
    entries: &[
        SchemaEntry {
            flag: 0,
            fields: &[field(INSTANTANEOUS_POWER, FieldKind::I16)],
        },
        SchemaEntry {
            flag: 1,
            fields: &[field(PEDAL_POWER_BALANCE, FieldKind::U8)],
        },
        // Pedal power balance reference
        SchemaEntry { flag: 2, fields: &[] },
        SchemaEntry {
            flag: 4,
            fields: &[field(ACCUMULATED_TORQUE, FieldKind::U16)],
        },
        // Accumulated torque source
        SchemaEntry { flag: 8, fields: &[] },
        SchemaEntry {
            flag: 16,
            fields: WHEEL_REVOLUTION_DATA,
        },
        SchemaEntry {
            flag: 32,
            fields: CRANK_REVOLUTION_DATA,
        },
        SchemaEntry {
            flag: 64,
            fields: &[
                field(MAXIMUM_FORCE_MAGNITUDE, FieldKind::I16),
                field(MINIMUM_FORCE_MAGNITUDE, FieldKind::I16),
            ],
        },
        SchemaEntry {
            flag: 128,
            fields: &[
                field(MAXIMUM_TORQUE_MAGNITUDE, FieldKind::I16),
                field(MINIMUM_TORQUE_MAGNITUDE, FieldKind::I16),
            ],
        },
        SchemaEntry {
            flag: 256,
            fields: &[field(MAXIMUM_MINIMUM_ANGLE, FieldKind::U24)],
        },
        SchemaEntry {
            flag: 512,
            fields: &[field(TOP_DEAD_SPOT_ANGLE, FieldKind::U16)],
        },
        SchemaEntry {
            flag: 1024,
            fields: &[field(BOTTOM_DEAD_SPOT_ANGLE, FieldKind::U16)],
        },
        SchemaEntry {
            flag: 2048,
            fields: &[field(ACCUMULATED_ENERGY, FieldKind::U16)],
        },
        // Offset compensation indicator
        SchemaEntry {
            flag: 4096,
            fields: &[],
        },
    ],
};

/// CSC Measurement (0x2A5B).
pub const CSC_MEASUREMENT: FrameSchema = FrameSchema {
    name: "csc_measurement",
    mask_width: MaskWidth::Bits8,
    entries: &[
        SchemaEntry {
            flag: 1,
            fields: WHEEL_REVOLUTION_DATA,
        },
        SchemaEntry {
            flag: 2,
            fields: CRANK_REVOLUTION_DATA,
        },
    ],
};

/// Decoded frame: field values in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryFrame {
    fields: Vec<(&'static str, i64)>,
}

impl TelemetryFrame {
    /// Value of a field, `None` when the frame's flags left it out.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.fields
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, value)| *value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in wire order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FrameSchema {
    fn included(&self, mask: u16) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.flag == 0 || mask & entry.flag != 0)
            .flat_map(|entry| entry.fields.iter())
    }

    /// Total frame length, mask included, implied by `mask`.
    pub fn layout_len(&self, mask: u16) -> usize {
        self.mask_width.bytes() + self.included(mask).map(|f| f.kind.width()).sum::<usize>()
    }

    fn read_mask(&self, bytes: &[u8]) -> Result<u16, SensorError> {
        let width = self.mask_width.bytes();
        if bytes.len() < width {
            return Err(SensorError::MalformedFrame {
                schema: self.name,
                expected: width,
                actual: bytes.len(),
            });
        }

        Ok(match self.mask_width {
            MaskWidth::Bits8 => bytes[0] as u16,
            MaskWidth::Bits16 => u16::from_le_bytes([bytes[0], bytes[1]]),
        })
    }

    /// Decode a raw characteristic value.
    ///
    /// The frame length is checked against the layout its mask announces
    /// before any field is read.
    pub fn decode(&self, bytes: &[u8]) -> Result<TelemetryFrame, SensorError> {
        let mask = self.read_mask(bytes)?;

        let expected = self.layout_len(mask);
        if bytes.len() < expected {
            return Err(SensorError::MalformedFrame {
                schema: self.name,
                expected,
                actual: bytes.len(),
            });
        }

        let mut offset = self.mask_width.bytes();
        let mut fields = Vec::new();
        for spec in self.included(mask) {
            fields.push((spec.name, spec.kind.read(&bytes[offset..])));
            offset += spec.kind.width();
        }

        Ok(TelemetryFrame { fields })
    }
}

/// Decode a Cycling Power Measurement value.
pub fn decode_cycling_power(bytes: &[u8]) -> Result<TelemetryFrame, SensorError> {
    CYCLING_POWER_MEASUREMENT.decode(bytes)
}

/// Decode a CSC Measurement value.
pub fn decode_csc(bytes: &[u8]) -> Result<TelemetryFrame, SensorError> {
    CSC_MEASUREMENT.decode(bytes)
}
