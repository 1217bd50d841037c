// Byte layout of the calibration EEPROM
//
// 0                  version   (1 byte)
// 1                  uid       (4 bytes)
// 5                  limits    (2 * N * 4 bytes)  [max0, min0, max1, min1, ...]
// 5 + 8N             home      (N * 4 bytes)
// 5 + 12N            pid       (N * 12 bytes)
//
// Every field starts where the previous one ends. Offsets depend on the motor
// count, so they are always computed from it.

use std::ops::Range;

use crate::calibration::{FLOAT_BYTES, PidGains};

/// Stored fields, in address order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Version,
    Uid,
    Limits,
    Home,
    Pid,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Version,
        Field::Uid,
        Field::Limits,
        Field::Home,
        Field::Pid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Version => "version",
            Field::Uid => "uid",
            Field::Limits => "limits",
            Field::Home => "home",
            Field::Pid => "pid",
        }
    }
}

pub const VERSION_BYTES: usize = 1;
pub const UID_BYTES: usize = 4;

/// Offsets and lengths of every field for a given motor count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    motor_count: usize,
}

impl Layout {
    pub const fn new(motor_count: usize) -> Self {
        Self { motor_count }
    }

    pub const fn motor_count(&self) -> usize {
        self.motor_count
    }

    /// Number of stored elements for a field (floats for limits/home, records for pid)
    pub const fn count(&self, field: Field) -> usize {
        match field {
            Field::Version | Field::Uid => 1,
            Field::Limits => 2 * self.motor_count,
            Field::Home | Field::Pid => self.motor_count,
        }
    }

    pub const fn len(&self, field: Field) -> usize {
        match field {
            Field::Version => VERSION_BYTES,
            Field::Uid => UID_BYTES,
            Field::Limits => 2 * self.motor_count * FLOAT_BYTES,
            Field::Home => self.motor_count * FLOAT_BYTES,
            Field::Pid => self.motor_count * PidGains::BYTES,
        }
    }

    pub const fn offset(&self, field: Field) -> usize {
        match field {
            Field::Version => 0,
            Field::Uid => self.end_of(Field::Version),
            Field::Limits => self.end_of(Field::Uid),
            Field::Home => self.end_of(Field::Limits),
            Field::Pid => self.end_of(Field::Home),
        }
    }

    const fn end_of(&self, field: Field) -> usize {
        self.offset(field) + self.len(field)
    }

    pub fn range(&self, field: Field) -> Range<usize> {
        self.offset(field)..self.end_of(field)
    }

    /// Bytes each motor adds to the layout (limits pair, home, PID record)
    pub const fn bytes_per_motor() -> usize {
        2 * FLOAT_BYTES + FLOAT_BYTES + PidGains::BYTES
    }

    /// Total bytes for `motor_count` motors, or `None` if that overflows `usize`
    pub const fn checked_end(motor_count: usize) -> Option<usize> {
        match motor_count.checked_mul(Self::bytes_per_motor()) {
            Some(per_motor) => per_motor.checked_add(VERSION_BYTES + UID_BYTES),
            None => None,
        }
    }

    /// One past the last byte used
    pub const fn end(&self) -> usize {
        self.end_of(Field::Pid)
    }

    /// Every field with its byte range, in address order
    pub fn fields(&self) -> impl Iterator<Item = (Field, Range<usize>)> + '_ {
        Field::ALL.into_iter().map(move |f| (f, self.range(f)))
    }
}
