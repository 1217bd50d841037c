// Calibration values persisted per motor

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_HOME, DEFAULT_KD, DEFAULT_KI, DEFAULT_KP, DEFAULT_LIMIT_MAX, DEFAULT_LIMIT_MIN,
};

/// Bytes per stored float (IEEE-754 binary32, little-endian)
pub const FLOAT_BYTES: usize = 4;

/// Travel limits of one motor. Stored as `[max, min]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorLimits {
    pub max: f32,
    pub min: f32,
}

impl MotorLimits {
    pub fn new(max: f32, min: f32) -> Self {
        Self { max, min }
    }

    /// True when both ends are finite and `max >= min`
    pub fn is_valid(&self) -> bool {
        self.max.is_finite() && self.min.is_finite() && self.max >= self.min
    }
}

impl Default for MotorLimits {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_MAX, DEFAULT_LIMIT_MIN)
    }
}

/// Flatten limits into the stored `[max0, min0, max1, min1, ...]` order
pub fn flatten_limits(limits: &[MotorLimits]) -> Vec<f32> {
    limits.iter().flat_map(|l| [l.max, l.min]).collect()
}

/// Pair up a flat `[max, min, ...]` sequence. A trailing odd value is dropped.
pub fn pair_limits(flat: &[f32]) -> Vec<MotorLimits> {
    flat.chunks_exact(2)
        .map(|pair| MotorLimits::new(pair[0], pair[1]))
        .collect()
}

/// PID gains for one motor.
///
/// The store treats this as a fixed-size block of [`PidGains::BYTES`]; only
/// the controller cares what the fields mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    /// Size of one record on the device
    pub const BYTES: usize = 3 * FLOAT_BYTES;

    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        out[0..4].copy_from_slice(&self.kp.to_le_bytes());
        out[4..8].copy_from_slice(&self.ki.to_le_bytes());
        out[8..12].copy_from_slice(&self.kd.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::BYTES]) -> Self {
        let field =
            |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            kp: field(0),
            ki: field(4),
            kd: field(8),
        }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::new(DEFAULT_KP, DEFAULT_KI, DEFAULT_KD)
    }
}

/// Everything the store keeps for the arm, as one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub version: u8,
    pub uid: u32,
    pub limits: Vec<MotorLimits>,
    pub home: Vec<f32>,
    pub pid: Vec<PidGains>,
}

impl Calibration {
    /// Values written to a blank or stale device
    pub fn defaults(version: u8, uid: u32, motor_count: usize) -> Self {
        Self {
            version,
            uid,
            limits: vec![MotorLimits::default(); motor_count],
            home: vec![DEFAULT_HOME; motor_count],
            pid: vec![PidGains::default(); motor_count],
        }
    }
}

/// Encode floats as consecutive little-endian words
pub(crate) fn encode_floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode consecutive little-endian words. Trailing partial words are ignored.
pub(crate) fn decode_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(FLOAT_BYTES)
        .map(|w| f32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}
