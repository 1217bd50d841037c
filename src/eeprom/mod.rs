// Calibration EEPROM for the arm controller
//
// Provides:
// - Byte layout of the stored fields, derived from the motor count
// - Storage driver trait with in-memory and file-backed drivers
// - Calibration store with version-gated boot

mod driver;
pub mod layout;
mod store;

pub use driver::{EepromDriver, EepromError, FileEeprom, MemoryEeprom};
pub use layout::{Field, Layout};
pub use store::{CalibrationStore, LoadOutcome, StoreError};
