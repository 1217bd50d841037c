// Calibration store: loads and saves the arm's calibration at the offsets
// given by `Layout`, and decides at boot whether stored data can be trusted.

use tracing::{debug, info, warn};

use super::driver::{EepromDriver, EepromError};
use super::layout::{Field, Layout};
use crate::calibration::{
    Calibration, MotorLimits, PidGains, decode_floats, encode_floats, flatten_limits, pair_limits,
};
use crate::config::{BLANK_BYTE, ConfigError, StoreConfig};
use crate::uid::{UNASSIGNED_UID, UidSource};

/// Error types for the calibration store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("EEPROM error: {0}")]
    Storage(#[from] EepromError),

    #[error("Expected {expected} {field} values, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Motor {motor} has invalid limits: max={max}, min={min}")]
    InvalidLimits { motor: usize, max: f32, min: f32 },

    #[error("Layout needs {required} bytes but the EEPROM holds {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },

    #[error("UID 0 is reserved for unassigned devices")]
    UnassignedUid,

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What `load_all` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored version matched; calibration was read from the device
    Loaded,
    /// Stored version was `found`; defaults were written over the device
    DefaultsApplied { found: u8 },
}

/// Calibration store for the arm.
///
/// Holds the working copy of every field. `save_*` writes a field and keeps the
/// value; `load_*` reads a field and replaces the working copy.
///
/// The store has a single owner. In a threaded host wrap the whole store in one
/// mutex; fields are never safe to update piecewise.
pub struct CalibrationStore<D: EepromDriver> {
    driver: D,
    layout: Layout,
    version: u8,
    uid: u32,
    limits: Vec<MotorLimits>,
    home: Vec<f32>,
    pid: Vec<PidGains>,
}

impl<D: EepromDriver> CalibrationStore<D> {
    /// Create a store over `driver`. No I/O happens until a load or save.
    pub fn new(driver: D, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let required = Layout::checked_end(config.motor_count)
            .ok_or(ConfigError::TooManyMotors(config.motor_count))?;
        if required > driver.capacity() {
            return Err(StoreError::CapacityExceeded {
                required,
                capacity: driver.capacity(),
            });
        }
        let layout = Layout::new(config.motor_count);

        let defaults = Calibration::defaults(
            config.firmware_version,
            UNASSIGNED_UID,
            config.motor_count,
        );
        Ok(Self {
            driver,
            layout,
            version: config.firmware_version,
            uid: defaults.uid,
            limits: defaults.limits,
            home: defaults.home,
            pid: defaults.pid,
        })
    }

    // === Version ===

    /// Read the stored layout version byte as-is
    pub fn load_version(&mut self) -> Result<u8> {
        let version = self.driver.read_byte(self.layout.offset(Field::Version))?;
        debug!("Stored version: {}", version);
        Ok(version)
    }

    fn write_version(&mut self, version: u8) -> Result<()> {
        self.driver
            .write_byte(self.layout.offset(Field::Version), version)?;
        Ok(())
    }

    // === UID ===

    pub fn save_uid(&mut self, uid: u32) -> Result<()> {
        self.write_field(Field::Uid, &uid.to_le_bytes())?;
        self.uid = uid;
        Ok(())
    }

    pub fn load_uid(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_field(Field::Uid, &mut bytes)?;
        self.uid = u32::from_le_bytes(bytes);
        Ok(self.uid)
    }

    /// Assign a new UID explicitly (e.g. one issued by the host)
    pub fn set_uid(&mut self, uid: u32) -> Result<()> {
        if uid == UNASSIGNED_UID {
            return Err(StoreError::UnassignedUid);
        }
        info!("Assigning UID {}", uid);
        self.save_uid(uid)
    }

    // === Limits ===

    /// Write `[max0, min0, max1, min1, ...]` verbatim
    pub fn save_limits(&mut self, limits: &[f32]) -> Result<()> {
        self.check_len(Field::Limits, limits.len())?;
        self.write_field(Field::Limits, &encode_floats(limits))?;
        self.limits = pair_limits(limits);
        Ok(())
    }

    pub fn load_limits(&mut self) -> Result<Vec<f32>> {
        let mut bytes = vec![0u8; self.layout.len(Field::Limits)];
        self.read_field(Field::Limits, &mut bytes)?;
        let flat = decode_floats(&bytes);
        self.limits = pair_limits(&flat);
        Ok(flat)
    }

    /// Apply new limits from calibration.
    ///
    /// Unlike `save_limits`, every pair must satisfy `max >= min` with both
    /// ends finite. Nothing is written if any pair fails.
    pub fn adjust_limits(&mut self, limits: &[f32]) -> Result<()> {
        self.check_len(Field::Limits, limits.len())?;
        for (motor, pair) in pair_limits(limits).iter().enumerate() {
            if !pair.is_valid() {
                return Err(StoreError::InvalidLimits {
                    motor,
                    max: pair.max,
                    min: pair.min,
                });
            }
        }
        info!("Adjusting limits for {} motors", self.layout.motor_count());
        self.save_limits(limits)
    }

    // === Home ===

    pub fn save_home(&mut self, home: &[f32]) -> Result<()> {
        self.check_len(Field::Home, home.len())?;
        self.write_field(Field::Home, &encode_floats(home))?;
        self.home = home.to_vec();
        Ok(())
    }

    pub fn load_home(&mut self) -> Result<Vec<f32>> {
        let mut bytes = vec![0u8; self.layout.len(Field::Home)];
        self.read_field(Field::Home, &mut bytes)?;
        self.home = decode_floats(&bytes);
        Ok(self.home.clone())
    }

    // === PID ===

    pub fn save_pid(&mut self, pid: &[PidGains]) -> Result<()> {
        self.check_len(Field::Pid, pid.len())?;
        let bytes: Vec<u8> = pid.iter().flat_map(|g| g.to_bytes()).collect();
        self.write_field(Field::Pid, &bytes)?;
        self.pid = pid.to_vec();
        Ok(())
    }

    pub fn load_pid(&mut self) -> Result<Vec<PidGains>> {
        let mut bytes = vec![0u8; self.layout.len(Field::Pid)];
        self.read_field(Field::Pid, &mut bytes)?;
        self.pid = bytes
            .chunks_exact(PidGains::BYTES)
            .map(|chunk| {
                let mut record = [0u8; PidGains::BYTES];
                record.copy_from_slice(chunk);
                PidGains::from_bytes(&record)
            })
            .collect();
        Ok(self.pid.clone())
    }

    // === Whole device ===

    /// Write every field from the working copy.
    ///
    /// The version byte is blanked first and written last, so an interrupted
    /// save always reads back as stale and gets re-bootstrapped.
    pub fn save_all(&mut self) -> Result<()> {
        info!("Saving calibration (version {})", self.version);
        self.write_version(BLANK_BYTE)?;

        self.save_uid(self.uid)?;
        let limits = flatten_limits(&self.limits);
        self.save_limits(&limits)?;
        let home = self.home.clone();
        self.save_home(&home)?;
        let pid = self.pid.clone();
        self.save_pid(&pid)?;

        self.write_version(self.version)?;
        debug!("Calibration saved");
        Ok(())
    }

    /// Boot sequence.
    ///
    /// If the stored version matches, reads UID, limits, home and PID in that
    /// order. Otherwise reads nothing else, assigns a fresh UID, writes the
    /// defaults and stamps the current version.
    pub fn load_all(&mut self, uids: &mut impl UidSource) -> Result<LoadOutcome> {
        let found = self.load_version()?;
        if found != self.version {
            warn!(
                "Stored version {} does not match firmware version {}, writing defaults",
                found, self.version
            );
            self.bootstrap(uids)?;
            return Ok(LoadOutcome::DefaultsApplied { found });
        }

        self.load_uid()?;
        self.load_limits()?;
        self.load_home()?;
        self.load_pid()?;
        info!("Loaded calibration for UID {}", self.uid);
        Ok(LoadOutcome::Loaded)
    }

    /// Discard stored calibration and write defaults with a fresh UID
    pub fn reset(&mut self, uids: &mut impl UidSource) -> Result<()> {
        info!("Resetting calibration to defaults");
        self.bootstrap(uids)
    }

    fn bootstrap(&mut self, uids: &mut impl UidSource) -> Result<()> {
        let uid = uids.generate_uid();
        if uid == UNASSIGNED_UID {
            return Err(StoreError::UnassignedUid);
        }
        let defaults = Calibration::defaults(self.version, uid, self.layout.motor_count());
        info!("New UID {}", defaults.uid);
        self.uid = defaults.uid;
        self.limits = defaults.limits;
        self.home = defaults.home;
        self.pid = defaults.pid;
        self.save_all()
    }

    // === Accessors ===

    /// Firmware version this store writes and expects
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn limits(&self) -> &[MotorLimits] {
        &self.limits
    }

    pub fn home(&self) -> &[f32] {
        &self.home
    }

    pub fn pid(&self) -> &[PidGains] {
        &self.pid
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Snapshot of the working copy
    pub fn calibration(&self) -> Calibration {
        Calibration {
            version: self.version,
            uid: self.uid,
            limits: self.limits.clone(),
            home: self.home.clone(),
            pid: self.pid.clone(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    // === Helpers ===

    fn check_len(&self, field: Field, actual: usize) -> Result<()> {
        let expected = self.layout.count(field);
        if actual != expected {
            return Err(StoreError::LengthMismatch {
                field: field.name(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn write_field(&mut self, field: Field, bytes: &[u8]) -> Result<()> {
        debug!(
            "Writing {} ({} bytes at {})",
            field.name(),
            bytes.len(),
            self.layout.offset(field)
        );
        self.driver.write_block(self.layout.offset(field), bytes)?;
        Ok(())
    }

    fn read_field(&mut self, field: Field, buf: &mut [u8]) -> Result<()> {
        debug!(
            "Reading {} ({} bytes at {})",
            field.name(),
            buf.len(),
            self.layout.offset(field)
        );
        self.driver.read_block(self.layout.offset(field), buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EEPROM_CAPACITY;
    use crate::eeprom::MemoryEeprom;
    use crate::uid::{FixedUid, RandomUid};

    const VERSION: u8 = 10;

    fn store() -> CalibrationStore<MemoryEeprom> {
        CalibrationStore::new(
            MemoryEeprom::new(EEPROM_CAPACITY),
            StoreConfig::new(6, VERSION).unwrap(),
        )
        .unwrap()
    }

    /// Store over a device that already holds a full, valid calibration
    fn booted() -> CalibrationStore<MemoryEeprom> {
        let mut store = store();
        store.load_all(&mut FixedUid(1234)).unwrap();
        store
    }

    fn sample_limits() -> Vec<f32> {
        vec![
            10.0, -10.0, 20.0, -20.0, 30.0, -30.0, 40.0, -40.0, 50.0, -50.0, 60.0, -60.0,
        ]
    }

    fn sample_pid() -> Vec<PidGains> {
        (0..6)
            .map(|i| PidGains::new(i as f32, 0.01 * i as f32, -(i as f32)))
            .collect()
    }

    #[test]
    fn test_limits_round_trip() {
        let mut store = store();
        store.save_limits(&sample_limits()).unwrap();
        assert_eq!(store.load_limits().unwrap(), sample_limits());

        // Stored at offset 5, first value is max0
        let bytes = store.driver().as_bytes();
        assert_eq!(&bytes[5..9], &10.0f32.to_le_bytes());
        assert_eq!(&bytes[9..13], &(-10.0f32).to_le_bytes());
    }

    #[test]
    fn test_home_and_pid_round_trip() {
        let mut store = store();
        let home = vec![0.5, -1.25, 3.0, 0.0, 90.0, -45.5];
        store.save_home(&home).unwrap();
        store.save_pid(&sample_pid()).unwrap();

        assert_eq!(store.load_home().unwrap(), home);
        assert_eq!(store.load_pid().unwrap(), sample_pid());
    }

    #[test]
    fn test_uid_round_trip() {
        let mut store = store();
        store.save_uid(0xDEAD_BEEF).unwrap();
        assert_eq!(&store.driver().as_bytes()[1..5], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(store.load_uid().unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_fields_do_not_clobber_each_other() {
        let mut store = store();
        store.save_uid(7).unwrap();
        store.save_limits(&sample_limits()).unwrap();
        store.save_home(&[1.0; 6]).unwrap();
        store.save_pid(&sample_pid()).unwrap();

        assert_eq!(store.load_uid().unwrap(), 7);
        assert_eq!(store.load_limits().unwrap(), sample_limits());
        assert_eq!(store.load_home().unwrap(), vec![1.0; 6]);
        assert_eq!(store.load_pid().unwrap(), sample_pid());
        // Nothing past the PID block
        let end = store.layout().end();
        assert!(store.driver().as_bytes()[end..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let mut store = store();
        let before = store.driver().as_bytes().to_vec();

        let err = store.save_limits(&[1.0; 11]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::LengthMismatch { field: "limits", expected: 12, actual: 11 }
        ));
        assert!(matches!(
            store.save_home(&[0.0; 7]),
            Err(StoreError::LengthMismatch { field: "home", expected: 6, actual: 7 })
        ));
        assert!(matches!(
            store.save_pid(&[PidGains::default(); 5]),
            Err(StoreError::LengthMismatch { field: "pid", expected: 6, actual: 5 })
        ));
        assert!(matches!(
            store.adjust_limits(&[0.0; 13]),
            Err(StoreError::LengthMismatch { .. })
        ));

        assert_eq!(store.driver().as_bytes(), &before[..]);
    }

    #[test]
    fn test_adjust_limits_rejects_inverted_pair() {
        let mut store = booted();
        let before = store.driver().as_bytes().to_vec();

        let mut limits = sample_limits();
        limits[6] = -70.0; // motor 3: max below min
        let err = store.adjust_limits(&limits).unwrap_err();
        assert!(matches!(err, StoreError::InvalidLimits { motor: 3, .. }));
        assert_eq!(store.driver().as_bytes(), &before[..]);
    }

    #[test]
    fn test_adjust_limits_touches_only_limits_block() {
        let mut store = booted();
        store.driver_mut().clear_reads();
        let before = store.driver().as_bytes().to_vec();

        store.adjust_limits(&sample_limits()).unwrap();

        let layout = store.layout();
        let after = store.driver().as_bytes();
        assert_eq!(after[..layout.offset(Field::Limits)], before[..layout.offset(Field::Limits)]);
        assert_eq!(after[layout.offset(Field::Home)..], before[layout.offset(Field::Home)..]);
        assert!(store.driver().reads().is_empty());
        assert_eq!(store.limits()[5], MotorLimits::new(60.0, -60.0));
    }

    #[test]
    fn test_save_limits_is_verbatim() {
        // No ordering check on the plain save path
        let mut store = store();
        let mut limits = sample_limits();
        limits.swap(0, 1);
        store.save_limits(&limits).unwrap();
        assert_eq!(store.load_limits().unwrap(), limits);
    }

    #[test]
    fn test_blank_device_gets_defaults() {
        let mut store = store();
        assert_eq!(store.load_version().unwrap(), 0xFF);

        let outcome = store.load_all(&mut FixedUid(99)).unwrap();
        assert_eq!(outcome, LoadOutcome::DefaultsApplied { found: 0xFF });
        assert_eq!(store.load_version().unwrap(), VERSION);
        assert_eq!(store.uid(), 99);
        assert_eq!(store.calibration(), Calibration::defaults(VERSION, 99, 6));
    }

    #[test]
    fn test_defaults_are_persisted() {
        let mut store = store();
        store.load_all(&mut FixedUid(99)).unwrap();

        // Fresh store over the same bytes loads what bootstrap wrote
        let driver = store.into_driver();
        let mut reopened =
            CalibrationStore::new(driver, StoreConfig::new(6, VERSION).unwrap()).unwrap();
        let outcome = reopened.load_all(&mut FixedUid(5)).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reopened.uid(), 99);
        assert_eq!(reopened.calibration(), Calibration::defaults(VERSION, 99, 6));
    }

    #[test]
    fn test_version_mismatch_reads_only_version() {
        let mut eeprom = MemoryEeprom::new(EEPROM_CAPACITY);
        // Old schema revision with garbage everywhere else
        eeprom.write_block(0, &[9; 200]).unwrap();
        let mut store =
            CalibrationStore::new(eeprom, StoreConfig::new(6, VERSION).unwrap()).unwrap();

        let outcome = store.load_all(&mut RandomUid::seeded(3)).unwrap();
        assert_eq!(outcome, LoadOutcome::DefaultsApplied { found: 9 });

        let layout = store.layout();
        assert_eq!(store.driver().reads(), &[0..1]);
        assert!(!store.driver().was_read(layout.offset(Field::Uid)..layout.end()));
        assert_eq!(store.load_version().unwrap(), VERSION);
        assert_eq!(store.load_limits().unwrap(), flatten_limits(&[MotorLimits::default(); 6]));
    }

    #[test]
    fn test_matching_version_loads_stored_values() {
        let mut store = booted();
        store.save_limits(&sample_limits()).unwrap();
        store.save_pid(&sample_pid()).unwrap();

        let driver = store.into_driver();
        let mut reopened =
            CalibrationStore::new(driver, StoreConfig::new(6, VERSION).unwrap()).unwrap();
        assert_eq!(reopened.load_all(&mut FixedUid(5)).unwrap(), LoadOutcome::Loaded);
        assert_eq!(flatten_limits(reopened.limits()), sample_limits());
        assert_eq!(reopened.pid(), &sample_pid()[..]);
        assert_eq!(reopened.uid(), 1234);
    }

    #[test]
    fn test_save_all_is_idempotent() {
        let mut store = booted();
        store.save_limits(&sample_limits()).unwrap();

        store.save_all().unwrap();
        let first = store.driver().as_bytes().to_vec();
        store.save_all().unwrap();
        assert_eq!(store.driver().as_bytes(), &first[..]);
        assert_eq!(first[0], VERSION);
    }

    #[test]
    fn test_interrupted_bootstrap_is_redone() {
        let mut store = store();
        // Every byte of the bootstrap except the final version stamp
        let budget = store.layout().end();
        store.driver_mut().interrupt_after(budget);

        let err = store.load_all(&mut FixedUid(11)).unwrap_err();
        assert!(matches!(err, StoreError::Storage(EepromError::PowerLoss { addr: 0 })));

        store.driver_mut().restore_power();
        store.driver_mut().clear_reads();
        let outcome = store.load_all(&mut FixedUid(22)).unwrap();
        assert_eq!(outcome, LoadOutcome::DefaultsApplied { found: 0xFF });
        assert_eq!(store.uid(), 22);
        assert_eq!(store.driver().reads(), &[0..1]);
    }

    #[test]
    fn test_interrupted_resave_is_detected() {
        let mut store = booted();
        store.save_limits(&sample_limits()).unwrap();

        // Power cut halfway through the PID block of a re-save
        let cut = store.layout().offset(Field::Pid) + 10;
        store.driver_mut().interrupt_after(cut);
        assert!(store.save_all().is_err());
        store.driver_mut().restore_power();

        let driver = store.into_driver();
        let mut reopened =
            CalibrationStore::new(driver, StoreConfig::new(6, VERSION).unwrap()).unwrap();
        let outcome = reopened.load_all(&mut FixedUid(77)).unwrap();
        assert_eq!(outcome, LoadOutcome::DefaultsApplied { found: 0xFF });
        assert_eq!(reopened.load_version().unwrap(), VERSION);
    }

    #[test]
    fn test_reset_overrides_valid_storage() {
        let mut store = booted();
        store.save_limits(&sample_limits()).unwrap();

        store.reset(&mut FixedUid(4321)).unwrap();
        assert_eq!(store.uid(), 4321);
        assert_eq!(store.load_limits().unwrap(), flatten_limits(&[MotorLimits::default(); 6]));
        assert_eq!(store.load_version().unwrap(), VERSION);
    }

    #[test]
    fn test_set_uid() {
        let mut store = booted();
        assert!(matches!(store.set_uid(0), Err(StoreError::UnassignedUid)));
        assert_eq!(store.load_uid().unwrap(), 1234);

        store.set_uid(555).unwrap();
        assert_eq!(store.load_uid().unwrap(), 555);
    }

    #[test]
    fn test_device_absent_is_reported() {
        let mut store = store();
        store.driver_mut().set_absent(true);

        assert!(matches!(
            store.load_all(&mut FixedUid(1)),
            Err(StoreError::Storage(EepromError::DeviceAbsent))
        ));
        assert!(matches!(
            store.save_home(&[0.0; 6]),
            Err(StoreError::Storage(EepromError::DeviceAbsent))
        ));
    }

    #[test]
    fn test_failed_save_keeps_working_copy() {
        let mut store = booted();
        store.driver_mut().set_absent(true);
        assert!(store.save_home(&[7.0; 6]).is_err());
        assert_eq!(store.home(), &[0.0f32; 6]);
    }

    #[test]
    fn test_layout_must_fit_device() {
        let err = CalibrationStore::new(MemoryEeprom::new(100), StoreConfig::new(6, VERSION).unwrap())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StoreError::CapacityExceeded { required: 149, capacity: 100 }
        ));
    }

    #[test]
    fn test_motor_count_drives_offsets() {
        let mut store =
            CalibrationStore::new(MemoryEeprom::new(64), StoreConfig::new(2, VERSION).unwrap())
                .unwrap();
        store.load_all(&mut FixedUid(3)).unwrap();
        store.save_home(&[1.5, -2.5]).unwrap();

        // 2 motors: home block at 5 + 16
        let bytes = store.driver().as_bytes();
        assert_eq!(&bytes[21..25], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[25..29], &(-2.5f32).to_le_bytes());
    }

    #[test]
    fn test_unchecked_config_is_rejected() {
        let blank_version = StoreConfig {
            motor_count: 6,
            firmware_version: 0xFF,
        };
        assert!(matches!(
            CalibrationStore::new(MemoryEeprom::new(EEPROM_CAPACITY), blank_version).err(),
            Some(StoreError::Config(ConfigError::ReservedVersion(0xFF)))
        ));

        let no_motors = StoreConfig {
            motor_count: 0,
            firmware_version: VERSION,
        };
        assert!(matches!(
            CalibrationStore::new(MemoryEeprom::new(EEPROM_CAPACITY), no_motors).err(),
            Some(StoreError::Config(ConfigError::NoMotors))
        ));
    }

    #[test]
    fn test_huge_motor_count_is_an_error() {
        for motor_count in [usize::MAX, 4_611_686_018_427_387_904] {
            let config = StoreConfig {
                motor_count,
                firmware_version: VERSION,
            };
            assert!(matches!(
                CalibrationStore::new(MemoryEeprom::new(EEPROM_CAPACITY), config).err(),
                Some(StoreError::Config(ConfigError::TooManyMotors(_)))
            ));
        }

        // Addressable but far larger than the device: refused before allocating defaults
        let config = StoreConfig {
            motor_count: usize::MAX / 64,
            firmware_version: VERSION,
        };
        assert!(matches!(
            CalibrationStore::new(MemoryEeprom::new(EEPROM_CAPACITY), config).err(),
            Some(StoreError::CapacityExceeded { capacity: EEPROM_CAPACITY, .. })
        ));
    }

    #[test]
    fn test_unassigned_uid_never_bootstraps() {
        let mut store = store();
        let err = store.load_all(&mut FixedUid(UNASSIGNED_UID)).unwrap_err();
        assert!(matches!(err, StoreError::UnassignedUid));

        // Nothing written: the next boot still sees a blank device
        assert!(store.driver().as_bytes().iter().all(|&b| b == 0xFF));
        assert_eq!(store.uid(), UNASSIGNED_UID);
        assert!(matches!(
            store.load_all(&mut FixedUid(5)).unwrap(),
            LoadOutcome::DefaultsApplied { found: 0xFF }
        ));
        assert_eq!(store.load_uid().unwrap(), 5);
    }

    #[test]
    fn test_reset_with_unassigned_uid_keeps_storage() {
        let mut store = booted();
        let before = store.driver().as_bytes().to_vec();

        assert!(matches!(
            store.reset(&mut FixedUid(UNASSIGNED_UID)),
            Err(StoreError::UnassignedUid)
        ));
        assert_eq!(store.driver().as_bytes(), &before[..]);
        assert_eq!(store.uid(), 1234);
    }
}
