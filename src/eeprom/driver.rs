// Byte-level EEPROM access
//
// The store only needs four primitives: read/write one byte and read/write a
// block. Drivers report their capacity so the store can refuse a layout that
// does not fit before touching the device.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::BLANK_BYTE;

/// Error types for EEPROM access
#[derive(Debug, thiserror::Error)]
pub enum EepromError {
    #[error("Access of {len} bytes at {addr} exceeds the {capacity}-byte device")]
    OutOfRange {
        addr: usize,
        len: usize,
        capacity: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Power lost while writing address {addr}")]
    PowerLoss { addr: usize },

    #[error("EEPROM device not present")]
    DeviceAbsent,
}

pub type Result<T> = std::result::Result<T, EepromError>;

/// Storage driver used by the calibration store.
///
/// Implementations never retry; a failed access is reported as-is.
pub trait EepromDriver {
    /// Total addressable bytes
    fn capacity(&self) -> usize;

    fn read_byte(&mut self, addr: usize) -> Result<u8>;

    fn write_byte(&mut self, addr: usize, value: u8) -> Result<()>;

    /// Fill `buf` from `addr` onward
    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len(), self.capacity())?;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(addr + i)?;
        }
        Ok(())
    }

    /// Write `data` starting at `addr`
    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        check_range(addr, data.len(), self.capacity())?;
        for (i, &byte) in data.iter().enumerate() {
            self.write_byte(addr + i, byte)?;
        }
        Ok(())
    }
}

fn check_range(addr: usize, len: usize, capacity: usize) -> Result<()> {
    match addr.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(EepromError::OutOfRange {
            addr,
            len,
            capacity,
        }),
    }
}

/// In-memory EEPROM.
///
/// Starts blank (every byte 0xFF). Besides plain storage it can:
/// - record which address ranges were read
/// - cut power after a given number of byte writes
/// - pretend the device is missing
#[derive(Debug, Clone)]
pub struct MemoryEeprom {
    cells: Vec<u8>,
    reads: Vec<Range<usize>>,
    writes_left: Option<usize>,
    absent: bool,
}

impl MemoryEeprom {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![BLANK_BYTE; capacity],
            reads: Vec::new(),
            writes_left: None,
            absent: false,
        }
    }

    /// Build from an existing image; capacity is the image length
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            cells: bytes,
            ..Self::new(0)
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Address ranges read since creation or the last [`clear_reads`](Self::clear_reads)
    pub fn reads(&self) -> &[Range<usize>] {
        &self.reads
    }

    pub fn clear_reads(&mut self) {
        self.reads.clear();
    }

    /// True if any recorded read touched `range`
    pub fn was_read(&self, range: Range<usize>) -> bool {
        self.reads
            .iter()
            .any(|r| r.start < range.end && range.start < r.end)
    }

    /// Allow `bytes` more byte writes, then fail every write with `PowerLoss`
    pub fn interrupt_after(&mut self, bytes: usize) {
        self.writes_left = Some(bytes);
    }

    /// Restore power after [`interrupt_after`](Self::interrupt_after)
    pub fn restore_power(&mut self) {
        self.writes_left = None;
    }

    pub fn set_absent(&mut self, absent: bool) {
        self.absent = absent;
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(EepromError::PowerLoss { addr });
            }
            *left -= 1;
        }
        self.cells[addr] = value;
        Ok(())
    }
}

impl EepromDriver for MemoryEeprom {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read_byte(&mut self, addr: usize) -> Result<u8> {
        if self.absent {
            return Err(EepromError::DeviceAbsent);
        }
        check_range(addr, 1, self.capacity())?;
        self.reads.push(addr..addr + 1);
        Ok(self.cells[addr])
    }

    fn write_byte(&mut self, addr: usize, value: u8) -> Result<()> {
        if self.absent {
            return Err(EepromError::DeviceAbsent);
        }
        check_range(addr, 1, self.capacity())?;
        self.store(addr, value)
    }

    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        if self.absent {
            return Err(EepromError::DeviceAbsent);
        }
        check_range(addr, buf.len(), self.capacity())?;
        self.reads.push(addr..addr + buf.len());
        buf.copy_from_slice(&self.cells[addr..addr + buf.len()]);
        Ok(())
    }

    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        if self.absent {
            return Err(EepromError::DeviceAbsent);
        }
        check_range(addr, data.len(), self.capacity())?;
        // Byte at a time so a power cut leaves a torn block, like real EEPROM
        for (i, &byte) in data.iter().enumerate() {
            self.store(addr + i, byte)?;
        }
        Ok(())
    }
}

/// EEPROM image kept in a file on the host.
///
/// Used to inspect and edit a dump of the controller's EEPROM.
#[derive(Debug)]
pub struct FileEeprom {
    file: File,
    capacity: usize,
}

impl FileEeprom {
    /// Open an existing image, or create a blank one of `capacity` bytes.
    ///
    /// An existing image keeps its own size.
    pub fn open_or_create(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if !exists {
            info!("Creating blank {}-byte EEPROM image at {}", capacity, path.display());
            file.write_all(&vec![BLANK_BYTE; capacity])?;
            file.sync_data()?;
            return Ok(Self { file, capacity });
        }

        let actual = file.metadata()?.len() as usize;
        if actual != capacity {
            warn!(
                "Existing image {} is {} bytes, ignoring requested capacity of {}",
                path.display(),
                actual,
                capacity
            );
        }
        debug!("Opened {}-byte EEPROM image at {}", actual, path.display());
        Ok(Self {
            file,
            capacity: actual,
        })
    }
}

impl EepromDriver for FileEeprom {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_byte(&mut self, addr: usize) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_block(addr, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, addr: usize, value: u8) -> Result<()> {
        self.write_block(addr, &[value])
    }

    fn read_block(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len(), self.capacity)?;
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        check_range(addr, data.len(), self.capacity)?;
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.write_all(data)?;
        self.file.sync_data()?;
        Ok(())
    }
}
