pub mod calibration;
pub mod cli;
pub mod config;
pub mod eeprom;
pub mod uid;
