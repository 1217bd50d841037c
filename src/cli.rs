// Command-line front end over an EEPROM image file
//
// Every command that touches calibration boots the image first, exactly like
// the controller does at power-up, then applies the change.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::calibration::PidGains;
use crate::config::{DEFAULT_IMAGE_PATH, EEPROM_CAPACITY, StoreConfig};
use crate::eeprom::{CalibrationStore, FileEeprom, Layout, LoadOutcome};
use crate::uid::RandomUid;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "arm-eeprom", about = "Inspect and edit the arm's calibration EEPROM image")]
pub struct Cli {
    /// EEPROM image file (created blank if missing)
    #[arg(long, default_value = DEFAULT_IMAGE_PATH)]
    pub image: PathBuf,

    /// JSON file with motor_count / firmware_version overrides
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Size of a newly created image in bytes (existing images keep their size)
    #[arg(long, default_value_t = EEPROM_CAPACITY)]
    pub capacity: usize,

    /// Seed for UID generation (reproducible images)
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the byte layout for the configured motor count
    Layout,
    /// Run the boot sequence and report what happened
    Boot,
    /// Boot, then print the calibration as JSON
    Show,
    /// Store limits verbatim: max0 min0 max1 min1 ...
    SetLimits {
        #[arg(allow_negative_numbers = true, required = true)]
        limits: Vec<f32>,
    },
    /// Store limits after checking max >= min for every motor
    AdjustLimits {
        #[arg(allow_negative_numbers = true, required = true)]
        limits: Vec<f32>,
    },
    /// Store home positions, one per motor
    SetHome {
        #[arg(allow_negative_numbers = true, required = true)]
        home: Vec<f32>,
    },
    /// Store PID gains for one motor
    SetPid {
        motor: usize,
        #[arg(allow_negative_numbers = true)]
        kp: f32,
        #[arg(allow_negative_numbers = true)]
        ki: f32,
        #[arg(allow_negative_numbers = true)]
        kd: f32,
    },
    /// Assign a UID
    SetUid { uid: u32 },
    /// Overwrite everything with defaults and a fresh UID
    Reset,
}

pub fn run(cli: Cli) -> Result<(), Error> {
    let config = match &cli.config {
        Some(path) => StoreConfig::from_json_file(path)?,
        None => StoreConfig::default(),
    };

    if let Command::Layout = cli.command {
        print_layout(Layout::new(config.motor_count));
        return Ok(());
    }

    let driver = FileEeprom::open_or_create(&cli.image, cli.capacity)?;
    let mut store = CalibrationStore::new(driver, config)?;
    let mut uids = match cli.seed {
        Some(seed) => RandomUid::seeded(seed),
        None => RandomUid::new(),
    };

    let outcome = store.load_all(&mut uids)?;

    match cli.command {
        Command::Layout => print_layout(store.layout()),
        Command::Boot => {
            match outcome {
                LoadOutcome::Loaded => println!("Loaded calibration (version {})", store.version()),
                LoadOutcome::DefaultsApplied { found } => println!(
                    "Stored version 0x{:02X} is stale, defaults applied (version {})",
                    found,
                    store.version()
                ),
            }
            println!("UID: {}", store.uid());
        }
        Command::Show => {
            println!("{}", serde_json::to_string_pretty(&store.calibration())?);
        }
        Command::SetLimits { limits } => {
            store.save_limits(&limits)?;
            info!("Limits saved");
        }
        Command::AdjustLimits { limits } => {
            store.adjust_limits(&limits)?;
            info!("Limits adjusted");
        }
        Command::SetHome { home } => {
            store.save_home(&home)?;
            info!("Home positions saved");
        }
        Command::SetPid { motor, kp, ki, kd } => {
            let mut pid = store.pid().to_vec();
            let count = pid.len();
            let gains = pid
                .get_mut(motor)
                .ok_or_else(|| format!("Motor {} out of range (0..{})", motor, count))?;
            *gains = PidGains::new(kp, ki, kd);
            store.save_pid(&pid)?;
            info!("PID gains saved for motor {}", motor);
        }
        Command::SetUid { uid } => {
            store.set_uid(uid)?;
        }
        Command::Reset => {
            // A stale image was just rewritten with defaults by load_all
            if outcome == LoadOutcome::Loaded {
                store.reset(&mut uids)?;
            }
            println!("UID: {}", store.uid());
        }
    }

    Ok(())
}

fn print_layout(layout: Layout) {
    println!("Motors: {}", layout.motor_count());
    for (field, range) in layout.fields() {
        println!(
            "{:<8} offset {:>5}  length {:>5}",
            field.name(),
            range.start,
            range.len()
        );
    }
    println!("Total: {} bytes", layout.end());
}
