// Device UID sources
//
// A UID of 0 means "unassigned" to the host tools, so no source hands it out.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// UID value reserved for "not assigned yet"
pub const UNASSIGNED_UID: u32 = 0;

/// Supplies a fresh 32-bit device identifier
pub trait UidSource {
    fn generate_uid(&mut self) -> u32;
}

/// Random UIDs from an entropy-seeded (or fixed-seed) RNG
pub struct RandomUid {
    rng: StdRng,
}

impl RandomUid {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence, for tests and reproducible images
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomUid {
    fn default() -> Self {
        Self::new()
    }
}

impl UidSource for RandomUid {
    fn generate_uid(&mut self) -> u32 {
        loop {
            let uid = self.rng.next_u32();
            if uid != UNASSIGNED_UID {
                return uid;
            }
        }
    }
}

/// Always returns the same UID (e.g. one handed out by a registration server)
#[derive(Debug, Clone, Copy)]
pub struct FixedUid(pub u32);

impl UidSource for FixedUid {
    fn generate_uid(&mut self) -> u32 {
        self.0
    }
}
