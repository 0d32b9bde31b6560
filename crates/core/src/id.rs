use albar_types::error::{Error, Result};
use idgenerator::{IdGeneratorOptions, IdInstance};

/// Custom epoch for Snowflake IDs: 2024-01-01T00:00:00Z (in milliseconds)
const CUSTOM_EPOCH: i64 = 1_704_067_200_000;

/// Worker ID bit length (10 bits = 1024 workers)
const WORKER_ID_BIT_LEN: u8 = 10;

/// Process-wide Snowflake ID generator
///
/// Initialized once at startup with the instance's worker ID; every entity
/// ID in the system comes from [`IdGenerator::next_id`]. Re-initialization
/// fails, which tests ignore (`let _ = IdGenerator::init(n);`).
pub struct IdGenerator;

impl IdGenerator {
    /// Initialize the generator with a worker ID
    pub fn init(worker_id: u16) -> Result<()> {
        let options = IdGeneratorOptions::new()
            .worker_id(u32::from(worker_id))
            .worker_id_bit_len(WORKER_ID_BIT_LEN)
            .base_time(CUSTOM_EPOCH);
        IdInstance::init(options)
            .map_err(|e| Error::config(format!("Failed to initialize ID generator: {e:?}")))
    }

    /// Generate the next Snowflake ID
    pub fn next_id() -> i64 {
        IdInstance::next_id()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_positive_and_increasing() {
        let _ = IdGenerator::init(1);

        let a = IdGenerator::next_id();
        let b = IdGenerator::next_id();
        assert!(a > 0);
        assert!(b > a);
    }
}
