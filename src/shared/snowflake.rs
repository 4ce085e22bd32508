//! Snowflake ID Generator
//!
//! Twitter-style unique ID generation for posts, comments and notifications.
//!
//! Layout (most significant first): 41 bits of milliseconds since the
//! configured epoch, 10 bits of machine id, 12 bits of sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Default epoch (2020-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1577836800000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Highest accepted machine id
pub const MAX_MACHINE_ID: u16 = MACHINE_MASK as u16;

/// Snowflake ID generator
///
/// The last issued `(timestamp, sequence)` pair is packed into one atomic
/// word and advanced with compare-and-swap, so ids from one generator are
/// strictly increasing even under concurrent callers.
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u16, epoch: u64) -> Self {
        Self {
            machine_id: u64::from(machine_id) & MACHINE_MASK,
            epoch,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let last_ts = current >> SEQUENCE_BITS;
            let last_seq = current & SEQUENCE_MASK;

            let now = self.elapsed_millis().max(last_ts);
            let (ts, seq) = if now == last_ts {
                if last_seq == SEQUENCE_MASK {
                    // Sequence exhausted for this millisecond
                    std::hint::spin_loop();
                    continue;
                }
                (now, last_seq + 1)
            } else {
                (now, 0)
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            if self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let id = (ts << (MACHINE_BITS + SEQUENCE_BITS))
                    | (self.machine_id << SEQUENCE_BITS)
                    | seq;
                return id as i64;
            }
        }
    }

    /// Epoch this generator counts from, in Unix milliseconds
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn elapsed_millis(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        now.saturating_sub(self.epoch)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH)
    }
}

/// Extract the Unix millisecond timestamp from a snowflake ID
pub fn extract_timestamp(snowflake: i64, epoch: u64) -> u64 {
    ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + epoch
}

/// Extract the machine id from a snowflake ID
pub fn extract_machine_id(snowflake: i64) -> u16 {
    (((snowflake as u64) >> SEQUENCE_BITS) & MACHINE_MASK) as u16
}
