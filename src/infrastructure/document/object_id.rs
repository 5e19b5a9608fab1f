//! 12-byte object ids rendered as 24 lowercase hex characters:
//! 4 bytes of big-endian unix seconds, 5 bytes fixed per generator, and a
//! 3-byte wrapping counter.

use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct ObjectIdGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let seed = uuid::Uuid::new_v4();
        let bytes = seed.as_bytes();
        let mut process = [0u8; 5];
        process.copy_from_slice(&bytes[..5]);
        let start = u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]);
        Self {
            process,
            counter: AtomicU32::new(start),
        }
    }

    pub fn next_id(&self) -> String {
        let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut raw = [0u8; 12];
        raw[..4].copy_from_slice(&secs.to_be_bytes());
        raw[4..9].copy_from_slice(&self.process);
        raw[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        raw.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_24_hex_and_unique() {
        let generator = ObjectIdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
        for id in &ids {
            assert_eq!(id.len(), 24);
            assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }
}
