//! Signal name hashing
//!
//! Compiled circuits address top-level signals by the 64-bit FNV-1a hash of
//! their name (offset basis `0xcbf29ce484222325`), passed to the guest as two
//! 32-bit halves.

use fnv::FnvHasher;
use std::hash::Hasher;

/// FNV-1a 64-bit offset basis
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// Hash of a signal name, split the way the guest expects it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalHash {
    pub msb: u32,
    pub lsb: u32,
}

impl SignalHash {
    pub fn of(name: &str) -> Self {
        Self::from_u64(fnv_hash(name))
    }

    pub fn from_u64(hash: u64) -> Self {
        Self {
            msb: (hash >> 32) as u32,
            lsb: hash as u32,
        }
    }

    pub fn to_u64(self) -> u64 {
        ((self.msb as u64) << 32) | self.lsb as u64
    }
}

/// 64-bit FNV-1a over the UTF-8 bytes of `name`
pub fn fnv_hash(name: &str) -> u64 {
    let mut hasher = FnvHasher::with_key(FNV_OFFSET_BASIS);
    hasher.write(name.as_bytes());
    hasher.finish()
}
