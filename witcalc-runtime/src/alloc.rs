//! Host-side emulation of the guest bump allocator
//!
//! The guest keeps its next free byte offset as a little-endian u32 at
//! offset 0 of linear memory. The host reserves scratch space by advancing
//! that cursor, and reclaims everything at once by writing back a snapshot
//! taken before the calculation. There is no per-allocation free.

use witcalc_spec::memory;
use witcalc_spec::SpecError;

use crate::error::Result;

/// Offset of the allocator cursor
pub const FREE_POS_OFFSET: u32 = 0;

/// Current cursor value
pub fn free_pos(mem: &[u8]) -> Result<u32> {
    Ok(memory::read_u32(mem, FREE_POS_OFFSET)?)
}

/// Overwrite the cursor
pub fn set_free_pos(mem: &mut [u8], pos: u32) -> Result<()> {
    Ok(memory::write_u32(mem, FREE_POS_OFFSET, pos)?)
}

/// Reserve `size` bytes and return their base offset
///
/// The reserved range must lie inside current memory.
pub fn reserve(mem: &mut [u8], size: u32) -> Result<u32> {
    let base = free_pos(mem)?;
    let end = base
        .checked_add(size)
        .filter(|end| *end as usize <= mem.len())
        .ok_or(SpecError::OutOfBounds {
            offset: base as usize,
            len: size as usize,
            size: mem.len(),
        })?;
    set_free_pos(mem, end)?;
    Ok(base)
}

/// Size of a field element scratch slot for an `n8`-byte payload
///
/// Matches the guest's own sizing, which over-reserves the payload.
pub fn element_slot_size(n8: usize) -> u32 {
    (n8 * 4 + 8) as u32
}
