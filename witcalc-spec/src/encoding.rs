//! # Field Element Wire Encoding
//!
//! Every field element in guest memory starts with an 8-byte header made of
//! two little-endian 32-bit words, optionally followed by an `n8`-byte
//! little-endian payload.
//!
//! ```text
//! Short positive: [value:32][0:32]                      0 <= value < 2^31
//! Short negative: [value - prime + 2^32:32][0:32]       2^31 <= word0 < 2^32
//! Long normal:    [0:32][0x80000000 | mont:32][payload:n8*8]
//! ```
//!
//! The long form's `0x40000000` bit marks a Montgomery-domain payload. The
//! host always writes plain long values; the guest may hand back either.
//! Short forms are told apart by the sign bit of word0.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{Result, SpecError};
use crate::field::{FieldParams, SHORT_MAX};
use crate::memory;

// ============================================================================
// Header Layout
// ============================================================================

/// Size of the element header in bytes
pub const HEADER_SIZE: usize = 8;

/// Offset of the long form payload from the element start
pub const PAYLOAD_OFFSET: u32 = HEADER_SIZE as u32;

/// Word1 flag: long form
pub const LONG_FLAG: u32 = 0x8000_0000;

/// Word1 flag: long form payload is in Montgomery domain
pub const MONTGOMERY_FLAG: u32 = 0x4000_0000;

/// Word0 flag: short form is negative
pub const SHORT_NEGATIVE_FLAG: u32 = 0x8000_0000;

// ============================================================================
// Wire Forms
// ============================================================================

/// One field element as laid out in guest memory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireElement {
    /// `value` itself, `0 <= value < 2^31`
    ShortPositive(u32),

    /// `value - prime + 2^32`, always in `[2^31, 2^32)`
    ShortNegative(u32),

    /// Full-width payload
    LongNormal { raw: BigUint, montgomery: bool },
}

impl WireElement {
    /// Choose the wire form for `value`
    ///
    /// `value` must already be reduced into `[0, prime)`.
    pub fn encode(field: &FieldParams, value: &BigUint) -> Result<Self> {
        if !field.contains(value) {
            return Err(SpecError::EncodingRange {
                value: value.to_string(),
                reason: "not below the field prime".to_string(),
            });
        }

        if value < field.short_max() {
            let v = value.to_u32().ok_or_else(|| short_range_error(value))?;
            Ok(WireElement::ShortPositive(v))
        } else if value >= field.short_min() {
            // value - (prime - 2^31) + 2^31
            let shifted = value - field.short_min() + field.short_max();
            let v = shifted.to_u32().ok_or_else(|| short_range_error(value))?;
            Ok(WireElement::ShortNegative(v))
        } else {
            Ok(WireElement::LongNormal {
                raw: value.clone(),
                montgomery: false,
            })
        }
    }

    /// Recover the field value this wire form represents
    pub fn decode(&self, field: &FieldParams) -> BigUint {
        match self {
            WireElement::ShortPositive(v) => BigUint::from(*v),
            WireElement::ShortNegative(v) => {
                // v - 2^31 + (prime - 2^31)
                BigUint::from(*v) + field.short_min() - field.short_max()
            }
            WireElement::LongNormal { raw, montgomery } => {
                if *montgomery {
                    field.from_montgomery(raw)
                } else {
                    raw.clone()
                }
            }
        }
    }

    /// Write this element at `offset`
    ///
    /// The long form zeroes the whole `n8`-byte payload before writing, so
    /// stale guest bytes never show up as high-order digits.
    pub fn store(&self, mem: &mut [u8], offset: u32, n8: usize) -> Result<()> {
        match self {
            WireElement::ShortPositive(v) => {
                if *v >= SHORT_MAX {
                    return Err(short_range_error(&BigUint::from(*v)));
                }
                store_header(mem, offset, *v, 0)
            }
            WireElement::ShortNegative(v) => {
                if *v < SHORT_MAX {
                    return Err(short_range_error(&BigUint::from(*v)));
                }
                store_header(mem, offset, *v, 0)
            }
            WireElement::LongNormal { raw, montgomery } => {
                let bytes = raw.to_bytes_le();
                if bytes.len() > n8 {
                    return Err(SpecError::EncodingRange {
                        value: raw.to_string(),
                        reason: format!("needs {} bytes, element width is {n8}", bytes.len()),
                    });
                }
                let payload_at = payload_offset(offset)?;
                let payload = memory::slice_mut(mem, payload_at, n8)?;
                payload.fill(0);
                payload[..bytes.len()].copy_from_slice(&bytes);

                let flags = if *montgomery {
                    LONG_FLAG | MONTGOMERY_FLAG
                } else {
                    LONG_FLAG
                };
                store_header(mem, offset, 0, flags)
            }
        }
    }

    /// Read the element at `offset`
    pub fn load(mem: &[u8], offset: u32, n8: usize) -> Result<Self> {
        let word0 = memory::read_u32(mem, offset)?;
        let word1 = memory::read_u32(mem, word1_offset(offset)?)?;

        if word1 & LONG_FLAG != 0 {
            let raw = memory::slice(mem, payload_offset(offset)?, n8)?;
            Ok(WireElement::LongNormal {
                raw: FieldParams::read_raw(raw),
                montgomery: word1 & MONTGOMERY_FLAG != 0,
            })
        } else if word0 & SHORT_NEGATIVE_FLAG != 0 {
            Ok(WireElement::ShortNegative(word0))
        } else {
            Ok(WireElement::ShortPositive(word0))
        }
    }
}

fn short_range_error(value: &BigUint) -> SpecError {
    SpecError::EncodingRange {
        value: value.to_string(),
        reason: "outside the short form range".to_string(),
    }
}

fn word1_offset(offset: u32) -> Result<u32> {
    offset.checked_add(4).ok_or(SpecError::OutOfBounds {
        offset: offset as usize,
        len: HEADER_SIZE,
        size: u32::MAX as usize,
    })
}

fn payload_offset(offset: u32) -> Result<u32> {
    offset.checked_add(PAYLOAD_OFFSET).ok_or(SpecError::OutOfBounds {
        offset: offset as usize,
        len: HEADER_SIZE,
        size: u32::MAX as usize,
    })
}

fn store_header(mem: &mut [u8], offset: u32, word0: u32, word1: u32) -> Result<()> {
    // Check the whole header first so a failed store writes nothing
    memory::slice(mem, offset, HEADER_SIZE)?;
    memory::write_u32(mem, offset, word0)?;
    memory::write_u32(mem, word1_offset(offset)?, word1)
}

// ============================================================================
// Value-Level Helpers
// ============================================================================

/// Encode `value` and write it at `offset`
pub fn store_element(mem: &mut [u8], offset: u32, field: &FieldParams, value: &BigUint) -> Result<()> {
    WireElement::encode(field, value)?.store(mem, offset, field.n8())
}

/// Read and decode the element at `offset`
pub fn load_element(mem: &[u8], offset: u32, field: &FieldParams) -> Result<BigUint> {
    Ok(WireElement::load(mem, offset, field.n8())?.decode(field))
}

/// Read `len` raw little-endian bytes at `offset` as an integer
///
/// Used for spans that carry no header, such as the guest's raw prime.
pub fn load_raw(mem: &[u8], offset: u32, len: usize) -> Result<BigUint> {
    Ok(FieldParams::read_raw(memory::slice(mem, offset, len)?))
}
