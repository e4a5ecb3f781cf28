//! Witness rendering
//!
//! The JSON form is an array of base-10 strings with no whitespace:
//! `["1","33","3","11"]`. The binary form is whatever the guest lays out,
//! `n64` little-endian 64-bit words per element.

use num_bigint::BigUint;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{Result, SpecError};

/// Serializes a witness as a sequence of decimal strings
#[derive(Clone, Copy, Debug)]
pub struct WitnessJson<'a>(pub &'a [BigUint]);

impl Serialize for WitnessJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in self.0 {
            seq.serialize_element(&value.to_str_radix(10))?;
        }
        seq.end()
    }
}

/// Render a witness as compact JSON
pub fn witness_to_json(witness: &[BigUint]) -> Result<String> {
    Ok(serde_json::to_string(&WitnessJson(witness))?)
}

/// Split a binary witness into elements of `n64` little-endian words
///
/// No domain conversion is applied; this is only meaningful when the guest
/// wrote its buffer in plain form.
pub fn decode_binary_witness(bytes: &[u8], n64: usize) -> Result<Vec<BigUint>> {
    let width = n64 * 8;
    if width == 0 || bytes.len() % width != 0 {
        return Err(SpecError::MalformedInput(format!(
            "binary witness of {} bytes is not a multiple of {width}",
            bytes.len()
        )));
    }
    Ok(bytes.chunks(width).map(BigUint::from_bytes_le).collect())
}
