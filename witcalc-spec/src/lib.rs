//! # Witness Calculator Protocol
//!
//! VM-independent half of the host/guest protocol spoken with compiled
//! circuit modules.
//!
//! ## Key Pieces
//! - Field parameters derived from the guest prime (Montgomery radix, short
//!   form bounds)
//! - Three-form wire encoding of field elements (short positive, short
//!   negative, long with optional Montgomery flag)
//! - Bounds-checked access to guest linear memory
//! - FNV-1a signal name hashing
//! - JSON input parsing and depth-first flattening
//! - Witness JSON rendering

pub mod error;
pub mod memory;
pub mod field;
pub mod encoding;
pub mod hash;
pub mod input;
pub mod witness;

pub use error::{Result, SpecError};
pub use field::{FieldParams, SHORT_MAX};
pub use encoding::{load_element, load_raw, store_element, WireElement};
pub use hash::{fnv_hash, SignalHash};
pub use input::{parse_inputs, parse_integer, Input, InputValue};
pub use witness::{decode_binary_witness, witness_to_json, WitnessJson};

/// Bytes reserved for a plain 32-bit result slot
pub const INT_SLOT_SIZE: u32 = 8;

/// Component index of the top-level circuit
pub const MAIN_COMPONENT: u32 = 0;
