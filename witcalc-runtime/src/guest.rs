//! Guest module seam
//!
//! The calculator only needs a byte-addressable linear memory and the eight
//! exports below. `WasmiGuest` provides them for real compiled circuits;
//! anything else implementing [`CircuitGuest`] can stand in.

use witcalc_spec::{FieldParams, SignalHash};

use crate::error::Result;

/// Export names of the compiled circuit contract
pub mod exports {
    pub const GET_FR_LEN: &str = "getFrLen";
    pub const GET_P_RAW_PRIME: &str = "getPRawPrime";
    pub const GET_N_VARS: &str = "getNVars";
    pub const INIT: &str = "init";
    pub const GET_SIGNAL_OFFSET32: &str = "getSignalOffset32";
    pub const SET_SIGNAL: &str = "setSignal";
    pub const GET_P_WITNESS: &str = "getPWitness";
    pub const GET_WITNESS_BUFFER: &str = "getWitnessBuffer";

    pub const ALL: [&str; 8] = [
        GET_FR_LEN,
        GET_P_RAW_PRIME,
        GET_N_VARS,
        INIT,
        GET_SIGNAL_OFFSET32,
        SET_SIGNAL,
        GET_P_WITNESS,
        GET_WITNESS_BUFFER,
    ];
}

/// A loaded circuit module
///
/// Every call is synchronous and runs to completion. Implementations own
/// their memory exclusively; nothing here is safe to call concurrently on
/// one instance, which `&mut self` enforces.
pub trait CircuitGuest {
    /// Current linear memory
    fn memory(&self) -> &[u8];

    /// Current linear memory, writable
    fn memory_mut(&mut self) -> &mut [u8];

    /// Wire element length including the 8-byte header
    fn get_fr_len(&mut self) -> Result<u32>;

    /// Pointer to the raw little-endian prime
    fn get_p_raw_prime(&mut self) -> Result<u32>;

    /// Witness length
    fn get_n_vars(&mut self) -> Result<u32>;

    /// Reset guest state before a calculation
    fn init(&mut self, sanity_check: bool) -> Result<()>;

    /// Resolve a signal name hash, writing its offset at `result_ptr`
    fn get_signal_offset32(&mut self, result_ptr: u32, component: u32, hash: SignalHash) -> Result<()>;

    /// Assign the element at `value_ptr` to `signal`
    fn set_signal(&mut self, component: u32, sub_component: u32, signal: u32, value_ptr: u32) -> Result<()>;

    /// Pointer to witness element `index`
    fn get_p_witness(&mut self, index: u32) -> Result<u32>;

    /// Pointer to the contiguous binary witness
    fn get_witness_buffer(&mut self) -> Result<u32>;

    /// Receive the field parameters once they are known
    ///
    /// Host imports need them to render field values in error reports.
    fn attach_field(&mut self, _field: &FieldParams) {}
}
