//! Witness calculator facade
//!
//! Lifecycle of one calculator:
//!
//! ```text
//! new(guest) --probe exports--> Ready --calculate--> Calculating --> Ready
//! ```
//!
//! Every calculation snapshots the guest allocator cursor, calls `init`,
//! reserves one 8-byte result slot and one element slot, assigns each input
//! signal in order, extracts the witness, then rewrites the snapshot. The
//! snapshot is restored on failure too, so repeated calculations never leak
//! guest memory.

use num_bigint::BigUint;
use witcalc_spec::encoding::HEADER_SIZE;
use witcalc_spec::memory;
use witcalc_spec::{
    load_element, load_raw, store_element, FieldParams, Input, SignalHash, INT_SLOT_SIZE,
    MAIN_COMPONENT,
};

use crate::alloc;
use crate::error::{Result, RuntimeError};
use crate::guest::CircuitGuest;
use crate::wasm::{GuestConfig, WasmiGuest};
use crate::imports::HostImports;

/// Drives a compiled circuit to produce witnesses
#[derive(Debug)]
pub struct WitnessCalculator<G: CircuitGuest = WasmiGuest> {
    guest: G,
    field: FieldParams,
    n_vars: u32,
}

impl WitnessCalculator<WasmiGuest> {
    /// Load a compiled circuit module with default settings
    pub fn from_module(wasm: &[u8]) -> Result<Self> {
        Self::new(WasmiGuest::new(wasm)?)
    }

    /// Load a compiled circuit module with custom configuration and imports
    pub fn from_module_with(
        wasm: &[u8],
        config: GuestConfig,
        imports: impl HostImports + 'static,
    ) -> Result<Self> {
        Self::new(WasmiGuest::with_imports(wasm, config, imports)?)
    }
}

impl<G: CircuitGuest> WitnessCalculator<G> {
    /// Probe the guest for its field and witness size
    ///
    /// Any failure here means the module does not satisfy the contract.
    pub fn new(mut guest: G) -> Result<Self> {
        let fr_len = guest.get_fr_len().map_err(RuntimeError::into_contract)?;
        let n8 = (fr_len as usize).checked_sub(HEADER_SIZE).filter(|n| *n > 0).ok_or_else(|| {
            RuntimeError::ModuleContract(format!("element length {fr_len} leaves no payload"))
        })?;

        let p_prime = guest.get_p_raw_prime().map_err(RuntimeError::into_contract)?;
        let prime = load_raw(guest.memory(), p_prime, n8)
            .map_err(|e| RuntimeError::from(e).into_contract())?;
        let field = FieldParams::new(prime, n8).map_err(|e| RuntimeError::from(e).into_contract())?;

        let n_vars = guest.get_n_vars().map_err(RuntimeError::into_contract)?;
        // the binary witness must fit in guest memory, which bounds the count
        let witness_bytes = (n_vars as usize)
            .checked_mul(field.n64() * 8)
            .filter(|len| *len <= guest.memory().len());
        if witness_bytes.is_none() {
            return Err(RuntimeError::ModuleContract(format!(
                "witness length {n_vars} does not fit in {} bytes of guest memory",
                guest.memory().len()
            )));
        }
        guest.attach_field(&field);

        tracing::debug!(
            n8 = field.n8(),
            n64 = field.n64(),
            n_vars,
            prime = %field.prime(),
            "witness calculator ready"
        );

        Ok(Self {
            guest,
            field,
            n_vars,
        })
    }

    /// Field parameters reported by the guest
    pub fn field(&self) -> &FieldParams {
        &self.field
    }

    /// Witness length
    pub fn n_vars(&self) -> u32 {
        self.n_vars
    }

    pub fn guest(&self) -> &G {
        &self.guest
    }

    pub fn guest_mut(&mut self) -> &mut G {
        &mut self.guest
    }

    /// Compute the witness as field elements
    pub fn calculate_witness(&mut self, inputs: &[Input], sanity_check: bool) -> Result<Vec<BigUint>> {
        let _span = tracing::debug_span!("calculate_witness", inputs = inputs.len()).entered();
        self.with_scratch(|calc| {
            calc.assign_inputs(inputs, sanity_check)?;

            (0..calc.n_vars)
                .map(|i| -> Result<BigUint> {
                    let ptr = calc.guest.get_p_witness(i)?;
                    Ok(load_element(calc.guest.memory(), ptr, &calc.field)?)
                })
                .collect()
        })
    }

    /// Compute the witness as the guest's raw binary buffer
    ///
    /// The buffer holds `n_vars * n64` little-endian 64-bit words, copied
    /// as-is in whatever domain the guest uses.
    pub fn calculate_binary_witness(&mut self, inputs: &[Input], sanity_check: bool) -> Result<Vec<u8>> {
        let _span =
            tracing::debug_span!("calculate_binary_witness", inputs = inputs.len()).entered();
        self.with_scratch(|calc| {
            calc.assign_inputs(inputs, sanity_check)?;

            let ptr = calc.guest.get_witness_buffer()?;
            let len = calc.n_vars as usize * calc.field.n64() * 8;
            Ok(memory::slice(calc.guest.memory(), ptr, len)?.to_vec())
        })
    }

    /// Run `f` between an allocator snapshot and its restore
    fn with_scratch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = alloc::free_pos(self.guest.memory())?;
        let result = f(self);
        let restored = alloc::set_free_pos(self.guest.memory_mut(), snapshot);

        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
        }
    }

    fn assign_inputs(&mut self, inputs: &[Input], sanity_check: bool) -> Result<()> {
        self.guest.init(sanity_check)?;

        let p_sig_offset = alloc::reserve(self.guest.memory_mut(), INT_SLOT_SIZE)?;
        let p_fr = alloc::reserve(
            self.guest.memory_mut(),
            alloc::element_slot_size(self.field.n8()),
        )?;

        for input in inputs {
            let hash = SignalHash::of(&input.name);
            self.guest
                .get_signal_offset32(p_sig_offset, MAIN_COMPONENT, hash)?;
            let sig_offset = memory::read_u32(self.guest.memory(), p_sig_offset)?;

            let values = input.value.flatten();
            tracing::trace!(
                name = %input.name,
                sig_offset,
                len = values.len(),
                "assigning input"
            );

            for (i, value) in values.iter().enumerate() {
                let value = self.field.normalize(value);
                store_element(self.guest.memory_mut(), p_fr, &self.field, &value)?;

                let signal = u32::try_from(i)
                    .ok()
                    .and_then(|i| sig_offset.checked_add(i))
                    .ok_or_else(|| {
                        RuntimeError::ModuleContract(format!(
                            "signal index overflow for input `{}`",
                            input.name
                        ))
                    })?;
                self.guest
                    .set_signal(MAIN_COMPONENT, MAIN_COMPONENT, signal, p_fr)?;
            }
        }

        Ok(())
    }
}
