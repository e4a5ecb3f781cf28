//! In-process stand-in for a compiled multiplier circuit
//!
//! `MockMultiplier` implements the full export contract over a plain byte
//! vector. It models `out <== a * b` with witness layout `[1, out, a, b]`,
//! keeps its signals in Montgomery long form, and under sanity checking
//! reports a conflicting reassignment through the host `error` import.

use num_bigint::BigUint;
use witcalc_spec::encoding::WireElement;
use witcalc_spec::memory;
use witcalc_spec::{load_element, FieldParams, SignalHash};

use crate::alloc;
use crate::error::{Result, RuntimeError};
use crate::guest::{exports, CircuitGuest};
use crate::imports::{render_error, ErrorCall, HostImports, TracingImports, ERROR_ASSERT_EQ};

pub const BN254_PRIME: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

const MEMORY_SIZE: usize = 2048;
const HEAP_START: u32 = 1024;
const PRIME_PTR: u32 = 64;
const MSG_PTR: u32 = 128;
const NAME_A_PTR: u32 = 192;
const NAME_B_PTR: u32 = 208;
const SIGNALS_PTR: u32 = 256;
const BUFFER_PTR: u32 = 512;
const N8: usize = 32;
const N_VARS: u32 = 4;

const SIGNAL_ONE: u32 = 0;
const SIGNAL_OUT: u32 = 1;
const SIGNAL_A: u32 = 2;
const SIGNAL_B: u32 = 3;

/// Mock circuit computing `out = a * b`
pub struct MockMultiplier {
    memory: Vec<u8>,
    field: FieldParams,
    fr_len: u32,
    reported_n_vars: u32,
    sanity_check: bool,
    assigned: [bool; N_VARS as usize],
    imports: Box<dyn HostImports>,
    init_calls: usize,
}

impl std::fmt::Debug for MockMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMultiplier")
            .field("fr_len", &self.fr_len)
            .field("sanity_check", &self.sanity_check)
            .field("assigned", &self.assigned)
            .field("init_calls", &self.init_calls)
            .finish_non_exhaustive()
    }
}

impl Default for MockMultiplier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMultiplier {
    pub fn new() -> Self {
        Self::with_imports(TracingImports::default())
    }

    pub fn with_imports(imports: impl HostImports + 'static) -> Self {
        let prime: BigUint = BN254_PRIME.parse().expect("valid prime literal");
        let field = FieldParams::new(prime, N8).expect("valid BN254 parameters");

        let mut memory = vec![0u8; MEMORY_SIZE];
        memory[0..4].copy_from_slice(&HEAP_START.to_le_bytes());
        let prime_bytes = field.prime().to_bytes_le();
        let p = PRIME_PTR as usize;
        memory[p..p + prime_bytes.len()].copy_from_slice(&prime_bytes);
        write_c_str(&mut memory, MSG_PTR, "Signal assigned twice:");
        write_c_str(&mut memory, NAME_A_PTR, "main.a");
        write_c_str(&mut memory, NAME_B_PTR, "main.b");

        Self {
            memory,
            field,
            fr_len: (N8 + 8) as u32,
            reported_n_vars: N_VARS,
            sanity_check: false,
            assigned: [false; N_VARS as usize],
            imports: Box::new(imports),
            init_calls: 0,
        }
    }

    /// Report a different element length from `getFrLen`
    pub fn with_fr_len(mut self, fr_len: u32) -> Self {
        self.fr_len = fr_len;
        self
    }

    /// Report a different witness length from `getNVars`
    pub fn with_n_vars(mut self, n_vars: u32) -> Self {
        self.reported_n_vars = n_vars;
        self
    }

    /// Overwrite the raw prime the guest reports
    pub fn with_raw_prime(mut self, prime: &BigUint) -> Self {
        let p = PRIME_PTR as usize;
        self.memory[p..p + N8].fill(0);
        let bytes = prime.to_bytes_le();
        let len = bytes.len().min(N8);
        self.memory[p..p + len].copy_from_slice(&bytes[..len]);
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls
    }

    /// Current allocator cursor
    pub fn free_pos(&self) -> u32 {
        alloc::free_pos(&self.memory).unwrap_or_default()
    }

    fn slot(signal: u32) -> u32 {
        SIGNALS_PTR + signal * (N8 as u32 + 8)
    }

    fn write_signal(&mut self, signal: u32, value: &BigUint) -> Result<()> {
        let wire = WireElement::LongNormal {
            raw: self.field.to_montgomery(value),
            montgomery: true,
        };
        wire.store(&mut self.memory, Self::slot(signal), N8)?;
        Ok(())
    }

    fn read_signal(&self, signal: u32) -> Result<BigUint> {
        Ok(load_element(&self.memory, Self::slot(signal), &self.field)?)
    }

    fn lookup(hash: SignalHash) -> Option<u32> {
        if hash == SignalHash::of("a") {
            Some(SIGNAL_A)
        } else if hash == SignalHash::of("b") {
            Some(SIGNAL_B)
        } else {
            None
        }
    }
}

fn write_c_str(mem: &mut [u8], ptr: u32, text: &str) {
    let start = ptr as usize;
    mem[start..start + text.len()].copy_from_slice(text.as_bytes());
    mem[start + text.len()] = 0;
}

fn guest_error(export: &'static str, message: &str) -> RuntimeError {
    RuntimeError::GuestCall {
        export,
        message: message.to_string(),
    }
}

impl CircuitGuest for MockMultiplier {
    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn get_fr_len(&mut self) -> Result<u32> {
        Ok(self.fr_len)
    }

    fn get_p_raw_prime(&mut self) -> Result<u32> {
        Ok(PRIME_PTR)
    }

    fn get_n_vars(&mut self) -> Result<u32> {
        Ok(self.reported_n_vars)
    }

    fn init(&mut self, sanity_check: bool) -> Result<()> {
        self.init_calls += 1;
        self.sanity_check = sanity_check;
        self.assigned = [false; N_VARS as usize];

        let start = SIGNALS_PTR as usize;
        let end = Self::slot(N_VARS) as usize;
        self.memory[start..end].fill(0);
        self.write_signal(SIGNAL_ONE, &BigUint::from(1u32))?;

        self.imports.log_start_component(0);
        Ok(())
    }

    fn get_signal_offset32(&mut self, result_ptr: u32, component: u32, hash: SignalHash) -> Result<()> {
        if component != 0 {
            return Err(guest_error(exports::GET_SIGNAL_OFFSET32, "unknown component"));
        }
        let offset = Self::lookup(hash)
            .ok_or_else(|| guest_error(exports::GET_SIGNAL_OFFSET32, "signal not found"))?;
        memory::write_u32(&mut self.memory, result_ptr, offset)?;
        Ok(())
    }

    fn set_signal(&mut self, _component: u32, _sub_component: u32, signal: u32, value_ptr: u32) -> Result<()> {
        if signal != SIGNAL_A && signal != SIGNAL_B {
            return Err(guest_error(exports::SET_SIGNAL, "signal is not an input"));
        }
        let value = load_element(&self.memory, value_ptr, &self.field)?;

        if self.sanity_check && self.assigned[signal as usize] && self.read_signal(signal)? != value {
            let name_ptr = if signal == SIGNAL_A { NAME_A_PTR } else { NAME_B_PTR };
            let report = render_error(
                &self.memory,
                Some(&self.field),
                ErrorCall {
                    code: ERROR_ASSERT_EQ,
                    str_ptr: MSG_PTR,
                    a: 0,
                    b: Self::slot(signal),
                    c: value_ptr,
                    d: name_ptr,
                },
            );
            self.imports.error(&report);
            return Err(RuntimeError::GuestAssertion(report));
        }

        self.write_signal(signal, &value)?;
        self.assigned[signal as usize] = true;
        self.imports.log_set_signal(signal, Self::slot(signal));

        if self.assigned[SIGNAL_A as usize] && self.assigned[SIGNAL_B as usize] {
            let out = (self.read_signal(SIGNAL_A)? * self.read_signal(SIGNAL_B)?) % self.field.prime();
            self.write_signal(SIGNAL_OUT, &out)?;
            self.imports.log_finish_component(0);
        }
        Ok(())
    }

    fn get_p_witness(&mut self, index: u32) -> Result<u32> {
        if index >= N_VARS {
            return Err(guest_error(exports::GET_P_WITNESS, "index out of range"));
        }
        Ok(Self::slot(index))
    }

    fn get_witness_buffer(&mut self) -> Result<u32> {
        let width = self.field.n64() * 8;
        for i in 0..N_VARS {
            let value = self.read_signal(i)?;
            let bytes = value.to_bytes_le();
            let at = BUFFER_PTR + i * width as u32;
            let out = memory::slice_mut(&mut self.memory, at, width)?;
            out.fill(0);
            out[..bytes.len()].copy_from_slice(&bytes);
        }
        Ok(BUFFER_PTR)
    }
}
