//! `wasmi`-backed circuit guest
//!
//! Loads a compiled circuit module, links the host imports under the
//! configured namespace, and resolves every export of the contract up front
//! so a module missing one fails at load time rather than mid-calculation.

use wasmi::{
    Caller, Engine, Extern, Instance, Linker, Memory, Module, Store, TypedFunc, WasmParams,
    WasmResults,
};
use witcalc_spec::{FieldParams, SignalHash};

use crate::error::{Result, RuntimeError};
use crate::guest::{exports, CircuitGuest};
use crate::imports::{self, ErrorCall, GuestErrorReport, HostImports, TracingImports};

/// Guest loading configuration
#[derive(Debug, Clone)]
pub struct GuestConfig {
    /// Module name the host imports are registered under
    pub import_namespace: String,

    /// Name of the exported linear memory
    pub memory_export: String,

    /// Emit trace events from the guest's tracing hooks
    pub trace_imports: bool,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            import_namespace: "runtime".to_string(),
            memory_export: "memory".to_string(),
            trace_imports: false,
        }
    }
}

/// Host-side state reachable from import callbacks
pub struct HostState {
    imports: Box<dyn HostImports>,
    field: Option<FieldParams>,
    memory_export: String,
    /// Report from the last `error` import, consumed when the trap surfaces
    pending_error: Option<GuestErrorReport>,
}

impl std::fmt::Debug for HostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostState")
            .field("field", &self.field)
            .field("memory_export", &self.memory_export)
            .field("pending_error", &self.pending_error)
            .finish_non_exhaustive()
    }
}

struct Exports {
    get_fr_len: TypedFunc<(), i32>,
    get_p_raw_prime: TypedFunc<(), i32>,
    get_n_vars: TypedFunc<(), i32>,
    init: TypedFunc<i32, ()>,
    get_signal_offset32: TypedFunc<(i32, i32, i32, i32), ()>,
    set_signal: TypedFunc<(i32, i32, i32, i32), ()>,
    get_p_witness: TypedFunc<i32, i32>,
    get_witness_buffer: TypedFunc<(), i32>,
}

impl Exports {
    fn resolve(instance: &Instance, store: &Store<HostState>) -> Result<Self> {
        Ok(Self {
            get_fr_len: typed(instance, store, exports::GET_FR_LEN)?,
            get_p_raw_prime: typed(instance, store, exports::GET_P_RAW_PRIME)?,
            get_n_vars: typed(instance, store, exports::GET_N_VARS)?,
            init: typed(instance, store, exports::INIT)?,
            get_signal_offset32: typed(instance, store, exports::GET_SIGNAL_OFFSET32)?,
            set_signal: typed(instance, store, exports::SET_SIGNAL)?,
            get_p_witness: typed(instance, store, exports::GET_P_WITNESS)?,
            get_witness_buffer: typed(instance, store, exports::GET_WITNESS_BUFFER)?,
        })
    }
}

fn typed<P: WasmParams, R: WasmResults>(
    instance: &Instance,
    store: &Store<HostState>,
    name: &str,
) -> Result<TypedFunc<P, R>> {
    instance
        .get_typed_func::<P, R>(store, name)
        .map_err(|e| RuntimeError::ModuleContract(format!("export `{name}`: {e}")))
}

/// A compiled circuit instantiated in `wasmi`
pub struct WasmiGuest {
    store: Store<HostState>,
    memory: Memory,
    exports: Exports,
}

impl std::fmt::Debug for WasmiGuest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmiGuest")
            .field("state", self.store.data())
            .field("memory_size", &self.memory.data(&self.store).len())
            .finish_non_exhaustive()
    }
}

impl WasmiGuest {
    /// Load a module with the default configuration and tracing imports
    pub fn new(wasm: &[u8]) -> Result<Self> {
        Self::with_config(wasm, GuestConfig::default())
    }

    /// Load a module with the default import sink
    pub fn with_config(wasm: &[u8], config: GuestConfig) -> Result<Self> {
        let imports = TracingImports::new(config.trace_imports);
        Self::with_imports(wasm, config, imports)
    }

    /// Load a module, routing guest-to-host calls to `imports`
    pub fn with_imports(
        wasm: &[u8],
        config: GuestConfig,
        imports: impl HostImports + 'static,
    ) -> Result<Self> {
        let engine = Engine::default();
        let module = Module::new(&engine, wasm)
            .map_err(|e| RuntimeError::ModuleContract(format!("invalid module: {e}")))?;

        let state = HostState {
            imports: Box::new(imports),
            field: None,
            memory_export: config.memory_export.clone(),
            pending_error: None,
        };
        let mut store = Store::new(&engine, state);

        let mut linker = Linker::new(&engine);
        define_imports(&mut linker, &config.import_namespace)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .and_then(|pre| pre.start(&mut store))
            .map_err(|e| RuntimeError::ModuleContract(format!("instantiation failed: {e}")))?;

        let memory = instance
            .get_memory(&store, &config.memory_export)
            .ok_or_else(|| {
                RuntimeError::ModuleContract(format!(
                    "missing memory export `{}`",
                    config.memory_export
                ))
            })?;
        let exports = Exports::resolve(&instance, &store)?;

        tracing::debug!(
            memory_size = memory.data(&store).len(),
            "circuit module instantiated"
        );

        Ok(Self {
            store,
            memory,
            exports,
        })
    }
}

/// Call an export, preferring a report left by the guest's `error` import
/// over the bare trap when the call fails
fn invoke<P: WasmParams, R: WasmResults>(
    store: &mut Store<HostState>,
    export: &'static str,
    func: &TypedFunc<P, R>,
    params: P,
) -> Result<R> {
    store.data_mut().pending_error = None;
    func.call(&mut *store, params)
        .map_err(|e| match store.data_mut().pending_error.take() {
            Some(report) => RuntimeError::GuestAssertion(report),
            None => RuntimeError::GuestCall {
                export,
                message: e.to_string(),
            },
        })
}

impl CircuitGuest for WasmiGuest {
    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn get_fr_len(&mut self) -> Result<u32> {
        let f = &self.exports.get_fr_len;
        Ok(invoke(&mut self.store, exports::GET_FR_LEN, f, ())? as u32)
    }

    fn get_p_raw_prime(&mut self) -> Result<u32> {
        let f = &self.exports.get_p_raw_prime;
        Ok(invoke(&mut self.store, exports::GET_P_RAW_PRIME, f, ())? as u32)
    }

    fn get_n_vars(&mut self) -> Result<u32> {
        let f = &self.exports.get_n_vars;
        Ok(invoke(&mut self.store, exports::GET_N_VARS, f, ())? as u32)
    }

    fn init(&mut self, sanity_check: bool) -> Result<()> {
        let f = &self.exports.init;
        invoke(&mut self.store, exports::INIT, f, i32::from(sanity_check))
    }

    fn get_signal_offset32(&mut self, result_ptr: u32, component: u32, hash: SignalHash) -> Result<()> {
        let f = &self.exports.get_signal_offset32;
        let params = (
            result_ptr as i32,
            component as i32,
            hash.msb as i32,
            hash.lsb as i32,
        );
        invoke(&mut self.store, exports::GET_SIGNAL_OFFSET32, f, params)
    }

    fn set_signal(&mut self, component: u32, sub_component: u32, signal: u32, value_ptr: u32) -> Result<()> {
        let f = &self.exports.set_signal;
        let params = (
            component as i32,
            sub_component as i32,
            signal as i32,
            value_ptr as i32,
        );
        invoke(&mut self.store, exports::SET_SIGNAL, f, params)
    }

    fn get_p_witness(&mut self, index: u32) -> Result<u32> {
        let f = &self.exports.get_p_witness;
        Ok(invoke(&mut self.store, exports::GET_P_WITNESS, f, index as i32)? as u32)
    }

    fn get_witness_buffer(&mut self) -> Result<u32> {
        let f = &self.exports.get_witness_buffer;
        Ok(invoke(&mut self.store, exports::GET_WITNESS_BUFFER, f, ())? as u32)
    }

    fn attach_field(&mut self, field: &FieldParams) {
        self.store.data_mut().field = Some(field.clone());
    }
}

fn caller_memory(caller: &Caller<'_, HostState>) -> std::result::Result<Memory, wasmi::Error> {
    let name = caller.data().memory_export.clone();
    caller
        .get_export(&name)
        .and_then(Extern::into_memory)
        .ok_or_else(|| wasmi::Error::new(format!("missing memory export `{name}`")))
}

fn link_error(name: &str, e: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::ModuleContract(format!("cannot define import `{name}`: {e}"))
}

/// Register the six host imports under `namespace`
fn define_imports(linker: &mut Linker<HostState>, namespace: &str) -> Result<()> {
    linker
        .func_wrap(
            namespace,
            imports::ERROR,
            |mut caller: Caller<'_, HostState>,
             code: i32,
             str_ptr: i32,
             a: i32,
             b: i32,
             c: i32,
             d: i32|
             -> std::result::Result<(), wasmi::Error> {
                let call = ErrorCall {
                    code: code as u32,
                    str_ptr: str_ptr as u32,
                    a: a as u32,
                    b: b as u32,
                    c: c as u32,
                    d: d as u32,
                };
                let memory = caller_memory(&caller)?;
                let report = imports::render_error(
                    memory.data(&caller),
                    caller.data().field.as_ref(),
                    call,
                );
                let message = report.to_string();
                let state = caller.data_mut();
                state.imports.error(&report);
                state.pending_error = Some(report);
                Err(wasmi::Error::new(message))
            },
        )
        .map_err(|e| link_error(imports::ERROR, e))?;

    linker
        .func_wrap(
            namespace,
            imports::LOG_SET_SIGNAL,
            |mut caller: Caller<'_, HostState>, signal: i32, value_ptr: i32| {
                caller
                    .data_mut()
                    .imports
                    .log_set_signal(signal as u32, value_ptr as u32);
            },
        )
        .map_err(|e| link_error(imports::LOG_SET_SIGNAL, e))?;

    linker
        .func_wrap(
            namespace,
            imports::LOG_GET_SIGNAL,
            |mut caller: Caller<'_, HostState>, signal: i32, value_ptr: i32| {
                caller
                    .data_mut()
                    .imports
                    .log_get_signal(signal as u32, value_ptr as u32);
            },
        )
        .map_err(|e| link_error(imports::LOG_GET_SIGNAL, e))?;

    linker
        .func_wrap(
            namespace,
            imports::LOG_START_COMPONENT,
            |mut caller: Caller<'_, HostState>, component: i32| {
                caller
                    .data_mut()
                    .imports
                    .log_start_component(component as u32);
            },
        )
        .map_err(|e| link_error(imports::LOG_START_COMPONENT, e))?;

    linker
        .func_wrap(
            namespace,
            imports::LOG_FINISH_COMPONENT,
            |mut caller: Caller<'_, HostState>, component: i32| {
                caller
                    .data_mut()
                    .imports
                    .log_finish_component(component as u32);
            },
        )
        .map_err(|e| link_error(imports::LOG_FINISH_COMPONENT, e))?;

    linker
        .func_wrap(
            namespace,
            imports::LOG,
            |mut caller: Caller<'_, HostState>, value: i32| {
                caller.data_mut().imports.log(value as u32);
            },
        )
        .map_err(|e| link_error(imports::LOG, e))?;

    Ok(())
}
