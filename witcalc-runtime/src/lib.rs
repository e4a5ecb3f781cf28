//! # Witness Calculator Runtime
//!
//! Drive compiled circuit modules to compute witness vectors.
//!
//! The runtime loads a circuit's WebAssembly module with `wasmi`, probes its
//! field parameters, assigns named inputs through the guest's signal table,
//! and reads the resulting witness back out of guest memory.
//!
//! ## Features
//!
//! - **Guest seam**: any [`CircuitGuest`] can be driven, `WasmiGuest` by default
//! - **Host imports**: injectable [`HostImports`] sink for guest diagnostics
//! - **Memory hygiene**: the guest allocator cursor is restored after every
//!   calculation, successful or not
//! - **Two output forms**: decoded field elements or the raw binary buffer
//!
//! ## Example
//!
//! ```rust,no_run
//! use witcalc_runtime::WitnessCalculator;
//! use witcalc_spec::{parse_inputs, witness_to_json};
//!
//! let wasm = std::fs::read("circuit.wasm").unwrap();
//! let inputs = parse_inputs(r#"{"a": 3, "b": 11}"#).unwrap();
//! let mut calculator = WitnessCalculator::from_module(&wasm).unwrap();
//! let witness = calculator.calculate_witness(&inputs, false).unwrap();
//! println!("{}", witness_to_json(&witness).unwrap());
//! ```

pub mod error;
pub mod alloc;
pub mod guest;
pub mod imports;
pub mod wasm;
pub mod calculator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Result, RuntimeError};
pub use guest::CircuitGuest;
pub use imports::{GuestErrorReport, HostImports, ImportEvent, RecordingImports, TracingImports};
pub use wasm::{GuestConfig, WasmiGuest};
pub use calculator::WitnessCalculator;
