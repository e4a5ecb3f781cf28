//! Host functions the guest calls back into
//!
//! Compiled circuits import six functions from the host:
//! - `error(code, str, a, b, c, d)`: fatal diagnostic, renders a report and
//!   traps the running guest call
//! - `logSetSignal(signal, ptr)`, `logGetSignal(signal, ptr)`: signal tracing
//! - `logStartComponent(c)`, `logFinishComponent(c)`: component tracing
//! - `log(value)`: free-form value tracing
//!
//! The sink for these is a [`HostImports`] implementation injected when the
//! module is loaded.

use std::fmt;
use std::sync::{Arc, Mutex};

use witcalc_spec::memory;
use witcalc_spec::{load_element, FieldParams};

/// Error code for a failed equality assertion; `b` and `c` point to the two
/// mismatched field elements
pub const ERROR_ASSERT_EQ: u32 = 7;

/// Import names
pub const ERROR: &str = "error";
pub const LOG_SET_SIGNAL: &str = "logSetSignal";
pub const LOG_GET_SIGNAL: &str = "logGetSignal";
pub const LOG_START_COMPONENT: &str = "logStartComponent";
pub const LOG_FINISH_COMPONENT: &str = "logFinishComponent";
pub const LOG: &str = "log";

/// Decoded `error` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestErrorReport {
    pub code: u32,
    pub message: String,
}

impl fmt::Display for GuestErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

/// Receiver for guest-to-host calls
///
/// All methods default to doing nothing except `error`, which logs.
pub trait HostImports: Send {
    fn error(&mut self, report: &GuestErrorReport) {
        tracing::error!(code = report.code, "guest error: {}", report.message);
    }

    fn log_set_signal(&mut self, _signal: u32, _value_ptr: u32) {}

    fn log_get_signal(&mut self, _signal: u32, _value_ptr: u32) {}

    fn log_start_component(&mut self, _component: u32) {}

    fn log_finish_component(&mut self, _component: u32) {}

    fn log(&mut self, _value: u32) {}
}

/// Default sink: errors at `error` level, hooks at `trace` level when enabled
#[derive(Debug, Clone, Default)]
pub struct TracingImports {
    trace: bool,
}

impl TracingImports {
    pub fn new(trace: bool) -> Self {
        Self { trace }
    }
}

impl HostImports for TracingImports {
    fn log_set_signal(&mut self, signal: u32, value_ptr: u32) {
        if self.trace {
            tracing::trace!(signal, value_ptr, "guest set signal");
        }
    }

    fn log_get_signal(&mut self, signal: u32, value_ptr: u32) {
        if self.trace {
            tracing::trace!(signal, value_ptr, "guest get signal");
        }
    }

    fn log_start_component(&mut self, component: u32) {
        if self.trace {
            tracing::trace!(component, "guest start component");
        }
    }

    fn log_finish_component(&mut self, component: u32) {
        if self.trace {
            tracing::trace!(component, "guest finish component");
        }
    }

    fn log(&mut self, value: u32) {
        if self.trace {
            tracing::trace!(value, "guest log");
        }
    }
}

/// One recorded import call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    Error(GuestErrorReport),
    SetSignal { signal: u32, value_ptr: u32 },
    GetSignal { signal: u32, value_ptr: u32 },
    StartComponent(u32),
    FinishComponent(u32),
    Log(u32),
}

/// Sink that records every call into a shared list
#[derive(Debug, Clone, Default)]
pub struct RecordingImports {
    events: Arc<Mutex<Vec<ImportEvent>>>,
}

impl RecordingImports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Error reports recorded so far
    pub fn errors(&self) -> Vec<GuestErrorReport> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ImportEvent::Error(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ImportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl HostImports for RecordingImports {
    fn error(&mut self, report: &GuestErrorReport) {
        self.push(ImportEvent::Error(report.clone()));
    }

    fn log_set_signal(&mut self, signal: u32, value_ptr: u32) {
        self.push(ImportEvent::SetSignal { signal, value_ptr });
    }

    fn log_get_signal(&mut self, signal: u32, value_ptr: u32) {
        self.push(ImportEvent::GetSignal { signal, value_ptr });
    }

    fn log_start_component(&mut self, component: u32) {
        self.push(ImportEvent::StartComponent(component));
    }

    fn log_finish_component(&mut self, component: u32) {
        self.push(ImportEvent::FinishComponent(component));
    }

    fn log(&mut self, value: u32) {
        self.push(ImportEvent::Log(value));
    }
}

/// Arguments of a guest `error` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCall {
    pub code: u32,
    pub str_ptr: u32,
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

/// Render a guest `error` call into a report
///
/// For [`ERROR_ASSERT_EQ`], `b` and `c` are decoded as field elements when
/// the field is known. `d` is always a string pointer. Unreadable pointers
/// are rendered inline instead of failing, since the report is already on an
/// error path.
pub fn render_error(mem: &[u8], field: Option<&FieldParams>, call: ErrorCall) -> GuestErrorReport {
    let text = c_str_or_marker(mem, call.str_ptr);
    let suffix = c_str_or_marker(mem, call.d);

    let message = match (call.code, field) {
        (ERROR_ASSERT_EQ, Some(field)) => format!(
            "{text} {} != {} {suffix}",
            element_or_marker(mem, call.b, field),
            element_or_marker(mem, call.c, field),
        ),
        _ => format!("{text} {} {} {} {suffix}", call.a, call.b, call.c),
    };

    GuestErrorReport {
        code: call.code,
        message,
    }
}

fn c_str_or_marker(mem: &[u8], ptr: u32) -> String {
    memory::read_c_str(mem, ptr).unwrap_or_else(|_| format!("<bad string at {ptr:#x}>"))
}

fn element_or_marker(mem: &[u8], ptr: u32, field: &FieldParams) -> String {
    load_element(mem, ptr, field)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| format!("<bad element at {ptr:#x}>"))
}
