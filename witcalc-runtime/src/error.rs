//! Runtime error types for the witness calculator

use thiserror::Error;
use witcalc_spec::SpecError;

use crate::imports::GuestErrorReport;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("Module contract violated: {0}")]
    ModuleContract(String),

    #[error("Guest call `{export}` failed: {message}")]
    GuestCall {
        export: &'static str,
        message: String,
    },

    #[error("Guest assertion failed: {0}")]
    GuestAssertion(GuestErrorReport),
}

impl RuntimeError {
    /// Errors that make the module unusable rather than a single calculation
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::ModuleContract(_))
    }

    /// Errors caused by the caller's inputs
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, RuntimeError::Spec(SpecError::MalformedInput(_)))
    }

    /// Reclassify a failure seen while probing the module at load time
    pub(crate) fn into_contract(self) -> Self {
        match self {
            RuntimeError::ModuleContract(_) => self,
            other => RuntimeError::ModuleContract(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_call_display() {
        let err = RuntimeError::GuestCall {
            export: "setSignal",
            message: "unreachable executed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Guest call `setSignal` failed: unreachable executed"
        );
    }

    #[test]
    fn test_module_contract_display() {
        let err = RuntimeError::ModuleContract("missing export `getNVars`".to_string());
        assert_eq!(
            err.to_string(),
            "Module contract violated: missing export `getNVars`"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_guest_assertion_display() {
        let err = RuntimeError::GuestAssertion(GuestErrorReport {
            code: 7,
            message: "Constraint doesn't match 1 != 2 main".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Guest assertion failed: code 7: Constraint doesn't match 1 != 2 main"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_spec_error_from() {
        let err: RuntimeError = SpecError::MalformedInput("bad".to_string()).into();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("Malformed input"));
    }

    #[test]
    fn test_into_contract() {
        let err = RuntimeError::GuestCall {
            export: "getFrLen",
            message: "trap".to_string(),
        }
        .into_contract();
        assert!(matches!(err, RuntimeError::ModuleContract(ref msg) if msg.contains("getFrLen")));

        let err = RuntimeError::ModuleContract("x".to_string()).into_contract();
        assert_eq!(err.to_string(), "Module contract violated: x");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuntimeError>();
    }
}
