//! Error handling for the dire emitter
//!
//! Every emission operation returns `Result<_, EmitError>`. There is no
//! recoverable-error channel beyond this type: the driver maps any error to
//! a nonzero exit.

use thiserror::Error;

/// Emitter error type covering symbol bookkeeping, the value/address
/// protocol, aggregate addressing and module assembly.
///
/// Type payloads are carried as display strings to keep this crate free of
/// a dependency on the IR crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("no prototype registered for function `{0}`")]
    UnknownPrototype(String),

    #[error("prototype for function `{0}` registered twice")]
    DuplicatePrototype(String),

    #[error("no body routine registered for function `{0}`")]
    MissingBody(String),

    #[error("function `{0}` defined before it was declared")]
    DefineBeforeDeclare(String),

    #[error("global `{0}` is already defined")]
    GlobalRedefinition(String),

    #[error("unknown global `{0}`")]
    UnknownGlobal(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("aggregate type `{0}` has not been defined")]
    UnknownAggregate(String),

    #[error("expected an address, found a value of type {found}")]
    NotAnAddress { found: String },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("expected a struct, union or array type, found {found}")]
    AggregateExpected { found: String },

    #[error("field index {index} is out of range for {ty}")]
    FieldOutOfRange { index: usize, ty: String },

    #[error("parameter index {index} is out of range for function `{function}`")]
    ParamOutOfRange { index: usize, function: String },

    #[error("no active insertion point")]
    NoInsertPoint,

    #[error("function `{0}` returns a value but its body produced none")]
    MissingReturnValue(String),

    #[error("unknown demonstration program `{0}`")]
    UnknownProgram(String),

    #[error("verification failed: {message}")]
    Verify { message: String },

    #[error("io error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for EmitError {
    fn from(err: std::io::Error) -> Self {
        EmitError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmitError::DefineBeforeDeclare("main".to_string());
        assert_eq!(
            err.to_string(),
            "function `main` defined before it was declared"
        );

        let err = EmitError::TypeMismatch {
            expected: "i32".to_string(),
            found: "i64".to_string(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected i32, found i64");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EmitError = io.into();
        assert!(matches!(err, EmitError::Io { .. }));
    }
}
