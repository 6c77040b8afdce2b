//! Direct IR Emitter - Emission Engine
//!
//! The emission engine turns fixed, pre-determined call sequences into a
//! verified IR module: symbol and type bookkeeping, the lvalue/rvalue
//! protocol, aggregate addressing arithmetic, control-flow graph
//! construction and function definition. All state lives in one
//! [`EmitContext`] constructed per emission run and threaded through every
//! operation.

pub mod catalog;
pub mod cfg;
pub mod context;
pub mod programs;
pub mod registry;

pub use catalog::TypeCatalog;
pub use cfg::{emit_for_loop, emit_if_else, emit_while_loop};
pub use context::{host_triple, EmitContext, TypedValue};
pub use registry::{BodyRoutine, FunctionPrototype, FunctionRegistry};
