//! Direct IR Emitter - Intermediate Representation
//!
//! This crate defines the typed SSA IR produced by the emission engine:
//! the type system, constants, instructions, basic blocks, functions,
//! globals and the module container, together with the textual printer,
//! the structural verifier and a small reference evaluator used by tests
//! and the driver's `run` command.

pub mod interp;
pub mod ir;
pub mod types;
pub mod verify;

pub use interp::{EvalError, Machine, RunValue};
pub use ir::{
    BasicBlock, BinaryOp, CastOp, CmpOp, Constant, Function, GlobalVariable, Instruction, Linkage,
    Module, Value,
};
pub use types::IrType;
pub use verify::{verify_function, verify_module, VerifyError};
