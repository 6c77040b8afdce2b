//! Demonstration programs
//!
//! Fixed, pre-determined emission call sequences - there is no parsing and
//! no decision logic, each program is a flat transcript of the constructs
//! it demonstrates. The driver selects one by name; the scenario tests run
//! them through the verifier and the evaluator.

mod compare;
mod globals;
mod locals;
mod loops;
mod sum;
mod swap;

use crate::context::EmitContext;
use dire_common::EmitError;

pub const PROGRAM_NAMES: &[&str] = &[
    "globals",
    "locals",
    "compare",
    "loop-for",
    "loop-while",
    "swap-ptr",
    "swap-array",
    "swap-point",
    "sum",
];

/// Emit the named demonstration program into the context
pub fn emit_program(ctx: &mut EmitContext, name: &str) -> Result<(), EmitError> {
    match name {
        "globals" => globals::emit(ctx),
        "locals" => locals::emit(ctx),
        "compare" => compare::emit(ctx),
        "loop-for" => loops::emit_for(ctx),
        "loop-while" => loops::emit_while(ctx),
        "swap-ptr" => swap::emit_swap_ptr(ctx),
        "swap-array" => swap::emit_swap_array(ctx),
        "swap-point" => swap::emit_swap_point(ctx),
        "sum" => sum::emit(ctx),
        other => Err(EmitError::UnknownProgram(other.to_string())),
    }
}
