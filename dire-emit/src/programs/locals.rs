//! Stack locals: copy a global into a local slot and return it.

use crate::context::EmitContext;
use dire_common::EmitError;
use dire_ir::{Constant, IrType};

pub fn emit(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int global_a = 1;
    ctx.define_global_from("global_a", Constant::i32(1))?;

    ctx.register_prototype("main", IrType::I32, vec![], false)?;
    ctx.register_body("main", |ctx| {
        // int local_b;
        let local_b = ctx.alloc_local(IrType::I32, "local_b")?;
        // local_b = global_a;
        let a_value = ctx.load_global("global_a")?;
        ctx.store(&local_b, &a_value)?;
        // return local_b;
        Ok(Some(ctx.load(&local_b)?))
    })?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}
