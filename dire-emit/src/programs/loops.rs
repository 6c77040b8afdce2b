//! Counting loops: `result = sum(start..=end)` in for-form and
//! while-form. Both share the same globals and the same predicate; the
//! for-form routes the index update through a separate increment block.

use crate::cfg::{emit_for_loop, emit_while_loop};
use crate::context::EmitContext;
use dire_common::EmitError;
use dire_ir::{BinaryOp, CmpOp, Constant, IrType};

fn emit_loop_globals(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int start = 1; int end = 10; int result = 0;
    ctx.define_global_from("start", Constant::i32(1))?;
    ctx.define_global_from("end", Constant::i32(10))?;
    ctx.define_global_from("result", Constant::i32(0))?;
    Ok(())
}

pub fn emit_for(ctx: &mut EmitContext) -> Result<(), EmitError> {
    emit_loop_globals(ctx)?;

    ctx.register_prototype("main", IrType::I32, vec![], false)?;
    ctx.register_body("main", |ctx| {
        // int index = start;
        let index = ctx.alloc_local(IrType::I32, "index")?;
        let start = ctx.load_global("start")?;
        ctx.store(&index, &start)?;

        // for (; index <= end; index = index + 1) result = result + index;
        emit_for_loop(
            ctx,
            |ctx| {
                let i = ctx.load(&index)?;
                let end = ctx.load_global("end")?;
                ctx.icmp(CmpOp::Sle, &i, &end)
            },
            |ctx| {
                let result = ctx.load_global("result")?;
                let i = ctx.load(&index)?;
                let sum = ctx.binary(BinaryOp::Add, &result, &i)?;
                ctx.store_global(&sum, "result")
            },
            |ctx| {
                let next = ctx.increment(&index, 1)?;
                ctx.store(&index, &next)
            },
        )?;

        // return result;
        Ok(Some(ctx.load_global("result")?))
    })?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}

pub fn emit_while(ctx: &mut EmitContext) -> Result<(), EmitError> {
    emit_loop_globals(ctx)?;

    ctx.register_prototype("main", IrType::I32, vec![], false)?;
    ctx.register_body("main", |ctx| {
        // int index = start;
        let index = ctx.alloc_local(IrType::I32, "index")?;
        let start = ctx.load_global("start")?;
        ctx.store(&index, &start)?;

        // while (index <= end) { result = result + index; index = index + 1; }
        emit_while_loop(
            ctx,
            |ctx| {
                let i = ctx.load(&index)?;
                let end = ctx.load_global("end")?;
                ctx.icmp(CmpOp::Sle, &i, &end)
            },
            |ctx| {
                let result = ctx.load_global("result")?;
                let i = ctx.load(&index)?;
                let sum = ctx.binary(BinaryOp::Add, &result, &i)?;
                ctx.store_global(&sum, "result")?;
                let next = ctx.increment(&index, 1)?;
                ctx.store(&index, &next)
            },
        )?;

        // return result;
        Ok(Some(ctx.load_global("result")?))
    })?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}
