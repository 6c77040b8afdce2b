//! By-value parameters and a vararg call: `sum(x, y)` prints a global
//! through printf and returns `x + y`.

use crate::context::{EmitContext, TypedValue};
use dire_common::EmitError;
use dire_ir::{BinaryOp, Constant, IrType};

pub fn emit(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int result = 0;
    ctx.define_global_from("result", Constant::i32(0))?;

    // int printf(const char *format, ...);
    ctx.register_prototype(
        "printf",
        IrType::I32,
        vec![IrType::I8.pointer_to()],
        true,
    )?;
    // int sum(int x, int y);
    ctx.register_prototype("sum", IrType::I32, vec![IrType::I32, IrType::I32], false)?;
    ctx.register_prototype("main", IrType::I32, vec![], false)?;

    ctx.register_body("sum", |ctx| {
        // printf("result:%d\n", result);
        let format = ctx.emit_string_ptr("result:%d\n", "str")?;
        let format_ptr = ctx.array_decay(&format)?;
        let result = ctx.load_global("result")?;
        ctx.call("printf", &[format_ptr, result])?;

        // return x + y;
        let x_slot = ctx.param_slot(0)?;
        let y_slot = ctx.param_slot(1)?;
        let x = ctx.load(&x_slot)?;
        let y = ctx.load(&y_slot)?;
        Ok(Some(ctx.binary(BinaryOp::Add, &x, &y)?))
    })?;
    ctx.register_body("main", |ctx| {
        // return sum(1, 2);
        let value = ctx.call(
            "sum",
            &[
                TypedValue::constant(Constant::i32(1)),
                TypedValue::constant(Constant::i32(2)),
            ],
        )?;
        Ok(value)
    })?;

    ctx.declare_function("printf")?;
    ctx.declare_function("sum")?;
    ctx.define_function("sum")?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}
