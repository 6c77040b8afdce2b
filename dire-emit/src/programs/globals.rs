//! Global variable showcase: scalar, float, array, pointer, struct and
//! union globals, plus function-local private constants and a global
//! string, with a `main` that returns a loaded global.

use crate::context::EmitContext;
use dire_common::EmitError;
use dire_ir::{Constant, IrType};

pub fn emit(ctx: &mut EmitContext) -> Result<(), EmitError> {
    emit_integers(ctx)?;
    emit_floats(ctx)?;
    emit_array(ctx)?;
    emit_pointers(ctx)?;
    emit_struct(ctx)?;
    emit_union(ctx)?;

    ctx.register_prototype("main", IrType::I32, vec![], false)?;
    ctx.register_body("main", |ctx| {
        // const int arr[] = { 1, 2, 3, 4 };
        ctx.emit_function_constant(
            "arr",
            Constant::array(
                IrType::I32,
                vec![
                    Constant::i32(1),
                    Constant::i32(2),
                    Constant::i32(3),
                    Constant::i32(4),
                ],
            ),
        )?;

        // const struct point point = { 11, 12 };
        let point_ty = ctx.named_type("struct.point")?;
        ctx.emit_function_constant(
            "point",
            Constant::Struct {
                ty: point_ty,
                fields: vec![Constant::i32(11), Constant::i32(12)],
            },
        )?;

        // char *str = "hello";
        ctx.emit_string_ptr("hello", "string")?;

        Ok(Some(ctx.load_global("i_32")?))
    })?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}

fn emit_integers(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // char i_8 = 1;
    ctx.define_global(IrType::I8, "i_8", Constant::i8(1))?;
    // short i_16 = 2;
    ctx.define_global(IrType::I16, "i_16", Constant::i16(2))?;
    // int i_32 = 3;
    ctx.define_global(IrType::I32, "i_32", Constant::i32(3))?;
    // long i_64 = 4;
    ctx.define_global(IrType::I64, "i_64", Constant::i64(4))?;
    // unsigned char ui_8 = 1;
    ctx.define_global(IrType::I8, "ui_8", Constant::i8(1))?;
    // unsigned int ui_32 = 3;
    ctx.define_global(IrType::I32, "ui_32", Constant::i32(3))?;
    Ok(())
}

fn emit_floats(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // float f = 1.0;
    ctx.define_global(IrType::F32, "f", Constant::f32(1.0))?;
    // double df = 2.0;
    ctx.define_global(IrType::F64, "df", Constant::f64(2.0))?;
    // long double ld = 3.0;
    ctx.define_global(IrType::F80, "ld", Constant::f80(3.0))?;
    Ok(())
}

fn emit_array(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int arr[] = { 1, 2, 3, 4 };
    let init = Constant::array(
        IrType::I32,
        vec![
            Constant::i32(1),
            Constant::i32(2),
            Constant::i32(3),
            Constant::i32(4),
        ],
    );
    ctx.define_global_from("arr", init)?;
    Ok(())
}

fn emit_pointers(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int *i_p;
    ctx.define_global_from("i_p", Constant::null(IrType::I32))?;
    // char *c_p;
    ctx.define_global_from("c_p", Constant::null(IrType::I8))?;
    Ok(())
}

fn emit_struct(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // struct point { int x; int y; };
    let point_ty = ctx.define_struct("struct.point", vec![IrType::I32, IrType::I32]);
    // struct point point = { 11, 12 };
    ctx.define_global_from(
        "point",
        Constant::Struct {
            ty: point_ty,
            fields: vec![Constant::i32(11), Constant::i32(12)],
        },
    )?;
    Ok(())
}

fn emit_union(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // union ab { int a; float b; };
    let ab_ty = ctx.define_union("union.ab", vec![IrType::I32, IrType::F32]);
    // union ab u = { 1 };
    ctx.define_global_from(
        "u",
        Constant::Struct {
            ty: ab_ty,
            fields: vec![Constant::i32(1)],
        },
    )?;
    Ok(())
}
