//! Comparison battery over signed, unsigned and float globals; `main`
//! computes `i32_1 > i32_2` and returns the i1 result widened to i32.

use crate::context::EmitContext;
use dire_common::EmitError;
use dire_ir::{CmpOp, Constant, IrType};

pub fn emit(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int i32_1 = 1; int i32_2 = 2;
    ctx.define_global_from("i32_1", Constant::i32(1))?;
    ctx.define_global_from("i32_2", Constant::i32(2))?;
    // unsigned int ui32_1 = 1; unsigned int ui32_2 = 2;
    ctx.define_global_from("ui32_1", Constant::i32(1))?;
    ctx.define_global_from("ui32_2", Constant::i32(2))?;
    // float f_1 = 1.0; float f_2 = 2.0;
    ctx.define_global_from("f_1", Constant::f32(1.0))?;
    ctx.define_global_from("f_2", Constant::f32(2.0))?;

    ctx.register_prototype("main", IrType::I32, vec![], false)?;
    ctx.register_body("main", |ctx| {
        let s1 = ctx.load_global("i32_1")?;
        let s2 = ctx.load_global("i32_2")?;
        for op in [
            CmpOp::Sgt,
            CmpOp::Sge,
            CmpOp::Slt,
            CmpOp::Sle,
            CmpOp::Eq,
            CmpOp::Ne,
        ] {
            ctx.icmp(op, &s1, &s2)?;
        }

        let u1 = ctx.load_global("ui32_1")?;
        let u2 = ctx.load_global("ui32_2")?;
        for op in [
            CmpOp::Ugt,
            CmpOp::Uge,
            CmpOp::Ult,
            CmpOp::Ule,
            CmpOp::Eq,
            CmpOp::Ne,
        ] {
            ctx.icmp(op, &u1, &u2)?;
        }

        let f1 = ctx.load_global("f_1")?;
        let f2 = ctx.load_global("f_2")?;
        for op in [
            CmpOp::Fogt,
            CmpOp::Foge,
            CmpOp::Folt,
            CmpOp::Fole,
            CmpOp::Foeq,
            CmpOp::Fune,
        ] {
            ctx.fcmp(op, &f1, &f2)?;
        }

        // return i32_1 > i32_2, widened to the return type
        let greater = ctx.icmp(CmpOp::Sgt, &s1, &s2)?;
        let widened = ctx.zext(&greater, IrType::I32)?;
        Ok(Some(widened))
    })?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}
