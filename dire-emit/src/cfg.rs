//! Control-flow graph construction
//!
//! Builders for the two loop forms and the two-armed conditional. The
//! block wiring is fixed: a loop is always entered through an
//! unconditional branch into its condition block, the body always branches
//! back through the increment block (for-form) or directly to the
//! condition (while-form), and the condition exits to the end block.
//! There is no break/continue support; the closed construct set never
//! requires early exit. Callers cannot forget a terminator: every block
//! the builders open is closed by the builders themselves.

use crate::context::{EmitContext, TypedValue};
use dire_common::{BlockId, EmitError};

/// Emit a counting loop in for-form: condition, body and increment blocks.
///
/// `condition` must produce an i1 predicate. The cursor is left at the end
/// block, which is also returned.
pub fn emit_for_loop<C, B, S>(
    ctx: &mut EmitContext,
    condition: C,
    body: B,
    step: S,
) -> Result<BlockId, EmitError>
where
    C: FnOnce(&mut EmitContext) -> Result<TypedValue, EmitError>,
    B: FnOnce(&mut EmitContext) -> Result<(), EmitError>,
    S: FnOnce(&mut EmitContext) -> Result<(), EmitError>,
{
    let condition_block = ctx.create_block("condition")?;
    let body_block = ctx.create_block("body")?;
    let increment_block = ctx.create_block("increment")?;
    let end_block = ctx.create_block("end")?;

    ctx.br(condition_block)?;

    ctx.set_insert_point(condition_block)?;
    let predicate = condition(ctx)?;
    ctx.cond_br(predicate, body_block, end_block)?;

    ctx.set_insert_point(body_block)?;
    body(ctx)?;
    ctx.br(increment_block)?;

    ctx.set_insert_point(increment_block)?;
    step(ctx)?;
    ctx.br(condition_block)?;

    ctx.set_insert_point(end_block)?;
    Ok(end_block)
}

/// Emit a pre-test loop in while-form: no separate increment block, the
/// body branches straight back to the condition
pub fn emit_while_loop<C, B>(ctx: &mut EmitContext, condition: C, body: B) -> Result<BlockId, EmitError>
where
    C: FnOnce(&mut EmitContext) -> Result<TypedValue, EmitError>,
    B: FnOnce(&mut EmitContext) -> Result<(), EmitError>,
{
    let condition_block = ctx.create_block("condition")?;
    let body_block = ctx.create_block("body")?;
    let end_block = ctx.create_block("end")?;

    ctx.br(condition_block)?;

    ctx.set_insert_point(condition_block)?;
    let predicate = condition(ctx)?;
    ctx.cond_br(predicate, body_block, end_block)?;

    ctx.set_insert_point(body_block)?;
    body(ctx)?;
    ctx.br(condition_block)?;

    ctx.set_insert_point(end_block)?;
    Ok(end_block)
}

/// Emit a two-armed conditional: then and else arms joining in a merge
/// block, where the cursor is left
pub fn emit_if_else<C, T, E>(
    ctx: &mut EmitContext,
    condition: C,
    then_arm: T,
    else_arm: E,
) -> Result<BlockId, EmitError>
where
    C: FnOnce(&mut EmitContext) -> Result<TypedValue, EmitError>,
    T: FnOnce(&mut EmitContext) -> Result<(), EmitError>,
    E: FnOnce(&mut EmitContext) -> Result<(), EmitError>,
{
    let then_block = ctx.create_block("then")?;
    let else_block = ctx.create_block("else")?;
    let merge_block = ctx.create_block("merge")?;

    let predicate = condition(ctx)?;
    ctx.cond_br(predicate, then_block, else_block)?;

    ctx.set_insert_point(then_block)?;
    then_arm(ctx)?;
    ctx.br(merge_block)?;

    ctx.set_insert_point(else_block)?;
    else_arm(ctx)?;
    ctx.br(merge_block)?;

    ctx.set_insert_point(merge_block)?;
    Ok(merge_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests_support::function_fixture;
    use dire_ir::{CmpOp, Constant, IrType};

    #[test]
    fn test_for_loop_block_shape() {
        let mut ctx = function_fixture();
        let index = ctx.alloc_local(IrType::I32, "i").unwrap();
        let zero = TypedValue::constant(Constant::i32(0));
        ctx.store(&index, &zero).unwrap();

        let end = emit_for_loop(
            &mut ctx,
            |ctx| {
                let i = ctx.load(&index)?;
                let limit = TypedValue::constant(Constant::i32(10));
                ctx.icmp(CmpOp::Slt, &i, &limit)
            },
            |_| Ok(()),
            |ctx| {
                let next = ctx.increment(&index, 1)?;
                ctx.store(&index, &next)
            },
        )
        .unwrap();

        assert_eq!(ctx.current_block().unwrap(), end);
        let function = &ctx.cursor.as_ref().unwrap().function;
        let labels: Vec<&str> = function.blocks.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["entry", "condition1", "body2", "increment3", "end4"]
        );
    }

    #[test]
    fn test_condition_must_be_i1() {
        let mut ctx = function_fixture();
        let err = emit_while_loop(
            &mut ctx,
            |_| Ok(TypedValue::constant(Constant::i32(1))),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::TypeMismatch { .. }));
    }

    #[test]
    fn test_if_else_leaves_cursor_at_merge() {
        let mut ctx = function_fixture();
        let merge = emit_if_else(
            &mut ctx,
            |_| Ok(TypedValue::constant(Constant::bool(true))),
            |_| Ok(()),
            |_| Ok(()),
        )
        .unwrap();
        assert_eq!(ctx.current_block().unwrap(), merge);
    }
}
