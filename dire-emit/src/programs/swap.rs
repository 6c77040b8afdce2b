//! The three swap demonstrations: through pointer parameters, through an
//! array parameter, and through a struct pointer. Each is the classic
//! three-temporary swap expressed in the lvalue/rvalue protocol.

use crate::context::{EmitContext, TypedValue};
use dire_common::EmitError;
use dire_ir::{Constant, IrType};

/// void swap_ptr(int *x, int *y); main swaps two globals by address
pub fn emit_swap_ptr(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int x = 1; int y = 2;
    ctx.define_global_from("x", Constant::i32(1))?;
    ctx.define_global_from("y", Constant::i32(2))?;

    let i32_ptr = IrType::I32.pointer_to();
    ctx.register_prototype(
        "swap_ptr",
        IrType::Void,
        vec![i32_ptr.clone(), i32_ptr],
        false,
    )?;
    ctx.register_prototype("main", IrType::I32, vec![], false)?;

    ctx.register_body("swap_ptr", |ctx| {
        let x = ctx.param_slot(0)?;
        let y = ctx.param_slot(1)?;
        // int temp;
        let temp = ctx.alloc_local(IrType::I32, "temp")?;

        // temp = *x;
        let x_value = ctx.load_through_pointer(&x)?;
        ctx.store(&temp, &x_value)?;

        // *x = *y;
        let y_value = ctx.load_through_pointer(&y)?;
        let x_address = ctx.load(&x)?;
        ctx.store(&x_address, &y_value)?;

        // *y = temp;
        let temp_value = ctx.load(&temp)?;
        let y_address = ctx.load(&y)?;
        ctx.store(&y_address, &temp_value)?;

        Ok(None)
    })?;
    ctx.register_body("main", |ctx| {
        // swap_ptr(&x, &y);
        let x = ctx.global_address("x")?;
        let y = ctx.global_address("y")?;
        ctx.call("swap_ptr", &[x, y])?;
        // return x;
        Ok(Some(ctx.load_global("x")?))
    })?;

    ctx.declare_function("swap_ptr")?;
    ctx.define_function("swap_ptr")?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}

/// void swap_array(int arr[], int x, int y); main swaps arr[0] and arr[3]
pub fn emit_swap_array(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // int arr[] = { 1, 2, 3, 4 };
    ctx.define_global_from(
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

    ctx.register_prototype(
        "swap_array",
        IrType::Void,
        vec![IrType::I32.pointer_to(), IrType::I32, IrType::I32],
        false,
    )?;
    ctx.register_prototype("main", IrType::I32, vec![], false)?;

    ctx.register_body("swap_array", |ctx| {
        let arr = ctx.param_slot(0)?;
        let x = ctx.param_slot(1)?;
        let y = ctx.param_slot(2)?;
        // int temp;
        let temp = ctx.alloc_local(IrType::I32, "temp")?;

        // temp = arr[x];
        let arr_x = ctx.element_address(&arr, &x)?;
        let arr_x_value = ctx.load(&arr_x)?;
        ctx.store(&temp, &arr_x_value)?;

        // arr[x] = arr[y];
        let arr_y = ctx.element_address(&arr, &y)?;
        let arr_y_value = ctx.load(&arr_y)?;
        let arr_x_again = ctx.element_address(&arr, &x)?;
        ctx.store(&arr_x_again, &arr_y_value)?;

        // arr[y] = temp;
        let temp_value = ctx.load(&temp)?;
        let arr_y_again = ctx.element_address(&arr, &y)?;
        ctx.store(&arr_y_again, &temp_value)?;

        Ok(None)
    })?;
    ctx.register_body("main", |ctx| {
        // swap_array(arr, 0, 3);
        let arr = ctx.global_address("arr")?;
        let first = ctx.array_decay(&arr)?;
        ctx.call(
            "swap_array",
            &[
                first,
                TypedValue::constant(Constant::i32(0)),
                TypedValue::constant(Constant::i32(3)),
            ],
        )?;

        // return arr[0];
        let index = ctx.alloc_local(IrType::I32, "index")?;
        ctx.store(&index, &TypedValue::constant(Constant::i32(0)))?;
        let element = ctx.element_address(&arr, &index)?;
        Ok(Some(ctx.load(&element)?))
    })?;

    ctx.declare_function("swap_array")?;
    ctx.define_function("swap_array")?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}

/// void swap_point(struct point *p); main builds a stack point {10, 20},
/// swaps its fields through the pointer and returns the new x
pub fn emit_swap_point(ctx: &mut EmitContext) -> Result<(), EmitError> {
    // struct point { int x; int y; };
    let point_ty = ctx.define_struct("struct.point", vec![IrType::I32, IrType::I32]);

    ctx.register_prototype(
        "swap_point",
        IrType::Void,
        vec![point_ty.pointer_to()],
        false,
    )?;
    ctx.register_prototype("main", IrType::I32, vec![], false)?;

    ctx.register_body("swap_point", |ctx| {
        let p = ctx.param_slot(0)?;
        // int temp;
        let temp = ctx.alloc_local(IrType::I32, "temp")?;

        // temp = p->x;
        let p_x_value = ctx.field_rvalue(&p, 0)?;
        ctx.store(&temp, &p_x_value)?;

        // p->x = p->y;
        let p_y_value = ctx.field_rvalue(&p, 1)?;
        let p_x_address = ctx.field_lvalue(&p, 0)?;
        ctx.store(&p_x_address, &p_y_value)?;

        // p->y = temp;
        let temp_value = ctx.load(&temp)?;
        let p_y_address = ctx.field_lvalue(&p, 1)?;
        ctx.store(&p_y_address, &temp_value)?;

        Ok(None)
    })?;
    ctx.register_body("main", |ctx| {
        // struct point p; p.x = 10; p.y = 20;
        let point_ty = ctx.named_type("struct.point")?;
        let p = ctx.alloc_local(point_ty, "p")?;
        let p_x = ctx.field_address(&p, 0)?;
        ctx.store(&p_x, &TypedValue::constant(Constant::i32(10)))?;
        let p_y = ctx.field_address(&p, 1)?;
        ctx.store(&p_y, &TypedValue::constant(Constant::i32(20)))?;

        // swap_point(&p);
        ctx.call("swap_point", &[p.clone()])?;

        // return p.x;
        let p_x = ctx.field_address(&p, 0)?;
        Ok(Some(ctx.load(&p_x)?))
    })?;

    ctx.declare_function("swap_point")?;
    ctx.define_function("swap_point")?;
    ctx.declare_function("main")?;
    ctx.define_function("main")
}
