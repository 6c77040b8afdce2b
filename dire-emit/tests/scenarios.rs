//! Scenario tests: emit the demonstration programs, verify the resulting
//! modules, and execute them on the reference evaluator.

use dire_emit::programs::emit_program;
use dire_emit::{emit_for_loop, EmitContext, TypedValue};
use dire_ir::{
    verify_module, BinaryOp, CmpOp, Constant, IrType, Machine, Module, RunValue,
};
use pretty_assertions::assert_eq;

fn build(program: &str) -> Module {
    let mut ctx = EmitContext::new(program);
    emit_program(&mut ctx, program).expect("emission failed");
    let module = ctx.into_module();
    verify_module(&module).expect("verification failed");
    module
}

fn run_main(module: &Module) -> (Option<RunValue>, String) {
    let mut machine = Machine::new(module).expect("machine setup failed");
    let result = machine.run("main", &[]).expect("execution failed");
    (result, machine.output)
}

#[test]
fn globals_program_returns_loaded_global() {
    let module = build("globals");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(3)));

    // Function-local constants and the string landed as private globals
    let text = module.to_string();
    assert!(text.contains("@__constant.main.arr = private constant"));
    assert!(text.contains("@__constant.main.point = private constant"));
    assert!(text.contains("@.string = private constant [6 x i8] c\"hello\\00\""));
    assert!(text.contains("%struct.point = type { i32, i32 }"));
}

#[test]
fn locals_program_copies_through_stack() {
    let module = build("locals");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(1)));
}

#[test]
fn compare_program_widens_false_to_zero() {
    // 1 > 2 is false; widened through zext the return value is 0
    let module = build("compare");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(0)));

    let text = module.to_string();
    assert!(text.contains("icmp sgt i32"));
    assert!(text.contains("icmp ult i32"));
    assert!(text.contains("fcmp ogt f32"));
    assert!(text.contains("zext i1"));
}

#[test]
fn loop_for_sums_one_to_ten() {
    let module = build("loop-for");
    let mut machine = Machine::new(&module).unwrap();
    assert_eq!(machine.run("main", &[]).unwrap(), Some(RunValue::Int(55)));
    assert_eq!(machine.read_global("result").unwrap(), RunValue::Int(55));

    let text = module.to_string();
    assert!(text.contains("condition1:"));
    assert!(text.contains("increment3:"));
    assert!(text.contains("br label %condition1"));
}

#[test]
fn loop_while_matches_for_form() {
    let module = build("loop-while");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(55)));

    // No separate increment block in while-form
    let text = module.to_string();
    assert!(!text.contains("increment"));
}

#[test]
fn empty_range_loop_runs_zero_times() {
    // start > end: the body must not execute at all
    let mut ctx = EmitContext::new("boundary");
    ctx.define_global_from("start", Constant::i32(5)).unwrap();
    ctx.define_global_from("end", Constant::i32(1)).unwrap();
    ctx.define_global_from("result", Constant::i32(0)).unwrap();
    ctx.register_prototype("main", IrType::I32, vec![], false)
        .unwrap();
    ctx.register_body("main", |ctx| {
        let index = ctx.alloc_local(IrType::I32, "index")?;
        let start = ctx.load_global("start")?;
        ctx.store(&index, &start)?;
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
        Ok(Some(ctx.load_global("result")?))
    })
    .unwrap();
    ctx.declare_function("main").unwrap();
    ctx.define_function("main").unwrap();

    let module = ctx.into_module();
    verify_module(&module).unwrap();
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(0)));
}

#[test]
fn swap_ptr_exchanges_globals() {
    let module = build("swap-ptr");
    let mut machine = Machine::new(&module).unwrap();
    assert_eq!(machine.run("main", &[]).unwrap(), Some(RunValue::Int(2)));
    assert_eq!(machine.read_global("x").unwrap(), RunValue::Int(2));
    assert_eq!(machine.read_global("y").unwrap(), RunValue::Int(1));
}

#[test]
fn swap_array_exchanges_elements() {
    // arr = {1, 2, 3, 4}; swap_array(arr, 0, 3) leaves arr[0] == 4
    let module = build("swap-array");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(4)));
}

#[test]
fn element_address_reads_initializer() {
    // arr = {1, 2, 3, 4}; arr[2] == 3
    let mut ctx = EmitContext::new("element");
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
    )
    .unwrap();
    ctx.register_prototype("main", IrType::I32, vec![], false)
        .unwrap();
    ctx.register_body("main", |ctx| {
        let index = ctx.alloc_local(IrType::I32, "index")?;
        ctx.store(&index, &TypedValue::constant(Constant::i32(2)))?;
        let arr = ctx.global_address("arr")?;
        let element = ctx.element_address(&arr, &index)?;
        Ok(Some(ctx.load(&element)?))
    })
    .unwrap();
    ctx.declare_function("main").unwrap();
    ctx.define_function("main").unwrap();

    let module = ctx.into_module();
    verify_module(&module).unwrap();
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(3)));
}

#[test]
fn swap_point_swaps_struct_fields() {
    let module = build("swap-point");
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(20)));
}

#[test]
fn field_write_read_round_trip() {
    // store through field_address, read back through field_rvalue
    let mut ctx = EmitContext::new("fields");
    ctx.define_struct("struct.pair", vec![IrType::I32, IrType::I32]);
    ctx.register_prototype("main", IrType::I32, vec![], false)
        .unwrap();
    ctx.register_body("main", |ctx| {
        let pair_ty = ctx.named_type("struct.pair")?;
        let pair = ctx.alloc_local(pair_ty.clone(), "pair")?;
        let second = ctx.field_address(&pair, 1)?;
        ctx.store(&second, &TypedValue::constant(Constant::i32(42)))?;

        let slot = ctx.alloc_local(pair_ty.pointer_to(), "pair_ptr")?;
        ctx.store(&slot, &pair)?;
        Ok(Some(ctx.field_rvalue(&slot, 1)?))
    })
    .unwrap();
    ctx.declare_function("main").unwrap();
    ctx.define_function("main").unwrap();

    let module = ctx.into_module();
    verify_module(&module).unwrap();
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(42)));
}

#[test]
fn load_after_define_returns_initializer() {
    let mut ctx = EmitContext::new("roundtrip");
    ctx.define_global_from("a", Constant::i32(123)).unwrap();
    ctx.register_prototype("main", IrType::I32, vec![], false)
        .unwrap();
    ctx.register_body("main", |ctx| Ok(Some(ctx.load_global("a")?)))
        .unwrap();
    ctx.declare_function("main").unwrap();
    ctx.define_function("main").unwrap();

    let module = ctx.into_module();
    let (result, _) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(123)));
}

#[test]
fn sum_program_prints_and_adds() {
    let module = build("sum");
    let (result, output) = run_main(&module);
    assert_eq!(result, Some(RunValue::Int(3)));
    assert_eq!(output, "result:0\n");

    let text = module.to_string();
    assert!(text.contains("declare i32 @printf(i8*, ...)"));
    assert!(text.contains("@.str = private constant"));
}
