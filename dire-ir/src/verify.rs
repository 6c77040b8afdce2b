//! Structural verifier
//!
//! Runs after every function definition and over the finished module.
//! Checks the invariants the emission layer does not enforce locally:
//! terminator placement, branch targets, reachability, single-assignment
//! temporaries and instruction typing. Any failure is fatal to emission.

use crate::ir::{CastOp, Constant, Function, Instruction, Module, Value};
use crate::types::IrType;
use dire_common::{BlockId, TempId};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("duplicate global `{0}`")]
    DuplicateGlobal(String),

    #[error("duplicate function `{0}`")]
    DuplicateFunction(String),

    #[error("global `{name}`: initializer type {found} does not match declared type {expected}")]
    GlobalInitType {
        name: String,
        expected: String,
        found: String,
    },

    #[error("function `{0}` has no entry block")]
    NoEntryBlock(String),

    #[error("block `{block}` in `{function}` has no terminator")]
    MissingTerminator { function: String, block: String },

    #[error("block `{block}` in `{function}` has a terminator before its end")]
    EarlyTerminator { function: String, block: String },

    #[error("branch to unknown block {target} in `{function}`")]
    UnknownBlock { function: String, target: BlockId },

    #[error("block `{block}` in `{function}` is unreachable from entry")]
    UnreachableBlock { function: String, block: String },

    #[error("temporary %{temp} in `{function}` assigned more than once")]
    Reassigned { function: String, temp: TempId },

    #[error("temporary %{temp} in `{function}` used but never defined")]
    UndefinedTemp { function: String, temp: TempId },

    #[error("unknown global `@{name}` referenced from `{function}`")]
    UnknownGlobalRef { function: String, name: String },

    #[error("unknown function `@{name}` called from `{function}`")]
    UnknownCallee { function: String, name: String },

    #[error("in `{function}`: {message}")]
    Type { function: String, message: String },
}

impl From<VerifyError> for dire_common::EmitError {
    fn from(err: VerifyError) -> Self {
        dire_common::EmitError::Verify {
            message: err.to_string(),
        }
    }
}

/// Verify one function of the module by name
pub fn verify_function(module: &Module, name: &str) -> Result<(), VerifyError> {
    let function = module
        .get_function(name)
        .ok_or_else(|| VerifyError::UnknownCallee {
            function: "<module>".to_string(),
            name: name.to_string(),
        })?;
    check_function(module, function)
}

/// Verify module-level invariants and every defined function
pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    let mut seen = HashSet::new();
    for global in &module.globals {
        if !seen.insert(&global.name) {
            return Err(VerifyError::DuplicateGlobal(global.name.clone()));
        }
        let init_ty = global.init.ty();
        if init_ty != global.ty {
            return Err(VerifyError::GlobalInitType {
                name: global.name.clone(),
                expected: global.ty.to_string(),
                found: init_ty.to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    for function in &module.functions {
        if !seen.insert(&function.name) {
            return Err(VerifyError::DuplicateFunction(function.name.clone()));
        }
        if !function.is_declaration() {
            check_function(module, function)?;
        }
    }
    Ok(())
}

fn check_function(module: &Module, function: &Function) -> Result<(), VerifyError> {
    let name = &function.name;
    if function.is_declaration() {
        return Err(VerifyError::NoEntryBlock(name.clone()));
    }

    let block_ids: HashSet<BlockId> = function.blocks.iter().map(|b| b.id).collect();

    // Terminator placement and branch targets
    for block in &function.blocks {
        match block.terminator() {
            None => {
                return Err(VerifyError::MissingTerminator {
                    function: name.clone(),
                    block: block.label.clone(),
                })
            }
            Some(term) => {
                for target in term.successors() {
                    if !block_ids.contains(&target) {
                        return Err(VerifyError::UnknownBlock {
                            function: name.clone(),
                            target,
                        });
                    }
                }
            }
        }
        for instr in &block.instructions[..block.instructions.len() - 1] {
            if instr.is_terminator() {
                return Err(VerifyError::EarlyTerminator {
                    function: name.clone(),
                    block: block.label.clone(),
                });
            }
        }
    }

    // Every block reachable from entry
    let entry = function.blocks[0].id;
    let mut reached = HashSet::new();
    let mut queue = VecDeque::from([entry]);
    while let Some(id) = queue.pop_front() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(block) = function.get_block(id) {
            if let Some(term) = block.terminator() {
                queue.extend(term.successors());
            }
        }
    }
    for block in &function.blocks {
        if !reached.contains(&block.id) {
            return Err(VerifyError::UnreachableBlock {
                function: name.clone(),
                block: block.label.clone(),
            });
        }
    }

    // Single assignment; collect the type environment first so that uses
    // are checked against any definition in the function (a structural
    // approximation of dominance, sufficient for the structured control
    // flow the emitter produces)
    let mut env: HashMap<TempId, IrType> = function.params.iter().cloned().collect();
    for block in &function.blocks {
        for instr in &block.instructions {
            if let Some(result) = instr.result() {
                if env.contains_key(&result) {
                    return Err(VerifyError::Reassigned {
                        function: name.clone(),
                        temp: result,
                    });
                }
                env.insert(result, result_type(instr));
            }
        }
    }

    for block in &function.blocks {
        for instr in &block.instructions {
            check_instruction(module, function, &env, instr)?;
        }
    }
    Ok(())
}

/// The type an instruction's result temporary is recorded with
fn result_type(instr: &Instruction) -> IrType {
    match instr {
        Instruction::Binary { ty, .. } => ty.clone(),
        Instruction::Cmp { .. } => IrType::I1,
        Instruction::Not { ty, .. } | Instruction::Neg { ty, .. } => ty.clone(),
        Instruction::Cast { to, .. } => to.clone(),
        Instruction::Load { ty, .. } => ty.clone(),
        Instruction::GetElementPtr { result_ty, .. } => result_ty.clone(),
        Instruction::Alloca { ty, .. } => ty.clone().pointer_to(),
        Instruction::Call { ret_ty, .. } => ret_ty.clone(),
        _ => IrType::Void,
    }
}

fn value_type(
    module: &Module,
    function: &Function,
    env: &HashMap<TempId, IrType>,
    value: &Value,
) -> Result<IrType, VerifyError> {
    match value {
        Value::Temp(id) => env.get(id).cloned().ok_or(VerifyError::UndefinedTemp {
            function: function.name.clone(),
            temp: *id,
        }),
        Value::Const(c) => Ok(c.ty()),
        Value::Global(name) => module
            .get_global(name)
            .map(|g| g.ty.clone().pointer_to())
            .ok_or_else(|| VerifyError::UnknownGlobalRef {
                function: function.name.clone(),
                name: name.clone(),
            }),
        Value::Function(name) => Err(VerifyError::Type {
            function: function.name.clone(),
            message: format!("function reference @{} used outside a call", name),
        }),
    }
}

fn type_error(function: &Function, message: String) -> VerifyError {
    VerifyError::Type {
        function: function.name.clone(),
        message,
    }
}

fn check_instruction(
    module: &Module,
    function: &Function,
    env: &HashMap<TempId, IrType>,
    instr: &Instruction,
) -> Result<(), VerifyError> {
    match instr {
        Instruction::Binary { op, lhs, rhs, ty, .. } => {
            let lt = value_type(module, function, env, lhs)?;
            let rt = value_type(module, function, env, rhs)?;
            if lt != *ty || rt != *ty {
                return Err(type_error(
                    function,
                    format!("{} operands {} and {} do not match type {}", op, lt, rt, ty),
                ));
            }
            if op.is_float() && !ty.is_float() {
                return Err(type_error(
                    function,
                    format!("float operation {} on non-float type {}", op, ty),
                ));
            }
            if !op.is_float() && !ty.is_integer() {
                return Err(type_error(
                    function,
                    format!("integer operation {} on non-integer type {}", op, ty),
                ));
            }
            Ok(())
        }
        Instruction::Cmp {
            op,
            lhs,
            rhs,
            operand_ty,
            ..
        } => {
            let lt = value_type(module, function, env, lhs)?;
            let rt = value_type(module, function, env, rhs)?;
            if lt != *operand_ty || rt != *operand_ty {
                return Err(type_error(
                    function,
                    format!(
                        "comparison operands {} and {} do not match type {}",
                        lt, rt, operand_ty
                    ),
                ));
            }
            if op.is_float() != operand_ty.is_float() {
                return Err(type_error(
                    function,
                    format!("predicate {} does not fit operand type {}", op, operand_ty),
                ));
            }
            if !op.is_float() && !operand_ty.is_integer() && !operand_ty.is_pointer() {
                return Err(type_error(
                    function,
                    format!("integer comparison on type {}", operand_ty),
                ));
            }
            Ok(())
        }
        Instruction::Not { operand, ty, .. } => {
            let ot = value_type(module, function, env, operand)?;
            if ot != *ty || !ty.is_integer() {
                return Err(type_error(function, format!("not on type {}", ot)));
            }
            Ok(())
        }
        Instruction::Neg { operand, ty, .. } => {
            let ot = value_type(module, function, env, operand)?;
            if ot != *ty || !(ty.is_integer() || ty.is_float()) {
                return Err(type_error(function, format!("neg on type {}", ot)));
            }
            Ok(())
        }
        Instruction::Cast {
            op,
            value,
            from,
            to,
            ..
        } => {
            let vt = value_type(module, function, env, value)?;
            if vt != *from {
                return Err(type_error(
                    function,
                    format!("cast source is {}, recorded as {}", vt, from),
                ));
            }
            let (fb, tb) = match (from.int_bits(), to.int_bits()) {
                (Some(fb), Some(tb)) => (fb, tb),
                _ => {
                    return Err(type_error(
                        function,
                        format!("{} between non-integer types {} and {}", op, from, to),
                    ))
                }
            };
            let widening_ok = match op {
                CastOp::ZExt | CastOp::SExt => tb > fb,
                CastOp::Trunc => tb < fb,
            };
            if !widening_ok {
                return Err(type_error(
                    function,
                    format!("{} from {} to {} does not change width correctly", op, from, to),
                ));
            }
            Ok(())
        }
        Instruction::Load { ptr, ty, .. } => {
            let pt = value_type(module, function, env, ptr)?;
            match pt {
                IrType::Ptr(pointee) if *pointee == *ty => Ok(()),
                other => Err(type_error(
                    function,
                    format!("load of {} through {}", ty, other),
                )),
            }
        }
        Instruction::Store { value, ptr, ty } => {
            let vt = value_type(module, function, env, value)?;
            if vt != *ty {
                return Err(type_error(
                    function,
                    format!("store of {} recorded as {}", vt, ty),
                ));
            }
            let pt = value_type(module, function, env, ptr)?;
            match pt {
                IrType::Ptr(pointee) if *pointee == *ty => Ok(()),
                other => Err(type_error(
                    function,
                    format!("store of {} through {}", ty, other),
                )),
            }
        }
        Instruction::GetElementPtr {
            base,
            base_ty,
            indices,
            result_ty,
            ..
        } => {
            let bt = value_type(module, function, env, base)?;
            match &bt {
                IrType::Ptr(pointee) if **pointee == *base_ty => {}
                other => {
                    return Err(type_error(
                        function,
                        format!("getelementptr base {} does not point at {}", other, base_ty),
                    ))
                }
            }
            if indices.is_empty() {
                return Err(type_error(function, "getelementptr without indices".into()));
            }
            for index in indices {
                let it = value_type(module, function, env, index)?;
                if it != IrType::I64 {
                    return Err(type_error(
                        function,
                        format!("getelementptr index of type {}", it),
                    ));
                }
            }
            // Recompute the result type by walking the indices
            let mut current = base_ty.clone();
            for index in &indices[1..] {
                current = match &current {
                    IrType::Array { element, .. } => (**element).clone(),
                    IrType::Struct { .. } | IrType::Union { .. } => {
                        let field = match index {
                            Value::Const(Constant::Int { value, .. }) => *value,
                            _ => {
                                return Err(type_error(
                                    function,
                                    "aggregate field index must be constant".into(),
                                ))
                            }
                        };
                        current
                            .field_type(field as usize)
                            .cloned()
                            .ok_or_else(|| {
                                type_error(
                                    function,
                                    format!("field index {} out of range for {}", field, current),
                                )
                            })?
                    }
                    other => {
                        return Err(type_error(
                            function,
                            format!("getelementptr into scalar type {}", other),
                        ))
                    }
                };
            }
            let computed = current.pointer_to();
            if computed != *result_ty {
                return Err(type_error(
                    function,
                    format!(
                        "getelementptr result recorded as {}, computed {}",
                        result_ty, computed
                    ),
                ));
            }
            Ok(())
        }
        Instruction::Alloca { ty, .. } => {
            if ty.size_in_bytes().is_none() {
                return Err(type_error(function, format!("alloca of unsized type {}", ty)));
            }
            Ok(())
        }
        Instruction::Call {
            callee,
            args,
            ret_ty,
            result,
        } => {
            let name = match callee {
                Value::Function(name) => name,
                other => {
                    return Err(type_error(
                        function,
                        format!("call target {} is not a function", other),
                    ))
                }
            };
            let target = module
                .get_function(name)
                .ok_or_else(|| VerifyError::UnknownCallee {
                    function: function.name.clone(),
                    name: name.clone(),
                })?;
            if target.return_type != *ret_ty {
                return Err(type_error(
                    function,
                    format!(
                        "call to @{} recorded as {}, declared {}",
                        name, ret_ty, target.return_type
                    ),
                ));
            }
            if result.is_some() && *ret_ty == IrType::Void {
                return Err(type_error(
                    function,
                    format!("void call to @{} binds a result", name),
                ));
            }
            let fixed = target.params.len();
            let arity_ok = if target.is_vararg {
                args.len() >= fixed
            } else {
                args.len() == fixed
            };
            if !arity_ok {
                return Err(type_error(
                    function,
                    format!(
                        "call to @{} passes {} arguments, expected {}",
                        name,
                        args.len(),
                        fixed
                    ),
                ));
            }
            for (arg, (_, param_ty)) in args.iter().zip(target.params.iter()) {
                let at = value_type(module, function, env, arg)?;
                if at != *param_ty {
                    return Err(type_error(
                        function,
                        format!("call to @{} passes {}, expected {}", name, at, param_ty),
                    ));
                }
            }
            // Vararg tail is unchecked beyond being typeable
            for arg in args.iter().skip(fixed) {
                value_type(module, function, env, arg)?;
            }
            Ok(())
        }
        Instruction::Return { value } => match (&function.return_type, value) {
            (IrType::Void, None) => Ok(()),
            (IrType::Void, Some(_)) => Err(type_error(
                function,
                "void function returns a value".into(),
            )),
            (expected, Some(value)) => {
                let vt = value_type(module, function, env, value)?;
                if vt != *expected {
                    return Err(type_error(
                        function,
                        format!("return of {} from function returning {}", vt, expected),
                    ));
                }
                Ok(())
            }
            (expected, None) => Err(type_error(
                function,
                format!("missing return value for function returning {}", expected),
            )),
        },
        Instruction::CondBranch { cond, .. } => {
            let ct = value_type(module, function, env, cond)?;
            if ct != IrType::I1 {
                return Err(type_error(
                    function,
                    format!("conditional branch on type {}", ct),
                ));
            }
            Ok(())
        }
        Instruction::Branch { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, GlobalVariable, Linkage};

    fn module_with(function: Function) -> Module {
        let mut module = Module::new("test".to_string());
        module.add_function(function);
        module
    }

    #[test]
    fn test_missing_terminator() {
        let mut func = Function::new("f".to_string(), IrType::Void);
        func.blocks.push(BasicBlock::new(0, "entry".to_string()));

        let err = verify_function(&module_with(func), "f").unwrap_err();
        assert!(matches!(err, VerifyError::MissingTerminator { .. }));
    }

    #[test]
    fn test_unreachable_block() {
        let mut func = Function::new("f".to_string(), IrType::Void);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Return { value: None });
        func.blocks.push(entry);
        let mut orphan = BasicBlock::new(1, "orphan".to_string());
        orphan.push(Instruction::Return { value: None });
        func.blocks.push(orphan);

        let err = verify_function(&module_with(func), "f").unwrap_err();
        assert!(matches!(err, VerifyError::UnreachableBlock { .. }));
    }

    #[test]
    fn test_branch_to_unknown_block() {
        let mut func = Function::new("f".to_string(), IrType::Void);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Branch { target: 9 });
        func.blocks.push(entry);

        let err = verify_function(&module_with(func), "f").unwrap_err();
        assert!(matches!(err, VerifyError::UnknownBlock { target: 9, .. }));
    }

    #[test]
    fn test_store_type_mismatch() {
        let mut module = Module::new("test".to_string());
        module.add_global(GlobalVariable {
            name: "g".to_string(),
            ty: IrType::I32,
            init: Constant::i32(0),
            is_constant: false,
            linkage: Linkage::External,
        });
        let mut func = Function::new("f".to_string(), IrType::Void);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Store {
            value: Value::Const(Constant::i64(1)),
            ptr: Value::Global("g".to_string()),
            ty: IrType::I64,
        });
        entry.push(Instruction::Return { value: None });
        func.blocks.push(entry);
        module.add_function(func);

        let err = verify_function(&module, "f").unwrap_err();
        assert!(matches!(err, VerifyError::Type { .. }));
    }

    #[test]
    fn test_reassigned_temp() {
        let mut func = Function::new("f".to_string(), IrType::Void);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Alloca {
            result: 0,
            ty: IrType::I32,
            name: None,
        });
        entry.push(Instruction::Alloca {
            result: 0,
            ty: IrType::I32,
            name: None,
        });
        entry.push(Instruction::Return { value: None });
        func.blocks.push(entry);

        let err = verify_function(&module_with(func), "f").unwrap_err();
        assert!(matches!(err, VerifyError::Reassigned { temp: 0, .. }));
    }

    #[test]
    fn test_valid_function_passes() {
        let mut module = Module::new("test".to_string());
        module.add_global(GlobalVariable {
            name: "a".to_string(),
            ty: IrType::I32,
            init: Constant::i32(1),
            is_constant: false,
            linkage: Linkage::External,
        });
        let mut func = Function::new("main".to_string(), IrType::I32);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Load {
            result: 0,
            ptr: Value::Global("a".to_string()),
            ty: IrType::I32,
        });
        entry.push(Instruction::Return {
            value: Some(Value::Temp(0)),
        });
        func.blocks.push(entry);
        module.add_function(func);

        assert_eq!(verify_function(&module, "main"), Ok(()));
        assert_eq!(verify_module(&module), Ok(()));
    }

    #[test]
    fn test_duplicate_global() {
        let mut module = Module::new("test".to_string());
        for _ in 0..2 {
            module.add_global(GlobalVariable {
                name: "g".to_string(),
                ty: IrType::I32,
                init: Constant::i32(0),
                is_constant: false,
                linkage: Linkage::External,
            });
        }
        let err = verify_module(&module).unwrap_err();
        assert_eq!(err, VerifyError::DuplicateGlobal("g".to_string()));
    }
}
