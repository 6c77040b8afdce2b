//! Reference evaluator
//!
//! Executes a verified module directly on a small virtual machine: flat
//! byte memory, globals materialized from their initializers, a
//! bump-allocated stack for `alloca`, and a captured output buffer for
//! `printf`. A step budget guards non-terminating control flow. Used by
//! the scenario tests and the driver's `run` command; never by the
//! emission engine itself.

use crate::ir::{BinaryOp, CastOp, CmpOp, Constant, Function, Instruction, Module, Value};
use crate::types::IrType;
use dire_common::TempId;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

const MEMORY_SIZE: usize = 1 << 20;
const STEP_BUDGET: u64 = 1_000_000;

/// Runtime value: integers are kept sign-extended to 64 bits, floats as
/// f64, addresses as raw offsets into the machine's memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunValue {
    Int(i64),
    Float(f64),
    Ptr(u64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("call to external function `{0}`")]
    ExternalCall(String),

    #[error("unknown global `{0}`")]
    UnknownGlobal(String),

    #[error("use of undefined temporary %{0}")]
    UndefinedTemp(TempId),

    #[error("unknown block {0}")]
    UnknownBlock(u32),

    #[error("step budget exhausted")]
    StepBudget,

    #[error("out of memory")]
    OutOfMemory,

    #[error("memory access at {addr}+{size} out of bounds")]
    MemoryAccess { addr: u64, size: u64 },

    #[error("division by zero")]
    DivideByZero,

    #[error("wrong number of arguments for `{0}`")]
    ArityMismatch(String),

    #[error("evaluation type error: {0}")]
    Type(String),
}

/// An executing machine over one module
pub struct Machine<'m> {
    module: &'m Module,
    memory: Vec<u8>,
    globals: HashMap<String, u64>,
    /// Bump pointer for stack storage; saved and restored around calls
    sp: u64,
    steps: u64,
    /// Captured printf output
    pub output: String,
}

impl<'m> Machine<'m> {
    /// Set up memory and materialize all globals from their initializers.
    /// Address 0 stays unused so null pointers never alias storage.
    pub fn new(module: &'m Module) -> Result<Self, EvalError> {
        let mut machine = Machine {
            module,
            memory: vec![0; MEMORY_SIZE],
            globals: HashMap::new(),
            sp: 8,
            steps: STEP_BUDGET,
            output: String::new(),
        };
        for global in &module.globals {
            let size = global
                .ty
                .size_in_bytes()
                .ok_or_else(|| EvalError::Type(format!("unsized global `{}`", global.name)))?;
            let addr = machine.allocate(size)?;
            machine.write_constant(addr, &global.init)?;
            machine.globals.insert(global.name.clone(), addr);
        }
        debug!(
            "machine ready: {} globals, {} bytes of static data",
            module.globals.len(),
            machine.sp - 8
        );
        Ok(machine)
    }

    /// Execute a defined function by name
    pub fn run(&mut self, name: &str, args: &[RunValue]) -> Result<Option<RunValue>, EvalError> {
        self.steps = STEP_BUDGET;
        self.call(name, args)
    }

    /// Read a scalar global's current value
    pub fn read_global(&self, name: &str) -> Result<RunValue, EvalError> {
        let global = self
            .module
            .get_global(name)
            .ok_or_else(|| EvalError::UnknownGlobal(name.to_string()))?;
        let addr = self.globals[name];
        self.load_typed(addr, &global.ty)
    }

    fn allocate(&mut self, size: u64) -> Result<u64, EvalError> {
        // 8-byte alignment keeps scalar loads in bounds of their slots
        let addr = (self.sp + 7) & !7;
        let end = addr + size.max(1);
        if end > self.memory.len() as u64 {
            return Err(EvalError::OutOfMemory);
        }
        self.sp = end;
        Ok(addr)
    }

    fn call(&mut self, name: &str, args: &[RunValue]) -> Result<Option<RunValue>, EvalError> {
        let function = self
            .module
            .get_function(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        if function.is_declaration() {
            return self.call_external(name, args);
        }
        if args.len() != function.params.len() {
            return Err(EvalError::ArityMismatch(name.to_string()));
        }

        let mut temps: HashMap<TempId, RunValue> = HashMap::new();
        for ((temp, _), arg) in function.params.iter().zip(args) {
            temps.insert(*temp, *arg);
        }

        // Stack storage is released when the frame returns
        let saved_sp = self.sp;
        let result = self.exec_body(function, &mut temps);
        self.sp = saved_sp;
        result
    }

    fn exec_body(
        &mut self,
        function: &Function,
        temps: &mut HashMap<TempId, RunValue>,
    ) -> Result<Option<RunValue>, EvalError> {
        let mut block = function
            .entry_block()
            .ok_or_else(|| EvalError::UnknownFunction(function.name.clone()))?;
        loop {
            let mut next = None;
            for instr in &block.instructions {
                if self.steps == 0 {
                    return Err(EvalError::StepBudget);
                }
                self.steps -= 1;

                match instr {
                    Instruction::Return { value } => {
                        return match value {
                            Some(value) => Ok(Some(self.eval(temps, value)?)),
                            None => Ok(None),
                        };
                    }
                    Instruction::Branch { target } => {
                        next = Some(*target);
                        break;
                    }
                    Instruction::CondBranch {
                        cond,
                        then_block,
                        else_block,
                    } => {
                        let taken = match self.eval(temps, cond)? {
                            RunValue::Int(v) => v != 0,
                            other => {
                                return Err(EvalError::Type(format!(
                                    "branch condition {:?}",
                                    other
                                )))
                            }
                        };
                        next = Some(if taken { *then_block } else { *else_block });
                        break;
                    }
                    other => self.exec_instruction(temps, other)?,
                }
            }
            match next {
                Some(id) => {
                    block = function
                        .get_block(id)
                        .ok_or(EvalError::UnknownBlock(id))?;
                }
                None => {
                    // The verifier guarantees a terminator; reaching here
                    // means the function was never verified
                    return Err(EvalError::Type(format!(
                        "block `{}` fell through without a terminator",
                        block.label
                    )));
                }
            }
        }
    }

    fn exec_instruction(
        &mut self,
        temps: &mut HashMap<TempId, RunValue>,
        instr: &Instruction,
    ) -> Result<(), EvalError> {
        match instr {
            Instruction::Binary {
                result,
                op,
                lhs,
                rhs,
                ty,
            } => {
                let lhs = self.eval(temps, lhs)?;
                let rhs = self.eval(temps, rhs)?;
                let value = apply_binary(*op, lhs, rhs, ty)?;
                temps.insert(*result, value);
            }
            Instruction::Cmp {
                result,
                op,
                lhs,
                rhs,
                operand_ty,
            } => {
                let lhs = self.eval(temps, lhs)?;
                let rhs = self.eval(temps, rhs)?;
                let value = apply_cmp(*op, lhs, rhs, operand_ty)?;
                temps.insert(*result, RunValue::Int(value as i64));
            }
            Instruction::Not { result, operand, ty } => {
                let v = self.eval_int(temps, operand)?;
                temps.insert(*result, RunValue::Int(normalize(!v, ty)));
            }
            Instruction::Neg { result, operand, ty } => {
                let value = match self.eval(temps, operand)? {
                    RunValue::Int(v) => RunValue::Int(normalize(v.wrapping_neg(), ty)),
                    RunValue::Float(v) => RunValue::Float(-v),
                    other => return Err(EvalError::Type(format!("neg of {:?}", other))),
                };
                temps.insert(*result, value);
            }
            Instruction::Cast {
                result,
                op,
                value,
                from,
                to,
            } => {
                let v = self.eval_int(temps, value)?;
                let cast = match op {
                    CastOp::ZExt => to_unsigned(v, from) as i64,
                    CastOp::SExt => v,
                    CastOp::Trunc => normalize(v, to),
                };
                temps.insert(*result, RunValue::Int(cast));
            }
            Instruction::Load { result, ptr, ty } => {
                let addr = self.eval_ptr(temps, ptr)?;
                let value = self.load_typed(addr, ty)?;
                temps.insert(*result, value);
            }
            Instruction::Store { value, ptr, ty } => {
                let value = self.eval(temps, value)?;
                let addr = self.eval_ptr(temps, ptr)?;
                self.store_typed(addr, ty, value)?;
            }
            Instruction::GetElementPtr {
                result,
                base,
                base_ty,
                indices,
                ..
            } => {
                let mut addr = self.eval_ptr(temps, base)?;
                let first = indices
                    .first()
                    .ok_or_else(|| EvalError::Type("getelementptr without indices".into()))?;
                let first = self.eval_int(temps, first)?;
                let base_size = base_ty
                    .size_in_bytes()
                    .ok_or_else(|| EvalError::Type(format!("unsized gep base {}", base_ty)))?;
                addr = addr.wrapping_add((first * base_size as i64) as u64);

                let mut current = base_ty.clone();
                for index in &indices[1..] {
                    let idx = self.eval_int(temps, index)?;
                    current = match &current {
                        IrType::Array { element, .. } => {
                            let stride = element.size_in_bytes().ok_or_else(|| {
                                EvalError::Type(format!("unsized element {}", element))
                            })?;
                            addr = addr.wrapping_add((idx * stride as i64) as u64);
                            (**element).clone()
                        }
                        agg @ (IrType::Struct { .. } | IrType::Union { .. }) => {
                            let offset = agg.field_offset(idx as usize).ok_or_else(|| {
                                EvalError::Type(format!("field {} of {}", idx, agg))
                            })?;
                            addr = addr.wrapping_add(offset);
                            agg.field_type(idx as usize)
                                .cloned()
                                .ok_or_else(|| EvalError::Type(format!("field {} of {}", idx, agg)))?
                        }
                        other => {
                            return Err(EvalError::Type(format!("gep into scalar {}", other)))
                        }
                    };
                }
                temps.insert(*result, RunValue::Ptr(addr));
            }
            Instruction::Alloca { result, ty, .. } => {
                let size = ty
                    .size_in_bytes()
                    .ok_or_else(|| EvalError::Type(format!("alloca of {}", ty)))?;
                let addr = self.allocate(size)?;
                temps.insert(*result, RunValue::Ptr(addr));
            }
            Instruction::Call {
                result,
                callee,
                args,
                ..
            } => {
                let name = match callee {
                    Value::Function(name) => name.clone(),
                    other => {
                        return Err(EvalError::Type(format!("call target {:?}", other)))
                    }
                };
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval(temps, arg)?);
                }
                let returned = self.call(&name, &arg_values)?;
                if let Some(result) = result {
                    let value = returned.ok_or_else(|| {
                        EvalError::Type(format!("void call to `{}` bound to a result", name))
                    })?;
                    temps.insert(*result, value);
                }
            }
            // Terminators are handled by the block loop
            _ => {
                return Err(EvalError::Type(format!(
                    "unexpected instruction {:?}",
                    instr
                )))
            }
        }
        Ok(())
    }

    fn call_external(
        &mut self,
        name: &str,
        args: &[RunValue],
    ) -> Result<Option<RunValue>, EvalError> {
        if name == "printf" {
            let written = self.do_printf(args)?;
            return Ok(Some(RunValue::Int(written)));
        }
        Err(EvalError::ExternalCall(name.to_string()))
    }

    /// Minimal printf: literal text and %d, which is all the demonstration
    /// programs use
    fn do_printf(&mut self, args: &[RunValue]) -> Result<i64, EvalError> {
        let format_ptr = match args.first() {
            Some(RunValue::Ptr(addr)) => *addr,
            _ => return Err(EvalError::Type("printf without a format string".into())),
        };
        let format = self.read_c_string(format_ptr)?;
        let mut rendered = String::new();
        let mut next_arg = args[1..].iter();
        let mut chars = format.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                rendered.push(c);
                continue;
            }
            match chars.next() {
                Some('d') => match next_arg.next() {
                    Some(RunValue::Int(v)) => rendered.push_str(&v.to_string()),
                    _ => return Err(EvalError::Type("printf %d without an integer".into())),
                },
                Some('%') => rendered.push('%'),
                other => {
                    return Err(EvalError::Type(format!(
                        "unsupported printf conversion %{}",
                        other.map(String::from).unwrap_or_default()
                    )))
                }
            }
        }
        let written = rendered.len() as i64;
        self.output.push_str(&rendered);
        Ok(written)
    }

    fn read_c_string(&self, addr: u64) -> Result<String, EvalError> {
        let mut bytes = Vec::new();
        let mut cursor = addr;
        loop {
            let byte = *self
                .memory
                .get(cursor as usize)
                .ok_or(EvalError::MemoryAccess { addr: cursor, size: 1 })?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
            cursor += 1;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn eval(&self, temps: &HashMap<TempId, RunValue>, value: &Value) -> Result<RunValue, EvalError> {
        match value {
            Value::Temp(id) => temps.get(id).copied().ok_or(EvalError::UndefinedTemp(*id)),
            Value::Const(c) => constant_value(c),
            Value::Global(name) => self
                .globals
                .get(name)
                .map(|addr| RunValue::Ptr(*addr))
                .ok_or_else(|| EvalError::UnknownGlobal(name.clone())),
            Value::Function(name) => Err(EvalError::Type(format!(
                "function reference @{} evaluated as a value",
                name
            ))),
        }
    }

    fn eval_int(&self, temps: &HashMap<TempId, RunValue>, value: &Value) -> Result<i64, EvalError> {
        match self.eval(temps, value)? {
            RunValue::Int(v) => Ok(v),
            other => Err(EvalError::Type(format!("expected integer, got {:?}", other))),
        }
    }

    fn eval_ptr(&self, temps: &HashMap<TempId, RunValue>, value: &Value) -> Result<u64, EvalError> {
        match self.eval(temps, value)? {
            RunValue::Ptr(addr) => Ok(addr),
            other => Err(EvalError::Type(format!("expected address, got {:?}", other))),
        }
    }

    fn slice(&self, addr: u64, size: u64) -> Result<&[u8], EvalError> {
        let start = addr as usize;
        let end = start + size as usize;
        self.memory
            .get(start..end)
            .ok_or(EvalError::MemoryAccess { addr, size })
    }

    fn slice_mut(&mut self, addr: u64, size: u64) -> Result<&mut [u8], EvalError> {
        let start = addr as usize;
        let end = start + size as usize;
        self.memory
            .get_mut(start..end)
            .ok_or(EvalError::MemoryAccess { addr, size })
    }

    fn load_typed(&self, addr: u64, ty: &IrType) -> Result<RunValue, EvalError> {
        match ty {
            IrType::I1 => Ok(RunValue::Int((self.slice(addr, 1)?[0] != 0) as i64)),
            IrType::I8 => Ok(RunValue::Int(self.slice(addr, 1)?[0] as i8 as i64)),
            IrType::I16 => {
                let b = self.slice(addr, 2)?;
                Ok(RunValue::Int(i16::from_le_bytes([b[0], b[1]]) as i64))
            }
            IrType::I32 => {
                let b = self.slice(addr, 4)?;
                Ok(RunValue::Int(
                    i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64
                ))
            }
            IrType::I64 => {
                let b = self.slice(addr, 8)?;
                Ok(RunValue::Int(i64::from_le_bytes(b.try_into().unwrap())))
            }
            IrType::F32 => {
                let b = self.slice(addr, 4)?;
                Ok(RunValue::Float(
                    f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
                ))
            }
            // F80 slots hold an f64 payload in their first 8 bytes
            IrType::F64 | IrType::F80 => {
                let b = self.slice(addr, 8)?;
                Ok(RunValue::Float(f64::from_le_bytes(b.try_into().unwrap())))
            }
            IrType::Ptr(_) => {
                let b = self.slice(addr, 8)?;
                Ok(RunValue::Ptr(u64::from_le_bytes(b.try_into().unwrap())))
            }
            other => Err(EvalError::Type(format!("scalar load of {}", other))),
        }
    }

    fn store_typed(&mut self, addr: u64, ty: &IrType, value: RunValue) -> Result<(), EvalError> {
        match (ty, value) {
            (IrType::I1, RunValue::Int(v)) => {
                self.slice_mut(addr, 1)?[0] = (v != 0) as u8;
            }
            (IrType::I8, RunValue::Int(v)) => {
                self.slice_mut(addr, 1)?[0] = v as u8;
            }
            (IrType::I16, RunValue::Int(v)) => {
                self.slice_mut(addr, 2)?
                    .copy_from_slice(&(v as i16).to_le_bytes());
            }
            (IrType::I32, RunValue::Int(v)) => {
                self.slice_mut(addr, 4)?
                    .copy_from_slice(&(v as i32).to_le_bytes());
            }
            (IrType::I64, RunValue::Int(v)) => {
                self.slice_mut(addr, 8)?.copy_from_slice(&v.to_le_bytes());
            }
            (IrType::F32, RunValue::Float(v)) => {
                self.slice_mut(addr, 4)?
                    .copy_from_slice(&(v as f32).to_le_bytes());
            }
            (IrType::F64 | IrType::F80, RunValue::Float(v)) => {
                self.slice_mut(addr, 8)?.copy_from_slice(&v.to_le_bytes());
            }
            (IrType::Ptr(_), RunValue::Ptr(v)) => {
                self.slice_mut(addr, 8)?.copy_from_slice(&v.to_le_bytes());
            }
            (ty, value) => {
                return Err(EvalError::Type(format!(
                    "store of {:?} as {}",
                    value, ty
                )))
            }
        }
        Ok(())
    }

    fn write_constant(&mut self, addr: u64, constant: &Constant) -> Result<(), EvalError> {
        match constant {
            Constant::Int { ty, value } => {
                self.store_typed(addr, ty, RunValue::Int(*value))?;
            }
            Constant::Float { ty, value } => {
                self.store_typed(addr, ty, RunValue::Float(*value))?;
            }
            Constant::Null { ty } => {
                self.store_typed(addr, ty, RunValue::Ptr(0))?;
            }
            Constant::Array { ty, elements } => {
                let stride = ty
                    .element_type()
                    .and_then(|e| e.size_in_bytes())
                    .ok_or_else(|| EvalError::Type(format!("unsized array {}", ty)))?;
                for (i, element) in elements.iter().enumerate() {
                    self.write_constant(addr + i as u64 * stride, element)?;
                }
            }
            Constant::Struct { ty, fields } => {
                for (i, field) in fields.iter().enumerate() {
                    let offset = ty
                        .field_offset(i)
                        .ok_or_else(|| EvalError::Type(format!("field {} of {}", i, ty)))?;
                    self.write_constant(addr + offset, field)?;
                }
            }
            Constant::Str { data } => {
                let bytes = data.as_bytes();
                let dest = self.slice_mut(addr, bytes.len() as u64 + 1)?;
                dest[..bytes.len()].copy_from_slice(bytes);
                dest[bytes.len()] = 0;
            }
        }
        Ok(())
    }
}

fn constant_value(constant: &Constant) -> Result<RunValue, EvalError> {
    match constant {
        Constant::Int { value, .. } => Ok(RunValue::Int(*value)),
        Constant::Float { value, .. } => Ok(RunValue::Float(*value)),
        Constant::Null { .. } => Ok(RunValue::Ptr(0)),
        other => Err(EvalError::Type(format!(
            "aggregate constant {:?} used as an operand",
            other
        ))),
    }
}

/// Truncate to the type's width, then sign-extend back to i64
fn normalize(value: i64, ty: &IrType) -> i64 {
    match ty.int_bits() {
        Some(64) | None => value,
        Some(1) => (value & 1 != 0) as i64,
        Some(bits) => {
            let shift = 64 - bits;
            (value << shift) >> shift
        }
    }
}

fn to_unsigned(value: i64, ty: &IrType) -> u64 {
    match ty.int_bits() {
        Some(64) | None => value as u64,
        Some(bits) => (value as u64) & ((1u64 << bits) - 1),
    }
}

fn apply_binary(
    op: BinaryOp,
    lhs: RunValue,
    rhs: RunValue,
    ty: &IrType,
) -> Result<RunValue, EvalError> {
    if op.is_float() {
        let (a, b) = match (lhs, rhs) {
            (RunValue::Float(a), RunValue::Float(b)) => (a, b),
            _ => return Err(EvalError::Type(format!("{} on non-floats", op))),
        };
        let value = match op {
            BinaryOp::FAdd => a + b,
            BinaryOp::FSub => a - b,
            BinaryOp::FMul => a * b,
            BinaryOp::FDiv => a / b,
            _ => unreachable!(),
        };
        return Ok(RunValue::Float(value));
    }

    let (a, b) = match (lhs, rhs) {
        (RunValue::Int(a), RunValue::Int(b)) => (a, b),
        _ => return Err(EvalError::Type(format!("{} on non-integers", op))),
    };
    let ua = to_unsigned(a, ty);
    let ub = to_unsigned(b, ty);
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::SDiv => {
            if b == 0 {
                return Err(EvalError::DivideByZero);
            }
            a.wrapping_div(b)
        }
        BinaryOp::SRem => {
            if b == 0 {
                return Err(EvalError::DivideByZero);
            }
            a.wrapping_rem(b)
        }
        BinaryOp::UDiv => {
            if ub == 0 {
                return Err(EvalError::DivideByZero);
            }
            (ua / ub) as i64
        }
        BinaryOp::URem => {
            if ub == 0 {
                return Err(EvalError::DivideByZero);
            }
            (ua % ub) as i64
        }
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(ub as u32),
        BinaryOp::LShr => (ua >> (ub as u32 & 63)) as i64,
        BinaryOp::AShr => a.wrapping_shr(ub as u32),
        _ => unreachable!(),
    };
    Ok(RunValue::Int(normalize(value, ty)))
}

fn apply_cmp(op: CmpOp, lhs: RunValue, rhs: RunValue, ty: &IrType) -> Result<bool, EvalError> {
    if op.is_float() {
        let (a, b) = match (lhs, rhs) {
            (RunValue::Float(a), RunValue::Float(b)) => (a, b),
            _ => return Err(EvalError::Type(format!("fcmp {} on non-floats", op))),
        };
        let unordered = a.is_nan() || b.is_nan();
        return Ok(match op {
            CmpOp::Foeq => !unordered && a == b,
            CmpOp::Fone => !unordered && a != b,
            CmpOp::Folt => !unordered && a < b,
            CmpOp::Fole => !unordered && a <= b,
            CmpOp::Fogt => !unordered && a > b,
            CmpOp::Foge => !unordered && a >= b,
            CmpOp::Fune => unordered || a != b,
            _ => unreachable!(),
        });
    }

    let (a, b) = match (lhs, rhs) {
        (RunValue::Int(a), RunValue::Int(b)) => (a, b),
        (RunValue::Ptr(a), RunValue::Ptr(b)) => (a as i64, b as i64),
        _ => return Err(EvalError::Type(format!("icmp {} on mixed operands", op))),
    };
    let ua = to_unsigned(a, ty);
    let ub = to_unsigned(b, ty);
    Ok(match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::Slt => a < b,
        CmpOp::Sle => a <= b,
        CmpOp::Sgt => a > b,
        CmpOp::Sge => a >= b,
        CmpOp::Ult => ua < ub,
        CmpOp::Ule => ua <= ub,
        CmpOp::Ugt => ua > ub,
        CmpOp::Uge => ua >= ub,
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlock, GlobalVariable, Linkage};

    fn global_i32(name: &str, value: i64) -> GlobalVariable {
        GlobalVariable {
            name: name.to_string(),
            ty: IrType::I32,
            init: Constant::i32(value),
            is_constant: false,
            linkage: Linkage::External,
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0x1_0000_0001, &IrType::I32), 1);
        assert_eq!(normalize(-1, &IrType::I8), -1);
        assert_eq!(normalize(255, &IrType::I8), -1);
        assert_eq!(normalize(3, &IrType::I1), 1);
    }

    #[test]
    fn test_binary_semantics() {
        let i32t = IrType::I32;
        let int = RunValue::Int;
        assert_eq!(
            apply_binary(BinaryOp::Sub, int(3), int(5), &i32t),
            Ok(int(-2))
        );
        assert_eq!(
            apply_binary(BinaryOp::UDiv, int(-2), int(2), &i32t),
            Ok(int(0x7fff_ffff))
        );
        assert_eq!(
            apply_binary(BinaryOp::SDiv, int(7), int(0), &i32t),
            Err(EvalError::DivideByZero)
        );
        assert_eq!(
            apply_binary(BinaryOp::AShr, int(-8), int(2), &i32t),
            Ok(int(-2))
        );
        assert_eq!(
            apply_binary(
                BinaryOp::FMul,
                RunValue::Float(1.5),
                RunValue::Float(2.0),
                &IrType::F64
            ),
            Ok(RunValue::Float(3.0))
        );
    }

    #[test]
    fn test_unsigned_compare() {
        // -1 compares above 1 when unsigned
        assert_eq!(
            apply_cmp(CmpOp::Ugt, RunValue::Int(-1), RunValue::Int(1), &IrType::I32),
            Ok(true)
        );
        assert_eq!(
            apply_cmp(CmpOp::Sgt, RunValue::Int(-1), RunValue::Int(1), &IrType::I32),
            Ok(false)
        );
    }

    #[test]
    fn test_load_global_initializer() {
        let mut module = Module::new("t".to_string());
        module.add_global(global_i32("a", 41));

        let machine = Machine::new(&module).unwrap();
        assert_eq!(machine.read_global("a"), Ok(RunValue::Int(41)));
    }

    #[test]
    fn test_run_simple_function() {
        let mut module = Module::new("t".to_string());
        module.add_global(global_i32("a", 7));

        let mut func = Function::new("main".to_string(), IrType::I32);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Load {
            result: 0,
            ptr: Value::Global("a".to_string()),
            ty: IrType::I32,
        });
        entry.push(Instruction::Binary {
            result: 1,
            op: BinaryOp::Add,
            lhs: Value::Temp(0),
            rhs: Value::Const(Constant::i32(1)),
            ty: IrType::I32,
        });
        entry.push(Instruction::Return {
            value: Some(Value::Temp(1)),
        });
        func.blocks.push(entry);
        module.add_function(func);

        let mut machine = Machine::new(&module).unwrap();
        assert_eq!(machine.run("main", &[]), Ok(Some(RunValue::Int(8))));
    }

    #[test]
    fn test_external_call_is_an_error() {
        let mut module = Module::new("t".to_string());
        module.add_function(Function::new("exit".to_string(), IrType::Void));

        let mut machine = Machine::new(&module).unwrap();
        assert_eq!(
            machine.run("exit", &[]),
            Err(EvalError::ExternalCall("exit".to_string()))
        );
    }

    #[test]
    fn test_printf_d() {
        let mut module = Module::new("t".to_string());
        module.add_global(GlobalVariable {
            name: ".fmt".to_string(),
            ty: IrType::Array {
                size: 10,
                element: Box::new(IrType::I8),
            },
            init: Constant::Str {
                data: "value:%d\n".to_string(),
            },
            is_constant: true,
            linkage: Linkage::Private,
        });

        let mut machine = Machine::new(&module).unwrap();
        let fmt = machine.globals[".fmt"];
        let written = machine
            .do_printf(&[RunValue::Ptr(fmt), RunValue::Int(42)])
            .unwrap();
        assert_eq!(machine.output, "value:42\n");
        assert_eq!(written, 9);
    }
}
