//! Value/address protocol
//!
//! Every named entity is represented as a memory address; reading it takes
//! an explicit load, writing it an explicit store, and pointer-typed
//! values take one extra indirection level before the final load.
//! Type mismatches are rejected here with a descriptive error instead of
//! being deferred to the verifier.

use super::{EmitContext, TypedValue};
use dire_common::EmitError;
use dire_ir::{BinaryOp, CastOp, CmpOp, Constant, Instruction, IrType, Value};
use log::trace;

impl EmitContext {
    /// Allocate function-local stack storage with unspecified content.
    /// Valid only while a function body is being built.
    pub fn alloc_local(&mut self, ty: IrType, name: &str) -> Result<TypedValue, EmitError> {
        let result = self.next_temp();
        let address_ty = ty.clone().pointer_to();
        self.push(Instruction::Alloca {
            result,
            ty,
            name: Some(name.to_string()),
        })?;
        trace!("alloc_local %{} : {}", result, address_ty);
        Ok(TypedValue::new(Value::Temp(result), address_ty))
    }

    /// Read through exactly one indirection; the pointee type comes from
    /// the address's own static type
    pub fn load(&mut self, address: &TypedValue) -> Result<TypedValue, EmitError> {
        let pointee = address.pointee()?.clone();
        let result = self.next_temp();
        self.push(Instruction::Load {
            result,
            ptr: address.value.clone(),
            ty: pointee.clone(),
        })?;
        Ok(TypedValue::new(Value::Temp(result), pointee))
    }

    /// Read through an address that itself holds a pointer: load the
    /// pointer value, then load through it. Used for by-pointer parameters.
    pub fn load_through_pointer(&mut self, address: &TypedValue) -> Result<TypedValue, EmitError> {
        let pointer = self.load(address)?;
        self.load(&pointer)
    }

    /// Write a value to the memory cell behind `address`; the value's type
    /// must match the address's pointee type
    pub fn store(&mut self, address: &TypedValue, value: &TypedValue) -> Result<(), EmitError> {
        let pointee = address.pointee()?;
        if *pointee != value.ty {
            return Err(EmitError::TypeMismatch {
                expected: pointee.to_string(),
                found: value.ty.to_string(),
            });
        }
        let ty = pointee.clone();
        self.push(Instruction::Store {
            value: value.value.clone(),
            ptr: address.value.clone(),
            ty,
        })
    }

    /// Load a global's current value; its type is the initializer's type
    pub fn load_global(&mut self, name: &str) -> Result<TypedValue, EmitError> {
        let address = self.global_address(name)?;
        self.load(&address)
    }

    /// Store a value to a global
    pub fn store_global(&mut self, value: &TypedValue, name: &str) -> Result<(), EmitError> {
        let address = self.global_address(name)?;
        self.store(&address, value)
    }

    // ----- arithmetic and comparisons -----

    /// Binary operation over two operands of the same type
    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &TypedValue,
        rhs: &TypedValue,
    ) -> Result<TypedValue, EmitError> {
        if lhs.ty != rhs.ty {
            return Err(EmitError::TypeMismatch {
                expected: lhs.ty.to_string(),
                found: rhs.ty.to_string(),
            });
        }
        let ty = lhs.ty.clone();
        let result = self.next_temp();
        self.push(Instruction::Binary {
            result,
            op,
            lhs: lhs.value.clone(),
            rhs: rhs.value.clone(),
            ty: ty.clone(),
        })?;
        Ok(TypedValue::new(Value::Temp(result), ty))
    }

    /// Integer comparison; the result is i1
    pub fn icmp(
        &mut self,
        op: CmpOp,
        lhs: &TypedValue,
        rhs: &TypedValue,
    ) -> Result<TypedValue, EmitError> {
        self.compare(op, lhs, rhs)
    }

    /// Float comparison; the result is i1
    pub fn fcmp(
        &mut self,
        op: CmpOp,
        lhs: &TypedValue,
        rhs: &TypedValue,
    ) -> Result<TypedValue, EmitError> {
        self.compare(op, lhs, rhs)
    }

    fn compare(
        &mut self,
        op: CmpOp,
        lhs: &TypedValue,
        rhs: &TypedValue,
    ) -> Result<TypedValue, EmitError> {
        if lhs.ty != rhs.ty {
            return Err(EmitError::TypeMismatch {
                expected: lhs.ty.to_string(),
                found: rhs.ty.to_string(),
            });
        }
        let result = self.next_temp();
        self.push(Instruction::Cmp {
            result,
            op,
            lhs: lhs.value.clone(),
            rhs: rhs.value.clone(),
            operand_ty: lhs.ty.clone(),
        })?;
        Ok(TypedValue::new(Value::Temp(result), IrType::I1))
    }

    /// Load the integer behind `address` and add a constant step to it;
    /// returns the incremented value, which the caller stores back
    pub fn increment(&mut self, address: &TypedValue, step: i64) -> Result<TypedValue, EmitError> {
        let current = self.load(address)?;
        if !current.ty.is_integer() {
            return Err(EmitError::TypeMismatch {
                expected: "an integer type".to_string(),
                found: current.ty.to_string(),
            });
        }
        let step = TypedValue::constant(Constant::Int {
            ty: current.ty.clone(),
            value: step,
        });
        self.binary(BinaryOp::Add, &current, &step)
    }

    // ----- width conversions -----

    pub fn sext(&mut self, value: &TypedValue, to: IrType) -> Result<TypedValue, EmitError> {
        self.cast(CastOp::SExt, value, to)
    }

    pub fn zext(&mut self, value: &TypedValue, to: IrType) -> Result<TypedValue, EmitError> {
        self.cast(CastOp::ZExt, value, to)
    }

    pub fn trunc(&mut self, value: &TypedValue, to: IrType) -> Result<TypedValue, EmitError> {
        self.cast(CastOp::Trunc, value, to)
    }

    /// Width conversion, folded away when source and target types agree
    fn cast(&mut self, op: CastOp, value: &TypedValue, to: IrType) -> Result<TypedValue, EmitError> {
        if !value.ty.is_integer() || !to.is_integer() {
            return Err(EmitError::TypeMismatch {
                expected: "an integer type".to_string(),
                found: format!("{} to {}", value.ty, to),
            });
        }
        if value.ty == to {
            return Ok(value.clone());
        }
        let result = self.next_temp();
        self.push(Instruction::Cast {
            result,
            op,
            value: value.value.clone(),
            from: value.ty.clone(),
            to: to.clone(),
        })?;
        Ok(TypedValue::new(Value::Temp(result), to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests_support::function_fixture;

    #[test]
    fn test_load_requires_an_address() {
        let mut ctx = function_fixture();
        let scalar = TypedValue::constant(Constant::i32(1));
        assert!(matches!(
            ctx.load(&scalar),
            Err(EmitError::NotAnAddress { .. })
        ));
    }

    #[test]
    fn test_store_type_mismatch_fails_fast() {
        let mut ctx = function_fixture();
        let slot = ctx.alloc_local(IrType::I32, "x").unwrap();
        let wide = TypedValue::constant(Constant::i64(1));
        assert_eq!(
            ctx.store(&slot, &wide),
            Err(EmitError::TypeMismatch {
                expected: "i32".to_string(),
                found: "i64".to_string(),
            })
        );
    }

    #[test]
    fn test_load_infers_pointee_type() {
        let mut ctx = function_fixture();
        let slot = ctx.alloc_local(IrType::I16, "x").unwrap();
        let value = ctx.load(&slot).unwrap();
        assert_eq!(value.ty, IrType::I16);
    }

    #[test]
    fn test_cast_folds_same_width() {
        let mut ctx = function_fixture();
        let value = TypedValue::constant(Constant::i64(3));
        let cast = ctx.sext(&value, IrType::I64).unwrap();
        assert_eq!(cast, value);
    }

    #[test]
    fn test_trunc_narrows() {
        let mut ctx = function_fixture();
        let wide = TypedValue::constant(Constant::i64(7));
        let narrow = ctx.trunc(&wide, IrType::I32).unwrap();
        assert_eq!(narrow.ty, IrType::I32);
    }

    #[test]
    fn test_increment_requires_integer_slot() {
        let mut ctx = function_fixture();
        let slot = ctx.alloc_local(IrType::F32, "f").unwrap();
        assert!(matches!(
            ctx.increment(&slot, 1),
            Err(EmitError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_compare_produces_i1() {
        let mut ctx = function_fixture();
        let one = TypedValue::constant(Constant::i32(1));
        let two = TypedValue::constant(Constant::i32(2));
        let cmp = ctx.icmp(CmpOp::Sgt, &one, &two).unwrap();
        assert_eq!(cmp.ty, IrType::I1);
    }

    #[test]
    fn test_binary_rejects_mixed_types() {
        let mut ctx = function_fixture();
        let a = TypedValue::constant(Constant::i32(1));
        let b = TypedValue::constant(Constant::i64(2));
        assert!(ctx.binary(BinaryOp::Add, &a, &b).is_err());
    }
}
