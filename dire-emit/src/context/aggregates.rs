//! Aggregate addressing
//!
//! Computes element and field addresses through indexed address
//! computation typed by the aggregate's layout. Field selection always
//! uses the two-level [0, index] form: a bare single-level index would
//! select among repetitions of the whole aggregate, not its fields.

use super::{EmitContext, TypedValue};
use dire_common::EmitError;
use dire_ir::{Constant, Instruction, IrType, Value};

impl EmitContext {
    /// Address of `array[index]`.
    ///
    /// `array_address` is the address of the array storage: either a stack
    /// slot holding a pointer (an array passed as a parameter, loaded and
    /// indexed with a single index) or the address of an in-place array (a
    /// global, indexed with the two-level form). `index_address` is the
    /// address of the current index value, which is loaded and
    /// sign-extended to the 64-bit indexing width.
    pub fn element_address(
        &mut self,
        array_address: &TypedValue,
        index_address: &TypedValue,
    ) -> Result<TypedValue, EmitError> {
        let index = self.load(index_address)?;
        if !index.ty.is_integer() {
            return Err(EmitError::TypeMismatch {
                expected: "an integer index".to_string(),
                found: index.ty.to_string(),
            });
        }
        let index = self.sext(&index, IrType::I64)?;

        match array_address.pointee()? {
            // Pointer slot: load the pointer, then index the pointee
            IrType::Ptr(element) => {
                let element = (**element).clone();
                let pointer = self.load(array_address)?;
                self.gep(&pointer, element.clone(), vec![index.value], element)
            }
            // In-place array: offset zero into the array, then the element
            IrType::Array { element, .. } => {
                let element = (**element).clone();
                let base_ty = array_address.pointee()?.clone();
                self.gep(
                    array_address,
                    base_ty,
                    vec![Value::Const(Constant::i64(0)), index.value],
                    element,
                )
            }
            other => Err(EmitError::AggregateExpected {
                found: other.to_string(),
            }),
        }
    }

    /// Address of field `index` of the struct or union behind
    /// `aggregate_address`
    pub fn field_address(
        &mut self,
        aggregate_address: &TypedValue,
        index: usize,
    ) -> Result<TypedValue, EmitError> {
        let aggregate = aggregate_address.pointee()?.clone();
        let field_ty = match &aggregate {
            IrType::Struct { fields, .. } | IrType::Union { fields, .. } => fields
                .get(index)
                .cloned()
                .ok_or_else(|| EmitError::FieldOutOfRange {
                    index,
                    ty: aggregate.to_string(),
                })?,
            other => {
                return Err(EmitError::AggregateExpected {
                    found: other.to_string(),
                })
            }
        };
        self.gep(
            aggregate_address,
            aggregate,
            vec![
                Value::Const(Constant::i64(0)),
                Value::Const(Constant::i64(index as i64)),
            ],
            field_ty,
        )
    }

    /// Read field `index` through a slot holding a pointer to the
    /// aggregate (the by-pointer parameter case)
    pub fn field_rvalue(
        &mut self,
        aggregate_slot: &TypedValue,
        index: usize,
    ) -> Result<TypedValue, EmitError> {
        let address = self.field_lvalue(aggregate_slot, index)?;
        self.load(&address)
    }

    /// Address of field `index` through a slot holding a pointer to the
    /// aggregate
    pub fn field_lvalue(
        &mut self,
        aggregate_slot: &TypedValue,
        index: usize,
    ) -> Result<TypedValue, EmitError> {
        let aggregate_address = self.load(aggregate_slot)?;
        self.field_address(&aggregate_address, index)
    }

    /// Decay the address of an in-place array into a pointer to its first
    /// element
    pub fn array_decay(&mut self, array_address: &TypedValue) -> Result<TypedValue, EmitError> {
        let base_ty = array_address.pointee()?.clone();
        let element = match &base_ty {
            IrType::Array { element, .. } => (**element).clone(),
            other => {
                return Err(EmitError::AggregateExpected {
                    found: other.to_string(),
                })
            }
        };
        self.gep(
            array_address,
            base_ty,
            vec![
                Value::Const(Constant::i64(0)),
                Value::Const(Constant::i64(0)),
            ],
            element,
        )
    }

    fn gep(
        &mut self,
        base: &TypedValue,
        base_ty: IrType,
        indices: Vec<Value>,
        element_ty: IrType,
    ) -> Result<TypedValue, EmitError> {
        let result = self.next_temp();
        let result_ty = element_ty.pointer_to();
        self.push(Instruction::GetElementPtr {
            result,
            base: base.value.clone(),
            base_ty,
            indices,
            result_ty: result_ty.clone(),
        })?;
        Ok(TypedValue::new(Value::Temp(result), result_ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests_support::function_fixture;

    #[test]
    fn test_field_address_types() {
        let mut ctx = function_fixture();
        let point = ctx.define_struct("struct.point", vec![IrType::I32, IrType::I32]);
        let slot = ctx.alloc_local(point, "p").unwrap();

        let field = ctx.field_address(&slot, 1).unwrap();
        assert_eq!(field.ty, IrType::I32.pointer_to());
    }

    #[test]
    fn test_field_address_out_of_range() {
        let mut ctx = function_fixture();
        let point = ctx.define_struct("struct.point", vec![IrType::I32, IrType::I32]);
        let slot = ctx.alloc_local(point, "p").unwrap();

        assert!(matches!(
            ctx.field_address(&slot, 2),
            Err(EmitError::FieldOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn test_field_address_on_scalar_is_an_error() {
        let mut ctx = function_fixture();
        let slot = ctx.alloc_local(IrType::I32, "x").unwrap();

        assert!(matches!(
            ctx.field_address(&slot, 0),
            Err(EmitError::AggregateExpected { .. })
        ));
    }

    #[test]
    fn test_union_fields_share_storage() {
        let mut ctx = function_fixture();
        let ab = ctx.define_union("union.ab", vec![IrType::I32, IrType::F32]);
        let slot = ctx.alloc_local(ab, "u").unwrap();

        // Both fields address the start of the union's storage; the type
        // follows the requested index
        let a = ctx.field_address(&slot, 0).unwrap();
        let b = ctx.field_address(&slot, 1).unwrap();
        assert_eq!(a.ty, IrType::I32.pointer_to());
        assert_eq!(b.ty, IrType::F32.pointer_to());
    }

    #[test]
    fn test_element_address_through_pointer_slot() {
        let mut ctx = function_fixture();
        let slot = ctx
            .alloc_local(IrType::I32.pointer_to(), "arr")
            .unwrap();
        let index = ctx.alloc_local(IrType::I32, "i").unwrap();

        let element = ctx.element_address(&slot, &index).unwrap();
        assert_eq!(element.ty, IrType::I32.pointer_to());
    }

    #[test]
    fn test_array_decay() {
        let mut ctx = function_fixture();
        let arr = ctx
            .alloc_local(
                IrType::Array {
                    size: 4,
                    element: Box::new(IrType::I32),
                },
                "arr",
            )
            .unwrap();
        let decayed = ctx.array_decay(&arr).unwrap();
        assert_eq!(decayed.ty, IrType::I32.pointer_to());
    }
}
