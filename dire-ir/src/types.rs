//! IR type system
//!
//! Tagged variant over scalars, pointers and aggregates. Named aggregates
//! (structs and unions) carry their field layout inline; the emission
//! engine's type catalog guarantees that one name always maps to one
//! layout, so equality by name and equality by structure coincide.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    Void,

    /// Integer types with bit width; i1 is the comparison result type
    I1,
    I8,
    I16,
    I32,
    I64,

    /// Floating point widths; F80 models the widest (extended) class
    F32,
    F64,
    F80,

    /// Pointer type
    Ptr(Box<IrType>),

    /// Array type [size x element]
    Array { size: u64, element: Box<IrType> },

    /// Named struct with ordered fields
    Struct { name: String, fields: Vec<IrType> },

    /// Named union; all fields share storage at offset zero
    Union { name: String, fields: Vec<IrType> },
}

impl IrType {
    pub fn pointer_to(self) -> IrType {
        IrType::Ptr(Box::new(self))
    }

    /// Get the size of this type in bytes, or None for unsized types.
    ///
    /// Structs are packed: field offsets are running sums with no padding.
    /// F80 occupies a 16 byte slot, matching its ABI storage size.
    pub fn size_in_bytes(&self) -> Option<u64> {
        match self {
            IrType::Void => None,
            IrType::I1 => Some(1),
            IrType::I8 => Some(1),
            IrType::I16 => Some(2),
            IrType::I32 => Some(4),
            IrType::I64 => Some(8),
            IrType::F32 => Some(4),
            IrType::F64 => Some(8),
            IrType::F80 => Some(16),
            IrType::Ptr(_) => Some(8),
            IrType::Array { size, element } => {
                element.size_in_bytes().map(|elem| elem * size)
            }
            IrType::Struct { fields, .. } => {
                let mut total = 0;
                for field in fields {
                    total += field.size_in_bytes()?;
                }
                Some(total)
            }
            IrType::Union { fields, .. } => {
                let mut widest = 0;
                for field in fields {
                    widest = widest.max(field.size_in_bytes()?);
                }
                Some(widest)
            }
        }
    }

    /// Byte offset of field `index` within this aggregate
    pub fn field_offset(&self, index: usize) -> Option<u64> {
        match self {
            IrType::Struct { fields, .. } => {
                if index >= fields.len() {
                    return None;
                }
                let mut offset = 0;
                for field in &fields[..index] {
                    offset += field.size_in_bytes()?;
                }
                Some(offset)
            }
            // Union fields share storage
            IrType::Union { fields, .. } => {
                if index >= fields.len() {
                    return None;
                }
                Some(0)
            }
            _ => None,
        }
    }

    /// Type of field `index` for structs and unions
    pub fn field_type(&self, index: usize) -> Option<&IrType> {
        match self {
            IrType::Struct { fields, .. } | IrType::Union { fields, .. } => fields.get(index),
            _ => None,
        }
    }

    /// Bit width for integer types
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            IrType::I1 => Some(1),
            IrType::I8 => Some(8),
            IrType::I16 => Some(16),
            IrType::I32 => Some(32),
            IrType::I64 => Some(64),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            IrType::I1 | IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64 | IrType::F80)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    /// Pointee for pointers, element for arrays
    pub fn element_type(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(pointee) => Some(pointee),
            IrType::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::F80 => write!(f, "f80"),
            IrType::Ptr(pointee) => write!(f, "{}*", pointee),
            IrType::Array { size, element } => write!(f, "[{} x {}]", size, element),
            IrType::Struct { name, .. } => write!(f, "%{}", name),
            IrType::Union { name, .. } => write!(f, "%{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(IrType::I8.size_in_bytes(), Some(1));
        assert_eq!(IrType::I16.size_in_bytes(), Some(2));
        assert_eq!(IrType::I32.size_in_bytes(), Some(4));
        assert_eq!(IrType::I64.size_in_bytes(), Some(8));
        assert_eq!(IrType::F80.size_in_bytes(), Some(16));
        assert_eq!(IrType::I32.pointer_to().size_in_bytes(), Some(8));
        assert_eq!(IrType::Void.size_in_bytes(), None);
    }

    #[test]
    fn test_array_size() {
        let arr = IrType::Array {
            size: 10,
            element: Box::new(IrType::I16),
        };
        assert_eq!(arr.size_in_bytes(), Some(20));
    }

    #[test]
    fn test_struct_layout() {
        let point = IrType::Struct {
            name: "struct.point".to_string(),
            fields: vec![IrType::I32, IrType::I32],
        };
        assert_eq!(point.size_in_bytes(), Some(8));
        assert_eq!(point.field_offset(0), Some(0));
        assert_eq!(point.field_offset(1), Some(4));
        assert_eq!(point.field_offset(2), None);
        assert_eq!(point.field_type(1), Some(&IrType::I32));
    }

    #[test]
    fn test_union_layout() {
        let u = IrType::Union {
            name: "union.ab".to_string(),
            fields: vec![IrType::I32, IrType::F64],
        };
        assert_eq!(u.size_in_bytes(), Some(8));
        assert_eq!(u.field_offset(0), Some(0));
        assert_eq!(u.field_offset(1), Some(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(IrType::I32.to_string(), "i32");
        assert_eq!(IrType::I32.pointer_to().to_string(), "i32*");
        let arr = IrType::Array {
            size: 4,
            element: Box::new(IrType::I32),
        };
        assert_eq!(arr.to_string(), "[4 x i32]");
        let point = IrType::Struct {
            name: "struct.point".to_string(),
            fields: vec![IrType::I32, IrType::I32],
        };
        assert_eq!(point.to_string(), "%struct.point");
    }
}
