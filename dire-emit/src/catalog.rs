//! Type catalog
//!
//! Maps abstract source types to IR type descriptors and owns the named
//! aggregate definitions. Defining an aggregate is idempotent by name: a
//! second definition under the same name returns the existing descriptor
//! without re-validating the field list, matching the lazy redefinition
//! pattern the demonstration programs rely on.

use dire_common::EmitError;
use dire_ir::IrType;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct TypeCatalog {
    aggregates: BTreeMap<String, IrType>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self {
            aggregates: BTreeMap::new(),
        }
    }

    /// Integer descriptor for a bit width
    pub fn int(&self, bits: u32) -> Result<IrType, EmitError> {
        match bits {
            8 => Ok(IrType::I8),
            16 => Ok(IrType::I16),
            32 => Ok(IrType::I32),
            64 => Ok(IrType::I64),
            _ => Err(EmitError::TypeMismatch {
                expected: "integer width of 8, 16, 32 or 64".to_string(),
                found: format!("i{}", bits),
            }),
        }
    }

    /// Float descriptor for a storage width; 80 is the extended class
    pub fn float(&self, bits: u32) -> Result<IrType, EmitError> {
        match bits {
            32 => Ok(IrType::F32),
            64 => Ok(IrType::F64),
            80 => Ok(IrType::F80),
            _ => Err(EmitError::TypeMismatch {
                expected: "float width of 32, 64 or 80".to_string(),
                found: format!("f{}", bits),
            }),
        }
    }

    pub fn pointer_to(&self, pointee: IrType) -> IrType {
        pointee.pointer_to()
    }

    /// Define a named struct; idempotent by name
    pub fn define_struct(&mut self, name: &str, fields: Vec<IrType>) -> IrType {
        if let Some(existing) = self.aggregates.get(name) {
            return existing.clone();
        }
        let ty = IrType::Struct {
            name: name.to_string(),
            fields,
        };
        self.aggregates.insert(name.to_string(), ty.clone());
        ty
    }

    /// Define a named union; idempotent by name. All fields share storage.
    pub fn define_union(&mut self, name: &str, fields: Vec<IrType>) -> IrType {
        if let Some(existing) = self.aggregates.get(name) {
            return existing.clone();
        }
        let ty = IrType::Union {
            name: name.to_string(),
            fields,
        };
        self.aggregates.insert(name.to_string(), ty.clone());
        ty
    }

    /// Look up a previously defined aggregate
    pub fn named(&self, name: &str) -> Result<IrType, EmitError> {
        self.aggregates
            .get(name)
            .cloned()
            .ok_or_else(|| EmitError::UnknownAggregate(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_widths() {
        let catalog = TypeCatalog::new();
        assert_eq!(catalog.int(32), Ok(IrType::I32));
        assert_eq!(catalog.float(80), Ok(IrType::F80));
        assert!(catalog.int(24).is_err());
    }

    #[test]
    fn test_pointer_to() {
        let catalog = TypeCatalog::new();
        let ptr = catalog.pointer_to(IrType::I32);
        assert_eq!(ptr, IrType::I32.pointer_to());
    }

    #[test]
    fn test_define_struct_is_idempotent() {
        let mut catalog = TypeCatalog::new();
        let first = catalog.define_struct("struct.point", vec![IrType::I32, IrType::I32]);
        // A second definition returns the existing descriptor, even if the
        // field list differs
        let second = catalog.define_struct("struct.point", vec![IrType::I64]);
        assert_eq!(first, second);
        assert_eq!(catalog.named("struct.point"), Ok(first));
    }

    #[test]
    fn test_unknown_aggregate() {
        let catalog = TypeCatalog::new();
        assert_eq!(
            catalog.named("struct.missing"),
            Err(EmitError::UnknownAggregate("struct.missing".to_string()))
        );
    }
}
