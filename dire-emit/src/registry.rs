//! Function registry
//!
//! One owned registry replaces the original's three independent maps
//! (prototype table, body-routine table, and the module's own function
//! list): each name maps to a single record holding the prototype, the
//! optional body routine and the declared flag, so defining before
//! declaring is a typed error instead of a crash.

use crate::context::{EmitContext, TypedValue};
use dire_common::EmitError;
use dire_ir::IrType;
use std::collections::HashMap;
use std::rc::Rc;

/// Body emission routine, registered explicitly per function.
///
/// A routine returns the value the function body produces; `None` for void
/// bodies. A void function may still return an ignored value.
pub type BodyRoutine = Rc<dyn Fn(&mut EmitContext) -> Result<Option<TypedValue>, EmitError>>;

/// Function prototype: immutable after registration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPrototype {
    pub name: String,
    pub return_type: IrType,
    pub params: Vec<IrType>,
    pub is_vararg: bool,
}

pub struct FunctionRecord {
    pub prototype: FunctionPrototype,
    pub body: Option<BodyRoutine>,
    pub declared: bool,
}

#[derive(Default)]
pub struct FunctionRegistry {
    records: HashMap<String, FunctionRecord>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn register_prototype(&mut self, prototype: FunctionPrototype) -> Result<(), EmitError> {
        let name = prototype.name.clone();
        if self.records.contains_key(&name) {
            return Err(EmitError::DuplicatePrototype(name));
        }
        self.records.insert(
            name,
            FunctionRecord {
                prototype,
                body: None,
                declared: false,
            },
        );
        Ok(())
    }

    pub fn register_body(&mut self, name: &str, body: BodyRoutine) -> Result<(), EmitError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| EmitError::UnknownPrototype(name.to_string()))?;
        record.body = Some(body);
        Ok(())
    }

    pub fn prototype(&self, name: &str) -> Result<&FunctionPrototype, EmitError> {
        self.records
            .get(name)
            .map(|r| &r.prototype)
            .ok_or_else(|| EmitError::UnknownPrototype(name.to_string()))
    }

    /// The registered body routine; cheap to clone for invocation
    pub fn body(&self, name: &str) -> Result<BodyRoutine, EmitError> {
        self.records
            .get(name)
            .and_then(|r| r.body.clone())
            .ok_or_else(|| EmitError::MissingBody(name.to_string()))
    }

    pub fn mark_declared(&mut self, name: &str) -> Result<(), EmitError> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| EmitError::UnknownPrototype(name.to_string()))?;
        record.declared = true;
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.records.get(name).map(|r| r.declared).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proto(name: &str) -> FunctionPrototype {
        FunctionPrototype {
            name: name.to_string(),
            return_type: IrType::I32,
            params: Vec::new(),
            is_vararg: false,
        }
    }

    #[test]
    fn test_duplicate_prototype() {
        let mut registry = FunctionRegistry::new();
        registry.register_prototype(proto("main")).unwrap();
        assert_eq!(
            registry.register_prototype(proto("main")),
            Err(EmitError::DuplicatePrototype("main".to_string()))
        );
    }

    #[test]
    fn test_body_requires_prototype() {
        let mut registry = FunctionRegistry::new();
        let err = registry
            .register_body("main", Rc::new(|_| Ok(None)))
            .unwrap_err();
        assert_eq!(err, EmitError::UnknownPrototype("main".to_string()));
    }

    #[test]
    fn test_missing_body() {
        let mut registry = FunctionRegistry::new();
        registry.register_prototype(proto("main")).unwrap();
        assert!(matches!(
            registry.body("main"),
            Err(EmitError::MissingBody(_))
        ));

        registry
            .register_body("main", Rc::new(|_| Ok(None)))
            .unwrap();
        assert!(registry.body("main").is_ok());
    }

    #[test]
    fn test_declared_flag() {
        let mut registry = FunctionRegistry::new();
        registry.register_prototype(proto("main")).unwrap();
        assert!(!registry.is_declared("main"));
        registry.mark_declared("main").unwrap();
        assert!(registry.is_declared("main"));
    }
}
