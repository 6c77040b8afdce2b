//! Emission context
//!
//! The module assembler: owns the Module, the type catalog, the function
//! registry and the single active insertion cursor. Exactly one context
//! exists per emission run; every operation takes it by reference, so
//! there is no process-wide state. Only one function body can be in
//! flight at a time - the cursor is the one piece of state that models
//! that.

mod aggregates;
mod functions;
mod values;

use crate::catalog::TypeCatalog;
use crate::registry::FunctionRegistry;
use dire_common::{BlockGenerator, BlockId, EmitError, TempGenerator, TempId};
use dire_ir::{BasicBlock, Constant, Function, GlobalVariable, Instruction, IrType, Linkage, Module, Value};
use log::debug;
use std::fmt;
use std::fs;
use std::path::Path;

/// A value paired with its static type.
///
/// Addresses are distinguished from their pointed-to content purely by
/// type: an address always has a `Ptr(pointee)` type and reading it
/// requires an explicit load.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub value: Value,
    pub ty: IrType,
}

impl TypedValue {
    pub fn new(value: Value, ty: IrType) -> Self {
        Self { value, ty }
    }

    pub fn constant(constant: Constant) -> Self {
        let ty = constant.ty();
        Self {
            value: Value::Const(constant),
            ty,
        }
    }

    /// The pointed-to type, or `NotAnAddress` for non-pointer values
    pub fn pointee(&self) -> Result<&IrType, EmitError> {
        match &self.ty {
            IrType::Ptr(pointee) => Ok(pointee),
            other => Err(EmitError::NotAnAddress {
                found: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.value)
    }
}

/// The host's target identifier; descriptive only, never consulted by the
/// emission logic
pub fn host_triple() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// The function body currently under construction
pub(crate) struct Cursor {
    pub function: Function,
    pub block: BlockId,
    pub param_slots: Vec<TypedValue>,
}

pub struct EmitContext {
    module: Module,
    catalog: TypeCatalog,
    pub(crate) registry: FunctionRegistry,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) temps: TempGenerator,
    pub(crate) blocks: BlockGenerator,
}

impl EmitContext {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name.to_string()),
            catalog: TypeCatalog::new(),
            registry: FunctionRegistry::new(),
            cursor: None,
            temps: TempGenerator::new(),
            blocks: BlockGenerator::new(),
        }
    }

    pub fn set_target_triple(&mut self, triple: &str) {
        self.module.target_triple = Some(triple.to_string());
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    // ----- type catalog -----

    /// Define a named struct and register it with the module
    pub fn define_struct(&mut self, name: &str, fields: Vec<IrType>) -> IrType {
        let ty = self.catalog.define_struct(name, fields);
        self.module
            .type_definitions
            .entry(name.to_string())
            .or_insert_with(|| ty.clone());
        ty
    }

    /// Define a named union and register it with the module
    pub fn define_union(&mut self, name: &str, fields: Vec<IrType>) -> IrType {
        let ty = self.catalog.define_union(name, fields);
        self.module
            .type_definitions
            .entry(name.to_string())
            .or_insert_with(|| ty.clone());
        ty
    }

    /// Look up a previously defined aggregate by name
    pub fn named_type(&self, name: &str) -> Result<IrType, EmitError> {
        self.catalog.named(name)
    }

    // ----- globals -----

    /// Define a global variable with an explicit type.
    ///
    /// Redefinition is an error: the effective type and initializer of a
    /// global are fixed forever at its first definition.
    pub fn define_global(
        &mut self,
        ty: IrType,
        name: &str,
        init: Constant,
    ) -> Result<TypedValue, EmitError> {
        let init_ty = init.ty();
        if init_ty != ty {
            return Err(EmitError::TypeMismatch {
                expected: ty.to_string(),
                found: init_ty.to_string(),
            });
        }
        self.insert_global(GlobalVariable {
            name: name.to_string(),
            ty,
            init,
            is_constant: false,
            linkage: Linkage::External,
        })
    }

    /// Define a global variable, inferring its type from the initializer
    pub fn define_global_from(&mut self, name: &str, init: Constant) -> Result<TypedValue, EmitError> {
        let ty = init.ty();
        self.define_global(ty, name, init)
    }

    /// Define a function-local private constant, named
    /// `__constant.<function>.<name>`
    pub fn emit_function_constant(
        &mut self,
        name: &str,
        init: Constant,
    ) -> Result<TypedValue, EmitError> {
        let function = self
            .cursor
            .as_ref()
            .map(|c| c.function.name.clone())
            .ok_or(EmitError::NoInsertPoint)?;
        let qualified = format!("__constant.{}.{}", function, name);
        self.insert_global(GlobalVariable {
            name: qualified,
            ty: init.ty(),
            init,
            is_constant: true,
            linkage: Linkage::Private,
        })
    }

    /// Define a private NUL-terminated string constant named `.<name>` and
    /// return its address
    pub fn emit_string_ptr(&mut self, content: &str, name: &str) -> Result<TypedValue, EmitError> {
        let init = Constant::Str {
            data: content.to_string(),
        };
        self.insert_global(GlobalVariable {
            name: format!(".{}", name),
            ty: init.ty(),
            init,
            is_constant: true,
            linkage: Linkage::Private,
        })
    }

    /// The address of a defined global, typed pointer-to-declared-type
    pub fn global_address(&self, name: &str) -> Result<TypedValue, EmitError> {
        let global = self
            .module
            .get_global(name)
            .ok_or_else(|| EmitError::UnknownGlobal(name.to_string()))?;
        Ok(TypedValue::new(
            Value::Global(name.to_string()),
            global.ty.clone().pointer_to(),
        ))
    }

    fn insert_global(&mut self, global: GlobalVariable) -> Result<TypedValue, EmitError> {
        if self.module.get_global(&global.name).is_some() {
            return Err(EmitError::GlobalRedefinition(global.name.clone()));
        }
        debug!("define global @{} : {}", global.name, global.ty);
        let address = TypedValue::new(
            Value::Global(global.name.clone()),
            global.ty.clone().pointer_to(),
        );
        self.module.add_global(global);
        Ok(address)
    }

    // ----- blocks and the insertion cursor -----

    /// Create a block attached to the function under construction; the
    /// cursor does not move
    pub fn create_block(&mut self, name: &str) -> Result<BlockId, EmitError> {
        let id = self.blocks.next_block();
        let label = if id == 0 {
            name.to_string()
        } else {
            format!("{}{}", name, id)
        };
        let cursor = self.cursor.as_mut().ok_or(EmitError::NoInsertPoint)?;
        cursor.function.blocks.push(BasicBlock::new(id, label));
        Ok(id)
    }

    /// Move the insertion cursor to an existing block
    pub fn set_insert_point(&mut self, block: BlockId) -> Result<(), EmitError> {
        let cursor = self.cursor.as_mut().ok_or(EmitError::NoInsertPoint)?;
        if cursor.function.get_block(block).is_none() {
            return Err(EmitError::NoInsertPoint);
        }
        cursor.block = block;
        Ok(())
    }

    pub fn current_block(&self) -> Result<BlockId, EmitError> {
        self.cursor
            .as_ref()
            .map(|c| c.block)
            .ok_or(EmitError::NoInsertPoint)
    }

    /// Unconditional branch from the current block
    pub fn br(&mut self, target: BlockId) -> Result<(), EmitError> {
        self.push(Instruction::Branch { target })
    }

    /// Conditional branch; the condition must be i1
    pub fn cond_br(
        &mut self,
        cond: TypedValue,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), EmitError> {
        if cond.ty != IrType::I1 {
            return Err(EmitError::TypeMismatch {
                expected: IrType::I1.to_string(),
                found: cond.ty.to_string(),
            });
        }
        self.push(Instruction::CondBranch {
            cond: cond.value,
            then_block,
            else_block,
        })
    }

    pub(crate) fn next_temp(&mut self) -> TempId {
        self.temps.next_temp()
    }

    /// Append an instruction at the insertion cursor
    pub(crate) fn push(&mut self, instr: Instruction) -> Result<(), EmitError> {
        let cursor = self.cursor.as_mut().ok_or(EmitError::NoInsertPoint)?;
        let block = cursor
            .function
            .get_block_mut(cursor.block)
            .ok_or(EmitError::NoInsertPoint)?;
        block.push(instr);
        Ok(())
    }

    pub(crate) fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    // ----- serialization -----

    /// The module's standard textual form
    pub fn ir_text(&self) -> String {
        self.module.to_string()
    }

    /// Serialize the module to a file
    pub fn write_to_file(&self, path: &Path) -> Result<(), EmitError> {
        fs::write(path, self.ir_text())?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// A context with an open function body and entry block, for unit
    /// tests that exercise instruction-level operations directly
    pub(crate) fn function_fixture() -> EmitContext {
        let mut ctx = EmitContext::new("test");
        ctx.cursor = Some(Cursor {
            function: Function::new("fixture".to_string(), IrType::Void),
            block: 0,
            param_slots: Vec::new(),
        });
        let entry = ctx.create_block("entry").unwrap();
        ctx.set_insert_point(entry).unwrap();
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_global_and_load_type() {
        let mut ctx = EmitContext::new("test");
        let addr = ctx.define_global_from("a", Constant::i32(1)).unwrap();
        assert_eq!(addr.ty, IrType::I32.pointer_to());
        assert_eq!(addr.value, Value::Global("a".to_string()));
    }

    #[test]
    fn test_global_redefinition_is_an_error() {
        let mut ctx = EmitContext::new("test");
        ctx.define_global_from("a", Constant::i32(1)).unwrap();
        assert_eq!(
            ctx.define_global_from("a", Constant::i32(2)),
            Err(EmitError::GlobalRedefinition("a".to_string()))
        );
    }

    #[test]
    fn test_define_global_type_mismatch() {
        let mut ctx = EmitContext::new("test");
        assert_eq!(
            ctx.define_global(IrType::I64, "a", Constant::i32(1)),
            Err(EmitError::TypeMismatch {
                expected: "i64".to_string(),
                found: "i32".to_string(),
            })
        );
    }

    #[test]
    fn test_no_insert_point_outside_function() {
        let mut ctx = EmitContext::new("test");
        assert_eq!(ctx.create_block("entry"), Err(EmitError::NoInsertPoint));
        assert_eq!(ctx.current_block(), Err(EmitError::NoInsertPoint));
    }

    #[test]
    fn test_struct_definition_registers_with_module() {
        let mut ctx = EmitContext::new("test");
        let first = ctx.define_struct("struct.point", vec![IrType::I32, IrType::I32]);
        let second = ctx.define_struct("struct.point", vec![IrType::I64]);
        assert_eq!(first, second);
        assert!(ctx.module().type_definitions.contains_key("struct.point"));
    }

    #[test]
    fn test_typed_value_pointee() {
        let addr = TypedValue::new(Value::Temp(0), IrType::I32.pointer_to());
        assert_eq!(addr.pointee(), Ok(&IrType::I32));

        let scalar = TypedValue::new(Value::Temp(1), IrType::I32);
        assert!(matches!(scalar.pointee(), Err(EmitError::NotAnAddress { .. })));
    }
}
