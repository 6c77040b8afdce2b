//! Function declaration, definition and calls
//!
//! A function is first declared (signature only, callable) and only later
//! defined (body attached). The function emitter creates the entry block,
//! marshals incoming arguments into stack storage, invokes the registered
//! body routine, emits the matching return instruction and submits the
//! finished function to the verifier.

use super::{Cursor, EmitContext, TypedValue};
use crate::registry::FunctionPrototype;
use dire_common::{BlockGenerator, EmitError, TempGenerator, TempId};
use dire_ir::{verify_function, Function, Instruction, IrType, Value};
use log::debug;
use std::rc::Rc;

impl EmitContext {
    /// Register a function prototype; must precede `declare_function`
    pub fn register_prototype(
        &mut self,
        name: &str,
        return_type: IrType,
        params: Vec<IrType>,
        is_vararg: bool,
    ) -> Result<(), EmitError> {
        self.registry.register_prototype(FunctionPrototype {
            name: name.to_string(),
            return_type,
            params,
            is_vararg,
        })
    }

    /// Register the body emission routine for a prototyped function
    pub fn register_body<F>(&mut self, name: &str, body: F) -> Result<(), EmitError>
    where
        F: Fn(&mut EmitContext) -> Result<Option<TypedValue>, EmitError> + 'static,
    {
        self.registry.register_body(name, Rc::new(body))
    }

    /// Create the module-level declaration for a registered prototype.
    /// Idempotent: if the function already exists it is left unchanged.
    pub fn declare_function(&mut self, name: &str) -> Result<(), EmitError> {
        if self.module().get_function(name).is_none() {
            let proto = self.registry.prototype(name)?.clone();
            let mut decl = Function::new(name.to_string(), proto.return_type.clone());
            decl.params = numbered_params(&proto);
            decl.is_vararg = proto.is_vararg;
            self.module_mut().add_function(decl);
        }
        self.registry.mark_declared(name)
    }

    /// Define a declared function: entry block, parameter marshalling,
    /// registered body routine, return emission, verification.
    pub fn define_function(&mut self, name: &str) -> Result<(), EmitError> {
        if !self.registry.is_declared(name) || self.module().get_function(name).is_none() {
            return Err(EmitError::DefineBeforeDeclare(name.to_string()));
        }
        let proto = self.registry.prototype(name)?.clone();
        let body = self.registry.body(name)?;
        debug!("define function @{}", name);

        // Fresh per-function counters; parameters occupy the low temp ids
        self.temps = TempGenerator::starting_at(proto.params.len() as TempId);
        self.blocks = BlockGenerator::new();

        let mut function = Function::new(name.to_string(), proto.return_type.clone());
        function.params = numbered_params(&proto);
        function.is_vararg = proto.is_vararg;
        self.cursor = Some(Cursor {
            function,
            block: 0,
            param_slots: Vec::new(),
        });
        let entry = self.create_block("entry")?;
        self.set_insert_point(entry)?;

        // Marshal incoming arguments into stack storage. Arguments arrive
        // by value; by-pointer passing is expressed through the
        // parameter's type being a pointer type.
        let mut slots = Vec::with_capacity(proto.params.len());
        for (i, ty) in proto.params.iter().enumerate() {
            let slot = self.alloc_local(ty.clone(), &format!("arg{}", i))?;
            let incoming = TypedValue::new(Value::Temp(i as TempId), ty.clone());
            self.store(&slot, &incoming)?;
            slots.push(slot);
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.param_slots = slots;
        }

        let produced = body(self)?;

        match (&proto.return_type, produced) {
            // A void body may still hand back an ignored value
            (IrType::Void, _) => self.push(Instruction::Return { value: None })?,
            (_, Some(value)) => {
                if value.ty != proto.return_type {
                    return Err(EmitError::TypeMismatch {
                        expected: proto.return_type.to_string(),
                        found: value.ty.to_string(),
                    });
                }
                self.push(Instruction::Return {
                    value: Some(value.value),
                })?;
            }
            (_, None) => return Err(EmitError::MissingReturnValue(name.to_string())),
        }

        // Attach the finished body to the module's declaration
        let cursor = self.cursor.take().ok_or(EmitError::NoInsertPoint)?;
        let finished = cursor.function;
        let declared = self
            .module_mut()
            .get_function_mut(name)
            .ok_or_else(|| EmitError::DefineBeforeDeclare(name.to_string()))?;
        *declared = finished;

        // Verify immediately after each definition; failure is fatal
        verify_function(self.module(), name)?;
        Ok(())
    }

    /// Stack slot holding the marshalled value of parameter `index` of the
    /// function under construction
    pub fn param_slot(&self, index: usize) -> Result<TypedValue, EmitError> {
        let cursor = self.cursor.as_ref().ok_or(EmitError::NoInsertPoint)?;
        cursor
            .param_slots
            .get(index)
            .cloned()
            .ok_or_else(|| EmitError::ParamOutOfRange {
                index,
                function: cursor.function.name.clone(),
            })
    }

    /// Call a declared function with by-value arguments
    pub fn call(
        &mut self,
        name: &str,
        args: &[TypedValue],
    ) -> Result<Option<TypedValue>, EmitError> {
        let callee = self
            .module()
            .get_function(name)
            .ok_or_else(|| EmitError::UnknownFunction(name.to_string()))?;
        let ret_ty = callee.return_type.clone();
        let fixed: Vec<IrType> = callee.params.iter().map(|(_, ty)| ty.clone()).collect();
        let is_vararg = callee.is_vararg;

        let arity_ok = if is_vararg {
            args.len() >= fixed.len()
        } else {
            args.len() == fixed.len()
        };
        if !arity_ok {
            return Err(EmitError::TypeMismatch {
                expected: format!("{} arguments to @{}", fixed.len(), name),
                found: format!("{} arguments", args.len()),
            });
        }
        for (arg, ty) in args.iter().zip(fixed.iter()) {
            if arg.ty != *ty {
                return Err(EmitError::TypeMismatch {
                    expected: ty.to_string(),
                    found: arg.ty.to_string(),
                });
            }
        }

        let result = if ret_ty == IrType::Void {
            None
        } else {
            Some(self.next_temp())
        };
        self.push(Instruction::Call {
            result,
            callee: Value::Function(name.to_string()),
            args: args.iter().map(|a| a.value.clone()).collect(),
            ret_ty: ret_ty.clone(),
        })?;
        Ok(result.map(|r| TypedValue::new(Value::Temp(r), ret_ty)))
    }
}

fn numbered_params(proto: &FunctionPrototype) -> Vec<(TempId, IrType)> {
    proto
        .params
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, ty)| (i as TempId, ty))
        .collect()
}
