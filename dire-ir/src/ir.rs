//! IR instructions, basic blocks, functions, globals and the module
//!
//! The module is the single top-level container: it owns all globals, all
//! function declarations/definitions and all named aggregate definitions,
//! and is mutated in place for the lifetime of one emission run.

use crate::types::IrType;
use dire_common::{BlockId, TempId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Typed constant initializer
///
/// Constants carry their own type; a global's declared type is always its
/// initializer's type, so the initializer is the single source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int { ty: IrType, value: i64 },
    Float { ty: IrType, value: f64 },
    /// Typed null pointer
    Null { ty: IrType },
    Array { ty: IrType, elements: Vec<Constant> },
    /// Also used for union initializers (one field)
    Struct { ty: IrType, fields: Vec<Constant> },
    /// NUL-terminated byte array
    Str { data: String },
}

impl Constant {
    pub fn i8(value: i64) -> Self {
        Constant::Int { ty: IrType::I8, value }
    }

    pub fn i16(value: i64) -> Self {
        Constant::Int { ty: IrType::I16, value }
    }

    pub fn i32(value: i64) -> Self {
        Constant::Int { ty: IrType::I32, value }
    }

    pub fn i64(value: i64) -> Self {
        Constant::Int { ty: IrType::I64, value }
    }

    pub fn bool(value: bool) -> Self {
        Constant::Int {
            ty: IrType::I1,
            value: value as i64,
        }
    }

    pub fn f32(value: f64) -> Self {
        Constant::Float { ty: IrType::F32, value }
    }

    pub fn f64(value: f64) -> Self {
        Constant::Float { ty: IrType::F64, value }
    }

    pub fn f80(value: f64) -> Self {
        Constant::Float { ty: IrType::F80, value }
    }

    pub fn null(pointee: IrType) -> Self {
        Constant::Null {
            ty: pointee.pointer_to(),
        }
    }

    pub fn array(element: IrType, elements: Vec<Constant>) -> Self {
        Constant::Array {
            ty: IrType::Array {
                size: elements.len() as u64,
                element: Box::new(element),
            },
            elements,
        }
    }

    /// The constant's type; for strings this is the NUL-terminated array
    pub fn ty(&self) -> IrType {
        match self {
            Constant::Int { ty, .. }
            | Constant::Float { ty, .. }
            | Constant::Null { ty }
            | Constant::Array { ty, .. }
            | Constant::Struct { ty, .. } => ty.clone(),
            Constant::Str { data } => IrType::Array {
                size: data.len() as u64 + 1,
                element: Box::new(IrType::I8),
            },
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int { value, .. } => write!(f, "{}", value),
            Constant::Float { value, .. } => write!(f, "{:e}", value),
            Constant::Null { .. } => write!(f, "null"),
            Constant::Array { elements, .. } => {
                write!(f, "[")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", elem.ty(), elem)?;
                }
                write!(f, "]")
            }
            Constant::Struct { fields, .. } => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.ty(), field)?;
                }
                write!(f, " }}")
            }
            Constant::Str { data } => {
                write!(f, "c\"")?;
                for byte in data.bytes() {
                    match byte {
                        b'"' | b'\\' => write!(f, "\\{:02X}", byte)?,
                        0x20..=0x7e => write!(f, "{}", byte as char)?,
                        _ => write!(f, "\\{:02X}", byte)?,
                    }
                }
                write!(f, "\\00\"")
            }
        }
    }
}

/// IR value - an operand of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SSA temporary
    Temp(TempId),
    Const(Constant),
    /// Address of a module-level global
    Global(String),
    /// Function reference, only valid as a call target
    Function(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "%{}", id),
            Value::Const(c) => write!(f, "{}", c),
            Value::Global(name) => write!(f, "@{}", name),
            Value::Function(name) => write!(f, "@{}", name),
        }
    }
}

/// Binary arithmetic and bitwise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinaryOp {
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::UDiv => "udiv",
            BinaryOp::SRem => "srem",
            BinaryOp::URem => "urem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
        };
        write!(f, "{}", op)
    }
}

/// Comparison predicates; integer predicates pair with `icmp`, ordered
/// float predicates with `fcmp`. The result type is always i1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
    Foeq,
    Fone,
    Folt,
    Fole,
    Fogt,
    Foge,
    Fune,
}

impl CmpOp {
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            CmpOp::Foeq
                | CmpOp::Fone
                | CmpOp::Folt
                | CmpOp::Fole
                | CmpOp::Fogt
                | CmpOp::Foge
                | CmpOp::Fune
        )
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Slt => "slt",
            CmpOp::Sle => "sle",
            CmpOp::Sgt => "sgt",
            CmpOp::Sge => "sge",
            CmpOp::Ult => "ult",
            CmpOp::Ule => "ule",
            CmpOp::Ugt => "ugt",
            CmpOp::Uge => "uge",
            CmpOp::Foeq => "oeq",
            CmpOp::Fone => "one",
            CmpOp::Folt => "olt",
            CmpOp::Fole => "ole",
            CmpOp::Fogt => "ogt",
            CmpOp::Foge => "oge",
            CmpOp::Fune => "une",
        };
        write!(f, "{}", op)
    }
}

/// Integer width conversions; from/to are carried explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastOp {
    ZExt,
    SExt,
    Trunc,
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::Trunc => "trunc",
        };
        write!(f, "{}", op)
    }
}

/// IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// result = op ty lhs, rhs
    Binary {
        result: TempId,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        ty: IrType,
    },

    /// result = icmp/fcmp pred ty lhs, rhs; result is i1
    Cmp {
        result: TempId,
        op: CmpOp,
        lhs: Value,
        rhs: Value,
        operand_ty: IrType,
    },

    /// Bitwise not / arithmetic negation, type preserving
    Not {
        result: TempId,
        operand: Value,
        ty: IrType,
    },
    Neg {
        result: TempId,
        operand: Value,
        ty: IrType,
    },

    /// result = op value from -> to
    Cast {
        result: TempId,
        op: CastOp,
        value: Value,
        from: IrType,
        to: IrType,
    },

    /// result = load ty, ty* ptr
    Load {
        result: TempId,
        ptr: Value,
        ty: IrType,
    },

    /// store ty value, ty* ptr
    Store {
        value: Value,
        ptr: Value,
        ty: IrType,
    },

    /// Indexed address computation rooted at `base`, which points at a
    /// value of type `base_ty`. The first index scales whole `base_ty`
    /// repetitions; later indices select into the aggregate. All indices
    /// are i64-typed.
    GetElementPtr {
        result: TempId,
        base: Value,
        base_ty: IrType,
        indices: Vec<Value>,
        result_ty: IrType,
    },

    /// Stack storage with unspecified initial content
    Alloca {
        result: TempId,
        ty: IrType,
        name: Option<String>,
    },

    /// result = call ret_ty callee(args); result is None for void callees
    Call {
        result: Option<TempId>,
        callee: Value,
        args: Vec<Value>,
        ret_ty: IrType,
    },

    Return {
        value: Option<Value>,
    },

    Branch {
        target: BlockId,
    },

    CondBranch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
}

impl Instruction {
    /// The temporary this instruction defines, if any
    pub fn result(&self) -> Option<TempId> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::Cmp { result, .. }
            | Instruction::Not { result, .. }
            | Instruction::Neg { result, .. }
            | Instruction::Cast { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::GetElementPtr { result, .. }
            | Instruction::Alloca { result, .. } => Some(*result),
            Instruction::Call { result, .. } => *result,
            Instruction::Store { .. }
            | Instruction::Return { .. }
            | Instruction::Branch { .. }
            | Instruction::CondBranch { .. } => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return { .. } | Instruction::Branch { .. } | Instruction::CondBranch { .. }
        )
    }

    /// Branch targets of a terminator
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Branch { target } => vec![*target],
            Instruction::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }

    /// Operand values read by this instruction
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Binary { lhs, rhs, .. } | Instruction::Cmp { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
            Instruction::Not { operand, .. } | Instruction::Neg { operand, .. } => vec![operand],
            Instruction::Cast { value, .. } => vec![value],
            Instruction::Load { ptr, .. } => vec![ptr],
            Instruction::Store { value, ptr, .. } => vec![value, ptr],
            Instruction::GetElementPtr { base, indices, .. } => {
                let mut ops = vec![base];
                ops.extend(indices.iter());
                ops
            }
            Instruction::Call { callee, args, .. } => {
                let mut ops = vec![callee];
                ops.extend(args.iter());
                ops
            }
            Instruction::Return { value } => value.iter().collect(),
            Instruction::CondBranch { cond, .. } => vec![cond],
            Instruction::Alloca { .. } | Instruction::Branch { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary {
                result,
                op,
                lhs,
                rhs,
                ty,
            } => write!(f, "%{} = {} {} {}, {}", result, op, ty, lhs, rhs),
            Instruction::Cmp {
                result,
                op,
                lhs,
                rhs,
                operand_ty,
            } => {
                let mnemonic = if op.is_float() { "fcmp" } else { "icmp" };
                write!(
                    f,
                    "%{} = {} {} {} {}, {}",
                    result, mnemonic, op, operand_ty, lhs, rhs
                )
            }
            Instruction::Not {
                result,
                operand,
                ty,
            } => write!(f, "%{} = not {} {}", result, ty, operand),
            Instruction::Neg {
                result,
                operand,
                ty,
            } => write!(f, "%{} = neg {} {}", result, ty, operand),
            Instruction::Cast {
                result,
                op,
                value,
                from,
                to,
            } => write!(f, "%{} = {} {} {} to {}", result, op, from, value, to),
            Instruction::Load { result, ptr, ty } => {
                write!(f, "%{} = load {}, {}* {}", result, ty, ty, ptr)
            }
            Instruction::Store { value, ptr, ty } => {
                write!(f, "store {} {}, {}* {}", ty, value, ty, ptr)
            }
            Instruction::GetElementPtr {
                result,
                base,
                base_ty,
                indices,
                ..
            } => {
                write!(f, "%{} = getelementptr {}, {}* {}", result, base_ty, base_ty, base)?;
                for index in indices {
                    write!(f, ", i64 {}", index)?;
                }
                Ok(())
            }
            Instruction::Alloca { result, ty, name } => {
                write!(f, "%{} = alloca {}", result, ty)?;
                if let Some(name) = name {
                    write!(f, " ; {}", name)?;
                }
                Ok(())
            }
            Instruction::Call {
                result,
                callee,
                args,
                ret_ty,
            } => {
                if let Some(result) = result {
                    write!(f, "%{} = ", result)?;
                }
                write!(f, "call {} {}(", ret_ty, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instruction::Return { value: Some(value) } => write!(f, "ret {}", value),
            Instruction::Return { value: None } => write!(f, "ret void"),
            Instruction::Branch { target } => write!(f, "br label %bb{}", target),
            Instruction::CondBranch {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br i1 {}, label %bb{}, label %bb{}",
                cond, then_block, else_block
            ),
        }
    }
}

/// Basic block - a straight-line instruction sequence ending in exactly
/// one terminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: String) -> Self {
        Self {
            id,
            label,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn has_terminator(&self) -> bool {
        self.terminator().is_some()
    }
}

/// Function - a prototype plus, once defined, a single-entry block graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    /// Incoming argument temporaries with their types
    pub params: Vec<(TempId, IrType)>,
    pub is_vararg: bool,
    /// Empty for declarations
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: String, return_type: IrType) -> Self {
        Self {
            name,
            return_type,
            params: Vec::new(),
            is_vararg: false,
            blocks: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    fn block_label(&self, id: BlockId) -> &str {
        self.get_block(id).map(|b| b.label.as_str()).unwrap_or("?")
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_declaration() {
            write!(f, "declare {} @{}(", self.return_type, self.name)?;
            for (i, (_, ty)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ty)?;
            }
            if self.is_vararg {
                if !self.params.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "...")?;
            }
            return write!(f, ")");
        }

        write!(f, "define {} @{}(", self.return_type, self.name)?;
        for (i, (temp, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %{}", ty, temp)?;
        }
        writeln!(f, ") {{")?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for instr in &block.instructions {
                // Branch targets print by label, with the function as context
                match instr {
                    Instruction::Branch { target } => {
                        writeln!(f, "  br label %{}", self.block_label(*target))?;
                    }
                    Instruction::CondBranch {
                        cond,
                        then_block,
                        else_block,
                    } => {
                        writeln!(
                            f,
                            "  br i1 {}, label %{}, label %{}",
                            cond,
                            self.block_label(*then_block),
                            self.block_label(*else_block)
                        )?;
                    }
                    other => writeln!(f, "  {}", other)?,
                }
            }
        }
        write!(f, "}}")
    }
}

/// Linkage classes for global symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// Visible to other modules
    External,
    /// Only visible within this module
    Internal,
    /// Not visible outside, no symbol emitted
    Private,
}

/// Global variable definition
///
/// Created once via the define operation, never deleted. The declared type
/// always equals the initializer's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    pub ty: IrType,
    pub init: Constant,
    pub is_constant: bool,
    pub linkage: Linkage,
}

impl fmt::Display for GlobalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} = ", self.name)?;
        match self.linkage {
            Linkage::External => {}
            Linkage::Internal => write!(f, "internal ")?,
            Linkage::Private => write!(f, "private ")?,
        }
        let kind = if self.is_constant { "constant" } else { "global" };
        write!(f, "{} {} {}", kind, self.ty, self.init)
    }
}

/// IR module - the complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub target_triple: Option<String>,
    pub globals: Vec<GlobalVariable>,
    pub functions: Vec<Function>,
    /// Named aggregate definitions, ordered for deterministic printing
    pub type_definitions: BTreeMap<String, IrType>,
}

impl Module {
    pub fn new(name: String) -> Self {
        Self {
            name,
            target_triple: None,
            globals: Vec::new(),
            functions: Vec::new(),
            type_definitions: BTreeMap::new(),
        }
    }

    pub fn add_global(&mut self, global: GlobalVariable) {
        self.globals.push(global);
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn get_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.globals.iter().find(|g| g.name == name)
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        if let Some(triple) = &self.target_triple {
            writeln!(f, "target triple = \"{}\"", triple)?;
        }

        if !self.type_definitions.is_empty() {
            writeln!(f)?;
            for (name, ty) in &self.type_definitions {
                match ty {
                    IrType::Struct { fields, .. } => {
                        write!(f, "%{} = type {{ ", name)?;
                        for (i, field) in fields.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", field)?;
                        }
                        writeln!(f, " }}")?;
                    }
                    IrType::Union { fields, .. } => {
                        write!(f, "%{} = type union {{ ", name)?;
                        for (i, field) in fields.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", field)?;
                        }
                        writeln!(f, " }}")?;
                    }
                    other => writeln!(f, "%{} = type {}", name, other)?,
                }
            }
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                writeln!(f, "{}", global)?;
            }
        }

        for function in &self.functions {
            writeln!(f)?;
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constant_types() {
        assert_eq!(Constant::i32(3).ty(), IrType::I32);
        assert_eq!(
            Constant::null(IrType::I32).ty(),
            IrType::I32.pointer_to()
        );
        let arr = Constant::array(IrType::I32, vec![Constant::i32(1), Constant::i32(2)]);
        assert_eq!(
            arr.ty(),
            IrType::Array {
                size: 2,
                element: Box::new(IrType::I32)
            }
        );
        let s = Constant::Str {
            data: "hello".to_string(),
        };
        assert_eq!(
            s.ty(),
            IrType::Array {
                size: 6,
                element: Box::new(IrType::I8)
            }
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Temp(5).to_string(), "%5");
        assert_eq!(Value::Const(Constant::i32(42)).to_string(), "42");
        assert_eq!(Value::Global("main".to_string()).to_string(), "@main");
    }

    #[test]
    fn test_block_terminator() {
        let mut block = BasicBlock::new(0, "entry".to_string());
        assert!(block.is_empty());
        assert!(!block.has_terminator());

        block.push(Instruction::Alloca {
            result: 0,
            ty: IrType::I32,
            name: None,
        });
        assert!(!block.has_terminator());

        block.push(Instruction::Return {
            value: Some(Value::Const(Constant::i32(0))),
        });
        assert!(block.has_terminator());
    }

    #[test]
    fn test_instruction_results_and_successors() {
        let load = Instruction::Load {
            result: 3,
            ptr: Value::Global("a".to_string()),
            ty: IrType::I32,
        };
        assert_eq!(load.result(), Some(3));
        assert!(!load.is_terminator());

        let br = Instruction::CondBranch {
            cond: Value::Temp(0),
            then_block: 1,
            else_block: 2,
        };
        assert_eq!(br.result(), None);
        assert!(br.is_terminator());
        assert_eq!(br.successors(), vec![1, 2]);
    }

    #[test]
    fn test_function_display() {
        let mut func = Function::new("main".to_string(), IrType::I32);
        let mut entry = BasicBlock::new(0, "entry".to_string());
        entry.push(Instruction::Load {
            result: 0,
            ptr: Value::Global("start".to_string()),
            ty: IrType::I32,
        });
        entry.push(Instruction::Return {
            value: Some(Value::Temp(0)),
        });
        func.blocks.push(entry);

        let text = func.to_string();
        assert_eq!(
            text,
            "define i32 @main() {\nentry:\n  %0 = load i32, i32* @start\n  ret %0\n}"
        );
    }

    #[test]
    fn test_module_display() {
        let mut module = Module::new("demo".to_string());
        module.target_triple = Some("x86_64-linux".to_string());
        module.add_global(GlobalVariable {
            name: "start".to_string(),
            ty: IrType::I32,
            init: Constant::i32(1),
            is_constant: false,
            linkage: Linkage::External,
        });
        let mut decl = Function::new("printf".to_string(), IrType::I32);
        decl.params = vec![(0, IrType::I8.pointer_to())];
        decl.is_vararg = true;
        module.add_function(decl);

        let text = module.to_string();
        assert!(text.contains("; ModuleID = 'demo'"));
        assert!(text.contains("target triple = \"x86_64-linux\""));
        assert!(text.contains("@start = global i32 1"));
        assert!(text.contains("declare i32 @printf(i8*, ...)"));
    }

    #[test]
    fn test_module_lookups() {
        let mut module = Module::new("demo".to_string());
        module.add_function(Function::new("main".to_string(), IrType::I32));
        module.add_global(GlobalVariable {
            name: "g".to_string(),
            ty: IrType::I32,
            init: Constant::i32(7),
            is_constant: false,
            linkage: Linkage::External,
        });

        assert!(module.get_function("main").is_some());
        assert!(module.get_function("other").is_none());
        assert!(module.get_global("g").is_some());
    }
}
