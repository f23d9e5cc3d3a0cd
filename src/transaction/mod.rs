//! Transaction model: the declarative surface the compiler consumes.
//!
//! A spike transaction describes the per-synapse update, a neuron transaction
//! the per-neuron update including spike emission. Both are assembled through
//! the fluent [`TxBuilder`] API and exported as an immutable [`TransactionAst`].

use std::fmt;

mod builder;

pub use builder::{ConditionalBuilder, Transaction, TxBuilder};

// ─── Fields ────────────────────────────────────────────────────────

/// Storage class of a transaction field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TxFieldType {
    /// Per-synapse parameter (weight). Implies a pre-synaptic dimension.
    SynapticParam,
    /// Per-neuron state (membrane potential). Implies a post-synaptic dimension.
    Dynamic,
    /// Per-network constant held in the register bank.
    Static,
    /// Scratch value with no storage dimension.
    Local,
    Delay,
}

impl TxFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            TxFieldType::SynapticParam => "SYNAPTIC_PARAM",
            TxFieldType::Dynamic => "DYNAMIC",
            TxFieldType::Static => "STATIC",
            TxFieldType::Local => "LOCAL",
            TxFieldType::Delay => "DELAY",
        }
    }
}

impl fmt::Display for TxFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxField {
    pub name: String,
    pub bit_width: u32,
    pub ty: TxFieldType,
}

/// Which transaction a statement came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransactionKind {
    Spike,
    Neuron,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Spike => "spike",
            TransactionKind::Neuron => "neuron",
        }
    }

    pub(crate) fn allows_field_type(self, ty: TxFieldType) -> bool {
        match self {
            TransactionKind::Spike => matches!(
                ty,
                TxFieldType::SynapticParam
                    | TxFieldType::Delay
                    | TxFieldType::Local
                    | TxFieldType::Dynamic
            ),
            TransactionKind::Neuron => matches!(
                ty,
                TxFieldType::Dynamic | TxFieldType::Static | TxFieldType::Local
            ),
        }
    }

    pub(crate) fn allows_assignment_to(self, ty: TxFieldType) -> bool {
        !(self == TransactionKind::Spike && ty == TxFieldType::SynapticParam)
    }
}

// ─── Operands ──────────────────────────────────────────────────────

/// Identifier of an emit statement, unique within one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitId(pub u32);

impl EmitId {
    pub const FIRST: EmitId = EmitId(1);

    pub fn next(self) -> EmitId {
        EmitId(self.0 + 1)
    }

    /// Symbol name under which the emit result is registered.
    pub fn symbol_name(self) -> String {
        format!("emit#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxOperand {
    Constant(i64),
    FieldRef(TxField),
    ExternalFieldRef {
        name: String,
        ty: TxFieldType,
        bit_width: u32,
    },
    EmitReference {
        emit_id: EmitId,
        target: Option<TxField>,
    },
}

impl TxOperand {
    /// Storage class this operand reads from. Constants and emit results
    /// have none.
    pub fn field_type(&self) -> Option<TxFieldType> {
        match self {
            TxOperand::Constant(_) | TxOperand::EmitReference { .. } => None,
            TxOperand::FieldRef(field) => Some(field.ty),
            TxOperand::ExternalFieldRef { ty, .. } => Some(*ty),
        }
    }
}

impl fmt::Display for TxOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxOperand::Constant(v) => write!(f, "{}", v),
            TxOperand::FieldRef(field) => f.write_str(&field.name),
            TxOperand::ExternalFieldRef {
                name,
                ty,
                bit_width,
            } => write!(f, "{}@{}:{}", name, ty, bit_width),
            TxOperand::EmitReference { emit_id, target } => {
                write!(f, "emit#{}", emit_id.0)?;
                if let Some(t) = target {
                    write!(f, "({})", t.name)?;
                }
                Ok(())
            }
        }
    }
}

// ─── Operators ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Pow,
    LogicalOr,
    LogicalAnd,
    LogicalNot,
}

impl OpCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Pow => "POW",
            OpCode::LogicalOr => "LOGICAL_OR",
            OpCode::LogicalAnd => "LOGICAL_AND",
            OpCode::LogicalNot => "LOGICAL_NOT",
        }
    }

    pub fn is_unary(self) -> bool {
        self == OpCode::LogicalNot
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxCondition {
    pub left: TxOperand,
    pub comparison: ComparisonOp,
    pub right: TxOperand,
}

impl fmt::Display for TxCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparison.symbol(), self.right)
    }
}

// ─── Statements ────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TxBlock {
    pub statements: Vec<TxStatement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxElseIf {
    pub condition: TxCondition,
    pub body: TxBlock,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxIfBlock {
    pub condition: TxCondition,
    pub body: TxBlock,
    pub else_ifs: Vec<TxElseIf>,
    pub else_block: Option<TxBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxStatement {
    Assignment {
        target: TxField,
        value: TxOperand,
    },
    BinaryOp {
        target: TxField,
        opcode: OpCode,
        left: TxOperand,
        right: TxOperand,
    },
    UnaryOp {
        target: TxField,
        opcode: OpCode,
        operand: TxOperand,
    },
    Emit {
        emit_id: EmitId,
        target: Option<TxField>,
    },
    IfBlock(TxIfBlock),
    Block(TxBlock),
}

/// Immutable export of one transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionAst {
    pub name: String,
    pub kind: TransactionKind,
    pub fields: Vec<TxField>,
    pub root: TxBlock,
}
