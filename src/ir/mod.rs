//! Per-phase statement IR.
//!
//! The IR mirrors the expanded AST one to one but with every operand resolved
//! to its symbol-table entry. [`IrProgram`] also carries the architecture, the
//! symbol table, and the append-only log of planned transformations that the
//! semantic analyzer writes.

use std::fmt;

use crate::arch::ArchDescriptor;
pub use crate::ast::{LoopKind, Phase};
use crate::symbols::{SymbolEntry, SymbolTable};
use crate::transaction::{ComparisonOp, EmitId, OpCode};

mod builder;

pub use builder::IrBuilder;

// ─── Values and Statements ─────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IrValue {
    Symbol(SymbolEntry),
    Constant(i64),
}

impl fmt::Display for IrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrValue::Symbol(entry) => f.write_str(&entry.name),
            IrValue::Constant(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrIterator {
    pub name: String,
    pub count: u32,
    pub kind: LoopKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrCondition {
    pub left: IrValue,
    pub comparison: ComparisonOp,
    pub right: IrValue,
}

impl fmt::Display for IrCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparison.symbol(), self.right)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrBranch {
    pub condition: IrCondition,
    pub body: IrBlock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IrStatement {
    Assignment {
        target: SymbolEntry,
        value: IrValue,
    },
    /// One operand for unary opcodes, two for binary ones.
    Operation {
        opcode: OpCode,
        target: SymbolEntry,
        operands: Vec<IrValue>,
    },
    Emit {
        emit_id: EmitId,
        target: Option<SymbolEntry>,
    },
    Conditional {
        condition: IrCondition,
        then_block: IrBlock,
        else_ifs: Vec<IrBranch>,
        else_block: Option<IrBlock>,
    },
    Loop {
        iterator: IrIterator,
        body: IrBlock,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IrBlock {
    pub statements: Vec<IrStatement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrPhaseBlock {
    pub phase: Phase,
    pub body: IrBlock,
}

// ─── Flattened Operations ──────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrOperationKind {
    Assignment,
    Operation,
    Emit,
}

impl IrOperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IrOperationKind::Assignment => "ASSIGNMENT",
            IrOperationKind::Operation => "OPERATION",
            IrOperationKind::Emit => "EMIT",
        }
    }
}

/// One executable operation with the iterators enclosing it, outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrOperationRef {
    pub kind: IrOperationKind,
    /// Target symbol name; `emit#N` for an emit without target.
    pub target: String,
    pub opcode: Option<OpCode>,
    pub loop_context: Vec<String>,
}

impl IrBlock {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Executable operations in traversal order. Every conditional branch
    /// contributes in order; loop bodies see their iterator on the context.
    pub fn operations(&self) -> Vec<IrOperationRef> {
        let mut out = Vec::new();
        let mut context = Vec::new();
        flatten(self, &mut context, &mut out);
        out
    }
}

fn flatten(block: &IrBlock, context: &mut Vec<String>, out: &mut Vec<IrOperationRef>) {
    for stmt in &block.statements {
        match stmt {
            IrStatement::Assignment { target, .. } => out.push(IrOperationRef {
                kind: IrOperationKind::Assignment,
                target: target.name.clone(),
                opcode: None,
                loop_context: context.clone(),
            }),
            IrStatement::Operation { opcode, target, .. } => out.push(IrOperationRef {
                kind: IrOperationKind::Operation,
                target: target.name.clone(),
                opcode: Some(*opcode),
                loop_context: context.clone(),
            }),
            IrStatement::Emit { emit_id, target } => out.push(IrOperationRef {
                kind: IrOperationKind::Emit,
                target: target
                    .as_ref()
                    .map_or_else(|| emit_id.symbol_name(), |t| t.name.clone()),
                opcode: None,
                loop_context: context.clone(),
            }),
            IrStatement::Conditional {
                then_block,
                else_ifs,
                else_block,
                ..
            } => {
                flatten(then_block, context, out);
                for branch in else_ifs {
                    flatten(&branch.body, context, out);
                }
                if let Some(b) = else_block {
                    flatten(b, context, out);
                }
            }
            IrStatement::Loop { iterator, body } => {
                context.push(iterator.name.clone());
                flatten(body, context, out);
                context.pop();
            }
        }
    }
}

// ─── Transformation Log ────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IrTransformKind {
    PipelineSynaptic,
    ParallelSomatic,
    ParallelEmission,
    ParallelRefractory,
    ApplyPacking,
}

impl IrTransformKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IrTransformKind::PipelineSynaptic => "PIPELINE_SYNAPTIC",
            IrTransformKind::ParallelSomatic => "PARALLEL_SOMATIC",
            IrTransformKind::ParallelEmission => "PARALLEL_EMISSION",
            IrTransformKind::ParallelRefractory => "PARALLEL_REFRACTORY",
            IrTransformKind::ApplyPacking => "APPLY_PACKING",
        }
    }

    /// Parallelization note for a neuron phase; the synaptic phase has none.
    pub fn parallel_for(phase: Phase) -> Option<IrTransformKind> {
        match phase {
            Phase::Synaptic => None,
            Phase::Somatic => Some(IrTransformKind::ParallelSomatic),
            Phase::Emission => Some(IrTransformKind::ParallelEmission),
            Phase::Refractory => Some(IrTransformKind::ParallelRefractory),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrTransformNote {
    pub kind: IrTransformKind,
    pub details: Option<String>,
}

// ─── Program ───────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct IrProgram {
    phases: Vec<IrPhaseBlock>,
    architecture: ArchDescriptor,
    symbols: SymbolTable,
    notes: Vec<IrTransformNote>,
}

impl IrProgram {
    pub(crate) fn new(
        phases: Vec<IrPhaseBlock>,
        architecture: ArchDescriptor,
        symbols: SymbolTable,
    ) -> Self {
        Self {
            phases,
            architecture,
            symbols,
            notes: Vec::new(),
        }
    }

    /// Phase blocks in execution order. Absent phases are simply missing.
    pub fn phases(&self) -> &[IrPhaseBlock] {
        &self.phases
    }

    pub fn phase(&self, phase: Phase) -> Option<&IrPhaseBlock> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Flattened operations of one phase; empty when the phase is absent.
    pub fn walk_operations(&self, phase: Phase) -> Vec<IrOperationRef> {
        self.phase(phase)
            .map(|p| p.body.operations())
            .unwrap_or_default()
    }

    pub fn architecture(&self) -> &ArchDescriptor {
        &self.architecture
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn planned_transformations(&self) -> &[IrTransformNote] {
        &self.notes
    }

    pub fn has_transformation(&self, kind: IrTransformKind) -> bool {
        self.notes.iter().any(|n| n.kind == kind)
    }

    /// Append a note unless one of the same kind is already logged.
    /// Returns whether the note was added.
    pub fn record_transform(&mut self, kind: IrTransformKind, details: Option<String>) -> bool {
        if self.has_transformation(kind) {
            return false;
        }
        self.notes.push(IrTransformNote { kind, details });
        true
    }
}
