//! Phase- and loop-aware tree built from the two transactions.
//!
//! The tree goes through three pure steps, each returning a new tree:
//! [`build_initial`] concatenates both transactions, [`attach_phase_regions`]
//! partitions the statements into SYNAPTIC / SOMATIC / EMISSION / REFRACTORY
//! blocks, and the `expand_*_loops` family wraps nodes in the per-synapse and
//! per-neuron iterations the architecture implies.

use std::fmt;

pub use crate::transaction::TransactionKind;
use crate::transaction::{EmitId, OpCode, TxCondition, TxField, TxFieldType, TxOperand};

mod builder;
mod expand;

pub use builder::{attach_phase_regions, build_initial};
pub use expand::{
    expand_all, expand_emission_loops, expand_refractory_loops, expand_somatic_loops,
    expand_synaptic_loops, LoopPattern,
};

// ─── Phases ────────────────────────────────────────────────────────

/// Execution phase of the accelerator. Declaration order is execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Synaptic,
    Somatic,
    Emission,
    Refractory,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Synaptic,
        Phase::Somatic,
        Phase::Emission,
        Phase::Refractory,
    ];

    /// Lowercase name used in FSM state and instance names.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Synaptic => "synaptic",
            Phase::Somatic => "somatic",
            Phase::Emission => "emission",
            Phase::Refractory => "refractory",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Nodes ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Assignment,
    Binary,
    Unary,
    Emit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstOperation {
    pub origin: TransactionKind,
    pub kind: OperationKind,
    pub target: Option<TxField>,
    pub operands: Vec<TxOperand>,
    pub opcode: Option<OpCode>,
    /// Set for `Emit` operations only.
    pub emit_id: Option<EmitId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstElseIf {
    pub condition: TxCondition,
    pub body: AstBlock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstCondition {
    pub origin: TransactionKind,
    pub condition: TxCondition,
    pub then_block: AstBlock,
    pub else_ifs: Vec<AstElseIf>,
    pub else_block: Option<AstBlock>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Presynaptic,
    Postsynaptic,
}

impl LoopKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopKind::Presynaptic => "PRESYNAPTIC",
            LoopKind::Postsynaptic => "POSTSYNAPTIC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopDescriptor {
    pub iterator: String,
    pub count: u32,
    pub kind: LoopKind,
    pub description: String,
}

impl LoopDescriptor {
    pub const PRE_ITERATOR: &'static str = "preNeuron";
    pub const POST_ITERATOR: &'static str = "postNeuron";

    pub fn presynaptic(count: u32) -> Self {
        Self {
            iterator: Self::PRE_ITERATOR.to_string(),
            count,
            kind: LoopKind::Presynaptic,
            description: "iterate pre-synaptic neurons".to_string(),
        }
    }

    pub fn postsynaptic(count: u32) -> Self {
        Self {
            iterator: Self::POST_ITERATOR.to_string(),
            count,
            kind: LoopKind::Postsynaptic,
            description: "iterate post-synaptic neurons".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstLoop {
    pub origin: TransactionKind,
    pub descriptor: LoopDescriptor,
    pub body: AstBlock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstPhaseBlock {
    pub origin: TransactionKind,
    pub phase: Phase,
    pub body: AstBlock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AstNode {
    Operation(AstOperation),
    Condition(AstCondition),
    Loop(AstLoop),
    Phase(AstPhaseBlock),
}

impl AstNode {
    pub fn origin(&self) -> TransactionKind {
        match self {
            AstNode::Operation(op) => op.origin,
            AstNode::Condition(c) => c.origin,
            AstNode::Loop(l) => l.origin,
            AstNode::Phase(p) => p.origin,
        }
    }

    /// True for an emit, or for any node with an emit somewhere below it.
    pub fn contains_emit(&self) -> bool {
        match self {
            AstNode::Operation(op) => op.kind == OperationKind::Emit,
            AstNode::Condition(c) => {
                c.then_block.contains_emit()
                    || c.else_ifs.iter().any(|b| b.body.contains_emit())
                    || c.else_block.as_ref().is_some_and(|b| b.contains_emit())
            }
            AstNode::Loop(l) => l.body.contains_emit(),
            AstNode::Phase(p) => p.body.contains_emit(),
        }
    }

    /// Every field type the node reads or writes, nested bodies included.
    pub fn field_types(&self) -> Vec<TxFieldType> {
        let mut out = Vec::new();
        self.collect_field_types(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_field_types(&self, out: &mut Vec<TxFieldType>) {
        match self {
            AstNode::Operation(op) => {
                if let Some(target) = &op.target {
                    out.push(target.ty);
                }
                out.extend(op.operands.iter().filter_map(TxOperand::field_type));
            }
            AstNode::Condition(c) => {
                out.extend(c.condition.left.field_type());
                out.extend(c.condition.right.field_type());
                c.then_block.collect_field_types(out);
                for branch in &c.else_ifs {
                    branch.body.collect_field_types(out);
                }
                if let Some(b) = &c.else_block {
                    b.collect_field_types(out);
                }
            }
            AstNode::Loop(l) => l.body.collect_field_types(out),
            AstNode::Phase(p) => p.body.collect_field_types(out),
        }
    }
}

/// Ordered node list. The origin is absent for blocks that mix transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AstBlock {
    pub origin: Option<TransactionKind>,
    pub statements: Vec<AstNode>,
}

impl AstBlock {
    pub fn new(origin: Option<TransactionKind>, statements: Vec<AstNode>) -> Self {
        Self { origin, statements }
    }

    /// Same origin, different statements.
    pub fn with_statements(&self, statements: Vec<AstNode>) -> Self {
        Self {
            origin: self.origin,
            statements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn contains_emit(&self) -> bool {
        self.statements.iter().any(AstNode::contains_emit)
    }

    fn collect_field_types(&self, out: &mut Vec<TxFieldType>) {
        for node in &self.statements {
            node.collect_field_types(out);
        }
    }

    /// Top-level phase blocks, in order.
    pub fn phase_blocks(&self) -> impl Iterator<Item = &AstPhaseBlock> {
        self.statements.iter().filter_map(|node| match node {
            AstNode::Phase(p) => Some(p),
            _ => None,
        })
    }

    pub fn phase_block(&self, phase: Phase) -> Option<&AstPhaseBlock> {
        self.phase_blocks().find(|p| p.phase == phase)
    }
}
