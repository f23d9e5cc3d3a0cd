use tracing::debug;

use super::*;
use crate::transaction::{TransactionAst, TxIfBlock, TxStatement};

// ─── Initial Tree ──────────────────────────────────────────────────

/// Concatenate spike then neuron statements, tagging each node with its
/// origin. Nested `Block` statements are flattened into their parent.
pub fn build_initial(spike: &TransactionAst, neuron: &TransactionAst) -> AstBlock {
    let mut statements = convert_statements(&spike.root.statements, TransactionKind::Spike);
    statements.extend(convert_statements(
        &neuron.root.statements,
        TransactionKind::Neuron,
    ));
    debug!(nodes = statements.len(), "initial ast built");
    AstBlock::new(None, statements)
}

fn convert_statements(source: &[TxStatement], origin: TransactionKind) -> Vec<AstNode> {
    let mut out = Vec::with_capacity(source.len());
    for stmt in source {
        match stmt {
            TxStatement::Assignment { target, value } => out.push(operation(
                origin,
                OperationKind::Assignment,
                Some(target.clone()),
                vec![value.clone()],
                None,
            )),
            TxStatement::BinaryOp {
                target,
                opcode,
                left,
                right,
            } => out.push(operation(
                origin,
                OperationKind::Binary,
                Some(target.clone()),
                vec![left.clone(), right.clone()],
                Some(*opcode),
            )),
            TxStatement::UnaryOp {
                target,
                opcode,
                operand,
            } => out.push(operation(
                origin,
                OperationKind::Unary,
                Some(target.clone()),
                vec![operand.clone()],
                Some(*opcode),
            )),
            TxStatement::Emit { emit_id, target } => {
                out.push(AstNode::Operation(AstOperation {
                    origin,
                    kind: OperationKind::Emit,
                    target: target.clone(),
                    operands: Vec::new(),
                    opcode: None,
                    emit_id: Some(*emit_id),
                }))
            }
            TxStatement::IfBlock(block) => out.push(convert_if(block, origin)),
            TxStatement::Block(block) => out.extend(convert_statements(&block.statements, origin)),
        }
    }
    out
}

fn operation(
    origin: TransactionKind,
    kind: OperationKind,
    target: Option<TxField>,
    operands: Vec<TxOperand>,
    opcode: Option<OpCode>,
) -> AstNode {
    AstNode::Operation(AstOperation {
        origin,
        kind,
        target,
        operands,
        opcode,
        emit_id: None,
    })
}

fn convert_if(block: &TxIfBlock, origin: TransactionKind) -> AstNode {
    let body = |stmts: &[TxStatement]| AstBlock::new(Some(origin), convert_statements(stmts, origin));
    AstNode::Condition(AstCondition {
        origin,
        condition: block.condition.clone(),
        then_block: body(&block.body.statements),
        else_ifs: block
            .else_ifs
            .iter()
            .map(|branch| AstElseIf {
                condition: branch.condition.clone(),
                body: body(&branch.body.statements),
            })
            .collect(),
        else_block: block.else_block.as_ref().map(|b| body(&b.statements)),
    })
}

// ─── Phase Regions ─────────────────────────────────────────────────

/// Partition a flat tree into phase blocks.
///
/// Spike-origin nodes form the SYNAPTIC block. Neuron-origin nodes are
/// scanned once: everything before the first emit-carrying statement is
/// SOMATIC, and that statement plus everything after it is split into its
/// EMISSION and REFRACTORY halves. Empty phases are omitted.
pub fn attach_phase_regions(ast: &AstBlock) -> AstBlock {
    let (synaptic, neuron): (Vec<AstNode>, Vec<AstNode>) = ast
        .statements
        .iter()
        .cloned()
        .partition(|node| node.origin() == TransactionKind::Spike);

    let mut phased = Vec::new();
    push_phase(&mut phased, TransactionKind::Spike, Phase::Synaptic, synaptic);

    let segments = split_neuron_phases(neuron);
    push_phase(&mut phased, TransactionKind::Neuron, Phase::Somatic, segments.somatic);
    push_phase(&mut phased, TransactionKind::Neuron, Phase::Emission, segments.emission);
    push_phase(
        &mut phased,
        TransactionKind::Neuron,
        Phase::Refractory,
        segments.refractory,
    );

    debug!(phases = phased.len(), "phase regions attached");
    AstBlock::new(None, phased)
}

fn push_phase(out: &mut Vec<AstNode>, origin: TransactionKind, phase: Phase, body: Vec<AstNode>) {
    if body.is_empty() {
        return;
    }
    out.push(AstNode::Phase(AstPhaseBlock {
        origin,
        phase,
        body: AstBlock::new(Some(origin), body),
    }));
}

#[derive(Default)]
struct NeuronSegments {
    somatic: Vec<AstNode>,
    emission: Vec<AstNode>,
    refractory: Vec<AstNode>,
}

#[derive(Default)]
struct EmissionSplit {
    emission: Vec<AstNode>,
    refractory: Vec<AstNode>,
}

impl EmissionSplit {
    fn absorb(&mut self, other: EmissionSplit) {
        self.emission.extend(other.emission);
        self.refractory.extend(other.refractory);
    }
}

fn split_neuron_phases(nodes: Vec<AstNode>) -> NeuronSegments {
    let mut segments = NeuronSegments::default();
    let mut emission_started = false;
    let mut tail = EmissionSplit::default();

    for node in nodes {
        if !emission_started && !node.contains_emit() {
            segments.somatic.push(node);
            continue;
        }
        emission_started = true;
        tail.absorb(extract_emission(&node));
    }

    segments.emission = tail.emission;
    segments.refractory = tail.refractory;
    segments
}

/// Split one node into the part that belongs to the spike decision and the
/// part that runs after it. A node without an emit is wholly refractory.
fn extract_emission(node: &AstNode) -> EmissionSplit {
    if !node.contains_emit() {
        return EmissionSplit {
            emission: Vec::new(),
            refractory: vec![node.clone()],
        };
    }
    match node {
        AstNode::Operation(_) => EmissionSplit {
            emission: vec![node.clone()],
            refractory: Vec::new(),
        },
        AstNode::Condition(cond) => split_condition(cond),
        AstNode::Loop(lp) => {
            let body = split_block(&lp.body);
            let rewrap = |stmts: Vec<AstNode>| -> Vec<AstNode> {
                if stmts.is_empty() {
                    return Vec::new();
                }
                vec![AstNode::Loop(AstLoop {
                    origin: lp.origin,
                    descriptor: lp.descriptor.clone(),
                    body: lp.body.with_statements(stmts),
                })]
            };
            EmissionSplit {
                emission: rewrap(body.emission),
                refractory: rewrap(body.refractory),
            }
        }
        AstNode::Phase(phase) => split_block(&phase.body),
    }
}

/// Reproduce the condition in both halves, each keeping only the branch
/// contents that belong to it.
fn split_condition(cond: &AstCondition) -> EmissionSplit {
    let then_split = split_block(&cond.then_block);

    let mut emission_else_ifs = Vec::new();
    let mut refractory_else_ifs = Vec::new();
    for branch in &cond.else_ifs {
        let split = split_block(&branch.body);
        if !split.emission.is_empty() {
            emission_else_ifs.push(AstElseIf {
                condition: branch.condition.clone(),
                body: branch.body.with_statements(split.emission),
            });
        }
        if !split.refractory.is_empty() {
            refractory_else_ifs.push(AstElseIf {
                condition: branch.condition.clone(),
                body: branch.body.with_statements(split.refractory),
            });
        }
    }

    let (emission_else, refractory_else) = match &cond.else_block {
        Some(block) => {
            let split = split_block(block);
            let keep = |stmts: Vec<AstNode>| {
                (!stmts.is_empty()).then(|| block.with_statements(stmts))
            };
            (keep(split.emission), keep(split.refractory))
        }
        None => (None, None),
    };

    let half = |then_stmts: Vec<AstNode>,
                else_ifs: Vec<AstElseIf>,
                else_block: Option<AstBlock>|
     -> Vec<AstNode> {
        if then_stmts.is_empty() && else_ifs.is_empty() && else_block.is_none() {
            return Vec::new();
        }
        vec![AstNode::Condition(AstCondition {
            origin: cond.origin,
            condition: cond.condition.clone(),
            then_block: cond.then_block.with_statements(then_stmts),
            else_ifs,
            else_block,
        })]
    };

    EmissionSplit {
        emission: half(then_split.emission, emission_else_ifs, emission_else),
        refractory: half(then_split.refractory, refractory_else_ifs, refractory_else),
    }
}

/// Split a block at its first emit-carrying statement. Statements up to
/// and including that point are emission; later plain statements are
/// refractory, later emit-carrying ones are split again. A block with no
/// emit is wholly refractory.
fn split_block(block: &AstBlock) -> EmissionSplit {
    if !block.contains_emit() {
        return EmissionSplit {
            emission: Vec::new(),
            refractory: block.statements.clone(),
        };
    }

    let mut result = EmissionSplit::default();
    let mut emission_active = true;
    for stmt in &block.statements {
        if stmt.contains_emit() {
            result.absorb(extract_emission(stmt));
            emission_active = false;
        } else if emission_active {
            result.emission.push(stmt.clone());
        } else {
            result.refractory.push(stmt.clone());
        }
    }
    result
}
