use tracing::debug;

use super::*;
use crate::arch::ArchDescriptor;
use crate::error::{CompileError, Result};

/// Iteration dimensions a node needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPattern {
    Scalar,
    PreOnly,
    PostOnly,
    Double,
}

impl LoopPattern {
    /// SYNAPTIC_PARAM implies a pre-synaptic dimension, DYNAMIC a
    /// post-synaptic one. Emits are always scalar.
    pub fn classify(node: &AstNode) -> LoopPattern {
        if let AstNode::Operation(op) = node {
            if op.kind == OperationKind::Emit {
                return LoopPattern::Scalar;
            }
        }
        let types = node.field_types();
        let pre = types.contains(&TxFieldType::SynapticParam);
        let post = types.contains(&TxFieldType::Dynamic);
        match (pre, post) {
            (true, true) => LoopPattern::Double,
            (true, false) => LoopPattern::PreOnly,
            (false, true) => LoopPattern::PostOnly,
            (false, false) => LoopPattern::Scalar,
        }
    }
}

// ─── Per-Phase Entry Points ────────────────────────────────────────

pub fn expand_synaptic_loops(block: &AstPhaseBlock, arch: &ArchDescriptor) -> Result<AstPhaseBlock> {
    expand_checked(block, Phase::Synaptic, arch)
}

pub fn expand_somatic_loops(block: &AstPhaseBlock, arch: &ArchDescriptor) -> Result<AstPhaseBlock> {
    expand_checked(block, Phase::Somatic, arch)
}

pub fn expand_emission_loops(block: &AstPhaseBlock, arch: &ArchDescriptor) -> Result<AstPhaseBlock> {
    expand_checked(block, Phase::Emission, arch)
}

pub fn expand_refractory_loops(
    block: &AstPhaseBlock,
    arch: &ArchDescriptor,
) -> Result<AstPhaseBlock> {
    expand_checked(block, Phase::Refractory, arch)
}

fn expand_checked(block: &AstPhaseBlock, expected: Phase, arch: &ArchDescriptor) -> Result<AstPhaseBlock> {
    if block.phase != expected {
        return Err(CompileError::data_model(
            block.phase.as_str(),
            format!("{} loop expansion applied to a {} block", expected, block.phase),
        ));
    }
    Ok(expand_phase(block, arch))
}

/// Expand every phase block of a phased tree. Non-phase nodes pass through.
pub fn expand_all(ast: &AstBlock, arch: &ArchDescriptor) -> AstBlock {
    let statements = ast
        .statements
        .iter()
        .map(|node| match node {
            AstNode::Phase(p) => AstNode::Phase(expand_phase(p, arch)),
            other => other.clone(),
        })
        .collect();
    ast.with_statements(statements)
}

fn expand_phase(block: &AstPhaseBlock, arch: &ArchDescriptor) -> AstPhaseBlock {
    let bounds = LoopBounds {
        pre: arch.pre_count(),
        post: arch.post_count(),
    };
    let body = expand_block(&block.body, bounds);
    debug!(
        phase = %block.phase,
        pre = bounds.pre,
        post = bounds.post,
        "loops expanded"
    );
    AstPhaseBlock {
        origin: block.origin,
        phase: block.phase,
        body,
    }
}

// ─── Expansion ─────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct LoopBounds {
    pre: u32,
    post: u32,
}

fn expand_block(block: &AstBlock, bounds: LoopBounds) -> AstBlock {
    block.with_statements(
        block
            .statements
            .iter()
            .map(|node| expand_node(node, bounds))
            .collect(),
    )
}

fn expand_node(node: &AstNode, bounds: LoopBounds) -> AstNode {
    let updated = match node {
        // already iterated, and phase blocks are handled by the caller
        AstNode::Loop(_) | AstNode::Phase(_) => return node.clone(),
        AstNode::Operation(_) => node.clone(),
        AstNode::Condition(cond) => AstNode::Condition(AstCondition {
            origin: cond.origin,
            condition: cond.condition.clone(),
            then_block: expand_block(&cond.then_block, bounds),
            else_ifs: cond
                .else_ifs
                .iter()
                .map(|branch| AstElseIf {
                    condition: branch.condition.clone(),
                    body: expand_block(&branch.body, bounds),
                })
                .collect(),
            else_block: cond.else_block.as_ref().map(|b| expand_block(b, bounds)),
        }),
    };
    let pattern = LoopPattern::classify(&updated);
    wrap(updated, pattern, bounds)
}

fn wrap(node: AstNode, pattern: LoopPattern, bounds: LoopBounds) -> AstNode {
    match pattern {
        LoopPattern::Scalar => node,
        LoopPattern::PreOnly => wrap_single(node, bounds.pre, LoopDescriptor::presynaptic),
        LoopPattern::PostOnly => wrap_single(node, bounds.post, LoopDescriptor::postsynaptic),
        LoopPattern::Double => {
            if bounds.pre == 0 || bounds.post == 0 {
                return node;
            }
            let inner = wrap_single(node, bounds.post, LoopDescriptor::postsynaptic);
            wrap_single(inner, bounds.pre, LoopDescriptor::presynaptic)
        }
    }
}

/// Zero-bound loops are never generated.
fn wrap_single(node: AstNode, count: u32, descriptor: fn(u32) -> LoopDescriptor) -> AstNode {
    if count == 0 {
        return node;
    }
    let origin = node.origin();
    AstNode::Loop(AstLoop {
        origin,
        descriptor: descriptor(count),
        body: AstBlock::new(Some(origin), vec![node]),
    })
}
