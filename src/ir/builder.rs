use tracing::{debug, trace};

use super::*;
use crate::ast::{AstBlock, AstCondition, AstNode, AstOperation, OperationKind};
use crate::diagnostic::{Diagnostic, Stage};
use crate::error::{CompileError, Result, UnresolvedReport};
use crate::transaction::{TxCondition, TxField, TxOperand};

/// Lowers a phased, loop-expanded AST into an [`IrProgram`].
pub struct IrBuilder<'a> {
    symbols: &'a SymbolTable,
    unresolved: UnresolvedReport,
}

impl<'a> IrBuilder<'a> {
    /// Project each phase block 1:1. Nodes outside a phase block carry no
    /// phase and are skipped. Every unresolved reference is collected before
    /// failing.
    pub fn from_ast(
        ast: &AstBlock,
        symbols: SymbolTable,
        architecture: ArchDescriptor,
    ) -> Result<IrProgram> {
        let mut builder = IrBuilder {
            symbols: &symbols,
            unresolved: UnresolvedReport::default(),
        };
        let mut phases = Vec::new();
        for node in &ast.statements {
            match node {
                AstNode::Phase(p) => phases.push(IrPhaseBlock {
                    phase: p.phase,
                    body: builder.lower_block(&p.body),
                }),
                other => trace!(origin = ?other.origin(), "node outside phase block skipped"),
            }
        }
        if !builder.unresolved.is_empty() {
            return Err(CompileError::UnresolvedReference(builder.unresolved));
        }
        debug!(
            phases = phases.len(),
            statements = phases.iter().map(|p| p.body.statements.len()).sum::<usize>(),
            "ir built"
        );
        Ok(IrProgram::new(phases, architecture, symbols))
    }

    fn lower_block(&mut self, block: &AstBlock) -> IrBlock {
        IrBlock {
            statements: block
                .statements
                .iter()
                .filter_map(|node| self.lower_node(node))
                .collect(),
        }
    }

    fn lower_node(&mut self, node: &AstNode) -> Option<IrStatement> {
        match node {
            AstNode::Operation(op) => self.lower_operation(op),
            AstNode::Condition(c) => self.lower_condition(c),
            AstNode::Loop(l) => Some(IrStatement::Loop {
                iterator: IrIterator {
                    name: l.descriptor.iterator.clone(),
                    count: l.descriptor.count,
                    kind: l.descriptor.kind,
                },
                body: self.lower_block(&l.body),
            }),
            AstNode::Phase(_) => None,
        }
    }

    fn lower_operation(&mut self, op: &AstOperation) -> Option<IrStatement> {
        match op.kind {
            OperationKind::Assignment => {
                let target = self.target(op);
                let value = op.operands.first().and_then(|o| self.value(o));
                Some(IrStatement::Assignment {
                    target: target?,
                    value: value?,
                })
            }
            OperationKind::Binary | OperationKind::Unary => {
                let target = self.target(op);
                let operands: Vec<Option<IrValue>> =
                    op.operands.iter().map(|o| self.value(o)).collect();
                Some(IrStatement::Operation {
                    opcode: op.opcode?,
                    target: target?,
                    operands: operands.into_iter().collect::<Option<Vec<_>>>()?,
                })
            }
            OperationKind::Emit => {
                let target = match &op.target {
                    Some(field) => Some(self.field(field)?),
                    None => None,
                };
                Some(IrStatement::Emit {
                    emit_id: op.emit_id?,
                    target,
                })
            }
        }
    }

    fn lower_condition(&mut self, c: &AstCondition) -> Option<IrStatement> {
        let condition = self.condition(&c.condition);
        let then_block = self.lower_block(&c.then_block);
        let else_ifs: Vec<_> = c
            .else_ifs
            .iter()
            .map(|branch| (self.condition(&branch.condition), self.lower_block(&branch.body)))
            .collect();
        let else_block = c.else_block.as_ref().map(|b| self.lower_block(b));
        Some(IrStatement::Conditional {
            condition: condition?,
            then_block,
            else_ifs: else_ifs
                .into_iter()
                .map(|(cond, body)| cond.map(|condition| IrBranch { condition, body }))
                .collect::<Option<Vec<_>>>()?,
            else_block,
        })
    }

    fn condition(&mut self, c: &TxCondition) -> Option<IrCondition> {
        let left = self.value(&c.left);
        let right = self.value(&c.right);
        Some(IrCondition {
            left: left?,
            comparison: c.comparison,
            right: right?,
        })
    }

    // ─── Resolution ────────────────────────────────────────────────

    fn target(&mut self, op: &AstOperation) -> Option<SymbolEntry> {
        match &op.target {
            Some(field) => self.field(field),
            None => {
                self.unresolved.issues.push(Diagnostic::error(
                    Stage::Ir,
                    format!("{:?} operation without target", op.kind),
                ));
                None
            }
        }
    }

    fn field(&mut self, field: &TxField) -> Option<SymbolEntry> {
        match self.symbols.resolve_field(&field.name) {
            Some(entry) => Some(entry.clone()),
            None => {
                self.missing("field", &field.name);
                None
            }
        }
    }

    fn value(&mut self, operand: &TxOperand) -> Option<IrValue> {
        let (what, name) = match operand {
            TxOperand::Constant(v) => return Some(IrValue::Constant(*v)),
            TxOperand::FieldRef(field) => return self.field(field).map(IrValue::Symbol),
            TxOperand::ExternalFieldRef { name, .. } => ("operand", name.clone()),
            TxOperand::EmitReference { emit_id, .. } => ("emit result", emit_id.symbol_name()),
        };
        match self.symbols.resolve_operand(&name) {
            Some(entry) => Some(IrValue::Symbol(entry.clone())),
            None => {
                self.missing(what, &name);
                None
            }
        }
    }

    fn missing(&mut self, what: &str, name: &str) {
        self.unresolved.issues.push(
            Diagnostic::error(
                Stage::Ir,
                format!("{} '{}' is not registered in the symbol table", what, name),
            )
            .with_symbol(name),
        );
    }
}
