//! Symbol table: every field and operand the kernel touches.
//!
//! Names are global across both transactions. Whenever a name is seen again,
//! as a field or as an operand, its width and type must match the first
//! registration.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::ast::{AstBlock, AstNode, OperationKind, TransactionKind};
use crate::diagnostic::{Diagnostic, Stage};
use crate::error::{CompileError, Result, UnresolvedReport};
use crate::transaction::{TxCondition, TxField, TxFieldType, TxOperand};

#[cfg(test)]
mod tests;

// ─── Entries ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Field,
    Operand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolOrigin {
    TransactionField,
    TransactionOperand,
    External,
    EmitResult,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub ty: Option<TxFieldType>,
    pub bit_width: u32,
    pub kind: SymbolKind,
    pub origin: SymbolOrigin,
    pub transaction_id: Option<String>,
    pub transaction_kind: Option<TransactionKind>,
}

// ─── Table ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    fields: BTreeMap<String, SymbolEntry>,
    operands: BTreeMap<String, SymbolEntry>,
    /// Registration order of names per transaction id.
    fields_by_tx: BTreeMap<String, Vec<String>>,
    operands_by_tx: BTreeMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_transaction_fields(
        &mut self,
        tx_id: &str,
        kind: Option<TransactionKind>,
        fields: &[TxField],
    ) -> Result<()> {
        for field in fields {
            let entry = SymbolEntry {
                name: field.name.clone(),
                ty: Some(field.ty),
                bit_width: field.bit_width,
                kind: SymbolKind::Field,
                origin: SymbolOrigin::TransactionField,
                transaction_id: Some(tx_id.to_string()),
                transaction_kind: kind,
            };
            if let Some(existing) = self.operands.get(&entry.name) {
                check_consistent(existing, &entry)?;
            }
            match self.fields.get(&entry.name) {
                Some(existing) => check_consistent(existing, &entry)?,
                None => {
                    trace!(name = %entry.name, width = entry.bit_width, "field registered");
                    self.fields.insert(entry.name.clone(), entry);
                }
            }
            push_unique(self.fields_by_tx.entry(tx_id.to_string()).or_default(), &field.name);
        }
        debug!(tx = tx_id, count = fields.len(), "transaction fields registered");
        Ok(())
    }

    /// Register every operand found in `nodes`, including condition operands,
    /// externals and emit results.
    pub fn register_operands(
        &mut self,
        tx_id: &str,
        kind: Option<TransactionKind>,
        nodes: &[AstNode],
    ) -> Result<()> {
        let mut found = Vec::new();
        for node in nodes {
            collect_operands(node, &mut found);
        }
        for (operand, node_origin) in found {
            let Some(entry) = operand_entry(&operand, tx_id, kind.or(Some(node_origin))) else {
                continue;
            };
            if let Some(field) = self.fields.get(&entry.name) {
                check_consistent(field, &entry)?;
            }
            match self.operands.get(&entry.name) {
                Some(existing) => check_consistent(existing, &entry)?,
                None => {
                    trace!(name = %entry.name, origin = ?entry.origin, "operand registered");
                    self.operands.insert(entry.name.clone(), entry.clone());
                }
            }
            push_unique(self.operands_by_tx.entry(tx_id.to_string()).or_default(), &entry.name);
        }
        Ok(())
    }

    pub fn resolve_field(&self, name: &str) -> Option<&SymbolEntry> {
        self.fields.get(name)
    }

    /// Operand lookup falls back to the field registry.
    pub fn resolve_operand(&self, name: &str) -> Option<&SymbolEntry> {
        self.operands.get(name).or_else(|| self.fields.get(name))
    }

    pub fn fields_for_transaction(&self, tx_id: &str) -> Vec<&SymbolEntry> {
        self.fields_by_tx
            .get(tx_id)
            .map(|names| names.iter().filter_map(|n| self.fields.get(n)).collect())
            .unwrap_or_default()
    }

    pub fn operands_for_transaction(&self, tx_id: &str) -> Vec<&SymbolEntry> {
        self.operands_by_tx
            .get(tx_id)
            .map(|names| names.iter().filter_map(|n| self.resolve_operand(n)).collect())
            .unwrap_or_default()
    }

    pub fn width_of(&self, name: &str) -> Option<u32> {
        self.resolve_operand(name).map(|e| e.bit_width)
    }

    /// All fields, sorted by name.
    pub fn all_fields(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.fields.values()
    }

    /// All operands, sorted by name.
    pub fn all_operands(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.operands.values()
    }

    /// Fields of one storage class, sorted by name.
    pub fn fields_of_type(&self, ty: TxFieldType) -> Vec<&SymbolEntry> {
        self.fields.values().filter(|e| e.ty == Some(ty)).collect()
    }

    pub fn synaptic_params_sorted(&self) -> Vec<&SymbolEntry> {
        self.fields_of_type(TxFieldType::SynapticParam)
    }

    /// Walk the whole tree and report every reference the table cannot
    /// resolve, in traversal order.
    pub fn validate(&self, ast: &AstBlock) -> Result<()> {
        let mut report = UnresolvedReport::default();
        self.validate_block(ast, &mut report);
        if report.is_empty() {
            debug!("symbol validation passed");
            return Ok(());
        }
        debug!(issues = report.issues.len(), "symbol validation failed");
        Err(CompileError::UnresolvedReference(report))
    }

    fn validate_block(&self, block: &AstBlock, report: &mut UnresolvedReport) {
        for node in &block.statements {
            self.validate_node(node, report);
        }
    }

    fn validate_node(&self, node: &AstNode, report: &mut UnresolvedReport) {
        match node {
            AstNode::Operation(op) => {
                if let Some(target) = &op.target {
                    if !self.fields.contains_key(&target.name) {
                        report.issues.push(
                            Diagnostic::error(
                                Stage::Symbols,
                                format!(
                                    "unknown target field '{}' in {} operation",
                                    target.name,
                                    operation_label(op.kind)
                                ),
                            )
                            .with_symbol(&target.name)
                            .with_help("declare the field on the transaction that writes it".to_string()),
                        );
                    }
                }
                for operand in &op.operands {
                    self.check_operand(operand, report);
                }
            }
            AstNode::Condition(c) => {
                self.check_condition(&c.condition, report);
                self.validate_block(&c.then_block, report);
                for branch in &c.else_ifs {
                    self.check_condition(&branch.condition, report);
                    self.validate_block(&branch.body, report);
                }
                if let Some(b) = &c.else_block {
                    self.validate_block(b, report);
                }
            }
            AstNode::Loop(l) => self.validate_block(&l.body, report),
            AstNode::Phase(p) => self.validate_block(&p.body, report),
        }
    }

    fn check_condition(&self, condition: &TxCondition, report: &mut UnresolvedReport) {
        self.check_operand(&condition.left, report);
        self.check_operand(&condition.right, report);
    }

    fn check_operand(&self, operand: &TxOperand, report: &mut UnresolvedReport) {
        let Some(name) = operand_name(operand) else {
            return;
        };
        if self.resolve_operand(&name).is_none() {
            let what = match operand {
                TxOperand::EmitReference { .. } => "emit result",
                TxOperand::ExternalFieldRef { .. } => "external operand",
                _ => "operand",
            };
            report.issues.push(
                Diagnostic::error(
                    Stage::Symbols,
                    format!("unknown {} '{}' referenced in ast", what, name),
                )
                .with_symbol(name),
            );
        }
    }
}

// ─── Helpers ───────────────────────────────────────────────────────

/// Symbol name an operand resolves through; constants have none.
pub fn operand_name(operand: &TxOperand) -> Option<String> {
    match operand {
        TxOperand::Constant(_) => None,
        TxOperand::FieldRef(field) => Some(field.name.clone()),
        TxOperand::ExternalFieldRef { name, .. } => Some(name.clone()),
        TxOperand::EmitReference { emit_id, .. } => Some(emit_id.symbol_name()),
    }
}

fn operation_label(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Assignment => "assignment",
        OperationKind::Binary => "binary",
        OperationKind::Unary => "unary",
        OperationKind::Emit => "emit",
    }
}

fn operand_entry(
    operand: &TxOperand,
    tx_id: &str,
    kind: Option<TransactionKind>,
) -> Option<SymbolEntry> {
    let (name, ty, bit_width, origin) = match operand {
        TxOperand::Constant(_) => return None,
        TxOperand::FieldRef(field) => (
            field.name.clone(),
            Some(field.ty),
            field.bit_width,
            SymbolOrigin::TransactionOperand,
        ),
        TxOperand::ExternalFieldRef {
            name,
            ty,
            bit_width,
        } => (name.clone(), Some(*ty), *bit_width, SymbolOrigin::External),
        TxOperand::EmitReference { emit_id, target } => (
            emit_id.symbol_name(),
            target.as_ref().map(|f| f.ty),
            target.as_ref().map_or(1, |f| f.bit_width),
            SymbolOrigin::EmitResult,
        ),
    };
    Some(SymbolEntry {
        name,
        ty,
        bit_width,
        kind: SymbolKind::Operand,
        origin,
        transaction_id: Some(tx_id.to_string()),
        transaction_kind: kind,
    })
}

fn collect_operands(node: &AstNode, out: &mut Vec<(TxOperand, TransactionKind)>) {
    match node {
        AstNode::Operation(op) => {
            out.extend(op.operands.iter().map(|o| (o.clone(), op.origin)));
        }
        AstNode::Condition(c) => {
            out.push((c.condition.left.clone(), c.origin));
            out.push((c.condition.right.clone(), c.origin));
            for n in &c.then_block.statements {
                collect_operands(n, out);
            }
            for branch in &c.else_ifs {
                out.push((branch.condition.left.clone(), c.origin));
                out.push((branch.condition.right.clone(), c.origin));
                for n in &branch.body.statements {
                    collect_operands(n, out);
                }
            }
            if let Some(b) = &c.else_block {
                for n in &b.statements {
                    collect_operands(n, out);
                }
            }
        }
        AstNode::Loop(l) => {
            for n in &l.body.statements {
                collect_operands(n, out);
            }
        }
        AstNode::Phase(p) => {
            for n in &p.body.statements {
                collect_operands(n, out);
            }
        }
    }
}

fn check_consistent(existing: &SymbolEntry, incoming: &SymbolEntry) -> Result<()> {
    if existing.bit_width != incoming.bit_width {
        return Err(CompileError::data_model(
            &incoming.name,
            format!(
                "conflicting bit widths ({} vs {})",
                existing.bit_width, incoming.bit_width
            ),
        ));
    }
    if existing.ty != incoming.ty {
        return Err(CompileError::data_model(
            &incoming.name,
            format!(
                "conflicting types ({} vs {})",
                type_label(existing.ty),
                type_label(incoming.ty)
            ),
        ));
    }
    Ok(())
}

fn type_label(ty: Option<TxFieldType>) -> &'static str {
    ty.map_or("untyped", TxFieldType::as_str)
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}
