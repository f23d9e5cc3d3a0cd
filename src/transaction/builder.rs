use tracing::debug;

use super::*;
use crate::arch::ArchDescriptor;
use crate::error::{CompileError, Result};

// ─── Transaction ───────────────────────────────────────────────────

/// Declared fields of one transaction, shared read-only with its builders.
#[derive(Clone, Debug)]
struct FieldSchema {
    name: String,
    kind: TransactionKind,
    fields: Vec<TxField>,
}

impl FieldSchema {
    fn get(&self, name: &str) -> Option<&TxField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn require(&self, name: &str) -> Result<&TxField> {
        self.get(name).ok_or_else(|| {
            CompileError::data_model(
                name,
                format!("field is not declared in transaction '{}'", self.name),
            )
        })
    }

    fn require_assignable(&self, name: &str) -> Result<TxField> {
        let field = self.require(name)?;
        if !self.kind.allows_assignment_to(field.ty) {
            return Err(CompileError::data_model(
                name,
                format!(
                    "assignments to {} fields are not allowed in {} transaction '{}'",
                    field.ty,
                    self.kind.as_str(),
                    self.name
                ),
            ));
        }
        Ok(field.clone())
    }
}

/// A spike or neuron transaction under construction.
///
/// Statements are appended through [`Transaction::build`]; the next emit id
/// travels into each builder by value and comes back out when the body is
/// complete, so a failed body leaves the transaction untouched.
#[derive(Clone, Debug)]
pub struct Transaction {
    schema: FieldSchema,
    statements: Vec<TxStatement>,
    next_emit: EmitId,
}

impl Transaction {
    pub fn spike(name: impl Into<String>) -> Self {
        Self::new(name.into(), TransactionKind::Spike)
    }

    pub fn neuron(name: impl Into<String>) -> Self {
        Self::new(name.into(), TransactionKind::Neuron)
    }

    fn new(name: String, kind: TransactionKind) -> Self {
        Self {
            schema: FieldSchema {
                name,
                kind,
                fields: Vec::new(),
            },
            statements: Vec::new(),
            next_emit: EmitId::FIRST,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn kind(&self) -> TransactionKind {
        self.schema.kind
    }

    pub fn fields(&self) -> &[TxField] {
        &self.schema.fields
    }

    pub fn field(&self, name: &str) -> Option<&TxField> {
        self.schema.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.get(name).is_some()
    }

    /// Id the next `emit` in this transaction will receive.
    pub fn next_emit_id(&self) -> EmitId {
        self.next_emit
    }

    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        bit_width: u32,
        ty: TxFieldType,
    ) -> Result<TxField> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CompileError::data_model(name, "field name must not be blank"));
        }
        if bit_width == 0 {
            return Err(CompileError::data_model(name, "field width must be positive"));
        }
        if !self.schema.kind.allows_field_type(ty) {
            return Err(CompileError::data_model(
                name,
                format!(
                    "{} fields are not allowed in {} transactions",
                    ty,
                    self.schema.kind.as_str()
                ),
            ));
        }
        if self.has_field(&name) {
            return Err(CompileError::data_model(name, "field is already defined"));
        }
        let field = TxField {
            name,
            bit_width,
            ty,
        };
        self.schema.fields.push(field.clone());
        Ok(field)
    }

    /// Declare a STATIC field whose width comes from an architecture parameter.
    /// Only neuron transactions hold static fields.
    pub fn add_static_field_from_arch(
        &mut self,
        arch: &ArchDescriptor,
        param: &str,
        field_name: Option<&str>,
    ) -> Result<TxField> {
        let descriptor = arch.static_parameter(param).ok_or_else(|| {
            CompileError::data_model(param, "static parameter is not defined in the architecture")
        })?;
        let width = descriptor.width();
        self.add_field(field_name.unwrap_or(param), width, TxFieldType::Static)
    }

    /// Run `body` against a builder positioned at the root block.
    pub fn build<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut TxBuilder<'_>) -> Result<()>,
    {
        let mut builder = TxBuilder {
            schema: &self.schema,
            next_emit: self.next_emit,
            statements: Vec::new(),
        };
        body(&mut builder)?;
        let TxBuilder {
            next_emit,
            statements,
            ..
        } = builder;
        debug!(
            transaction = %self.schema.name,
            added = statements.len(),
            next_emit = next_emit.0,
            "transaction body built"
        );
        self.statements.extend(statements);
        self.next_emit = next_emit;
        Ok(())
    }

    pub fn to_ast(&self) -> TransactionAst {
        TransactionAst {
            name: self.schema.name.clone(),
            kind: self.schema.kind,
            fields: self.schema.fields.clone(),
            root: TxBlock {
                statements: self.statements.clone(),
            },
        }
    }
}

// ─── Statement Builder ─────────────────────────────────────────────

/// Appends statements to one block of a transaction.
pub struct TxBuilder<'t> {
    schema: &'t FieldSchema,
    next_emit: EmitId,
    statements: Vec<TxStatement>,
}

impl<'t> TxBuilder<'t> {
    pub fn constant(&self, value: i64) -> TxOperand {
        TxOperand::Constant(value)
    }

    pub fn field(&self, name: &str) -> Result<TxOperand> {
        Ok(TxOperand::FieldRef(self.schema.require(name)?.clone()))
    }

    /// Reference a value owned outside this transaction.
    pub fn external_field(
        &self,
        name: &str,
        ty: TxFieldType,
        bit_width: u32,
    ) -> Result<TxOperand> {
        if name.trim().is_empty() {
            return Err(CompileError::data_model(
                name,
                "external field name must not be blank",
            ));
        }
        if bit_width == 0 {
            return Err(CompileError::data_model(
                name,
                "external field width must be positive",
            ));
        }
        Ok(TxOperand::ExternalFieldRef {
            name: name.to_string(),
            ty,
            bit_width,
        })
    }

    pub fn assign(&mut self, target: &str, value: TxOperand) -> Result<()> {
        let target = self.schema.require_assignable(target)?;
        self.statements
            .push(TxStatement::Assignment { target, value });
        Ok(())
    }

    pub fn assign_const(&mut self, target: &str, value: i64) -> Result<()> {
        self.assign(target, TxOperand::Constant(value))
    }

    pub fn add(&mut self, target: &str, left: TxOperand, right: TxOperand) -> Result<()> {
        self.binary(target, OpCode::Add, left, right)
    }

    pub fn sub(&mut self, target: &str, left: TxOperand, right: TxOperand) -> Result<()> {
        self.binary(target, OpCode::Sub, left, right)
    }

    pub fn mul(&mut self, target: &str, left: TxOperand, right: TxOperand) -> Result<()> {
        self.binary(target, OpCode::Mul, left, right)
    }

    pub fn pow(&mut self, target: &str, base: TxOperand, exponent: TxOperand) -> Result<()> {
        self.binary(target, OpCode::Pow, base, exponent)
    }

    pub fn logical_or(&mut self, target: &str, left: TxOperand, right: TxOperand) -> Result<()> {
        self.binary(target, OpCode::LogicalOr, left, right)
    }

    pub fn logical_and(&mut self, target: &str, left: TxOperand, right: TxOperand) -> Result<()> {
        self.binary(target, OpCode::LogicalAnd, left, right)
    }

    pub fn logical_not(&mut self, target: &str, operand: TxOperand) -> Result<()> {
        let target = self.schema.require_assignable(target)?;
        self.statements.push(TxStatement::UnaryOp {
            target,
            opcode: OpCode::LogicalNot,
            operand,
        });
        Ok(())
    }

    fn binary(
        &mut self,
        target: &str,
        opcode: OpCode,
        left: TxOperand,
        right: TxOperand,
    ) -> Result<()> {
        let target = self.schema.require_assignable(target)?;
        self.statements.push(TxStatement::BinaryOp {
            target,
            opcode,
            left,
            right,
        });
        Ok(())
    }

    /// Open an if-block. Else-if and else branches hang off the returned
    /// builder; the block is committed when that builder is dropped.
    pub fn if_condition<F>(
        &mut self,
        left: TxOperand,
        comparison: ComparisonOp,
        right: TxOperand,
        body: F,
    ) -> Result<ConditionalBuilder<'_, 't>>
    where
        F: FnOnce(&mut TxBuilder<'_>) -> Result<()>,
    {
        let body = self.nested(body)?;
        Ok(ConditionalBuilder {
            pending: Some(TxIfBlock {
                condition: TxCondition {
                    left,
                    comparison,
                    right,
                },
                body,
                else_ifs: Vec::new(),
                else_block: None,
            }),
            parent: self,
        })
    }

    /// Append an emit statement and return an operand naming its result.
    pub fn emit(&mut self, target: Option<&str>) -> Result<TxOperand> {
        if self.schema.kind != TransactionKind::Neuron {
            return Err(CompileError::data_model(
                &self.schema.name,
                "emit is only allowed in neuron transactions",
            ));
        }
        let target = match target {
            Some(name) => Some(self.schema.require_assignable(name)?),
            None => None,
        };
        let emit_id = self.next_emit;
        self.next_emit = emit_id.next();
        self.statements.push(TxStatement::Emit {
            emit_id,
            target: target.clone(),
        });
        Ok(TxOperand::EmitReference { emit_id, target })
    }

    /// Build a child block, carrying the emit id through it.
    fn nested<F>(&mut self, body: F) -> Result<TxBlock>
    where
        F: FnOnce(&mut TxBuilder<'_>) -> Result<()>,
    {
        let mut inner = TxBuilder {
            schema: self.schema,
            next_emit: self.next_emit,
            statements: Vec::new(),
        };
        body(&mut inner)?;
        self.next_emit = inner.next_emit;
        Ok(TxBlock {
            statements: inner.statements,
        })
    }
}

// ─── Conditional Builder ───────────────────────────────────────────

/// Continuation of an if-block returned by [`TxBuilder::if_condition`].
pub struct ConditionalBuilder<'b, 't> {
    parent: &'b mut TxBuilder<'t>,
    pending: Option<TxIfBlock>,
}

impl<'b, 't> ConditionalBuilder<'b, 't> {
    pub fn else_if<F>(
        mut self,
        left: TxOperand,
        comparison: ComparisonOp,
        right: TxOperand,
        body: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut TxBuilder<'_>) -> Result<()>,
    {
        // A failed branch drops the whole if-block instead of committing it
        // without that branch.
        let pending = self.pending.take();
        let body = self.parent.nested(body)?;
        self.pending = pending.map(|mut block| {
            block.else_ifs.push(TxElseIf {
                condition: TxCondition {
                    left,
                    comparison,
                    right,
                },
                body,
            });
            block
        });
        Ok(self)
    }

    pub fn else_block<F>(mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut TxBuilder<'_>) -> Result<()>,
    {
        let pending = self.pending.take();
        let body = self.parent.nested(body)?;
        self.pending = pending.map(|mut block| {
            block.else_block = Some(body);
            block
        });
        Ok(())
    }
}

impl Drop for ConditionalBuilder<'_, '_> {
    fn drop(&mut self) {
        if let Some(block) = self.pending.take() {
            self.parent.statements.push(TxStatement::IfBlock(block));
        }
    }
}
