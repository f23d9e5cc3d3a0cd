//! Canonical serialization of the compiler's plans into a [`PlanHasher`].
//!
//! Enums are written by their stable string names so reordering variants
//! never changes a hash.

use super::*;
use crate::binding::PhaseBindingPlan;
use crate::control::ControlPlan;
use crate::ir::{IrBlock, IrCondition, IrProgram, IrStatement, IrValue};
use crate::layout::LayoutPlan;
use crate::naming::NamingPlan;
use crate::semantics::{PhaseParallelPlan, SynapticPackingPlan, SynapticPipelinePlan};
use crate::symbols::SymbolEntry;

impl PlanHasher {
    // ─── IR ────────────────────────────────────────────────────────

    pub fn write_program(&mut self, program: &IrProgram) {
        let arch = program.architecture();
        self.write_len(arch.neurons_per_layer().len());
        for &count in arch.neurons_per_layer() {
            self.write_u32(count);
        }
        self.write_str(arch.connectivity().id());
        self.write_len(arch.static_parameters().len());
        for param in arch.static_parameters() {
            self.write_str(param.name());
            self.write_u32(param.width());
        }

        self.write_len(program.phases().len());
        for block in program.phases() {
            self.write_u8(TAG_PHASE);
            self.write_str(block.phase.as_str());
            self.write_block(&block.body);
        }
        self.write_len(program.planned_transformations().len());
        for note in program.planned_transformations() {
            self.write_u8(TAG_TRANSFORM);
            self.write_str(note.kind.as_str());
            self.write_str(note.details.as_deref().unwrap_or(""));
        }
    }

    fn write_block(&mut self, block: &IrBlock) {
        self.write_len(block.statements.len());
        for stmt in &block.statements {
            self.write_statement(stmt);
        }
    }

    fn write_statement(&mut self, stmt: &IrStatement) {
        match stmt {
            IrStatement::Assignment { target, value } => {
                self.write_u8(TAG_ASSIGN);
                self.write_symbol(target);
                self.write_value(value);
            }
            IrStatement::Operation {
                opcode,
                target,
                operands,
            } => {
                self.write_u8(TAG_OP);
                self.write_str(opcode.as_str());
                self.write_symbol(target);
                self.write_len(operands.len());
                for op in operands {
                    self.write_value(op);
                }
            }
            IrStatement::Emit { emit_id, target } => {
                self.write_u8(TAG_EMIT);
                self.write_u32(emit_id.0);
                match target {
                    Some(t) => {
                        self.write_u8(1);
                        self.write_symbol(t);
                    }
                    None => self.write_u8(0),
                }
            }
            IrStatement::Conditional {
                condition,
                then_block,
                else_ifs,
                else_block,
            } => {
                self.write_u8(TAG_COND);
                self.write_condition(condition);
                self.write_block(then_block);
                self.write_len(else_ifs.len());
                for branch in else_ifs {
                    self.write_condition(&branch.condition);
                    self.write_block(&branch.body);
                }
                match else_block {
                    Some(b) => {
                        self.write_u8(1);
                        self.write_block(b);
                    }
                    None => self.write_u8(0),
                }
            }
            IrStatement::Loop { iterator, body } => {
                self.write_u8(TAG_LOOP);
                self.write_str(&iterator.name);
                self.write_u32(iterator.count);
                self.write_str(iterator.kind.as_str());
                self.write_block(body);
            }
        }
    }

    fn write_condition(&mut self, cond: &IrCondition) {
        self.write_value(&cond.left);
        self.write_str(cond.comparison.symbol());
        self.write_value(&cond.right);
    }

    fn write_value(&mut self, value: &IrValue) {
        match value {
            IrValue::Symbol(entry) => self.write_symbol(entry),
            IrValue::Constant(v) => {
                self.write_u8(TAG_CONST);
                self.write_i64(*v);
            }
        }
    }

    fn write_symbol(&mut self, entry: &SymbolEntry) {
        self.write_u8(TAG_SYMBOL);
        self.write_str(&entry.name);
        self.write_str(entry.ty.map(|t| t.as_str()).unwrap_or(""));
        self.write_u32(entry.bit_width);
    }

    // ─── Semantic plans ────────────────────────────────────────────

    pub fn write_packing(&mut self, plan: &SynapticPackingPlan) {
        self.write_u8(TAG_PACKING);
        self.write_bool(plan.enabled);
        self.write_str(plan.mode.as_str());
        self.write_u32(plan.word_width);
        self.write_u32(plan.memory_ports);
        self.write_len(plan.assignments.len());
        for a in &plan.assignments {
            self.write_str(&a.symbol.name);
            self.write_u32(a.word_index);
            self.write_u32(a.bit_offset);
            self.write_u32(a.bit_width);
        }
    }

    pub fn write_pipeline(&mut self, plan: &SynapticPipelinePlan) {
        self.write_u8(TAG_PIPELINE);
        self.write_bool(plan.enabled);
        self.write_u32(plan.stage_latency_cycles);
        self.write_len(plan.stages.len());
        for stage in &plan.stages {
            self.write_str(&stage.name);
            self.write_len(stage.operations.len());
            for op in &stage.operations {
                self.write_str(op.kind.as_str());
                self.write_str(&op.target);
            }
        }
    }

    pub fn write_parallel(&mut self, plan: &PhaseParallelPlan) {
        self.write_u8(TAG_PARALLEL);
        self.write_str(plan.phase.as_str());
        self.write_bool(plan.enabled);
        self.write_u32(plan.effective_group_size);
        self.write_u32(plan.total_groups);
        self.write_u32(plan.active_groups);
        self.write_u32(plan.remainder);
        self.write_opt_u32(plan.max_groups);
    }

    // ─── Downstream plans ──────────────────────────────────────────

    pub fn write_layout(&mut self, plan: &LayoutPlan) {
        self.write_u8(TAG_LAYOUT);
        self.write_u32(plan.memory.word_count);
        self.write_u32(plan.memory.word_width);
        self.write_u32(plan.memory.port_count);
        self.write_u32(plan.pipeline.stage_count);
        self.write_u32(plan.pipeline.stage_latency_cycles);
        self.write_bool(plan.synaptic_gate_by_tick);
        self.write_u32(plan.tick.timeslot);
        self.write_str(plan.tick.unit.as_str());
        self.write_u32(plan.tick.clock_period_ns);
        for fifo in [&plan.spike_in, &plan.spike_out] {
            self.write_str(&fifo.name);
            self.write_u32(fifo.data_width);
            self.write_u32(fifo.depth);
        }
        let memories = plan.physical_memories();
        self.write_len(memories.len());
        for mem in memories {
            self.write_str(&mem.name);
            self.write_u32(mem.word_width);
            self.write_u64(mem.depth);
        }
        self.write_bool(plan.dynamic.is_some());
        if let Some(dynamic) = &plan.dynamic {
            self.write_len(dynamic.all().count());
            for array in dynamic.all() {
                self.write_str(&array.field);
                self.write_u32(array.bit_width);
                self.write_u64(array.count);
            }
        }
        self.write_len(plan.registers.registers.len());
        for reg in &plan.registers.registers {
            self.write_str(&reg.name);
            self.write_u32(reg.width);
            self.write_u64(reg.init);
        }
        self.write_u32(plan.selector.address_width);
    }

    pub fn write_bindings(&mut self, plan: &PhaseBindingPlan) {
        self.write_u8(TAG_BINDING);
        self.write_len(plan.bindings.len());
        for binding in &plan.bindings {
            self.write_str(binding.phase.as_str());
            self.write_str(binding.unit.as_str());
            self.write_len(binding.operations.len());
            for op in &binding.operations {
                self.write_str(&op.target);
                self.write_str(op.opcode.map(|o| o.as_str()).unwrap_or(""));
            }
        }
    }

    pub fn write_control(&mut self, plan: &ControlPlan) {
        self.write_u8(TAG_CONTROL);
        self.write_len(plan.states.len());
        for state in &plan.states {
            self.write_str(&state.name);
        }
        self.write_len(plan.transitions.len());
        for t in &plan.transitions {
            self.write_str(&t.from);
            self.write_str(&t.to);
            self.write_str(t.guard.as_str());
        }
    }

    pub fn write_naming(&mut self, plan: &NamingPlan) {
        self.write_u8(TAG_NAMING);
        self.write_len(plan.allocated().len());
        for name in plan.allocated() {
            self.write_str(name);
        }
    }
}
