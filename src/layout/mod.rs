//! Layout planning.
//!
//! Combines the semantic plans with architecture metadata into one
//! [`LayoutPlan`]: memory geometry, pipeline shape, per-phase grouping and
//! the hardware resources the kernel needs. The planner never fails; anything
//! that had no effect is reported as an advisory note.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, Stage};
use crate::ir::{IrProgram, Phase};
use crate::semantics::{
    PackingMode, PhaseParallelPlan, SynapticPackingPlan, SynapticPipelinePlan,
};
use crate::symbols::SymbolEntry;
use crate::transaction::TxFieldType;

mod resources;

pub use resources::{
    BitSlice, DynArrays, DynParamPlan, FifoPlan, RegisterBank, RegisterDesc, ResourceConfig,
    SelectorPlan, TickPlan, TimeUnit, WeightMemoryPlan, BASE_ADDR_REG, PACKED_MEMORY,
    POSTSYN_COUNT_REG, SELECTOR, SPIKE_IN, SPIKE_OUT, TICK_SIGNAL,
};

// ─── Plan ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    /// Highest assigned word index plus one; zero without assignments.
    pub word_count: u32,
    pub word_width: u32,
    pub port_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineLayout {
    pub enabled: bool,
    pub stage_count: u32,
    pub stage_latency_cycles: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutPlan {
    pub memory: MemoryLayout,
    pub pipeline: PipelineLayout,
    pub parallel: BTreeMap<Phase, PhaseParallelPlan>,
    /// The synaptic phase advances only on tick boundaries.
    pub synaptic_gate_by_tick: bool,

    pub tick: TickPlan,
    pub spike_in: FifoPlan,
    pub spike_out: FifoPlan,
    /// Keyed by synaptic field name.
    pub weight_memories: BTreeMap<String, WeightMemoryPlan>,
    /// Absent when the kernel declares no dynamic field.
    pub dynamic: Option<DynArrays>,
    pub registers: RegisterBank,
    pub selector: SelectorPlan,

    pub notes: Vec<Diagnostic>,
}

impl LayoutPlan {
    /// Distinct physical weight memories, by name.
    pub fn physical_memories(&self) -> Vec<&WeightMemoryPlan> {
        let mut out: Vec<&WeightMemoryPlan> = Vec::new();
        for mem in self.weight_memories.values() {
            if !out.iter().any(|m| m.name == mem.name) {
                out.push(mem);
            }
        }
        out
    }

    pub fn parallel_plan(&self, phase: Phase) -> Option<&PhaseParallelPlan> {
        self.parallel.get(&phase)
    }
}

// ─── Planner ───────────────────────────────────────────────────────

pub struct LayoutPlanner<'a> {
    program: &'a IrProgram,
    resources: ResourceConfig,
    notes: Vec<Diagnostic>,
}

impl<'a> LayoutPlanner<'a> {
    pub fn new(program: &'a IrProgram, resources: ResourceConfig) -> Self {
        Self {
            program,
            resources,
            notes: Vec::new(),
        }
    }

    pub fn plan(
        mut self,
        packing: &SynapticPackingPlan,
        pipeline: &SynapticPipelinePlan,
        parallel: &[PhaseParallelPlan],
    ) -> LayoutPlan {
        let program = self.program;
        let arch = program.architecture();
        let widths = arch.derive_widths();

        let memory = MemoryLayout {
            word_count: packing
                .assignments
                .iter()
                .map(|a| a.word_index + 1)
                .max()
                .unwrap_or(0),
            word_width: packing.word_width,
            port_count: packing.memory_ports,
        };
        let pipeline_layout = PipelineLayout {
            enabled: pipeline.enabled,
            stage_count: pipeline.stages.len() as u32,
            stage_latency_cycles: pipeline.stage_latency_cycles,
        };
        let parallel: BTreeMap<Phase, PhaseParallelPlan> =
            parallel.iter().map(|p| (p.phase, p.clone())).collect();

        self.check_packing(packing);
        self.check_pipeline(pipeline);
        for plan in parallel.values() {
            self.check_parallel(plan);
        }
        if widths.total_neuron_count == 0 {
            self.advise("architecture defines no neurons; layout is empty".to_string());
        }

        let synaptic_params: Vec<&SymbolEntry> = program.symbols().synaptic_params_sorted();
        let weight_memories = weight_memories(
            &synaptic_params,
            packing,
            widths.total_synapse_count,
            widths.neuron_global_id_width,
        );
        let dynamic = self.dynamic_arrays(widths.total_neuron_count);
        let registers = self.register_bank(arch.post_count(), widths.synapse_address_width);

        let depth = self.resources.fifo_depth();
        let plan = LayoutPlan {
            memory,
            pipeline: pipeline_layout,
            parallel,
            synaptic_gate_by_tick: pipeline.enabled,
            tick: TickPlan {
                signal: TICK_SIGNAL.to_string(),
                timeslot: self.resources.tick_timeslot(),
                unit: self.resources.tick_unit(),
                clock_period_ns: self.resources.clock_period_ns(),
            },
            spike_in: FifoPlan::spike(SPIKE_IN, widths.neuron_global_id_width, depth),
            spike_out: FifoPlan::spike(SPIKE_OUT, widths.neuron_global_id_width, depth),
            weight_memories,
            dynamic,
            registers,
            selector: SelectorPlan {
                name: SELECTOR.to_string(),
                address_width: widths.synapse_address_width,
                pre_width: widths.neuron_global_id_width,
                post_width: widths.neuron_global_id_width,
                step_by_tick: pipeline.enabled,
                linear_address: true,
            },
            notes: self.notes,
        };
        debug!(
            words = plan.memory.word_count,
            stages = plan.pipeline.stage_count,
            memories = plan.physical_memories().len(),
            notes = plan.notes.len(),
            "layout planned"
        );
        plan
    }

    // ─── Advisories ────────────────────────────────────────────────

    fn check_packing(&mut self, packing: &SynapticPackingPlan) {
        if packing.enabled {
            return;
        }
        let msg = match packing.mode {
            PackingMode::Packed => {
                "synaptic packing requested but there are no synaptic parameters".to_string()
            }
            PackingMode::IndividualWord => format!(
                "synaptic packing disabled; {} field(s) use one word each",
                packing.assignments.len()
            ),
        };
        self.advise(msg);
    }

    fn check_pipeline(&mut self, pipeline: &SynapticPipelinePlan) {
        if pipeline.enabled {
            return;
        }
        let msg = if pipeline.operation_count() == 0 {
            "synaptic pipeline has no operations to stage".to_string()
        } else {
            "synaptic pipeline disabled; tick gating is off".to_string()
        };
        self.advise(msg);
    }

    fn check_parallel(&mut self, plan: &PhaseParallelPlan) {
        if plan.enabled {
            return;
        }
        let msg = if plan.total_groups == 0 {
            format!("parallel {} has no neurons to group", plan.phase)
        } else {
            format!("parallel {} disabled; neurons run one group at a time", plan.phase)
        };
        self.advise(msg);
    }

    fn advise(&mut self, message: String) {
        warn!(stage = "layout", "{}", message);
        self.notes.push(Diagnostic::warning(Stage::Layout, message));
    }

    // ─── Resources ─────────────────────────────────────────────────

    /// The main array is the first dynamic field the synaptic phase writes,
    /// falling back to the first dynamic field by name.
    fn dynamic_arrays(&mut self, neurons: u64) -> Option<DynArrays> {
        let program = self.program;
        let symbols = program.symbols();
        let fields = symbols.fields_of_type(TxFieldType::Dynamic);
        if fields.is_empty() {
            self.advise("no dynamic neuron fields; state arrays omitted".to_string());
            return None;
        }
        let written = program
            .walk_operations(Phase::Synaptic)
            .into_iter()
            .find(|op| {
                symbols
                    .resolve_field(&op.target)
                    .is_some_and(|e| e.ty == Some(TxFieldType::Dynamic))
            })
            .map(|op| op.target);
        let main_name = written.unwrap_or_else(|| fields[0].name.clone());

        let mut main = None;
        let mut extra = Vec::new();
        for field in fields {
            let plan = DynParamPlan {
                field: field.name.clone(),
                bit_width: field.bit_width,
                count: neurons,
            };
            if field.name == main_name && main.is_none() {
                main = Some(plan);
            } else {
                extra.push(plan);
            }
        }
        main.map(|main| DynArrays { main, extra })
    }

    fn register_bank(&self, post_count: u32, address_width: u32) -> RegisterBank {
        let mut registers: Vec<RegisterDesc> = self
            .program
            .symbols()
            .fields_of_type(TxFieldType::Static)
            .into_iter()
            .map(|f| RegisterDesc {
                name: f.name.clone(),
                width: f.bit_width,
                init: 0,
            })
            .collect();
        registers.push(RegisterDesc {
            name: POSTSYN_COUNT_REG.to_string(),
            width: crate::arch::bit_width_for_count(post_count as u64 + 1),
            init: post_count as u64,
        });
        registers.push(RegisterDesc {
            name: BASE_ADDR_REG.to_string(),
            width: address_width,
            init: 0,
        });
        RegisterBank { registers }
    }
}

/// One shared `wmem_pack` memory when packed, else one `wmem_<field>` per
/// synaptic parameter.
fn weight_memories(
    fields: &[&SymbolEntry],
    packing: &SynapticPackingPlan,
    depth: u64,
    index_width: u32,
) -> BTreeMap<String, WeightMemoryPlan> {
    let packed = packing.enabled
        && packing.mode == PackingMode::Packed
        && !packing.assignments.is_empty();
    if packed {
        let slices = packing
            .assignments
            .iter()
            .map(|a| {
                (
                    a.symbol.name.clone(),
                    BitSlice {
                        lsb: a.bit_offset,
                        msb: a.bit_offset + a.bit_width - 1,
                    },
                )
            })
            .collect();
        let shared = WeightMemoryPlan {
            role: "synparams_packed".to_string(),
            name: PACKED_MEMORY.to_string(),
            word_width: packing.word_width,
            depth,
            pre_index_width: index_width,
            post_index_width: index_width,
            slices: Some(slices),
        };
        return fields
            .iter()
            .map(|f| (f.name.clone(), shared.clone()))
            .collect();
    }
    fields
        .iter()
        .map(|f| {
            (
                f.name.clone(),
                WeightMemoryPlan {
                    role: format!("synparam:{}", f.name),
                    name: format!("wmem_{}", f.name),
                    word_width: f.bit_width,
                    depth,
                    pre_index_width: index_width,
                    post_index_width: index_width,
                    slices: None,
                },
            )
        })
        .collect()
}
