//! Semantic analysis: packing, pipelining and neuron-group parallelism.
//!
//! The analyzer never rewrites statements. Each planner returns a plain plan
//! value, appends an entry to the analyzer's message list and, when the
//! optimization takes effect, logs one note on the program's transformation
//! log.

use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, Stage};
use crate::ir::{IrOperationRef, IrProgram, IrTransformKind, Phase};
use crate::symbols::SymbolEntry;

mod config;

pub use config::{
    PackingConstraints, PackingOptions, ParallelismOptions, PipelineConstraints, PipelineOptions,
    SemanticsConfig,
};

// ─── Plans ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackingMode {
    IndividualWord,
    Packed,
}

impl PackingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PackingMode::IndividualWord => "individual_word",
            PackingMode::Packed => "packed",
        }
    }
}

/// Placement of one synaptic parameter inside the weight memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedFieldAssignment {
    pub symbol: SymbolEntry,
    pub word_index: u32,
    pub bit_offset: u32,
    pub bit_width: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynapticPackingPlan {
    pub enabled: bool,
    pub mode: PackingMode,
    pub word_width: u32,
    pub memory_ports: u32,
    /// Sorted by field name.
    pub assignments: Vec<PackedFieldAssignment>,
    pub notes: Vec<String>,
}

impl SynapticPackingPlan {
    pub fn distinct_words(&self) -> usize {
        let mut words: Vec<u32> = self.assignments.iter().map(|a| a.word_index).collect();
        words.sort_unstable();
        words.dedup();
        words.len()
    }
}

pub type PipelineOperationRef = IrOperationRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineStage {
    /// `stage1`, `stage2`, ...
    pub name: String,
    pub operations: Vec<PipelineOperationRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynapticPipelinePlan {
    pub enabled: bool,
    pub stage_latency_cycles: u32,
    /// Never empty.
    pub stages: Vec<PipelineStage>,
    pub notes: Vec<String>,
}

impl SynapticPipelinePlan {
    pub fn operation_count(&self) -> usize {
        self.stages.iter().map(|s| s.operations.len()).sum()
    }
}

/// Neuron grouping decided for one neuron phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseParallelPlan {
    pub phase: Phase,
    pub enabled: bool,
    pub requested_group_size: u32,
    pub effective_group_size: u32,
    pub total_groups: u32,
    pub active_groups: u32,
    pub remainder: u32,
    pub max_groups: Option<u32>,
    pub notes: Vec<String>,
}

// ─── Analyzer ──────────────────────────────────────────────────────

pub struct SemanticAnalyzer<'a> {
    program: &'a mut IrProgram,
    config: SemanticsConfig,
    messages: Vec<Diagnostic>,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(program: &'a mut IrProgram, config: SemanticsConfig) -> Self {
        Self {
            program,
            config,
            messages: Vec::new(),
        }
    }

    pub fn program(&self) -> &IrProgram {
        &*self.program
    }

    /// Pack the synaptic parameters, sorted by name, into memory words.
    pub fn plan_synaptic_packing(&mut self) -> SynapticPackingPlan {
        let options = self.config.packing;
        let word_width = options.constraints.word_width();
        let fields: Vec<SymbolEntry> = self
            .program
            .symbols()
            .synaptic_params_sorted()
            .into_iter()
            .cloned()
            .collect();

        let (assignments, notes) = pack_fields(&fields, options.enabled, word_width);
        let plan = SynapticPackingPlan {
            enabled: options.enabled && !fields.is_empty(),
            mode: if options.enabled {
                PackingMode::Packed
            } else {
                PackingMode::IndividualWord
            },
            word_width,
            memory_ports: options.constraints.memory_ports(),
            assignments,
            notes,
        };

        for note in &plan.notes {
            self.warning(note.clone());
        }
        if fields.is_empty() {
            self.note("synaptic packing skipped: no synaptic parameters detected".to_string());
        } else if plan.enabled {
            let words = plan.distinct_words();
            self.note(format!(
                "synaptic packing enabled: {} field(s) across {} word(s)",
                plan.assignments.len(),
                words
            ));
            self.program.record_transform(
                IrTransformKind::ApplyPacking,
                Some(format!("words={}, wordWidth={}", words, word_width)),
            );
        } else {
            self.note(format!(
                "synaptic packing disabled; {} field(s) stored individually",
                fields.len()
            ));
        }
        debug!(
            enabled = plan.enabled,
            fields = plan.assignments.len(),
            "synaptic packing planned"
        );
        plan
    }

    /// Split the synaptic operations into contiguous pipeline stages.
    pub fn plan_synaptic_pipeline(&mut self) -> SynapticPipelinePlan {
        let options = self.config.pipeline;
        let mut notes = Vec::new();
        if self.program.phase(Phase::Synaptic).is_none() {
            notes.push("synaptic phase is absent in IR".to_string());
        }
        let operations = self.program.walk_operations(Phase::Synaptic);
        if operations.is_empty() {
            notes.push("synaptic phase does not contain operations".to_string());
        }

        let stages = chunk_stages(
            operations,
            options.enabled,
            options.constraints.max_stages(),
        );
        let plan = SynapticPipelinePlan {
            enabled: options.enabled && stages.iter().any(|s| !s.operations.is_empty()),
            stage_latency_cycles: options.constraints.operation_latency_cycles(),
            stages,
            notes,
        };

        if plan.operation_count() == 0 {
            self.warning("synaptic pipeline skipped: no operations detected".to_string());
        } else if plan.enabled {
            self.note(format!(
                "synaptic pipeline enabled with {} stage(s)",
                plan.stages.len()
            ));
            self.program.record_transform(
                IrTransformKind::PipelineSynaptic,
                Some(format!(
                    "stages={}, latency={}",
                    plan.stages.len(),
                    plan.stage_latency_cycles
                )),
            );
        } else {
            self.note(format!(
                "synaptic pipeline disabled; {} operation(s) remain sequential",
                plan.operation_count()
            ));
        }
        debug!(
            enabled = plan.enabled,
            stages = plan.stages.len(),
            "synaptic pipeline planned"
        );
        plan
    }

    pub fn plan_somatic_parallelism(&mut self, group_size: Option<u32>) -> PhaseParallelPlan {
        let base = self.config.somatic_parallelism;
        self.plan_parallelism(Phase::Somatic, base, group_size)
    }

    pub fn plan_emission_parallelism(&mut self, group_size: Option<u32>) -> PhaseParallelPlan {
        let base = self.config.emission_parallelism;
        self.plan_parallelism(Phase::Emission, base, group_size)
    }

    pub fn plan_refractory_parallelism(&mut self, group_size: Option<u32>) -> PhaseParallelPlan {
        let base = self.config.refractory_parallelism;
        self.plan_parallelism(Phase::Refractory, base, group_size)
    }

    fn plan_parallelism(
        &mut self,
        phase: Phase,
        base: ParallelismOptions,
        group_size: Option<u32>,
    ) -> PhaseParallelPlan {
        let options = base.with_group_size_override(group_size);
        // TODO: deeper topologies need a per-layer neuron count here
        let neurons = self.program.architecture().last_layer_count();
        let plan = parallel_plan(phase, &options, neurons);

        if neurons == 0 {
            self.warning(format!(
                "parallel {} skipped: no postsynaptic neurons",
                phase
            ));
        } else if plan.enabled {
            let details = format!(
                "groupSize={}, activeGroups={}",
                plan.effective_group_size, plan.active_groups
            );
            self.note(format!("parallel {} enabled: {}", phase, details));
            if let Some(kind) = IrTransformKind::parallel_for(phase) {
                self.program.record_transform(kind, Some(details));
            }
        } else {
            self.note(format!(
                "parallel {} disabled; sequential evaluation with group size {}",
                phase, plan.effective_group_size
            ));
        }
        debug!(
            phase = %phase,
            enabled = plan.enabled,
            groups = plan.total_groups,
            "phase parallelism planned"
        );
        plan
    }

    // ─── Messages ──────────────────────────────────────────────────

    /// Every message appended so far, in call order.
    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Diagnostic> {
        self.messages
    }

    fn note(&mut self, message: String) {
        self.messages.push(Diagnostic::note(Stage::Semantics, message));
    }

    fn warning(&mut self, message: String) {
        warn!(stage = "semantics", "{}", message);
        self.messages
            .push(Diagnostic::warning(Stage::Semantics, message));
    }
}

// ─── Planning Rules ────────────────────────────────────────────────

/// Place fields (already sorted by name) into words.
///
/// A fitting field that would cross the word boundary starts a new word; a
/// field that exactly fills a word closes it. A field wider than the word
/// gets a word of its own, offset 0, plus a note. With packing disabled every
/// field gets its own word.
pub(crate) fn pack_fields(
    fields: &[SymbolEntry],
    enabled: bool,
    word_width: u32,
) -> (Vec<PackedFieldAssignment>, Vec<String>) {
    let mut assignments = Vec::with_capacity(fields.len());
    let mut notes = Vec::new();
    let mut word = 0u32;
    let mut offset = 0u32;
    let mut started = false;

    for entry in fields {
        let width = entry.bit_width;
        if enabled && width <= word_width {
            if offset + width > word_width {
                word += 1;
                offset = 0;
            }
            assignments.push(assignment(entry, word, offset));
            offset += width;
            if offset == word_width {
                word += 1;
                offset = 0;
            }
        } else {
            if started && (offset != 0 || !enabled) {
                word += 1;
            }
            offset = 0;
            assignments.push(assignment(entry, word, 0));
            if enabled {
                notes.push(format!(
                    "field '{}' width {}b exceeds word width {}b",
                    entry.name, width, word_width
                ));
                word += 1;
            }
        }
        started = true;
    }
    (assignments, notes)
}

fn assignment(entry: &SymbolEntry, word_index: u32, bit_offset: u32) -> PackedFieldAssignment {
    PackedFieldAssignment {
        symbol: entry.clone(),
        word_index,
        bit_offset,
        bit_width: entry.bit_width,
    }
}

/// `min(max_stages, n)` stages of `ceil(n / stages)` operations each when
/// enabled; one stage holding everything otherwise. An empty list still
/// yields one empty stage.
pub(crate) fn chunk_stages(
    operations: Vec<PipelineOperationRef>,
    enabled: bool,
    max_stages: u32,
) -> Vec<PipelineStage> {
    if operations.is_empty() {
        return vec![stage(1, Vec::new())];
    }
    let stage_count = if enabled {
        (max_stages.max(1) as usize).min(operations.len())
    } else {
        1
    };
    let chunk = operations.len().div_ceil(stage_count);
    operations
        .chunks(chunk)
        .enumerate()
        .map(|(i, ops)| stage(i + 1, ops.to_vec()))
        .collect()
}

fn stage(index: usize, operations: Vec<PipelineOperationRef>) -> PipelineStage {
    PipelineStage {
        name: format!("stage{}", index),
        operations,
    }
}

pub(crate) fn parallel_plan(
    phase: Phase,
    options: &ParallelismOptions,
    neurons: u32,
) -> PhaseParallelPlan {
    let group_size = options.group_size().max(1);
    let total_groups = neurons.div_ceil(group_size);
    let active_groups = options
        .max_active_groups()
        .map_or(total_groups, |cap| cap.min(total_groups));
    let mut notes = Vec::new();
    if neurons == 0 {
        notes.push("architecture defines no postsynaptic neurons".to_string());
    }
    PhaseParallelPlan {
        phase,
        enabled: options.enabled() && neurons > 0,
        requested_group_size: options.group_size(),
        effective_group_size: group_size,
        total_groups,
        active_groups,
        remainder: neurons % group_size,
        max_groups: options.max_active_groups(),
        notes,
    }
}
