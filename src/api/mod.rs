//! Public entry points: lower two transactions to IR, or run the whole
//! middle end and collect every plan in a [`CompiledKernel`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arch::ArchDescriptor;
use crate::ast::{attach_phase_regions, build_initial, expand_all};
use crate::binding::{PhaseBinder, PhaseBindingPlan};
use crate::control::{ControlPlan, ControlPlanner};
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::hash::{ContentHash, PlanHasher};
use crate::ir::{IrBuilder, IrProgram};
use crate::layout::{LayoutPlan, LayoutPlanner, ResourceConfig};
use crate::naming::{NamingConfig, NamingPlan, NamingPlanner};
use crate::semantics::{
    PhaseParallelPlan, SemanticAnalyzer, SemanticsConfig, SynapticPackingPlan,
    SynapticPipelinePlan,
};
use crate::symbols::SymbolTable;
use crate::transaction::{Transaction, TransactionKind};

#[cfg(test)]
mod tests;

// ─── Options ───────────────────────────────────────────────────────

/// Everything `compile` can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub semantics: SemanticsConfig,
    pub resources: ResourceConfig,
    pub naming: NamingConfig,
    /// Per-phase group size overrides; non-positive values fall back to the
    /// phase's configured size.
    pub somatic_group_size: Option<u32>,
    pub emission_group_size: Option<u32>,
    pub refractory_group_size: Option<u32>,
}

// ─── Compiled Kernel ───────────────────────────────────────────────

/// Every plan the middle end produced, in pipeline order.
#[derive(Clone, Debug)]
pub struct CompiledKernel {
    pub program: IrProgram,
    pub packing: SynapticPackingPlan,
    pub pipeline: SynapticPipelinePlan,
    /// Somatic, emission, refractory.
    pub parallel: Vec<PhaseParallelPlan>,
    pub layout: LayoutPlan,
    pub bindings: PhaseBindingPlan,
    pub control: ControlPlan,
    pub naming: NamingPlan,
    advisories: Vec<Diagnostic>,
}

impl CompiledKernel {
    /// Semantic messages, then layout, binding and control notes.
    pub fn advisories(&self) -> &[Diagnostic] {
        &self.advisories
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.advisories.iter().filter(|d| d.is_warning())
    }

    /// Content hash over every plan. Advisory text is not included.
    pub fn fingerprint(&self) -> ContentHash {
        let mut hasher = PlanHasher::new();
        hasher.write_program(&self.program);
        hasher.write_packing(&self.packing);
        hasher.write_pipeline(&self.pipeline);
        for plan in &self.parallel {
            hasher.write_parallel(plan);
        }
        hasher.write_layout(&self.layout);
        hasher.write_bindings(&self.bindings);
        hasher.write_control(&self.control);
        hasher.write_naming(&self.naming);
        hasher.finish()
    }
}

// ─── Entry Points ──────────────────────────────────────────────────

/// Build the phased, loop-expanded IR for a spike/neuron transaction pair.
pub fn lower_to_ir(
    arch: &ArchDescriptor,
    spike: &Transaction,
    neuron: &Transaction,
) -> Result<IrProgram> {
    let spike_ast = spike.to_ast();
    let neuron_ast = neuron.to_ast();

    let initial = build_initial(&spike_ast, &neuron_ast);
    let phased = attach_phase_regions(&initial);
    let expanded = expand_all(&phased, arch);

    let mut symbols = SymbolTable::new();
    symbols.register_transaction_fields(&spike_ast.name, Some(spike_ast.kind), &spike_ast.fields)?;
    symbols.register_transaction_fields(
        &neuron_ast.name,
        Some(neuron_ast.kind),
        &neuron_ast.fields,
    )?;
    for (tx, kind) in [
        (&spike_ast.name, TransactionKind::Spike),
        (&neuron_ast.name, TransactionKind::Neuron),
    ] {
        let nodes: Vec<_> = initial
            .statements
            .iter()
            .filter(|node| node.origin() == kind)
            .cloned()
            .collect();
        symbols.register_operands(tx, Some(kind), &nodes)?;
    }
    symbols.validate(&expanded)?;

    debug!(spike = %spike_ast.name, neuron = %neuron_ast.name, "transactions lowered");
    IrBuilder::from_ast(&expanded, symbols, arch.clone())
}

/// Run the whole middle end.
pub fn compile(
    arch: &ArchDescriptor,
    spike: &Transaction,
    neuron: &Transaction,
    options: &CompileOptions,
) -> Result<CompiledKernel> {
    let mut program = lower_to_ir(arch, spike, neuron)?;

    let mut analyzer = SemanticAnalyzer::new(&mut program, options.semantics);
    let packing = analyzer.plan_synaptic_packing();
    let pipeline = analyzer.plan_synaptic_pipeline();
    let parallel = vec![
        analyzer.plan_somatic_parallelism(options.somatic_group_size),
        analyzer.plan_emission_parallelism(options.emission_group_size),
        analyzer.plan_refractory_parallelism(options.refractory_group_size),
    ];
    let mut advisories = analyzer.into_messages();

    let layout = LayoutPlanner::new(&program, options.resources).plan(&packing, &pipeline, &parallel);
    let bindings = PhaseBinder::new(&program).bind(&layout);
    let control = ControlPlanner::new().plan(&layout, &bindings);
    let naming = NamingPlanner::new(options.naming.clone()).plan(&control, &layout, &bindings)?;

    advisories.extend(layout.notes.iter().cloned());
    advisories.extend(bindings.notes.iter().cloned());
    advisories.extend(control.notes.iter().cloned());

    let kernel = CompiledKernel {
        program,
        packing,
        pipeline,
        parallel,
        layout,
        bindings,
        control,
        naming,
        advisories,
    };
    info!(
        phases = kernel.program.phases().len(),
        states = kernel.control.states.len(),
        names = kernel.naming.allocated().len(),
        advisories = kernel.advisories.len(),
        fingerprint = %kernel.fingerprint().to_short(),
        "kernel compiled"
    );
    Ok(kernel)
}
