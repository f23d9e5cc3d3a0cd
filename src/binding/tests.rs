use super::*;
use crate::ir::{IrBlock, IrPhaseBlock};
use crate::layout::{LayoutPlanner, ResourceConfig};
use crate::semantics::{PipelineConstraints, PipelineOptions, SemanticAnalyzer, SemanticsConfig};
use crate::symbols::SymbolTable;
use crate::testing::{lif_arch, lif_program};

fn layout_for(program: &mut IrProgram, config: SemanticsConfig) -> LayoutPlan {
    let mut analyzer = SemanticAnalyzer::new(program, config);
    let packing = analyzer.plan_synaptic_packing();
    let pipeline = analyzer.plan_synaptic_pipeline();
    let parallel = vec![analyzer.plan_somatic_parallelism(None)];
    LayoutPlanner::new(program, ResourceConfig::default()).plan(&packing, &pipeline, &parallel)
}

fn pipelined() -> SemanticsConfig {
    SemanticsConfig {
        pipeline: PipelineOptions::enabled(PipelineConstraints::new(2, 1).unwrap()),
        ..SemanticsConfig::default()
    }
}

#[test]
fn test_unit_is_a_function_of_phase() {
    let mut program = lif_program();
    let layout = layout_for(&mut program, pipelined());
    let plan = PhaseBinder::new(&program).bind(&layout);

    assert_eq!(
        plan.units(),
        vec![
            HardwareUnit::SynapticUnit,
            HardwareUnit::SomaticUnit,
            HardwareUnit::EmissionUnit,
            HardwareUnit::RefractoryUnit,
        ]
    );
    for binding in &plan.bindings {
        assert!(
            binding.operations.iter().all(|op| op.unit == binding.unit),
            "mixed units in {} phase",
            binding.phase
        );
    }
    assert!(plan.notes.is_empty(), "unexpected notes: {:?}", plan.notes);
}

#[test]
fn test_bound_operations_carry_context() {
    let mut program = lif_program();
    let layout = layout_for(&mut program, pipelined());
    let plan = PhaseBinder::new(&program).bind(&layout);

    let synaptic = plan.operations(Phase::Synaptic);
    assert_eq!(synaptic.len(), 1);
    assert_eq!(synaptic[0].target, "vm");
    assert_eq!(synaptic[0].opcode, Some(OpCode::Add));
    assert_eq!(synaptic[0].loop_context, vec!["preNeuron", "postNeuron"]);

    let somatic = plan.operations(Phase::Somatic);
    assert_eq!(somatic[0].opcode, Some(OpCode::Sub));

    let emission = plan.operations(Phase::Emission);
    assert_eq!(emission[0].target, "emit#1");
    assert_eq!(emission[0].opcode, None);
    assert_eq!(emission[0].unit, HardwareUnit::EmissionUnit);
}

#[test]
fn test_disabled_pipeline_is_noted() {
    let mut program = lif_program();
    let layout = layout_for(&mut program, SemanticsConfig::default());
    let plan = PhaseBinder::new(&program).bind(&layout);
    assert_eq!(plan.notes.len(), 1);
    assert!(plan.notes[0].message.contains("one-to-one"));
    assert!(!plan.notes[0].is_warning());
}

#[test]
fn test_empty_phase_is_advisory() {
    let mut program = IrProgram::new(
        vec![IrPhaseBlock {
            phase: Phase::Refractory,
            body: IrBlock::default(),
        }],
        lif_arch(),
        SymbolTable::new(),
    );
    let layout = layout_for(&mut program, pipelined());
    let plan = PhaseBinder::new(&program).bind(&layout);

    assert_eq!(plan.phase_order(), vec![Phase::Refractory]);
    assert!(plan.operations(Phase::Refractory).is_empty());
    assert!(plan.operations(Phase::Synaptic).is_empty(), "absent phase has no operations");
    assert!(plan.notes.iter().any(|n| n.is_warning()
        && n.message == "phase refractory contains no executable operations"));
}
