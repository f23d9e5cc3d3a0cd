use std::collections::BTreeSet;

use super::*;
use crate::binding::PhaseBinder;
use crate::control::ControlPlanner;
use crate::error::CompileError;
use crate::ir::IrProgram;
use crate::layout::{LayoutPlanner, ResourceConfig};
use crate::semantics::{
    PackingConstraints, PackingOptions, PipelineConstraints, PipelineOptions, SemanticAnalyzer,
    SemanticsConfig,
};
use crate::testing::{lif_arch, lif_neuron, lif_program, wide_spike};

fn name_program(mut program: IrProgram, semantics: SemanticsConfig, naming: NamingConfig) -> Result<NamingPlan> {
    let mut analyzer = SemanticAnalyzer::new(&mut program, semantics);
    let packing = analyzer.plan_synaptic_packing();
    let pipeline = analyzer.plan_synaptic_pipeline();
    let layout = LayoutPlanner::new(&program, ResourceConfig::default()).plan(&packing, &pipeline, &[]);
    let bindings = PhaseBinder::new(&program).bind(&layout);
    let control = ControlPlanner::new().plan(&layout, &bindings);
    NamingPlanner::new(naming).plan(&control, &layout, &bindings)
}

fn packed() -> SemanticsConfig {
    SemanticsConfig {
        packing: PackingOptions::enabled(PackingConstraints::default()),
        pipeline: PipelineOptions::enabled(PipelineConstraints::new(2, 1).unwrap()),
        ..SemanticsConfig::default()
    }
}

fn wide_program() -> IrProgram {
    let arch = lif_arch();
    crate::api::lower_to_ir(&arch, &wide_spike([8, 8, 6], 1), &lif_neuron(&arch)).unwrap()
}

// ─── Scope ─────────────────────────────────────────────────────────

#[test]
fn test_alloc_appends_smallest_free_suffix() {
    let mut scope = NameScope::new();
    assert_eq!(scope.alloc("w"), "w");
    assert_eq!(scope.alloc("w"), "w_1");
    assert_eq!(scope.alloc("w"), "w_2");
    assert!(scope.contains("w_1"));
    assert_eq!(scope.len(), 3);
}

#[test]
fn test_alloc_skips_taken_suffixes() {
    let mut scope = NameScope::new();
    scope.reserve_exact("tick_1").unwrap();
    assert_eq!(scope.alloc("tick"), "tick");
    assert_eq!(scope.alloc("tick"), "tick_2");
    assert_eq!(scope.allocated(), &["tick_1", "tick", "tick_2"]);
}

#[test]
fn test_reserve_exact_rejects_collision() {
    let mut scope = NameScope::new();
    scope.alloc("core_fsm");
    let err = scope.reserve_exact("core_fsm").unwrap_err();
    assert!(
        matches!(err, CompileError::ConfigurationViolation { .. }),
        "unexpected error {:?}",
        err
    );
    assert!(err.to_string().contains("'core_fsm' already used"));
}

// ─── Planner ───────────────────────────────────────────────────────

#[test]
fn test_lif_names_are_globally_unique() {
    let plan = name_program(lif_program(), packed(), NamingConfig::default()).unwrap();
    let all = plan.allocated();
    let distinct: BTreeSet<&String> = all.iter().collect();
    assert_eq!(distinct.len(), all.len(), "duplicate identifiers in {:?}", all);

    assert_eq!(plan.kernel, "neuromorphix");
    assert_eq!(plan.phases[&Phase::Synaptic], "synaptic");
    assert_eq!(plan.fsm_states["run_emission"], "run_emission");
    assert_eq!(plan.tick, "tick");
    assert_eq!(plan.selector, "selector0");
    assert_eq!(plan.register_bank, "cfg_bank");
    assert_eq!(plan.fsm, "core_fsm");
    assert_eq!(plan.registers["threshold"], "cfg_threshold");
    assert_eq!(plan.dynamic_arrays["vm"], "dyn_vm");
}

#[test]
fn test_unit_instances_and_ports() {
    let plan = name_program(lif_program(), packed(), NamingConfig::default()).unwrap();
    let syn = &plan.units[&HardwareUnit::SynapticUnit];
    assert_eq!(syn.instance, "syn");
    let ports: Vec<(&str, &str)> = syn
        .ports
        .iter()
        .map(|(role, name)| (role.as_str(), name.as_str()))
        .collect();
    assert_eq!(
        ports,
        vec![
            ("start_i", "syn_start"),
            ("gate_i", "syn_gate"),
            ("done_o", "syn_done"),
            ("busy_o", "syn_busy"),
        ]
    );
    let refr = &plan.units[&HardwareUnit::RefractoryUnit];
    assert_eq!(refr.instance, "refr");
    assert!(!refr.ports.contains_key(&PortRole::Gate));
}

#[test]
fn test_shared_memory_collapses_to_one_name() {
    let plan = name_program(wide_program(), packed(), NamingConfig::default()).unwrap();
    let names: BTreeSet<&String> = plan.weight_memories.values().collect();
    assert_eq!(names.len(), 1);
    assert_eq!(plan.weight_memories["wa"], "wmem_pack");
    assert_eq!(plan.weight_memories["wc"], "wmem_pack");
    assert_eq!(
        plan.allocated().iter().filter(|n| n.starts_with("wmem")).count(),
        1
    );
}

#[test]
fn test_individual_memories_get_own_names() {
    let plan =
        name_program(wide_program(), SemanticsConfig::default(), NamingConfig::default()).unwrap();
    let names: Vec<&str> = plan.weight_memories.values().map(|s| s.as_str()).collect();
    assert_eq!(names, vec!["wmem_wa", "wmem_wb", "wmem_wc"]);
}

#[test]
fn test_colliding_preferences_get_suffixes() {
    let config = NamingConfig::default().with_kernel_prefix("tick").unwrap();
    let plan = name_program(lif_program(), packed(), config).unwrap();
    assert_eq!(plan.kernel, "tick");
    assert_eq!(plan.tick, "tick_1", "later requests step aside");
}

#[test]
fn test_reserved_kernel_name_fails() {
    let config = NamingConfig::default()
        .with_reserved(vec!["module".to_string(), "neuromorphix".to_string()])
        .unwrap();
    let err = name_program(lif_program(), packed(), config).unwrap_err();
    assert!(err.to_string().contains("name collision"), "error: {}", err);
}

#[test]
fn test_naming_snapshot() {
    let plan = name_program(lif_program(), packed(), NamingConfig::default()).unwrap();
    insta::assert_snapshot!(plan.allocated().join(" "), @"neuromorphix synaptic somatic emission refractory idle run_synaptic run_somatic run_emission run_refractory complete tick spike_in spike_out selector0 cfg_bank syn syn_start syn_gate syn_done syn_busy neur neur_start neur_done neur_busy emit emit_start emit_done emit_busy refr refr_start refr_done refr_busy core_fsm wmem_pack dyn_vm cfg_leak cfg_reset cfg_threshold cfg_postsynCount cfg_baseAddr");
}

#[test]
fn test_naming_config_validation() {
    assert!(NamingConfig::default().with_kernel_prefix("  ").is_err());
    assert!(NamingConfig::default().with_reserved(vec![String::new()]).is_err());

    let config: NamingConfig =
        serde_json::from_str(r#"{ "kernelPrefix": "lif", "fsmName": "ctl" }"#).unwrap();
    assert_eq!(config.kernel_prefix(), "lif");
    assert_eq!(config.fsm_name(), "ctl");
    assert_eq!(config.register_prefix(), "cfg");
    assert!(serde_json::from_str::<NamingConfig>(r#"{ "dynamicPrefix": "" }"#).is_err());
}
