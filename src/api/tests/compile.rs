use std::collections::BTreeSet;

use crate::api::{compile, CompileOptions};
use crate::error::CompileError;
use crate::ir::Phase;
use crate::naming::NamingConfig;
use crate::semantics::{
    PackingConstraints, PackingOptions, ParallelismOptions, PipelineConstraints, PipelineOptions,
    SemanticsConfig,
};
use crate::testing::{lif_arch, lif_neuron, lif_spike};

fn lif_options() -> CompileOptions {
    CompileOptions {
        semantics: SemanticsConfig {
            packing: PackingOptions::enabled(PackingConstraints::new(32, 2).unwrap()),
            pipeline: PipelineOptions::enabled(PipelineConstraints::new(2, 2).unwrap()),
            somatic_parallelism: ParallelismOptions::grouped(2).unwrap(),
            ..SemanticsConfig::default()
        },
        ..CompileOptions::default()
    }
}

#[test]
fn test_compile_lif_end_to_end() {
    let arch = lif_arch();
    let kernel = compile(&arch, &lif_spike(), &lif_neuron(&arch), &lif_options()).unwrap();

    let synaptic = kernel.program.phase(Phase::Synaptic).unwrap();
    assert!(!synaptic.body.statements.is_empty());
    let emission = kernel.program.phase(Phase::Emission).unwrap();
    assert!(!emission.body.statements.is_empty());

    assert!(kernel.packing.enabled);
    assert_eq!(kernel.packing.assignments.len(), 1);
    assert_eq!(kernel.pipeline.stages.len(), 1);
    assert_eq!(kernel.pipeline.stage_latency_cycles, 2);

    let somatic = &kernel.parallel[0];
    assert_eq!(somatic.phase, Phase::Somatic);
    assert_eq!(somatic.effective_group_size, 2);
    assert_eq!(somatic.total_groups, 2, "3 neurons in groups of 2");
    assert_eq!(somatic.remainder, 1);

    assert_eq!(kernel.layout.memory.word_count, 1);
    assert_eq!(kernel.layout.memory.port_count, 2);
    assert!(kernel.layout.synaptic_gate_by_tick);

    insta::assert_snapshot!(
        kernel.control.state_names().join(" -> "),
        @"idle -> run_synaptic -> run_somatic -> run_emission -> run_refractory -> complete"
    );
}

#[test]
fn test_compiled_names_are_unique() {
    let arch = lif_arch();
    let kernel = compile(&arch, &lif_spike(), &lif_neuron(&arch), &lif_options()).unwrap();
    let names = kernel.naming.allocated();
    let distinct: BTreeSet<&String> = names.iter().collect();
    assert_eq!(distinct.len(), names.len(), "duplicate names in {:?}", names);
    assert_eq!(kernel.naming.kernel, "neuromorphix");
}

#[test]
fn test_advisories_follow_pipeline_order() {
    let arch = lif_arch();
    let kernel = compile(&arch, &lif_spike(), &lif_neuron(&arch), &CompileOptions::default())
        .unwrap();
    let advisories = kernel.advisories();
    assert!(!advisories.is_empty());
    assert!(
        advisories.windows(2).all(|w| w[0].stage <= w[1].stage),
        "advisories out of order: {:?}",
        advisories
    );
    assert!(advisories.iter().all(|d| !d.is_error()));
    assert!(kernel.warnings().count() > 0, "disabled options produce warnings");
}

#[test]
fn test_fingerprint_is_deterministic() {
    let arch = lif_arch();
    let options = lif_options();
    let a = compile(&arch, &lif_spike(), &lif_neuron(&arch), &options).unwrap();
    let b = compile(&arch, &lif_spike(), &lif_neuron(&arch), &options).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().to_hex().len(), 64);
}

#[test]
fn test_fingerprint_tracks_options() {
    let arch = lif_arch();
    let base = compile(&arch, &lif_spike(), &lif_neuron(&arch), &lif_options()).unwrap();

    let regrouped = CompileOptions {
        somatic_group_size: Some(3),
        ..lif_options()
    };
    let other = compile(&arch, &lif_spike(), &lif_neuron(&arch), &regrouped).unwrap();
    assert_eq!(other.parallel[0].effective_group_size, 3);
    assert_ne!(base.fingerprint(), other.fingerprint());

    let plain = compile(&arch, &lif_spike(), &lif_neuron(&arch), &CompileOptions::default())
        .unwrap();
    assert_ne!(base.fingerprint(), plain.fingerprint());
}

#[test]
fn test_naming_collision_propagates() {
    let arch = lif_arch();
    let options = CompileOptions {
        naming: NamingConfig::default()
            .with_reserved(vec!["neuromorphix".to_string()])
            .unwrap(),
        ..CompileOptions::default()
    };
    let err = compile(&arch, &lif_spike(), &lif_neuron(&arch), &options).unwrap_err();
    assert!(
        matches!(err, CompileError::ConfigurationViolation { .. }),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_compile_options_document() {
    let options: CompileOptions = serde_json::from_str(
        r#"{
            "semantics": { "packing": { "enabled": true } },
            "resources": { "fifoDepth": 32 },
            "somaticGroupSize": 2
        }"#,
    )
    .unwrap();
    assert!(options.semantics.packing.enabled);
    assert_eq!(options.resources.fifo_depth(), 32);
    assert_eq!(options.somatic_group_size, Some(2));
    assert_eq!(options.naming, NamingConfig::default());

    let bad = r#"{ "resources": { "fifoDepth": 0 } }"#;
    assert!(serde_json::from_str::<CompileOptions>(bad).is_err());
}
