use crate::api::lower_to_ir;
use crate::error::CompileError;
use crate::ir::Phase;
use crate::testing::{lif_arch, lif_neuron, lif_spike};
use crate::transaction::{Transaction, TxFieldType};

#[test]
fn test_lower_lif_pair() {
    let arch = lif_arch();
    let program = lower_to_ir(&arch, &lif_spike(), &lif_neuron(&arch)).unwrap();
    let phases: Vec<Phase> = program.phases().iter().map(|p| p.phase).collect();
    assert_eq!(
        phases,
        vec![Phase::Synaptic, Phase::Somatic, Phase::Emission, Phase::Refractory]
    );
    assert_eq!(program.architecture(), &arch);
    assert!(program.planned_transformations().is_empty());
}

#[test]
fn test_fields_keep_their_transaction() {
    let arch = lif_arch();
    let program = lower_to_ir(&arch, &lif_spike(), &lif_neuron(&arch)).unwrap();
    let symbols = program.symbols();
    let w = symbols.resolve_field("w").unwrap();
    assert_eq!(w.transaction_id.as_deref(), Some("spike"));
    let leak = symbols.resolve_field("leak").unwrap();
    assert_eq!(leak.transaction_id.as_deref(), Some("neuron"));
    assert_eq!(leak.ty, Some(TxFieldType::Static));
}

#[test]
fn test_conflicting_width_is_data_model_violation() {
    let arch = lif_arch();
    let mut spike = Transaction::spike("spike");
    spike.add_field("vm", 16, TxFieldType::Dynamic).unwrap();
    let err = lower_to_ir(&arch, &spike, &lif_neuron(&arch)).unwrap_err();
    assert!(
        matches!(&err, CompileError::DataModelViolation { name, .. } if name == "vm"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_empty_transactions_lower_to_empty_program() {
    let arch = lif_arch();
    let program =
        lower_to_ir(&arch, &Transaction::spike("s"), &Transaction::neuron("n")).unwrap();
    assert!(program.phases().is_empty(), "empty regions are not attached");
}
