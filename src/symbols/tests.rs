use super::*;
use crate::ast::{build_initial, AstOperation};
use crate::transaction::{ComparisonOp, EmitId, Transaction, TxFieldType};

fn field(name: &str, width: u32, ty: TxFieldType) -> TxField {
    TxField {
        name: name.to_string(),
        bit_width: width,
        ty,
    }
}

#[test]
fn test_reregistering_equal_field_is_one_symbol() {
    let mut table = SymbolTable::new();
    let vm = field("vm", 12, TxFieldType::Dynamic);
    table
        .register_transaction_fields("spike", Some(TransactionKind::Spike), &[vm.clone()])
        .unwrap();
    table
        .register_transaction_fields("neuron", Some(TransactionKind::Neuron), &[vm])
        .unwrap();
    assert_eq!(table.all_fields().count(), 1);
    assert_eq!(table.width_of("vm"), Some(12));
    assert_eq!(table.fields_for_transaction("neuron").len(), 1);
}

#[test]
fn test_conflicting_width_or_type_fails() {
    let mut table = SymbolTable::new();
    table
        .register_transaction_fields("a", None, &[field("vm", 12, TxFieldType::Dynamic)])
        .unwrap();

    let err = table
        .register_transaction_fields("b", None, &[field("vm", 16, TxFieldType::Dynamic)])
        .unwrap_err();
    assert!(
        matches!(&err, CompileError::DataModelViolation { name, .. } if name == "vm"),
        "unexpected error {:?}",
        err
    );

    let err = table
        .register_transaction_fields("b", None, &[field("vm", 12, TxFieldType::Local)])
        .unwrap_err();
    assert!(err.to_string().contains("conflicting types"), "error: {}", err);
}

#[test]
fn test_operand_conflicting_with_field_fails() {
    let mut table = SymbolTable::new();
    table
        .register_transaction_fields("n", None, &[field("threshold", 8, TxFieldType::Static)])
        .unwrap();
    let op = AstNode::Operation(AstOperation {
        origin: TransactionKind::Neuron,
        kind: OperationKind::Assignment,
        target: None,
        operands: vec![TxOperand::ExternalFieldRef {
            name: "threshold".to_string(),
            ty: TxFieldType::Static,
            bit_width: 10,
        }],
        opcode: None,
        emit_id: None,
    });
    assert!(table.register_operands("n", None, &[op]).is_err());
}

#[test]
fn test_operands_registered_from_conditions_and_emits() {
    let mut tx = Transaction::neuron("neuron");
    tx.add_field("vm", 12, TxFieldType::Dynamic).unwrap();
    tx.add_field("flag", 1, TxFieldType::Local).unwrap();
    tx.build(|b| {
        let vm = b.field("vm")?;
        let bias = b.external_field("bias", TxFieldType::Static, 4)?;
        let spike = b.emit(Some("flag"))?;
        b.if_condition(vm, ComparisonOp::Gt, bias, |b| b.assign("flag", spike))?;
        Ok(())
    })
    .unwrap();
    let ast = tx.to_ast();
    let initial = build_initial(&Transaction::spike("s").to_ast(), &ast);

    let mut table = SymbolTable::new();
    table
        .register_transaction_fields("neuron", Some(TransactionKind::Neuron), &ast.fields)
        .unwrap();
    table
        .register_operands("neuron", Some(TransactionKind::Neuron), &initial.statements)
        .unwrap();

    let bias = table.resolve_operand("bias").unwrap();
    assert_eq!(bias.origin, SymbolOrigin::External);
    assert_eq!(bias.bit_width, 4);

    let emit = table.resolve_operand("emit#1").unwrap();
    assert_eq!(emit.origin, SymbolOrigin::EmitResult);
    assert_eq!(emit.bit_width, 1, "width follows the emit target");
    assert_eq!(emit.ty, Some(TxFieldType::Local));

    let vm = table.resolve_operand("vm").unwrap();
    assert_eq!(vm.kind, SymbolKind::Operand);
    assert_eq!(table.resolve_field("vm").unwrap().kind, SymbolKind::Field);
    assert!(table.validate(&initial).is_ok());
}

#[test]
fn test_validate_names_every_unresolved_symbol() {
    let mut tx = Transaction::neuron("neuron");
    tx.add_field("vm", 12, TxFieldType::Dynamic).unwrap();
    tx.add_field("ghost", 4, TxFieldType::Local).unwrap();
    tx.build(|b| {
        let ghost = b.field("ghost")?;
        b.assign("vm", ghost)?;
        let vm = b.field("vm")?;
        let r = TxOperand::EmitReference {
            emit_id: EmitId(7),
            target: None,
        };
        b.if_condition(vm, ComparisonOp::Eq, r, |b| b.assign_const("ghost", 1))?;
        Ok(())
    })
    .unwrap();
    let initial = build_initial(&Transaction::spike("s").to_ast(), &tx.to_ast());

    let mut table = SymbolTable::new();
    table
        .register_transaction_fields("neuron", None, &[field("vm", 12, TxFieldType::Dynamic)])
        .unwrap();

    match table.validate(&initial) {
        Err(CompileError::UnresolvedReference(report)) => {
            assert_eq!(report.symbols(), vec!["ghost", "emit#7", "ghost"]);
            assert!(report.to_string().contains("3 unresolved"));
        }
        other => panic!("expected unresolved report, got {:?}", other),
    }
}

#[test]
fn test_operand_lookup_falls_back_to_fields() {
    let mut table = SymbolTable::new();
    table
        .register_transaction_fields("n", None, &[field("leak", 6, TxFieldType::Static)])
        .unwrap();
    assert!(table.resolve_operand("leak").is_some());
    assert!(table.all_operands().next().is_none());
    assert_eq!(table.fields_of_type(TxFieldType::Static).len(), 1);
}
