//! Shared fixtures: the reference two-layer leaky integrate-and-fire network.

use crate::arch::{ArchDescriptor, StaticParamDescriptor};
use crate::ir::IrProgram;
use crate::transaction::{ComparisonOp, Transaction, TxFieldType, TxOperand};

pub(crate) fn lif_arch() -> ArchDescriptor {
    arch_with_layers(vec![4, 3])
}

pub(crate) fn arch_with_layers(layers: Vec<u32>) -> ArchDescriptor {
    ArchDescriptor::fully_connected(
        layers,
        vec![
            StaticParamDescriptor::new("threshold", 8).unwrap(),
            StaticParamDescriptor::new("reset", 8).unwrap(),
            StaticParamDescriptor::new("leak", 6).unwrap(),
        ],
    )
    .unwrap()
}

/// `vm = vm + w`
pub(crate) fn lif_spike() -> Transaction {
    let mut tx = Transaction::spike("spike");
    tx.add_field("w", 8, TxFieldType::SynapticParam).unwrap();
    tx.add_field("vm", 12, TxFieldType::Dynamic).unwrap();
    tx.build(|b| {
        let vm = b.field("vm")?;
        let w = b.field("w")?;
        b.add("vm", vm, w)
    })
    .unwrap();
    tx
}

/// `vm = vm - leak; if vm >= threshold { emit; vm = reset }`
pub(crate) fn lif_neuron(arch: &ArchDescriptor) -> Transaction {
    let mut tx = Transaction::neuron("neuron");
    tx.add_field("vm", 12, TxFieldType::Dynamic).unwrap();
    for p in ["threshold", "reset", "leak"] {
        tx.add_static_field_from_arch(arch, p, None).unwrap();
    }
    tx.build(|b| {
        let vm = b.field("vm")?;
        let leak = b.field("leak")?;
        b.sub("vm", vm, leak)?;
        let vm = b.field("vm")?;
        let threshold = b.field("threshold")?;
        b.if_condition(vm, ComparisonOp::Gte, threshold, |b| {
            b.emit(None)?;
            let reset = b.field("reset")?;
            b.assign("vm", reset)
        })?;
        Ok(())
    })
    .unwrap();
    tx
}

pub(crate) fn lif_program() -> IrProgram {
    let arch = lif_arch();
    let neuron = lif_neuron(&arch);
    crate::api::lower_to_ir(&arch, &lif_spike(), &neuron).unwrap()
}

/// A spike transaction with three synaptic parameters and `ops` updates.
pub(crate) fn wide_spike(widths: [u32; 3], ops: usize) -> Transaction {
    let mut tx = Transaction::spike("spike");
    for (name, width) in ["wa", "wb", "wc"].into_iter().zip(widths) {
        tx.add_field(name, width, TxFieldType::SynapticParam).unwrap();
    }
    tx.add_field("vm", 12, TxFieldType::Dynamic).unwrap();
    tx.build(|b| {
        for i in 0..ops {
            let vm = b.field("vm")?;
            b.add("vm", vm, TxOperand::Constant(i as i64))?;
        }
        Ok(())
    })
    .unwrap();
    tx
}
