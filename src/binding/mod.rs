//! Phase binding: every IR operation is assigned to the hardware unit of
//! its phase.

use std::fmt;

use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, Stage};
use crate::ir::{IrProgram, Phase};
use crate::layout::LayoutPlan;
use crate::transaction::OpCode;

#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HardwareUnit {
    SynapticUnit,
    SomaticUnit,
    EmissionUnit,
    RefractoryUnit,
}

impl HardwareUnit {
    pub fn for_phase(phase: Phase) -> HardwareUnit {
        match phase {
            Phase::Synaptic => HardwareUnit::SynapticUnit,
            Phase::Somatic => HardwareUnit::SomaticUnit,
            Phase::Emission => HardwareUnit::EmissionUnit,
            Phase::Refractory => HardwareUnit::RefractoryUnit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HardwareUnit::SynapticUnit => "SYNAPTIC_UNIT",
            HardwareUnit::SomaticUnit => "SOMATIC_UNIT",
            HardwareUnit::EmissionUnit => "EMISSION_UNIT",
            HardwareUnit::RefractoryUnit => "REFRACTORY_UNIT",
        }
    }
}

impl fmt::Display for HardwareUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundOperation {
    /// Target symbol, or `emit#N` for an emit without target.
    pub target: String,
    pub opcode: Option<OpCode>,
    pub unit: HardwareUnit,
    /// Enclosing iterators, outermost first.
    pub loop_context: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseBinding {
    pub phase: Phase,
    pub unit: HardwareUnit,
    pub operations: Vec<BoundOperation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseBindingPlan {
    /// One entry per IR phase block, in IR order.
    pub bindings: Vec<PhaseBinding>,
    pub notes: Vec<Diagnostic>,
}

impl PhaseBindingPlan {
    pub fn phase_order(&self) -> Vec<Phase> {
        self.bindings.iter().map(|b| b.phase).collect()
    }

    pub fn operations(&self, phase: Phase) -> &[BoundOperation] {
        self.bindings
            .iter()
            .find(|b| b.phase == phase)
            .map(|b| b.operations.as_slice())
            .unwrap_or(&[])
    }

    pub fn units(&self) -> Vec<HardwareUnit> {
        self.bindings.iter().map(|b| b.unit).collect()
    }
}

pub struct PhaseBinder<'a> {
    program: &'a IrProgram,
}

impl<'a> PhaseBinder<'a> {
    pub fn new(program: &'a IrProgram) -> Self {
        Self { program }
    }

    pub fn bind(&self, layout: &LayoutPlan) -> PhaseBindingPlan {
        let mut notes = Vec::new();
        let bindings: Vec<PhaseBinding> = self
            .program
            .phases()
            .iter()
            .map(|block| {
                let unit = HardwareUnit::for_phase(block.phase);
                let operations: Vec<BoundOperation> = block
                    .body
                    .operations()
                    .into_iter()
                    .map(|op| BoundOperation {
                        target: op.target,
                        opcode: op.opcode,
                        unit,
                        loop_context: op.loop_context,
                    })
                    .collect();
                if operations.is_empty() {
                    let msg = format!("phase {} contains no executable operations", block.phase);
                    warn!(stage = "binding", "{}", msg);
                    notes.push(Diagnostic::warning(Stage::Binding, msg));
                }
                PhaseBinding {
                    phase: block.phase,
                    unit,
                    operations,
                }
            })
            .collect();

        if !layout.pipeline.enabled {
            notes.push(Diagnostic::note(
                Stage::Binding,
                "pipeline disabled; bindings remain one-to-one with IR order".to_string(),
            ));
        }
        debug!(
            phases = bindings.len(),
            operations = bindings.iter().map(|b| b.operations.len()).sum::<usize>(),
            "phases bound"
        );
        PhaseBindingPlan { bindings, notes }
    }
}
