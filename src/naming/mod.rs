//! Naming: every generated identifier comes from one [`NameScope`].
//!
//! Weight memories that share a physical memory are resolved to one
//! canonical name first, so they collapse onto a single identifier instead
//! of receiving numbered copies.

use std::collections::BTreeMap;

use tracing::debug;

use crate::binding::{HardwareUnit, PhaseBindingPlan};
use crate::control::ControlPlan;
use crate::error::Result;
use crate::ir::Phase;
use crate::layout::LayoutPlan;

mod config;
mod scope;
#[cfg(test)]
mod tests;

pub use config::NamingConfig;
pub use scope::NameScope;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortRole {
    Start,
    Gate,
    Done,
    Busy,
}

impl PortRole {
    /// Port name on the unit's interface.
    pub fn as_str(self) -> &'static str {
        match self {
            PortRole::Start => "start_i",
            PortRole::Gate => "gate_i",
            PortRole::Done => "done_o",
            PortRole::Busy => "busy_o",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            PortRole::Start => "start",
            PortRole::Gate => "gate",
            PortRole::Done => "done",
            PortRole::Busy => "busy",
        }
    }

    /// Only the synaptic unit has a tick gate input.
    fn for_unit(unit: HardwareUnit) -> &'static [PortRole] {
        match unit {
            HardwareUnit::SynapticUnit => &[
                PortRole::Start,
                PortRole::Gate,
                PortRole::Done,
                PortRole::Busy,
            ],
            _ => &[PortRole::Start, PortRole::Done, PortRole::Busy],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitNames {
    pub instance: String,
    /// Signal name per interface port.
    pub ports: BTreeMap<PortRole, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingPlan {
    pub kernel: String,
    pub phases: BTreeMap<Phase, String>,
    /// FSM state name to identifier.
    pub fsm_states: BTreeMap<String, String>,
    pub tick: String,
    pub spike_in: String,
    pub spike_out: String,
    pub selector: String,
    pub register_bank: String,
    pub fsm: String,
    pub units: BTreeMap<HardwareUnit, UnitNames>,
    /// Synaptic field to weight memory instance.
    pub weight_memories: BTreeMap<String, String>,
    /// Dynamic field to state array instance.
    pub dynamic_arrays: BTreeMap<String, String>,
    /// Register key to register identifier.
    pub registers: BTreeMap<String, String>,
    allocated: Vec<String>,
}

impl NamingPlan {
    /// Every distinct identifier, in allocation order.
    pub fn allocated(&self) -> &[String] {
        &self.allocated
    }
}

pub struct NamingPlanner {
    config: NamingConfig,
}

impl NamingPlanner {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    /// Fails only when a verbatim reservation collides.
    pub fn plan(
        &self,
        control: &ControlPlan,
        layout: &LayoutPlan,
        bindings: &PhaseBindingPlan,
    ) -> Result<NamingPlan> {
        let cfg = &self.config;
        let mut scope = NameScope::new();
        for name in cfg.reserved() {
            scope.reserve_exact(name)?;
        }
        let kernel = scope.reserve_exact(cfg.kernel_prefix())?;

        let phases = control
            .phase_order
            .iter()
            .map(|&phase| (phase, scope.alloc(phase.as_str())))
            .collect();
        let fsm_states = control
            .states
            .iter()
            .map(|state| (state.name.clone(), scope.alloc(&state.name.to_lowercase())))
            .collect();

        let tick = scope.alloc(&layout.tick.signal);
        let spike_in = scope.alloc(&layout.spike_in.name);
        let spike_out = scope.alloc(&layout.spike_out.name);
        let selector = scope.alloc(&layout.selector.name);
        let register_bank = scope.alloc(&format!("{}_bank", cfg.register_prefix()));

        let mut units = BTreeMap::new();
        for unit in bindings.units() {
            let instance = scope.alloc(cfg.unit_instance(unit));
            let ports = PortRole::for_unit(unit)
                .iter()
                .map(|&role| (role, scope.alloc(&format!("{}_{}", instance, role.suffix()))))
                .collect();
            units.insert(unit, UnitNames { instance, ports });
        }
        let fsm = scope.alloc(cfg.fsm_name());

        let mut physical: BTreeMap<&str, String> = BTreeMap::new();
        let mut weight_memories = BTreeMap::new();
        for (field, mem) in &layout.weight_memories {
            let name = match physical.get(mem.name.as_str()) {
                Some(existing) => existing.clone(),
                None => {
                    let allocated = scope.alloc(&mem.name);
                    physical.insert(mem.name.as_str(), allocated.clone());
                    allocated
                }
            };
            weight_memories.insert(field.clone(), name);
        }

        let dynamic_arrays = layout
            .dynamic
            .iter()
            .flat_map(|arrays| arrays.all())
            .map(|d| {
                let name = scope.alloc(&format!("{}_{}", cfg.dynamic_prefix(), d.field));
                (d.field.clone(), name)
            })
            .collect();

        let registers = layout
            .registers
            .registers
            .iter()
            .map(|r| {
                let name = scope.alloc(&format!("{}_{}", cfg.register_prefix(), r.name));
                (r.name.clone(), name)
            })
            .collect();

        debug!(identifiers = scope.len(), kernel = %kernel, "names planned");
        Ok(NamingPlan {
            kernel,
            phases,
            fsm_states,
            tick,
            spike_in,
            spike_out,
            selector,
            register_bank,
            fsm,
            units,
            weight_memories,
            dynamic_arrays,
            registers,
            allocated: scope.allocated().to_vec(),
        })
    }
}
