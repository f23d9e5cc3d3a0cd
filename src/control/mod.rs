//! Control planning: a linear FSM template over the bound phases.
//!
//! Guards stay symbolic here. Turning them into signal conditions and
//! encoding the states is left to the backend.

use std::fmt;

use tracing::debug;

use crate::binding::PhaseBindingPlan;
use crate::diagnostic::{Diagnostic, Stage};
use crate::ir::Phase;
use crate::layout::LayoutPlan;


pub const IDLE_STATE: &str = "idle";
pub const COMPLETE_STATE: &str = "complete";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Guard {
    /// The synaptic phase waits for its tick window.
    TickWindowComplete,
    PhaseDone,
}

impl Guard {
    pub fn as_str(self) -> &'static str {
        match self {
            Guard::TickWindowComplete => "tick_window_complete",
            Guard::PhaseDone => "phase_done",
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub name: String,
    /// The phase this state runs; `None` for idle and complete.
    pub phase: Option<Phase>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsmTransition {
    pub from: String,
    pub to: String,
    pub guard: Guard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlPlan {
    pub states: Vec<ControlState>,
    pub transitions: Vec<FsmTransition>,
    pub phase_order: Vec<Phase>,
    pub notes: Vec<Diagnostic>,
}

impl ControlPlan {
    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn state(&self, name: &str) -> Option<&ControlState> {
        self.states.iter().find(|s| s.name == name)
    }
}

pub fn run_state_name(phase: Phase) -> String {
    format!("run_{}", phase)
}

#[derive(Default)]
pub struct ControlPlanner;

impl ControlPlanner {
    pub fn new() -> Self {
        ControlPlanner
    }

    pub fn plan(&self, layout: &LayoutPlan, bindings: &PhaseBindingPlan) -> ControlPlan {
        let phase_order = bindings.phase_order();
        let mut states = vec![ControlState {
            name: IDLE_STATE.to_string(),
            phase: None,
            description: "waiting for start signal".to_string(),
        }];
        let mut transitions = Vec::with_capacity(phase_order.len() + 1);

        let mut previous = IDLE_STATE.to_string();
        for &phase in &phase_order {
            let name = run_state_name(phase);
            states.push(ControlState {
                name: name.clone(),
                phase: Some(phase),
                description: format!("execute {} operations", phase),
            });
            transitions.push(FsmTransition {
                from: previous,
                to: name.clone(),
                guard: guard_for(layout, phase),
            });
            previous = name;
        }
        states.push(ControlState {
            name: COMPLETE_STATE.to_string(),
            phase: None,
            description: "all phases processed".to_string(),
        });
        transitions.push(FsmTransition {
            from: previous,
            to: COMPLETE_STATE.to_string(),
            guard: Guard::PhaseDone,
        });

        let mut notes = Vec::new();
        if bindings.bindings.iter().any(|b| b.operations.is_empty()) {
            notes.push(Diagnostic::note(
                Stage::Control,
                "some phases only contribute control flow without operations".to_string(),
            ));
        }
        if layout.synaptic_gate_by_tick {
            notes.push(Diagnostic::note(
                Stage::Control,
                "synaptic phase is gated by tick and selector timing".to_string(),
            ));
        }
        debug!(
            states = states.len(),
            transitions = transitions.len(),
            "control plan built"
        );
        ControlPlan {
            states,
            transitions,
            phase_order,
            notes,
        }
    }
}

fn guard_for(layout: &LayoutPlan, phase: Phase) -> Guard {
    if phase == Phase::Synaptic && layout.synaptic_gate_by_tick {
        Guard::TickWindowComplete
    } else {
        Guard::PhaseDone
    }
}
