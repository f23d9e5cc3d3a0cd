//! Hardware resources derived alongside the core layout: tick generator,
//! spike FIFOs, weight memories, dynamic state arrays, register bank and
//! synapse selector.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, CompileError, Result};

// ─── Configuration ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tick timing and FIFO sizing for the derived resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ResourceDocument")]
pub struct ResourceConfig {
    tick_timeslot: u32,
    tick_unit: TimeUnit,
    clock_period_ns: u32,
    fifo_depth: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceDocument {
    #[serde(default = "default_timeslot")]
    tick_timeslot: u32,
    #[serde(default = "default_unit")]
    tick_unit: TimeUnit,
    #[serde(default = "default_clock_period")]
    clock_period_ns: u32,
    #[serde(default = "default_fifo_depth")]
    fifo_depth: u32,
}

impl TryFrom<ResourceDocument> for ResourceConfig {
    type Error = CompileError;

    fn try_from(doc: ResourceDocument) -> Result<Self> {
        ResourceConfig::new(
            doc.tick_timeslot,
            doc.tick_unit,
            doc.clock_period_ns,
            doc.fifo_depth,
        )
    }
}

impl ResourceConfig {
    pub fn new(
        tick_timeslot: u32,
        tick_unit: TimeUnit,
        clock_period_ns: u32,
        fifo_depth: u32,
    ) -> Result<Self> {
        Ok(Self {
            tick_timeslot: require_positive("ResourceConfig", "tick timeslot", tick_timeslot)?,
            tick_unit,
            clock_period_ns: require_positive("ResourceConfig", "clock period", clock_period_ns)?,
            fifo_depth: require_positive("ResourceConfig", "fifo depth", fifo_depth)?,
        })
    }

    pub fn tick_timeslot(&self) -> u32 {
        self.tick_timeslot
    }

    pub fn tick_unit(&self) -> TimeUnit {
        self.tick_unit
    }

    pub fn clock_period_ns(&self) -> u32 {
        self.clock_period_ns
    }

    pub fn fifo_depth(&self) -> u32 {
        self.fifo_depth
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            tick_timeslot: default_timeslot(),
            tick_unit: default_unit(),
            clock_period_ns: default_clock_period(),
            fifo_depth: default_fifo_depth(),
        }
    }
}

fn default_timeslot() -> u32 {
    1
}

fn default_unit() -> TimeUnit {
    TimeUnit::Us
}

fn default_clock_period() -> u32 {
    10
}

fn default_fifo_depth() -> u32 {
    256
}

// ─── Resource Plans ────────────────────────────────────────────────

pub const TICK_SIGNAL: &str = "tick";
pub const SPIKE_IN: &str = "spike_in";
pub const SPIKE_OUT: &str = "spike_out";
pub const SELECTOR: &str = "selector0";
pub const PACKED_MEMORY: &str = "wmem_pack";
pub const POSTSYN_COUNT_REG: &str = "postsynCount";
pub const BASE_ADDR_REG: &str = "baseAddr";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickPlan {
    pub signal: String,
    pub timeslot: u32,
    pub unit: TimeUnit,
    pub clock_period_ns: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FifoPlan {
    pub role: String,
    pub name: String,
    /// Carries a global neuron id.
    pub data_width: u32,
    pub depth: u32,
    pub credit_width: u32,
    pub tick_double_buffer: bool,
}

impl FifoPlan {
    pub(crate) fn spike(role: &str, data_width: u32, depth: u32) -> Self {
        Self {
            role: role.to_string(),
            name: role.to_string(),
            data_width,
            depth,
            credit_width: 8,
            tick_double_buffer: true,
        }
    }
}

/// Inclusive bit range of a field inside a packed word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitSlice {
    pub lsb: u32,
    pub msb: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightMemoryPlan {
    pub role: String,
    /// Physical memory name; packed fields share one.
    pub name: String,
    pub word_width: u32,
    /// One word per synapse.
    pub depth: u64,
    pub pre_index_width: u32,
    pub post_index_width: u32,
    /// Present only for a packed memory.
    pub slices: Option<BTreeMap<String, BitSlice>>,
}

impl WeightMemoryPlan {
    pub fn slice_of(&self, field: &str) -> Option<BitSlice> {
        self.slices.as_ref()?.get(field).copied()
    }

    pub fn is_packed(&self) -> bool {
        self.slices.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynParamPlan {
    pub field: String,
    pub bit_width: u32,
    /// One entry per neuron in the network.
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynArrays {
    pub main: DynParamPlan,
    pub extra: Vec<DynParamPlan>,
}

impl DynArrays {
    pub fn all(&self) -> impl Iterator<Item = &DynParamPlan> {
        std::iter::once(&self.main).chain(self.extra.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterDesc {
    pub name: String,
    pub width: u32,
    pub init: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterBank {
    pub registers: Vec<RegisterDesc>,
}

impl RegisterBank {
    pub fn get(&self, name: &str) -> Option<&RegisterDesc> {
        self.registers.iter().find(|r| r.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorPlan {
    pub name: String,
    pub address_width: u32,
    pub pre_width: u32,
    pub post_width: u32,
    pub step_by_tick: bool,
    pub linear_address: bool,
}
