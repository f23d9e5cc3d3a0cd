//! Semantic analysis configuration records.
//!
//! Every record validates in `new` and deserializes through the same check.

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, CompileError, Result};

// ─── Packing ───────────────────────────────────────────────────────

/// Word geometry of the synaptic weight memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PackingConstraintsDocument")]
pub struct PackingConstraints {
    word_width: u32,
    memory_ports: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackingConstraintsDocument {
    #[serde(default = "default_word_width")]
    word_width: u32,
    #[serde(default = "one")]
    memory_ports: u32,
}

impl TryFrom<PackingConstraintsDocument> for PackingConstraints {
    type Error = CompileError;

    fn try_from(doc: PackingConstraintsDocument) -> Result<Self> {
        PackingConstraints::new(doc.word_width, doc.memory_ports)
    }
}

impl PackingConstraints {
    pub fn new(word_width: u32, memory_ports: u32) -> Result<Self> {
        Ok(Self {
            word_width: require_positive("PackingConstraints", "word width", word_width)?,
            memory_ports: require_positive("PackingConstraints", "memory port count", memory_ports)?,
        })
    }

    pub fn word_width(&self) -> u32 {
        self.word_width
    }

    pub fn memory_ports(&self) -> u32 {
        self.memory_ports
    }
}

impl Default for PackingConstraints {
    fn default() -> Self {
        Self {
            word_width: default_word_width(),
            memory_ports: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingOptions {
    pub enabled: bool,
    pub constraints: PackingConstraints,
}

impl PackingOptions {
    pub fn enabled(constraints: PackingConstraints) -> Self {
        Self {
            enabled: true,
            constraints,
        }
    }
}

// ─── Pipelining ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PipelineConstraintsDocument")]
pub struct PipelineConstraints {
    max_stages: u32,
    operation_latency_cycles: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineConstraintsDocument {
    #[serde(default = "one")]
    max_stages: u32,
    #[serde(default = "one")]
    operation_latency_cycles: u32,
}

impl TryFrom<PipelineConstraintsDocument> for PipelineConstraints {
    type Error = CompileError;

    fn try_from(doc: PipelineConstraintsDocument) -> Result<Self> {
        PipelineConstraints::new(doc.max_stages, doc.operation_latency_cycles)
    }
}

impl PipelineConstraints {
    pub fn new(max_stages: u32, operation_latency_cycles: u32) -> Result<Self> {
        Ok(Self {
            max_stages: require_positive("PipelineConstraints", "max stage count", max_stages)?,
            operation_latency_cycles: require_positive(
                "PipelineConstraints",
                "operation latency",
                operation_latency_cycles,
            )?,
        })
    }

    pub fn max_stages(&self) -> u32 {
        self.max_stages
    }

    pub fn operation_latency_cycles(&self) -> u32 {
        self.operation_latency_cycles
    }
}

impl Default for PipelineConstraints {
    fn default() -> Self {
        Self {
            max_stages: 1,
            operation_latency_cycles: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub enabled: bool,
    pub constraints: PipelineConstraints,
}

impl PipelineOptions {
    pub fn enabled(constraints: PipelineConstraints) -> Self {
        Self {
            enabled: true,
            constraints,
        }
    }
}

// ─── Parallelism ───────────────────────────────────────────────────

/// Neuron grouping for one neuron phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ParallelismDocument")]
pub struct ParallelismOptions {
    enabled: bool,
    group_size: u32,
    max_active_groups: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParallelismDocument {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "one")]
    group_size: u32,
    #[serde(default)]
    max_active_groups: Option<u32>,
}

impl TryFrom<ParallelismDocument> for ParallelismOptions {
    type Error = CompileError;

    fn try_from(doc: ParallelismDocument) -> Result<Self> {
        ParallelismOptions::new(doc.enabled, doc.group_size, doc.max_active_groups)
    }
}

impl ParallelismOptions {
    pub fn new(enabled: bool, group_size: u32, max_active_groups: Option<u32>) -> Result<Self> {
        require_positive("ParallelismOptions", "group size", group_size)?;
        if let Some(cap) = max_active_groups {
            require_positive("ParallelismOptions", "max active group count", cap)?;
        }
        Ok(Self {
            enabled,
            group_size,
            max_active_groups,
        })
    }

    pub fn grouped(group_size: u32) -> Result<Self> {
        Self::new(true, group_size, None)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn group_size(&self) -> u32 {
        self.group_size
    }

    pub fn max_active_groups(&self) -> Option<u32> {
        self.max_active_groups
    }

    /// Copy with the group size replaced by `override_size` when it is
    /// present and positive.
    pub fn with_group_size_override(&self, override_size: Option<u32>) -> Self {
        Self {
            group_size: override_size
                .filter(|&size| size > 0)
                .unwrap_or(self.group_size),
            ..*self
        }
    }
}

impl Default for ParallelismOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            group_size: 1,
            max_active_groups: None,
        }
    }
}

// ─── Aggregate ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticsConfig {
    pub packing: PackingOptions,
    pub pipeline: PipelineOptions,
    pub somatic_parallelism: ParallelismOptions,
    pub emission_parallelism: ParallelismOptions,
    pub refractory_parallelism: ParallelismOptions,
}

fn default_word_width() -> u32 {
    32
}

fn one() -> u32 {
    1
}
