//! Spiking-network architecture descriptor and the widths derived from it.
//!
//! The descriptor is immutable once constructed. Neuron counts of zero are
//! accepted; downstream planners turn them into advisory notes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_name, require_positive, CompileError, Result};

#[cfg(test)]
mod tests;

// ─── Connectivity ──────────────────────────────────────────────────

/// Connection topology between consecutive layers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Connectivity {
    FullyConnected,
    Custom(String),
}

impl Connectivity {
    pub const FULLY_CONNECTED_ID: &'static str = "fully_connected";

    /// A missing or blank id means fully connected.
    pub fn from_id(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            None | Some("") => Connectivity::FullyConnected,
            Some(Self::FULLY_CONNECTED_ID) => Connectivity::FullyConnected,
            Some(other) => Connectivity::Custom(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Connectivity::FullyConnected => Self::FULLY_CONNECTED_ID,
            Connectivity::Custom(id) => id,
        }
    }

    pub fn is_fully_connected(&self) -> bool {
        matches!(self, Connectivity::FullyConnected)
    }
}

impl From<String> for Connectivity {
    fn from(id: String) -> Self {
        Connectivity::from_id(Some(&id))
    }
}

impl From<Connectivity> for String {
    fn from(c: Connectivity) -> Self {
        c.id().to_string()
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ─── Static Parameters ─────────────────────────────────────────────

/// A static neuron parameter (threshold, reset, leak, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StaticParamDocument")]
pub struct StaticParamDescriptor {
    name: String,
    width: u32,
}

#[derive(Deserialize)]
struct StaticParamDocument {
    name: String,
    width: u32,
}

impl TryFrom<StaticParamDocument> for StaticParamDescriptor {
    type Error = CompileError;

    fn try_from(doc: StaticParamDocument) -> Result<Self> {
        StaticParamDescriptor::new(doc.name, doc.width)
    }
}

impl StaticParamDescriptor {
    pub fn new(name: impl Into<String>, width: u32) -> Result<Self> {
        let name = name.into();
        require_name("StaticParamDescriptor", "name", &name)?;
        require_positive("StaticParamDescriptor", "width", width)?;
        Ok(Self { name, width })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

// ─── Architecture ──────────────────────────────────────────────────

/// Layer structure, connectivity and static parameters of one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ArchDocument")]
pub struct ArchDescriptor {
    layer_count: u32,
    neurons_per_layer: Vec<u32>,
    connectivity: Connectivity,
    static_parameters: Vec<StaticParamDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchDocument {
    layer_count: u32,
    neurons_per_layer: Vec<u32>,
    #[serde(default)]
    connectivity: Option<String>,
    #[serde(default)]
    static_parameters: Vec<StaticParamDescriptor>,
}

impl TryFrom<ArchDocument> for ArchDescriptor {
    type Error = CompileError;

    fn try_from(doc: ArchDocument) -> Result<Self> {
        ArchDescriptor::new(
            doc.layer_count,
            doc.neurons_per_layer,
            Connectivity::from_id(doc.connectivity.as_deref()),
            doc.static_parameters,
        )
    }
}

impl ArchDescriptor {
    pub fn new(
        layer_count: u32,
        neurons_per_layer: Vec<u32>,
        connectivity: Connectivity,
        static_parameters: Vec<StaticParamDescriptor>,
    ) -> Result<Self> {
        require_positive("ArchDescriptor", "layerCount", layer_count)?;
        if neurons_per_layer.len() != layer_count as usize {
            return Err(CompileError::config(
                "ArchDescriptor",
                format!(
                    "neuron list size ({}) must match layer count ({})",
                    neurons_per_layer.len(),
                    layer_count
                ),
            ));
        }
        for (i, p) in static_parameters.iter().enumerate() {
            if static_parameters[..i].iter().any(|q| q.name == p.name) {
                return Err(CompileError::config(
                    "ArchDescriptor",
                    format!("duplicate static parameter '{}'", p.name),
                ));
            }
        }
        Ok(Self {
            layer_count,
            neurons_per_layer,
            connectivity,
            static_parameters,
        })
    }

    /// Fully connected network over the given layers.
    pub fn fully_connected(
        neurons_per_layer: Vec<u32>,
        static_parameters: Vec<StaticParamDescriptor>,
    ) -> Result<Self> {
        let layer_count = neurons_per_layer.len() as u32;
        Self::new(
            layer_count,
            neurons_per_layer,
            Connectivity::FullyConnected,
            static_parameters,
        )
    }

    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    pub fn neurons_per_layer(&self) -> &[u32] {
        &self.neurons_per_layer
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn static_parameters(&self) -> &[StaticParamDescriptor] {
        &self.static_parameters
    }

    pub fn static_parameter(&self, name: &str) -> Option<&StaticParamDescriptor> {
        self.static_parameters.iter().find(|p| p.name == name)
    }

    /// Bound of the pre-synaptic iteration: the first layer.
    pub fn pre_count(&self) -> u32 {
        self.neurons_per_layer.first().copied().unwrap_or(0)
    }

    /// Bound of the post-synaptic iteration: the second layer when fully
    /// connected, otherwise the last one.
    pub fn post_count(&self) -> u32 {
        if self.connectivity.is_fully_connected() {
            if let Some(second) = self.neurons_per_layer.get(1) {
                return *second;
            }
        }
        self.last_layer_count()
    }

    pub fn last_layer_count(&self) -> u32 {
        self.neurons_per_layer.last().copied().unwrap_or(0)
    }

    pub fn total_neuron_count(&self) -> u64 {
        self.neurons_per_layer.iter().map(|&n| n as u64).sum()
    }

    pub fn total_synapse_count(&self) -> u64 {
        if !self.connectivity.is_fully_connected() {
            return 0;
        }
        self.neurons_per_layer
            .windows(2)
            .map(|w| w[0] as u64 * w[1] as u64)
            .sum()
    }

    pub fn derive_widths(&self) -> ArchWidths {
        let total_neuron_count = self.total_neuron_count();
        let total_synapse_count = self.total_synapse_count();
        ArchWidths {
            layer_index_width: bit_width_for_count(self.layer_count as u64),
            neuron_index_widths: self
                .neurons_per_layer
                .iter()
                .map(|&n| bit_width_for_count(n as u64))
                .collect(),
            total_neuron_count,
            neuron_global_id_width: bit_width_for_count(total_neuron_count),
            synapse_address_width: bit_width_for_count(total_synapse_count),
            total_synapse_count,
        }
    }
}

// ─── Derived Widths ────────────────────────────────────────────────

/// Index and address widths derived from the layer structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchWidths {
    pub layer_index_width: u32,
    pub neuron_index_widths: Vec<u32>,
    pub total_neuron_count: u64,
    pub neuron_global_id_width: u32,
    pub synapse_address_width: u32,
    pub total_synapse_count: u64,
}

/// Bits needed to index `count` items; never less than one.
pub fn bit_width_for_count(count: u64) -> u32 {
    if count <= 1 {
        return 1;
    }
    64 - (count - 1).leading_zeros()
}
