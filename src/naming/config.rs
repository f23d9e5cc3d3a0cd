use serde::{Deserialize, Serialize};

use crate::binding::HardwareUnit;
use crate::error::{require_name, CompileError, Result};

/// Identifier preferences for the naming planner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NamingDocument")]
pub struct NamingConfig {
    kernel_prefix: String,
    register_prefix: String,
    dynamic_prefix: String,
    fsm_name: String,
    synaptic_unit: String,
    somatic_unit: String,
    emission_unit: String,
    refractory_unit: String,
    /// Names claimed verbatim before anything else, such as backend keywords.
    reserved: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NamingDocument {
    kernel_prefix: String,
    register_prefix: String,
    dynamic_prefix: String,
    fsm_name: String,
    synaptic_unit: String,
    somatic_unit: String,
    emission_unit: String,
    refractory_unit: String,
    reserved: Vec<String>,
}

impl Default for NamingDocument {
    fn default() -> Self {
        let d = NamingConfig::default();
        Self {
            kernel_prefix: d.kernel_prefix,
            register_prefix: d.register_prefix,
            dynamic_prefix: d.dynamic_prefix,
            fsm_name: d.fsm_name,
            synaptic_unit: d.synaptic_unit,
            somatic_unit: d.somatic_unit,
            emission_unit: d.emission_unit,
            refractory_unit: d.refractory_unit,
            reserved: d.reserved,
        }
    }
}

impl TryFrom<NamingDocument> for NamingConfig {
    type Error = CompileError;

    fn try_from(doc: NamingDocument) -> Result<Self> {
        let config = NamingConfig {
            kernel_prefix: doc.kernel_prefix,
            register_prefix: doc.register_prefix,
            dynamic_prefix: doc.dynamic_prefix,
            fsm_name: doc.fsm_name,
            synaptic_unit: doc.synaptic_unit,
            somatic_unit: doc.somatic_unit,
            emission_unit: doc.emission_unit,
            refractory_unit: doc.refractory_unit,
            reserved: doc.reserved,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            kernel_prefix: "neuromorphix".to_string(),
            register_prefix: "cfg".to_string(),
            dynamic_prefix: "dyn".to_string(),
            fsm_name: "core_fsm".to_string(),
            synaptic_unit: "syn".to_string(),
            somatic_unit: "neur".to_string(),
            emission_unit: "emit".to_string(),
            refractory_unit: "refr".to_string(),
            reserved: Vec::new(),
        }
    }
}

impl NamingConfig {
    pub fn with_kernel_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        self.kernel_prefix = prefix.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_reserved(mut self, names: Vec<String>) -> Result<Self> {
        self.reserved = names;
        self.validate()?;
        Ok(self)
    }

    pub fn kernel_prefix(&self) -> &str {
        &self.kernel_prefix
    }

    pub fn register_prefix(&self) -> &str {
        &self.register_prefix
    }

    pub fn dynamic_prefix(&self) -> &str {
        &self.dynamic_prefix
    }

    pub fn fsm_name(&self) -> &str {
        &self.fsm_name
    }

    pub fn reserved(&self) -> &[String] {
        &self.reserved
    }

    pub fn unit_instance(&self, unit: HardwareUnit) -> &str {
        match unit {
            HardwareUnit::SynapticUnit => &self.synaptic_unit,
            HardwareUnit::SomaticUnit => &self.somatic_unit,
            HardwareUnit::EmissionUnit => &self.emission_unit,
            HardwareUnit::RefractoryUnit => &self.refractory_unit,
        }
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("kernel prefix", &self.kernel_prefix),
            ("register prefix", &self.register_prefix),
            ("dynamic prefix", &self.dynamic_prefix),
            ("fsm name", &self.fsm_name),
            ("synaptic unit name", &self.synaptic_unit),
            ("somatic unit name", &self.somatic_unit),
            ("emission unit name", &self.emission_unit),
            ("refractory unit name", &self.refractory_unit),
        ];
        for (field, value) in fields {
            require_name("NamingConfig", field, value)?;
        }
        for name in &self.reserved {
            require_name("NamingConfig", "reserved name", name)?;
        }
        Ok(())
    }
}
