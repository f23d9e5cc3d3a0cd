use std::collections::BTreeSet;

use crate::error::{CompileError, Result};

/// One flat identifier namespace.
#[derive(Clone, Debug, Default)]
pub struct NameScope {
    used: BTreeSet<String>,
    order: Vec<String>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base` if unused, otherwise `base_N` for the smallest free `N >= 1`.
    pub fn alloc(&mut self, base: &str) -> String {
        if !self.used.contains(base) {
            return self.insert(base.to_string());
        }
        let mut i = 1u32;
        loop {
            let candidate = format!("{}_{}", base, i);
            if !self.used.contains(&candidate) {
                return self.insert(candidate);
            }
            i += 1;
        }
    }

    /// Take `name` verbatim; a name already in use is an error.
    pub fn reserve_exact(&mut self, name: &str) -> Result<String> {
        if self.used.contains(name) {
            return Err(CompileError::config(
                "NameScope",
                format!("name collision: '{}' already used", name),
            ));
        }
        Ok(self.insert(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Every identifier handed out, in allocation order.
    pub fn allocated(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, name: String) -> String {
        self.used.insert(name.clone());
        self.order.push(name.clone());
        name
    }
}
