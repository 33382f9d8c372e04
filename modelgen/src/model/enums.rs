//! Enumeration deduplication

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;
use crate::model::resolver::NameScope;
use crate::utils::naming::enum_constant_name;

/// One generated constant of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnumEntry {
    pub constant: String,
    pub value: String,
    /// Value as a quoted, escaped string literal
    pub literal: String,
}

/// A distinct set of allowed values discovered on some column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Enumeration {
    pub name: String,
    pub values: Vec<String>,
    pub entries: Vec<EnumEntry>,
}

impl Enumeration {
    pub fn new(name: &str, values: &[String]) -> Self {
        Self {
            name: name.to_string(),
            values: values.to_vec(),
            entries: Vec::new(),
        }
    }

    fn generate_entries(&mut self) -> Result<()> {
        let mut scope = NameScope::new();
        self.entries = self
            .values
            .iter()
            .map(|value| {
                let constant = scope.reserve(&enum_constant_name(&self.name, value))?;
                Ok(EnumEntry {
                    constant,
                    value: value.clone(),
                    literal: serde_json::Value::String(value.clone()).to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }
}

/// Enumerations keyed by canonical name, first seen wins
#[derive(Debug, Clone, Default)]
pub struct EnumSet {
    elements: IndexMap<String, Enumeration>,
}

impl EnumSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an enumeration; returns false and leaves the set untouched if the name exists
    ///
    /// Fails only when the constant names of the enumeration cannot be made unique.
    pub fn add(&mut self, mut enumeration: Enumeration) -> Result<bool> {
        if let Some(existing) = self.elements.get(&enumeration.name) {
            if existing.values != enumeration.values {
                tracing::debug!(
                    name = %enumeration.name,
                    "dropping enumeration with conflicting values, first definition kept"
                );
            }
            return Ok(false);
        }

        enumeration.generate_entries()?;
        self.elements
            .insert(enumeration.name.clone(), enumeration);
        Ok(true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// All enumerations in first-seen order
    pub fn elements(&self) -> impl Iterator<Item = &Enumeration> {
        self.elements.values()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_elements(self) -> Vec<Enumeration> {
        self.elements.into_values().collect()
    }
}
