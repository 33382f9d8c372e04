//! Identifier resolution within one naming scope

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::utils::naming::{column_name, REL};

/// Upper bound on numeric suffixes tried before giving up on a name
const MAX_SUFFIX: usize = 10_000;

/// Names reserved in one scope (an entity under construction)
///
/// Collisions are case-insensitive. Reservations are permanent and kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    reserved: IndexMap<String, String>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, name: &str) -> bool {
        !self.reserved.contains_key(&name.to_lowercase())
    }

    /// Reserved names in reservation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reserved.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }

    /// Convert a raw schema identifier and reserve it
    pub fn reserve_identifier(&mut self, raw: &str) -> Result<String> {
        self.reserve(&column_name(raw))
    }

    /// Reserve `candidate`, appending 1, 2, ... until the name is free
    pub fn reserve(&mut self, candidate: &str) -> Result<String> {
        let name = self.next_free(candidate)?;
        self.insert(&name);
        Ok(name)
    }

    /// Reserve a relation name
    ///
    /// On collision the relation moves to `<candidate>Rel` (then numbered) so the
    /// column keeps its plain name.
    pub fn reserve_relation(&mut self, candidate: &str) -> Result<String> {
        let name = if self.is_available(candidate) {
            candidate.to_string()
        } else {
            self.next_free(&format!("{}{}", candidate, REL))?
        };

        if name != candidate {
            tracing::debug!(candidate, resolved = %name, "relation name collision");
        }

        self.insert(&name);
        Ok(name)
    }

    fn insert(&mut self, name: &str) {
        self.reserved.insert(name.to_lowercase(), name.to_string());
    }

    fn next_free(&self, candidate: &str) -> Result<String> {
        if self.is_available(candidate) {
            return Ok(candidate.to_string());
        }

        for suffix in 1..=MAX_SUFFIX {
            let name = format!("{}{}", candidate, suffix);
            if self.is_available(&name) {
                tracing::debug!(candidate, resolved = %name, "name collision");
                return Ok(name);
            }
        }

        Err(Error::InvariantViolation(format!(
            "no free name for '{}' after {} attempts",
            candidate, MAX_SUFFIX
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_numeric_suffixes() {
        let mut scope = NameScope::new();
        assert_eq!(scope.reserve("Name").unwrap(), "Name");
        assert_eq!(scope.reserve("Name").unwrap(), "Name1");
        assert_eq!(scope.reserve("Name").unwrap(), "Name2");
        assert_eq!(scope.len(), 3);
    }

    #[test]
    fn test_collisions_are_case_insensitive() {
        let mut scope = NameScope::new();
        scope.reserve("UserID").unwrap();
        assert!(!scope.is_available("userid"));
        assert_eq!(scope.reserve("Userid").unwrap(), "Userid1");
    }

    #[test]
    fn test_identifiers_converge_after_conversion() {
        let mut scope = NameScope::new();
        let names: Vec<String> = ["user_id", "userId", "USER_ID", "user-id"]
            .iter()
            .map(|raw| scope.reserve_identifier(raw).unwrap())
            .collect();

        assert_eq!(names, vec!["UserID", "UserID1", "UserID2", "UserID3"]);
        let distinct: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn test_relation_biased_away_from_column() {
        let mut scope = NameScope::new();
        scope.reserve("Owner").unwrap();
        assert_eq!(scope.reserve_relation("Owner").unwrap(), "OwnerRel");
        assert_eq!(scope.reserve_relation("Owner").unwrap(), "OwnerRel1");
        assert_eq!(scope.reserve_relation("Team").unwrap(), "Team");
        assert_eq!(
            scope.names().collect::<Vec<_>>(),
            vec!["Owner", "OwnerRel", "OwnerRel1", "Team"]
        );
    }

    #[test]
    fn test_deterministic_across_runs() {
        let run = || {
            let mut scope = NameScope::new();
            ["id", "name", "Name", "name_1", "name", "id"]
                .iter()
                .map(|raw| scope.reserve_identifier(raw).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
        assert_eq!(run(), vec!["ID", "Name", "Name1", "Name11", "Name2", "ID1"]);
    }
}
