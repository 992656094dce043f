//! Runtime conditions
//!
//! Host condition flags (combat, unconscious, loading) and the optional
//! condition-set provider that presets reference by index.

use bitflags::bitflags;

use camrig_engine::HostGlobals;
use camrig_sdk::{
    CONDITION_BETWEEN_AREAS, CONDITION_IN_COMBAT, CONDITION_UNCONSCIOUS,
    CONDITION_WATCHING_CUTSCENE,
};

bitflags! {
    /// Conditions reported by the host for the local player
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HostConditions: u64 {
        const IN_COMBAT = CONDITION_IN_COMBAT;
        const UNCONSCIOUS = CONDITION_UNCONSCIOUS;
        /// A zone transition is in progress; camera values are transient
        const BETWEEN_AREAS = CONDITION_BETWEEN_AREAS;
        const WATCHING_CUTSCENE = CONDITION_WATCHING_CUTSCENE;
    }
}

impl HostConditions {
    /// Read the current flags from the host, ignoring unknown bits
    pub fn current(host: &HostGlobals) -> Self {
        Self::from_bits_truncate(host.condition_flags())
    }
}

/// Externally defined boolean rules referenced by preset `condition_set`
pub trait ConditionSets {
    /// Whether the provider is present right now
    fn is_available(&self) -> bool;

    /// Truth value of the set at `index`
    fn evaluate(&self, index: i32) -> bool;

    /// Display names, index order
    fn list_names(&self) -> Vec<String>;
}

/// Provider used when nothing is installed; every set is false
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConditionSets;

impl ConditionSets for NoConditionSets {
    fn is_available(&self) -> bool {
        false
    }

    fn evaluate(&self, _index: i32) -> bool {
        false
    }

    fn list_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Condition sets reached through the loader callback table
pub struct HostConditionSets<'a> {
    host: &'a HostGlobals,
}

impl<'a> HostConditionSets<'a> {
    pub fn new(host: &'a HostGlobals) -> Self {
        Self { host }
    }
}

impl ConditionSets for HostConditionSets<'_> {
    fn is_available(&self) -> bool {
        self.host.condition_sets_available()
    }

    fn evaluate(&self, index: i32) -> bool {
        self.host.evaluate_condition_set(index).unwrap_or(false)
    }

    fn list_names(&self) -> Vec<String> {
        self.host.condition_set_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_match_loader_bits() {
        let flags = HostConditions::from_bits_truncate(0b1011 | 1 << 40);
        assert!(flags.contains(HostConditions::IN_COMBAT));
        assert!(flags.contains(HostConditions::UNCONSCIOUS));
        assert!(!flags.contains(HostConditions::BETWEEN_AREAS));
        assert!(flags.contains(HostConditions::WATCHING_CUTSCENE));
        assert_eq!(flags.bits(), 0b1011);
    }

    #[test]
    fn test_no_condition_sets_fail_closed() {
        let sets = NoConditionSets;
        assert!(!sets.is_available());
        assert!(!sets.evaluate(0));
        assert!(sets.list_names().is_empty());
    }
}
