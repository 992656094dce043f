//! Active preset resolution
//!
//! Precedence, highest first: the pinned override, the first preset in list
//! order whose condition set is true, then the Default snapshot. The resolver
//! only records which preset is active; values are applied by the caller when
//! a [`Transition`] is returned.

use std::sync::Arc;

use super::{Preset, PresetStore};
use crate::conditions::ConditionSets;

/// Which tier currently supplies the active preset
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    Default,
    AutoMatch(Arc<Preset>),
    Override(Arc<Preset>),
}

/// Session bootstrap phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bootstrap {
    /// No session (logged out, or attached before login)
    #[default]
    Idle,
    /// Logged in, waiting for the camera to leave any zone transition
    AwaitingStable,
    /// Default captured; automatic switching enabled
    Ready,
}

/// A change of the active preset
#[derive(Debug, Clone)]
pub struct Transition {
    pub deactivated: Option<Arc<Preset>>,
    pub activated: Arc<Preset>,
    /// First activation of a session
    pub logging_in: bool,
}

#[derive(Debug, Default)]
pub struct PresetResolver {
    pinned: Option<Arc<Preset>>,
    auto_match: Option<Arc<Preset>>,
    active: Option<Arc<Preset>>,
    bootstrap: Bootstrap,
}

fn same(a: Option<&Arc<Preset>>, b: Option<&Arc<Preset>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// First conditioned preset whose set evaluates true; none when the provider is missing
fn find_auto_match(store: &PresetStore, sets: &dyn ConditionSets) -> Option<Arc<Preset>> {
    if !sets.is_available() {
        return None;
    }

    store
        .presets()
        .iter()
        .find(|p| p.is_conditioned() && sets.evaluate(p.condition_set))
        .cloned()
}

impl PresetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset currently governing the camera
    pub fn active(&self) -> Option<&Arc<Preset>> {
        self.active.as_ref()
    }

    pub fn override_preset(&self) -> Option<&Arc<Preset>> {
        self.pinned.as_ref()
    }

    pub fn bootstrap(&self) -> Bootstrap {
        self.bootstrap
    }

    pub fn state(&self) -> ResolverState {
        if let Some(preset) = &self.pinned {
            ResolverState::Override(Arc::clone(preset))
        } else if let Some(preset) = &self.auto_match {
            ResolverState::AutoMatch(Arc::clone(preset))
        } else {
            ResolverState::Default
        }
    }

    /// Session started: clear the override and wait for a stable camera
    pub fn begin_session(&mut self) {
        self.pinned = None;
        self.auto_match = None;
        self.active = None;
        self.bootstrap = Bootstrap::AwaitingStable;
        tracing::debug!("Preset resolver awaiting stable camera");
    }

    /// Session ended; nothing is active until the next session resolves
    pub fn end_session(&mut self) {
        self.pinned = None;
        self.auto_match = None;
        self.active = None;
        self.bootstrap = Bootstrap::Idle;
    }

    /// Pin a preset, or clear the pin with `None`
    ///
    /// Before the session is ready the pin is only recorded; it takes effect
    /// on the bootstrap tick.
    pub fn set_override(
        &mut self,
        preset: Option<Arc<Preset>>,
        store: &PresetStore,
        sets: &dyn ConditionSets,
    ) -> Option<Transition> {
        self.pinned = preset;

        if self.bootstrap != Bootstrap::Ready {
            return None;
        }

        self.auto_match = find_auto_match(store, sets);
        self.resolve(store, false)
    }

    /// Per-frame re-evaluation
    ///
    /// `between_areas` marks a zone transition; nothing happens during one.
    /// `snapshot` reads the live camera and is called once per session.
    pub fn tick(
        &mut self,
        store: &mut PresetStore,
        sets: &dyn ConditionSets,
        between_areas: bool,
        snapshot: impl FnOnce() -> Preset,
    ) -> Option<Transition> {
        if between_areas {
            return None;
        }

        match self.bootstrap {
            Bootstrap::Idle => None,
            Bootstrap::AwaitingStable => {
                store.capture_default(snapshot);
                self.bootstrap = Bootstrap::Ready;
                self.auto_match = find_auto_match(store, sets);

                let activated = self.candidate(store)?;
                let deactivated = self.active.replace(Arc::clone(&activated));
                tracing::info!("Session ready, active preset '{}'", activated.name);

                Some(Transition {
                    deactivated,
                    activated,
                    logging_in: true,
                })
            }
            Bootstrap::Ready => {
                let candidate = find_auto_match(store, sets);
                if same(candidate.as_ref(), self.auto_match.as_ref()) {
                    return None;
                }

                self.auto_match = candidate;
                self.resolve(store, false)
            }
        }
    }

    fn candidate(&self, store: &PresetStore) -> Option<Arc<Preset>> {
        self.pinned
            .clone()
            .or_else(|| self.auto_match.clone())
            .or_else(|| store.default_preset().cloned())
    }

    fn resolve(&mut self, store: &PresetStore, logging_in: bool) -> Option<Transition> {
        let next = self.candidate(store);
        if same(next.as_ref(), self.active.as_ref()) {
            return None;
        }

        let activated = next?;
        let deactivated = self.active.replace(Arc::clone(&activated));
        tracing::debug!(
            "Preset '{}' -> '{}'",
            deactivated.as_deref().map(|p| p.name.as_str()).unwrap_or("<none>"),
            activated.name
        );

        Some(Transition {
            deactivated,
            activated,
            logging_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Condition sets backed by a mutable truth table
    struct FakeSets {
        available: bool,
        truth: RefCell<Vec<bool>>,
        evaluated: Cell<usize>,
    }

    impl FakeSets {
        fn new(truth: &[bool]) -> Self {
            Self {
                available: true,
                truth: RefCell::new(truth.to_vec()),
                evaluated: Cell::new(0),
            }
        }

        fn set(&self, index: usize, value: bool) {
            self.truth.borrow_mut()[index] = value;
        }
    }

    impl ConditionSets for FakeSets {
        fn is_available(&self) -> bool {
            self.available
        }

        fn evaluate(&self, index: i32) -> bool {
            self.evaluated.set(self.evaluated.get() + 1);
            self.truth
                .borrow()
                .get(index as usize)
                .copied()
                .unwrap_or(false)
        }

        fn list_names(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn conditioned(name: &str, set: i32) -> Preset {
        Preset {
            condition_set: set,
            ..Preset::named(name)
        }
    }

    fn snapshot() -> Preset {
        Preset::named("Default")
    }

    fn ready(store: &mut PresetStore, sets: &FakeSets) -> PresetResolver {
        let mut resolver = PresetResolver::new();
        resolver.begin_session();
        resolver.tick(store, sets, false, snapshot).unwrap();
        resolver
    }

    fn active_name(resolver: &PresetResolver) -> &str {
        resolver.active().map(|p| p.name.as_str()).unwrap_or("")
    }

    #[test]
    fn test_bootstrap_waits_for_stable_camera() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0)]);
        let sets = FakeSets::new(&[true]);
        let mut resolver = PresetResolver::new();

        // Not logged in yet
        assert!(resolver.tick(&mut store, &sets, false, snapshot).is_none());
        assert!(!store.has_default());

        resolver.begin_session();
        assert!(resolver.tick(&mut store, &sets, true, snapshot).is_none());
        assert!(!store.has_default());
        assert!(resolver.active().is_none());

        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert!(transition.logging_in);
        assert!(transition.deactivated.is_none());
        assert_eq!(transition.activated.name, "Combat");
        assert_eq!(resolver.bootstrap(), Bootstrap::Ready);
        assert!(store.has_default());
    }

    #[test]
    fn test_default_captured_once_per_session() {
        let mut store = PresetStore::default();
        let sets = FakeSets::new(&[]);
        let mut resolver = ready(&mut store, &sets);
        let first = Arc::clone(store.default_preset().unwrap());

        let mut calls = 0;
        for _ in 0..3 {
            resolver.tick(&mut store, &sets, false, || {
                calls += 1;
                snapshot()
            });
        }
        assert_eq!(calls, 0);
        assert!(Arc::ptr_eq(&first, store.default_preset().unwrap()));

        resolver.end_session();
        resolver.begin_session();
        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert!(transition.logging_in);
        assert!(!Arc::ptr_eq(&first, store.default_preset().unwrap()));
    }

    #[test]
    fn test_end_session_clears_active_preset() {
        let mut store = PresetStore::new(vec![Preset::named("Photo")]);
        let sets = FakeSets::new(&[]);
        let mut resolver = ready(&mut store, &sets);

        let photo = store.find_by_name("Photo");
        assert!(resolver.set_override(photo, &store, &sets).is_some());
        assert_eq!(active_name(&resolver), "Photo");

        resolver.end_session();
        assert!(resolver.active().is_none());
        assert!(resolver.override_preset().is_none());
        assert_eq!(resolver.state(), ResolverState::Default);

        // Still nothing active while the next session waits for the camera
        resolver.begin_session();
        assert!(resolver.tick(&mut store, &sets, true, snapshot).is_none());
        assert!(resolver.active().is_none());

        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert!(transition.deactivated.is_none());
        assert_eq!(transition.activated.name, "Default");
    }

    #[test]
    fn test_first_true_preset_wins_for_every_truth_assignment() {
        let presets = vec![
            conditioned("unconditioned", -1),
            conditioned("a", 0),
            conditioned("b", 1),
            conditioned("c", 2),
        ];

        for mask in 0u8..8 {
            let truth: Vec<bool> = (0..3).map(|i| mask & (1 << i) != 0).collect();
            let mut store = PresetStore::new(presets.clone());
            let sets = FakeSets::new(&truth);
            let resolver = ready(&mut store, &sets);

            let expected = ["a", "b", "c"]
                .iter()
                .zip(&truth)
                .find(|(_, t)| **t)
                .map(|(name, _)| *name)
                .unwrap_or("Default");
            assert_eq!(active_name(&resolver), expected, "mask {:03b}", mask);
        }
    }

    #[test]
    fn test_unavailable_provider_fails_closed() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0)]);
        let mut sets = FakeSets::new(&[true]);
        sets.available = false;

        let resolver = ready(&mut store, &sets);
        assert_eq!(resolver.state(), ResolverState::Default);
        assert_eq!(sets.evaluated.get(), 0);
    }

    #[test]
    fn test_override_dominates_and_clearing_recomputes() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0), conditioned("Pinned", -1)]);
        let sets = FakeSets::new(&[false]);
        let mut resolver = ready(&mut store, &sets);

        let pinned = store.find_by_name("Pinned").unwrap();
        let transition = resolver
            .set_override(Some(Arc::clone(&pinned)), &store, &sets)
            .unwrap();
        assert_eq!(transition.deactivated.unwrap().name, "Default");
        assert!(Arc::ptr_eq(&transition.activated, &pinned));
        assert_eq!(resolver.state(), ResolverState::Override(Arc::clone(&pinned)));

        // Condition flips while pinned
        sets.set(0, true);
        assert!(resolver.tick(&mut store, &sets, false, snapshot).is_none());
        assert_eq!(active_name(&resolver), "Pinned");

        // Clearing lands on the current condition state, not the stale one
        let transition = resolver.set_override(None, &store, &sets).unwrap();
        assert_eq!(transition.activated.name, "Combat");
        assert!(matches!(resolver.state(), ResolverState::AutoMatch(_)));
    }

    #[test]
    fn test_setting_same_override_twice_is_quiet() {
        let mut store = PresetStore::new(vec![conditioned("Pinned", -1)]);
        let sets = FakeSets::new(&[]);
        let mut resolver = ready(&mut store, &sets);
        let pinned = store.find_by_name("Pinned");

        assert!(resolver.set_override(pinned.clone(), &store, &sets).is_some());
        assert!(resolver.set_override(pinned, &store, &sets).is_none());
    }

    #[test]
    fn test_override_before_ready_applies_on_bootstrap() {
        let mut store = PresetStore::new(vec![conditioned("Pinned", -1)]);
        let sets = FakeSets::new(&[]);
        let mut resolver = PresetResolver::new();
        resolver.begin_session();

        let pinned = store.find_by_name("Pinned");
        assert!(resolver.set_override(pinned, &store, &sets).is_none());
        assert!(resolver.active().is_none());

        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert_eq!(transition.activated.name, "Pinned");
    }

    #[test]
    fn test_combat_scenario() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0), conditioned("Default", -1)]);
        let sets = FakeSets::new(&[false]);
        let mut resolver = ready(&mut store, &sets);
        let captured = Arc::clone(store.default_preset().unwrap());

        assert_eq!(resolver.state(), ResolverState::Default);
        assert!(Arc::ptr_eq(resolver.active().unwrap(), &captured));
        assert!(resolver.tick(&mut store, &sets, false, snapshot).is_none());

        sets.set(0, true);
        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert!(Arc::ptr_eq(transition.deactivated.as_ref().unwrap(), &captured));
        assert_eq!(transition.activated.name, "Combat");
        assert!(!transition.logging_in);
        assert!(matches!(resolver.state(), ResolverState::AutoMatch(ref p) if p.name == "Combat"));

        sets.set(0, false);
        let transition = resolver.tick(&mut store, &sets, false, snapshot).unwrap();
        assert_eq!(transition.deactivated.unwrap().name, "Combat");
        assert!(Arc::ptr_eq(&transition.activated, &captured));
        assert_eq!(resolver.state(), ResolverState::Default);
    }

    #[test]
    fn test_override_held_while_combat_flips() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0)]);
        let sets = FakeSets::new(&[false]);
        let mut resolver = ready(&mut store, &sets);

        let combat = store.find_by_name("Combat");
        resolver.set_override(combat, &store, &sets).unwrap();

        for value in [true, false, true, false] {
            sets.set(0, value);
            assert!(resolver.tick(&mut store, &sets, false, snapshot).is_none());
            assert!(matches!(resolver.state(), ResolverState::Override(_)));
            assert_eq!(active_name(&resolver), "Combat");
        }

        let transition = resolver.set_override(None, &store, &sets).unwrap();
        assert_eq!(transition.activated.name, "Default");
    }

    #[test]
    fn test_between_areas_tick_is_ignored() {
        let mut store = PresetStore::new(vec![conditioned("Combat", 0)]);
        let sets = FakeSets::new(&[false]);
        let mut resolver = ready(&mut store, &sets);

        sets.set(0, true);
        assert!(resolver.tick(&mut store, &sets, true, snapshot).is_none());
        assert_eq!(resolver.state(), ResolverState::Default);
        assert!(resolver.tick(&mut store, &sets, false, snapshot).is_some());
    }
}
