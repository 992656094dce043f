use std::sync::Arc;

use super::Preset;

/// Ordered presets plus the Default snapshot of the live camera
///
/// Presets are handed out as `Arc<Preset>`; two handles refer to the same
/// preset exactly when they are `Arc::ptr_eq`.
#[derive(Debug, Default)]
pub struct PresetStore {
    presets: Vec<Arc<Preset>>,
    default: Option<Arc<Preset>>,
}

impl PresetStore {
    pub fn new(presets: Vec<Preset>) -> Self {
        Self {
            presets: presets.into_iter().map(Arc::new).collect(),
            default: None,
        }
    }

    /// Presets in priority order (earlier wins)
    pub fn presets(&self) -> &[Arc<Preset>] {
        &self.presets
    }

    /// Exact, case-sensitive lookup; the first of several equal names wins
    pub fn find_by_name(&self, name: &str) -> Option<Arc<Preset>> {
        self.presets.iter().find(|p| p.name == name).cloned()
    }

    /// Replace the preset list
    pub fn set_presets(&mut self, presets: Vec<Preset>) {
        self.presets = presets.into_iter().map(Arc::new).collect();
    }

    /// Snapshot the live camera as the Default preset
    pub fn capture_default(&mut self, snapshot: impl FnOnce() -> Preset) -> Arc<Preset> {
        let preset = Arc::new(snapshot());
        tracing::debug!("Captured default preset: {:?}", preset);
        self.default = Some(Arc::clone(&preset));
        preset
    }

    pub fn default_preset(&self) -> Option<&Arc<Preset>> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Owned copies, for writing back to the config
    pub fn to_vec(&self) -> Vec<Preset> {
        self.presets.iter().map(|p| Preset::clone(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name_first_match_case_sensitive() {
        let mut second = Preset::named("Combat");
        second.max_zoom = 99.0;
        let store = PresetStore::new(vec![Preset::named("Combat"), second]);

        let found = store.find_by_name("Combat").unwrap();
        assert_eq!(found.max_zoom, 20.0);
        assert!(Arc::ptr_eq(&found, &store.presets()[0]));
        assert!(store.find_by_name("combat").is_none());
        assert!(store.find_by_name("").is_none());
    }

    #[test]
    fn test_capture_default() {
        let mut store = PresetStore::default();
        assert!(!store.has_default());

        let captured = store.capture_default(|| Preset::named("Default"));
        assert!(Arc::ptr_eq(&captured, store.default_preset().unwrap()));
        assert!(store.presets().is_empty());
    }

    #[test]
    fn test_set_presets_keeps_order() {
        let mut store = PresetStore::default();
        store.set_presets(vec![Preset::named("a"), Preset::named("b")]);

        let names: Vec<_> = store.to_vec().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
