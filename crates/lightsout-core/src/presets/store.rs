//! Persisted custom presets.
//!
//! Custom presets live under one key of a [`BlobStore`] as a JSON array:
//!
//! ```json
//! [{"id": "1718000000000", "title": "Yoga", "hours": 0, "minutes": 30,
//!   "icon": "star-outline", "isCustom": true}]
//! ```
//!
//! Absent, unreadable or malformed data loads as an empty list. Every
//! mutation is written through before it returns; a failed write is logged
//! and the in-memory change is kept.

use tracing::{debug, warn};

use super::{builtin_presets, is_builtin_id, Preset, QUICK_PRESET_COUNT};
use crate::error::{Result, ValidationError};
use crate::storage::BlobStore;

pub const CUSTOM_PRESETS_KEY: &str = "custom_presets";
pub const DEFAULT_PRESET_ICON: &str = "star-outline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// User input for a new custom preset.
#[derive(Debug, Clone, Default)]
pub struct NewPreset {
    pub title: String,
    pub hours: u32,
    pub minutes: u32,
    pub icon: Option<String>,
}

pub struct PresetStore<B: BlobStore> {
    backend: B,
    custom: Vec<Preset>,
    load_state: LoadState,
    last_id: u64,
}

impl<B: BlobStore> PresetStore<B> {
    /// A store that has not read its backend yet.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            custom: Vec::new(),
            load_state: LoadState::Loading,
            last_id: 0,
        }
    }

    /// Create and load in one step.
    pub fn open(backend: B) -> Self {
        let mut store = Self::new(backend);
        store.load();
        store
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Read the persisted custom presets. Never fails.
    pub fn load(&mut self) {
        self.custom = match self.backend.read_blob(CUSTOM_PRESETS_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Preset>>(&blob) {
                Ok(presets) => presets,
                Err(e) => {
                    warn!(error = %e, "stored presets are malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read stored presets");
                Vec::new()
            }
        };

        for preset in &mut self.custom {
            preset.is_custom = true;
        }
        self.last_id = self
            .custom
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.load_state = LoadState::Ready;
        debug!(count = self.custom.len(), "custom presets loaded");
    }

    /// Built-ins first, then custom presets in creation order.
    pub fn list(&self) -> Vec<Preset> {
        let mut all = builtin_presets();
        all.extend(self.custom.iter().cloned());
        all
    }

    pub fn quick_presets(&self) -> Vec<Preset> {
        self.list().into_iter().take(QUICK_PRESET_COUNT).collect()
    }

    pub fn custom(&self) -> &[Preset] {
        &self.custom
    }

    pub fn get(&self, id: &str) -> Option<Preset> {
        self.list().into_iter().find(|p| p.id == id)
    }

    /// Create a custom preset with a fresh time-based id.
    ///
    /// Minutes past 59 carry into hours.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the title is blank.
    pub fn add(&mut self, input: NewPreset) -> Result<Preset, ValidationError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".into(),
                message: "must not be empty".into(),
            });
        }

        let preset = Preset {
            id: self.next_id(),
            title: title.to_string(),
            hours: input.hours.saturating_add(input.minutes / 60),
            minutes: input.minutes % 60,
            icon: input
                .icon
                .filter(|icon| !icon.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PRESET_ICON.to_string()),
            is_custom: true,
        };

        self.custom.push(preset.clone());
        self.persist();
        Ok(preset)
    }

    /// Delete a custom preset. Built-in and unknown ids are ignored.
    ///
    /// Returns true if a preset was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if is_builtin_id(id) {
            debug!(id, "built-in presets can not be removed");
            return false;
        }

        let before = self.custom.len();
        self.custom.retain(|p| p.id != id);
        if self.custom.len() == before {
            return false;
        }

        self.persist();
        true
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn persist(&self) {
        let result: Result<()> = serde_json::to_string(&self.custom)
            .map_err(Into::into)
            .and_then(|json| self.backend.write_blob(CUSTOM_PRESETS_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist presets, change is not durable");
        }
    }

    fn next_id(&mut self) -> String {
        let mut id = now_ms().max(self.last_id.saturating_add(1));
        if self.id_taken(id) {
            // last_id is saturated; take the first free id from the clock on
            id = (now_ms()..u64::MAX)
                .find(|candidate| !self.id_taken(*candidate))
                .unwrap_or(id);
        }
        self.last_id = self.last_id.max(id);
        id.to_string()
    }

    fn id_taken(&self, id: u64) -> bool {
        let id = id.to_string();
        self.custom.iter().any(|p| p.id == id)
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryBlobStore;

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn read_blob(&self, _key: &str) -> Result<Option<String>> {
            Err(CoreError::Custom("disk unavailable".into()))
        }

        fn write_blob(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CoreError::Custom("disk unavailable".into()))
        }
    }

    fn yoga() -> NewPreset {
        NewPreset {
            title: "Yoga".into(),
            hours: 0,
            minutes: 30,
            icon: Some("yoga".into()),
        }
    }

    #[test]
    fn starts_loading_until_read() {
        let mut store = PresetStore::new(MemoryBlobStore::new());
        assert_eq!(store.load_state(), LoadState::Loading);
        store.load();
        assert_eq!(store.load_state(), LoadState::Ready);
        assert_eq!(store.list(), builtin_presets());
    }

    #[test]
    fn add_appends_custom_after_builtins() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        let created = store.add(yoga()).unwrap();

        let list = store.list();
        assert_eq!(list.len(), 5);
        assert_eq!(list.last(), Some(&created));
        assert!(created.is_custom);
        assert!(!is_builtin_id(&created.id));
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        let a = store.add(yoga()).unwrap();
        let b = store.add(yoga()).unwrap();
        let c = store.add(yoga()).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        let err = store
            .add(NewPreset {
                title: "   ".into(),
                ..NewPreset::default()
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "title"));
        assert!(store.custom().is_empty());
    }

    #[test]
    fn minutes_carry_into_hours_and_icon_defaults() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        let preset = store
            .add(NewPreset {
                title: "Deep work".into(),
                hours: 1,
                minutes: 90,
                icon: None,
            })
            .unwrap();
        assert_eq!((preset.hours, preset.minutes), (2, 30));
        assert_eq!(preset.icon, DEFAULT_PRESET_ICON);
    }

    #[test]
    fn removing_builtin_is_noop() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        store.add(yoga()).unwrap();
        let before = store.list();

        assert!(!store.remove("cooking"));
        assert!(!store.remove("no-such-id"));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn remove_deletes_only_matching_custom() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        let keep = store.add(yoga()).unwrap();
        let drop = store.add(yoga()).unwrap();

        assert!(store.remove(&drop.id));
        assert_eq!(store.custom(), &[keep]);
    }

    #[test]
    fn malformed_blob_loads_empty() {
        let backend = MemoryBlobStore::new();
        backend.write_blob(CUSTOM_PRESETS_KEY, "{not json").unwrap();

        let store = PresetStore::open(backend);
        assert_eq!(store.load_state(), LoadState::Ready);
        assert!(store.custom().is_empty());
    }

    #[test]
    fn read_failure_loads_empty() {
        let store = PresetStore::open(FailingStore);
        assert_eq!(store.load_state(), LoadState::Ready);
        assert_eq!(store.list().len(), 4);
    }

    #[test]
    fn write_failure_keeps_in_memory_change() {
        let mut store = PresetStore::open(FailingStore);
        let created = store.add(yoga()).unwrap();
        assert_eq!(store.custom(), &[created.clone()]);

        assert!(store.remove(&created.id));
        assert!(store.custom().is_empty());
    }

    #[test]
    fn quick_presets_are_first_four() {
        let mut store = PresetStore::open(MemoryBlobStore::new());
        store.add(yoga()).unwrap();
        let quick = store.quick_presets();
        assert_eq!(quick.len(), 4);
        assert!(quick.iter().all(|p| !p.is_custom));
    }

    #[test]
    fn reload_continues_id_sequence() {
        let backend = MemoryBlobStore::new();
        backend
            .write_blob(
                CUSTOM_PRESETS_KEY,
                r#"[{"id":"99999999999999","title":"Future","hours":0,"minutes":5,"icon":"x"}]"#,
            )
            .unwrap();

        let mut store = PresetStore::open(backend);
        assert!(store.custom()[0].is_custom);
        let created = store.add(yoga()).unwrap();
        assert_eq!(created.id, "100000000000000");
    }

    #[test]
    fn max_stored_id_does_not_overflow() {
        let backend = MemoryBlobStore::new();
        backend
            .write_blob(
                CUSTOM_PRESETS_KEY,
                r#"[{"id":"18446744073709551615","title":"Edge","hours":0,"minutes":5,"icon":"x"}]"#,
            )
            .unwrap();

        let mut store = PresetStore::open(backend);
        let a = store.add(yoga()).unwrap();
        let b = store.add(yoga()).unwrap();

        let ids: std::collections::HashSet<_> =
            store.custom().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(a.id, "18446744073709551615");
        assert_ne!(a.id, b.id);
    }
}
