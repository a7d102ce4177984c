//! Preset persistence against a real SQLite file.

use lightsout_core::presets::{builtin_presets, CUSTOM_PRESETS_KEY};
use lightsout_core::{Database, NewPreset, PresetStore};

#[test]
fn custom_presets_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lightsout.db");

    let before = {
        let mut store = PresetStore::open(Database::open_at(&path).unwrap());
        store
            .add(NewPreset {
                title: "Yoga".into(),
                hours: 0,
                minutes: 30,
                icon: None,
            })
            .unwrap();
        store
            .add(NewPreset {
                title: "Deep reading".into(),
                hours: 1,
                minutes: 15,
                icon: Some("book-open-variant".into()),
            })
            .unwrap();
        store.list()
    };

    let reopened = PresetStore::open(Database::open_at(&path).unwrap());
    assert_eq!(reopened.list(), before);

    let titles: Vec<_> = reopened.custom().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Yoga", "Deep reading"]);
    assert!(reopened.custom().iter().all(|p| p.is_custom));
}

#[test]
fn removal_is_durable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lightsout.db");

    let id = {
        let mut store = PresetStore::open(Database::open_at(&path).unwrap());
        let preset = store
            .add(NewPreset {
                title: "Nap".into(),
                minutes: 20,
                ..Default::default()
            })
            .unwrap();
        assert!(store.remove(&preset.id));
        preset.id
    };

    let reopened = PresetStore::open(Database::open_at(&path).unwrap());
    assert!(reopened.get(&id).is_none());
    assert_eq!(reopened.list(), builtin_presets());
}

#[test]
fn builtin_removal_is_a_noop() {
    let db = Database::open_memory().unwrap();
    let mut store = PresetStore::open(&db);

    assert!(!store.remove("cooking"));
    assert_eq!(store.list(), builtin_presets());
    assert!(db.kv_get(CUSTOM_PRESETS_KEY).unwrap().is_none());
}

#[test]
fn corrupt_blob_loads_empty_and_is_overwritten() {
    let db = Database::open_memory().unwrap();
    db.kv_set(CUSTOM_PRESETS_KEY, "{not json").unwrap();

    let mut store = PresetStore::open(&db);
    assert!(store.custom().is_empty());

    store
        .add(NewPreset {
            title: "Stretch".into(),
            minutes: 10,
            ..Default::default()
        })
        .unwrap();

    let blob = db.kv_get(CUSTOM_PRESETS_KEY).unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(stored[0]["title"], "Stretch");
    assert_eq!(stored[0]["isCustom"], true);
}
