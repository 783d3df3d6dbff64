//! Persisted toggle state round trips

use proptest::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tqe_core::{
    CompilationEventBus, EnablementComponent, EnhancementListener, EnhancementState,
    JsonSettingsStore, SettingsError, SettingsStore, DEFAULT_SETTINGS_PATH,
};
use tqe_enhance::EnhanceConfig;
use tqe_test_utils::ScriptedFactory;

fn workspace_store(project_root: &Path) -> JsonSettingsStore {
    JsonSettingsStore::new(project_root.join(DEFAULT_SETTINGS_PATH))
}

#[test]
fn state_round_trips_through_the_workspace_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = workspace_store(dir.path());

    store.save_state(EnhancementState::new(true)).unwrap();
    assert_eq!(store.load_state().unwrap(), Some(EnhancementState::new(true)));

    store.save_state(EnhancementState::new(false)).unwrap();
    assert_eq!(store.load_state().unwrap(), Some(EnhancementState::new(false)));
}

#[test]
fn a_fresh_store_sees_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    workspace_store(dir.path())
        .save_state(EnhancementState::new(true))
        .unwrap();

    let reopened = workspace_store(dir.path());
    assert_eq!(reopened.load_state().unwrap(), Some(EnhancementState::new(true)));
}

#[test]
fn wrong_shape_under_the_key_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workspace.json");
    fs::write(&path, r#"{"avajeTypeQueryEnhancement": {"enabled": "yes"}}"#).unwrap();

    let err = JsonSettingsStore::new(&path).load_state().unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn loaded_state_drives_the_component() {
    let dir = tempfile::tempdir().unwrap();
    let store = workspace_store(dir.path());
    store.save_state(EnhancementState::new(true)).unwrap();

    let bus = Arc::new(CompilationEventBus::new());
    let listener = Arc::new(EnhancementListener::new(
        Arc::new(ScriptedFactory::new()),
        EnhanceConfig::new(),
    ));
    let component = EnablementComponent::new(Arc::clone(&bus), listener);
    component.load_state(store.load_state().unwrap().unwrap_or_default());

    assert!(component.is_enabled());
    assert_eq!(bus.listener_count(), 1);
}

proptest! {
    #[test]
    fn last_toggle_wins(toggles in proptest::collection::vec(any::<bool>(), 1..12)) {
        let dir = tempfile::tempdir().unwrap();
        let store = workspace_store(dir.path());
        let bus = Arc::new(CompilationEventBus::new());
        let listener = Arc::new(EnhancementListener::new(
            Arc::new(ScriptedFactory::new()),
            EnhanceConfig::new(),
        ));
        let component = EnablementComponent::new(Arc::clone(&bus), listener);

        for enabled in &toggles {
            component.set_enabled(*enabled);
            store.save_state(component.state()).unwrap();
        }

        let last = *toggles.last().unwrap();
        prop_assert_eq!(store.load_state().unwrap(), Some(EnhancementState::new(last)));
        prop_assert_eq!(bus.listener_count(), usize::from(last));
    }
}
