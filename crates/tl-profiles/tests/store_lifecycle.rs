use std::fs;

use tl_core::ProfileId;
use tl_profiles::{ProfileError, ProfileStore, SettingsDocument};

fn sample_settings() -> SettingsDocument {
    let mut doc = SettingsDocument::new();
    doc.set("targetheight", "2.2");
    doc.set("maxangle", "90");
    doc
}

fn ids(store: &ProfileStore) -> Vec<u32> {
    store
        .list_profiles()
        .expect("listing should succeed")
        .iter()
        .map(|p| p.id.get())
        .collect()
}

#[test]
fn sequential_creates_count_up_from_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path().join("profiles"));

    for expected in 0..5u32 {
        let profile = store.create_profile(&sample_settings()).unwrap();
        assert_eq!(profile.id, ProfileId::new(expected));
        assert!(profile.settings_path.is_file());
        assert!(!profile.is_simulated());
    }
    assert_eq!(ids(&store), vec![0, 1, 2, 3, 4]);
}

#[test]
fn deleting_max_id_frees_it_for_reuse() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());

    for _ in 0..3 {
        store.create_profile(&SettingsDocument::new()).unwrap();
    }
    store.delete_profile(ProfileId::new(2)).unwrap();

    assert_eq!(store.next_id().unwrap(), ProfileId::new(2));
    assert_eq!(ids(&store), vec![0, 1]);
}

#[test]
fn deleting_middle_id_does_not_fill_gap() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());

    for _ in 0..3 {
        store.create_profile(&SettingsDocument::new()).unwrap();
    }
    store.delete_profile(ProfileId::new(1)).unwrap();

    let created = store.create_profile(&SettingsDocument::new()).unwrap();
    assert_eq!(created.id, ProfileId::new(3));
}

#[test]
fn listing_is_sorted_and_skips_foreign_directories() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["profile_3", "profile_1", "notes", "profile_2"] {
        fs::create_dir(tmp.path().join(name)).unwrap();
    }
    let store = ProfileStore::new(tmp.path());

    assert_eq!(ids(&store), vec![1, 2, 3]);
    assert_eq!(store.next_id().unwrap(), ProfileId::new(4));
}

#[test]
fn next_id_sees_external_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    assert_eq!(store.next_id().unwrap(), ProfileId::new(0));

    fs::create_dir(tmp.path().join("profile_10")).unwrap();
    assert_eq!(store.next_id().unwrap(), ProfileId::new(11));

    fs::remove_dir(tmp.path().join("profile_10")).unwrap();
    assert_eq!(store.next_id().unwrap(), ProfileId::new(0));
}

#[test]
fn create_writes_pretty_settings_that_read_back() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let settings = sample_settings();

    let profile = store.create_profile(&settings).unwrap();
    let text = fs::read_to_string(&profile.settings_path).unwrap();
    assert!(text.contains('\n'), "settings.json should be pretty-printed");

    let loaded = store.read_settings(profile.id).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn delete_missing_profile_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());

    let err = store.delete_profile(ProfileId::new(7)).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn read_output_before_simulation_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let profile = store.create_profile(&sample_settings()).unwrap();

    let err = store.read_output(profile.id).unwrap_err();
    assert!(matches!(err, ProfileError::NotFound { id } if id == profile.id));
}

#[test]
fn read_output_returns_header_then_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let profile = store.create_profile(&sample_settings()).unwrap();
    fs::write(
        &profile.output_path,
        "distance,speed,robot-speed,angle,max-height\n1,7.5,0,45,2.9\n1.3,7.9,0.38,44.2,3.0\n",
    )
    .unwrap();

    let rows = store.read_output(profile.id).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec!["distance", "speed", "robot-speed", "angle", "max-height"]
    );
    assert_eq!(rows[2][3], "44.2");
    assert!(store.get(profile.id).unwrap().is_simulated());
}

#[test]
fn ragged_output_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let profile = store.create_profile(&sample_settings()).unwrap();
    fs::write(&profile.output_path, "a,b\n1,2,3\n").unwrap();

    let err = store.read_output(profile.id).unwrap_err();
    assert!(matches!(err, ProfileError::MalformedOutput { .. }), "{err}");
}

#[test]
fn corrupt_settings_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());
    let profile = store.create_profile(&sample_settings()).unwrap();
    fs::write(&profile.settings_path, "{ \"maxangle\": ").unwrap();

    let err = store.read_settings(profile.id).unwrap_err();
    assert!(matches!(err, ProfileError::MalformedSettings { .. }), "{err}");
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(tmp.path());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.create_profile(&SettingsDocument::new()).unwrap().id)
        })
        .collect();
    let mut created: Vec<u32> = handles
        .into_iter()
        .map(|h| h.join().unwrap().get())
        .collect();
    created.sort_unstable();

    assert_eq!(created, (0..8).collect::<Vec<_>>());
}
