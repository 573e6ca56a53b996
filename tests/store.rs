//! Store-level integration: multi-handle visibility, owner
//! auto-registration and lock contention against real workspaces.

use std::fs;
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tempfile::TempDir;

use idmap_rs::{Error, IdentityStore, StoreError, StoreOptions};

const PROFILE: &str = "\
# User Profile

**Name:** Test User

## Contact Information
- WhatsApp: +1234567890
- Telegram ID: 123456789
";

fn store(ws: &TempDir) -> IdentityStore {
    IdentityStore::with_options(ws.path(), StoreOptions::default())
}

#[test]
fn test_bindings_visible_across_handles() {
    let ws = TempDir::new().unwrap();
    {
        let s = store(&ws);
        s.add_channel("alice", "telegram", "123", None).unwrap();
        s.add_channel("bob", "whatsapp", "+15550001111", Some("Bob"))
            .unwrap();
    }

    let reopened = store(&ws);
    let map = reopened.list_identities().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(
        reopened.resolve("telegram", "123").unwrap().to_string(),
        "alice"
    );
    assert_eq!(reopened.channels("bob").unwrap().len(), 1);
}

#[test]
fn test_owner_auto_registration_is_lazy_and_idempotent() {
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("USER.md"), PROFILE).unwrap();
    let s = store(&ws);

    let resolution = s.resolve("whatsapp", "+1234567890").unwrap();
    assert_eq!(resolution.canonical().unwrap().as_str(), "test");

    let map = s.list_identities().unwrap();
    let owner = map.owner().expect("owner registered");
    assert!(owner.is_owner);
    assert_eq!(owner.canonical_id.as_str(), "test");
    assert_eq!(owner.display_name.as_deref(), Some("Test"));
    assert_eq!(owner.channels.len(), 1);

    let before = fs::read(s.map_path()).unwrap();
    let again = s.resolve("whatsapp", "+1234567890").unwrap();
    assert_eq!(again.canonical().unwrap().as_str(), "test");
    assert_eq!(fs::read(s.map_path()).unwrap(), before);
}

#[test]
fn test_owner_gains_channels_per_contact_number() {
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("USER.md"), PROFILE).unwrap();
    let s = store(&ws);

    s.resolve("whatsapp", "+1234567890").unwrap();
    s.resolve("telegram", "123456789").unwrap();

    assert_eq!(s.channels("test").unwrap().len(), 2);
    assert_eq!(s.list_identities().unwrap().len(), 1);
    assert!(s.is_owner("test").unwrap());
}

#[test]
fn test_non_contact_stays_stranger_with_profile_present() {
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("USER.md"), PROFILE).unwrap();
    let s = store(&ws);

    let resolution = s.resolve("whatsapp", "+19999999999").unwrap();
    assert!(resolution.is_stranger());
    assert!(!s.map_path().exists());
}

#[test]
fn test_explicit_binding_beats_owner_registration() {
    // A contact number already bound by hand resolves to that binding;
    // the profile is only consulted for unmapped keys.
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("USER.md"), PROFILE).unwrap();
    let s = store(&ws);

    s.add_channel("assistant", "whatsapp", "+1234567890", None)
        .unwrap();
    let resolution = s.resolve("whatsapp", "+1234567890").unwrap();
    assert_eq!(resolution.canonical().unwrap().as_str(), "assistant");
    assert!(s.list_identities().unwrap().owner().is_none());
}

#[test]
fn test_concurrent_adds_from_many_handles() {
    let ws = TempDir::new().unwrap();
    let s = store(&ws);
    s.init(false).unwrap();

    thread::scope(|scope| {
        for i in 0..8 {
            let ws = ws.path();
            scope.spawn(move || {
                let s = IdentityStore::with_options(ws, StoreOptions::default());
                let user = format!("user{i}");
                let provider = format!("{}", 1000 + i);
                s.add_channel(&user, "telegram", &provider, None).unwrap();
            });
        }
    });

    let map = s.list_identities().unwrap();
    assert_eq!(map.len(), 8);
    assert_eq!(map.version, "1.0");
    for i in 0..8 {
        assert_eq!(s.channels(&format!("user{i}")).unwrap().len(), 1);
    }
}

#[test]
fn test_contended_lock_times_out_retryable() {
    let ws = TempDir::new().unwrap();
    let s = IdentityStore::with_options(
        ws.path(),
        StoreOptions {
            lock_timeout: Duration::from_millis(100),
        },
    );
    s.init(false).unwrap();

    let held = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(s.lock_path())
        .unwrap();
    held.lock_exclusive().unwrap();

    let err = s.list_identities().unwrap_err();
    assert!(err.transience().is_retryable());
    match err {
        Error::Store(StoreError::LockTimeout { waited_ms, .. }) => assert!(waited_ms >= 100),
        other => panic!("expected LockTimeout, got {other:?}"),
    }

    drop(held);
    assert!(s.list_identities().is_ok());
}

#[test]
fn test_version_string_preserved_verbatim() {
    let ws = TempDir::new().unwrap();
    let data = ws.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("identity-map.json"),
        "{\"version\": \"0.9\", \"identities\": {}}\n",
    )
    .unwrap();

    let s = store(&ws);
    s.add_channel("alice", "telegram", "123", None).unwrap();

    let raw = fs::read_to_string(data.join("identity-map.json")).unwrap();
    assert!(raw.contains("\"version\": \"0.9\""));
}

#[test]
fn test_legacy_memory_location_round_trip() {
    let ws = TempDir::new().unwrap();
    let legacy = ws.path().join("memory");
    fs::create_dir_all(&legacy).unwrap();
    fs::write(
        legacy.join("identity-map.json"),
        r#"{
  "version": "1.0",
  "identities": {
    "amy": {
      "canonical_id": "amy",
      "is_owner": false,
      "channels": ["telegram:42"],
      "created_at": "2025-01-01T00:00:00Z",
      "updated_at": "2025-01-01T00:00:00Z"
    }
  }
}
"#,
    )
    .unwrap();

    let s = store(&ws);
    assert_eq!(s.resolve("telegram", "42").unwrap().to_string(), "amy");
    assert_eq!(s.map_path(), legacy.join("identity-map.json"));

    s.add_channel("amy", "discord", "amy#1", None).unwrap();
    assert!(
        fs::read_to_string(legacy.join("identity-map.json"))
            .unwrap()
            .contains("discord:amy#1")
    );
    assert!(!ws.path().join("data").exists());
}

#[test]
fn test_structurally_invalid_map_is_corrupt() {
    let ws = TempDir::new().unwrap();
    let data = ws.path().join("data");
    fs::create_dir_all(&data).unwrap();
    // Key does not match the embedded canonical_id.
    fs::write(
        data.join("identity-map.json"),
        r#"{
  "version": "1.0",
  "identities": {
    "alice": {
      "canonical_id": "bob",
      "is_owner": false,
      "channels": [],
      "created_at": "2025-01-01T00:00:00Z",
      "updated_at": "2025-01-01T00:00:00Z"
    }
  }
}
"#,
    )
    .unwrap();

    let err = store(&ws).list_identities().unwrap_err();
    match err {
        Error::Store(StoreError::Corrupt { reason, .. }) => {
            assert!(reason.contains("does not match"));
        }
        other => panic!("expected Corrupt, got {other:?}"),
    }
}
