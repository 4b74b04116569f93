//! Integration tests for the INI storage provider.
//!
//! These tests exercise load, update and save end-to-end against real files
//! in a per-test temp directory.  Set `RUST_LOG=debug` to see the provider's
//! line-level tracing.

use std::fs;
use std::path::{Path, PathBuf};

use confstore_core::{ConfigKey, Configuration, KeyBinding, NamedValue};
use confstore_storage::{IniStorageProvider, SchemaStore, StorageError, StorageProvider};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ── Helpers ───────────────────────────────────────────────────────────────────

const SCENARIO: &str = "[Server]\nPort=8080\n# note\n[Flags]\nverbose\nquiet\n";

fn init_tracing() {
    // Several tests race to install the subscriber; only the first wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Writes `content` to a fresh file in a unique temp directory.
fn write_temp(name: &str, content: &str) -> PathBuf {
    init_tracing();
    let dir = std::env::temp_dir().join(format!("confstore_it_{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create test dir");
    let path = dir.join(name);
    fs::write(&path, content).expect("write test file");
    path
}

fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        fs::remove_dir_all(dir).ok();
    }
}

/// Files left in the test directory besides the target itself.
fn stray_files(path: &Path) -> Vec<String> {
    let Some(dir) = path.parent() else {
        return Vec::new();
    };
    fs::read_dir(dir)
        .expect("read test dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| Some(name.as_str()) != path.file_name().and_then(|n| n.to_str()))
        .collect()
}

fn scenario_schema() -> Configuration {
    let mut server = ConfigKey::new("Server").unwrap();
    server.insert(NamedValue::new("Port", 0i32)).unwrap();
    let mut flags = ConfigKey::new("Flags").unwrap();
    flags
        .insert(NamedValue::new("values", String::new()).name_visible(false))
        .unwrap();
    flags.set_default_value_name(Some("values")).unwrap();
    Configuration::from_keys([server, flags]).unwrap()
}

// ── Scenario ──────────────────────────────────────────────────────────────────

#[test]
fn test_scenario_load_then_update_rewrites_only_port_line() {
    // Arrange
    let path = write_temp("scenario.ini", SCENARIO);
    let mut provider = IniStorageProvider::open(&path, false).unwrap();
    let mut schema = scenario_schema();

    // Act – load
    provider.load_into(&mut schema).unwrap();

    // Assert – load
    assert_eq!(schema["Server"].try_get_value_as::<i32>("Port"), Some(8080));
    assert_eq!(
        schema["Flags"].named::<String>("values").unwrap().values(),
        &["verbose", "quiet"]
    );

    // Act – update
    schema
        .key_mut("Server")
        .unwrap()
        .set_value("Port", 9090i32)
        .unwrap();
    provider.update(&schema).unwrap();

    // Assert – update
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[Server]\nPort=9090\n# note\n[Flags]\nverbose\nquiet\n"
    );
    assert!(stray_files(&path).is_empty());
    cleanup(&path);
}

#[test]
fn test_update_keeps_unconfigured_content_byte_identical() {
    // Arrange
    let source = "; header\r\n\r\n[Legacy]\r\n  mode = old\r\nlist\r\n\r\n[Server]\r\nPort=1\r\n#tail";
    let path = write_temp("legacy.ini", source);
    let mut server = ConfigKey::new("Server").unwrap();
    server.add("Port", 2i32, true).unwrap();
    let configuration = Configuration::from_keys([server]).unwrap();
    let mut provider = IniStorageProvider::open(&path, false).unwrap();

    // Act
    provider.update_with(&configuration, false).unwrap();

    // Assert
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        source.replace("Port=1", "Port=2")
    );
    cleanup(&path);
}

#[test]
fn test_update_with_add_missing_appends_each_absent_key_once() {
    // Arrange
    let path = write_temp("append.ini", "[Server]\nPort=1\n");
    let mut server = ConfigKey::new("Server").unwrap();
    server.add("Port", 1i32, true).unwrap();
    let mut cache = ConfigKey::new("Cache").unwrap();
    cache.add("Size", 64u32, true).unwrap();
    let configuration = Configuration::from_keys([server, cache]).unwrap();
    let mut provider = IniStorageProvider::open(&path, false).unwrap();

    // Act
    provider.update_with(&configuration, true).unwrap();
    provider.update_with(&configuration, true).unwrap();

    // Assert
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "[Server]\nPort=1\n\n[Cache]\n\nSize=64\n");
    assert_eq!(text.matches("[Cache]").count(), 1);
    cleanup(&path);
}

#[test]
fn test_update_without_add_missing_skips_absent_keys() {
    let path = write_temp("skip.ini", "[Server]\nPort=1\n");
    let mut cache = ConfigKey::new("Cache").unwrap();
    cache.add("Size", 64u32, true).unwrap();
    let configuration = Configuration::from_keys([cache]).unwrap();
    let mut provider = IniStorageProvider::open(&path, false).unwrap();

    provider.update(&configuration).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[Server]\nPort=1\n");
    cleanup(&path);
}

// ── Save ──────────────────────────────────────────────────────────────────────

#[test]
fn test_save_then_load_round_trips_names_and_values() {
    // Arrange
    let path = write_temp("roundtrip.ini", "stale content\n");
    let mut server = ConfigKey::new("Server").unwrap();
    server.add("Port", 8080u16, true).unwrap();
    server.add("Secure", true, true).unwrap();
    server.add("Proxy", None::<String>, true).unwrap();
    let mut flags = ConfigKey::new("Flags").unwrap();
    let mut values = NamedValue::new("values", String::new()).name_visible(false);
    values.set_values(["verbose".to_string(), "quiet".to_string()]);
    flags.insert(values).unwrap();
    let configuration = Configuration::from_keys([server, flags]).unwrap();
    let mut provider = IniStorageProvider::open(&path, false).unwrap();

    // Act
    provider.save(&configuration).unwrap();
    let loaded = provider.load().unwrap();

    // Assert
    assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["Server", "Flags"]);
    for (name, expected) in [("Port", "8080"), ("Secure", "true"), ("Proxy", "")] {
        assert_eq!(loaded["Server"].try_get_value(name).as_deref(), Some(expected));
    }
    assert_eq!(loaded["Flags"].try_get_value("unnamed0").as_deref(), Some("verbose"));
    assert_eq!(loaded["Flags"].try_get_value("unnamed1").as_deref(), Some("quiet"));
    cleanup(&path);
}

#[test]
fn test_save_creates_missing_file() {
    let path = write_temp("placeholder.ini", "");
    let target = path.with_file_name("fresh.ini");
    let mut key = ConfigKey::new("S").unwrap();
    key.add("a", 1i32, true).unwrap();
    let configuration = Configuration::from_keys([key]).unwrap();
    let mut provider = IniStorageProvider::open(&target, false).unwrap();

    provider.save(&configuration).unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "\n[S]\n\na=1\n\n");
    cleanup(&path);
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[test]
fn test_failed_stage_leaves_target_untouched() {
    // Arrange – stage into a directory that does not exist
    let path = write_temp("guarded.ini", SCENARIO);
    let format = confstore_storage::IniFormat {
        temp_dir: Some(path.with_file_name("no_such_dir")),
        ..Default::default()
    };
    let mut provider = IniStorageProvider::with_format(&path, false, format).unwrap();

    // Act
    let err = provider.update(&scenario_schema()).unwrap_err();

    // Assert
    assert!(matches!(err, StorageError::Io { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO);
    cleanup(&path);
}

#[test]
fn test_read_only_provider_loads_but_never_writes() {
    let path = write_temp("readonly.ini", SCENARIO);
    let mut provider = IniStorageProvider::open(&path, true).unwrap();

    let configuration = provider.load().unwrap();

    assert!(provider.is_read_only());
    assert!(matches!(
        provider.save(&configuration),
        Err(StorageError::ReadOnly(_))
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), SCENARIO);
    cleanup(&path);
}

#[test]
fn test_dropped_provider_releases_file() {
    let path = write_temp("dropped.ini", SCENARIO);
    {
        let mut provider = IniStorageProvider::open(&path, false).unwrap();
        provider.load().unwrap();
    }

    // A fresh provider can still write the file.
    let mut provider = IniStorageProvider::open(&path, false).unwrap();
    provider.save(&Configuration::new()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    cleanup(&path);
}

// ── Typed structs ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Settings {
    port: i32,
    flags: Vec<String>,
}

#[test]
fn test_schema_store_round_trips_struct_through_file() {
    // Arrange
    let path = write_temp("typed.ini", SCENARIO);
    let store = SchemaStore::new()
        .bind(KeyBinding::new("Server").field("Port", |s: &Settings| s.port, |s, v| s.port = v))
        .bind(KeyBinding::new("Flags").positional(
            "values",
            |s: &Settings| s.flags.clone(),
            |s, v| s.flags = v,
        ));
    let mut provider = IniStorageProvider::open(&path, false).unwrap();
    let mut settings = Settings::default();

    // Act
    store.load(&mut provider, &mut settings).unwrap();
    settings.port = 9090;
    settings.flags = vec!["debug".to_string(), "trace".to_string()];
    store.store(&mut provider, &settings, false).unwrap();

    // Assert
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[Server]\nPort=9090\n# note\n[Flags]\ndebug\ntrace\n"
    );
    let mut reloaded = Settings::default();
    store.load(&mut provider, &mut reloaded).unwrap();
    assert_eq!(reloaded, settings);
    cleanup(&path);
}

#[derive(Debug, Default, PartialEq)]
struct Limits {
    limit: Option<i32>,
}

#[test]
fn test_schema_store_round_trips_optional_none_without_null_literal() {
    // Arrange
    let path = write_temp("limits.ini", "");
    let store = SchemaStore::new().bind(KeyBinding::new("Svc").optional(
        "Limit",
        |s: &Limits| s.limit,
        |s, v| s.limit = v,
        None,
    ));
    let mut provider = IniStorageProvider::open(&path, false).unwrap();

    // Act – store None, then load it into a struct holding a value
    store.store(&mut provider, &Limits::default(), true).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    let mut loaded = Limits { limit: Some(7) };
    store.load(&mut provider, &mut loaded).unwrap();

    // Assert
    assert_eq!(written, "\n[Svc]\n\nLimit=\n");
    assert_eq!(loaded, Limits::default());

    // Act – a concrete value survives the same round trip
    store.store(&mut provider, &Limits { limit: Some(42) }, true).unwrap();
    store.load(&mut provider, &mut loaded).unwrap();

    // Assert
    assert_eq!(loaded.limit, Some(42));
    cleanup(&path);
}
