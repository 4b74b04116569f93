//! Integration tests for the confstore-core model.
//!
//! These tests drive the public API the way a storage provider does: build a
//! configuration, feed literals into its values by name or position, and read
//! the rendered strings back out.

use confstore_core::{
    ConfigError, ConfigKey, Configuration, Conversion, DefaultParser, KeyBinding, NamedValue,
    OptionalParser, TypeTag,
};
use uuid::Uuid;

/// Mirrors what a loader does with one `[Flags]` section of positional lines.
fn load_positional(key: &mut ConfigKey, lines: &[&str]) -> Result<(), ConfigError> {
    let value = key
        .default_value_mut()
        .ok_or_else(|| ConfigError::Argument("no default value".to_string()))?;
    value.reset_value();
    for line in lines {
        value.add_parsed_string(line)?;
    }
    Ok(())
}

#[test]
fn test_free_form_configuration_tracks_both_views() {
    // Arrange
    let mut config = Configuration::new();
    let mut server = ConfigKey::new("Server").unwrap();
    server.add("Port", "8080".to_string(), true).unwrap();
    let flags = ConfigKey::new("Flags").unwrap();

    // Act
    config.push(server).unwrap();
    config.push(flags).unwrap();
    config.insert(0, ConfigKey::new("Header").unwrap()).unwrap();

    // Assert
    assert_eq!(config.names().collect::<Vec<_>>(), vec!["Header", "Server", "Flags"]);
    assert_eq!(config.index_of("Flags"), Some(2));
    assert_eq!(
        config["Server"].try_get_value("Port").as_deref(),
        Some("8080")
    );
    assert!(matches!(
        config.push(ConfigKey::new("Server").unwrap()),
        Err(ConfigError::DuplicateKey(_))
    ));
}

#[test]
fn test_positional_lines_accumulate_in_default_value() {
    // Arrange
    let mut key = ConfigKey::new("Flags").unwrap();
    key.insert(NamedValue::new("unnamed0", String::new()).name_visible(false))
        .unwrap();
    key.set_default_value_name(Some("unnamed0")).unwrap();

    // Act
    load_positional(&mut key, &["verbose", "quiet"]).unwrap();

    // Assert
    let flags = key.named::<String>("unnamed0").unwrap();
    assert_eq!(flags.values(), &["verbose", "quiet"]);
    assert_eq!(key.default_value().unwrap().stored_strings().len(), 2);
}

#[test]
fn test_typed_values_parse_through_default_parser() {
    // Arrange
    let mut key = ConfigKey::new("Typed").unwrap();
    key.insert(NamedValue::new("id", Uuid::nil())).unwrap();
    key.insert(NamedValue::new("kind", TypeTag::String)).unwrap();
    key.insert(NamedValue::new("limit", None::<u32>).with_parser(OptionalParser(DefaultParser)))
        .unwrap();

    // Act
    let id = Uuid::new_v4();
    key.value_mut("id").unwrap().parse_string(&id.to_string()).unwrap();
    key.value_mut("kind").unwrap().parse_string("int").unwrap();
    key.value_mut("limit").unwrap().parse_string("25").unwrap();

    // Assert
    assert_eq!(key.try_get_value_as::<Uuid>("id"), Some(id));
    assert_eq!(key.try_get_value_as::<TypeTag>("kind"), Some(TypeTag::I32));
    assert_eq!(key.try_get_value_as::<Option<u32>>("limit"), Some(Some(25)));
}

#[derive(Debug, Default, PartialEq)]
struct Window {
    title: String,
    width: u32,
    ratio_percent: f64,
    recent: Vec<String>,
}

fn window_binding() -> KeyBinding<Window> {
    KeyBinding::new("Window")
        .field("Title", |w: &Window| w.title.clone(), |w, v| w.title = v)
        .field("Width", |w: &Window| w.width, |w, v| w.width = v)
        .converted(
            "Ratio",
            |w: &Window| w.ratio_percent,
            |w, v| w.ratio_percent = v,
            Conversion::new(|p: &f64| p / 100.0, |r: f64| r * 100.0),
        )
        .positional("recent", |w: &Window| w.recent.clone(), |w, v| w.recent = v)
}

#[test]
fn test_binding_round_trips_struct_through_key() {
    // Arrange
    let binding = window_binding();
    let original = Window {
        title: "Main".to_string(),
        width: 640,
        ratio_percent: 50.0,
        recent: vec!["a.txt".to_string(), "b.txt".to_string()],
    };

    // Act
    let key = binding.to_key(&original).unwrap();
    let mut restored = Window::default();
    binding.apply(&key, &mut restored).unwrap();

    // Assert
    assert_eq!(key.try_get_value("Ratio").as_deref(), Some("0.5"));
    assert_eq!(restored, original);
}

#[test]
fn test_bound_key_rejects_schema_changes() {
    let mut key = window_binding().to_key(&Window::default()).unwrap();

    assert!(matches!(
        key.add("Extra", 1i32, true),
        Err(ConfigError::FixedSchema(_))
    ));
    assert!(matches!(key.remove("Title"), Err(ConfigError::FixedSchema(_))));
    assert!(matches!(
        key.add_or_update("Width", "wide".to_string(), false, true),
        Err(ConfigError::TypeConflict { .. })
    ));
}
