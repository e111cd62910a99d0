//! Configuration file tests
//!
//! Load TOML navigation configs from disk and check they shape navigation.

use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use navigator_core::config::{load_config_from_path, ConfigOverrides};
use navigator_core::{ConfigError, InputMode, Navigator, NavigatorError, ScreenId, TransitionKind, ViewRegistry};

const CONFIG: &str = r#"
hud_screen = "Overlay"
fallback_screen = "MainMenu"

[transitions.screen]
kind = "fade"
duration_secs = 0.5
easing = "linear"

[[screens]]
key = "Gameplay"
show_hud = true
uses_player_input = true

[[screens]]
key = "MainMenu"

[[screens]]
key = "Loading"
exclude_from_history = true

[[overrides]]
from = "MainMenu"
to = "Settings"
transition = { kind = "instant" }
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

struct Blank;

impl navigator_core::Screen<()> for Blank {}

#[test]
fn test_load_config_file() {
    let file = write_config(CONFIG);
    let config = load_config_from_path(file.path()).unwrap();

    assert_eq!(config.hud_screen().as_str(), "Overlay");
    assert_eq!(config.fallback_screen(), Some(&ScreenId::from("MainMenu")));
    assert!(config.uses_player_input(&ScreenId::from("Gameplay")));
    assert!(config.excluded_from_history(&ScreenId::from("Loading")));

    let pair = config.screen_transition(&ScreenId::from("MainMenu"), &ScreenId::from("Settings"));
    assert_eq!(pair.kind, TransitionKind::Instant);

    let default = config.screen_transition(&ScreenId::from("MainMenu"), &ScreenId::from("Gameplay"));
    assert_eq!(default.kind, TransitionKind::Fade);
    assert!((default.duration_secs - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_overrides_take_priority_over_file() {
    let file = write_config(CONFIG);
    let overrides = ConfigOverrides::from_lookup(|name| match name {
        "NAVIGATOR_REDUCE_MOTION" => Some("yes".to_owned()),
        "NAVIGATOR_FALLBACK_SCREEN" => Some("Title".to_owned()),
        _ => None,
    })
    .unwrap();

    let config = load_config_from_path(file.path()).unwrap().with_overrides(&overrides);

    assert!(config.reduce_motion());
    assert_eq!(config.fallback_screen(), Some(&ScreenId::from("Title")));
    assert!(config
        .screen_transition(&ScreenId::from("MainMenu"), &ScreenId::from("Gameplay"))
        .is_instant());
}

#[test]
fn test_navigator_from_config_file() {
    let file = write_config(CONFIG);
    let registry = ViewRegistry::new()
        .with_screen("Gameplay", || Box::new(Blank))
        .with_screen("Overlay", || Box::new(Blank));

    let mut nav = Navigator::<()>::builder()
        .config_file(file.path())
        .views(registry)
        .build()
        .unwrap();

    nav.show_screen("Gameplay");
    assert!(nav.is_transitioning());

    for _ in 0..4 {
        nav.tick(Duration::from_millis(250));
    }

    assert!(!nav.is_transitioning());
    assert!(nav.is_hud_visible());
    assert_eq!(nav.input_mode(), Some(InputMode::Player));
}

#[test]
fn test_invalid_config_rejected() {
    let file = write_config(
        r#"
[[screens]]
key = "A"

[[screens]]
key = "A"
"#,
    );

    let result = Navigator::<()>::builder().config_file(file.path()).build();
    assert!(matches!(
        result,
        Err(NavigatorError::Config(ConfigError::ValidationError(_)))
    ));
}

#[test]
fn test_malformed_toml_rejected() {
    let file = write_config("hud_screen = [");

    assert!(matches!(
        load_config_from_path(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}
