//! Navigation Configuration
//!
//! The read-only lookup table the handlers consult during a session:
//! per-screen behavior flags, transition overrides for specific screen
//! pairs, default transitions, and the HUD and fallback screen keys.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables ([`ConfigOverrides::from_env`])
//! 2. TOML configuration file
//! 3. Default values
//!
//! The default file lives at `$XDG_CONFIG_HOME/navigator/navigation.toml`
//! (typically `~/.config/navigator/navigation.toml`). A missing file is not an
//! error; a malformed one is.
//!
//! # Example Configuration
//!
//! ```toml
//! hud_screen = "HUD"
//! fallback_screen = "MainMenu"
//!
//! [transitions.screen]
//! kind = "fade"
//! duration_secs = 0.25
//! easing = "ease_in_out"
//!
//! [transitions.popup]
//! kind = "fade"
//! duration_secs = 0.15
//!
//! [[screens]]
//! key = "Gameplay"
//! show_hud = true
//! uses_player_input = true
//!
//! [[screens]]
//! key = "Loading"
//! exclude_from_history = true
//!
//! [[overrides]]
//! from = "MainMenu"
//! to = "Settings"
//! transition = { kind = "instant" }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::animation::Transition;
use crate::ids::ScreenId;

/// Key of the HUD screen when nothing else is configured
pub const DEFAULT_HUD_KEY: &str = "HUD";

/// Environment variable forcing instant transitions
pub const ENV_REDUCE_MOTION: &str = "NAVIGATOR_REDUCE_MOTION";

/// Environment variable replacing the fallback screen (empty disables it)
pub const ENV_FALLBACK_SCREEN: &str = "NAVIGATOR_FALLBACK_SCREEN";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Default transitions section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionsToml {
    /// Transition between screens when no override matches
    pub screen: Option<Transition>,

    /// Transition for popups
    pub popup: Option<Transition>,
}

/// One `[[screens]]` entry
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenToml {
    /// Screen key
    pub key: String,

    /// Show the HUD while this screen is current
    pub show_hud: bool,

    /// Gameplay input is live while this screen is current
    pub uses_player_input: bool,

    /// Never record this screen in the back history
    pub exclude_from_history: bool,
}

/// One `[[overrides]]` entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideToml {
    /// Key of the screen being left
    pub from: String,

    /// Key of the screen being entered
    pub to: String,

    /// Transition used for this pair
    pub transition: Transition,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationToml {
    /// Key of the HUD screen
    pub hud_screen: Option<String>,

    /// Screen used by back navigation when history is empty (empty = none)
    pub fallback_screen: Option<String>,

    /// Force every transition to be instant
    pub reduce_motion: Option<bool>,

    /// Default transitions
    pub transitions: TransitionsToml,

    /// Per-screen behavior
    pub screens: Vec<ScreenToml>,

    /// Transition overrides for specific screen pairs
    pub overrides: Vec<OverrideToml>,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Behavior flags for one screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBehavior {
    /// Show the HUD while this screen is current
    pub show_hud: bool,

    /// Gameplay input is live while this screen is current
    pub uses_player_input: bool,

    /// Never record this screen in the back history
    pub exclude_from_history: bool,
}

impl ScreenBehavior {
    /// A gameplay screen: HUD on, player input
    #[must_use]
    pub const fn gameplay() -> Self {
        Self {
            show_hud: true,
            uses_player_input: true,
            exclude_from_history: false,
        }
    }

    /// Mark as excluded from history
    #[must_use]
    pub const fn excluded_from_history(mut self) -> Self {
        self.exclude_from_history = true;
        self
    }
}

/// Immutable navigation lookup table
#[derive(Clone, Debug)]
pub struct NavigationConfig {
    screens: HashMap<String, ScreenBehavior>,
    overrides: HashMap<(String, String), Transition>,
    default_screen_transition: Option<Transition>,
    default_popup_transition: Option<Transition>,
    hud_screen: ScreenId,
    fallback_screen: Option<ScreenId>,
    reduce_motion: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            screens: HashMap::new(),
            overrides: HashMap::new(),
            default_screen_transition: None,
            default_popup_transition: None,
            hud_screen: ScreenId::from(DEFAULT_HUD_KEY),
            fallback_screen: Some(ScreenId::from(DEFAULT_HUD_KEY)),
            reduce_motion: false,
        }
    }
}

impl NavigationConfig {
    /// Configuration with built-in defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed TOML document, validating it
    pub fn from_toml(doc: NavigationToml) -> Result<Self, ConfigError> {
        validate(&doc)?;

        let mut config = Self::default();

        if let Some(hud) = doc.hud_screen {
            config.hud_screen = ScreenId::from(hud);
        }
        if let Some(fallback) = doc.fallback_screen {
            config.fallback_screen = (!fallback.is_empty()).then(|| ScreenId::from(fallback));
        }
        config.reduce_motion = doc.reduce_motion.unwrap_or(false);
        config.default_screen_transition = doc.transitions.screen;
        config.default_popup_transition = doc.transitions.popup;

        for screen in doc.screens {
            config.screens.insert(
                screen.key,
                ScreenBehavior {
                    show_hud: screen.show_hud,
                    uses_player_input: screen.uses_player_input,
                    exclude_from_history: screen.exclude_from_history,
                },
            );
        }
        for over in doc.overrides {
            config.overrides.insert((over.from, over.to), over.transition);
        }

        Ok(config)
    }

    /// Parse and validate a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let doc: NavigationToml = toml::from_str(content)?;
        Self::from_toml(doc)
    }

    /// Set behavior flags for a screen
    #[must_use]
    pub fn with_screen(mut self, key: impl Into<String>, behavior: ScreenBehavior) -> Self {
        self.screens.insert(key.into(), behavior);
        self
    }

    /// Set the transition for one `(from, to)` screen pair
    #[must_use]
    pub fn with_override(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        transition: Transition,
    ) -> Self {
        self.overrides.insert((from.into(), to.into()), transition);
        self
    }

    /// Set the default screen transition
    #[must_use]
    pub fn with_screen_transition(mut self, transition: Transition) -> Self {
        self.default_screen_transition = Some(transition);
        self
    }

    /// Set the popup transition
    #[must_use]
    pub fn with_popup_transition(mut self, transition: Transition) -> Self {
        self.default_popup_transition = Some(transition);
        self
    }

    /// Set the HUD screen key
    #[must_use]
    pub fn with_hud_screen(mut self, key: impl Into<String>) -> Self {
        self.hud_screen = ScreenId::new(key);
        self
    }

    /// Set (or clear) the fallback screen for back navigation
    #[must_use]
    pub fn with_fallback_screen(mut self, key: Option<&str>) -> Self {
        self.fallback_screen = key.filter(|k| !k.is_empty()).map(ScreenId::from);
        self
    }

    /// Force every transition to be instant
    #[must_use]
    pub fn with_reduce_motion(mut self, reduce_motion: bool) -> Self {
        self.reduce_motion = reduce_motion;
        self
    }

    /// Behavior flags of a screen, if configured
    #[must_use]
    pub fn screen_behavior(&self, id: &ScreenId) -> Option<&ScreenBehavior> {
        self.screens.get(id.as_str())
    }

    /// Override registered for exactly this pair
    #[must_use]
    pub fn transition_override(&self, from: &ScreenId, to: &ScreenId) -> Option<Transition> {
        self.overrides
            .get(&(from.as_str().to_owned(), to.as_str().to_owned()))
            .copied()
    }

    /// Transition to use from `from` to `to`: pair override, then the
    /// default screen transition, then instant
    #[must_use]
    pub fn screen_transition(&self, from: &ScreenId, to: &ScreenId) -> Transition {
        let transition = self
            .transition_override(from, to)
            .or(self.default_screen_transition);
        self.resolve(transition)
    }

    /// Default screen transition (used for HUD toggles)
    #[must_use]
    pub fn default_screen_transition(&self) -> Transition {
        self.resolve(self.default_screen_transition)
    }

    /// Transition used for every popup
    #[must_use]
    pub fn popup_transition(&self) -> Transition {
        self.resolve(self.default_popup_transition)
    }

    fn resolve(&self, transition: Option<Transition>) -> Transition {
        match transition {
            Some(t) if !self.reduce_motion => t,
            _ => Transition::instant(),
        }
    }

    /// Key of the HUD screen
    #[must_use]
    pub fn hud_screen(&self) -> &ScreenId {
        &self.hud_screen
    }

    /// Whether `id` names the HUD
    #[must_use]
    pub fn is_hud(&self, id: &ScreenId) -> bool {
        *id == self.hud_screen
    }

    /// Screen used by back navigation when history is empty
    #[must_use]
    pub fn fallback_screen(&self) -> Option<&ScreenId> {
        self.fallback_screen.as_ref()
    }

    /// Whether every transition is forced to be instant
    #[must_use]
    pub fn reduce_motion(&self) -> bool {
        self.reduce_motion
    }

    /// Whether `id` should show the HUD (unconfigured screens: no)
    #[must_use]
    pub fn shows_hud(&self, id: &ScreenId) -> bool {
        !id.is_none() && self.screen_behavior(id).is_some_and(|b| b.show_hud)
    }

    /// Whether entering `id` should hide the HUD
    ///
    /// Unconfigured screens leave the HUD alone; "none" always hides it.
    #[must_use]
    pub fn hides_hud(&self, id: &ScreenId) -> bool {
        id.is_none() || self.screen_behavior(id).is_some_and(|b| !b.show_hud)
    }

    /// Whether gameplay input should be live while `id` is current
    #[must_use]
    pub fn uses_player_input(&self, id: &ScreenId) -> bool {
        self.screen_behavior(id).is_some_and(|b| b.uses_player_input)
    }

    /// Whether `id` is never recorded in history
    #[must_use]
    pub fn excluded_from_history(&self, id: &ScreenId) -> bool {
        self.screen_behavior(id).is_some_and(|b| b.exclude_from_history)
    }

    /// Apply environment (or other) overrides on top of this config
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(reduce_motion) = overrides.reduce_motion {
            debug!(reduce_motion, "reduce_motion overridden");
            self.reduce_motion = reduce_motion;
        }
        if let Some(fallback) = &overrides.fallback_screen {
            debug!(fallback = %fallback, "fallback screen overridden");
            self = self.with_fallback_screen(Some(fallback.as_str()));
        }
        self
    }
}

fn validate(doc: &NavigationToml) -> Result<(), ConfigError> {
    let check_transition = |what: &str, t: &Transition| {
        if t.duration_secs.is_finite() && t.duration_secs >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(format!(
                "{what}: duration_secs must be a finite, non-negative number (got {})",
                t.duration_secs
            )))
        }
    };

    if let Some(t) = &doc.transitions.screen {
        check_transition("transitions.screen", t)?;
    }
    if let Some(t) = &doc.transitions.popup {
        check_transition("transitions.popup", t)?;
    }
    if doc.hud_screen.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "hud_screen must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for screen in &doc.screens {
        if screen.key.is_empty() {
            return Err(ConfigError::ValidationError(
                "screens: key must not be empty".to_string(),
            ));
        }
        if !seen.insert(screen.key.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "screens: duplicate key '{}'",
                screen.key
            )));
        }
    }

    let mut pairs = HashSet::new();
    for over in &doc.overrides {
        let what = format!("overrides[{} -> {}]", over.from, over.to);
        check_transition(&what, &over.transition)?;
        if !pairs.insert((over.from.as_str(), over.to.as_str())) {
            return Err(ConfigError::ValidationError(format!("{what}: duplicate pair")));
        }
    }

    Ok(())
}

// =============================================================================
// Overrides and Loading
// =============================================================================

/// Values taking priority over the configuration file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Force instant transitions
    pub reduce_motion: Option<bool>,

    /// Replacement fallback screen key (empty disables the fallback)
    pub fallback_screen: Option<String>,
}

impl ConfigOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let reduce_motion = match lookup(ENV_REDUCE_MOTION) {
            Some(raw) => Some(parse_bool(ENV_REDUCE_MOTION, &raw)?),
            None => None,
        };

        Ok(Self {
            reduce_motion,
            fallback_screen: lookup(ENV_FALLBACK_SCREEN),
        })
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reduce_motion.is_none() && self.fallback_screen.is_none()
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ValidationError(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

/// Default configuration file path
///
/// `None` when no config directory can be determined for this platform.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("navigator").join("navigation.toml"))
}

/// Load configuration from a specific file
pub fn load_config_from_path(path: &Path) -> Result<NavigationConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let config = NavigationConfig::from_toml_str(&content)?;
    info!(path = %path.display(), "navigation config loaded");
    Ok(config)
}

/// Load configuration from the default path, then apply `overrides`
///
/// A missing default file yields the built-in defaults.
pub fn load_config(overrides: &ConfigOverrides) -> Result<NavigationConfig, ConfigError> {
    let config = match default_config_path() {
        Some(path) if path.exists() => load_config_from_path(&path)?,
        Some(path) => {
            debug!(path = %path.display(), "no navigation config file, using defaults");
            NavigationConfig::default()
        }
        None => NavigationConfig::default(),
    };
    Ok(config.with_overrides(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{EasingFunction, TransitionKind};

    const SAMPLE: &str = r#"
        hud_screen = "Overlay"
        fallback_screen = "MainMenu"

        [transitions.screen]
        kind = "fade"
        duration_secs = 0.3
        easing = "ease_out_cubic"

        [[screens]]
        key = "Gameplay"
        show_hud = true
        uses_player_input = true

        [[screens]]
        key = "Loading"
        exclude_from_history = true

        [[overrides]]
        from = "MainMenu"
        to = "Settings"
        transition = { kind = "instant" }
    "#;

    #[test]
    fn test_defaults() {
        let config = NavigationConfig::default();
        assert_eq!(config.hud_screen().as_str(), "HUD");
        assert_eq!(config.fallback_screen().map(ScreenId::as_str), Some("HUD"));
        assert!(config.screen_transition(&ScreenId::from("A"), &ScreenId::from("B")).is_instant());
        assert!(config.popup_transition().is_instant());
    }

    #[test]
    fn test_parse_sample() {
        let config = NavigationConfig::from_toml_str(SAMPLE).unwrap();

        assert!(config.is_hud(&ScreenId::from("Overlay")));
        assert_eq!(config.fallback_screen(), Some(&ScreenId::from("MainMenu")));
        assert!(config.uses_player_input(&ScreenId::from("Gameplay")));
        assert!(config.shows_hud(&ScreenId::from("Gameplay")));
        assert!(config.excluded_from_history(&ScreenId::from("Loading")));
        assert!(config.hides_hud(&ScreenId::from("Loading")));
        assert!(!config.hides_hud(&ScreenId::from("Unconfigured")));
        assert!(config.hides_hud(&ScreenId::none()));

        let default = config.screen_transition(&ScreenId::from("Gameplay"), &ScreenId::from("Loading"));
        assert_eq!(default.kind, TransitionKind::Fade);
        assert_eq!(default.easing, EasingFunction::EaseOutCubic);

        let over = config.screen_transition(&ScreenId::from("MainMenu"), &ScreenId::from("Settings"));
        assert!(over.is_instant());

        // Overrides are directional
        let reverse = config.screen_transition(&ScreenId::from("Settings"), &ScreenId::from("MainMenu"));
        assert!(!reverse.is_instant());
    }

    #[test]
    fn test_empty_fallback_disables_it() {
        let config = NavigationConfig::from_toml_str("fallback_screen = \"\"").unwrap();
        assert!(config.fallback_screen().is_none());
    }

    #[test]
    fn test_reduce_motion_forces_instant() {
        let config = NavigationConfig::from_toml_str(SAMPLE)
            .unwrap()
            .with_reduce_motion(true);
        assert!(config
            .screen_transition(&ScreenId::from("Gameplay"), &ScreenId::from("Loading"))
            .is_instant());
    }

    #[test]
    fn test_validation_rejects_negative_duration() {
        let err = NavigationConfig::from_toml_str("[transitions.popup]\nduration_secs = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let dup_screens = "[[screens]]\nkey = \"A\"\n[[screens]]\nkey = \"A\"\n";
        assert!(matches!(
            NavigationConfig::from_toml_str(dup_screens),
            Err(ConfigError::ValidationError(_))
        ));

        let dup_pairs = r#"
            [[overrides]]
            from = "A"
            to = "B"
            transition = { kind = "instant" }
            [[overrides]]
            from = "A"
            to = "B"
            transition = { duration_secs = 1.0 }
        "#;
        assert!(matches!(
            NavigationConfig::from_toml_str(dup_pairs),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = NavigationConfig::from_toml_str("screens = 5").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let overrides = ConfigOverrides::from_lookup(|name| match name {
            ENV_REDUCE_MOTION => Some("yes".to_string()),
            ENV_FALLBACK_SCREEN => Some(String::new()),
            _ => None,
        })
        .unwrap();

        assert_eq!(overrides.reduce_motion, Some(true));
        let config = NavigationConfig::default().with_overrides(&overrides);
        assert!(config.reduce_motion());
        assert!(config.fallback_screen().is_none());
    }

    #[test]
    fn test_overrides_reject_bad_bool() {
        let result = ConfigOverrides::from_lookup(|name| {
            (name == ENV_REDUCE_MOTION).then(|| "sometimes".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
