//! View Capability Contract
//!
//! The navigation core never looks inside a view. It only needs a handful of
//! lifecycle hooks and a way to produce a view for an identifier. `P` is the
//! application's payload type, typically an enum with one variant per kind
//! of data a view can be opened with.

use std::collections::HashMap;
use std::fmt;

use crate::ids::{PopupId, ScreenId};

/// A full-page view managed by the screen handler
pub trait Screen<P> {
    /// Called once, right after the loader produced the view
    fn on_initialize(&mut self, _id: &ScreenId) {}

    /// Called when the view finished appearing without a payload
    fn on_show(&mut self) {}

    /// Called when the view finished appearing with a payload
    fn on_show_with(&mut self, _payload: &P) {
        self.on_show();
    }

    /// Called when the view starts disappearing
    fn on_hide(&mut self) {}

    /// Called once when the owning handler is torn down
    fn on_dispose(&mut self) {}
}

/// A modal view managed by the popup handler
pub trait Popup<P> {
    /// Called once, right after the loader produced the view
    fn on_initialize(&mut self, _id: &PopupId) {}

    /// Called when the popup finished appearing without a payload
    fn on_show(&mut self) {}

    /// Called when the popup finished appearing with a payload
    fn on_show_with(&mut self, _payload: &P) {
        self.on_show();
    }

    /// Called when the popup finished disappearing
    fn on_dismiss(&mut self) {}

    /// Called once when the owning handler is torn down
    fn on_dispose(&mut self) {}
}

/// Produces screens by identifier
///
/// Returning `None` means the identifier cannot be resolved; navigation to it
/// has no visual effect.
pub trait ScreenLoader<P> {
    /// Create the screen for `id`
    fn load(&mut self, id: &ScreenId) -> Option<Box<dyn Screen<P>>>;
}

/// Produces popups by identifier
pub trait PopupLoader<P> {
    /// Create the popup for `id`
    fn load(&mut self, id: &PopupId) -> Option<Box<dyn Popup<P>>>;
}

impl<P, F> ScreenLoader<P> for F
where
    F: FnMut(&ScreenId) -> Option<Box<dyn Screen<P>>>,
{
    fn load(&mut self, id: &ScreenId) -> Option<Box<dyn Screen<P>>> {
        self(id)
    }
}

impl<P, F> PopupLoader<P> for F
where
    F: FnMut(&PopupId) -> Option<Box<dyn Popup<P>>>,
{
    fn load(&mut self, id: &PopupId) -> Option<Box<dyn Popup<P>>> {
        self(id)
    }
}

type ScreenCtor<P> = Box<dyn FnMut() -> Box<dyn Screen<P>>>;
type PopupCtor<P> = Box<dyn FnMut() -> Box<dyn Popup<P>>>;

/// Lookup table of view constructors keyed by identifier
///
/// ```ignore
/// let screens = ViewRegistry::new()
///     .with_screen("MainMenu", || Box::new(MainMenu::default()))
///     .with_screen("Settings", || Box::new(Settings::default()));
/// ```
pub struct ViewRegistry<P> {
    screens: HashMap<String, ScreenCtor<P>>,
    popups: HashMap<String, PopupCtor<P>>,
}

impl<P> ViewRegistry<P> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            screens: HashMap::new(),
            popups: HashMap::new(),
        }
    }

    /// Register a screen constructor
    #[must_use]
    pub fn with_screen(
        mut self,
        key: impl Into<String>,
        ctor: impl FnMut() -> Box<dyn Screen<P>> + 'static,
    ) -> Self {
        self.screens.insert(key.into(), Box::new(ctor));
        self
    }

    /// Register a popup constructor
    #[must_use]
    pub fn with_popup(
        mut self,
        key: impl Into<String>,
        ctor: impl FnMut() -> Box<dyn Popup<P>> + 'static,
    ) -> Self {
        self.popups.insert(key.into(), Box::new(ctor));
        self
    }

    /// Whether a screen constructor is registered for `key`
    #[must_use]
    pub fn has_screen(&self, key: &str) -> bool {
        self.screens.contains_key(key)
    }

    /// Whether a popup constructor is registered for `key`
    #[must_use]
    pub fn has_popup(&self, key: &str) -> bool {
        self.popups.contains_key(key)
    }

    /// Separate into a screen-only and a popup-only registry
    #[must_use]
    pub fn split(self) -> (Self, Self) {
        (
            Self {
                screens: self.screens,
                popups: HashMap::new(),
            },
            Self {
                screens: HashMap::new(),
                popups: self.popups,
            },
        )
    }
}

impl<P> Default for ViewRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ViewRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut screens: Vec<_> = self.screens.keys().collect();
        screens.sort();
        let mut popups: Vec<_> = self.popups.keys().collect();
        popups.sort();
        f.debug_struct("ViewRegistry")
            .field("screens", &screens)
            .field("popups", &popups)
            .finish()
    }
}

impl<P> ScreenLoader<P> for ViewRegistry<P> {
    fn load(&mut self, id: &ScreenId) -> Option<Box<dyn Screen<P>>> {
        self.screens.get_mut(id.as_str()).map(|ctor| ctor())
    }
}

impl<P> PopupLoader<P> for ViewRegistry<P> {
    fn load(&mut self, id: &PopupId) -> Option<Box<dyn Popup<P>>> {
        self.popups.get_mut(id.as_str()).map(|ctor| ctor())
    }
}
