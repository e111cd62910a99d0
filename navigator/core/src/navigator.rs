//! Navigator
//!
//! The navigation context: owns one [`ScreenHandler`], one [`PopupHandler`],
//! the [`EventBus`] and the [`LayerStack`], and forwards every public
//! navigation call to the right handler. After each settled transition it
//! decides which input context is live and tells the host's [`InputRouter`].
//!
//! At most one navigator may be alive per UI thread. A second
//! [`NavigatorBuilder::build`] fails with [`NavigatorError::AlreadyActive`]
//! until the first one is shut down or dropped.

use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{load_config_from_path, ConfigError, ConfigOverrides, NavigationConfig};
use crate::events::EventBus;
use crate::ids::{PopupId, ScreenId};
use crate::input::{CancelHandle, InputMode, InputRouter};
use crate::layers::{LayerId, LayerStack, RenderEntry, RenderedView, POPUP_LAYER_Z, SCREEN_LAYER_Z};
use crate::popup::{Blocker, PopupHandler, PopupSettle};
use crate::screen::ScreenHandler;
use crate::view::{PopupLoader, ScreenLoader, ViewRegistry};

thread_local! {
    static ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Errors from constructing a navigator
#[derive(Debug, Error)]
pub enum NavigatorError {
    /// Another navigator is alive on this thread
    #[error("a navigator is already active on this thread")]
    AlreadyActive,

    /// The configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builder for [`Navigator`]
pub struct NavigatorBuilder<P> {
    config: Option<NavigationConfig>,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    screens: Option<Box<dyn ScreenLoader<P>>>,
    popups: Option<Box<dyn PopupLoader<P>>>,
    router: Option<Box<dyn InputRouter>>,
    on_cancel: Option<Box<dyn FnMut()>>,
}

impl<P: 'static> NavigatorBuilder<P> {
    fn new() -> Self {
        Self {
            config: None,
            config_path: None,
            overrides: ConfigOverrides::default(),
            screens: None,
            popups: None,
            router: None,
            on_cancel: None,
        }
    }

    /// Use an already built configuration
    #[must_use]
    pub fn config(mut self, config: NavigationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a TOML file at build time
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Overrides applied on top of the configuration
    #[must_use]
    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Screen instance loader
    #[must_use]
    pub fn screens(mut self, loader: impl ScreenLoader<P> + 'static) -> Self {
        self.screens = Some(Box::new(loader));
        self
    }

    /// Popup instance loader
    #[must_use]
    pub fn popups(mut self, loader: impl PopupLoader<P> + 'static) -> Self {
        self.popups = Some(Box::new(loader));
        self
    }

    /// Use one registry for both screens and popups
    #[must_use]
    pub fn views(self, registry: ViewRegistry<P>) -> Self {
        let (screens, popups) = registry.split();
        self.screens(screens).popups(popups)
    }

    /// Host input router
    #[must_use]
    pub fn input_router(mut self, router: impl InputRouter + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    /// Callback run when cancel fires with no popup visible
    #[must_use]
    pub fn on_cancel(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(callback));
        self
    }

    /// Build the navigator
    ///
    /// # Errors
    ///
    /// Returns [`NavigatorError::Config`] if a configuration file was given
    /// and cannot be loaded, or [`NavigatorError::AlreadyActive`] if another
    /// navigator is alive on this thread.
    pub fn build(self) -> Result<Navigator<P>, NavigatorError> {
        let config = match (self.config_path, self.config) {
            (Some(path), _) => load_config_from_path(&path)?,
            (None, Some(config)) => config,
            (None, None) => NavigationConfig::default(),
        };
        let config = Rc::new(config.with_overrides(&self.overrides));

        if ACTIVE.with(|active| active.replace(true)) {
            warn!("navigator already active, rejecting construction");
            return Err(NavigatorError::AlreadyActive);
        }

        let mut layers = LayerStack::new();
        let screen_layer = layers.create_layer("screens", SCREEN_LAYER_Z);
        let popup_layer = layers.create_layer("popups", POPUP_LAYER_Z);
        layers.set_visible(popup_layer, false);

        let screen_loader: Box<dyn ScreenLoader<P>> = match self.screens {
            Some(loader) => loader,
            None => Box::new(ViewRegistry::<P>::new()),
        };
        let popup_loader: Box<dyn PopupLoader<P>> = match self.popups {
            Some(loader) => loader,
            None => Box::new(ViewRegistry::<P>::new()),
        };

        let cancel = CancelHandle::new();
        let mut router = self.router;
        if let Some(router) = router.as_mut() {
            router.bind_cancel_action(cancel.clone());
        }

        info!(
            hud = %config.hud_screen(),
            fallback = ?config.fallback_screen().map(ScreenId::as_str),
            reduce_motion = config.reduce_motion(),
            router = router.is_some(),
            "navigator initialized"
        );

        Ok(Navigator {
            screens: ScreenHandler::new(Rc::clone(&config), screen_loader),
            popups: PopupHandler::new(Rc::clone(&config), popup_loader, Blocker::new()),
            config,
            events: EventBus::new(),
            router,
            on_cancel: self.on_cancel,
            cancel,
            input_mode: None,
            layers,
            screen_layer,
            popup_layer,
            active: true,
        })
    }
}

impl<P> fmt::Debug for NavigatorBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorBuilder")
            .field("config", &self.config)
            .field("config_path", &self.config_path)
            .field("overrides", &self.overrides)
            .field("router", &self.router.is_some())
            .finish_non_exhaustive()
    }
}

/// The navigation context
pub struct Navigator<P: 'static = ()> {
    config: Rc<NavigationConfig>,
    screens: ScreenHandler<P>,
    popups: PopupHandler<P>,
    events: EventBus,
    router: Option<Box<dyn InputRouter>>,
    on_cancel: Option<Box<dyn FnMut()>>,
    cancel: CancelHandle,
    input_mode: Option<InputMode>,
    layers: LayerStack,
    screen_layer: LayerId,
    popup_layer: LayerId,
    active: bool,
}

impl<P: 'static> Navigator<P> {
    /// Start building a navigator
    #[must_use]
    pub fn builder() -> NavigatorBuilder<P> {
        NavigatorBuilder::new()
    }

    // =========================================================================
    // Screens
    // =========================================================================

    /// Navigate to a screen
    pub fn show_screen(&mut self, id: impl Into<ScreenId>) {
        self.navigate(id.into(), None, false);
    }

    /// Navigate to a screen, handing it a payload
    pub fn show_screen_with(&mut self, id: impl Into<ScreenId>, payload: P) {
        self.navigate(id.into(), Some(payload), false);
    }

    /// Navigate to a screen and forget the back history
    pub fn show_screen_clearing_history(&mut self, id: impl Into<ScreenId>) {
        self.navigate(id.into(), None, true);
    }

    /// Return to the previous screen, or to the fallback screen
    pub fn go_back(&mut self) {
        if self.screens.go_back(&mut self.events) {
            self.route_from_screen();
        }
    }

    /// Fade the HUD in
    pub fn show_hud(&mut self) {
        self.screens.show_hud(&mut self.events);
    }

    /// Fade the HUD out
    pub fn hide_hud(&mut self) {
        self.screens.hide_hud(&mut self.events);
    }

    fn navigate(&mut self, id: ScreenId, payload: Option<P>, clear_history: bool) {
        if self.screens.show_screen(id, payload, clear_history, &mut self.events) {
            self.route_from_screen();
        }
    }

    // =========================================================================
    // Popups
    // =========================================================================

    /// Show a popup, or queue it behind the visible one
    ///
    /// Higher `priority` is served first among queued requests; it never
    /// preempts a visible popup.
    pub fn show_popup(&mut self, id: impl Into<PopupId>, priority: i32) {
        let settle = self.popups.show_popup(id.into(), None, priority, &mut self.events);
        self.settle_popup(settle);
    }

    /// Show or queue a popup, handing it a payload
    pub fn show_popup_with(&mut self, id: impl Into<PopupId>, payload: P, priority: i32) {
        let settle = self
            .popups
            .show_popup(id.into(), Some(payload), priority, &mut self.events);
        self.settle_popup(settle);
    }

    /// Dismiss the visible popup
    pub fn dismiss_popup(&mut self) {
        let settle = self.popups.dismiss_popup(&mut self.events);
        self.settle_popup(settle);
    }

    /// React to the cancel control
    ///
    /// Dismisses the visible popup if there is one, otherwise runs the cancel
    /// callback.
    pub fn handle_cancel(&mut self) {
        if self.popups.is_visible() {
            debug!("cancel: dismissing popup");
            self.dismiss_popup();
        } else if let Some(callback) = self.on_cancel.as_mut() {
            debug!("cancel: running callback");
            callback();
        } else {
            debug!("cancel: nothing to do");
        }
    }

    fn settle_popup(&mut self, settle: Option<PopupSettle>) {
        match settle {
            Some(PopupSettle::Opened) => self.apply_input(InputMode::Ui),
            Some(PopupSettle::Idle) => self.route_from_screen(),
            None => {}
        }
        self.sync_popup_layer();
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Advance every in-flight transition by `delta` of unscaled time
    ///
    /// Cancel presses recorded on the [`CancelHandle`] since the last tick
    /// are handled first.
    pub fn tick(&mut self, delta: Duration) {
        for _ in 0..self.cancel.drain() {
            self.handle_cancel();
        }

        let delta_secs = delta.as_secs_f32();
        if self.screens.tick(delta_secs, &mut self.events) {
            self.route_from_screen();
        }
        let settle = self.popups.tick(delta_secs, &mut self.events);
        self.settle_popup(settle);
    }

    /// Active views back to front, as a renderer should draw them
    #[must_use]
    pub fn render_order(&self) -> Vec<RenderEntry> {
        let mut entries = Vec::new();
        for layer in self.layers.visible_back_to_front() {
            if layer.id == self.screen_layer {
                entries.extend(self.screens.active_screens().map(|(id, surface, is_hud)| RenderEntry {
                    layer: layer.id,
                    view: if is_hud {
                        RenderedView::Hud(id.clone())
                    } else {
                        RenderedView::Screen(id.clone())
                    },
                    surface: *surface,
                }));
            } else if layer.id == self.popup_layer {
                let blocker = self.popups.blocker();
                if blocker.is_active() {
                    entries.push(RenderEntry {
                        layer: layer.id,
                        view: RenderedView::Blocker,
                        surface: *blocker.surface(),
                    });
                }
                let current = self
                    .popups
                    .current()
                    .and_then(|id| self.popups.surface(id).map(|surface| (id, surface)));
                if let Some((id, surface)) = current.filter(|(_, surface)| surface.active) {
                    entries.push(RenderEntry {
                        layer: layer.id,
                        view: RenderedView::Popup(id.clone()),
                        surface: *surface,
                    });
                }
            }
        }
        entries
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Re-evaluate input from the current screen, unless a popup is up
    fn route_from_screen(&mut self) {
        let mode = if self.popups.is_visible() {
            InputMode::Ui
        } else if self.config.uses_player_input(self.screens.current()) {
            InputMode::Player
        } else {
            InputMode::Ui
        };
        self.apply_input(mode);
    }

    fn apply_input(&mut self, mode: InputMode) {
        if self.input_mode != Some(mode) {
            debug!(from = ?self.input_mode, to = %mode, "input mode changed");
        }
        self.input_mode = Some(mode);

        if let Some(router) = self.router.as_mut() {
            match mode {
                InputMode::Ui => router.switch_to_ui(),
                InputMode::Player => router.switch_to_player(),
            }
        }
    }

    fn sync_popup_layer(&mut self) {
        let visible = self.popups.is_visible() || self.popups.is_blocker_active();
        self.layers.set_visible(self.popup_layer, visible);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current screen ("none" before the first navigation)
    #[must_use]
    pub fn current_screen(&self) -> &ScreenId {
        self.screens.current()
    }

    /// Back history, most recent first
    pub fn history(&self) -> impl Iterator<Item = &ScreenId> {
        self.screens.history()
    }

    /// Visible popup, if any
    #[must_use]
    pub fn current_popup(&self) -> Option<&PopupId> {
        self.popups.current()
    }

    /// Whether a popup is visible
    #[must_use]
    pub fn is_popup_visible(&self) -> bool {
        self.popups.is_visible()
    }

    /// Number of queued popup requests
    #[must_use]
    pub fn pending_popups(&self) -> usize {
        self.popups.pending_count()
    }

    /// Whether the modal blocker is up
    #[must_use]
    pub fn is_blocker_active(&self) -> bool {
        self.popups.is_blocker_active()
    }

    /// Whether the HUD is activated
    #[must_use]
    pub fn is_hud_visible(&self) -> bool {
        self.screens.is_hud_visible()
    }

    /// Whether any screen or popup transition is in flight
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.screens.is_transitioning() || self.popups.is_transitioning()
    }

    /// Last input mode applied, `None` before the first settled transition
    #[must_use]
    pub fn input_mode(&self) -> Option<InputMode> {
        self.input_mode
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// The screen handler
    #[must_use]
    pub fn screens(&self) -> &ScreenHandler<P> {
        &self.screens
    }

    /// The popup handler
    #[must_use]
    pub fn popups(&self) -> &PopupHandler<P> {
        &self.popups
    }

    /// Handle the host may trigger to request cancel handling
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Subscribe to or inspect navigation events
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Navigation events
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Dispose every view and release the navigator slot
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        self.screens.dispose_all();
        self.popups.dispose_all();
        self.events.clear();
        ACTIVE.with(|active| active.set(false));
        info!(published = self.events.published_count(), "navigator shut down");
    }
}

impl<P: 'static> Drop for Navigator<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<P: 'static> fmt::Debug for Navigator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("screens", &self.screens)
            .field("popups", &self.popups)
            .field("events", &self.events)
            .field("input_mode", &self.input_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_navigator_is_rejected() {
        let first = Navigator::<()>::builder().build();
        assert!(first.is_ok());

        let second = Navigator::<()>::builder().build();
        assert!(matches!(second, Err(NavigatorError::AlreadyActive)));

        drop(first);
        assert!(Navigator::<()>::builder().build().is_ok());
    }

    #[test]
    fn test_shutdown_releases_slot() {
        let Ok(navigator) = Navigator::<()>::builder().build() else {
            panic!("first navigator should build");
        };
        navigator.shutdown();
        assert!(Navigator::<()>::builder().build().is_ok());
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let result = Navigator::<()>::builder()
            .config_file("/nonexistent/navigation.toml")
            .build();
        assert!(matches!(result, Err(NavigatorError::Config(_))));

        // A failed load must not hold the slot
        assert!(Navigator::<()>::builder().build().is_ok());
    }

    #[test]
    fn test_cancel_without_popup_runs_callback() {
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let Ok(mut navigator) = Navigator::<()>::builder()
            .on_cancel(move || counter.set(counter.get() + 1))
            .build()
        else {
            panic!("navigator should build");
        };

        let handle = navigator.cancel_handle();
        handle.trigger();
        handle.trigger();
        navigator.tick(Duration::ZERO);

        assert_eq!(fired.get(), 2);
        assert_eq!(handle.pending(), 0);
    }
}
