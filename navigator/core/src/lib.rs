//! Navigator Core - Headless Screen and Popup Navigation
//!
//! This crate decides which full-page screen is visible, keeps the back
//! history, serves modal popups one at a time from a priority queue, and
//! drives the fades between them from a per-frame tick. It never draws
//! anything: views are host objects behind the [`Screen`] and [`Popup`]
//! traits, and renderers read [`Navigator::render_order`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Host                                 │
//! │   frame loop ── tick(dt) ──┐         InputRouter ◄── ui/player   │
//! │   buttons ── show/back ────┤         CancelHandle ──► cancel     │
//! └────────────────────────────┼─────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼─────────────────────────────────────┐
//! │                        NAVIGATOR                                 │
//! │  ┌─────────────────────────┴──────────────────────────────────┐  │
//! │  │  ┌───────────────┐  ┌───────────────┐  ┌────────────────┐  │  │
//! │  │  │ ScreenHandler │  │ PopupHandler  │  │   EventBus     │  │  │
//! │  │  │ history, HUD  │  │ queue,blocker │  │ callbacks/mpsc │  │  │
//! │  │  └───────────────┘  └───────────────┘  └────────────────┘  │  │
//! │  │           NavigationConfig (TOML, env overrides)           │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Navigator`]: the navigation context, built with [`Navigator::builder`]
//! - [`NavigationConfig`]: per-screen behavior and transitions
//! - [`NavigationEvent`]: lifecycle notifications on the [`EventBus`]
//! - [`ViewRegistry`]: keyed constructors for screens and popups
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use navigator_core::{Navigator, NavigationConfig, ScreenBehavior, ViewRegistry};
//!
//! let config = NavigationConfig::default()
//!     .with_screen("Gameplay", ScreenBehavior::gameplay());
//!
//! let mut nav = Navigator::<()>::builder()
//!     .config(config)
//!     .views(ViewRegistry::new().with_screen("MainMenu", || Box::new(MainMenu)))
//!     .build()?;
//!
//! nav.show_screen("MainMenu");
//! loop {
//!     nav.tick(Duration::from_millis(16));
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod events;
pub mod ids;
pub mod input;
pub mod layers;
pub mod navigator;
pub mod popup;
pub mod screen;
pub mod view;

pub use animation::{EasingFunction, Fade, FadeDirection, Transition, TransitionKind, ViewSurface};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    NavigationConfig, NavigationToml, ScreenBehavior,
};
pub use events::{EventBus, NavigationEvent, SubscriptionId};
pub use ids::{PopupId, ScreenId};
pub use input::{CancelHandle, InputMode, InputRouter};
pub use layers::{LayerId, LayerStack, RenderEntry, RenderedView};
pub use navigator::{Navigator, NavigatorBuilder, NavigatorError};
pub use popup::{Blocker, PopupHandler, PopupSettle};
pub use screen::ScreenHandler;
pub use view::{Popup, PopupLoader, Screen, ScreenLoader, ViewRegistry};
