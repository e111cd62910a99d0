//! Input Routing
//!
//! The navigator decides *which* input context should be live (UI navigation
//! or gameplay); an [`InputRouter`] supplied by the host decides *how*.
//! Cancel presses travel the other way through a [`CancelHandle`], which the
//! router may trigger from any thread; the navigator drains it on its next
//! tick.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which input context is live
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// UI navigation (menus, popups)
    Ui,
    /// Gameplay / player control
    Player,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => write!(f, "ui"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// Host-side input routing collaborator
pub trait InputRouter {
    /// Make UI navigation the live input context
    fn switch_to_ui(&mut self);

    /// Make gameplay the live input context
    fn switch_to_player(&mut self);

    /// Register the handle to trigger when the cancel control fires
    ///
    /// Called once when the navigator is built. Presses recorded on the
    /// handle are only acted on at the start of the next
    /// [`Navigator::tick`](crate::Navigator::tick), so a host must keep
    /// ticking (or call [`Navigator::handle_cancel`](crate::Navigator::handle_cancel)
    /// itself) for a cancel to take effect.
    fn bind_cancel_action(&mut self, handle: CancelHandle);
}

/// Thread-safe trigger for the navigator's cancel handling
#[derive(Clone, Default)]
pub struct CancelHandle {
    pending: Arc<AtomicU32>,
}

impl CancelHandle {
    /// Create a new handle with nothing pending
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cancel press, handled on the navigator's next tick
    pub fn trigger(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of presses not yet handled
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Take every pending press, resetting the count
    pub(crate) fn drain(&self) -> u32 {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("pending", &self.pending())
            .finish()
    }
}
