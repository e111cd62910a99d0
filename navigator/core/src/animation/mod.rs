//! Transitions
//!
//! Surface-agnostic description of how a view enters or leaves: either an
//! instant switch or an eased opacity fade over a duration. The navigation
//! handlers turn these descriptors into [`Fade`]s on each view's
//! [`ViewSurface`]; renderers only ever see the resulting surface values.

mod timing;

pub use timing::{EasingFunction, Fade, FadeDirection, ViewSurface};

use serde::{Deserialize, Serialize};

/// Kind of transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Immediate switch
    Instant,
    /// Opacity fade
    #[default]
    Fade,
}

/// Transition descriptor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transition {
    /// Transition kind
    pub kind: TransitionKind,

    /// Duration in seconds (ignored for instant transitions)
    pub duration_secs: f32,

    /// Easing curve applied to fade progress
    pub easing: EasingFunction,
}

impl Transition {
    /// An immediate switch
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            kind: TransitionKind::Instant,
            duration_secs: 0.0,
            easing: EasingFunction::Linear,
        }
    }

    /// An ease-in-out fade over `duration_secs`
    #[must_use]
    pub const fn fade(duration_secs: f32) -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration_secs,
            easing: EasingFunction::EaseInOut,
        }
    }

    /// Set the easing curve
    #[must_use]
    pub const fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Whether this resolves without any tick
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.kind == TransitionKind::Instant || self.duration_secs <= 0.0
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::fade(0.25)
    }
}
