//! Fade Timing
//!
//! Easing curves and the tick-driven opacity fade applied to a view's
//! [`ViewSurface`]. Fades advance by unscaled elapsed time handed in by the
//! host on every tick; nothing here owns a clock.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::Transition;

/// Easing curves for fades
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// Constant speed
    Linear,

    /// Quadratic, slow start
    EaseIn,

    /// Quadratic, slow end
    EaseOut,

    /// Quadratic, slow start and end
    #[default]
    EaseInOut,

    /// Cubic, slow start
    EaseInCubic,

    /// Cubic, slow end
    EaseOutCubic,

    /// Cubic, slow start and end
    EaseInOutCubic,

    /// Overshoot then settle
    EaseOutBack,

    /// Bounce at the end
    EaseOutBounce,

    /// Spring at the end
    EaseOutElastic,
}

impl EasingFunction {
    /// Map normalized progress (clamped to 0.0..=1.0) to an interpolation factor
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseOutBack => {
                let c1 = 1.701_58;
                let c3 = c1 + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u.powi(3) + c1 * u.powi(2)
            }
            Self::EaseOutBounce => {
                const N1: f32 = 7.5625;
                const D1: f32 = 2.75;

                if t < 1.0 / D1 {
                    N1 * t * t
                } else if t < 2.0 / D1 {
                    let t = t - 1.5 / D1;
                    N1 * t * t + 0.75
                } else if t < 2.5 / D1 {
                    let t = t - 2.25 / D1;
                    N1 * t * t + 0.9375
                } else {
                    let t = t - 2.625 / D1;
                    N1 * t * t + 0.984_375
                }
            }
            Self::EaseOutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * std::f32::consts::PI) / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
        }
    }
}

/// Visibility and interactivity controls of a single view
///
/// This is what a fade drives. Renderers read it; only the owning handler
/// writes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSurface {
    /// Whether the view is activated (part of the scene at all)
    pub active: bool,

    /// Opacity (0.0 = transparent, 1.0 = opaque)
    pub opacity: f32,

    /// Whether the view accepts interaction
    pub interactable: bool,

    /// Whether the view absorbs pointer input aimed at views beneath it
    pub blocks_input: bool,
}

impl ViewSurface {
    /// A freshly created view: deactivated and fully transparent
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            active: false,
            opacity: 0.0,
            interactable: false,
            blocks_input: false,
        }
    }

    /// Whether the surface is at a terminal visible state
    #[must_use]
    pub fn is_fully_shown(&self) -> bool {
        self.active && self.opacity >= 1.0 && self.interactable && self.blocks_input
    }
}

impl Default for ViewSurface {
    fn default() -> Self {
        Self::hidden()
    }
}

/// Direction of a fade
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeDirection {
    /// 0 -> 1, interactive when complete
    In,
    /// 1 -> 0, non-interactive when complete
    Out,
}

impl FadeDirection {
    fn endpoints(self) -> (f32, f32) {
        match self {
            Self::In => (0.0, 1.0),
            Self::Out => (1.0, 0.0),
        }
    }
}

/// An in-progress opacity interpolation
///
/// The fade does not hold on to the surface; the caller passes it in on
/// every step so handlers can keep surfaces inside their caches.
#[derive(Clone, Debug)]
pub struct Fade {
    direction: FadeDirection,
    elapsed: f32,
    duration: f32,
    easing: EasingFunction,
    complete: bool,
}

impl Fade {
    /// Begin a fade on `surface`
    ///
    /// Interactivity is switched off for the duration of the fade. Instant
    /// transitions apply the terminal state before returning.
    pub fn start(direction: FadeDirection, transition: &Transition, surface: &mut ViewSurface) -> Self {
        let (from, _) = direction.endpoints();
        surface.interactable = false;
        surface.blocks_input = false;

        let mut fade = Self {
            direction,
            elapsed: 0.0,
            duration: transition.duration_secs.max(0.0),
            easing: transition.easing,
            complete: false,
        };

        if transition.is_instant() {
            fade.finish(surface);
        } else {
            surface.opacity = from;
        }

        fade
    }

    /// Advance by `delta_secs` of unscaled time
    ///
    /// Returns `true` once the fade has reached its terminal state.
    pub fn advance(&mut self, delta_secs: f32, surface: &mut ViewSurface) -> bool {
        if self.complete {
            return true;
        }

        self.elapsed += delta_secs.max(0.0);
        if self.elapsed >= self.duration {
            self.finish(surface);
            return true;
        }

        let (from, to) = self.direction.endpoints();
        let t = self.easing.apply(self.elapsed / self.duration);
        surface.opacity = from + (to - from) * t;
        trace!(
            direction = ?self.direction,
            progress = self.progress(),
            opacity = surface.opacity,
            "fade step"
        );
        false
    }

    fn finish(&mut self, surface: &mut ViewSurface) {
        let (_, to) = self.direction.endpoints();
        let enable = self.direction == FadeDirection::In;
        surface.opacity = to;
        surface.interactable = enable;
        surface.blocks_input = enable;
        self.complete = true;
    }

    /// Whether the terminal state has been applied
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Linear progress through the fade (0.0 to 1.0)
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.complete || self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Direction of this fade
    #[must_use]
    pub fn direction(&self) -> FadeDirection {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_boundaries() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
            EasingFunction::EaseInOutCubic,
            EasingFunction::EaseOutBack,
            EasingFunction::EaseOutBounce,
            EasingFunction::EaseOutElastic,
        ] {
            assert!(easing.apply(0.0).abs() < 0.001, "{easing:?} at 0.0");
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{easing:?} at 1.0");
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert!((EasingFunction::Linear.apply(2.0) - 1.0).abs() < f32::EPSILON);
        assert!(EasingFunction::Linear.apply(-1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_instant_fade_in_is_terminal_immediately() {
        let mut surface = ViewSurface { active: true, ..ViewSurface::hidden() };
        let fade = Fade::start(FadeDirection::In, &Transition::instant(), &mut surface);

        assert!(fade.is_complete());
        assert!(surface.is_fully_shown());
    }

    #[test]
    fn test_zero_duration_fade_is_instant() {
        let mut surface = ViewSurface { active: true, ..ViewSurface::hidden() };
        let fade = Fade::start(FadeDirection::In, &Transition::fade(0.0), &mut surface);
        assert!(fade.is_complete());
        assert!((surface.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_timed_fade_out_interpolates() {
        let mut surface = ViewSurface {
            active: true,
            opacity: 1.0,
            interactable: true,
            blocks_input: true,
        };
        let transition = Transition::fade(1.0).with_easing(EasingFunction::Linear);
        let mut fade = Fade::start(FadeDirection::Out, &transition, &mut surface);

        assert!(!fade.is_complete());
        assert!(!surface.interactable);
        assert!((surface.opacity - 1.0).abs() < f32::EPSILON);

        assert!(!fade.advance(0.25, &mut surface));
        assert!((surface.opacity - 0.75).abs() < 0.001);
        assert!((fade.progress() - 0.25).abs() < 0.001);

        assert!(fade.advance(0.75, &mut surface));
        assert!(surface.opacity.abs() < f32::EPSILON);
        assert!(!surface.interactable);
        assert!(!surface.blocks_input);
    }

    #[test]
    fn test_fade_in_enables_interaction_on_completion() {
        let mut surface = ViewSurface { active: true, ..ViewSurface::hidden() };
        let mut fade = Fade::start(FadeDirection::In, &Transition::fade(0.5), &mut surface);

        fade.advance(0.3, &mut surface);
        assert!(!surface.interactable);

        fade.advance(0.3, &mut surface);
        assert!(surface.is_fully_shown());
    }
}
