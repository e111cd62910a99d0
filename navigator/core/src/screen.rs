//! Screen Handler
//!
//! Owns the current screen, the back history, the HUD, and the cache of
//! screen instances, and runs the show/hide transition sequence.
//!
//! # Transition Sequence
//!
//! Every navigation request builds a [`Sequence`] of steps and replaces any
//! sequence already in flight (newest request wins):
//!
//! ```text
//! HideCurrent ─→ HudOut? ─→ Commit ─→ ShowIncoming ─→ HudIn? ─→ RouteInput
//!   fade out      fade out    history    fade in        fade in     settled
//!   previous      HUD         + current  destination    HUD
//! ```
//!
//! Steps without a fade (or with an instant one) resolve immediately, so a
//! sequence of instant transitions settles inside the request call. Timed
//! fades suspend the sequence until [`ScreenHandler::tick`] has fed them
//! enough time. A cancelled sequence leaves whatever its completed steps
//! committed; the next sequence re-sets every view it touches.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::animation::{Fade, FadeDirection, Transition, ViewSurface};
use crate::config::NavigationConfig;
use crate::events::{EventBus, NavigationEvent};
use crate::ids::ScreenId;
use crate::view::{Screen, ScreenLoader};

struct CachedScreen<P> {
    id: ScreenId,
    view: Box<dyn Screen<P>>,
    surface: ViewSurface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    HideCurrent,
    HudOut,
    Commit,
    ShowIncoming,
    HudIn,
    RouteInput,
}

struct Running {
    step: Step,
    key: String,
    fade: Fade,
}

struct Sequence<P> {
    generation: u64,
    steps: VecDeque<Step>,
    running: Option<Running>,
    transition: Transition,
    destination: ScreenId,
    payload: Option<P>,
    record_history: bool,
    clear_history: bool,
}

/// History-aware screen navigation state machine
pub struct ScreenHandler<P> {
    config: Rc<NavigationConfig>,
    loader: Box<dyn ScreenLoader<P>>,
    cache: HashMap<String, CachedScreen<P>>,
    history: Vec<ScreenId>,
    current_id: ScreenId,
    current_instance: Option<String>,
    sequence: Option<Sequence<P>>,
    generation: u64,
}

impl<P: 'static> ScreenHandler<P> {
    /// Create a handler with an empty history and no current screen
    pub fn new(config: Rc<NavigationConfig>, loader: Box<dyn ScreenLoader<P>>) -> Self {
        Self {
            config,
            loader,
            cache: HashMap::new(),
            history: Vec::new(),
            current_id: ScreenId::none(),
            current_instance: None,
            sequence: None,
            generation: 0,
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Navigate to `id`
    ///
    /// Returns `true` if the sequence settled during this call and input
    /// routing should be re-evaluated.
    pub fn show_screen(
        &mut self,
        id: ScreenId,
        payload: Option<P>,
        clear_history: bool,
        bus: &mut EventBus,
    ) -> bool {
        if id == self.current_id && !id.is_none() {
            debug!(screen = %id, "already current, ignoring");
            return false;
        }

        self.start_navigation(id, payload, clear_history, true, bus)
    }

    /// Navigate to the previous screen in history, or to the fallback screen
    pub fn go_back(&mut self, bus: &mut EventBus) -> bool {
        self.cancel();

        let target = if let Some(previous) = self.history.pop() {
            previous
        } else {
            match self.config.fallback_screen() {
                Some(fallback) if *fallback != self.current_id => fallback.clone(),
                _ => {
                    debug!(current = %self.current_id, "back: no history and no distinct fallback");
                    return false;
                }
            }
        };

        bus.publish(&NavigationEvent::BackNavigated);
        self.start_navigation(target, None, false, false, bus)
    }

    /// Fade the HUD in without touching history or the current screen
    pub fn show_hud(&mut self, bus: &mut EventBus) -> bool {
        self.start_hud_toggle(Step::HudIn, bus)
    }

    /// Fade the HUD out without touching history or the current screen
    pub fn hide_hud(&mut self, bus: &mut EventBus) -> bool {
        self.start_hud_toggle(Step::HudOut, bus)
    }

    /// Advance the in-flight sequence by `delta_secs` of unscaled time
    pub fn tick(&mut self, delta_secs: f32, bus: &mut EventBus) -> bool {
        self.drive(Some(delta_secs), bus)
    }

    /// Abandon the in-flight sequence, keeping whatever it already applied
    pub fn cancel(&mut self) {
        if let Some(sequence) = self.sequence.take() {
            debug!(
                generation = sequence.generation,
                destination = %sequence.destination,
                "screen transition cancelled"
            );
        }
    }

    /// Tear down every cached screen
    pub fn dispose_all(&mut self) {
        self.sequence = None;
        for (_, mut cached) in self.cache.drain() {
            trace!(screen = %cached.id, "dispose");
            cached.view.on_dispose();
        }
        self.current_instance = None;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current screen ("none" before the first navigation)
    #[must_use]
    pub fn current(&self) -> &ScreenId {
        &self.current_id
    }

    /// Back history, most recent first
    pub fn history(&self) -> impl Iterator<Item = &ScreenId> {
        self.history.iter().rev()
    }

    /// Number of history entries
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Whether a sequence is in flight
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.sequence.is_some()
    }

    /// Generation of the most recently started sequence
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the HUD is activated
    #[must_use]
    pub fn is_hud_visible(&self) -> bool {
        self.cache
            .get(self.config.hud_screen().as_str())
            .is_some_and(|hud| hud.surface.active)
    }

    /// Number of cached screen instances
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Visibility state of a cached screen
    #[must_use]
    pub fn surface(&self, id: &ScreenId) -> Option<&ViewSurface> {
        self.cache.get(id.as_str()).map(|cached| &cached.surface)
    }

    /// Activated screens back to front: the HUD first, then the current screen
    pub fn active_screens(&self) -> impl Iterator<Item = (&ScreenId, &ViewSurface, bool)> {
        let hud_key = self.config.hud_screen().as_str();
        let hud = self.cache.get(hud_key);
        let current = self
            .current_instance
            .as_deref()
            .filter(|key| *key != hud_key)
            .and_then(|key| self.cache.get(key));

        hud.map(|c| (c, true))
            .into_iter()
            .chain(current.map(|c| (c, false)))
            .filter(|(c, _)| c.surface.active)
            .map(|(c, is_hud)| (&c.id, &c.surface, is_hud))
    }

    // =========================================================================
    // Sequence construction
    // =========================================================================

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn start_navigation(
        &mut self,
        destination: ScreenId,
        payload: Option<P>,
        clear_history: bool,
        record_history: bool,
        bus: &mut EventBus,
    ) -> bool {
        self.cancel();

        let transition = self.config.screen_transition(&self.current_id, &destination);
        let mut steps = VecDeque::from([Step::HideCurrent]);
        if self.config.hides_hud(&destination) {
            steps.push_back(Step::HudOut);
        }
        steps.push_back(Step::Commit);
        steps.push_back(Step::ShowIncoming);
        if self.config.shows_hud(&destination) {
            steps.push_back(Step::HudIn);
        }
        steps.push_back(Step::RouteInput);

        let generation = self.next_generation();
        debug!(
            generation,
            from = %self.current_id,
            to = %destination,
            instant = transition.is_instant(),
            clear_history,
            "screen transition started"
        );

        self.sequence = Some(Sequence {
            generation,
            steps,
            running: None,
            transition,
            destination,
            payload,
            record_history,
            clear_history,
        });
        self.drive(None, bus)
    }

    fn start_hud_toggle(&mut self, step: Step, bus: &mut EventBus) -> bool {
        self.cancel();

        let generation = self.next_generation();
        debug!(generation, visible = step == Step::HudIn, "HUD toggle started");

        self.sequence = Some(Sequence {
            generation,
            steps: VecDeque::from([step]),
            running: None,
            transition: self.config.default_screen_transition(),
            destination: self.config.hud_screen().clone(),
            payload: None,
            record_history: false,
            clear_history: false,
        });
        self.drive(None, bus)
    }

    // =========================================================================
    // Sequence execution
    // =========================================================================

    /// Run the sequence until it needs more time or finishes
    ///
    /// `delta_secs` feeds only the fade that was already running on entry;
    /// fades started during this call wait for the next tick.
    fn drive(&mut self, mut delta_secs: Option<f32>, bus: &mut EventBus) -> bool {
        let Some(mut sequence) = self.sequence.take() else {
            return false;
        };
        let mut route_input = false;

        loop {
            if let Some(running) = sequence.running.as_mut() {
                let finished = match self.cache.get_mut(&running.key) {
                    None => true,
                    Some(_) if running.fade.is_complete() => true,
                    Some(cached) => match delta_secs.take() {
                        Some(delta) => running.fade.advance(delta, &mut cached.surface),
                        None => false,
                    },
                };

                if !finished {
                    self.sequence = Some(sequence);
                    return route_input;
                }

                if let Some(done) = sequence.running.take() {
                    self.complete_step(&mut sequence, done, bus);
                }
                continue;
            }

            match sequence.steps.pop_front() {
                Some(Step::RouteInput) => route_input = true,
                Some(step) => self.begin_step(&mut sequence, step),
                None => {
                    debug!(
                        generation = sequence.generation,
                        current = %self.current_id,
                        "screen transition settled"
                    );
                    return route_input;
                }
            }
        }
    }

    fn begin_step(&mut self, sequence: &mut Sequence<P>, step: Step) {
        trace!(generation = sequence.generation, ?step, "step");

        match step {
            Step::HideCurrent => {
                let Some(key) = self.current_instance.clone() else {
                    return;
                };
                if let Some(cached) = self.cache.get_mut(&key) {
                    cached.view.on_hide();
                    let fade = Fade::start(FadeDirection::Out, &sequence.transition, &mut cached.surface);
                    sequence.running = Some(Running { step, key, fade });
                }
            }
            Step::HudOut => {
                let hud = self.config.hud_screen().clone();
                if !self.ensure_cached(&hud) {
                    return;
                }
                if let Some(cached) = self.cache.get_mut(hud.as_str()) {
                    if cached.surface.active {
                        cached.view.on_hide();
                        let fade = Fade::start(FadeDirection::Out, &sequence.transition, &mut cached.surface);
                        sequence.running = Some(Running {
                            step,
                            key: hud.as_str().to_owned(),
                            fade,
                        });
                    }
                }
            }
            Step::Commit => self.commit(sequence),
            Step::ShowIncoming => {
                let destination = sequence.destination.clone();
                if destination.is_none() || self.config.is_hud(&destination) {
                    return;
                }
                if !self.ensure_cached(&destination) {
                    return;
                }
                if let Some(cached) = self.cache.get_mut(destination.as_str()) {
                    cached.surface.active = true;
                    let fade = Fade::start(FadeDirection::In, &sequence.transition, &mut cached.surface);
                    self.current_instance = Some(destination.as_str().to_owned());
                    sequence.running = Some(Running {
                        step,
                        key: destination.as_str().to_owned(),
                        fade,
                    });
                }
            }
            Step::HudIn => {
                let hud = self.config.hud_screen().clone();
                if !self.ensure_cached(&hud) {
                    return;
                }
                if let Some(cached) = self.cache.get_mut(hud.as_str()) {
                    if !cached.surface.is_fully_shown() {
                        cached.surface.active = true;
                        let fade = Fade::start(FadeDirection::In, &sequence.transition, &mut cached.surface);
                        sequence.running = Some(Running {
                            step,
                            key: hud.as_str().to_owned(),
                            fade,
                        });
                    }
                }
            }
            Step::RouteInput => {}
        }
    }

    fn commit(&mut self, sequence: &Sequence<P>) {
        let previous = std::mem::replace(&mut self.current_id, sequence.destination.clone());

        if sequence.clear_history {
            self.history.clear();
        } else if sequence.record_history
            && !previous.is_none()
            && !self.config.excluded_from_history(&previous)
        {
            self.history.push(previous);
        }

        trace!(
            current = %self.current_id,
            history = self.history.len(),
            "navigation committed"
        );
    }

    fn complete_step(&mut self, sequence: &mut Sequence<P>, done: Running, bus: &mut EventBus) {
        let Some(cached) = self.cache.get_mut(&done.key) else {
            return;
        };

        match done.step {
            Step::HideCurrent => {
                cached.surface.active = false;
                let id = cached.id.clone();
                if self.current_instance.as_deref() == Some(done.key.as_str()) {
                    self.current_instance = None;
                }
                bus.publish(&NavigationEvent::ScreenHidden(id));
            }
            Step::HudOut => {
                cached.surface.active = false;
                bus.publish(&NavigationEvent::ScreenHidden(cached.id.clone()));
            }
            Step::ShowIncoming => {
                match sequence.payload.take() {
                    Some(payload) => cached.view.on_show_with(&payload),
                    None => cached.view.on_show(),
                }
                bus.publish(&NavigationEvent::ScreenShown(cached.id.clone()));
            }
            Step::HudIn => {
                cached.view.on_show();
                bus.publish(&NavigationEvent::ScreenShown(cached.id.clone()));
            }
            Step::Commit | Step::RouteInput => {}
        }
    }

    /// Look up or create the instance for `id`
    fn ensure_cached(&mut self, id: &ScreenId) -> bool {
        if self.cache.contains_key(id.as_str()) {
            return true;
        }

        let Some(mut view) = self.loader.load(id) else {
            warn!(screen = %id, "no screen available for identifier");
            return false;
        };

        view.on_initialize(id);
        debug!(screen = %id, cached = self.cache.len() + 1, "screen instantiated");
        self.cache.insert(
            id.as_str().to_owned(),
            CachedScreen {
                id: id.clone(),
                view,
                surface: ViewSurface::hidden(),
            },
        );
        true
    }
}

impl<P> fmt::Debug for ScreenHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenHandler")
            .field("current", &self.current_id)
            .field("history", &self.history)
            .field("cached", &self.cache.len())
            .field("transitioning", &self.sequence.is_some())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
