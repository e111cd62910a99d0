//! Popup Handler
//!
//! At most one popup is visible. Requests that arrive while one is visible
//! wait in a priority queue and are served when it is dismissed: higher
//! priority first, then arrival order. A visible popup is never preempted.
//!
//! While any popup is up (or coming up) the modal [`Blocker`] absorbs input
//! aimed at the screens beneath. Back-to-back popups keep the blocker active
//! throughout, so it never flickers between them.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::animation::{Fade, FadeDirection, ViewSurface};
use crate::config::NavigationConfig;
use crate::events::{EventBus, NavigationEvent};
use crate::ids::PopupId;
use crate::view::{Popup, PopupLoader};

/// Full-screen input-absorbing overlay shown beneath popups
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Blocker {
    surface: ViewSurface,
}

impl Blocker {
    /// A deactivated blocker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_active(&mut self, active: bool) {
        self.surface = if active {
            ViewSurface {
                active: true,
                opacity: 1.0,
                interactable: true,
                blocks_input: true,
            }
        } else {
            ViewSurface::hidden()
        };
    }

    /// Whether the blocker is up
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.surface.active
    }

    /// Visibility state for renderers
    #[must_use]
    pub fn surface(&self) -> &ViewSurface {
        &self.surface
    }
}

/// What the navigator should do about input after a popup step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupSettle {
    /// A popup finished opening: UI input
    Opened,
    /// The last popup closed: input follows the current screen
    Idle,
}

struct PendingPopup<P> {
    id: PopupId,
    priority: i32,
    payload: Option<P>,
    order: u64,
}

impl<P> PartialEq for PendingPopup<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P> Eq for PendingPopup<P> {}

impl<P> PartialOrd for PendingPopup<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for PendingPopup<P> {
    /// Max-heap order: higher priority first, then earlier arrival
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

struct CachedPopup<P> {
    id: PopupId,
    view: Box<dyn Popup<P>>,
    surface: ViewSurface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Showing,
    Dismissing,
}

struct PopupSequence<P> {
    generation: u64,
    phase: Phase,
    id: PopupId,
    payload: Option<P>,
    fade: Fade,
}

/// Modal popup state machine with a pending priority queue
pub struct PopupHandler<P> {
    config: Rc<NavigationConfig>,
    loader: Box<dyn PopupLoader<P>>,
    cache: HashMap<String, CachedPopup<P>>,
    pending: BinaryHeap<PendingPopup<P>>,
    next_order: u64,
    blocker: Blocker,
    current: Option<PopupId>,
    sequence: Option<PopupSequence<P>>,
    generation: u64,
}

impl<P: 'static> PopupHandler<P> {
    /// Create a handler with no popup, an empty queue and the given blocker
    pub fn new(config: Rc<NavigationConfig>, loader: Box<dyn PopupLoader<P>>, blocker: Blocker) -> Self {
        Self {
            config,
            loader,
            cache: HashMap::new(),
            pending: BinaryHeap::new(),
            next_order: 0,
            blocker,
            current: None,
            sequence: None,
            generation: 0,
        }
    }

    /// Show `id` now, or queue it if a popup is already visible
    pub fn show_popup(
        &mut self,
        id: PopupId,
        payload: Option<P>,
        priority: i32,
        bus: &mut EventBus,
    ) -> Option<PopupSettle> {
        if let Some(current) = &self.current {
            let order = self.next_order;
            self.next_order += 1;
            debug!(
                popup = %id,
                priority,
                visible = %current,
                queued = self.pending.len() + 1,
                "popup queued"
            );
            self.pending.push(PendingPopup {
                id,
                priority,
                payload,
                order,
            });
            return None;
        }

        self.sequence = None;
        let settle = self.begin_show(id, payload, false);
        settle.or(self.drive(None, bus))
    }

    /// Dismiss the visible popup; the next queued one follows immediately
    pub fn dismiss_popup(&mut self, bus: &mut EventBus) -> Option<PopupSettle> {
        let Some(id) = self.current.clone() else {
            debug!("dismiss with no popup visible");
            return None;
        };

        if let Some(previous) = self.sequence.take() {
            debug!(generation = previous.generation, popup = %previous.id, "popup transition cancelled");
        }

        let transition = self.config.popup_transition();
        let cached = self.cache.get_mut(id.as_str())?;
        let fade = Fade::start(FadeDirection::Out, &transition, &mut cached.surface);
        let generation = self.next_generation();
        debug!(generation, popup = %id, "popup dismiss started");

        self.sequence = Some(PopupSequence {
            generation,
            phase: Phase::Dismissing,
            id,
            payload: None,
            fade,
        });
        self.drive(None, bus)
    }

    /// Advance the in-flight popup transition by `delta_secs`
    pub fn tick(&mut self, delta_secs: f32, bus: &mut EventBus) -> Option<PopupSettle> {
        self.drive(Some(delta_secs), bus)
    }

    /// Tear down every cached popup
    pub fn dispose_all(&mut self) {
        self.sequence = None;
        self.pending.clear();
        self.current = None;
        self.blocker.set_active(false);
        for (_, mut cached) in self.cache.drain() {
            trace!(popup = %cached.id, "dispose");
            cached.view.on_dispose();
        }
    }

    /// The visible popup, if any
    #[must_use]
    pub fn current(&self) -> Option<&PopupId> {
        self.current.as_ref()
    }

    /// Whether a popup is visible (including while it fades in or out)
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Number of queued requests
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Queued requests in the order they will be served
    #[must_use]
    pub fn pending_ids(&self) -> Vec<&PopupId> {
        let mut queued: Vec<_> = self.pending.iter().collect();
        queued.sort_by(|a, b| b.cmp(a));
        queued.into_iter().map(|p| &p.id).collect()
    }

    /// The modal blocker
    #[must_use]
    pub fn blocker(&self) -> &Blocker {
        &self.blocker
    }

    /// Whether the modal blocker is up
    #[must_use]
    pub fn is_blocker_active(&self) -> bool {
        self.blocker.is_active()
    }

    /// Whether a popup transition is in flight
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.sequence.is_some()
    }

    /// Number of cached popup instances
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Visibility state of a cached popup
    #[must_use]
    pub fn surface(&self, id: &PopupId) -> Option<&ViewSurface> {
        self.cache.get(id.as_str()).map(|cached| &cached.surface)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Raise the blocker and start fading `id` in
    ///
    /// Unresolvable identifiers are skipped. When the request came from the
    /// queue, the next queued request is tried instead; once nothing is left
    /// the blocker drops and [`PopupSettle::Idle`] is returned.
    fn begin_show(&mut self, id: PopupId, payload: Option<P>, from_queue: bool) -> Option<PopupSettle> {
        self.blocker.set_active(true);

        let (mut id, mut payload) = (id, payload);
        loop {
            if self.ensure_cached(&id) {
                break;
            }

            warn!(popup = %id, "no popup available for identifier");
            match self.pending.pop() {
                Some(next) if from_queue => {
                    id = next.id;
                    payload = next.payload;
                }
                Some(next) => {
                    self.pending.push(next);
                    self.blocker.set_active(false);
                    return None;
                }
                None => {
                    self.blocker.set_active(false);
                    return from_queue.then_some(PopupSettle::Idle);
                }
            }
        }

        let transition = self.config.popup_transition();
        let cached = self.cache.get_mut(id.as_str())?;
        cached.surface.active = true;
        let fade = Fade::start(FadeDirection::In, &transition, &mut cached.surface);

        let generation = self.next_generation();
        debug!(generation, popup = %id, instant = transition.is_instant(), "popup show started");

        self.current = Some(id.clone());
        self.sequence = Some(PopupSequence {
            generation,
            phase: Phase::Showing,
            id,
            payload,
            fade,
        });
        None
    }

    fn drive(&mut self, mut delta_secs: Option<f32>, bus: &mut EventBus) -> Option<PopupSettle> {
        let mut settle = None;

        while let Some(mut sequence) = self.sequence.take() {
            let finished = match self.cache.get_mut(sequence.id.as_str()) {
                None => true,
                Some(_) if sequence.fade.is_complete() => true,
                Some(cached) => match delta_secs.take() {
                    Some(delta) => sequence.fade.advance(delta, &mut cached.surface),
                    None => false,
                },
            };

            if !finished {
                self.sequence = Some(sequence);
                break;
            }

            match sequence.phase {
                Phase::Showing => {
                    self.finish_show(sequence, bus);
                    settle = Some(PopupSettle::Opened);
                }
                Phase::Dismissing => {
                    self.finish_dismiss(&sequence.id, bus);
                    settle = match self.pending.pop() {
                        Some(next) => {
                            debug!(popup = %next.id, priority = next.priority, "serving queued popup");
                            self.begin_show(next.id, next.payload, true)
                        }
                        None => {
                            self.blocker.set_active(false);
                            Some(PopupSettle::Idle)
                        }
                    };
                }
            }
        }

        settle
    }

    fn finish_show(&mut self, mut sequence: PopupSequence<P>, bus: &mut EventBus) {
        let Some(cached) = self.cache.get_mut(sequence.id.as_str()) else {
            return;
        };

        match sequence.payload.take() {
            Some(payload) => cached.view.on_show_with(&payload),
            None => cached.view.on_show(),
        }
        debug!(generation = sequence.generation, popup = %sequence.id, "popup opened");
        bus.publish(&NavigationEvent::PopupOpened(sequence.id));
    }

    fn finish_dismiss(&mut self, id: &PopupId, bus: &mut EventBus) {
        if let Some(cached) = self.cache.get_mut(id.as_str()) {
            cached.view.on_dismiss();
            cached.surface.active = false;
        }
        self.current = None;
        debug!(popup = %id, pending = self.pending.len(), "popup closed");
        bus.publish(&NavigationEvent::PopupClosed(id.clone()));
    }

    fn ensure_cached(&mut self, id: &PopupId) -> bool {
        if self.cache.contains_key(id.as_str()) {
            return true;
        }

        let Some(mut view) = self.loader.load(id) else {
            return false;
        };

        view.on_initialize(id);
        debug!(popup = %id, cached = self.cache.len() + 1, "popup instantiated");
        self.cache.insert(
            id.as_str().to_owned(),
            CachedPopup {
                id: id.clone(),
                view,
                surface: ViewSurface::hidden(),
            },
        );
        true
    }
}

impl<P> fmt::Debug for PopupHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupHandler")
            .field("current", &self.current)
            .field("pending", &self.pending.len())
            .field("blocker", &self.blocker.is_active())
            .field("transitioning", &self.sequence.is_some())
            .finish_non_exhaustive()
    }
}
