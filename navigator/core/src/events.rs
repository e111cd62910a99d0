//! Navigation Events
//!
//! Lifecycle notifications published by the navigation handlers, and the
//! publish/subscribe registry that delivers them.
//!
//! # Design Philosophy
//!
//! The bus belongs to a [`Navigator`](crate::Navigator) and is torn down with
//! it, so subscribers never outlive the navigation context they observe.
//! Subscribers are either in-thread callbacks or channels for consumers that
//! live on another task:
//!
//! ```text
//!                  EventBus
//!     ┌──────────────────────────────────┐
//!     │ Vec<(SubscriptionId, Subscriber)>│
//!     └───────────────┬──────────────────┘
//!                     │ publish (subscription order)
//!        ┌────────────┼─────────────┐
//!        │            │             │
//!   callback #1   callback #2   mpsc channel
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::ids::{PopupId, ScreenId};

/// Notification published by the navigation handlers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "id", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A screen (or the HUD) finished appearing
    ScreenShown(ScreenId),
    /// A screen (or the HUD) finished disappearing
    ScreenHidden(ScreenId),
    /// A popup finished appearing
    PopupOpened(PopupId),
    /// A popup was dismissed
    PopupClosed(PopupId),
    /// A back navigation started
    BackNavigated,
}

impl NavigationEvent {
    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScreenShown(_) => "screen_shown",
            Self::ScreenHidden(_) => "screen_hidden",
            Self::PopupOpened(_) => "popup_opened",
            Self::PopupClosed(_) => "popup_closed",
            Self::BackNavigated => "back_navigated",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

enum Subscriber {
    Callback(Box<dyn FnMut(&NavigationEvent)>),
    Channel(mpsc::UnboundedSender<NavigationEvent>),
}

/// Publish/subscribe registry for [`NavigationEvent`]s
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
    published: u64,
}

impl EventBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Attach a callback invoked for every published event
    pub fn subscribe(&mut self, callback: impl FnMut(&NavigationEvent) + 'static) -> SubscriptionId {
        let id = self.allocate_id();
        self.subscribers
            .push((id, Subscriber::Callback(Box::new(callback))));
        debug!(subscription = %id, "callback subscribed");
        id
    }

    /// Attach a channel that receives a clone of every published event
    ///
    /// The subscription is dropped automatically once the receiver is gone.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.allocate_id();
        self.subscribers.push((id, Subscriber::Channel(tx)));
        debug!(subscription = %id, "channel subscribed");
        (id, rx)
    }

    /// Detach a subscriber
    ///
    /// Returns `false` if the subscription was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != self.subscribers.len()
    }

    /// Deliver an event to every subscriber, in subscription order
    pub fn publish(&mut self, event: &NavigationEvent) {
        self.published += 1;
        trace!(event = event.name(), subscribers = self.subscribers.len(), "publish");

        self.subscribers.retain_mut(|(id, subscriber)| match subscriber {
            Subscriber::Callback(callback) => {
                callback(event);
                true
            }
            Subscriber::Channel(tx) => {
                let open = tx.send(event.clone()).is_ok();
                if !open {
                    debug!(subscription = %id, "pruning closed channel subscriber");
                }
                open
            }
        });
    }

    /// Number of attached subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total number of events published on this bus
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Detach every subscriber
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("published", &self.published)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_callbacks_receive_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&log);
        bus.subscribe(move |e| first.borrow_mut().push(format!("a:{}", e.name())));
        let second = Rc::clone(&log);
        bus.subscribe(move |e| second.borrow_mut().push(format!("b:{}", e.name())));

        bus.publish(&NavigationEvent::BackNavigated);

        assert_eq!(*log.borrow(), vec!["a:back_navigated", "b:back_navigated"]);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);

        bus.publish(&NavigationEvent::BackNavigated);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&NavigationEvent::BackNavigated);

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_channel_subscriber_receives_and_is_pruned() {
        let mut bus = EventBus::new();
        let (_, mut rx) = bus.subscribe_channel();

        bus.publish(&NavigationEvent::ScreenShown(ScreenId::from("Main")));
        assert_eq!(
            rx.try_recv().ok(),
            Some(NavigationEvent::ScreenShown(ScreenId::from("Main")))
        );

        drop(rx);
        bus.publish(&NavigationEvent::BackNavigated);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&NavigationEvent::PopupOpened(PopupId::from("Quit"))).unwrap();
        assert_eq!(json, r#"{"event":"popup_opened","id":"Quit"}"#);

        let json = serde_json::to_string(&NavigationEvent::BackNavigated).unwrap();
        assert_eq!(json, r#"{"event":"back_navigated"}"#);
    }
}
