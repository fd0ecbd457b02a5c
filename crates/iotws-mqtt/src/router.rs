//! Per-topic dispatch of inbound messages.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

/// Callback invoked with the topic and payload of an inbound message.
pub type MessageCallback = Box<dyn FnMut(&str, &[u8])>;

/// Maps topic filters to callbacks.
///
/// Registering a filter twice replaces the earlier callback. Filters may use
/// the MQTT wildcards `+` (one level) and `#` (all remaining levels).
#[derive(Default)]
pub struct SubscriptionRouter {
    handlers: HashMap<String, MessageCallback>,
}

impl SubscriptionRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `filter`. Returns `true` if a previous
    /// callback was replaced.
    pub fn insert(&mut self, filter: impl Into<String>, callback: MessageCallback) -> bool {
        let filter = filter.into();
        debug!(filter = %filter, "Registering subscription callback");
        self.handlers.insert(filter, callback).is_some()
    }

    /// Forget the callback for `filter`. Unknown filters are ignored.
    pub fn remove(&mut self, filter: &str) -> bool {
        self.handlers.remove(filter).is_some()
    }

    /// Whether a callback is registered for exactly `filter`.
    #[must_use]
    pub fn contains(&self, filter: &str) -> bool {
        self.handlers.contains_key(filter)
    }

    /// Number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no filters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke every callback whose filter matches `topic`. Returns how many ran.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> usize {
        let mut delivered = 0;
        for (filter, callback) in &mut self.handlers {
            if topic_matches(filter, topic) {
                callback(topic, payload);
                delivered += 1;
            }
        }
        if delivered == 0 {
            trace!(topic, "No callback for inbound message");
        }
        delivered
    }
}

impl fmt::Debug for SubscriptionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRouter")
            .field("filters", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// MQTT topic filter matching.
///
/// # Examples
///
/// ```
/// use iotws_mqtt::topic_matches;
///
/// assert!(topic_matches("things/+/shadow", "things/lamp/shadow"));
/// assert!(topic_matches("things/#", "things/lamp/shadow/update"));
/// assert!(!topic_matches("things/+", "things/lamp/shadow"));
/// ```
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some(f), Some(t)) if f == "+" || f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
