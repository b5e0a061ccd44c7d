//! Subscriber identity and callbacks

use std::sync::{mpsc, Arc};

use crate::event::EventEnvelope;

/// Identity of a subscriber: an opaque target name plus a callback name.
///
/// Two registrations with the same identity in the same category are the
/// same registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId {
    target: String,
    callback: String,
}

impl SubscriberId {
    pub fn new(target: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            callback: callback.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn callback(&self) -> &str {
        &self.callback
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.target, self.callback)
    }
}

type Callback = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

/// A subscriber: identity plus the code to run for each delivered envelope.
///
/// Callbacks run on the host execution context, one envelope at a time.
#[derive(Clone)]
pub struct SubscriberHandle {
    id: SubscriberId,
    callback: Callback,
}

impl SubscriberHandle {
    pub fn new<F>(id: SubscriberId, callback: F) -> Self
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        Self {
            id,
            callback: Arc::new(callback),
        }
    }

    /// A subscriber that forwards every delivered envelope into a channel
    ///
    /// Delivery stops silently once the receiver is dropped.
    pub fn channel(id: SubscriberId) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel();
        let handle = Self::new(id, move |envelope: &EventEnvelope| {
            let _ = tx.send(envelope.clone());
        });
        (handle, rx)
    }

    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    pub(crate) fn deliver(&self, envelope: &EventEnvelope) {
        (self.callback)(envelope)
    }
}

impl std::fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
