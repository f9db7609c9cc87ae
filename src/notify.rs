//! Change notifications from the content backend
//!
//! Listeners register a callback per content kind. A notification carries no
//! payload; it only means "re-fetch this kind".

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::content::ContentKind;
use crate::error::AppError;

pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Something that can deliver change notifications
pub trait ChangeNotifier: Send + Sync {
    fn subscribe(&self, kind: ContentKind, callback: ChangeCallback) -> Result<Subscription, AppError>;
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_kind: HashMap<ContentKind, Vec<(u64, ChangeCallback)>>,
}

/// In-process notification hub, fed by the backend webhook
#[derive(Clone, Default)]
pub struct ChangeHub {
    listeners: Arc<Mutex<Listeners>>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every listener of `kind`. Returns how many were called.
    pub fn publish(&self, kind: ContentKind) -> usize {
        // Callbacks run outside the lock so they may subscribe or unsubscribe.
        let callbacks: Vec<ChangeCallback> = lock(&self.listeners)
            .by_kind
            .get(&kind)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        tracing::debug!("Change notification for {} ({} listeners)", kind, callbacks.len());
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn listener_count(&self, kind: ContentKind) -> usize {
        lock(&self.listeners).by_kind.get(&kind).map_or(0, Vec::len)
    }
}

impl ChangeNotifier for ChangeHub {
    fn subscribe(&self, kind: ContentKind, callback: ChangeCallback) -> Result<Subscription, AppError> {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.by_kind.entry(kind).or_default().push((id, callback));

        Ok(Subscription {
            listeners: Arc::downgrade(&self.listeners),
            kind,
            id,
        })
    }
}

/// Live registration; unsubscribes when dropped
pub struct Subscription {
    listeners: Weak<Mutex<Listeners>>,
    kind: ContentKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Same as dropping the handle
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = lock(&listeners);
        if let Some(list) = listeners.by_kind.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, ChangeCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_publish_reaches_only_matching_kind() {
        let hub = ChangeHub::new();
        let (ads_count, ads_cb) = counter();
        let (events_count, events_cb) = counter();
        let _ads = hub.subscribe(ContentKind::Ads, ads_cb).unwrap();
        let _events = hub.subscribe(ContentKind::Events, events_cb).unwrap();

        assert_eq!(hub.publish(ContentKind::Ads), 1);
        assert_eq!(hub.publish(ContentKind::Specials), 0);
        assert_eq!(ads_count.load(Ordering::SeqCst), 1);
        assert_eq!(events_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = ChangeHub::new();
        let (count, cb) = counter();
        let sub = hub.subscribe(ContentKind::Ads, cb).unwrap();
        assert_eq!(sub.kind(), ContentKind::Ads);
        assert_eq!(hub.listener_count(ContentKind::Ads), 1);

        sub.unsubscribe();
        assert_eq!(hub.listener_count(ContentKind::Ads), 0);
        assert_eq!(hub.publish(ContentKind::Ads), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_outliving_hub() {
        let hub = ChangeHub::new();
        let (_, cb) = counter();
        let sub = hub.subscribe(ContentKind::Events, cb).unwrap();
        drop(hub);
        drop(sub);
    }
}
