//! In-process realtime change bus.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::infrastructure::ports::{
    ChangeCallback, ChangeEvent, ChangeTopic, RealtimePort, Subscription,
};

struct Registration {
    topic: ChangeTopic,
    callback: ChangeCallback,
}

/// Delivers change events to callbacks registered in this process.
///
/// Callbacks run synchronously on the publishing task and must not block.
#[derive(Default)]
pub struct InProcessRealtime {
    registrations: Arc<DashMap<Uuid, Registration>>,
}

impl InProcessRealtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registrations.len()
    }
}

impl RealtimePort for InProcessRealtime {
    fn subscribe(&self, topic: ChangeTopic, callback: ChangeCallback) -> Subscription {
        let id = Uuid::new_v4();
        tracing::debug!(subscription_id = %id, table = %topic.table, "Realtime subscription registered");
        self.registrations
            .insert(id, Registration { topic, callback });

        let registrations = Arc::downgrade(&self.registrations);
        Subscription::new(id, move || {
            if let Some(registrations) = registrations.upgrade() {
                registrations.remove(&id);
                tracing::debug!(subscription_id = %id, "Realtime subscription cancelled");
            }
        })
    }

    fn publish(&self, event: &ChangeEvent) -> usize {
        // Collect first so callbacks may subscribe or cancel without holding a shard lock.
        let callbacks: Vec<ChangeCallback> = self
            .registrations
            .iter()
            .filter(|entry| entry.topic.matches(event))
            .map(|entry| entry.callback.clone())
            .collect();

        for callback in &callbacks {
            callback(event);
        }

        tracing::debug!(
            table = %event.table,
            record_id = %event.record_id,
            delivered = callbacks.len(),
            "Realtime change published"
        );
        callbacks.len()
    }
}
