use std::sync::Arc;

use classbook_core::{events::ScheduleEvent, models::tenant::TenantCode};
use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of schedule change events, one broadcast channel per tenant.
///
/// Lives in [`ApiState`](crate::ApiState); clones share the same channels.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    channels: Arc<DashMap<TenantCode, broadcast::Sender<ScheduleEvent>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a tenant's events. Creates the channel if needed.
    pub fn add(&self, tenant: &TenantCode) -> Subscription {
        let receiver = self
            .channels
            .entry(tenant.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        debug!("Event subscriber added for tenant {}", tenant);
        Subscription {
            tenant: tenant.clone(),
            receiver: Some(receiver),
            registry: self.clone(),
        }
    }

    /// Drops the tenant's channel once nobody is listening. Returns whether
    /// it was removed.
    pub fn remove(&self, tenant: &TenantCode) -> bool {
        self.channels
            .remove_if(tenant, |_, sender| sender.receiver_count() == 0)
            .is_some()
    }

    /// Sends an event to the tenant's subscribers. No-op if nobody is
    /// listening. Returns the number of subscribers reached.
    pub fn broadcast(&self, tenant: &TenantCode, event: ScheduleEvent) -> usize {
        match self.channels.get(tenant) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscriber_count(&self, tenant: &TenantCode) -> usize {
        self.channels
            .get(tenant)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// A live subscription. Dropping it unregisters the subscriber.
pub struct Subscription {
    tenant: TenantCode,
    receiver: Option<broadcast::Receiver<ScheduleEvent>>,
    registry: ConnectionRegistry,
}

impl Subscription {
    /// Next event, or `None` once the channel is gone. Slow subscribers skip
    /// the events they missed.
    pub async fn recv(&mut self) -> Option<ScheduleEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber for tenant {} skipped {} event(s)", self.tenant, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.take();
        if self.registry.remove(&self.tenant) {
            debug!("Event channel closed for tenant {}", self.tenant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(code: &str) -> TenantCode {
        TenantCode::parse(code).unwrap()
    }

    #[tokio::test]
    async fn subscriber_receives_broadcast() {
        let registry = ConnectionRegistry::new();
        let code = tenant("acme01");
        let mut subscription = registry.add(&code);

        let event = ScheduleEvent::Deleted { ids: vec![4, 5] };
        assert_eq!(registry.broadcast(&code, event.clone()), 1);

        assert_eq!(subscription.recv().await, Some(event));
    }

    #[tokio::test]
    async fn events_stay_within_their_tenant() {
        let registry = ConnectionRegistry::new();
        let _acme = registry.add(&tenant("acme01"));

        let reached = registry.broadcast(&tenant("globex01"), ScheduleEvent::Updated { ids: vec![1] });

        assert_eq!(reached, 0);
    }

    #[test]
    fn dropping_last_subscription_removes_channel() {
        let registry = ConnectionRegistry::new();
        let code = tenant("acme01");
        let first = registry.add(&code);
        let second = registry.add(&code);
        assert_eq!(registry.subscriber_count(&code), 2);

        drop(first);
        assert_eq!(registry.subscriber_count(&code), 1);

        drop(second);
        assert_eq!(registry.subscriber_count(&code), 0);
        assert!(!registry.channels.contains_key(&code));
    }

    #[test]
    fn broadcast_without_subscribers_is_noop() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.broadcast(&tenant("acme01"), ScheduleEvent::Deleted { ids: vec![] }), 0);
    }
}
