use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use common::Alert;

/// Backing store for pending alerts, keyed by subscriber.
///
/// The in-memory implementation below is the only one today; a durable
/// key-value store is a drop-in replacement — the evaluator and the reply
/// builder only ever see [`AlertRegistry`].
///
/// Implementations must hold their internal lock only for the duration of a
/// single call. Callers do network I/O between calls, never inside one.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Append an alert to a subscriber's list, creating the list if absent.
    /// No dedup: identical alerts coexist and fire independently.
    async fn add(&self, subscriber_id: &str, alert: Alert);

    /// Point-in-time copy of a subscriber's pending alerts, in registration
    /// order. Mutations after the snapshot do not affect it.
    async fn pending(&self, subscriber_id: &str) -> Vec<Alert>;

    /// Remove the first structurally-equal match. Returns whether anything
    /// was removed; removing an absent alert is a no-op.
    async fn remove(&self, subscriber_id: &str, alert: &Alert) -> bool;

    /// Subscribers that currently have at least one pending alert.
    async fn subscribers(&self) -> Vec<String>;
}

/// Process-memory store. Alerts do not survive a restart — a documented
/// limitation, not a bug.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Vec<Alert>>>,
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn add(&self, subscriber_id: &str, alert: Alert) {
        let mut map = self.inner.write().await;
        map.entry(subscriber_id.to_string()).or_default().push(alert);
    }

    async fn pending(&self, subscriber_id: &str) -> Vec<Alert> {
        self.inner
            .read()
            .await
            .get(subscriber_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn remove(&self, subscriber_id: &str, alert: &Alert) -> bool {
        let mut map = self.inner.write().await;
        let Some(list) = map.get_mut(subscriber_id) else {
            return false;
        };
        let Some(idx) = list.iter().position(|a| a == alert) else {
            return false;
        };
        list.remove(idx);
        if list.is_empty() {
            map.remove(subscriber_id);
        }
        true
    }

    async fn subscribers(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }
}

/// Facade over the alert store. All alert access in the codebase goes
/// through this type.
#[derive(Clone)]
pub struct AlertRegistry {
    store: Arc<dyn AlertStore>,
}

impl AlertRegistry {
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::default()))
    }

    pub fn with_store(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, subscriber_id: &str, alert: Alert) {
        info!(
            subscriber_id,
            stock_id = %alert.stock_id,
            op = %alert.op,
            target = alert.target,
            "Alert registered"
        );
        self.store.add(subscriber_id, alert).await;
    }

    pub async fn pending(&self, subscriber_id: &str) -> Vec<Alert> {
        self.store.pending(subscriber_id).await
    }

    pub async fn remove(&self, subscriber_id: &str, alert: &Alert) -> bool {
        self.store.remove(subscriber_id, alert).await
    }

    pub async fn subscribers(&self) -> Vec<String> {
        self.store.subscribers().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AlertOp;

    fn alert(stock_id: &str, target: f64) -> Alert {
        Alert {
            stock_id: stock_id.into(),
            op: AlertOp::Above,
            target,
        }
    }

    #[tokio::test]
    async fn add_creates_list_and_preserves_registration_order() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;
        registry.add("u1", alert("2317", 100.0)).await;

        let pending = registry.pending("u1").await;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].stock_id, "2330");
        assert_eq!(pending[1].stock_id, "2317");
    }

    #[tokio::test]
    async fn identical_alerts_coexist() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;
        registry.add("u1", alert("2330", 800.0)).await;
        assert_eq!(registry.pending("u1").await.len(), 2);
    }

    #[tokio::test]
    async fn remove_takes_only_the_first_structural_match() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;
        registry.add("u1", alert("2330", 800.0)).await;

        assert!(registry.remove("u1", &alert("2330", 800.0)).await);
        assert_eq!(registry.pending("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;

        assert!(registry.remove("u1", &alert("2330", 800.0)).await);
        assert!(!registry.remove("u1", &alert("2330", 800.0)).await);
        assert!(!registry.remove("nobody", &alert("2330", 800.0)).await);
        assert!(registry.pending("u1").await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_is_unaffected_by_later_mutation() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;

        let snapshot = registry.pending("u1").await;
        registry.add("u1", alert("2317", 100.0)).await;
        registry.remove("u1", &alert("2330", 800.0)).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].stock_id, "2330");
    }

    #[tokio::test]
    async fn drained_subscribers_disappear_from_the_subscriber_list() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", 800.0)).await;
        assert_eq!(registry.subscribers().await, vec!["u1".to_string()]);

        registry.remove("u1", &alert("2330", 800.0)).await;
        assert!(registry.subscribers().await.is_empty());
    }
}
