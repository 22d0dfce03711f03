use std::sync::Arc;

use tracing::{debug, info, warn};

use common::{MarketData, Notifier};

use crate::AlertRegistry;

/// One-sweep evaluator over all pending alerts.
///
/// The schedule is external: a periodic task (and the `/check_alerts`
/// route) call [`sweep`](AlertEvaluator::sweep) at will. The entry point is
/// idempotent — an alert fires at most once because it is removed from the
/// registry in the same pass, before the next alert is looked at.
pub struct AlertEvaluator {
    registry: AlertRegistry,
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
}

impl AlertEvaluator {
    pub fn new(
        registry: AlertRegistry,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            market,
            notifier,
        }
    }

    /// Evaluate every pending alert once.
    ///
    /// Iterates a snapshot of each subscriber's list; removals are applied
    /// to the live store, so a concurrent `add` can neither be skipped by
    /// this sweep nor double-fired by the next one. Quote fetches and
    /// notification sends happen outside any store lock.
    pub async fn sweep(&self) {
        let subscribers = self.registry.subscribers().await;
        if subscribers.is_empty() {
            debug!("Sweep: no pending alerts");
            return;
        }

        for subscriber_id in subscribers {
            let snapshot = self.registry.pending(&subscriber_id).await;
            for alert in snapshot {
                let quote = match self.market.current_quote(&alert.stock_id).await {
                    Ok(quote) => quote,
                    Err(e) => {
                        // One bad symbol must not abort the sweep; the alert
                        // stays pending for the next tick.
                        warn!(
                            stock_id = %alert.stock_id,
                            error = %e,
                            "Quote fetch failed during sweep — alert kept pending"
                        );
                        continue;
                    }
                };

                debug!(
                    stock_id = %alert.stock_id,
                    price = quote.price,
                    op = %alert.op,
                    target = alert.target,
                    "Checking alert condition"
                );

                if !alert.op.holds(quote.price, alert.target) {
                    continue;
                }

                let text = format!(
                    "📈警示觸發:{}({})現在{}元，已{}{}元",
                    quote.name,
                    alert.stock_id,
                    quote.price,
                    alert.op.in_words(),
                    alert.target
                );

                // Fire-and-forget: a failed send is the notifier's problem,
                // the alert is spent either way.
                if let Err(e) = self.notifier.send_text(&subscriber_id, &text).await {
                    warn!(subscriber_id = %subscriber_id, error = %e, "Alert notification failed");
                }

                self.registry.remove(&subscriber_id, &alert).await;
                info!(
                    subscriber_id = %subscriber_id,
                    stock_id = %alert.stock_id,
                    price = quote.price,
                    "Alert fired and retired"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use common::{Alert, AlertOp, Error, PricePoint, Quote, Result, Window};

    /// Fixed price table; unknown ids fail like the real gateway.
    struct FakeMarket {
        prices: HashMap<String, f64>,
    }

    impl FakeMarket {
        fn with_prices(pairs: &[(&str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                prices: pairs
                    .iter()
                    .map(|(id, p)| ((*id).to_string(), *p))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl MarketData for FakeMarket {
        async fn current_quote(&self, stock_id: &str) -> Result<Quote> {
            let price = self
                .prices
                .get(stock_id)
                .copied()
                .ok_or_else(|| Error::UnknownSymbol(stock_id.to_string()))?;
            Ok(Quote {
                stock_id: stock_id.to_string(),
                name: format!("股票{stock_id}"),
                price,
            })
        }

        async fn daily_closes(&self, _stock_id: &str, _window: Window) -> Result<Vec<PricePoint>> {
            Ok(Vec::new())
        }
    }

    /// Records every push; optionally fails every send.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_text(&self, subscriber_id: &str, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Notify("connection reset".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((subscriber_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn send_text_with_chart(
            &self,
            subscriber_id: &str,
            text: &str,
            _chart: &common::ChartHandle,
        ) -> Result<()> {
            self.send_text(subscriber_id, text).await
        }
    }

    fn alert(stock_id: &str, op: AlertOp, target: f64) -> Alert {
        Alert {
            stock_id: stock_id.into(),
            op,
            target,
        }
    }

    #[tokio::test]
    async fn satisfied_alert_fires_once_and_is_retired() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;

        let sent = notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "u1");
        assert!(sent[0].1.contains("2330"));
        assert!(sent[0].1.contains("高於"));
        assert!(registry.pending("u1").await.is_empty());
    }

    #[tokio::test]
    async fn second_sweep_sends_nothing_more() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;
        evaluator.sweep().await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsatisfied_alert_stays_pending() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;
        registry.add("u1", alert("2330", AlertOp::Below, 700.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 750.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;

        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(registry.pending("u1").await.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_skips_that_alert_but_fires_the_rest() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("9999", AlertOp::Above, 1.0)).await; // unknown id
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;
        registry.add("u2", alert("2317", AlertOp::Below, 120.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0), ("2317", 100.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
        // The unreachable alert is still pending, the fired ones are gone.
        let remaining = registry.pending("u1").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].stock_id, "9999");
        assert!(registry.pending("u2").await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_alerts_each_fire_and_retire_independently() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
        assert!(registry.pending("u1").await.is_empty());
    }

    #[tokio::test]
    async fn alert_is_retired_even_when_the_send_fails() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;

        let notifier = Arc::new(RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0)]),
            notifier,
        );

        evaluator.sweep().await;

        assert!(registry.pending("u1").await.is_empty());
    }

    #[tokio::test]
    async fn add_during_sweep_survives_for_the_next_sweep() {
        let registry = AlertRegistry::in_memory();
        registry.add("u1", alert("2330", AlertOp::Above, 800.0)).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            registry.clone(),
            FakeMarket::with_prices(&[("2330", 805.0), ("2317", 100.0)]),
            notifier.clone(),
        );

        evaluator.sweep().await;
        // Registered after the first sweep's snapshot was taken.
        registry.add("u1", alert("2317", AlertOp::Below, 120.0)).await;
        evaluator.sweep().await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
        assert!(registry.pending("u1").await.is_empty());
    }
}
