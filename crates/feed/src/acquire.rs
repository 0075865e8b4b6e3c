//! Retry-until-available acquisition over an eventually-consistent feed.
//!
//! The feed reports values as they arrive; after subscribing, each poll
//! returns whatever subset of the requested symbols is available right now.
//! The loop here supplies the retry budget and backoff on top, and treats
//! symbols that never arrive as absent rather than as errors.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use volsig_core::config::AcquireConfig;
use volsig_core::traits::MarketDataFeed;
use volsig_core::types::{GreekSet, Quote};

/// Acquire quotes for every symbol in `symbols`, polling until all have
/// reported or the attempt budget runs out. Symbols still unresolved at the
/// end are absent from the map — callers must treat absence as "unknown".
///
/// Cancelling the token during an inter-poll wait returns the partial map
/// immediately.
pub async fn acquire_quotes<F>(
    feed: &F,
    symbols: &[String],
    config: &AcquireConfig,
    cancel: &CancellationToken,
) -> HashMap<String, Quote>
where
    F: MarketDataFeed + ?Sized,
{
    if symbols.is_empty() {
        return HashMap::new();
    }
    if let Err(e) = feed.subscribe_quotes(symbols).await {
        warn!(error = %e, "Quote subscription failed");
        return HashMap::new();
    }
    acquire_map("quotes", symbols, config, cancel, move |pending| async move {
        feed.poll_quotes(&pending).await
    })
    .await
}

/// Greek counterpart of [`acquire_quotes`]; identical retry semantics.
pub async fn acquire_greeks<F>(
    feed: &F,
    symbols: &[String],
    config: &AcquireConfig,
    cancel: &CancellationToken,
) -> HashMap<String, GreekSet>
where
    F: MarketDataFeed + ?Sized,
{
    if symbols.is_empty() {
        return HashMap::new();
    }
    if let Err(e) = feed.subscribe_greeks(symbols).await {
        warn!(error = %e, "Greek subscription failed");
        return HashMap::new();
    }
    acquire_map("greeks", symbols, config, cancel, move |pending| async move {
        feed.poll_greeks(&pending).await
    })
    .await
}

/// Acquire the first quote observed for a single symbol (used for the
/// underlying at session start). `None` when the budget is exhausted or the
/// wait is cancelled first.
pub async fn acquire_underlying<F>(
    feed: &F,
    symbol: &str,
    config: &AcquireConfig,
    cancel: &CancellationToken,
) -> Option<Quote>
where
    F: MarketDataFeed + ?Sized,
{
    let symbols = vec![symbol.to_string()];
    let mut resolved = acquire_quotes(feed, &symbols, config, cancel).await;
    resolved.remove(symbol)
}

/// Shared poll loop: repeatedly poll the still-pending subset, moving each
/// returned symbol into the result map; stop early the moment nothing is
/// pending.
async fn acquire_map<V, P, Fut>(
    kind: &'static str,
    symbols: &[String],
    config: &AcquireConfig,
    cancel: &CancellationToken,
    mut poll: P,
) -> HashMap<String, V>
where
    P: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<(String, V)>>>,
{
    let mut resolved: HashMap<String, V> = HashMap::with_capacity(symbols.len());
    let mut pending: HashSet<String> = symbols.iter().cloned().collect();

    for attempt in 1..=config.max_attempts {
        let batch: Vec<String> = pending.iter().cloned().collect();
        match poll(batch).await {
            Ok(values) => {
                for (symbol, value) in values {
                    if pending.remove(&symbol) {
                        resolved.insert(symbol, value);
                    }
                }
            }
            // Poll failures count against the budget but never abort.
            Err(e) => warn!(kind, attempt, error = %e, "Poll failed"),
        }

        if pending.is_empty() {
            debug!(kind, attempt, count = resolved.len(), "All symbols resolved");
            return resolved;
        }

        debug!(
            kind,
            attempt,
            max_attempts = config.max_attempts,
            remaining = pending.len(),
            "Symbols still pending"
        );

        if attempt < config.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(kind, remaining = pending.len(), "Acquisition cancelled mid-wait");
                    return resolved;
                }
                _ = tokio::time::sleep(config.poll_interval()) => {}
            }
        }
    }

    warn!(
        kind,
        remaining = pending.len(),
        resolved = resolved.len(),
        "Attempt budget exhausted with symbols unresolved"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Feed whose symbols become available after a scripted number of polls.
    struct ScriptedFeed {
        /// symbol -> (polls before the value appears, quote).
        script: HashMap<String, (u32, Quote)>,
        quote_polls: AtomicU32,
        subscriptions: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedFeed {
        fn new(script: Vec<(&str, u32, Quote)>) -> Self {
            Self {
                script: script
                    .into_iter()
                    .map(|(s, after, q)| (s.to_string(), (after, q)))
                    .collect(),
                quote_polls: AtomicU32::new(0),
                subscriptions: Mutex::new(Vec::new()),
            }
        }

        fn polls(&self) -> u32 {
            self.quote_polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataFeed for ScriptedFeed {
        async fn subscribe_quotes(&self, symbols: &[String]) -> anyhow::Result<()> {
            self.subscriptions.lock().unwrap().push(symbols.to_vec());
            Ok(())
        }

        async fn subscribe_greeks(&self, _symbols: &[String]) -> anyhow::Result<()> {
            Ok(())
        }

        async fn poll_quotes(&self, symbols: &[String]) -> anyhow::Result<Vec<(String, Quote)>> {
            let attempt = self.quote_polls.fetch_add(1, Ordering::SeqCst);
            Ok(symbols
                .iter()
                .filter_map(|s| {
                    self.script.get(s).and_then(|(after, quote)| {
                        (attempt >= *after).then(|| (s.clone(), quote.clone()))
                    })
                })
                .collect())
        }

        async fn poll_greeks(
            &self,
            symbols: &[String],
        ) -> anyhow::Result<Vec<(String, GreekSet)>> {
            Ok(symbols
                .iter()
                .map(|s| {
                    (
                        s.clone(),
                        GreekSet {
                            delta: Some(0.5),
                            ..GreekSet::default()
                        },
                    )
                })
                .collect())
        }
    }

    fn fast_config(max_attempts: u32) -> AcquireConfig {
        AcquireConfig {
            max_attempts,
            poll_interval_secs: 0,
        }
    }

    fn quote(bid: rust_decimal::Decimal, ask: rust_decimal::Decimal) -> Quote {
        Quote::new(Some(bid), Some(ask))
    }

    #[tokio::test]
    async fn resolves_everything_in_one_poll_when_available() {
        let feed = ScriptedFeed::new(vec![
            ("A", 0, quote(dec!(1), dec!(2))),
            ("B", 0, quote(dec!(3), dec!(4))),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];
        let result =
            acquire_quotes(&feed, &symbols, &fast_config(50), &CancellationToken::new()).await;

        assert_eq!(feed.polls(), 1);
        assert_eq!(result.len(), 2);
        assert_eq!(result["A"].mid(), Some(dec!(1.5)));
        assert_eq!(result["B"].mid(), Some(dec!(3.5)));
    }

    #[tokio::test]
    async fn late_symbols_are_picked_up_on_later_polls() {
        let feed = ScriptedFeed::new(vec![
            ("A", 0, quote(dec!(1), dec!(2))),
            ("B", 2, quote(dec!(3), dec!(4))),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];
        let result =
            acquire_quotes(&feed, &symbols, &fast_config(50), &CancellationToken::new()).await;

        assert_eq!(feed.polls(), 3);
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn unresolved_symbols_are_absent_after_budget() {
        let feed = ScriptedFeed::new(vec![
            ("A", 0, quote(dec!(1), dec!(2))),
            // "GHOST" is never in the script.
        ]);
        let symbols = vec!["A".to_string(), "GHOST".to_string()];
        let result =
            acquire_quotes(&feed, &symbols, &fast_config(3), &CancellationToken::new()).await;

        assert_eq!(feed.polls(), 3);
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("A"));
        assert!(!result.contains_key("GHOST"));
    }

    #[tokio::test]
    async fn subscribes_once_for_the_full_set() {
        let feed = ScriptedFeed::new(vec![
            ("A", 0, quote(dec!(1), dec!(2))),
            ("B", 1, quote(dec!(3), dec!(4))),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];
        acquire_quotes(&feed, &symbols, &fast_config(5), &CancellationToken::new()).await;

        let subs = feed.subscriptions.lock().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0], symbols);
    }

    #[tokio::test]
    async fn empty_symbol_set_never_touches_the_feed() {
        let feed = ScriptedFeed::new(vec![]);
        let result =
            acquire_quotes(&feed, &[], &fast_config(50), &CancellationToken::new()).await;
        assert!(result.is_empty());
        assert_eq!(feed.polls(), 0);
        assert!(feed.subscriptions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_returns_partial_results() {
        let feed = ScriptedFeed::new(vec![
            ("A", 0, quote(dec!(1), dec!(2))),
            ("B", 10, quote(dec!(3), dec!(4))),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];
        let cancel = CancellationToken::new();
        cancel.cancel();

        // A long poll interval: only cancellation can end the first wait.
        let config = AcquireConfig {
            max_attempts: 50,
            poll_interval_secs: 60,
        };
        let result = acquire_quotes(&feed, &symbols, &config, &cancel).await;

        assert_eq!(feed.polls(), 1);
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("A"));
    }

    #[tokio::test]
    async fn acquire_underlying_returns_first_quote() {
        let feed = ScriptedFeed::new(vec![("SPX", 1, quote(dec!(5000), dec!(5002)))]);
        let q = acquire_underlying(&feed, "SPX", &fast_config(5), &CancellationToken::new())
            .await
            .expect("quote should resolve");
        assert_eq!(q.mid(), Some(dec!(5001)));
    }

    #[tokio::test]
    async fn acquire_underlying_gives_none_when_budget_exhausted() {
        let feed = ScriptedFeed::new(vec![]);
        let q =
            acquire_underlying(&feed, "SPX", &fast_config(3), &CancellationToken::new()).await;
        assert!(q.is_none());
        assert_eq!(feed.polls(), 3);
    }

    #[tokio::test]
    async fn greeks_resolve_with_same_loop() {
        let feed = ScriptedFeed::new(vec![]);
        let symbols = vec!["A".to_string()];
        let result =
            acquire_greeks(&feed, &symbols, &fast_config(5), &CancellationToken::new()).await;
        assert_eq!(result["A"].delta, Some(0.5));
    }

    /// Feed whose polls always fail.
    struct FailingFeed {
        polls: AtomicU32,
    }

    #[async_trait]
    impl MarketDataFeed for FailingFeed {
        async fn subscribe_quotes(&self, _symbols: &[String]) -> anyhow::Result<()> {
            Ok(())
        }
        async fn subscribe_greeks(&self, _symbols: &[String]) -> anyhow::Result<()> {
            Ok(())
        }
        async fn poll_quotes(&self, _symbols: &[String]) -> anyhow::Result<Vec<(String, Quote)>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("feed offline")
        }
        async fn poll_greeks(
            &self,
            _symbols: &[String],
        ) -> anyhow::Result<Vec<(String, GreekSet)>> {
            anyhow::bail!("feed offline")
        }
    }

    #[tokio::test]
    async fn poll_errors_consume_the_budget_without_aborting() {
        let feed = FailingFeed {
            polls: AtomicU32::new(0),
        };
        let symbols = vec!["A".to_string()];
        let result =
            acquire_quotes(&feed, &symbols, &fast_config(4), &CancellationToken::new()).await;
        assert!(result.is_empty());
        assert_eq!(feed.polls.load(Ordering::SeqCst), 4);
    }
}
