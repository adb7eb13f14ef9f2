//! Ordered-fallback broadcast relay.
//!
//! A [`BroadcastRelay`] holds the providers for one chain in priority
//! order. Each provider gets exactly one attempt; the first txid wins.
//! When every provider fails the last error is reported.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chain::Chain;
use crate::error::NetworkError;
use crate::traits::BroadcastProvider;
use crate::types::BroadcastOutcome;

/// Broadcast fallback chain for a single chain.
#[derive(Clone)]
pub struct BroadcastRelay {
    chain: Chain,
    providers: Vec<Arc<dyn BroadcastProvider>>,
    /// Reason reported when the chain has no broadcast support.
    unsupported: Option<String>,
}

impl BroadcastRelay {
    /// A relay trying `providers` in order.
    pub fn new(chain: Chain, providers: Vec<Arc<dyn BroadcastProvider>>) -> Self {
        Self {
            chain,
            providers,
            unsupported: None,
        }
    }

    /// A relay that refuses every broadcast with `reason`.
    pub fn unsupported(chain: Chain, reason: impl Into<String>) -> Self {
        Self {
            chain,
            providers: Vec::new(),
            unsupported: Some(reason.into()),
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Provider names in attempt order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Try each provider in turn and return the first reported txid.
    pub async fn try_broadcast(&self, raw_hex: &str) -> Result<String, NetworkError> {
        if let Some(reason) = &self.unsupported {
            return Err(NetworkError::Unsupported(reason.clone()));
        }
        if self.providers.is_empty() {
            return Err(NetworkError::Unsupported(format!(
                "no broadcast providers configured for {}",
                self.chain
            )));
        }

        let mut last_error = String::new();
        for provider in &self.providers {
            debug!(chain = %self.chain, provider = provider.name(), "Broadcasting");
            match provider.broadcast(raw_hex).await {
                Ok(txid) => {
                    info!(
                        chain = %self.chain,
                        provider = provider.name(),
                        %txid,
                        "Broadcast accepted"
                    );
                    return Ok(txid);
                }
                Err(e) => {
                    warn!(
                        chain = %self.chain,
                        provider = provider.name(),
                        error = %e,
                        "Broadcast failed, trying next"
                    );
                    last_error = format!("{}: {e}", provider.name());
                }
            }
        }
        Err(NetworkError::AllProvidersFailed(last_error))
    }

    /// [`try_broadcast`](Self::try_broadcast) folded into a structured outcome.
    pub async fn broadcast(&self, raw_hex: &str) -> BroadcastOutcome {
        match self.try_broadcast(raw_hex).await {
            Ok(txid) => BroadcastOutcome::accepted(txid),
            Err(e) => BroadcastOutcome::failed(e.to_string()),
        }
    }
}

impl std::fmt::Debug for BroadcastRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastRelay")
            .field("chain", &self.chain)
            .field("providers", &self.provider_names())
            .field("unsupported", &self.unsupported)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        name: &'static str,
        result: Result<String, NetworkError>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn ok(name: &'static str, txid: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(txid.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, err: NetworkError) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Err(err),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BroadcastProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn broadcast(&self, _raw_hex: &str) -> Result<String, NetworkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn first_success_wins() {
        let a = MockProvider::failing("a", NetworkError::Timeout);
        let b = MockProvider::ok("b", "txid-b");
        let c = MockProvider::ok("c", "txid-c");
        let relay = BroadcastRelay::new(Chain::Ltc, vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(relay.try_broadcast("00").await.unwrap(), "txid-b");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 0, "providers after the first success are not tried");
    }

    #[tokio::test]
    async fn all_failed_reports_last_error() {
        let a = MockProvider::failing("a", NetworkError::Timeout);
        let b = MockProvider::failing("b", NetworkError::Rejected("bad-txns".into()));
        let relay = BroadcastRelay::new(Chain::Ltc, vec![a.clone(), b.clone()]);

        let err = relay.try_broadcast("00").await.unwrap_err();
        assert_eq!(
            err,
            NetworkError::AllProvidersFailed("b: rejected by provider: bad-txns".into())
        );
        assert_eq!(
            err.to_string(),
            "All broadcast methods failed. Last error: b: rejected by provider: bad-txns"
        );
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn unsupported_relay_never_calls_out() {
        let relay =
            BroadcastRelay::unsupported(Chain::Eth, "Ethereum broadcasting not yet implemented");
        let outcome = relay.broadcast("00").await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("unsupported: Ethereum broadcasting not yet implemented")
        );
    }

    #[tokio::test]
    async fn outcome_carries_txid() {
        let relay = BroadcastRelay::new(Chain::Btc, vec![MockProvider::ok("only", "abc")]);
        let outcome = relay.broadcast("00").await;
        assert_eq!(outcome, BroadcastOutcome::accepted("abc"));
        assert_eq!(relay.provider_names(), vec!["only"]);
    }

    #[tokio::test]
    async fn empty_relay_is_unsupported() {
        let relay = BroadcastRelay::new(Chain::Btc, vec![]);
        assert!(matches!(
            relay.try_broadcast("00").await,
            Err(NetworkError::Unsupported(_))
        ));
    }
}
