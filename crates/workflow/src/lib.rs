//! Background housekeeping.
//!
//! The only scheduled job is the keep-alive heartbeat: ping the history store
//! on a fixed interval so idle connections (and free-tier databases that
//! suspend when idle) stay warm.

use chatrelay_core::HistoryStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Counters for heartbeat outcomes.
#[derive(Debug, Default)]
pub struct HeartbeatStats {
    ok: AtomicU64,
    failed: AtomicU64,
}

impl HeartbeatStats {
    pub fn ok(&self) -> u64 {
        self.ok.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Pings a [`HistoryStore`] every `interval`. Failures are logged and the
/// loop keeps going.
pub struct Heartbeat {
    store: Arc<dyn HistoryStore>,
    interval: Duration,
    enabled: bool,
    stats: Arc<HeartbeatStats>,
}

impl Heartbeat {
    pub fn new(store: Arc<dyn HistoryStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            enabled: true,
            stats: Arc::default(),
        }
    }

    pub fn from_config(config: &chatrelay_config::HeartbeatConfig, store: Arc<dyn HistoryStore>) -> Self {
        let minutes = u64::from(config.interval_minutes.max(1));
        let mut heartbeat = Self::new(store, Duration::from_secs(minutes * 60));
        heartbeat.enabled = config.enabled;
        heartbeat
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> Arc<HeartbeatStats> {
        self.stats.clone()
    }

    /// One ping. Returns whether the store answered.
    pub async fn beat(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => {
                self.stats.ok.fetch_add(1, Ordering::Relaxed);
                info!(store = self.store.name(), "Heartbeat ok");
                true
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(store = self.store.name(), error = %e, "Heartbeat failed");
                false
            }
        }
    }

    /// Spawn the heartbeat loop. Returns `None` when disabled.
    ///
    /// The first ping happens one interval after start.
    pub fn start(self) -> Option<tokio::task::JoinHandle<()>> {
        if !self.enabled {
            info!("Heartbeat disabled");
            return None;
        }

        info!(interval_secs = self.interval.as_secs(), "Heartbeat started");
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.beat().await;
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatrelay_core::error::MemoryError;
    use chatrelay_core::message::{ConversationId, Message};
    use std::sync::atomic::AtomicBool;

    /// Store whose ping outcome can be flipped at runtime.
    #[derive(Default)]
    struct FlakyStore {
        down: AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for FlakyStore {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch_history(
            &self,
            _conversation_id: &ConversationId,
            _limit: usize,
        ) -> Result<Vec<Message>, MemoryError> {
            Ok(Vec::new())
        }

        async fn append_history(
            &self,
            _conversation_id: &ConversationId,
            _messages: &[Message],
        ) -> Result<(), MemoryError> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), MemoryError> {
            if self.down.load(Ordering::SeqCst) {
                Err(MemoryError::Storage("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn beat_reports_outcome() {
        let store = Arc::new(FlakyStore::default());
        let heartbeat = Heartbeat::new(store.clone(), Duration::from_secs(60));

        assert!(heartbeat.beat().await);
        store.down.store(true, Ordering::SeqCst);
        assert!(!heartbeat.beat().await);

        let stats = heartbeat.stats();
        assert_eq!(stats.ok(), 1);
        assert_eq!(stats.failed(), 1);
    }

    #[test]
    fn interval_from_config() {
        let config = chatrelay_config::HeartbeatConfig::default();
        let heartbeat = Heartbeat::from_config(&config, Arc::new(FlakyStore::default()));
        assert_eq!(heartbeat.interval(), Duration::from_secs(30 * 60));
    }

    #[tokio::test]
    async fn disabled_heartbeat_does_not_start() {
        let config = chatrelay_config::HeartbeatConfig {
            enabled: false,
            interval_minutes: 5,
        };
        let heartbeat = Heartbeat::from_config(&config, Arc::new(FlakyStore::default()));
        assert!(heartbeat.start().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_beating_through_failures() {
        let store = Arc::new(FlakyStore::default());
        store.down.store(true, Ordering::SeqCst);
        let heartbeat = Heartbeat::new(store.clone(), Duration::from_secs(60));
        let stats = heartbeat.stats();
        let handle = heartbeat.start().unwrap();

        // Nothing before the first interval elapses.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stats.ok() + stats.failed(), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.failed(), 1);

        store.down.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.ok(), 1);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
