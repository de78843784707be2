//! Background flushing of the engine caches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use super::engine::EngineCache;

/// Periodically persists dirty caches and performs one final flush on shutdown.
pub struct CacheFlusher {
    cache: Arc<EngineCache>,
    interval: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    flusher_running: Arc<AtomicBool>,
}

impl CacheFlusher {
    pub fn new(cache: Arc<EngineCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            flusher_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    /// Starts the background flush task (no-op if already running).
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        // AcqRel: only one flusher task may own the running flag.
        if self.flusher_running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let cache = Arc::clone(&self.cache);
        let shutdown_initiated = Arc::clone(&self.shutdown_initiated);
        let flusher_running = Arc::clone(&self.flusher_running);
        let period = self.interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if shutdown_initiated.load(Ordering::Acquire) {
                    break;
                }

                let cache = Arc::clone(&cache);
                match tokio::task::spawn_blocking(move || cache.flush()).await {
                    Ok(written) => debug!(written, "Periodic cache flush"),
                    Err(e) => warn!(error = %e, "Cache flush task panicked"),
                }
            }
            flusher_running.store(false, Ordering::Release);
        })
    }

    /// Stops periodic flushing and flushes once. Idempotent: later calls return 0.
    pub async fn shutdown(&self) -> usize {
        if self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let cache = Arc::clone(&self.cache);
        match tokio::task::spawn_blocking(move || cache.flush()).await {
            Ok(written) => written,
            Err(e) => {
                warn!(error = %e, "Final cache flush panicked");
                0
            }
        }
    }

    /// Synchronous [`shutdown`](Self::shutdown) for contexts that cannot await, such as `Drop`.
    pub fn shutdown_blocking(&self) -> usize {
        if self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.cache.flush()
    }
}
