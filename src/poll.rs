//! Polling Scheduler
//!
//! A cancellable repeating fetch task. Ticks are issued on a fixed schedule
//! regardless of whether the previous read has completed, so each read
//! carries the sequence number of the tick that issued it. A completion is
//! published only while the poller is alive and only if its sequence is
//! newer than the last one applied, which gives two guarantees:
//!
//! - published values are applied in strictly increasing tick order; a slow
//!   stale response never overwrites a response from a later tick;
//! - after `stop()` returns, nothing is published, even for reads that were
//!   in flight when the stop happened (liveness flag, not I/O abort).
//!
//! A failed tick is logged and skipped; the next scheduled tick is the
//! retry. Used twice: the metrics snapshot poller and the blocklist poller.

use crate::error::ApiError;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to one repeating poll task.
pub struct Poller {
    name: &'static str,
    alive: Arc<AtomicBool>,
    issued: Arc<AtomicU64>,
    /// Last applied tick sequence. Publishing happens under this lock so
    /// apply order matches sequence order.
    gate: Arc<Mutex<u64>>,
    driver: Option<JoinHandle<()>>,
}

impl Poller {
    /// Begin polling: one fetch immediately, then one per interval.
    ///
    /// `fetch` starts a read; `publish(seq, value)` is invoked for each
    /// accepted completion.
    pub fn start<T, Fetch, Publish>(
        name: &'static str,
        interval: Duration,
        fetch: Fetch,
        publish: Publish,
    ) -> Self
    where
        T: Send + 'static,
        Fetch: Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync + 'static,
        Publish: Fn(u64, T) + Send + Sync + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let issued = Arc::new(AtomicU64::new(0));
        let gate = Arc::new(Mutex::new(0u64));
        let publish = Arc::new(publish);

        let driver = {
            let alive = alive.clone();
            let issued = issued.clone();
            let gate = gate.clone();

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    // First tick completes immediately.
                    ticker.tick().await;
                    if !alive.load(Ordering::Acquire) {
                        break;
                    }

                    let seq = issued.fetch_add(1, Ordering::AcqRel) + 1;
                    let read = fetch();
                    let alive = alive.clone();
                    let gate = gate.clone();
                    let publish = publish.clone();

                    // Spawned so a slow read never delays the schedule.
                    tokio::spawn(async move {
                        match read.await {
                            Ok(value) => {
                                let mut last = match gate.lock() {
                                    Ok(guard) => guard,
                                    Err(poisoned) => poisoned.into_inner(),
                                };
                                if !alive.load(Ordering::Acquire) {
                                    return;
                                }
                                if seq > *last {
                                    *last = seq;
                                    publish(seq, value);
                                }
                            }
                            Err(e) => {
                                log::warn!("[Poll] {} tick {} failed: {}", name, seq, e);
                            }
                        }
                    });
                }
            })
        };

        log::info!("[Poll] {} poller started (interval {:?})", name, interval);

        Self {
            name,
            alive,
            issued,
            gate,
            driver: Some(driver),
        }
    }

    /// Stop polling. Guarantees no publication after this returns: the
    /// liveness flag flips under the publish gate, so any in-flight read
    /// either already published or will observe the flag and drop its
    /// result.
    pub fn stop(&mut self) {
        {
            // Holding the lock (poisoned or not) fences out any in-flight
            // publish while the liveness flag flips.
            let _last = self.gate.lock();
            self.alive.store(false, Ordering::Release);
        }
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        log::info!("[Poll] {} poller stopped", self.name);
    }

    /// Number of ticks issued so far.
    pub fn ticks_issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if self.driver.is_some() {
            self.stop();
        }
    }
}
