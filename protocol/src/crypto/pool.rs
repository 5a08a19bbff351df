//! # Crypto Worker Pool
//!
//! Proof generation takes hundreds of milliseconds. Running it on the
//! reactor thread would stall every other circuit, so CPU-bound jobs go to
//! tokio's blocking pool, bounded by a semaphore so a burst of payments
//! cannot spawn unbounded threads.
//!
//! Two entry points:
//!
//! - [`CryptoPool::run`] returns a future for callers that await inline.
//! - [`CryptoPool::submit`] posts `(key, result)` into the reactor's event
//!   queue. The reactor keys jobs by circuit and processes completions in
//!   arrival order, so per-circuit ordering stays in the reactor's hands.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

use crate::error::{PaymentError, Result};

/// A job completion delivered back to the reactor.
#[derive(Debug)]
pub struct CryptoCompletion<K, T> {
    /// Whatever the reactor used to tag the job (usually a circuit handle).
    pub key: K,
    /// The job's outcome.
    pub result: Result<T>,
}

/// Bounded pool for CPU-heavy crypto jobs.
#[derive(Clone)]
pub struct CryptoPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl CryptoPool {
    /// Pool allowing at most `workers` concurrent jobs.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Configured bound.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Jobs that could start right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on the blocking pool once a permit is free.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| PaymentError::WorkerPool(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| PaymentError::WorkerPool(format!("crypto job join error: {e}")))?
    }

    /// Run `job` in the background and post its completion to `events`.
    ///
    /// If the reactor has dropped its receiver the result is discarded.
    pub fn submit<K, F, T>(&self, key: K, job: F, events: mpsc::UnboundedSender<CryptoCompletion<K, T>>)
    where
        K: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.clone();
        tokio::spawn(async move {
            let result = pool.run(job).await;
            if events.send(CryptoCompletion { key, result }).is_err() {
                debug!("crypto completion dropped, reactor queue closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha256;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn run_returns_job_result() {
        let pool = CryptoPool::new(2);
        let digest = pool.run(|| Ok(sha256(b"ticket"))).await.unwrap();
        assert_eq!(digest, sha256(b"ticket"));
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn run_propagates_job_errors() {
        let pool = CryptoPool::new(1);
        let err = pool
            .run(|| -> Result<()> { Err(PaymentError::SignatureInvalid) })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::SignatureInvalid));
    }

    #[tokio::test]
    async fn submit_posts_completion_with_key() {
        let pool = CryptoPool::new(2);
        let (tx, mut rx) = mpsc::unbounded_channel();
        pool.submit(7u64, || Ok(41 + 1), tx);
        let done = rx.recv().await.unwrap();
        assert_eq!(done.key, 7);
        assert_eq!(done.result.unwrap(), 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_bound() {
        let pool = CryptoPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
