//! Throttled FIFO job executor.
//!
//! Jobs start in admission order, subject to a concurrency cap, a
//! per-window admission cap, and a per-job timeout. Events are emitted
//! for operational visibility only; nothing consumes them for control
//! flow.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Queue configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    /// Maximum concurrently running jobs
    pub concurrency: usize,
    /// Length of the admission window in milliseconds
    pub interval_ms: u64,
    /// Maximum jobs admitted per window
    pub interval_cap: usize,
    /// Per-job execution timeout in milliseconds
    pub timeout_ms: u64,
    /// How long shutdown waits for a natural drain, in milliseconds
    pub shutdown_grace_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            interval_ms: 10_000,
            interval_cap: 10,
            timeout_ms: 30_000,
            shutdown_grace_ms: 10_000,
        }
    }
}

/// Queue-level failures surfaced to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("job timed out after {0}ms")]
    TimedOut(u64),

    #[error("queue is shut down")]
    Closed,

    #[error("job abandoned before completion")]
    Abandoned,
}

/// Lifecycle notifications, for observers only
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Queued { size: usize, pending: usize },
    Active { size: usize, pending: usize },
    Completed { size: usize, pending: usize, timed_out: bool },
}

type Job = Pin<Box<dyn Future<Output = bool> + Send>>;

/// FIFO executor for search workflows.
///
/// `size()` counts jobs admitted but not yet started; `pending()` counts
/// running jobs. Both are read-only to observers.
pub struct SearchQueue {
    tx: mpsc::UnboundedSender<Job>,
    size: Arc<AtomicUsize>,
    pending: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    events: broadcast::Sender<QueueEvent>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
    shutdown_grace: Duration,
}

impl SearchQueue {
    /// Create the queue and start its dispatcher task
    pub fn new(config: QueueConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let size = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(AtomicUsize::new(0));
        let (events, _) = broadcast::channel(64);

        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let window = Duration::from_millis(config.interval_ms);
        let interval_cap = config.interval_cap.max(1);

        let dispatcher = {
            let size = size.clone();
            let pending = pending.clone();
            let events = events.clone();

            tokio::spawn(async move {
                let mut admissions: VecDeque<Instant> = VecDeque::new();

                while let Some(job) = rx.recv().await {
                    // Sliding-window admission: drop stamps that have aged
                    // out, then wait for the oldest one to expire if the
                    // window is full.
                    loop {
                        let now = Instant::now();
                        while admissions
                            .front()
                            .is_some_and(|t| now.duration_since(*t) >= window)
                        {
                            admissions.pop_front();
                        }
                        if admissions.len() < interval_cap {
                            break;
                        }
                        if let Some(front) = admissions.front() {
                            let wake = *front + window;
                            tokio::time::sleep_until(tokio::time::Instant::from_std(wake)).await;
                        }
                    }

                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };

                    admissions.push_back(Instant::now());
                    size.fetch_sub(1, Ordering::SeqCst);
                    let active = pending.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(
                        "(queue) working on job (size: {}, pending: {})",
                        size.load(Ordering::SeqCst),
                        active
                    );
                    let _ = events.send(QueueEvent::Active {
                        size: size.load(Ordering::SeqCst),
                        pending: active,
                    });

                    let size = size.clone();
                    let pending = pending.clone();
                    let events = events.clone();
                    tokio::spawn(async move {
                        let timed_out = job.await;
                        drop(permit);
                        let remaining = pending.fetch_sub(1, Ordering::SeqCst) - 1;
                        debug!(
                            "(queue) job completed (size: {}, pending: {})",
                            size.load(Ordering::SeqCst),
                            remaining
                        );
                        let _ = events.send(QueueEvent::Completed {
                            size: size.load(Ordering::SeqCst),
                            pending: remaining,
                            timed_out,
                        });
                    });
                }

                debug!("(queue) dispatcher stopped");
            })
        };

        Self {
            tx,
            size,
            pending,
            closed: Arc::new(AtomicBool::new(false)),
            events,
            dispatcher: Mutex::new(Some(dispatcher)),
            timeout: Duration::from_millis(config.timeout_ms),
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
        }
    }

    /// Jobs admitted but not yet started
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Jobs currently running
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether the queue has stopped admitting work
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Run a job through the queue and wait for its result.
    ///
    /// The job starts in admission order once the concurrency and window
    /// caps allow it; its execution is bounded by the per-job timeout.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, QueueError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }

        let job_id = Uuid::new_v4();
        let timeout = self.timeout;
        let timeout_ms = timeout.as_millis() as u64;
        let (result_tx, result_rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(value) => {
                    let _ = result_tx.send(Ok(value));
                    false
                }
                Err(_) => {
                    let _ = result_tx.send(Err(QueueError::TimedOut(timeout_ms)));
                    true
                }
            }
        });

        let queued = self.size.fetch_add(1, Ordering::SeqCst) + 1;
        info!("(queue) job {} queued (size: {})", job_id, queued);
        let _ = self.events.send(QueueEvent::Queued {
            size: queued,
            pending: self.pending(),
        });

        if self.tx.send(job).is_err() {
            self.size.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }

        match result_rx.await {
            Ok(result) => result,
            // The job was dropped before running (shutdown abandoned it)
            Err(_) => Err(QueueError::Abandoned),
        }
    }

    /// Stop admitting jobs and wait up to the grace period for a drain.
    ///
    /// Jobs still queued when the grace period elapses are dropped and
    /// their callers observe `Abandoned`; jobs already running keep
    /// going but nothing waits for them.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.size() + self.pending() > 0 {
            info!(
                "(queue) shutting down; waiting up to {}ms for {} queued / {} active jobs",
                self.shutdown_grace.as_millis(),
                self.size(),
                self.pending()
            );

            let deadline = Instant::now() + self.shutdown_grace;
            while self.size() + self.pending() > 0 {
                if Instant::now() >= deadline {
                    warn!(
                        "(queue) grace period elapsed; abandoning {} queued and {} active jobs",
                        self.size(),
                        self.pending()
                    );
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }

        if let Ok(mut guard) = self.dispatcher.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for SearchQueue {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.dispatcher.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    fn test_config() -> QueueConfig {
        QueueConfig {
            concurrency: 2,
            interval_ms: 1_000,
            interval_cap: 100,
            timeout_ms: 5_000,
            shutdown_grace_ms: 200,
        }
    }

    #[tokio::test]
    async fn never_exceeds_the_concurrency_cap() {
        let queue = Arc::new(SearchQueue::new(test_config()));
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..6)
            .map(|_| {
                let queue = queue.clone();
                let active = active.clone();
                let max_seen = max_seen.clone();
                async move {
                    queue
                        .run(async move {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            active.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                }
            })
            .collect();

        let results = join_all(jobs).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn never_admits_more_than_the_window_cap() {
        let config = QueueConfig {
            concurrency: 10,
            interval_ms: 200,
            interval_cap: 2,
            ..test_config()
        };
        let queue = Arc::new(SearchQueue::new(config));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let jobs: Vec<_> = (0..6)
            .map(|_| {
                let queue = queue.clone();
                let starts = starts.clone();
                async move {
                    queue
                        .run(async move {
                            starts.lock().unwrap().push(Instant::now());
                        })
                        .await
                }
            })
            .collect();
        join_all(jobs).await;

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 6);
        // Within any window of 200ms at most 2 jobs may start, so the
        // third-next admission must be at least one window later.
        for pair in starts.windows(3) {
            let gap = pair[2].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(180), "gap was {gap:?}");
        }
    }

    #[tokio::test]
    async fn starts_jobs_in_admission_order() {
        let config = QueueConfig {
            concurrency: 1,
            ..test_config()
        };
        let queue = Arc::new(SearchQueue::new(config));
        let order = Arc::new(Mutex::new(Vec::new()));

        let jobs: Vec<_> = (0..5)
            .map(|i| {
                let queue = queue.clone();
                let order = order.clone();
                async move {
                    queue
                        .run(async move {
                            order.lock().unwrap().push(i);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        })
                        .await
                }
            })
            .collect();
        join_all(jobs).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn enforces_the_per_job_timeout() {
        let config = QueueConfig {
            timeout_ms: 50,
            ..test_config()
        };
        let queue = SearchQueue::new(config);

        let result = queue
            .run(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                42
            })
            .await;

        assert_eq!(result, Err(QueueError::TimedOut(50)));
    }

    #[tokio::test]
    async fn rejects_jobs_after_shutdown() {
        let queue = SearchQueue::new(test_config());
        queue.shutdown().await;

        let result = queue.run(async { 1 }).await;
        assert_eq!(result, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn shutdown_returns_within_the_grace_period() {
        let config = QueueConfig {
            concurrency: 1,
            timeout_ms: 10_000,
            shutdown_grace_ms: 100,
            ..test_config()
        };
        let queue = Arc::new(SearchQueue::new(config));

        // One job hogs the queue, a second stays queued behind it.
        let q = queue.clone();
        let active = tokio::spawn(async move {
            q.run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await
        });
        let q = queue.clone();
        let queued = tokio::spawn(async move { q.run(async {}).await });

        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        queue.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(1));

        // The queued job never ran: its result channel was dropped.
        assert_eq!(queued.await.unwrap(), Err(QueueError::Abandoned));
        active.abort();
    }

    #[tokio::test]
    async fn emits_lifecycle_events() {
        let queue = SearchQueue::new(test_config());
        let mut events = queue.subscribe();

        queue.run(async {}).await.unwrap();

        let first = events.recv().await.unwrap();
        assert!(matches!(first, QueueEvent::Queued { size: 1, .. }));
        let second = events.recv().await.unwrap();
        assert!(matches!(second, QueueEvent::Active { .. }));
        let third = events.recv().await.unwrap();
        assert!(matches!(third, QueueEvent::Completed { timed_out: false, .. }));
    }
}
