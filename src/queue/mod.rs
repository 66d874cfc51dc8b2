use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Backoff/retry policy for a queue. Matches the inbox and outbox pipelines: exponential backoff
/// starting at 1s, capped at 3 attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.pow(attempt.min(16))
    }
}

/// A dequeued unit of work, carrying its idempotency key and attempt count.
pub struct Job<T> {
    pub job_id: String,
    pub payload: T,
    pub attempt: u32,
}

/// A minimal async job queue with `job_id`-keyed deduplication: a job already enqueued or
/// completed under the same id is dropped rather than enqueued again.
///
/// This in-process implementation is sufficient for a single node; a multi-node deployment can
/// swap in a Redis- or database-backed implementation behind the same trait without this crate's
/// inbox/outbox pipelines needing to change.
pub struct Queue<T> {
    sender: mpsc::UnboundedSender<Job<T>>,
    receiver: Mutex<mpsc::UnboundedReceiver<Job<T>>>,
    seen: Mutex<HashSet<String>>,
    policy: RetryPolicy,
}

impl<T: Send + 'static> Queue<T> {
    pub fn new(policy: RetryPolicy) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Arc::new(Self {
            sender,
            receiver: Mutex::new(receiver),
            seen: Mutex::new(HashSet::new()),
            policy,
        })
    }

    /// Enqueue `payload` under `job_id`. Returns `false` without enqueueing if `job_id` was
    /// already seen (in flight or previously completed).
    pub async fn enqueue(&self, job_id: String, payload: T) -> bool {
        let mut seen = self.seen.lock().await;
        if !seen.insert(job_id.clone()) {
            return false;
        }
        drop(seen);
        let _ = self.sender.send(Job {
            job_id,
            payload,
            attempt: 0,
        });
        true
    }

    /// Re-enqueue a job that failed with a transient error, honoring the retry policy's backoff.
    /// Returns `false` if `job.attempt` already exhausted `max_attempts`.
    pub async fn retry(&self, mut job: Job<T>) -> bool {
        if job.attempt + 1 >= self.policy.max_attempts {
            return false;
        }
        let delay = self.policy.backoff_for_attempt(job.attempt);
        job.attempt += 1;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(job);
        });
        true
    }

    /// Receive the next job, waiting if the queue is empty.
    pub async fn recv(&self) -> Option<Job<T>> {
        self.receiver.lock().await.recv().await
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

/// A value that can be scheduled through a [`Queue`] and later re-hydrated by a worker.
pub trait QueuePayload: Serialize + DeserializeOwned + Send + Sync + 'static {}
impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> QueuePayload for T {}

/// Runs a pool of `worker_count` tasks pulling jobs off `queue` and invoking `handle` for each,
/// retrying transient failures per the queue's [`RetryPolicy`] and recording permanent ones.
pub async fn run_workers<T, F, Fut>(
    queue: Arc<Queue<T>>,
    worker_count: usize,
    handle: F,
) -> Vec<tokio::task::JoinHandle<()>>
where
    T: Send + 'static,
    F: Fn(Job<T>) -> Fut + Send + Sync + Clone + 'static,
    Fut: std::future::Future<Output = WorkerOutcome<T>> + Send,
{
    (0..worker_count)
        .map(|_| {
            let queue = queue.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                while let Some(job) = queue.recv().await {
                    let job_id = job.job_id.clone();
                    let attempt = job.attempt;
                    match handle(job).await {
                        WorkerOutcome::Done => {}
                        WorkerOutcome::Retry(job) => {
                            if !queue.retry(job).await {
                                tracing::warn!(job_id, attempt, "job exhausted retry budget");
                            }
                        }
                        WorkerOutcome::Failed => {
                            tracing::warn!(job_id, attempt, "job failed permanently");
                        }
                    }
                }
            })
        })
        .collect()
}

/// What a worker's handler decided to do with a job it just processed.
pub enum WorkerOutcome<T = ()> {
    Done,
    Retry(Job<T>),
    Failed,
}

#[async_trait]
pub trait JobHandler<T>: Send + Sync {
    async fn handle(&self, job: Job<T>) -> WorkerOutcome<T>;
}
