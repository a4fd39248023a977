//! Bounded worker pool for embedding computations.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::audio::DecodeLimits;
use crate::config::Config;
use crate::error::{EmbedError, EmbedResult};
use crate::pipeline::{embed_audio, AudioEmbedding};

/// Runs CPU-bound embedding work on the blocking thread pool.
///
/// At most `workers` computations run at once and at most
/// `workers + queue_depth` are admitted; anything beyond that is rejected
/// immediately with [`EmbedError::PoolSaturated`] instead of queueing
/// without bound. Computations share no state, so the pool is cheap to
/// clone and share between request handlers.
#[derive(Debug, Clone)]
pub struct EmbeddingPool {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    capacity: usize,
    limits: DecodeLimits,
}

impl EmbeddingPool {
    #[must_use]
    pub fn new(workers: usize, queue_depth: usize, limits: DecodeLimits) -> Self {
        let workers = workers.max(1);
        let capacity = workers + queue_depth;
        Self {
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(capacity)),
            capacity,
            limits,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.workers, config.queue_depth, config.decode_limits())
    }

    #[must_use]
    pub const fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admission slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.admission.available_permits()
    }

    /// Embed an encoded audio buffer.
    ///
    /// Oversized buffers are rejected before they take a slot.
    pub async fn embed<B>(&self, bytes: B) -> EmbedResult<AudioEmbedding>
    where
        B: AsRef<[u8]> + Send + Sync + 'static,
    {
        self.limits.check_input_size(bytes.as_ref().len())?;
        let limits = self.limits;
        self.run(move || embed_audio(bytes, &limits)).await
    }

    /// Run a blocking job under the pool's limits.
    ///
    /// Dropping the returned future discards the result; the slot is held
    /// until the job itself returns.
    pub async fn run<F, T>(&self, job: F) -> EmbedResult<T>
    where
        F: FnOnce() -> EmbedResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let admitted = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| EmbedError::PoolSaturated {
                capacity: self.capacity,
            })?;

        let worker = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| EmbedError::Worker(e.to_string()))?;

        log::debug!(
            "Embedding job admitted ({} of {} slots free)",
            self.admission.available_permits(),
            self.capacity
        );

        tokio::task::spawn_blocking(move || {
            let _slots = (admitted, worker);
            job()
        })
        .await
        .map_err(|e| EmbedError::Worker(format!("task failed: {e}")))?
    }
}
