//! Worker offloading
//!
//! `run_on(pool)` moves the following map/filter onto blocking worker
//! threads. Up to `pool.size()` elements are processed concurrently, and
//! results are released strictly in upstream order through a
//! `ReorderBuffer`.

use std::fmt::Display;
use std::sync::Arc;

use contracts::{FlowError, StageKind};
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::reorder::ReorderBuffer;
use crate::sequence::{ItemStream, Sequence};

/// Bounded pool of worker threads
///
/// Clones share the same permits, so stages on one pool compete for the
/// same capacity.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: Arc<str>,
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool running at most `size` tasks at once (minimum 1)
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name: Arc::from(name.into()),
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Elastic pool for blocking work: ten workers per core
    pub fn bounded_elastic() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new("bounded-elastic", cores * 10)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by running tasks
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

type Outcome<R> = Result<Option<R>, FlowError>;
type Task<T, R> = Arc<dyn Fn(T, &str) -> Outcome<R> + Send + Sync>;

/// A sequence whose next map/filter runs on a worker pool
pub struct OnWorker<T> {
    sequence: Sequence<T>,
    pool: WorkerPool,
}

impl<T: Send + 'static> OnWorker<T> {
    pub(crate) fn new(sequence: Sequence<T>, pool: WorkerPool) -> Self {
        Self { sequence, pool }
    }

    /// Transform each element on the pool
    pub fn map<R, F>(self, f: F) -> Sequence<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.offload(StageKind::Map, move |item, _| Ok(Some(f(item))))
    }

    /// Fallible transform on the pool; the first error terminates
    pub fn try_map<R, E, F>(self, f: F) -> Sequence<R>
    where
        R: Send + 'static,
        E: Display,
        F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    {
        self.offload(StageKind::Map, move |item, label| {
            f(item)
                .map(Some)
                .map_err(|e| FlowError::transform(label, e.to_string()))
        })
    }

    /// Evaluate `predicate` on the pool
    pub fn filter<P>(self, predicate: P) -> Sequence<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.offload(StageKind::Filter, move |item, _| {
            Ok(predicate(&item).then_some(item))
        })
    }

    /// Evaluate a fallible `predicate` on the pool
    pub fn try_filter<P, E>(self, predicate: P) -> Sequence<T>
    where
        P: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
        E: Display,
    {
        self.offload(StageKind::Filter, move |item, label| {
            match predicate(&item) {
                Ok(keep) => Ok(keep.then_some(item)),
                Err(e) => Err(FlowError::transform(label, e.to_string())),
            }
        })
    }

    fn offload<R, F>(self, kind: StageKind, task: F) -> Sequence<R>
    where
        R: Send + 'static,
        F: Fn(T, &str) -> Outcome<R> + Send + Sync + 'static,
    {
        let task: Task<T, R> = Arc::new(task);
        let pool = self.pool;
        self.sequence
            .mark(StageKind::RunOn)
            .chain_stage(kind, move |upstream, label| {
                OrderedWorkers::new(upstream, pool.clone(), Arc::clone(&task), label).into_stream()
            })
    }
}

/// Per-run state of an offloaded stage
struct OrderedWorkers<T, R> {
    upstream: ItemStream<T>,
    upstream_done: bool,
    finished: bool,
    pool: WorkerPool,
    task: Task<T, R>,
    label: Arc<str>,
    in_flight: JoinSet<(u64, Outcome<R>)>,
    reorder: ReorderBuffer<Outcome<R>>,
    next_seq: u64,
}

impl<T: Send + 'static, R: Send + 'static> OrderedWorkers<T, R> {
    fn new(upstream: ItemStream<T>, pool: WorkerPool, task: Task<T, R>, label: &str) -> Self {
        Self {
            upstream,
            upstream_done: false,
            finished: false,
            pool,
            task,
            label: Arc::from(label),
            in_flight: JoinSet::new(),
            reorder: ReorderBuffer::new(),
            next_seq: 0,
        }
    }

    fn into_stream(self) -> ItemStream<R> {
        stream::unfold(self, |mut state| async move {
            let item = state.next_item().await?;
            Some((item, state))
        })
        .boxed()
    }

    async fn next_item(&mut self) -> Option<Result<R, FlowError>> {
        if self.finished {
            return None;
        }

        loop {
            while let Some(outcome) = self.reorder.pop_ready() {
                match outcome {
                    Ok(Some(value)) => return Some(Ok(value)),
                    // filtered out
                    Ok(None) => continue,
                    Err(error) => return Some(Err(self.fail(error))),
                }
            }

            if !self.upstream_done && self.in_flight.len() < self.pool.size() {
                match self.upstream.next().await {
                    Some(Ok(item)) => {
                        if let Err(error) = self.submit(item).await {
                            return Some(Err(self.fail(error)));
                        }
                    }
                    Some(Err(error)) => {
                        // released after every earlier element
                        let seq = self.take_seq();
                        self.reorder.insert(seq, Err(error));
                        self.upstream_done = true;
                    }
                    None => self.upstream_done = true,
                }
                continue;
            }

            match self.in_flight.join_next().await {
                Some(Ok((seq, outcome))) => {
                    trace!(stage = %self.label, seq, "worker finished");
                    self.reorder.insert(seq, outcome);
                }
                Some(Err(join_error)) => {
                    let error = FlowError::worker(self.label.as_ref(), join_error.to_string());
                    return Some(Err(self.fail(error)));
                }
                None => {
                    debug!(
                        stage = %self.label,
                        pool = self.pool.name(),
                        reorder_high_water = self.reorder.high_water(),
                        "offloaded stage drained"
                    );
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn fail(&mut self, error: FlowError) -> FlowError {
        self.finished = true;
        self.in_flight.abort_all();
        error
    }

    async fn submit(&mut self, item: T) -> Result<(), FlowError> {
        let permit = Arc::clone(&self.pool.permits)
            .acquire_owned()
            .await
            .map_err(|_| FlowError::worker(self.label.as_ref(), "worker pool closed"))?;

        let seq = self.take_seq();
        let task = Arc::clone(&self.task);
        let label = Arc::clone(&self.label);
        trace!(stage = %self.label, seq, "submitting to worker");

        self.in_flight.spawn_blocking(move || {
            let _permit = permit;
            (seq, task(item, &label))
        });
        Ok(())
    }
}
