//! Pipeline - declarative description of a sequence
//!
//! A `Pipeline` lists sources and stages as data; `build` folds them into a
//! `Sequence` using the fluent operators.

use std::sync::Arc;
use std::time::Duration;

use contracts::{BoxError, StageKind};
use tracing::{instrument, warn};

use crate::sequence::Sequence;
use crate::worker::WorkerPool;

pub type Predicate<T> = Arc<dyn Fn(&T) -> Result<bool, BoxError> + Send + Sync>;
pub type Transform<T> = Arc<dyn Fn(T) -> Result<T, BoxError> + Send + Sync>;
pub type Combiner<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// One processing step
pub enum Stage<T> {
    Filter(Predicate<T>),
    Map(Transform<T>),
    /// Append another sequence after upstream completes
    Concat(Sequence<T>),
    /// Pair upstream with another sequence by index
    Zip(Sequence<T>, Combiner<T>),
    /// Re-run upstream this many extra times
    Repeat(usize),
    /// Withhold every element for at least this long
    Delay(Duration),
    /// Run the immediately following Map/Filter on this pool
    RunOn(WorkerPool),
}

impl<T> Stage<T> {
    pub fn filter(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self::Filter(Arc::new(move |value| Ok(predicate(value))))
    }

    pub fn try_filter(
        predicate: impl Fn(&T) -> Result<bool, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::Filter(Arc::new(predicate))
    }

    pub fn map(f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        Self::Map(Arc::new(move |value| Ok(f(value))))
    }

    pub fn try_map(f: impl Fn(T) -> Result<T, BoxError> + Send + Sync + 'static) -> Self {
        Self::Map(Arc::new(f))
    }

    pub fn concat(other: Sequence<T>) -> Self {
        Self::Concat(other)
    }

    pub fn zip(other: Sequence<T>, combiner: impl Fn(T, T) -> T + Send + Sync + 'static) -> Self {
        Self::Zip(other, Arc::new(combiner))
    }

    pub fn repeat(times: usize) -> Self {
        Self::Repeat(times)
    }

    pub fn delay(delay: Duration) -> Self {
        Self::Delay(delay)
    }

    pub fn run_on(pool: WorkerPool) -> Self {
        Self::RunOn(pool)
    }

    pub fn kind(&self) -> StageKind {
        match self {
            Self::Filter(_) => StageKind::Filter,
            Self::Map(_) => StageKind::Map,
            Self::Concat(_) => StageKind::Concat,
            Self::Zip(..) => StageKind::Zip,
            Self::Repeat(_) => StageKind::Repeat,
            Self::Delay(_) => StageKind::Delay,
            Self::RunOn(_) => StageKind::RunOn,
        }
    }
}

/// Sources plus an ordered stage list
pub struct Pipeline<T> {
    sources: Vec<Sequence<T>>,
    stages: Vec<Stage<T>>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Pipeline over `sources`, drained one after another
    pub fn new(sources: Vec<Sequence<T>>) -> Self {
        Self {
            sources,
            stages: Vec::new(),
        }
    }

    pub fn from_source(source: Sequence<T>) -> Self {
        Self::new(vec![source])
    }

    /// Append a stage
    pub fn stage(mut self, stage: Stage<T>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Fold sources and stages into a sequence
    #[instrument(name = "pipeline_build", skip(self), fields(sources = self.sources.len(), stages = self.stages.len()))]
    pub fn build(self) -> Sequence<T> {
        let mut sources = self.sources;
        let mut sequence = if sources.len() == 1 {
            sources.remove(0)
        } else {
            Sequence::concat(sources)
        };

        let mut pending_pool: Option<WorkerPool> = None;
        for stage in self.stages {
            let pool = pending_pool.take();
            sequence = match stage {
                Stage::RunOn(next_pool) => {
                    if let Some(pool) = pool {
                        warn!(pool = pool.name(), "run_on followed by run_on, first one ignored");
                    }
                    pending_pool = Some(next_pool);
                    continue;
                }
                Stage::Filter(predicate) => match pool {
                    Some(pool) => sequence.run_on(pool).try_filter(move |value| predicate(value)),
                    None => sequence.try_filter(move |value| predicate(value)),
                },
                Stage::Map(transform) => match pool {
                    Some(pool) => sequence.run_on(pool).try_map(move |value| transform(value)),
                    None => sequence.try_map(move |value| transform(value)),
                },
                other => {
                    if let Some(pool) = pool {
                        warn!(
                            pool = pool.name(),
                            stage = %other.kind(),
                            "run_on only applies to map/filter, ignored"
                        );
                    }
                    apply_plain(sequence, other)
                }
            };
        }

        if let Some(pool) = pending_pool {
            warn!(pool = pool.name(), "trailing run_on ignored");
        }
        sequence
    }
}

fn apply_plain<T: Send + 'static>(sequence: Sequence<T>, stage: Stage<T>) -> Sequence<T> {
    match stage {
        Stage::Filter(predicate) => sequence.try_filter(move |value| predicate(value)),
        Stage::Map(transform) => sequence.try_map(move |value| transform(value)),
        Stage::Concat(other) => sequence.concat_with(other),
        Stage::Zip(other, combiner) => sequence.zip_with(other, move |a, b| combiner(a, b)),
        Stage::Repeat(times) => sequence.repeat(times),
        Stage::Delay(delay) => sequence.delay_elements(delay),
        Stage::RunOn(_) => sequence,
    }
}

/// Build a sequence from sources and stages
pub fn build<T: Send + 'static>(sources: Vec<Sequence<T>>, stages: Vec<Stage<T>>) -> Sequence<T> {
    stages
        .into_iter()
        .fold(Pipeline::new(sources), Pipeline::stage)
        .build()
}
