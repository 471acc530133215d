//! # Stream Engine
//!
//! Cold, ordered, asynchronous sequences with composable operators.
//!
//! Responsibilities:
//! - Sources: `just`, `range`, `from_iter_fn`, `empty`, `error`
//! - Operators: filter, map, concat, zip, repeat, delay, run-on-worker, log
//! - Subscriptions with lifecycle tracking and cancellation
//! - Declarative `Pipeline` description folded into a `Sequence`
//!
//! Order is preserved end to end, including across worker pools.
//!
//! # Example
//!
//! ```no_run
//! use stream_engine::{Sequence, WorkerPool};
//!
//! # async fn run() -> Result<(), contracts::FlowError> {
//! let upper = Sequence::just(["google", "abc", "stackoverflow"])
//!     .filter(|s| s.len() >= 5)
//!     .run_on(WorkerPool::new("upper", 4))
//!     .map(|s| s.to_uppercase())
//!     .repeat(1)
//!     .collect_list()
//!     .await?;
//! assert_eq!(upper, ["GOOGLE", "STACKOVERFLOW", "GOOGLE", "STACKOVERFLOW"]);
//! # Ok(())
//! # }
//! ```

mod metrics;
mod pipeline;
mod reorder;
mod sequence;
mod signal_log;
mod subscription;
mod worker;

pub use metrics::{MetricsSnapshot, SubscriptionMetrics};
pub use pipeline::{build, Combiner, Pipeline, Predicate, Stage, Transform};
pub use reorder::ReorderBuffer;
pub use sequence::Sequence;
pub use subscription::{Canceller, SubscriberHandle, Subscription};
pub use worker::{OnWorker, WorkerPool};

// Re-export contracts types for convenience
pub use contracts::{FlowError, StageKind, Subscriber, SubscriptionState};
