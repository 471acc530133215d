//! Sequence - cold, ordered, single-use stream of elements
//!
//! A `Sequence` is a recipe: every subscription (and every `repeat` pass)
//! re-runs the chain from its sources. Operators consume `self`, so a built
//! sequence can be subscribed exactly once.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::Duration;

use contracts::{FlowError, StageKind, Subscriber};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::warn;

use crate::signal_log::SignalLog;
use crate::subscription::{SubscriberHandle, Subscription};
use crate::worker::{OnWorker, WorkerPool};

/// Stream of results produced by one run of a sequence
pub(crate) type ItemStream<T> = BoxStream<'static, Result<T, FlowError>>;

type Factory<T> = Arc<dyn Fn() -> ItemStream<T> + Send + Sync>;

/// Cold ordered sequence
pub struct Sequence<T> {
    factory: Factory<T>,
    stages: Vec<StageKind>,
}

impl<T> Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("stages", &self.stages)
            .finish()
    }
}

// ===== Constructors =====

impl<T: Send + 'static> Sequence<T> {
    fn from_factory<F>(kind: StageKind, factory: F) -> Self
    where
        F: Fn() -> ItemStream<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            stages: vec![kind],
        }
    }

    /// Emit the given items in order
    pub fn just<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone + Sync,
    {
        let items: Arc<[T]> = items.into_iter().collect();
        Self::from_factory(StageKind::Source, move || {
            let items = Arc::clone(&items);
            stream::iter((0..items.len()).map(move |i| Ok(items[i].clone()))).boxed()
        })
    }

    /// Emit whatever `make` yields; `make` runs once per subscription
    pub fn from_iter_fn<F, I>(make: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_factory(StageKind::Source, move || {
            stream::iter(make().into_iter().map(Ok)).boxed()
        })
    }

    /// Complete immediately
    pub fn empty() -> Self {
        Self::from_factory(StageKind::Source, || stream::empty().boxed())
    }

    /// Fail immediately with `error`
    pub fn error(error: FlowError) -> Self {
        Self::from_factory(StageKind::Source, move || {
            stream::iter(std::iter::once(Err(error.clone()))).boxed()
        })
    }

    /// Drain each sequence fully, in order
    pub fn concat<I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = Sequence<T>>,
    {
        let factories: Vec<Factory<T>> = sequences.into_iter().map(|s| s.factory).collect();
        Self::from_factory(StageKind::Concat, move || {
            stream::iter(factories.clone())
                .flat_map(|factory| factory())
                .boxed()
        })
    }

    /// Pair the i-th elements of `first` and `second`
    pub fn zip<U, R, F>(first: Sequence<T>, second: Sequence<U>, combiner: F) -> Sequence<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        first.zip_with(second, combiner)
    }
}

impl Sequence<i64> {
    /// `count` consecutive integers starting at `start`
    ///
    /// Values are produced lazily, so `count` may be arbitrarily large. The
    /// sequence never wraps: it completes after `i64::MAX` even if fewer than
    /// `count` values were emitted.
    pub fn range(start: i64, count: usize) -> Self {
        let available = i64::MAX.abs_diff(start).saturating_add(1);
        if u64::try_from(count).map_or(true, |count| count > available) {
            warn!(start, count, available, "range cut short at i64::MAX");
        }
        Self::from_iter_fn(move || (start..=i64::MAX).take(count))
    }
}

// ===== Operators =====

impl<T: Send + 'static> Sequence<T> {
    /// Append a stage that wraps one run of upstream
    ///
    /// `stage` receives the upstream run and this stage's label (`kind#index`).
    pub(crate) fn chain_stage<R, S>(self, kind: StageKind, stage: S) -> Sequence<R>
    where
        R: Send + 'static,
        S: Fn(ItemStream<T>, &str) -> ItemStream<R> + Send + Sync + 'static,
    {
        let label = format!("{kind}#{}", self.stages.len());
        let upstream = self.factory;
        let mut stages = self.stages;
        stages.push(kind);

        Sequence {
            factory: Arc::new(move || stage(upstream(), &label)),
            stages,
        }
    }

    /// Record a marker stage that does not wrap the stream itself
    pub(crate) fn mark(mut self, kind: StageKind) -> Self {
        self.stages.push(kind);
        self
    }

    /// Keep elements matching `predicate`
    ///
    /// A panic in `predicate` unwinds into the task pulling the subscription.
    /// Use `try_filter` to fail the sequence instead; on a worker pool
    /// (`run_on`) the panic is reported as `FlowError::Worker`.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        self.chain_stage(StageKind::Filter, move |upstream, _| {
            let predicate = Arc::clone(&predicate);
            upstream
                .filter(move |item| {
                    future::ready(match item {
                        Ok(value) => predicate(value),
                        Err(_) => true,
                    })
                })
                .boxed()
        })
    }

    /// Keep elements matching a fallible `predicate`
    ///
    /// A predicate error terminates the sequence.
    pub fn try_filter<P, E>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
        E: Display,
    {
        let predicate = Arc::new(predicate);
        self.chain_stage(StageKind::Filter, move |upstream, label| {
            let predicate = Arc::clone(&predicate);
            let label = label.to_string();
            upstream
                .filter_map(move |item| {
                    let kept = match item {
                        Ok(value) => match predicate(&value) {
                            Ok(true) => Some(Ok(value)),
                            Ok(false) => None,
                            Err(e) => Some(Err(FlowError::transform(&label, e.to_string()))),
                        },
                        Err(e) => Some(Err(e)),
                    };
                    future::ready(kept)
                })
                .boxed()
        })
    }

    /// Transform each element
    ///
    /// A panic in `f` unwinds into the task pulling the subscription. Use
    /// `try_map` to fail the sequence instead; on a worker pool (`run_on`)
    /// the panic is reported as `FlowError::Worker`.
    pub fn map<R, F>(self, f: F) -> Sequence<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.chain_stage(StageKind::Map, move |upstream, _| {
            let f = Arc::clone(&f);
            upstream.map(move |item| item.map(|value| f(value))).boxed()
        })
    }

    /// Transform each element with a fallible function
    ///
    /// The first error terminates the sequence.
    pub fn try_map<R, E, F>(self, f: F) -> Sequence<R>
    where
        R: Send + 'static,
        E: Display,
        F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.chain_stage(StageKind::Map, move |upstream, label| {
            let f = Arc::clone(&f);
            let label = label.to_string();
            upstream
                .map(move |item| {
                    item.and_then(|value| {
                        f(value).map_err(|e| FlowError::transform(&label, e.to_string()))
                    })
                })
                .boxed()
        })
    }

    /// Drain `self`, then `other`
    ///
    /// `other` is not started until `self` completes.
    pub fn concat_with(self, other: Sequence<T>) -> Self {
        let first = self.factory;
        let second = other.factory;
        let mut stages = self.stages;
        stages.push(StageKind::Concat);

        Sequence {
            factory: Arc::new(move || {
                let second = Arc::clone(&second);
                first()
                    .chain(stream::once(async move { second() }).flatten())
                    .boxed()
            }),
            stages,
        }
    }

    /// Map each element to a sequence and drain those in upstream order
    ///
    /// The inner sequence for an element starts only after the previous one
    /// completes, so output order follows input order.
    pub fn flat_map<R, F>(self, f: F) -> Sequence<R>
    where
        R: Send + 'static,
        F: Fn(T) -> Sequence<R> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.chain_stage(StageKind::FlatMap, move |upstream, _| {
            let f = Arc::clone(&f);
            upstream
                .flat_map(move |item| match item {
                    Ok(value) => (f(value).factory)(),
                    Err(e) => stream::iter(std::iter::once(Err(e))).boxed(),
                })
                .boxed()
        })
    }

    /// Pair elements by index; completes when the shorter side does
    pub fn zip_with<U, R, F>(self, other: Sequence<U>, combiner: F) -> Sequence<R>
    where
        U: Send + 'static,
        R: Send + 'static,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let combiner = Arc::new(combiner);
        let other = other.factory;
        self.chain_stage(StageKind::Zip, move |upstream, _| {
            let combiner = Arc::clone(&combiner);
            upstream
                .zip(other())
                .map(move |pair| match pair {
                    (Ok(a), Ok(b)) => Ok(combiner(a, b)),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                })
                .boxed()
        })
    }

    /// Re-run upstream from its start `times` more times after it completes
    pub fn repeat(self, times: usize) -> Self {
        let upstream = self.factory;
        let mut stages = self.stages;
        stages.push(StageKind::Repeat);

        Sequence {
            factory: Arc::new(move || {
                let upstream = Arc::clone(&upstream);
                stream::iter(0..=times)
                    .flat_map(move |_| upstream())
                    .boxed()
            }),
            stages,
        }
    }

    /// Withhold each element for at least `delay`
    pub fn delay_elements(self, delay: Duration) -> Self {
        self.chain_stage(StageKind::Delay, move |upstream, _| {
            upstream
                .then(move |item| async move {
                    if item.is_ok() {
                        tokio::time::sleep(delay).await;
                    }
                    item
                })
                .boxed()
        })
    }

    /// Run the next map/filter on `pool`, keeping input order
    pub fn run_on(self, pool: WorkerPool) -> OnWorker<T> {
        OnWorker::new(self, pool)
    }

    /// Trace every signal under `category`
    pub fn log(self, category: impl Into<String>) -> Self
    where
        T: Debug,
    {
        let category: Arc<str> = Arc::from(category.into());
        self.chain_stage(StageKind::Log, move |upstream, _| {
            SignalLog::new(Arc::clone(&category), upstream).boxed()
        })
    }

    /// Observe each element without changing it
    pub fn do_on_next<F>(self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.chain_stage(StageKind::Peek, move |upstream, _| {
            let f = Arc::clone(&f);
            upstream
                .inspect(move |item| {
                    if let Ok(value) = item {
                        f(value);
                    }
                })
                .boxed()
        })
    }

    /// Stage kinds in declaration order
    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    /// Start consuming; pull elements with `Subscription::next`
    pub fn subscribe(self) -> Subscription<T> {
        Subscription::new((self.factory)(), self.stages)
    }

    /// Drive the sequence into `subscriber` on a spawned task
    pub fn subscribe_with<S>(self, subscriber: S) -> SubscriberHandle
    where
        S: Subscriber<T> + Send + 'static,
    {
        SubscriberHandle::spawn(self.subscribe(), subscriber)
    }

    /// Subscribe and gather every element
    pub async fn collect_list(self) -> Result<Vec<T>, FlowError> {
        self.subscribe().collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn names1() -> Sequence<String> {
        Sequence::just(["Blenders", "Old", "Johnnie"].map(String::from))
    }

    fn names2() -> Sequence<String> {
        Sequence::just(["Pride", "Monk", "Walker"].map(String::from))
    }

    #[tokio::test]
    async fn test_just_emits_in_order() {
        let items = Sequence::just([3, 1, 2]).collect_list().await.unwrap();
        assert_eq!(items, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_start() {
        let items = Sequence::range(1, 5).collect_list().await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_range_with_huge_count_starts_emitting() {
        let mut subscription = Sequence::range(0, usize::MAX).subscribe();
        assert_eq!(subscription.next().await, Some(Ok(0)));
        assert_eq!(subscription.next().await, Some(Ok(1)));
    }

    #[tokio::test]
    async fn test_range_ends_at_i64_max() {
        let items = Sequence::range(i64::MAX - 1, 5).collect_list().await.unwrap();
        assert_eq!(items, vec![i64::MAX - 1, i64::MAX]);

        let negative = Sequence::range(-2, 3).collect_list().await.unwrap();
        assert_eq!(negative, vec![-2, -1, 0]);
        assert!(Sequence::range(7, 0).collect_list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_completes() {
        let items = Sequence::<u8>::empty().collect_list().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_error_source_fails() {
        let err = Sequence::<u8>::error(FlowError::transform("source#0", "nope"))
            .collect_list()
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some("source#0"));
    }

    #[tokio::test]
    async fn test_filter_even_numbers() {
        let items = Sequence::range(1, 100)
            .filter(|n| n % 2 == 0)
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items.len(), 50);
        assert_eq!(items.first(), Some(&2));
        assert_eq!(items.last(), Some(&100));
        assert!(items.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_concat_drains_first_then_second() {
        let items = names1().concat_with(names2()).collect_list().await.unwrap();
        assert_eq!(
            items,
            vec!["Blenders", "Old", "Johnnie", "Pride", "Monk", "Walker"]
        );
    }

    #[tokio::test]
    async fn test_concat_starts_second_after_first_drains() {
        let made = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&made);
        let mut subscription = Sequence::just([1, 2])
            .concat_with(Sequence::from_iter_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec![3]
            }))
            .subscribe();

        assert_eq!(subscription.next().await, Some(Ok(1)));
        assert_eq!(subscription.next().await, Some(Ok(2)));
        assert_eq!(made.load(Ordering::SeqCst), 0);
        assert_eq!(subscription.next().await, Some(Ok(3)));
        assert_eq!(made.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concat_skips_second_when_first_fails() {
        let made = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&made);
        let err = Sequence::<i32>::error(FlowError::transform("source#0", "first failed"))
            .concat_with(Sequence::from_iter_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec![1]
            }))
            .collect_list()
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some("source#0"));
        assert_eq!(made.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flat_map_keeps_upstream_order() {
        let items = Sequence::just([3i64, 1, 2])
            .flat_map(|n| Sequence::range(0, n as usize).map(move |i| n * 10 + i))
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items, vec![30, 31, 32, 10, 20, 21]);
    }

    #[tokio::test]
    async fn test_flat_map_waits_for_slow_inner() {
        let items = Sequence::just([20u64, 1])
            .flat_map(|ms| Sequence::just([ms]).delay_elements(Duration::from_millis(ms)))
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items, vec![20, 1]);
    }

    #[tokio::test]
    async fn test_flat_map_inner_error_is_terminal() {
        let mut subscription = Sequence::just([1, 2, 3])
            .flat_map(|n| {
                Sequence::just([n]).try_map(move |v| if v == 2 { Err("inner") } else { Ok(v) })
            })
            .subscribe();

        assert_eq!(subscription.next().await, Some(Ok(1)));
        let err = subscription.next().await.unwrap().unwrap_err();
        assert_eq!(err.stage(), Some("map#1"));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_plain_map_panic_unwinds_consumer_task() {
        let joined = tokio::spawn(
            Sequence::just([1])
                .map(|_: i32| -> i32 { panic!("boom") })
                .collect_list(),
        )
        .await;
        assert!(joined.unwrap_err().is_panic());
    }

    #[tokio::test]
    async fn test_concat_many() {
        let items = Sequence::concat(vec![
            Sequence::just([1]),
            Sequence::empty(),
            Sequence::just([2, 3]),
        ])
        .collect_list()
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_zip_with_space() {
        let items = names1()
            .zip_with(names2(), |a, b| format!("{a} {b}"))
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items, vec!["Blenders Pride", "Old Monk", "Johnnie Walker"]);
    }

    #[tokio::test]
    async fn test_zip_stops_at_shorter_side() {
        let items = Sequence::zip(Sequence::just([1, 2, 3, 4]), Sequence::just([10, 20]), |a, b| {
            a + b
        })
        .collect_list()
        .await
        .unwrap();
        assert_eq!(items, vec![11, 22]);
    }

    #[tokio::test]
    async fn test_repeat_reruns_upstream() {
        let items = Sequence::just(["google", "abc", "fb", "stackoverflow"])
            .filter(|s| s.len() >= 5)
            .map(|s| s.to_uppercase())
            .repeat(1)
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items, vec!["GOOGLE", "STACKOVERFLOW", "GOOGLE", "STACKOVERFLOW"]);
    }

    #[tokio::test]
    async fn test_repeat_zero_is_single_pass() {
        let items = Sequence::just([1, 2]).repeat(0).collect_list().await.unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_from_iter_fn_runs_per_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let items = Sequence::from_iter_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![1, 2]
        })
        .repeat(2)
        .collect_list()
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 1, 2, 1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_try_map_failure_names_stage_and_stops() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut subscription = Sequence::just([1, 2, 3])
            .try_map(|n| if n == 2 { Err("two is not allowed") } else { Ok(n * 10) })
            .do_on_next(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .subscribe();

        assert_eq!(subscription.next().await, Some(Ok(10)));
        let err = subscription.next().await.unwrap().unwrap_err();
        assert_eq!(err.stage(), Some("map#1"));
        assert!(err.to_string().contains("two is not allowed"));
        assert_eq!(subscription.next().await, None);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_filter_failure() {
        let err = Sequence::just([1, 2])
            .try_filter(|n| if *n > 1 { Err("too big") } else { Ok(true) })
            .collect_list()
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some("filter#1"));
    }

    #[tokio::test]
    async fn test_delay_keeps_order() {
        let delay = Duration::from_millis(10);
        let started = Instant::now();
        let items = Sequence::just(["hello", "there"])
            .delay_elements(delay)
            .collect_list()
            .await
            .unwrap();
        assert_eq!(items, vec!["hello", "there"]);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_rebuild_is_deterministic() {
        let build = || {
            Sequence::range(1, 20)
                .filter(|n| n % 3 == 0)
                .map(|n| n * n)
        };
        let first = build().collect_list().await.unwrap();
        let second = build().collect_list().await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stages_are_recorded_in_order() {
        let sequence = Sequence::range(1, 3)
            .filter(|_| true)
            .map(|n| n + 1)
            .flat_map(|n| Sequence::just([n]))
            .repeat(1);
        assert_eq!(
            sequence.stages(),
            &[
                StageKind::Source,
                StageKind::Filter,
                StageKind::Map,
                StageKind::FlatMap,
                StageKind::Repeat
            ]
        );
    }
}
