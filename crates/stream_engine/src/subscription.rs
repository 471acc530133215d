//! Subscription - pull side of a running sequence
//!
//! Owns the running stream, tracks the lifecycle state and reacts to
//! cancellation. `SubscriberHandle` drives a subscription into a push-style
//! `Subscriber` on its own task.

use std::sync::Arc;

use contracts::{FlowError, StageKind, Subscriber, SubscriptionState};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::SubscriptionMetrics;
use crate::sequence::ItemStream;

/// Cloneable cancel switch for a subscription
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Active consumption of one sequence
pub struct Subscription<T> {
    stream: Option<ItemStream<T>>,
    state: SubscriptionState,
    stages: Vec<StageKind>,
    metrics: Arc<SubscriptionMetrics>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(stream: ItemStream<T>, stages: Vec<StageKind>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut subscription = Self {
            stream: Some(stream),
            state: SubscriptionState::Idle,
            stages,
            metrics: Arc::new(SubscriptionMetrics::new()),
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        };
        subscription.advance(SubscriptionState::Subscribed);
        debug!(stages = ?subscription.stages, "subscribed");
        subscription
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    pub fn metrics(&self) -> &Arc<SubscriptionMetrics> {
        &self.metrics
    }

    /// Handle that can cancel this subscription from elsewhere
    pub fn canceller(&self) -> Canceller {
        Canceller {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Stop consuming; no further element is delivered
    pub fn cancel(&mut self) {
        self.cancel_tx.send_replace(true);
        self.finish(SubscriptionState::Cancelled);
    }

    fn advance(&mut self, next: SubscriptionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Enter a terminal state and drop the running stream
    ///
    /// Dropping the stream releases timers and aborts outstanding workers.
    fn finish(&mut self, terminal: SubscriptionState) {
        if self.state.is_terminal() {
            return;
        }
        self.advance(terminal);
        self.stream = None;

        match terminal {
            SubscriptionState::Completed => self.metrics.inc_completion_count(),
            SubscriptionState::Failed => self.metrics.inc_failure_count(),
            SubscriptionState::Cancelled => self.metrics.inc_cancel_count(),
            _ => {}
        }
        observability::record_subscription_finished(terminal);
        debug!(
            state = %terminal,
            emitted = self.metrics.emitted_count(),
            "subscription finished"
        );
    }
}

impl<T: Send + 'static> Subscription<T> {
    /// Pull the next signal
    ///
    /// `Some(Ok(_))` is an element, `Some(Err(_))` the terminal failure, and
    /// `None` means completed or cancelled (see `state`).
    pub async fn next(&mut self) -> Option<Result<T, FlowError>> {
        if self.state.is_terminal() {
            return None;
        }
        if *self.cancel_rx.borrow() {
            self.finish(SubscriptionState::Cancelled);
            return None;
        }

        let mut cancel_rx = self.cancel_rx.clone();
        let stream = self.stream.as_mut()?;
        let polled = tokio::select! {
            biased;
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => None,
            item = stream.next() => Some(item),
        };

        match polled {
            None => {
                self.finish(SubscriptionState::Cancelled);
                None
            }
            Some(Some(Ok(item))) => {
                self.advance(SubscriptionState::Emitting);
                self.metrics.inc_emitted_count();
                observability::record_element_emitted();
                Some(Ok(item))
            }
            Some(Some(Err(error))) => {
                warn!(stage = ?error.stage(), error = %error, "sequence failed");
                self.finish(SubscriptionState::Failed);
                Some(Err(error))
            }
            Some(None) => {
                self.finish(SubscriptionState::Completed);
                None
            }
        }
    }

    /// Drain every element
    ///
    /// # Errors
    /// The terminal failure, or `FlowError::Cancelled` if cancelled meanwhile.
    pub async fn collect(mut self) -> Result<Vec<T>, FlowError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        match self.state {
            SubscriptionState::Cancelled => Err(FlowError::Cancelled),
            _ => Ok(items),
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            self.finish(SubscriptionState::Cancelled);
        }
    }
}

/// Handle to a subscription driven on a spawned task
pub struct SubscriberHandle {
    name: String,
    canceller: Canceller,
    metrics: Arc<SubscriptionMetrics>,
    join: JoinHandle<SubscriptionState>,
}

impl SubscriberHandle {
    /// Spawn a task delivering `subscription` into `subscriber`
    pub fn spawn<T, S>(subscription: Subscription<T>, subscriber: S) -> Self
    where
        T: Send + 'static,
        S: Subscriber<T> + Send + 'static,
    {
        let name = subscriber.name().to_string();
        let canceller = subscription.canceller();
        let metrics = Arc::clone(subscription.metrics());
        let task_name = name.clone();

        let join = tokio::spawn(async move { drive(subscription, subscriber, task_name).await });

        Self {
            name,
            canceller,
            metrics,
            join,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SubscriptionMetrics> {
        &self.metrics
    }

    /// Request cancellation of the driven subscription
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Wait for the subscription to reach a terminal state
    pub async fn join(self) -> SubscriptionState {
        match self.join.await {
            Ok(state) => state,
            Err(e) => {
                error!(subscriber = %self.name, error = %e, "subscriber task panicked");
                SubscriptionState::Failed
            }
        }
    }
}

#[instrument(name = "subscriber_driver", skip(subscription, subscriber), fields(subscriber = %name))]
async fn drive<T, S>(mut subscription: Subscription<T>, mut subscriber: S, name: String) -> SubscriptionState
where
    T: Send + 'static,
    S: Subscriber<T>,
{
    while let Some(item) = subscription.next().await {
        match item {
            Ok(value) => {
                if let Err(e) = subscriber.on_next(value).await {
                    warn!(error = %e, "subscriber rejected element, cancelling");
                    subscription.cancel();
                    break;
                }
            }
            Err(e) => {
                subscriber.on_error(&e).await;
                break;
            }
        }
    }

    if subscription.state() == SubscriptionState::Completed {
        subscriber.on_complete().await;
    }
    debug!(state = %subscription.state(), "subscriber driver exiting");
    subscription.state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sequence;
    use std::time::Duration;

    struct Recording {
        items: Vec<i64>,
        errors: Vec<FlowError>,
        completions: usize,
        reject_after: Option<usize>,
        report: tokio::sync::mpsc::UnboundedSender<(Vec<i64>, usize, usize)>,
    }

    impl Recording {
        fn new(
            reject_after: Option<usize>,
        ) -> (Self, tokio::sync::mpsc::UnboundedReceiver<(Vec<i64>, usize, usize)>) {
            let (report, rx) = tokio::sync::mpsc::unbounded_channel();
            (
                Self {
                    items: Vec::new(),
                    errors: Vec::new(),
                    completions: 0,
                    reject_after,
                    report,
                },
                rx,
            )
        }
    }

    impl Drop for Recording {
        fn drop(&mut self) {
            let _ = self.report.send((
                std::mem::take(&mut self.items),
                self.errors.len(),
                self.completions,
            ));
        }
    }

    impl Subscriber<i64> for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn on_next(&mut self, item: i64) -> Result<(), FlowError> {
            if self.reject_after == Some(self.items.len()) {
                return Err(FlowError::Cancelled);
            }
            self.items.push(item);
            Ok(())
        }

        async fn on_error(&mut self, error: &FlowError) {
            self.errors.push(error.clone());
        }

        async fn on_complete(&mut self) {
            self.completions += 1;
        }
    }

    #[tokio::test]
    async fn test_state_transitions_to_completed() {
        let mut subscription = Sequence::just([1, 2]).subscribe();
        assert_eq!(subscription.state(), SubscriptionState::Subscribed);

        assert_eq!(subscription.next().await, Some(Ok(1)));
        assert_eq!(subscription.state(), SubscriptionState::Emitting);
        assert_eq!(subscription.next().await, Some(Ok(2)));
        assert_eq!(subscription.next().await, None);
        assert_eq!(subscription.state(), SubscriptionState::Completed);
        assert_eq!(subscription.metrics().snapshot().emitted_count, 2);
    }

    #[tokio::test]
    async fn test_empty_goes_straight_to_completed() {
        let mut subscription = Sequence::<i64>::empty().subscribe();
        assert_eq!(subscription.next().await, None);
        assert_eq!(subscription.state(), SubscriptionState::Completed);
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let mut subscription = Sequence::range(1, 100).subscribe();
        assert_eq!(subscription.next().await, Some(Ok(1)));
        subscription.cancel();
        assert_eq!(subscription.state(), SubscriptionState::Cancelled);
        assert_eq!(subscription.next().await, None);
        assert_eq!(subscription.metrics().cancel_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_while_active_counts_as_cancel() {
        let mut subscription = Sequence::range(1, 10).subscribe();
        let metrics = Arc::clone(subscription.metrics());
        assert_eq!(subscription.next().await, Some(Ok(1)));

        drop(subscription);
        assert_eq!(metrics.cancel_count(), 1);
        assert_eq!(metrics.completion_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_after_completion_is_not_a_cancel() {
        let mut subscription = Sequence::just([1]).subscribe();
        let metrics = Arc::clone(subscription.metrics());
        while subscription.next().await.is_some() {}

        drop(subscription);
        assert_eq!(metrics.completion_count(), 1);
        assert_eq!(metrics.cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_canceller_interrupts_pending_delay() {
        let mut subscription = Sequence::just([1, 2])
            .delay_elements(Duration::from_secs(30))
            .subscribe();
        let canceller = subscription.canceller();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let next = tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .expect("cancel should interrupt the delay");
        assert_eq!(next, None);
        assert_eq!(subscription.state(), SubscriptionState::Cancelled);
    }

    #[tokio::test]
    async fn test_collect_after_cancel_reports_cancelled() {
        let subscription = Sequence::range(1, 3).subscribe();
        subscription.canceller().cancel();
        assert_eq!(subscription.collect().await, Err(FlowError::Cancelled));
    }

    #[tokio::test]
    async fn test_subscriber_receives_items_then_complete() {
        let (subscriber, mut report) = Recording::new(None);
        let handle = Sequence::range(1, 3).subscribe_with(subscriber);
        assert_eq!(handle.name(), "recording");

        assert_eq!(handle.join().await, SubscriptionState::Completed);
        let (items, errors, completions) = report.recv().await.unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(errors, 0);
        assert_eq!(completions, 1);
    }

    #[tokio::test]
    async fn test_subscriber_receives_single_error() {
        let (subscriber, mut report) = Recording::new(None);
        let handle = Sequence::range(1, 3)
            .try_map(|n| if n == 2 { Err("even") } else { Ok(n) })
            .subscribe_with(subscriber);

        assert_eq!(handle.join().await, SubscriptionState::Failed);
        let (items, errors, completions) = report.recv().await.unwrap();
        assert_eq!(items, vec![1]);
        assert_eq!(errors, 1);
        assert_eq!(completions, 0);
    }

    #[tokio::test]
    async fn test_subscriber_rejection_cancels() {
        let (subscriber, mut report) = Recording::new(Some(2));
        let handle = Sequence::range(1, 10).subscribe_with(subscriber);

        assert_eq!(handle.join().await, SubscriptionState::Cancelled);
        let (items, _, completions) = report.recv().await.unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(completions, 0);
    }
}
