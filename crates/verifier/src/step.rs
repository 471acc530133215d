//! StepVerifier - scripted expectations over one subscription
//!
//! Steps are recorded first and replayed against a fresh subscription by one
//! of the `verify*` methods, which report the elapsed time on success.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use contracts::{FlowError, SubscriptionState};
use stream_engine::{Sequence, Subscription};
use tracing::debug;

use crate::error::VerifyError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Signal observed on a subscription
enum Signal<T> {
    Next(T),
    Error(FlowError),
    Complete,
    Cancelled,
}

impl<T: Debug> Signal<T> {
    fn describe(&self) -> String {
        match self {
            Self::Next(item) => format!("onNext({item:?})"),
            Self::Error(e) => format!("onError({e})"),
            Self::Complete => "onComplete()".to_string(),
            Self::Cancelled => "cancel()".to_string(),
        }
    }
}

enum Step<T> {
    Subscription,
    Next(T),
    AssertNext(Box<dyn FnOnce(&T) + Send>),
    NextMatches(String, Box<dyn FnOnce(&T) -> bool + Send>),
    NextCount(usize),
    ConsumeWhile(Box<dyn FnMut(&T) -> bool + Send>),
}

enum Terminal {
    Complete,
    Error(Box<dyn FnOnce(&FlowError) -> bool + Send>),
    Cancel,
}

/// Scripted verifier for a sequence
pub struct StepVerifier<T> {
    sequence: Sequence<T>,
    steps: Vec<Step<T>>,
    terminal: Terminal,
    timeout: Duration,
}

impl<T> StepVerifier<T>
where
    T: Debug + PartialEq + Send + 'static,
{
    pub fn create(sequence: Sequence<T>) -> Self {
        Self {
            sequence,
            steps: Vec::new(),
            terminal: Terminal::Complete,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Expect the subscription to be established
    pub fn expect_subscription(mut self) -> Self {
        self.steps.push(Step::Subscription);
        self
    }

    /// Expect exactly these elements next, in order
    pub fn expect_next<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.steps.extend(items.into_iter().map(Step::Next));
        self
    }

    /// Run `check` on the next element; `check` asserts by panicking
    pub fn assert_next<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.steps.push(Step::AssertNext(Box::new(check)));
        self
    }

    /// Expect the next element to satisfy `predicate`
    pub fn expect_next_matches<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: FnOnce(&T) -> bool + Send + 'static,
    {
        self.steps
            .push(Step::NextMatches(description.into(), Box::new(predicate)));
        self
    }

    /// Expect `count` elements of any value
    pub fn expect_next_count(mut self, count: usize) -> Self {
        self.steps.push(Step::NextCount(count));
        self
    }

    /// Consume elements while `predicate` holds
    ///
    /// The first element failing it is left for the following step.
    pub fn then_consume_while<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        self.steps.push(Step::ConsumeWhile(Box::new(predicate)));
        self
    }

    /// Expect a terminal error satisfying `predicate`
    pub fn expect_error<F>(mut self, predicate: F) -> Self
    where
        F: FnOnce(&FlowError) -> bool + Send + 'static,
    {
        self.terminal = Terminal::Error(Box::new(predicate));
        self
    }

    /// Cancel after the recorded steps instead of awaiting a terminal signal
    pub fn then_cancel(mut self) -> Self {
        self.terminal = Terminal::Cancel;
        self
    }

    /// Fail with `VerifyError::Timeout` if verification takes longer
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify, expecting normal completion last
    pub async fn verify_complete(mut self) -> Result<Duration, VerifyError> {
        self.terminal = Terminal::Complete;
        self.verify().await
    }

    /// Verify, expecting any error last
    pub async fn verify_error(self) -> Result<Duration, VerifyError> {
        self.expect_error(|_| true).verify().await
    }

    /// Verify the recorded steps and terminal expectation
    pub async fn verify(self) -> Result<Duration, VerifyError> {
        let started = Instant::now();
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.run()).await {
            Ok(result) => {
                let elapsed = started.elapsed();
                debug!(?elapsed, ok = result.is_ok(), "verification finished");
                result.map(|()| elapsed)
            }
            Err(_) => Err(VerifyError::Timeout { after: timeout }),
        }
    }

    async fn run(self) -> Result<(), VerifyError> {
        let mut subscription = self.sequence.subscribe();
        let mut peeked: Option<Signal<T>> = None;
        let terminal_step = self.steps.len();

        for (step, expectation) in self.steps.into_iter().enumerate() {
            match expectation {
                Step::Subscription => {
                    if subscription.state() != SubscriptionState::Subscribed {
                        return Err(VerifyError::unexpected(
                            step,
                            "onSubscribe()",
                            subscription.state().to_string(),
                        ));
                    }
                }
                Step::Next(expected) => match pull(&mut subscription, &mut peeked).await {
                    Signal::Next(actual) if actual == expected => {}
                    other => {
                        return Err(VerifyError::unexpected(
                            step,
                            format!("onNext({expected:?})"),
                            other.describe(),
                        ))
                    }
                },
                Step::AssertNext(check) => match pull(&mut subscription, &mut peeked).await {
                    Signal::Next(actual) => check(&actual),
                    other => {
                        return Err(VerifyError::unexpected(step, "onNext(..)", other.describe()))
                    }
                },
                Step::NextMatches(description, predicate) => {
                    match pull(&mut subscription, &mut peeked).await {
                        Signal::Next(actual) if predicate(&actual) => {}
                        other => {
                            return Err(VerifyError::unexpected(
                                step,
                                format!("onNext matching {description}"),
                                other.describe(),
                            ))
                        }
                    }
                }
                Step::NextCount(count) => {
                    for seen in 0..count {
                        match pull(&mut subscription, &mut peeked).await {
                            Signal::Next(_) => {}
                            other => {
                                return Err(VerifyError::unexpected(
                                    step,
                                    format!("{count} onNext signals"),
                                    format!("{} after {seen}", other.describe()),
                                ))
                            }
                        }
                    }
                }
                Step::ConsumeWhile(mut predicate) => loop {
                    match pull(&mut subscription, &mut peeked).await {
                        Signal::Next(item) if predicate(&item) => continue,
                        other => {
                            peeked = Some(other);
                            break;
                        }
                    }
                },
            }
        }

        match self.terminal {
            Terminal::Cancel => {
                subscription.cancel();
                Ok(())
            }
            Terminal::Complete => match pull(&mut subscription, &mut peeked).await {
                Signal::Complete => Ok(()),
                other => Err(VerifyError::unexpected(
                    terminal_step,
                    "onComplete()",
                    other.describe(),
                )),
            },
            Terminal::Error(predicate) => match pull(&mut subscription, &mut peeked).await {
                Signal::Error(e) if predicate(&e) => Ok(()),
                other => Err(VerifyError::unexpected(
                    terminal_step,
                    "onError(..)",
                    other.describe(),
                )),
            },
        }
    }
}

async fn pull<T: Send + 'static>(
    subscription: &mut Subscription<T>,
    peeked: &mut Option<Signal<T>>,
) -> Signal<T> {
    if let Some(signal) = peeked.take() {
        return signal;
    }
    match subscription.next().await {
        Some(Ok(item)) => Signal::Next(item),
        Some(Err(e)) => Signal::Error(e),
        None if subscription.state() == SubscriptionState::Cancelled => Signal::Cancelled,
        None => Signal::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expect_next_then_complete() {
        let elapsed = StepVerifier::create(Sequence::just([1, 2, 3]))
            .expect_subscription()
            .expect_next([1, 2])
            .expect_next([3])
            .verify_complete()
            .await
            .unwrap();
        assert!(elapsed < DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_wrong_element_reports_step() {
        let err = StepVerifier::create(Sequence::just([1, 2]))
            .expect_subscription()
            .expect_next([1, 5])
            .verify_complete()
            .await
            .unwrap_err();
        assert_eq!(err, VerifyError::unexpected(2, "onNext(5)", "onNext(2)"));
    }

    #[tokio::test]
    async fn test_missing_completion_reports_extra_element() {
        let err = StepVerifier::create(Sequence::just([1, 2]))
            .expect_next([1])
            .verify_complete()
            .await
            .unwrap_err();
        assert_eq!(err, VerifyError::unexpected(1, "onComplete()", "onNext(2)"));
    }

    #[tokio::test]
    async fn test_consume_while_leaves_first_mismatch() {
        StepVerifier::create(Sequence::just([2, 4, 5]))
            .then_consume_while(|n| n % 2 == 0)
            .expect_next([5])
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_assert_next_and_count() {
        StepVerifier::create(Sequence::range(1, 4))
            .assert_next(|n| assert_eq!(*n, 1))
            .expect_next_count(2)
            .expect_next_matches("even", |n| n % 2 == 0)
            .verify_complete()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expect_error() {
        StepVerifier::create(
            Sequence::just([1, 2]).try_map(|n| if n == 2 { Err("bad") } else { Ok(n) }),
        )
        .expect_next([1])
        .expect_error(|e| e.stage() == Some("map#1"))
        .verify()
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_then_cancel() {
        StepVerifier::create(Sequence::range(1, 1_000))
            .expect_next([1, 2])
            .then_cancel()
            .verify()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = StepVerifier::create(
            Sequence::just([1]).delay_elements(Duration::from_secs(30)),
        )
        .with_timeout(Duration::from_millis(20))
        .verify_complete()
        .await
        .unwrap_err();
        assert_eq!(
            err,
            VerifyError::Timeout {
                after: Duration::from_millis(20)
            }
        );
    }
}
