//! Subscriber trait - consumer side of a sequence
//!
//! Defines the abstract interface for push-style consumers.

use crate::FlowError;

/// Push-style consumer of a sequence
///
/// Receives elements in order, then exactly one terminal signal unless the
/// subscription was cancelled.
#[trait_variant::make(Subscriber: Send)]
pub trait LocalSubscriber<T> {
    /// Subscriber name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Receive the next element
    ///
    /// # Errors
    /// Returning an error cancels the subscription.
    async fn on_next(&mut self, item: T) -> Result<(), FlowError>;

    /// Upstream failed
    async fn on_error(&mut self, error: &FlowError);

    /// Upstream finished normally
    async fn on_complete(&mut self);
}
