//! Signal logging wrapper

use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use contracts::FlowError;
use futures::stream::{Stream, StreamExt};
use tracing::{error, info};

use crate::sequence::ItemStream;

/// Logs subscribe, next, complete, error and cancel signals of one run
pub(crate) struct SignalLog<T> {
    category: Arc<str>,
    inner: ItemStream<T>,
    subscribed: bool,
    finished: bool,
    emitted: u64,
}

impl<T> SignalLog<T> {
    pub(crate) fn new(category: Arc<str>, inner: ItemStream<T>) -> Self {
        Self {
            category,
            inner,
            subscribed: false,
            finished: false,
            emitted: 0,
        }
    }
}

impl<T: Debug> Stream for SignalLog<T> {
    type Item = Result<T, FlowError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if !this.subscribed {
            this.subscribed = true;
            info!(category = %this.category, "onSubscribe");
        }

        let polled = this.inner.poll_next_unpin(cx);
        match &polled {
            Poll::Ready(Some(Ok(item))) => {
                this.emitted += 1;
                info!(category = %this.category, "onNext({item:?})");
            }
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                error!(category = %this.category, emitted = this.emitted, "onError({e})");
            }
            Poll::Ready(None) => {
                this.finished = true;
                info!(category = %this.category, emitted = this.emitted, "onComplete()");
            }
            Poll::Pending => {}
        }
        polled
    }
}

impl<T> Drop for SignalLog<T> {
    fn drop(&mut self) {
        if self.subscribed && !self.finished {
            info!(category = %self.category, emitted = self.emitted, "cancel()");
        }
    }
}
