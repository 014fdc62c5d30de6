use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_util::sync::CancellationToken;

/// Wraps an SSE body stream and cancels `cancel` if the stream is
/// dropped before it finished, which is what happens when the client
/// disconnects mid-response.
pub struct DetectDisconnect<S> {
    inner: S,
    cancel: CancellationToken,
    finished: bool,
}

impl<S> DetectDisconnect<S> {
    pub fn new(inner: S, cancel: CancellationToken) -> Self {
        Self {
            inner,
            cancel,
            finished: false,
        }
    }
}

impl<S: Stream + Unpin> Stream for DetectDisconnect<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = poll {
            self.finished = true;
        }
        poll
    }
}

impl<S> Drop for DetectDisconnect<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!("Client disconnected before the stream finished");
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn test_drop_before_finish_cancels() {
        let cancel = CancellationToken::new();
        let mut wrapped = DetectDisconnect::new(stream::iter(vec![1, 2, 3]), cancel.clone());
        assert_eq!(wrapped.next().await, Some(1));
        drop(wrapped);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_finished_stream_does_not_cancel() {
        let cancel = CancellationToken::new();
        let wrapped = DetectDisconnect::new(stream::iter(vec![1, 2]), cancel.clone());
        let items: Vec<i32> = wrapped.collect().await;
        assert_eq!(items, vec![1, 2]);
        assert!(!cancel.is_cancelled());
    }
}
