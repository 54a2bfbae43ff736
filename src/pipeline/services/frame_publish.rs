use crate::error::AppError;
use crate::pipeline::types::FrameUpdate;
use futures::future::{BoxFuture, FutureExt};
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tower::Service;

/// Fans per-frame updates out to rendering and persistence observers.
/// Sending never waits on a subscriber; slow subscribers lag and lose updates.
#[derive(Clone)]
pub struct UpdatePublishingService {
    update_tx: broadcast::Sender<FrameUpdate>,
}

impl UpdatePublishingService {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<FrameUpdate>) {
        let (update_tx, update_rx) = broadcast::channel(capacity);
        (Self { update_tx }, update_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameUpdate> {
        self.update_tx.subscribe()
    }

    pub fn subscribe_stream(&self) -> BroadcastStream<FrameUpdate> {
        BroadcastStream::new(self.update_tx.subscribe())
    }

    /// Returns how many subscribers received the update.
    pub fn publish(&self, update: FrameUpdate) -> usize {
        self.update_tx.send(update).unwrap_or(0)
    }
}

impl Service<FrameUpdate> for UpdatePublishingService {
    type Response = usize;
    type Error = AppError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, update: FrameUpdate) -> Self::Future {
        let delivered = self.publish(update);
        async move { Ok::<_, AppError>(delivered) }.boxed()
    }
}
