//! Channel adapter seam
//!
//! The adapter owns the real-time subscription. It pushes every callback into
//! a [`ChannelSink`], which feeds the bounded queue read by the worker.

use std::sync::Arc;

use bytes::Bytes;
use livefeed_core::{LiveFeedError, LiveFeedResult, SubscriptionToken};
use livefeed_wire::ChannelEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Inbound item: raw JSON or an already-decoded event
#[derive(Clone, Debug)]
pub enum Inbound {
    Frame(Bytes),
    Event(ChannelEvent),
}

impl From<Bytes> for Inbound {
    fn from(frame: Bytes) -> Self {
        Inbound::Frame(frame)
    }
}

impl From<ChannelEvent> for Inbound {
    fn from(event: ChannelEvent) -> Self {
        Inbound::Event(event)
    }
}

/// Inbound queue receiver
pub type InboundReceiver = mpsc::Receiver<Inbound>;

/// Sending half handed to the adapter on subscribe
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Inbound>,
}

impl ChannelSink {
    /// Create a sink and the queue it feeds
    pub fn channel(capacity: usize) -> (ChannelSink, InboundReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSink { tx }, rx)
    }

    /// Queue an item, waiting for room
    pub async fn deliver(&self, inbound: impl Into<Inbound>) -> LiveFeedResult<()> {
        self.tx
            .send(inbound.into())
            .await
            .map_err(|_| LiveFeedError::ChannelClosed)
    }

    /// Queue an item without waiting
    pub fn try_deliver(&self, inbound: impl Into<Inbound>) -> LiveFeedResult<()> {
        self.tx.try_send(inbound.into()).map_err(|e| match e {
            TrySendError::Full(_) => LiveFeedError::ChannelFull,
            TrySendError::Closed(_) => LiveFeedError::ChannelClosed,
        })
    }

    /// The worker has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Subscribe/unsubscribe capability of a real-time channel
pub trait ChannelAdapter: Send {
    /// Open the subscription. Events go to `sink` until unsubscribed.
    fn subscribe(&mut self, token: &SubscriptionToken, sink: ChannelSink) -> LiveFeedResult<()>;

    /// Tear the subscription down. Must be safe to call more than once.
    fn unsubscribe(&mut self);
}

#[derive(Debug, Default)]
struct LocalInner {
    token: Option<SubscriptionToken>,
    sink: Option<ChannelSink>,
    subscriptions: usize,
}

/// In-process channel. Clones share one subscription, so a host can keep a
/// handle for publishing after giving the adapter to the feed.
#[derive(Clone, Debug, Default)]
pub struct LocalChannel {
    inner: Arc<Mutex<LocalInner>>,
}

impl LocalChannel {
    pub fn new() -> Self {
        LocalChannel::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.lock().sink.is_some()
    }

    /// Token of the current subscription
    pub fn token(&self) -> Option<SubscriptionToken> {
        self.inner.lock().token.clone()
    }

    /// How many times `subscribe` succeeded
    pub fn subscriptions(&self) -> usize {
        self.inner.lock().subscriptions
    }

    fn sink(&self) -> LiveFeedResult<ChannelSink> {
        self.inner
            .lock()
            .sink
            .clone()
            .ok_or(LiveFeedError::ChannelClosed)
    }

    /// Publish an event, waiting for queue room
    pub async fn publish(&self, event: ChannelEvent) -> LiveFeedResult<()> {
        let sink = self.sink()?;
        sink.deliver(event).await
    }

    /// Publish raw JSON, waiting for queue room
    pub async fn publish_frame(&self, frame: impl Into<Bytes>) -> LiveFeedResult<()> {
        let sink = self.sink()?;
        sink.deliver(frame.into()).await
    }

    /// Publish without waiting
    pub fn try_publish(&self, inbound: impl Into<Inbound>) -> LiveFeedResult<()> {
        self.sink()?.try_deliver(inbound)
    }
}

impl ChannelAdapter for LocalChannel {
    fn subscribe(&mut self, token: &SubscriptionToken, sink: ChannelSink) -> LiveFeedResult<()> {
        let mut inner = self.inner.lock();
        if inner.sink.is_some() {
            return Err(LiveFeedError::SubscriptionFailed(
                "channel already subscribed".into(),
            ));
        }
        inner.token = Some(token.clone());
        inner.sink = Some(sink);
        inner.subscriptions += 1;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        let mut inner = self.inner.lock();
        inner.sink = None;
        inner.token = None;
    }
}
