//! Feed lifecycle and worker loop

use std::sync::Arc;
use std::time::Instant;

use livefeed_core::{ChannelStatus, LiveFeedError, LiveFeedResult, OriginTime};
use livefeed_state::{ApplyEngine, Diagnostic, EngineState, MessageOutcome, TargetResolver};
use livefeed_wire::ChannelEvent;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    ChannelAdapter, ChannelSink, DiagnosticFeed, DiagnosticRecord, FeedDiagnostic, Inbound,
    InboundReceiver, LatencySample, LatencyWindow, LiveFeedConfig, RuntimeStats,
};

/// Lifecycle phase. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Open,
    Closed,
}

/// Everything the worker mutates, behind one lock
#[derive(Debug)]
pub struct FeedCore {
    engine: ApplyEngine,
    stats: RuntimeStats,
    latency: LatencyWindow,
    diagnostics: DiagnosticFeed,
    /// The channel dropped its sink and the worker stopped
    detached: bool,
}

impl FeedCore {
    pub fn new(config: &LiveFeedConfig) -> Self {
        FeedCore {
            engine: ApplyEngine::new(),
            stats: RuntimeStats::default(),
            latency: LatencyWindow::new(config.latency_window),
            diagnostics: DiagnosticFeed::new(config.max_diagnostics),
            detached: false,
        }
    }

    pub fn engine_state(&self) -> EngineState {
        *self.engine.state()
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Handle one inbound item to completion
    pub fn handle(&mut self, inbound: Inbound, resolver: &dyn TargetResolver) {
        match inbound {
            Inbound::Frame(frame) => match ChannelEvent::decode(&frame) {
                Ok(event) => self.handle_event(event, resolver),
                Err(e) => {
                    self.stats.undecodable_frames += 1;
                    warn!(error = %e, len = frame.len(), "dropping undecodable frame");
                    self.report(FeedDiagnostic::UndecodableFrame(e.to_string()));
                }
            },
            Inbound::Event(event) => self.handle_event(event, resolver),
        }
    }

    /// Handle one decoded channel event
    pub fn handle_event(&mut self, event: ChannelEvent, resolver: &dyn TargetResolver) {
        self.stats.events_received += 1;

        if !event.status.is_message() {
            let detail = event.detail();
            match event.status {
                ChannelStatus::Error => warn!(detail = ?detail, "channel reported an error"),
                status => info!(status = %status, detail = ?detail, "channel status"),
            }
            self.report(FeedDiagnostic::Channel {
                status: event.status,
                detail,
            });
            return;
        }

        if let Some(origin) = event.data.as_ref().and_then(|data| data.ts) {
            self.latency.record(LatencySample {
                timestamp: Instant::now(),
                latency: origin.latency_until(OriginTime::now()),
            });
        }

        let message = match event.into_message() {
            Ok(message) => message,
            Err(e) => {
                self.stats.messages_malformed += 1;
                let diagnostic = Diagnostic::malformed_message(e.to_string());
                diagnostic.log();
                self.report(FeedDiagnostic::Engine(diagnostic));
                return;
            }
        };

        match self.engine.process(message, resolver) {
            MessageOutcome::Applied(result) => {
                self.stats.record_result(&result);
                debug!(
                    ts = %result.logical_ts,
                    applied = result.applied,
                    gated = result.gated,
                    "message applied"
                );
                for diagnostic in result.diagnostics {
                    self.report(FeedDiagnostic::Engine(diagnostic));
                }
            }
            MessageOutcome::Rejected(rejection) => {
                self.stats.messages_rejected += 1;
                self.report(FeedDiagnostic::Engine(rejection.into()));
            }
        }
    }

    fn report(&mut self, event: FeedDiagnostic) {
        self.diagnostics.push(event, Instant::now());
    }
}

struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// One subscription driving the state engine
pub struct LiveFeed<C: ChannelAdapter> {
    config: LiveFeedConfig,
    channel: C,
    resolver: Arc<dyn TargetResolver>,
    core: Arc<Mutex<FeedCore>>,
    phase: Phase,
    worker: Option<Worker>,
}

impl<C: ChannelAdapter> LiveFeed<C> {
    pub fn new(config: LiveFeedConfig, channel: C, resolver: Arc<dyn TargetResolver>) -> Self {
        let core = Arc::new(Mutex::new(FeedCore::new(&config)));
        LiveFeed {
            config,
            channel,
            resolver,
            core,
            phase: Phase::Pending,
            worker: None,
        }
    }

    pub fn config(&self) -> &LiveFeedConfig {
        &self.config
    }

    /// Current phase. An open feed whose channel went away reports `Closed`.
    pub fn phase(&self) -> Phase {
        if self.phase == Phase::Open && self.core.lock().detached {
            Phase::Closed
        } else {
            self.phase
        }
    }

    /// Subscribe and spawn the worker. Must run inside a tokio runtime.
    pub fn start(&mut self) -> LiveFeedResult<()> {
        match self.phase() {
            Phase::Open => return Err(LiveFeedError::AlreadyOpen),
            Phase::Closed => return Err(LiveFeedError::AlreadyClosed),
            Phase::Pending => {}
        }
        self.config.validate()?;

        *self.core.lock() = FeedCore::new(&self.config);

        let (sink, rx) = ChannelSink::channel(self.config.channel_capacity);
        let token = self.config.token();
        self.channel.subscribe(&token, sink)?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_worker(
            rx,
            shutdown_rx,
            Arc::clone(&self.core),
            Arc::clone(&self.resolver),
        ));
        self.worker = Some(Worker { shutdown, handle });
        self.phase = Phase::Open;

        info!(token = %token, capacity = self.config.channel_capacity, "feed opened");
        Ok(())
    }

    /// Unsubscribe and stop the worker. Idempotent.
    pub async fn close(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        self.channel.unsubscribe();
        self.phase = Phase::Closed;

        if let Some(worker) = self.worker.take() {
            let _ = worker.shutdown.send(());
            if let Err(e) = worker.handle.await {
                warn!(error = %e, "feed worker ended abnormally");
            }
        }
        info!("feed closed");
    }

    pub fn stats(&self) -> RuntimeStats {
        self.core.lock().stats.clone()
    }

    pub fn engine_state(&self) -> EngineState {
        self.core.lock().engine_state()
    }

    pub fn latency_samples(&self) -> Vec<LatencySample> {
        let mut core = self.core.lock();
        core.latency.purge(Instant::now());
        core.latency.samples()
    }

    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        self.core.lock().diagnostics.records()
    }

    pub fn clear_diagnostics(&self) {
        self.core.lock().diagnostics.clear();
    }
}

impl<C: ChannelAdapter> Drop for LiveFeed<C> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.handle.abort();
        }
        if self.phase == Phase::Open {
            self.channel.unsubscribe();
        }
    }
}

async fn run_worker(
    mut rx: InboundReceiver,
    mut shutdown: oneshot::Receiver<()>,
    core: Arc<Mutex<FeedCore>>,
    resolver: Arc<dyn TargetResolver>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            inbound = rx.recv() => match inbound {
                Some(inbound) => {
                    let mut core = core.lock();
                    core.handle(inbound, resolver.as_ref());
                }
                None => {
                    warn!("channel dropped the inbound queue, feed stopped");
                    core.lock().detached = true;
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalChannel;
    use livefeed_core::LogicalTimestamp;
    use livefeed_state::{MemoryGraph, Severity};
    use serde_json::json;
    use std::time::Duration;

    fn event(ts: i64, payload: serde_json::Value) -> ChannelEvent {
        let mut payload = payload;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("__TIMESTAMP".into(), json!(ts));
        }
        ChannelEvent::message(OriginTime::now(), payload)
    }

    fn feed(graph: &Arc<MemoryGraph>) -> (LiveFeed<LocalChannel>, LocalChannel) {
        let channel = LocalChannel::new();
        let resolver: Arc<dyn TargetResolver> = graph.clone();
        let feed = LiveFeed::new(LiveFeedConfig::new("abcd1234"), channel.clone(), resolver);
        (feed, channel)
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[test]
    fn test_core_handles_frames() {
        let graph = MemoryGraph::new();
        let node = graph.add("score");
        let mut core = FeedCore::new(&LiveFeedConfig::new("t"));

        let frame = br#"{"status":"message","data":{"ts":0,"payload":{"__TIMESTAMP":3,"score":{"home":1}}}}"#;
        core.handle(Inbound::Frame(bytes::Bytes::from_static(frame)), &graph);
        core.handle(Inbound::Frame(bytes::Bytes::from_static(b"garbage")), &graph);

        assert_eq!(node.field("home"), Some(json!(1)));
        assert_eq!(core.stats().messages_accepted, 1);
        assert_eq!(core.stats().undecodable_frames, 1);
        assert_eq!(core.stats().events_received, 1);
        assert_eq!(
            core.engine_state().last_accepted(),
            Some(LogicalTimestamp::new(3))
        );
    }

    #[test]
    fn test_core_reports_status_events() {
        let graph = MemoryGraph::new();
        let mut core = FeedCore::new(&LiveFeedConfig::new("t"));

        core.handle_event(ChannelEvent::new(ChannelStatus::Open), &graph);
        core.handle(
            Inbound::Frame(bytes::Bytes::from_static(
                br#"{"status":"error","data":"token rejected"}"#,
            )),
            &graph,
        );

        let records = core.diagnostics.records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].event,
            FeedDiagnostic::Channel {
                status: ChannelStatus::Error,
                detail: Some("token rejected".into())
            }
        );
        assert_eq!(records[1].event.severity(), Severity::Error);
        assert!(!core.engine_state().is_initialized());
    }

    #[test]
    fn test_core_bad_timestamp_discards_message() {
        let graph = MemoryGraph::new();
        let node = graph.add("A");
        let mut core = FeedCore::new(&LiveFeedConfig::new("t"));

        core.handle_event(
            ChannelEvent::message(
                OriginTime::now(),
                json!({ "__TIMESTAMP": "x", "A": { "v": 1 } }),
            ),
            &graph,
        );

        assert_eq!(node.apply_count(), 0);
        assert_eq!(core.stats().messages_malformed, 1);
        assert!(matches!(
            core.diagnostics.records()[0].event,
            FeedDiagnostic::Engine(Diagnostic::MalformedEntry { key: None, .. })
        ));
    }

    #[test]
    fn test_core_records_latency() {
        let graph = MemoryGraph::new();
        let mut core = FeedCore::new(&LiveFeedConfig::new("t"));
        let origin = OriginTime::from_millis(OriginTime::now().as_millis() - 250);

        core.handle_event(ChannelEvent::message(origin, json!({ "__TIMESTAMP": 1 })), &graph);
        core.handle_event(
            ChannelEvent::message(OriginTime::from_millis(i64::MAX), json!({})),
            &graph,
        );

        let samples = core.latency.samples();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].latency >= Duration::from_millis(250));
        assert_eq!(samples[1].latency, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_feed_lifecycle() {
        let graph = Arc::new(MemoryGraph::new());
        let node = graph.add("score");
        let (mut feed, channel) = feed(&graph);

        assert_eq!(feed.phase(), Phase::Pending);
        feed.start().unwrap();
        assert_eq!(feed.phase(), Phase::Open);
        assert!(matches!(feed.start(), Err(LiveFeedError::AlreadyOpen)));
        assert_eq!(channel.token().unwrap().as_str(), "abcd1234");

        channel
            .publish(event(5, json!({ "score": { "home": 5 } })))
            .await
            .unwrap();
        channel
            .publish(event(3, json!({ "score": { "home": 3 } })))
            .await
            .unwrap();
        wait_for(|| feed.stats().events_received == 2).await;

        assert_eq!(node.field("home"), Some(json!(5)));
        let stats = feed.stats();
        assert_eq!(stats.messages_accepted, 1);
        assert_eq!(stats.messages_rejected, 1);
        assert_eq!(feed.latency_samples().len(), 2);
        assert_eq!(feed.diagnostics().len(), 1);

        feed.clear_diagnostics();
        assert!(feed.diagnostics().is_empty());

        feed.close().await;
        assert_eq!(feed.phase(), Phase::Closed);
        assert!(!channel.is_subscribed());
        feed.close().await;
        assert!(matches!(feed.start(), Err(LiveFeedError::AlreadyClosed)));
    }

    #[tokio::test]
    async fn test_events_after_close_ignored() {
        let graph = Arc::new(MemoryGraph::new());
        let node = graph.add("A");
        let (mut feed, channel) = feed(&graph);

        feed.start().unwrap();
        feed.close().await;

        let result = channel.publish(event(1, json!({ "A": { "v": 1 } }))).await;
        assert!(matches!(result, Err(LiveFeedError::ChannelClosed)));
        assert_eq!(node.apply_count(), 0);
        assert_eq!(feed.stats().events_received, 0);
    }

    #[tokio::test]
    async fn test_channel_drop_closes_feed() {
        let graph = Arc::new(MemoryGraph::new());
        let (mut feed, channel) = feed(&graph);

        feed.start().unwrap();
        let mut adapter = channel.clone();
        adapter.unsubscribe();

        wait_for(|| feed.phase() == Phase::Closed).await;
        assert!(feed.core.lock().is_detached());
        assert!(matches!(feed.start(), Err(LiveFeedError::AlreadyClosed)));

        feed.close().await;
        assert_eq!(feed.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let graph = Arc::new(MemoryGraph::new());
        let resolver: Arc<dyn TargetResolver> = graph;
        let mut feed = LiveFeed::new(LiveFeedConfig::default(), LocalChannel::new(), resolver);

        assert!(matches!(feed.start(), Err(LiveFeedError::InvalidConfig(_))));
        assert_eq!(feed.phase(), Phase::Pending);
    }
}
