//! The connection manager.
//!
//! One manager per session slot. `connect` tears down whatever transport
//! exists, bumps the generation counter, and spawns a connection task;
//! every task re-checks the generation after each await so superseded
//! transports and stale reconnect timers become no-ops instead of
//! mutating current state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use tether_core::{CredentialProvider, SessionId};
use tether_events::{ChatEntry, ClientFrame};
use tether_session::{Router, SharedView};

use crate::error::SocketError;
use crate::state::ConnectionState;
use crate::transport::{
    ABNORMAL_CLOSURE, Connector, NORMAL_CLOSURE, TransportEvent, TransportSink, TransportSource,
};

/// Outbound capacity before `send` starts failing with `ChannelClosed`.
const OUTBOUND_CAPACITY: usize = 64;

/// Connection manager configuration.
#[derive(Clone, Debug)]
pub struct SocketConfig {
    /// Base WebSocket URL, e.g. `ws://localhost:8000`.
    pub ws_url: String,
    /// Maximum automatic reconnection attempts after an abnormal close.
    pub max_reconnect_attempts: u32,
    /// Backoff unit: attempt `k` waits `k × reconnect_base_delay`.
    pub reconnect_base_delay: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000".to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_secs(2),
        }
    }
}

enum OutboundCmd {
    Frame(String),
    Close(u16),
}

#[derive(Default)]
struct Inner {
    session_id: Option<SessionId>,
    outbound: Option<mpsc::Sender<OutboundCmd>>,
    cancel: Option<CancellationToken>,
    attempts: u32,
}

/// Owns the single live transport for a session and its state machine.
pub struct SocketManager {
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialProvider>,
    router: Router,
    view: SharedView,
    config: SocketConfig,
    state_tx: watch::Sender<ConnectionState>,
    generation: AtomicU64,
    inner: Mutex<Inner>,
}

impl SocketManager {
    /// Create a manager. Returns an `Arc` because connection tasks hold a
    /// handle back to the manager.
    #[must_use]
    pub fn new(
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialProvider>,
        router: Router,
        config: SocketConfig,
    ) -> Arc<Self> {
        let view = router.view().clone();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            connector,
            credentials,
            router,
            view,
            config,
            state_tx,
            generation: AtomicU64::new(0),
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The session currently connected (or connecting), if any.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session_id.clone()
    }

    /// Connect to a session.
    ///
    /// Single-flight: any existing transport is torn down (normal-closure
    /// code) before the new dial, so there is exactly one live transport
    /// per manager. Fails fast when no bearer token is available or the
    /// configured URL is unusable; dial failures after that surface as
    /// state transitions, not errors.
    pub fn connect(self: &Arc<Self>, session_id: SessionId) -> Result<(), SocketError> {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(SocketError::MissingCredentials)?;
        let url = self.build_url(&session_id, &token)?;

        // Supersede whatever was running before touching shared state.
        self.teardown_transport();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let cancel = CancellationToken::new();
        {
            let mut inner = self.inner.lock();
            inner.session_id = Some(session_id.clone());
            inner.cancel = Some(cancel.clone());
            inner.attempts = 0;
        }
        self.set_state(ConnectionState::Connecting);
        info!(session = %session_id, "connecting");

        let manager = Arc::clone(self);
        drop(tokio::spawn(async move {
            manager.run(url, generation, cancel).await;
        }));
        Ok(())
    }

    /// Tear down the connection.
    ///
    /// Idempotent and safe to call at any time, including during a
    /// pending reconnect wait, which it deterministically cancels.
    pub fn disconnect(&self) {
        let _ = self.generation.fetch_add(1, Ordering::SeqCst);
        self.teardown_transport();
        {
            let mut inner = self.inner.lock();
            inner.session_id = None;
            inner.attempts = 0;
        }
        self.view.lock().set_connection_id(None);
        self.set_state(ConnectionState::Disconnected);
    }

    /// Send a frame.
    ///
    /// Fails synchronously with [`SocketError::NotConnected`] whenever the
    /// state is not `Open`; frames are never buffered for later delivery.
    pub fn send(&self, frame: &ClientFrame) -> Result<(), SocketError> {
        if !self.state().is_open() {
            return Err(SocketError::NotConnected);
        }
        let json = serde_json::to_string(frame)?;
        let inner = self.inner.lock();
        let outbound = inner.outbound.as_ref().ok_or(SocketError::NotConnected)?;
        outbound
            .try_send(OutboundCmd::Frame(json))
            .map_err(|_| SocketError::ChannelClosed)
    }

    /// Send a chat message and optimistically append it to the timeline.
    ///
    /// The router later drops the server's echo of this message, so it
    /// appears exactly once.
    pub fn send_chat(&self, message: &str) -> Result<(), SocketError> {
        let session_id = self.inner.lock().session_id.clone();
        self.send(&ClientFrame::chat(message, session_id))?;
        let _ = self.view.lock().push_chat(ChatEntry::local_user(message));
        Ok(())
    }

    /// Send a terminal command.
    pub fn send_terminal(&self, command: &str) -> Result<(), SocketError> {
        let session_id = self.inner.lock().session_id.clone();
        self.send(&ClientFrame::terminal(command, session_id))
    }

    fn build_url(&self, session_id: &SessionId, token: &str) -> Result<String, SocketError> {
        let base = self.config.ws_url.trim_end_matches('/');
        let raw = format!("{base}/api/ws/{session_id}?token={token}");
        let _ = Url::parse(&raw).map_err(|e| SocketError::InvalidUrl(e.to_string()))?;
        Ok(raw)
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Cancel the running connection task (if any) and ask its writer to
    /// close the transport with a normal-closure code.
    fn teardown_transport(&self) {
        let mut inner = self.inner.lock();
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        if let Some(outbound) = inner.outbound.take() {
            let _ = outbound.try_send(OutboundCmd::Close(NORMAL_CLOSURE));
        }
    }

    /// Connection task: dial, pump, and reconnect until superseded,
    /// cancelled, normally closed, or out of attempts.
    async fn run(self: Arc<Self>, url: String, generation: u64, cancel: CancellationToken) {
        loop {
            let dialed = tokio::select! {
                result = self.connector.connect(&url) => result,
                () = cancel.cancelled() => return,
            };

            match dialed {
                Ok(mut transport) => {
                    if !self.is_current(generation) {
                        // Superseded mid-dial: release the socket quietly.
                        let _ = transport.sink.close(NORMAL_CLOSURE).await;
                        return;
                    }

                    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
                    {
                        let mut inner = self.inner.lock();
                        inner.outbound = Some(outbound_tx);
                        inner.attempts = 0;
                    }
                    drop(tokio::spawn(write_loop(
                        transport.sink,
                        outbound_rx,
                        cancel.clone(),
                    )));
                    self.set_state(ConnectionState::Open);
                    info!("socket open");

                    let code = self.read_loop(transport.source.as_mut(), generation, &cancel).await;
                    if cancel.is_cancelled() || !self.is_current(generation) {
                        return;
                    }
                    {
                        let mut inner = self.inner.lock();
                        inner.outbound = None;
                    }
                    self.view.lock().set_connection_id(None);

                    if code == NORMAL_CLOSURE {
                        info!("socket closed normally");
                        self.set_state(ConnectionState::Closed);
                        return;
                    }
                    warn!(code, "socket closed abnormally");
                }
                Err(e) => {
                    if !self.is_current(generation) {
                        return;
                    }
                    warn!(error = %e, "dial failed");
                }
            }

            // Abnormal close or failed dial: bounded linear backoff.
            let attempt = {
                let mut inner = self.inner.lock();
                inner.attempts += 1;
                inner.attempts
            };
            if attempt > self.config.max_reconnect_attempts {
                warn!(
                    attempts = self.config.max_reconnect_attempts,
                    "reconnect attempts exhausted"
                );
                self.set_state(ConnectionState::Closed);
                return;
            }

            let delay = self.config.reconnect_base_delay * attempt;
            self.set_state(ConnectionState::Reconnecting);
            info!(attempt, ?delay, "reconnect scheduled");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => return,
            }
            if !self.is_current(generation) {
                // A newer connection took over while we slept.
                return;
            }
        }
    }

    /// Pump inbound events into the router until the transport closes.
    /// Returns the close code.
    async fn read_loop(
        &self,
        source: &mut dyn TransportSource,
        generation: u64,
        cancel: &CancellationToken,
    ) -> u16 {
        loop {
            let event = tokio::select! {
                event = source.next_event() => event,
                () = cancel.cancelled() => return NORMAL_CLOSURE,
            };
            if !self.is_current(generation) {
                return NORMAL_CLOSURE;
            }
            match event {
                Some(TransportEvent::Text(text)) => self.router.handle_raw(&text),
                Some(TransportEvent::Error(message)) => {
                    // Logged only; the close event drives the machine.
                    warn!(error = %message, "transport error");
                }
                Some(TransportEvent::Closed { code }) => {
                    debug!(code, "close frame received");
                    return code;
                }
                None => return ABNORMAL_CLOSURE,
            }
        }
    }
}

/// Writer task: owns the sink, drains outbound commands, and closes the
/// transport on cancellation or channel teardown.
async fn write_loop(
    mut sink: Box<dyn TransportSink>,
    mut outbound: mpsc::Receiver<OutboundCmd>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(OutboundCmd::Frame(text)) => {
                    if let Err(e) = sink.send(text).await {
                        warn!(error = %e, "socket send failed");
                    }
                }
                Some(OutboundCmd::Close(code)) => {
                    let _ = sink.close(code).await;
                    return;
                }
                None => {
                    let _ = sink.close(NORMAL_CLOSURE).await;
                    return;
                }
            },
            () = cancel.cancelled() => {
                let _ = sink.close(NORMAL_CLOSURE).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc as tokio_mpsc;
    use tokio::time::Instant;

    use tether_core::StaticCredentials;
    use tether_presence::PresenceState;
    use tether_session::SessionView;

    use crate::transport::Transport;

    /// Handle the test keeps for each accepted dial.
    struct FakeConn {
        /// Inject transport events into the manager's read loop.
        events: tokio_mpsc::UnboundedSender<TransportEvent>,
        /// Frames the manager sent.
        sent: Arc<Mutex<Vec<String>>>,
        /// Close code the manager used, once closed.
        closed: Arc<Mutex<Option<u16>>>,
    }

    struct FakeSink {
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<Mutex<Option<u16>>>,
    }

    #[async_trait]
    impl TransportSink for FakeSink {
        async fn send(&mut self, text: String) -> Result<(), SocketError> {
            self.sent.lock().push(text);
            Ok(())
        }

        async fn close(&mut self, code: u16) -> Result<(), SocketError> {
            let mut closed = self.closed.lock();
            if closed.is_none() {
                *closed = Some(code);
            }
            Ok(())
        }
    }

    struct FakeSource {
        events: tokio_mpsc::UnboundedReceiver<TransportEvent>,
    }

    #[async_trait]
    impl TransportSource for FakeSource {
        async fn next_event(&mut self) -> Option<TransportEvent> {
            self.events.recv().await
        }
    }

    /// Scripted connector: refuses the next `refusals` dials, accepts the
    /// rest, and records when each dial happened.
    struct FakeConnector {
        refusals: Mutex<VecDeque<bool>>,
        dial_times: Mutex<Vec<Instant>>,
        conns: tokio_mpsc::UnboundedSender<FakeConn>,
    }

    impl FakeConnector {
        fn new() -> (Arc<Self>, tokio_mpsc::UnboundedReceiver<FakeConn>) {
            let (conns, conns_rx) = tokio_mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    refusals: Mutex::new(VecDeque::new()),
                    dial_times: Mutex::new(Vec::new()),
                    conns,
                }),
                conns_rx,
            )
        }

        fn refuse_next(&self, count: usize) {
            let mut refusals = self.refusals.lock();
            for _ in 0..count {
                refusals.push_back(true);
            }
        }

        fn dial_count(&self) -> usize {
            self.dial_times.lock().len()
        }

        fn dial_times(&self) -> Vec<Instant> {
            self.dial_times.lock().clone()
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _url: &str) -> Result<Transport, SocketError> {
            self.dial_times.lock().push(Instant::now());
            if self.refusals.lock().pop_front().unwrap_or(false) {
                return Err(SocketError::Transport("connection refused".into()));
            }
            let (events_tx, events_rx) = tokio_mpsc::unbounded_channel();
            let sent = Arc::new(Mutex::new(Vec::new()));
            let closed = Arc::new(Mutex::new(None));
            let conn = FakeConn {
                events: events_tx,
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            let _ = self.conns.send(conn);
            Ok(Transport {
                sink: Box::new(FakeSink { sent, closed }),
                source: Box::new(FakeSource { events: events_rx }),
            })
        }
    }

    struct Harness {
        manager: Arc<SocketManager>,
        connector: Arc<FakeConnector>,
        conns: tokio_mpsc::UnboundedReceiver<FakeConn>,
        credentials: Arc<StaticCredentials>,
    }

    fn make_harness() -> Harness {
        let (connector, conns) = FakeConnector::new();
        let credentials = Arc::new(StaticCredentials::new("tok"));
        let router = Router::new(
            SessionView::shared(),
            Arc::new(Mutex::new(PresenceState::new())),
        );
        let manager = SocketManager::new(
            Arc::clone(&connector) as Arc<dyn Connector>,
            Arc::clone(&credentials) as Arc<dyn CredentialProvider>,
            router,
            SocketConfig {
                ws_url: "ws://test".into(),
                ..SocketConfig::default()
            },
        );
        Harness {
            manager,
            connector,
            conns,
            credentials,
        }
    }

    /// Let spawned tasks make progress (auto-advances the paused clock).
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn connect_and_accept(h: &mut Harness) -> FakeConn {
        h.manager.connect(SessionId::from("s1")).unwrap();
        settle().await;
        let conn = h.conns.recv().await.expect("dial accepted");
        assert_eq!(h.manager.state(), ConnectionState::Open);
        conn
    }

    #[tokio::test(start_paused = true)]
    async fn connect_opens_and_resets_attempts() {
        let mut h = make_harness();
        let _conn = connect_and_accept(&mut h).await;
        assert_eq!(h.connector.dial_count(), 1);
        assert_eq!(h.manager.session_id(), Some(SessionId::from("s1")));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_without_token_fails_fast() {
        let (connector, _conns) = FakeConnector::new();
        let credentials = Arc::new(StaticCredentials::signed_out());
        let router = Router::new(
            SessionView::shared(),
            Arc::new(Mutex::new(PresenceState::new())),
        );
        let manager = SocketManager::new(
            connector as Arc<dyn Connector>,
            credentials as Arc<dyn CredentialProvider>,
            router,
            SocketConfig::default(),
        );
        let err = manager.connect(SessionId::from("s1")).unwrap_err();
        assert!(matches!(err, SocketError::MissingCredentials));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn url_encodes_session_and_token() {
        let manager_cfg = SocketConfig {
            ws_url: "ws://host:8000/".into(),
            ..SocketConfig::default()
        };
        let (connector, _conns) = FakeConnector::new();
        let router = Router::new(
            SessionView::shared(),
            Arc::new(Mutex::new(PresenceState::new())),
        );
        let manager = SocketManager::new(
            connector as Arc<dyn Connector>,
            Arc::new(StaticCredentials::new("tok-9")) as Arc<dyn CredentialProvider>,
            router,
            manager_cfg,
        );
        let url = manager
            .build_url(&SessionId::from("abc"), "tok-9")
            .unwrap();
        assert_eq!(url, "ws://host:8000/api/ws/abc?token=tok-9");
    }

    #[tokio::test(start_paused = true)]
    async fn send_fails_synchronously_when_not_open() {
        let h = make_harness();
        let frame = ClientFrame::chat("hi", None);
        assert!(matches!(
            h.manager.send(&frame),
            Err(SocketError::NotConnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn send_fails_during_reconnect_wait() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Reconnecting);
        assert!(matches!(
            h.manager.send(&ClientFrame::chat("hi", None)),
            Err(SocketError::NotConnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn frames_reach_the_sink() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        h.manager.send_terminal("ls -la").unwrap();
        settle().await;
        let sent = conn.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        let frame: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(frame["type"], "terminal");
        assert_eq!(frame["data"]["command"], "ls -la");
        assert_eq!(frame["session_id"], "s1");
    }

    #[tokio::test(start_paused = true)]
    async fn send_chat_appends_optimistically() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        h.manager.send_chat("hello there").unwrap();
        settle().await;

        assert_eq!(conn.sent.lock().len(), 1);
        let view = h.manager.router.view().lock();
        assert_eq!(view.chat().len(), 1);
        assert_eq!(view.chat()[0].text, "hello there");
    }

    #[tokio::test(start_paused = true)]
    async fn inbound_frames_reach_the_router() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Text(
            r#"{"type":"chat","data":{"message":"from server","sender":"assistant"},
                "timestamp":"2026-03-01T12:00:00Z"}"#
                .to_string(),
        ));
        settle().await;
        let view = h.manager.router.view().lock();
        assert_eq!(view.chat().len(), 1);
        assert_eq!(view.chat()[0].text, "from server");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_alone_does_not_change_state() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Error("tls hiccup".into()));
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Open);
        assert_eq!(h.connector.dial_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn normal_close_is_terminal() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Closed { code: 1000 });
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Closed);

        // No reconnect, ever.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.connector.dial_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abnormal_close_schedules_linear_backoff() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Reconnecting);

        // Not yet at 2000ms...
        tokio::time::sleep(Duration::from_millis(1990)).await;
        assert_eq!(h.connector.dial_count(), 1);
        // ...exactly after it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.connector.dial_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_delays_grow_per_attempt() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;

        // Every redial fails, so attempts 1..=5 run back to back.
        h.connector.refuse_next(5);
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });

        // Let the whole schedule play out.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let times = h.connector.dial_times();
        assert_eq!(times.len(), 6); // initial + 5 reconnects

        let gaps: Vec<u64> = times
            .windows(2)
            .map(|w| w[1].duration_since(w[0]).as_millis() as u64)
            .collect();
        // 2s, 4s, 6s, 8s, 10s (settle slack is ≤ a few ms)
        for (i, gap) in gaps.iter().enumerate() {
            let expected = 2000 * (i as u64 + 1);
            assert!(
                (*gap >= expected) && (*gap < expected + 50),
                "attempt {} gap {gap}ms, expected ~{expected}ms",
                i + 1
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_exhaustion_closes_without_sixth_attempt() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        h.connector.refuse_next(5);
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.manager.state(), ConnectionState::Closed);
        assert_eq!(h.connector.dial_count(), 6);

        // Terminal: nothing else gets scheduled.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.connector.dial_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_resets_the_attempt_counter() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;

        // First abnormal close: reconnect at +2s succeeds.
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });
        tokio::time::sleep(Duration::from_millis(2100)).await;
        let conn2 = h.conns.recv().await.expect("redial accepted");
        assert_eq!(h.manager.state(), ConnectionState::Open);

        // Second abnormal close: delay is 2s again, not 4s.
        let before = h.connector.dial_count();
        let _ = conn2.events.send(TransportEvent::Closed { code: 1006 });
        settle().await;
        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(h.connector.dial_count(), before);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.connector.dial_count(), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_pending_reconnect() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        let _ = conn.events.send(TransportEvent::Closed { code: 1006 });
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Reconnecting);

        h.manager.disconnect();
        assert_eq!(h.manager.state(), ConnectionState::Disconnected);
        assert!(h.manager.session_id().is_none());

        // The cancelled timer never fires a dial.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.connector.dial_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_idempotent() {
        let mut h = make_harness();
        let _conn = connect_and_accept(&mut h).await;
        h.manager.disconnect();
        h.manager.disconnect();
        h.manager.disconnect();
        assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_closes_transport_normally() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        h.manager.disconnect();
        settle().await;
        assert_eq!(*conn.closed.lock(), Some(NORMAL_CLOSURE));
    }

    #[tokio::test(start_paused = true)]
    async fn new_connect_supersedes_old_transport() {
        let mut h = make_harness();
        let conn_a = connect_and_accept(&mut h).await;

        // Second connect tears A down and dials B.
        h.manager.connect(SessionId::from("s2")).unwrap();
        settle().await;
        let _conn_b = h.conns.recv().await.expect("second dial");
        assert_eq!(h.manager.state(), ConnectionState::Open);
        assert_eq!(h.manager.session_id(), Some(SessionId::from("s2")));
        assert_eq!(*conn_a.closed.lock(), Some(NORMAL_CLOSURE));

        // Ghost events from A are no-ops: no reconnect loop, no state
        // change, no extra dial.
        let _ = conn_a.events.send(TransportEvent::Closed { code: 1006 });
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.manager.state(), ConnectionState::Open);
        assert_eq!(h.connector.dial_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_text_after_supersede_is_dropped() {
        let mut h = make_harness();
        let conn_a = connect_and_accept(&mut h).await;
        h.manager.connect(SessionId::from("s2")).unwrap();
        settle().await;
        let _conn_b = h.conns.recv().await.expect("second dial");

        let _ = conn_a.events.send(TransportEvent::Text(
            r#"{"type":"chat","data":{"message":"ghost","sender":"assistant"},
                "timestamp":"2026-03-01T12:00:00Z"}"#
                .to_string(),
        ));
        settle().await;
        assert!(h.manager.router.view().lock().chat().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn state_watch_observes_transitions() {
        let mut h = make_harness();
        let mut rx = h.manager.subscribe_state();
        assert_eq!(*rx.borrow(), ConnectionState::Disconnected);

        let conn = connect_and_accept(&mut h).await;
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Open);

        let _ = conn.events.send(TransportEvent::Closed { code: 1000 });
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn source_ending_without_close_frame_is_abnormal() {
        let mut h = make_harness();
        let conn = connect_and_accept(&mut h).await;
        drop(conn); // drops the event sender: read loop sees end-of-stream
        settle().await;
        assert_eq!(h.manager.state(), ConnectionState::Reconnecting);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_teardown_keeps_credentials_seam_intact() {
        // The socket layer never clears credentials on its own; only the
        // streaming client's 401 handling does.
        let mut h = make_harness();
        let _conn = connect_and_accept(&mut h).await;
        h.manager.disconnect();
        assert!(!h.credentials.is_signed_out());
    }
}
