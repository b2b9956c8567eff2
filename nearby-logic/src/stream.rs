use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    feed::{FeedConnection, FeedTransport, nearby_path},
    location::{LocationId, Radius},
    overlay::OverlayManager,
    record::NearbyRecord,
    retry::RetryPolicy,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    /// No session, or the session was superseded/cancelled
    #[default]
    Closed,
    /// Waiting for the feed connection to be established
    Connecting,
    /// Receiving nearby records
    Open,
    /// The feed dropped, waiting to reconnect
    Retrying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// A new session was requested
    Start,
    /// The connection was established
    Connected,
    /// The connection attempt failed
    ConnectFailed,
    /// The server closed an open connection or it errored
    Dropped,
    /// The retry delay is over
    RetryElapsed,
    /// Reconnect attempts are exhausted
    GiveUp,
    /// The session was superseded or cancelled
    Cancel,
}

impl StreamState {
    /// Transition function for the feed lifecycle, events that don't apply to the current
    /// state leave it unchanged.
    pub fn next(self, event: StreamEvent) -> Self {
        match (self, event) {
            (_, StreamEvent::Cancel | StreamEvent::GiveUp) => Self::Closed,
            (Self::Closed, StreamEvent::Start) => Self::Connecting,
            (Self::Connecting, StreamEvent::Connected) => Self::Open,
            (Self::Connecting, StreamEvent::ConnectFailed) => Self::Retrying,
            (Self::Open, StreamEvent::Dropped) => Self::Retrying,
            (Self::Retrying, StreamEvent::RetryElapsed) => Self::Connecting,
            (state, _) => state,
        }
    }
}

struct Shared<H> {
    state: StreamState,
    records: Vec<NearbyRecord>,
    handles: Vec<H>,
}

struct ActiveSession {
    location_id: LocationId,
    radius: Radius,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the live nearby feed for a single location.
///
/// At most one session runs at a time, starting a new one always finishes tearing down
/// the previous one (connection closed, overlays and records cleared) before connecting.
pub struct NearbyStream<F: FeedTransport, O: OverlayManager> {
    transport: Arc<F>,
    overlays: O,
    retry: RetryPolicy,
    max_retries: Option<u32>,
    shared: Mutex<Shared<O::Handle>>,
    active: Mutex<Option<ActiveSession>>,
}

impl<F: FeedTransport, O: OverlayManager> NearbyStream<F, O> {
    pub fn new(
        transport: Arc<F>,
        overlays: O,
        retry: RetryPolicy,
        max_retries: Option<u32>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            overlays,
            retry,
            max_retries,
            shared: Mutex::new(Shared {
                state: StreamState::Closed,
                records: Vec::new(),
                handles: Vec::new(),
            }),
            active: Mutex::new(None),
        })
    }

    pub async fn state(&self) -> StreamState {
        self.shared.lock().await.state
    }

    pub async fn records(&self) -> Vec<NearbyRecord> {
        self.shared.lock().await.records.clone()
    }

    /// The location and radius of the running session, `None` once it was cancelled or
    /// gave up reconnecting
    pub async fn session(&self) -> Option<(LocationId, Radius)> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|s| !s.task.is_finished())
            .map(|s| (s.location_id.clone(), s.radius))
    }

    async fn apply(&self, event: StreamEvent) -> StreamState {
        let mut shared = self.shared.lock().await;
        let next = shared.state.next(event);
        if next != shared.state {
            debug!("Nearby feed {:?} -> {next:?} ({event:?})", shared.state);
        }
        shared.state = next;
        next
    }

    /// Replace the current session (if any) with a new one for `location_id` and `radius`
    pub async fn start_session(self: &Arc<Self>, location_id: LocationId, radius: Radius) {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            self.close_session(previous).await;
        }

        self.clear().await;

        let path = nearby_path(&location_id, radius);
        let cancel = CancellationToken::new();

        self.apply(StreamEvent::Start).await;
        info!("Opening nearby feed {path}");

        let task = tokio::spawn({
            let stream = self.clone();
            let cancel = cancel.clone();
            async move {
                stream.run_session(path, cancel).await;
            }
        });

        *active = Some(ActiveSession {
            location_id,
            radius,
            cancel,
            task,
        });
    }

    /// Stop the current session, does nothing if there isn't one
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        if let Some(session) = active.take() {
            self.close_session(session).await;
        }
    }

    async fn close_session(&self, session: ActiveSession) {
        session.cancel.cancel();
        if let Err(why) = session.task.await {
            error!(
                "Nearby session for {} ended abnormally: {why:?}",
                session.location_id
            );
        }
        self.apply(StreamEvent::Cancel).await;
    }

    async fn clear(&self) {
        let mut shared = self.shared.lock().await;
        for handle in shared.handles.drain(..) {
            self.overlays.remove(handle);
        }
        self.overlays.clear_all();
        shared.records.clear();
    }

    async fn run_session(&self, path: String, cancel: CancellationToken) {
        let mut failures = 0_u32;

        loop {
            let res = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return;
                }

                res = self.transport.connect(&path) => res,
            };

            match res {
                Ok(conn) => {
                    self.apply(StreamEvent::Connected).await;
                    info!("Nearby feed {path} connected");
                    failures = 0;

                    if self.pump(conn, &cancel).await {
                        return;
                    }

                    self.apply(StreamEvent::Dropped).await;
                }
                Err(why) => {
                    warn!("Couldn't connect to nearby feed {path}: {why:?}");
                    self.apply(StreamEvent::ConnectFailed).await;
                }
            }

            failures = failures.saturating_add(1);

            if self.max_retries.is_some_and(|max| failures > max) {
                error!("Giving up on nearby feed {path} after {failures} failures");
                self.apply(StreamEvent::GiveUp).await;
                return;
            }

            let delay = self.retry.delay(failures);
            debug!("Reconnecting to {path} in {delay:?}");

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return;
                }

                _ = tokio::time::sleep(delay) => {}
            }

            self.apply(StreamEvent::RetryElapsed).await;
        }
    }

    /// Consume frames until the connection ends, returns `true` if the session was
    /// cancelled.
    async fn pump(&self, mut conn: F::Connection, cancel: &CancellationToken) -> bool {
        loop {
            let frame = tokio::select! {
                biased;

                _ = cancel.cancelled() => None,

                frame = conn.next_frame() => Some(frame),
            };

            match frame {
                None => {
                    conn.close().await;
                    return true;
                }
                Some(Some(Ok(text))) => self.accept_frame(&text).await,
                Some(Some(Err(why))) => {
                    warn!("Nearby feed error: {why:?}");
                    return false;
                }
                Some(None) => {
                    info!("Nearby feed closed by server");
                    return false;
                }
            }
        }
    }

    async fn accept_frame(&self, text: &str) {
        match NearbyRecord::from_frame(text) {
            Ok(record) => {
                let mut shared = self.shared.lock().await;
                let handle = self.overlays.place(&record);
                shared.handles.push(handle);
                shared.records.push(record);
            }
            Err(why) => {
                warn!("Dropping malformed nearby frame {text:?}: {why:?}");
            }
        }
    }
}
