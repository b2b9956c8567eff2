use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{anyhow, bail};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    FeedConnection, FeedTransport, Geocoder, OverlayManager, PersistenceClient,
    StateUpdateSender,
    location::{Coordinates, LocationId, LocationPayload, Radius},
    prelude::*,
    record::NearbyRecord,
};

/// Let every spawned task run until it blocks, with paused time this only advances the
/// clock by a millisecond.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Ordered log of collaborator calls shared between mocks, used to check call ordering
#[derive(Clone, Default)]
pub struct EventLog(Arc<std::sync::Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Number of entries starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

type FrameTx = mpsc::UnboundedSender<Result<String>>;
type FrameRx = mpsc::UnboundedReceiver<Result<String>>;

/// Server side of a [MockConnection]
pub struct MockFeedServer {
    pub path: String,
    tx: FrameTx,
    closed: CancellationToken,
}

impl MockFeedServer {
    pub fn send(&self, text: String) {
        self.tx.send(Ok(text)).ok();
    }

    pub fn fail(&self, why: &str) {
        self.tx.send(Err(anyhow!("{why}"))).ok();
    }

    /// Close the connection from the server side
    pub fn hang_up(self) {}

    pub fn closed_by_client(&self) -> bool {
        self.closed.is_cancelled()
    }
}

pub struct MockConnection {
    path: String,
    rx: FrameRx,
    closed: CancellationToken,
    log: EventLog,
}

impl FeedConnection for MockConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }

    async fn close(self) {
        self.log.push(format!("close {}", self.path));
        self.closed.cancel();
    }
}

pub struct MockFeed {
    log: EventLog,
    failures: AtomicU32,
    servers_tx: mpsc::UnboundedSender<MockFeedServer>,
    servers_rx: Mutex<mpsc::UnboundedReceiver<MockFeedServer>>,
}

impl MockFeed {
    pub fn new(log: EventLog) -> Self {
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        Self {
            log,
            failures: AtomicU32::new(0),
            servers_tx,
            servers_rx: Mutex::new(servers_rx),
        }
    }

    /// Make the next `n` connection attempts fail
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Wait for the next successful connection
    pub async fn accept(&self) -> MockFeedServer {
        self.servers_rx
            .lock()
            .await
            .recv()
            .await
            .expect("Feed dropped")
    }

    pub fn connects(&self) -> Vec<String> {
        self.log
            .entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("connect ").map(str::to_string))
            .collect()
    }
}

impl FeedTransport for MockFeed {
    type Connection = MockConnection;

    async fn connect(&self, path: &str) -> Result<MockConnection> {
        self.log.push(format!("connect {path}"));

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if failing {
            bail!("Connection refused");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        self.servers_tx
            .send(MockFeedServer {
                path: path.to_string(),
                tx,
                closed: closed.clone(),
            })
            .ok();

        Ok(MockConnection {
            path: path.to_string(),
            rx,
            closed,
            log: self.log.clone(),
        })
    }
}

pub struct RecordingOverlay {
    log: EventLog,
    next: AtomicUsize,
}

impl RecordingOverlay {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            next: AtomicUsize::new(0),
        }
    }
}

impl OverlayManager for RecordingOverlay {
    type Handle = usize;

    fn place(&self, record: &NearbyRecord) -> usize {
        self.log.push(format!("place {}", record.name));
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn remove(&self, _handle: usize) {
        self.log.push("remove");
    }

    fn clear_all(&self) {
        self.log.push("clear_all");
    }
}

pub struct MockGeocoder {
    result: Mutex<Option<Coordinates>>,
    calls: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn succeeding(coords: Coordinates) -> Self {
        Self {
            result: Mutex::new(Some(coords)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Change the answer for future lookups, `None` makes them fail
    pub async fn set_result(&self, coords: Option<Coordinates>) {
        *self.result.lock().await = coords;
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates> {
        self.calls.lock().await.push(address.to_string());
        self.result
            .lock()
            .await
            .ok_or_else(|| anyhow!("ZERO_RESULTS"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistCall {
    Create(LocationPayload),
    Update(LocationId, LocationPayload, Option<Radius>),
}

#[derive(Default)]
pub struct MockPersistence {
    calls: Mutex<Vec<PersistCall>>,
    failing: Mutex<bool>,
    created: AtomicU32,
}

impl MockPersistence {
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    pub async fn calls(&self) -> Vec<PersistCall> {
        self.calls.lock().await.clone()
    }
}

impl PersistenceClient for MockPersistence {
    async fn create(&self, payload: &LocationPayload) -> Result<LocationId> {
        self.calls
            .lock()
            .await
            .push(PersistCall::Create(payload.clone()));
        if *self.failing.lock().await {
            bail!("500 Internal Server Error");
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(LocationId::new(format!("loc-{n}")))
    }

    async fn update(
        &self,
        id: &LocationId,
        payload: &LocationPayload,
        distance: Option<Radius>,
    ) -> Result {
        self.calls.lock().await.push(PersistCall::Update(
            id.clone(),
            payload.clone(),
            distance,
        ));
        if *self.failing.lock().await {
            bail!("500 Internal Server Error");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingSender(AtomicUsize);

impl CountingSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl StateUpdateSender for CountingSender {
    fn send_update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
