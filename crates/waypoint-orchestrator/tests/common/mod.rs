//! Shared mocks for orchestration integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use waypoint_abstraction::{
    ConversationTurn, ConverseModel, ConverseRequest, ConverseResponse, ModelError, ToolRequest,
};
use waypoint_store::{Flight, FlightStore, InMemoryFlightStore, StoreError};

/// Model replaying scripted replies, recording the transcript of each call.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ConverseResponse, ModelError>>>,
    repeat: Option<ConverseResponse>,
    calls: AtomicUsize,
    transcripts: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ConverseResponse, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        })
    }

    pub fn responses(replies: Vec<ConverseResponse>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    /// Returns the same reply forever.
    pub fn always(reply: ConverseResponse) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            repeat: Some(reply),
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn transcript(&self, call: usize) -> Vec<ConversationTurn> {
        self.transcripts.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl ConverseModel for ScriptedModel {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().unwrap().push(request.turns.to_vec());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => Ok(self.repeat.clone().unwrap_or_else(|| ConverseResponse::end_turn("Done"))),
        }
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

pub fn request(id: &str, name: &str, arguments: Value) -> ToolRequest {
    ToolRequest { id: id.to_string(), name: name.to_string(), arguments }
}

/// Seeded store whose route search always fails.
pub struct SearchOutageStore {
    inner: InMemoryFlightStore,
}

impl SearchOutageStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { inner: InMemoryFlightStore::seeded() })
    }
}

#[async_trait]
impl FlightStore for SearchOutageStore {
    async fn search(&self, _origin: &str, _destination: &str, _date: &str) -> waypoint_store::Result<Vec<Flight>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_id(&self, flight_id: &str) -> waypoint_store::Result<Vec<Flight>> {
        self.inner.find_by_id(flight_id).await
    }
}

/// Seeded store delaying each id lookup by a per-flight amount.
pub struct DelayedStore {
    inner: InMemoryFlightStore,
    delays: HashMap<String, Duration>,
}

impl DelayedStore {
    pub fn new(delays: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryFlightStore::seeded(),
            delays: delays.iter().map(|(id, ms)| ((*id).to_string(), Duration::from_millis(*ms))).collect(),
        })
    }
}

#[async_trait]
impl FlightStore for DelayedStore {
    async fn search(&self, origin: &str, destination: &str, date: &str) -> waypoint_store::Result<Vec<Flight>> {
        self.inner.search(origin, destination, date).await
    }

    async fn find_by_id(&self, flight_id: &str) -> waypoint_store::Result<Vec<Flight>> {
        if let Some(delay) = self.delays.get(flight_id) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.find_by_id(flight_id).await
    }
}

/// Sets a flag when dropped.
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Store whose queries hang until cancelled, recording the cancellation.
pub struct HangingStore {
    pub cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl FlightStore for HangingStore {
    async fn search(&self, _origin: &str, _destination: &str, _date: &str) -> waypoint_store::Result<Vec<Flight>> {
        let _guard = DropFlag(Arc::clone(&self.cancelled));
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _flight_id: &str) -> waypoint_store::Result<Vec<Flight>> {
        Ok(Vec::new())
    }
}
