//! In-memory fakes for the allergen store and the scanning service.

#![allow(dead_code)]

use allergen_client::{AllergenDraft, AllergenStore, ClientError, ScanRequest, ScanService};
use allergen_core::{AllergenId, AllergenRecord, MatchSpan, Position, ScanResponse, Severity};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A transport-level failure, as reqwest reports one.
pub fn transport_error() -> ClientError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid url must fail to build");
    ClientError::Network(err)
}

pub fn id(s: &str) -> AllergenId {
    AllergenId::new(s).expect("valid allergen id")
}

pub fn record(id_str: &str, name: &str, severity: Severity) -> AllergenRecord {
    AllergenRecord {
        id: id(id_str),
        name: name.to_string(),
        keywords: vec![name.to_lowercase()],
        severity,
    }
}

pub fn found(allergen: &str, keyword: &str, severity: Severity, span: (usize, usize)) -> MatchSpan {
    MatchSpan {
        allergen_name: allergen.to_string(),
        keyword_found: keyword.to_string(),
        severity,
        position: Some(Position {
            start: span.0,
            end: span.1,
        }),
    }
}

/// Allergen store held in memory.
pub struct FakeStore {
    records: Mutex<Vec<AllergenRecord>>,
    reachable: AtomicBool,
    delay: Mutex<Duration>,
    pub list_calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_records(records: Vec<AllergenRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            reachable: AtomicBool::new(true),
            delay: Mutex::new(Duration::ZERO),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn standard() -> Self {
        Self::with_records(vec![
            record("a1", "Peanut", Severity::High),
            record("a2", "Milk", Severity::Medium),
            record("a3", "Soy", Severity::Low),
        ])
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("lock") = delay;
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().expect("lock");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reachable(&self) -> allergen_client::Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(transport_error())
        }
    }
}

#[async_trait]
impl AllergenStore for FakeStore {
    async fn list(&self) -> allergen_client::Result<Vec<AllergenRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Reachability is decided when the request is made, not when it lands
        let outcome = self.check_reachable();
        self.pause().await;
        outcome?;
        Ok(self.records.lock().expect("lock").clone())
    }

    async fn create(&self, draft: &AllergenDraft) -> allergen_client::Result<AllergenRecord> {
        self.check_reachable()?;
        let mut records = self.records.lock().expect("lock");
        let record = AllergenRecord {
            id: id(&format!("new-{}", records.len() + 1)),
            name: draft.name.clone(),
            keywords: draft.keywords.clone(),
            severity: draft.severity,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        target: &AllergenId,
        draft: &AllergenDraft,
    ) -> allergen_client::Result<AllergenRecord> {
        self.check_reachable()?;
        let mut records = self.records.lock().expect("lock");
        let record = records
            .iter_mut()
            .find(|r| &r.id == target)
            .ok_or_else(|| ClientError::Api {
                endpoint: format!("/allergens/{target}"),
                status: 404,
                detail: "Allergen not found".to_string(),
            })?;
        record.name = draft.name.clone();
        record.keywords = draft.keywords.clone();
        record.severity = draft.severity;
        Ok(record.clone())
    }

    async fn delete(&self, target: &AllergenId) -> allergen_client::Result<()> {
        self.check_reachable()?;
        self.records.lock().expect("lock").retain(|r| &r.id != target);
        Ok(())
    }
}

/// What the fake scanning service answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(ScanResponse),
    Reject(&'static str),
    Unreachable,
}

impl Reply {
    pub fn safe() -> Self {
        Self::Respond(ScanResponse {
            matches: Vec::new(),
            safe: true,
            timestamp: "2026-10-16 09:30:00".to_string(),
        })
    }

    pub fn detected(matches: Vec<MatchSpan>) -> Self {
        Self::Respond(ScanResponse {
            matches,
            safe: false,
            timestamp: "2026-10-16 09:30:00".to_string(),
        })
    }
}

/// Scanning service with a scripted reply and latency.
pub struct FakeScanService {
    reply: Mutex<Reply>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<ScanRequest>>,
}

impl FakeScanService {
    pub fn new(reply: Reply, delay: Duration) -> Self {
        Self {
            reply: Mutex::new(reply),
            delay,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().expect("lock") = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanService for FakeScanService {
    async fn scan(&self, request: ScanRequest) -> allergen_client::Result<ScanResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("lock") = Some(request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self.reply.lock().expect("lock").clone();
        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Reject(detail) => Err(ClientError::Api {
                endpoint: "/scan".to_string(),
                status: 400,
                detail: detail.to_string(),
            }),
            Reply::Unreachable => Err(transport_error()),
        }
    }
}
