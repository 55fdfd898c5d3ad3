use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde_json::Value;
use tokio::sync::Notify;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::workflows::prospecting::campaign::{
    CampaignId, CampaignRecord, CampaignRepository, CampaignService, RepositoryError,
};
use crate::workflows::prospecting::domain::{Candidate, RegistryProfile, SourceTag};
use crate::workflows::prospecting::enrichment::{RegistryError, RegistryLookup};
use crate::workflows::prospecting::evaluation::{
    BatchOptions, ProbeError, QualificationConfig, QualificationEngine, WebsiteProbe,
};
use crate::workflows::prospecting::intake::RawRecord;

pub(super) fn collected_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn candidate(name: &str) -> Candidate {
    Candidate {
        name: name.to_string(),
        phone: String::new(),
        website: String::new(),
        address: String::new(),
        industry_code: String::new(),
        social_handle: String::new(),
        contact: String::new(),
        registry_id: String::new(),
        registry: None,
        source: SourceTag::Places,
        collected_at: collected_at(),
    }
}

/// The reference supermarket: phone, industry, address and name match (score 5).
pub(super) fn market_x() -> Candidate {
    Candidate {
        phone: "11999999999".to_string(),
        address: "Rua A, 100, Centro, City, ST".to_string(),
        industry_code: "4721101".to_string(),
        ..candidate("Market X")
    }
}

pub(super) fn with_website(name: &str) -> Candidate {
    Candidate {
        website: format!(
            "https://{}.example.com",
            name.to_lowercase().replace(' ', "-")
        ),
        ..candidate(name)
    }
}

pub(super) fn raw(name: &str, address: &str, source: &str) -> RawRecord {
    RawRecord {
        name: Some(name.to_string()),
        phone: Some("(11) 3333-4444".to_string()),
        address: Some(address.to_string()),
        industry_code: Some("1091-1/02".to_string()),
        source: Some(source.to_string()),
        ..RawRecord::default()
    }
}

pub(super) fn engine_with(probe: Arc<dyn WebsiteProbe>) -> Arc<QualificationEngine> {
    Arc::new(QualificationEngine::new(
        QualificationConfig::default(),
        probe,
    ))
}

pub(super) fn build_service(
    probe: Arc<dyn WebsiteProbe>,
) -> (
    Arc<CampaignService<MemoryRepository>>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(CampaignService::new(
        Arc::clone(&repository),
        engine_with(probe),
        BatchOptions::with_concurrency(4),
    ));
    (service, repository)
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Kills the scoring task of the candidate called `name` once its criteria have run, after
/// every unwind guard inside `score`. Holds for the current thread until the guard drops, so
/// it only reaches tasks on a current-thread runtime such as `#[tokio::test]`.
pub(super) fn crash_scoring_of(name: &'static str) -> DefaultGuard {
    tracing::subscriber::set_default(tracing_subscriber::registry().with(CrashOnScored { name }))
}

struct CrashOnScored {
    name: &'static str,
}

impl<S: Subscriber> Layer<S> for CrashOnScored {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        if fields.message == "candidate scored" && fields.candidate == self.name {
            panic!("scoring task for {} crashed", self.name);
        }
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    candidate: String,
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "candidate" => self.candidate = format!("{value:?}"),
            _ => {}
        }
    }
}

pub(super) struct ActiveProbe;

#[async_trait]
impl WebsiteProbe for ActiveProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        Ok(())
    }
}

pub(super) struct FailingProbe(pub(super) ProbeError);

#[async_trait]
impl WebsiteProbe for FailingProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        Err(self.0.clone())
    }
}

pub(super) struct PanickingProbe;

#[async_trait]
impl WebsiteProbe for PanickingProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        panic!("probe exploded")
    }
}

/// Tracks how many probes run at once.
#[derive(Default)]
pub(super) struct CountingProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingProbe {
    pub(super) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebsiteProbe for CountingProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(15)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Holds every probe until released, signalling when one has started.
#[derive(Default)]
pub(super) struct GatedProbe {
    pub(super) started: Notify,
    pub(super) release: Notify,
}

#[async_trait]
impl WebsiteProbe for GatedProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

pub(super) struct FixedRegistry {
    pub(super) industry_code: &'static str,
}

#[async_trait]
impl RegistryLookup for FixedRegistry {
    async fn lookup(&self, registry_id: &str) -> Result<RegistryProfile, RegistryError> {
        if registry_id.is_empty() {
            return Err(RegistryError::NotFound(registry_id.to_string()));
        }

        Ok(RegistryProfile {
            legal_name: "OFICINA CENTRAL LTDA".to_string(),
            industry_code: self.industry_code.to_string(),
            status: "ATIVA".to_string(),
            ..RegistryProfile::default()
        })
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<Vec<CampaignRecord>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl CampaignRepository for MemoryRepository {
    fn insert(&self, record: CampaignRecord) -> Result<CampaignRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &CampaignId) -> Result<Option<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn latest(&self) -> Result<Option<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.last().cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl CampaignRepository for UnavailableRepository {
    fn insert(&self, _record: CampaignRecord) -> Result<CampaignRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CampaignId) -> Result<Option<CampaignRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest(&self) -> Result<Option<CampaignRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<CampaignRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
