use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::super::dedup::{Deduplicator, DuplicateRecord};
use super::super::domain::{Candidate, ScoredLead};
use super::super::enrichment::{enrich_all, RegistryLookup};
use super::super::evaluation::{BatchOptions, QualificationEngine};
use super::super::intake::{normalize, RawRecord};
use super::super::report::views::SystemStatsView;
use super::super::report::{aggregate, QualificationReport};
use super::query::{LeadPage, LeadQuery, LeadQueryError};
use super::repository::{
    CampaignId, CampaignRecord, CampaignRepository, CampaignStats, CampaignStatusView,
    RepositoryError, SkippedRecord,
};

const DEFAULT_CAMPAIGN_NAME: &str = "Untitled campaign";

/// Service composing intake, deduplication, enrichment, scoring and persistence.
pub struct CampaignService<R> {
    repository: Arc<R>,
    engine: Arc<QualificationEngine>,
    registry: Option<Arc<dyn RegistryLookup>>,
    options: BatchOptions,
    seen: Mutex<Deduplicator>,
    shutdown: CancellationToken,
}

static CAMPAIGN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_campaign_id() -> CampaignId {
    let id = CAMPAIGN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CampaignId(format!("cmp-{id:06}"))
}

/// Raw records to qualify as one campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

/// Result of stateless scoring: nothing is persisted or remembered.
#[derive(Debug, Clone)]
pub struct QualifyOutcome {
    pub leads: Vec<ScoredLead>,
    pub skipped: Vec<SkippedRecord>,
    pub report: QualificationReport,
}

impl<R> CampaignService<R>
where
    R: CampaignRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: Arc<QualificationEngine>, options: BatchOptions) -> Self {
        Self {
            repository,
            engine,
            registry: None,
            options,
            seen: Mutex::new(Deduplicator::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn RegistryLookup>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Seeds cross-run deduplication, e.g. with businesses processed before a restart.
    pub fn with_deduplicator(mut self, deduplicator: Deduplicator) -> Self {
        self.seen = Mutex::new(deduplicator);
        self
    }

    /// Token cancelled on shutdown; HTTP-triggered runs stop scheduling when it fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn engine(&self) -> &Arc<QualificationEngine> {
        &self.engine
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Runs a full campaign and persists its record.
    pub async fn run(
        &self,
        request: CampaignRequest,
        cancel: &CancellationToken,
    ) -> Result<CampaignRecord, CampaignServiceError> {
        if request.records.is_empty() {
            return Err(CampaignServiceError::EmptyRequest);
        }

        let started_at = Utc::now();
        let id = next_campaign_id();
        let name = request
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CAMPAIGN_NAME.to_string());
        let received = request.records.len();

        let (origins, candidates, skipped) = normalize_records(&request.records, started_at);

        let admitted = self.seen().admit(candidates);
        let duplicates: Vec<DuplicateRecord> = admitted
            .duplicates
            .into_iter()
            .map(|duplicate| DuplicateRecord {
                index: origins[duplicate.index],
                survivor_index: duplicate.survivor_index.map(|survivor| origins[survivor]),
                key: duplicate.key,
            })
            .collect();

        let candidates = match &self.registry {
            Some(registry) => enrich_all(admitted.unique, registry.as_ref()).await,
            None => admitted.unique,
        };

        let outcome = self
            .engine
            .score_batch(candidates, self.options, cancel)
            .await;
        // Passthrough leads were never evaluated, so a later campaign may score them again.
        self.seen().remember(
            outcome
                .leads
                .iter()
                .filter(|lead| lead.scoring_failure().is_none()),
        );

        let finished_at = Utc::now();
        let report = aggregate(&outcome.leads, finished_at);
        let stats = CampaignStats {
            received,
            skipped: skipped.len(),
            duplicates: duplicates.len(),
            scored: outcome.leads.len(),
            scoring_failures: outcome.scoring_failures(),
            unscheduled: outcome.unscheduled.len(),
            cancelled: outcome.cancelled,
        };

        info!(
            campaign = %id,
            received = stats.received,
            skipped = stats.skipped,
            duplicates = stats.duplicates,
            scored = stats.scored,
            qualified = report.qualified,
            "campaign finished"
        );

        let record = CampaignRecord {
            id,
            name,
            started_at,
            finished_at,
            stats,
            skipped,
            duplicates,
            leads: outcome.leads,
            report,
        };

        Ok(self.repository.insert(record)?)
    }

    /// Normalizes and scores records without deduplicating or persisting them.
    pub async fn qualify(&self, records: Vec<RawRecord>) -> QualifyOutcome {
        let received_at = Utc::now();
        let (_, candidates, skipped) = normalize_records(&records, received_at);
        let leads = self.engine.score_all(candidates).await;
        let report = aggregate(&leads, Utc::now());

        QualifyOutcome {
            leads,
            skipped,
            report,
        }
    }

    pub fn get(&self, id: &CampaignId) -> Result<CampaignRecord, CampaignServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| CampaignServiceError::NotFound(id.clone()))
    }

    pub fn latest(&self) -> Result<CampaignRecord, CampaignServiceError> {
        self.repository
            .latest()?
            .ok_or(CampaignServiceError::NoCampaigns)
    }

    pub fn list(&self, limit: usize) -> Result<Vec<CampaignStatusView>, CampaignServiceError> {
        let records = self.repository.recent(limit)?;
        Ok(records.iter().map(CampaignRecord::status_view).collect())
    }

    pub fn leads(
        &self,
        id: &CampaignId,
        query: &LeadQuery,
    ) -> Result<LeadPage, CampaignServiceError> {
        let record = self.get(id)?;
        Ok(query.apply(&record.leads)?)
    }

    /// Totals over every stored campaign.
    pub fn stats(&self) -> Result<SystemStatsView, CampaignServiceError> {
        let records = self.repository.recent(usize::MAX)?;
        let total_campaigns = records.len();
        let last_campaign_at = records.first().map(|record| record.finished_at);
        let leads = stored_leads(records);
        let summary = aggregate(&leads, Utc::now()).summary();

        Ok(SystemStatsView::from_summary(
            total_campaigns,
            summary,
            last_campaign_at,
        ))
    }

    /// Leads from every campaign, newest campaign first and batch order within a campaign.
    pub fn search_leads(&self, query: &LeadQuery) -> Result<LeadPage, CampaignServiceError> {
        let leads = stored_leads(self.repository.recent(usize::MAX)?);
        Ok(query.apply(&leads)?)
    }

    /// Like [`Self::search_leads`] but unpaged, for bulk export.
    pub fn export_leads(
        &self,
        query: &LeadQuery,
    ) -> Result<Vec<ScoredLead>, CampaignServiceError> {
        let leads = stored_leads(self.repository.recent(usize::MAX)?);
        let matching = query.matching(&leads)?;
        Ok(matching.into_iter().cloned().collect())
    }

    fn seen(&self) -> MutexGuard<'_, Deduplicator> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stored_leads(records: Vec<CampaignRecord>) -> Vec<ScoredLead> {
    records.into_iter().flat_map(|record| record.leads).collect()
}

/// Normalizes every record, keeping each candidate's position in the raw batch.
fn normalize_records(
    records: &[RawRecord],
    received_at: chrono::DateTime<Utc>,
) -> (Vec<usize>, Vec<Candidate>, Vec<SkippedRecord>) {
    let mut origins = Vec::with_capacity(records.len());
    let mut candidates = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (index, raw) in records.iter().enumerate() {
        match normalize(raw, received_at) {
            Ok(candidate) => {
                origins.push(index);
                candidates.push(candidate);
            }
            Err(error) => skipped.push(SkippedRecord {
                index,
                reason: error.to_string(),
            }),
        }
    }

    if !skipped.is_empty() {
        info!(skipped = skipped.len(), "records rejected during normalization");
    }

    (origins, candidates, skipped)
}

/// Error raised by the campaign service.
#[derive(Debug, thiserror::Error)]
pub enum CampaignServiceError {
    #[error("campaign request contained no records")]
    EmptyRequest,
    #[error("campaign {0} not found")]
    NotFound(CampaignId),
    #[error("no campaign has run yet")]
    NoCampaigns,
    #[error(transparent)]
    Query(#[from] LeadQueryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
