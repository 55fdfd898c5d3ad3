use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::dedup::DuplicateRecord;
use super::super::domain::ScoredLead;
use super::super::report::QualificationReport;

/// Identifier wrapper for campaign runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub String);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counters describing what happened to each received record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignStats {
    pub received: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub scored: usize,
    pub scoring_failures: usize,
    pub unscheduled: usize,
    pub cancelled: bool,
}

/// A raw record rejected by normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// Everything a campaign run produced.
#[derive(Debug, Clone)]
pub struct CampaignRecord {
    pub id: CampaignId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: CampaignStats,
    pub skipped: Vec<SkippedRecord>,
    pub duplicates: Vec<DuplicateRecord>,
    pub leads: Vec<ScoredLead>,
    pub report: QualificationReport,
}

impl CampaignRecord {
    pub fn status_view(&self) -> CampaignStatusView {
        CampaignStatusView {
            campaign_id: self.id.clone(),
            name: self.name.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            stats: self.stats.clone(),
            qualified: self.report.qualified,
            headline: self.report.headline.clone(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait CampaignRepository: Send + Sync {
    fn insert(&self, record: CampaignRecord) -> Result<CampaignRecord, RepositoryError>;
    fn fetch(&self, id: &CampaignId) -> Result<Option<CampaignRecord>, RepositoryError>;
    /// Most recently started campaign.
    fn latest(&self) -> Result<Option<CampaignRecord>, RepositoryError>;
    /// Newest first.
    fn recent(&self, limit: usize) -> Result<Vec<CampaignRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a campaign for listings and status lookups.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignStatusView {
    pub campaign_id: CampaignId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: CampaignStats,
    pub qualified: usize,
    pub headline: String,
}
