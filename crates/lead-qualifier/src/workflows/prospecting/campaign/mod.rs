//! Campaign runs: intake through report, persisted behind a repository and served over HTTP.

mod query;
pub mod repository;
pub mod router;
pub mod service;

pub use query::{LeadPage, LeadQuery, LeadQueryError};
pub use repository::{
    CampaignId, CampaignRecord, CampaignRepository, CampaignStats, CampaignStatusView,
    RepositoryError, SkippedRecord,
};
pub use router::campaign_router;
pub use service::{CampaignRequest, CampaignService, CampaignServiceError, QualifyOutcome};
