//! Lead prospecting: intake, deduplication, registry enrichment, qualification scoring and
//! campaign reporting.

pub mod campaign;
pub mod dedup;
pub mod domain;
pub mod enrichment;
pub mod evaluation;
pub mod export;
pub mod intake;
pub mod report;

#[cfg(test)]
mod tests;

pub use campaign::{
    campaign_router, CampaignId, CampaignRecord, CampaignRepository, CampaignRequest,
    CampaignService, CampaignServiceError, CampaignStats, LeadPage, LeadQuery,
};
pub use dedup::{deduplicate, Deduplicated, Deduplicator, DedupKey, DuplicateRecord};
pub use domain::{Candidate, Criterion, RegistryProfile, ScoredLead, SourceTag};
pub use enrichment::{enrich, extract_registry_id, HttpRegistryLookup, RegistryLookup};
pub use evaluation::{
    BatchOptions, BatchOutcome, EvaluationFailure, HttpWebsiteProbe, LevelThresholds,
    OfflineProbe, ProbeError, QualificationConfig, QualificationEngine, QualificationLevel,
    WebsiteProbe,
};
pub use export::write_leads_csv;
pub use intake::{load_path, normalize, IntakeError, NormalizationError, RawRecord};
pub use report::{aggregate, QualificationReport};
