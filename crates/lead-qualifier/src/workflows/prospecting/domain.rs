use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::{policy, LevelThresholds, QualificationLevel};

/// Collection channel a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Places,
    Social,
    Registry,
    Manual,
}

impl SourceTag {
    pub const fn ordered() -> [Self; 4] {
        [Self::Places, Self::Social, Self::Registry, Self::Manual]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Places => "Places",
            Self::Social => "Social",
            Self::Registry => "Registry",
            Self::Manual => "Manual",
        }
    }

    /// Maps the tags used by the collectors onto a source; anything unrecognized is manual.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "places" | "google places" | "google_places" | "maps" => Self::Places,
            "social" | "instagram" | "facebook" => Self::Social,
            "registry" | "receita" | "receita federal" | "receita_ws" => Self::Registry,
            _ => Self::Manual,
        }
    }
}

/// Company data attached by the registry enrichment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryProfile {
    pub legal_name: String,
    pub trade_name: String,
    pub industry_code: String,
    pub industry_description: String,
    pub status: String,
    pub opened_on: String,
    pub size: String,
}

/// Canonical business record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub industry_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub social_handle: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub contact: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registry_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryProfile>,
    pub source: SourceTag,
    pub collected_at: DateTime<Utc>,
}

/// Weighted qualification signals, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    ValidPhone,
    ActiveWebsite,
    CompatibleIndustry,
    SocialPresence,
    ValidAddress,
    ValidName,
}

impl Criterion {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::ValidPhone,
            Self::ActiveWebsite,
            Self::CompatibleIndustry,
            Self::SocialPresence,
            Self::ValidAddress,
            Self::ValidName,
        ]
    }

    pub const fn weight(self) -> u32 {
        match self {
            Self::CompatibleIndustry => 2,
            Self::ValidPhone
            | Self::ActiveWebsite
            | Self::SocialPresence
            | Self::ValidAddress
            | Self::ValidName => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ValidPhone => "Valid phone",
            Self::ActiveWebsite => "Active website",
            Self::CompatibleIndustry => "Compatible industry code",
            Self::SocialPresence => "Social presence",
            Self::ValidAddress => "Valid address",
            Self::ValidName => "Valid name",
        }
    }

    /// Position in the evaluation table; used to break ties deterministically.
    pub const fn position(self) -> usize {
        match self {
            Self::ValidPhone => 0,
            Self::ActiveWebsite => 1,
            Self::CompatibleIndustry => 2,
            Self::SocialPresence => 3,
            Self::ValidAddress => 4,
            Self::ValidName => 5,
        }
    }

    pub const fn max_score() -> u32 {
        let criteria = Self::ordered();
        let mut total = 0;
        let mut index = 0;
        while index < criteria.len() {
            total += criteria[index].weight();
            index += 1;
        }
        total
    }
}

/// A candidate with its qualification verdict. Only the engine creates these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLead {
    #[serde(flatten)]
    candidate: Candidate,
    score: u32,
    matched_criteria: Vec<Criterion>,
    qualified: bool,
    level: QualificationLevel,
    qualification_notes: String,
    scored_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scoring_failure: Option<String>,
}

impl ScoredLead {
    pub(crate) fn from_matches(
        candidate: Candidate,
        matched_criteria: Vec<Criterion>,
        thresholds: LevelThresholds,
        scored_at: DateTime<Utc>,
    ) -> Self {
        let score = matched_criteria.iter().map(|criterion| criterion.weight()).sum();
        let level = QualificationLevel::for_score(score, thresholds);
        let qualification_notes = policy::qualification_notes(level, &matched_criteria);

        Self {
            candidate,
            score,
            matched_criteria,
            qualified: score >= thresholds.qualification_threshold(),
            level,
            qualification_notes,
            scored_at,
            scoring_failure: None,
        }
    }

    /// Passthrough record for a candidate whose scoring task did not complete.
    pub(crate) fn scoring_failed(
        candidate: Candidate,
        reason: String,
        scored_at: DateTime<Utc>,
    ) -> Self {
        Self {
            candidate,
            score: 0,
            matched_criteria: Vec::new(),
            qualified: false,
            level: QualificationLevel::Unqualified,
            qualification_notes: format!("Scoring failed: {reason}"),
            scored_at,
            scoring_failure: Some(reason),
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn into_candidate(self) -> Candidate {
        self.candidate
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn source(&self) -> SourceTag {
        self.candidate.source
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn matched_criteria(&self) -> &[Criterion] {
        &self.matched_criteria
    }

    pub fn matched_labels(&self) -> Vec<&'static str> {
        self.matched_criteria
            .iter()
            .map(|criterion| criterion.label())
            .collect()
    }

    pub fn qualified(&self) -> bool {
        self.qualified
    }

    pub fn level(&self) -> QualificationLevel {
        self.level
    }

    pub fn qualification_notes(&self) -> &str {
        &self.qualification_notes
    }

    pub fn scored_at(&self) -> DateTime<Utc> {
        self.scored_at
    }

    pub fn scoring_failure(&self) -> Option<&str> {
        self.scoring_failure.as_deref()
    }
}
