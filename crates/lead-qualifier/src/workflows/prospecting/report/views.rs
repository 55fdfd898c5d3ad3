use super::super::domain::{Criterion, ScoredLead, SourceTag};
use super::super::evaluation::QualificationLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBucketEntry {
    pub score: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelEntry {
    pub level: QualificationLevel,
    pub level_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub source: SourceTag,
    pub source_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionEntry {
    pub criterion: Criterion,
    pub label: &'static str,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopLeadEntry {
    pub name: String,
    pub score: u32,
    pub level: QualificationLevel,
    pub level_label: &'static str,
    pub source: SourceTag,
    pub matched_criteria: Vec<&'static str>,
}

impl TopLeadEntry {
    pub(crate) fn from_lead(lead: &ScoredLead) -> Self {
        Self {
            name: lead.name().to_string(),
            score: lead.score(),
            level: lead.level(),
            level_label: lead.level().label(),
            source: lead.source(),
            matched_criteria: lead.matched_labels(),
        }
    }
}

/// Presentation form of a report: labeled, ordered and rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub qualified: usize,
    pub unqualified: usize,
    pub qualification_rate: f64,
    pub mean_score: f64,
    pub score_distribution: Vec<ScoreBucketEntry>,
    pub level_distribution: Vec<LevelEntry>,
    pub source_distribution: Vec<SourceEntry>,
    pub top_criteria: Vec<CriterionEntry>,
    pub top_leads: Vec<TopLeadEntry>,
    #[serde(skip_serializing_if = "is_zero")]
    pub scoring_failures: usize,
    pub headline: String,
}

/// Totals across every stored campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatsView {
    pub total_campaigns: usize,
    pub total_leads: usize,
    pub qualified_leads: usize,
    pub mean_score: f64,
    pub qualification_rate: f64,
    pub level_distribution: Vec<LevelEntry>,
    pub last_campaign_at: Option<DateTime<Utc>>,
}

impl SystemStatsView {
    pub fn from_summary(
        total_campaigns: usize,
        summary: ReportSummary,
        last_campaign_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            total_campaigns,
            total_leads: summary.total,
            qualified_leads: summary.qualified,
            mean_score: summary.mean_score,
            qualification_rate: summary.qualification_rate,
            level_distribution: summary.level_distribution,
            last_campaign_at,
        }
    }
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}
