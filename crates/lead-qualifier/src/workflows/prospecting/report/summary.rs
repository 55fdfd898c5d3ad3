use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::super::domain::{Criterion, ScoredLead, SourceTag};
use super::super::evaluation::QualificationLevel;
use super::views::{
    CriterionEntry, LevelEntry, ReportSummary, ScoreBucketEntry, SourceEntry, TopLeadEntry,
};

const TOP_CRITERIA: usize = 5;
const TOP_LEADS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionCount {
    pub criterion: Criterion,
    pub hits: usize,
}

/// Corpus statistics over one batch of scored leads.
#[derive(Debug, Clone, PartialEq)]
pub struct QualificationReport {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub qualified: usize,
    pub unqualified: usize,
    /// Percentage in `0.0..=100.0`.
    pub qualification_rate: f64,
    pub mean_score: f64,
    pub score_histogram: HashMap<u32, usize>,
    pub level_histogram: HashMap<QualificationLevel, usize>,
    pub source_histogram: HashMap<SourceTag, usize>,
    pub top_criteria: Vec<CriterionCount>,
    pub top_leads: Vec<ScoredLead>,
    pub scoring_failures: usize,
    pub headline: String,
}

/// Builds the report for `leads`. An empty batch yields zeros and empty histograms.
pub fn aggregate(leads: &[ScoredLead], generated_at: DateTime<Utc>) -> QualificationReport {
    let total = leads.len();
    let mut qualified = 0;
    let mut score_sum: u64 = 0;
    let mut scoring_failures = 0;
    let mut score_histogram = HashMap::new();
    let mut level_histogram = HashMap::new();
    let mut source_histogram = HashMap::new();
    let mut criterion_hits = Criterion::ordered().map(|_| 0usize);

    for lead in leads {
        if lead.qualified() {
            qualified += 1;
        }
        if lead.scoring_failure().is_some() {
            scoring_failures += 1;
        }
        score_sum += u64::from(lead.score());
        *score_histogram.entry(lead.score()).or_insert(0) += 1;
        *level_histogram.entry(lead.level()).or_insert(0) += 1;
        *source_histogram.entry(lead.source()).or_insert(0) += 1;
        for criterion in lead.matched_criteria() {
            criterion_hits[criterion.position()] += 1;
        }
    }

    let (qualification_rate, mean_score) = if total == 0 {
        (0.0, 0.0)
    } else {
        (
            qualified as f64 / total as f64 * 100.0,
            score_sum as f64 / total as f64,
        )
    };

    QualificationReport {
        generated_at,
        total,
        qualified,
        unqualified: total - qualified,
        qualification_rate,
        mean_score,
        score_histogram,
        level_histogram,
        source_histogram,
        top_criteria: top_criteria(&criterion_hits),
        top_leads: top_leads(leads),
        scoring_failures,
        headline: headline(total, qualified, qualification_rate),
    }
}

fn top_criteria(hits: &[usize]) -> Vec<CriterionCount> {
    // `ordered()` is already in table order, so a stable sort keeps ties in that order.
    let mut counts: Vec<CriterionCount> = Criterion::ordered()
        .into_iter()
        .map(|criterion| CriterionCount {
            criterion,
            hits: hits[criterion.position()],
        })
        .filter(|count| count.hits > 0)
        .collect();
    counts.sort_by(|a, b| b.hits.cmp(&a.hits));
    counts.truncate(TOP_CRITERIA);
    counts
}

fn top_leads(leads: &[ScoredLead]) -> Vec<ScoredLead> {
    let mut ranked: Vec<&ScoredLead> = leads.iter().collect();
    ranked.sort_by(|a, b| b.score().cmp(&a.score()));
    ranked.into_iter().take(TOP_LEADS).cloned().collect()
}

fn headline(total: usize, qualified: usize, rate: f64) -> String {
    if total == 0 {
        return "No leads were scored.".to_string();
    }

    format!("Of {total} leads, {qualified} were qualified ({rate:.1}%)")
}

impl QualificationReport {
    pub fn summary(&self) -> ReportSummary {
        let mut score_distribution: Vec<ScoreBucketEntry> = self
            .score_histogram
            .iter()
            .map(|(&score, &count)| ScoreBucketEntry { score, count })
            .collect();
        score_distribution.sort_by_key(|entry| entry.score);

        let level_distribution = QualificationLevel::ordered()
            .into_iter()
            .filter_map(|level| {
                self.level_histogram.get(&level).map(|&count| LevelEntry {
                    level,
                    level_label: level.label(),
                    count,
                })
            })
            .collect();

        let source_distribution = SourceTag::ordered()
            .into_iter()
            .filter_map(|source| {
                self.source_histogram.get(&source).map(|&count| SourceEntry {
                    source,
                    source_label: source.label(),
                    count,
                })
            })
            .collect();

        let top_criteria = self
            .top_criteria
            .iter()
            .map(|count| CriterionEntry {
                criterion: count.criterion,
                label: count.criterion.label(),
                hits: count.hits,
            })
            .collect();

        let top_leads = self.top_leads.iter().map(TopLeadEntry::from_lead).collect();

        ReportSummary {
            generated_at: self.generated_at,
            total: self.total,
            qualified: self.qualified,
            unqualified: self.unqualified,
            qualification_rate: round_to(self.qualification_rate, 1),
            mean_score: round_to(self.mean_score, 2),
            score_distribution,
            level_distribution,
            source_distribution,
            top_criteria,
            top_leads,
            scoring_failures: self.scoring_failures,
            headline: self.headline.clone(),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
