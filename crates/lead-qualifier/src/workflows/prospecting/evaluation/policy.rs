use super::super::domain::Criterion;
use super::config::LevelThresholds;
use serde::{Deserialize, Serialize};

/// Four-way classification derived from a lead's score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualificationLevel {
    Unqualified,
    Low,
    Medium,
    High,
}

impl QualificationLevel {
    /// Highest level first, the order reports present them in.
    pub const fn ordered() -> [Self; 4] {
        [Self::High, Self::Medium, Self::Low, Self::Unqualified]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unqualified => "Unqualified",
        }
    }

    pub fn for_score(score: u32, thresholds: LevelThresholds) -> Self {
        if score >= thresholds.high() {
            Self::High
        } else if score >= thresholds.medium() {
            Self::Medium
        } else if score >= thresholds.low() {
            Self::Low
        } else {
            Self::Unqualified
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }
}

pub(crate) fn qualification_notes(level: QualificationLevel, matched: &[Criterion]) -> String {
    let criteria = matched
        .iter()
        .map(|criterion| criterion.label())
        .collect::<Vec<_>>()
        .join(", ");

    match level {
        QualificationLevel::High => format!("Highly qualified lead. Matched criteria: {criteria}"),
        QualificationLevel::Medium => format!("Qualified lead. Matched criteria: {criteria}"),
        QualificationLevel::Low => {
            format!("Low qualification lead. Matched criteria: {criteria}")
        }
        QualificationLevel::Unqualified if matched.is_empty() => {
            "Lead not qualified. No criteria matched.".to_string()
        }
        QualificationLevel::Unqualified => {
            format!("Lead not qualified. Matched criteria: {criteria}")
        }
    }
}
