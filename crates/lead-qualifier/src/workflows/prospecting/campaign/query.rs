use serde::{Deserialize, Serialize};

use super::super::domain::{ScoredLead, SourceTag};
use super::super::evaluation::QualificationLevel;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

/// Filters and paging over scored leads. Every filter is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LeadQuery {
    pub score_min: Option<u32>,
    pub level: Option<String>,
    pub source: Option<String>,
    pub qualified: Option<bool>,
    /// Case-insensitive substring of the name or address.
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadQueryError {
    #[error("unknown qualification level '{0}'")]
    UnknownLevel(String),
}

/// One page of matching leads, in batch order.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
    pub leads: Vec<ScoredLead>,
}

impl LeadQuery {
    pub fn apply(&self, leads: &[ScoredLead]) -> Result<LeadPage, LeadQueryError> {
        let matching = self.matching(leads)?;
        let total = matching.len();
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0);
        let leads: Vec<ScoredLead> = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(LeadPage {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(leads.len()) < total,
            leads,
        })
    }

    /// Every lead passing the filters, in input order; `limit` and `offset` are ignored.
    pub fn matching<'a>(
        &self,
        leads: &'a [ScoredLead],
    ) -> Result<Vec<&'a ScoredLead>, LeadQueryError> {
        let level = match self.level.as_deref().filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(
                QualificationLevel::parse(raw)
                    .ok_or_else(|| LeadQueryError::UnknownLevel(raw.to_string()))?,
            ),
            None => None,
        };
        let source = self
            .source
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(SourceTag::parse);
        let search = self
            .search
            .as_deref()
            .map(|raw| raw.trim().to_lowercase())
            .filter(|needle| !needle.is_empty());

        Ok(leads
            .iter()
            .filter(|lead| self.score_min.map_or(true, |min| lead.score() >= min))
            .filter(|lead| level.map_or(true, |level| lead.level() == level))
            .filter(|lead| source.map_or(true, |source| lead.source() == source))
            .filter(|lead| self.qualified.map_or(true, |wanted| lead.qualified() == wanted))
            .filter(|lead| {
                search.as_deref().map_or(true, |needle| {
                    lead.name().to_lowercase().contains(needle)
                        || lead.candidate().address.to_lowercase().contains(needle)
                })
            })
            .collect())
    }
}
