use std::io::Write;

use serde::Serialize;

use super::domain::ScoredLead;

#[derive(Debug, Serialize)]
struct LeadRow<'a> {
    name: &'a str,
    phone: &'a str,
    website: &'a str,
    address: &'a str,
    industry_code: &'a str,
    social_handle: &'a str,
    contact: &'a str,
    registry_id: &'a str,
    legal_name: &'a str,
    source: &'static str,
    collected_at: String,
    score: u32,
    level: &'static str,
    qualified: bool,
    matched_criteria: String,
    qualification_notes: &'a str,
    scored_at: String,
    scoring_failure: &'a str,
}

impl<'a> LeadRow<'a> {
    fn from_lead(lead: &'a ScoredLead) -> Self {
        let candidate = lead.candidate();
        Self {
            name: &candidate.name,
            phone: &candidate.phone,
            website: &candidate.website,
            address: &candidate.address,
            industry_code: &candidate.industry_code,
            social_handle: &candidate.social_handle,
            contact: &candidate.contact,
            registry_id: &candidate.registry_id,
            legal_name: candidate
                .registry
                .as_ref()
                .map(|profile| profile.legal_name.as_str())
                .unwrap_or_default(),
            source: candidate.source.label(),
            collected_at: candidate.collected_at.to_rfc3339(),
            score: lead.score(),
            level: lead.level().label(),
            qualified: lead.qualified(),
            matched_criteria: lead.matched_labels().join("; "),
            qualification_notes: lead.qualification_notes(),
            scored_at: lead.scored_at().to_rfc3339(),
            scoring_failure: lead.scoring_failure().unwrap_or_default(),
        }
    }
}

/// Writes one CSV row per lead in the order given; the header row precedes the first lead.
pub fn write_leads_csv<W: Write>(writer: W, leads: &[ScoredLead]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for lead in leads {
        csv_writer.serialize(LeadRow::from_lead(lead))?;
    }
    csv_writer.flush()?;
    Ok(())
}
