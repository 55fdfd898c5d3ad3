use std::panic::{self, AssertUnwindSafe};

use reqwest::Url;

use super::super::domain::{Candidate, Criterion};
use super::config::QualificationConfig;
use super::EvaluationFailure;

const MIN_PHONE_DIGITS: usize = 10;
const MIN_ADDRESS_CHARS: usize = 20;
const MIN_NAME_CHARS: usize = 3;
const MESSAGING_MARKERS: [&str; 2] = ["wa.me", "whatsapp"];
const PLACEHOLDER_NAMES: [&str; 7] = [
    "n/a",
    "null",
    "undefined",
    "no name",
    "no title",
    "sem nome",
    "sem título",
];

/// Runs one offline evaluator, turning a panic inside the rule into an `EvaluationFailure`.
///
/// Website liveness cannot be decided offline and never matches here; the engine answers
/// it through its probe.
pub(crate) fn evaluate(
    criterion: Criterion,
    candidate: &Candidate,
    config: &QualificationConfig,
) -> Result<bool, EvaluationFailure> {
    guarded(criterion, || match criterion {
        Criterion::ValidPhone => has_valid_phone(candidate),
        Criterion::ActiveWebsite => false,
        Criterion::CompatibleIndustry => has_compatible_industry(candidate, config),
        Criterion::SocialPresence => has_social_presence(candidate),
        Criterion::ValidAddress => has_valid_address(candidate),
        Criterion::ValidName => has_valid_name(candidate),
    })
}

pub(crate) fn guarded<F>(criterion: Criterion, rule: F) -> Result<bool, EvaluationFailure>
where
    F: FnOnce() -> bool,
{
    panic::catch_unwind(AssertUnwindSafe(rule))
        .map_err(|payload| EvaluationFailure::from_panic(criterion, payload.as_ref()))
}

pub(crate) fn has_valid_phone(candidate: &Candidate) -> bool {
    candidate
        .phone
        .chars()
        .filter(char::is_ascii_digit)
        .count()
        >= MIN_PHONE_DIGITS
}

/// Parsed website when it is a well-formed `http(s)` URL with a host.
pub(crate) fn website_url(candidate: &Candidate) -> Option<Url> {
    let website = candidate.website.trim();
    if !(website.starts_with("http://") || website.starts_with("https://")) {
        return None;
    }

    Url::parse(website)
        .ok()
        .filter(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

pub(crate) fn has_compatible_industry(candidate: &Candidate, config: &QualificationConfig) -> bool {
    !candidate.industry_code.is_empty() && config.matches_industry(&candidate.industry_code)
}

pub(crate) fn has_social_presence(candidate: &Candidate) -> bool {
    if !candidate.social_handle.trim().is_empty() {
        return true;
    }

    let contact = candidate.contact.to_lowercase();
    MESSAGING_MARKERS
        .iter()
        .any(|marker| contact.contains(marker))
}

pub(crate) fn has_valid_address(candidate: &Candidate) -> bool {
    candidate.address.chars().count() >= MIN_ADDRESS_CHARS && candidate.address.contains(',')
}

pub(crate) fn has_valid_name(candidate: &Candidate) -> bool {
    let name = candidate.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return false;
    }

    if name.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let lowered = name.to_lowercase();
    !PLACEHOLDER_NAMES
        .iter()
        .any(|placeholder| lowered.contains(placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::prospecting::domain::SourceTag;
    use chrono::{TimeZone, Utc};

    fn candidate() -> Candidate {
        Candidate {
            name: "Padaria Estrela".to_string(),
            phone: String::new(),
            website: String::new(),
            address: String::new(),
            industry_code: String::new(),
            social_handle: String::new(),
            contact: String::new(),
            registry_id: String::new(),
            registry: None,
            source: SourceTag::Places,
            collected_at: Utc
                .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn phone_needs_ten_digits() {
        let mut lead = candidate();
        lead.phone = "119999999".to_string();
        assert!(!has_valid_phone(&lead));
        lead.phone = "11999999999".to_string();
        assert!(has_valid_phone(&lead));
    }

    #[test]
    fn website_requires_scheme_and_host() {
        let mut lead = candidate();
        lead.website = "www.padaria.com.br".to_string();
        assert!(website_url(&lead).is_none());
        lead.website = "https://".to_string();
        assert!(website_url(&lead).is_none());
        lead.website = "https://padaria.com.br/contato".to_string();
        assert_eq!(
            website_url(&lead).map(|url| url.host_str().map(str::to_string)),
            Some(Some("padaria.com.br".to_string()))
        );
    }

    #[test]
    fn social_presence_accepts_handle_or_messaging_contact() {
        let mut lead = candidate();
        assert!(!has_social_presence(&lead));
        lead.contact = "https://WA.ME/5511999999999".to_string();
        assert!(has_social_presence(&lead));
        lead.contact = "Chame no WhatsApp".to_string();
        assert!(has_social_presence(&lead));
        lead.contact = "+55 11 99999-9999".to_string();
        assert!(!has_social_presence(&lead));
        lead.social_handle = "@padariaestrela".to_string();
        assert!(has_social_presence(&lead));
    }

    #[test]
    fn address_needs_length_and_separator() {
        let mut lead = candidate();
        lead.address = "Rua A 100 Centro City ST".to_string();
        assert!(!has_valid_address(&lead), "no comma");
        lead.address = "Rua A, 100".to_string();
        assert!(!has_valid_address(&lead), "too short");
        lead.address = "Rua A, 100, Centro, City, ST".to_string();
        assert!(has_valid_address(&lead));
    }

    #[test]
    fn name_rejects_placeholders_and_numbers() {
        let mut lead = candidate();
        for invalid in ["AB", "12345", "N/A", "Undefined Store", "Sem nome"] {
            lead.name = invalid.to_string();
            assert!(!has_valid_name(&lead), "{invalid} should be rejected");
        }
        lead.name = "Mercado 24h".to_string();
        assert!(has_valid_name(&lead));
    }

    #[test]
    fn offline_evaluation_never_claims_a_live_website() {
        let mut lead = candidate();
        lead.website = "https://padaria.com.br".to_string();
        let config = QualificationConfig::default();

        assert!(website_url(&lead).is_some());
        assert_eq!(
            evaluate(Criterion::ActiveWebsite, &lead, &config),
            Ok(false)
        );
    }

    #[test]
    fn guarded_turns_panics_into_failures() {
        let failure = guarded(Criterion::ValidName, || panic!("rule exploded"))
            .expect_err("panic becomes failure");
        assert_eq!(failure.criterion, Criterion::ValidName);
        assert!(failure.detail.contains("rule exploded"));
    }
}
