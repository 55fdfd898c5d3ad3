use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::super::domain::{Candidate, SourceTag};
use super::parser::RawRecord;

const MIN_PHONE_DIGITS: usize = 10;
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("invalid record: missing {field}")]
    InvalidRecord { field: &'static str },
}

/// Validates a raw record into a canonical [`Candidate`].
///
/// `received_at` stands in for the collection time when the record carries none.
pub fn normalize(
    raw: &RawRecord,
    received_at: DateTime<Utc>,
) -> Result<Candidate, NormalizationError> {
    let name = trimmed(&raw.name);
    if name.is_empty() {
        return Err(NormalizationError::InvalidRecord { field: "name" });
    }

    Ok(Candidate {
        name,
        phone: normalize_phone(raw.phone.as_deref().unwrap_or_default()),
        website: normalize_website(raw.website.as_deref().unwrap_or_default()),
        address: raw.address.clone().unwrap_or_default(),
        industry_code: normalize_industry_code(raw.industry_code.as_deref().unwrap_or_default()),
        social_handle: trimmed(&raw.social_handle),
        contact: trimmed(&raw.contact),
        registry_id: trimmed(&raw.registry_id),
        registry: None,
        source: raw
            .source
            .as_deref()
            .map(SourceTag::parse)
            .unwrap_or(SourceTag::Manual),
        collected_at: raw
            .collected_at
            .as_deref()
            .and_then(parse_datetime)
            .unwrap_or(received_at),
    })
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn normalize_phone(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        String::new()
    } else {
        digits
    }
}

fn normalize_website(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        String::new()
    }
}

fn normalize_industry_code(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect()
}

pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
