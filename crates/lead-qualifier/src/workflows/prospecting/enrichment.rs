//! Company-registry enrichment, run between deduplication and scoring.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{Candidate, RegistryProfile};

static FORMATTED_REGISTRY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").expect("registry id pattern compiles")
});
static BARE_REGISTRY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{14}").expect("bare registry id pattern compiles"));

/// Finds a company registry number in free text, returned as `XX.XXX.XXX/XXXX-XX`.
pub fn extract_registry_id(text: &str) -> Option<String> {
    if let Some(found) = FORMATTED_REGISTRY_ID.find(text) {
        return Some(found.as_str().to_string());
    }

    let digits = BARE_REGISTRY_ID.find(text)?.as_str();
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("registry has no record for {0}")]
    NotFound(String),
    #[error("registry answered with status {0}")]
    Status(u16),
}

/// Source of company profiles keyed by registry number.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn lookup(&self, registry_id: &str) -> Result<RegistryProfile, RegistryError>;
}

/// Lookup against a ReceitaWS-compatible endpoint (`{base}/{digits}`).
#[derive(Debug, Clone)]
pub struct HttpRegistryLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryLookup {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistryPayload {
    status: String,
    message: String,
    nome: String,
    fantasia: String,
    atividade_principal: Vec<RegistryActivity>,
    situacao: String,
    abertura: String,
    porte: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistryActivity {
    code: String,
    text: String,
}

impl RegistryPayload {
    fn into_profile(self) -> RegistryProfile {
        let activity = self.atividade_principal.into_iter().next().unwrap_or_default();
        RegistryProfile {
            legal_name: self.nome,
            trade_name: self.fantasia,
            industry_code: activity.code,
            industry_description: activity.text,
            status: self.situacao,
            opened_on: self.abertura,
            size: self.porte,
        }
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryLookup {
    async fn lookup(&self, registry_id: &str) -> Result<RegistryProfile, RegistryError> {
        let digits: String = registry_id.chars().filter(char::is_ascii_digit).collect();
        let url = format!("{}/{}", self.base_url, digits);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::Status(response.status().as_u16()));
        }

        let payload: RegistryPayload = response.json().await?;
        if payload.status.eq_ignore_ascii_case("error") {
            warn!(registry_id, message = %payload.message, "registry rejected lookup");
            return Err(RegistryError::NotFound(registry_id.to_string()));
        }

        Ok(payload.into_profile())
    }
}

/// Attaches registry data to a candidate. Lookup failures leave the candidate unchanged.
pub async fn enrich(mut candidate: Candidate, lookup: &dyn RegistryLookup) -> Candidate {
    if candidate.registry_id.is_empty() {
        let text = format!("{} {}", candidate.name, candidate.address);
        match extract_registry_id(&text) {
            Some(found) => candidate.registry_id = found,
            None => return candidate,
        }
    }

    match lookup.lookup(&candidate.registry_id).await {
        Ok(profile) => {
            let industry_code: String = profile
                .industry_code
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect();
            if !industry_code.is_empty() {
                candidate.industry_code = industry_code;
            }
            info!(candidate = %candidate.name, registry_id = %candidate.registry_id, "candidate enriched from registry");
            candidate.registry = Some(profile);
        }
        Err(error) => {
            warn!(
                candidate = %candidate.name,
                registry_id = %candidate.registry_id,
                error = %error,
                "registry lookup failed"
            );
        }
    }

    candidate
}

/// Enriches candidates one at a time; public registries rate-limit aggressively.
pub async fn enrich_all(candidates: Vec<Candidate>, lookup: &dyn RegistryLookup) -> Vec<Candidate> {
    let mut enriched = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        enriched.push(enrich(candidate, lookup).await);
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_registry_id_prefers_formatted_numbers() {
        assert_eq!(
            extract_registry_id("Padaria Estrela CNPJ 12.345.678/0001-99 Centro"),
            Some("12.345.678/0001-99".to_string())
        );
        assert_eq!(
            extract_registry_id("Oficina 12345678000199"),
            Some("12.345.678/0001-99".to_string())
        );
        assert_eq!(extract_registry_id("Rua A, 100"), None);
    }

    #[test]
    fn registry_payload_maps_primary_activity() {
        let payload: RegistryPayload = serde_json::from_str(
            r#"{
                "status": "OK",
                "nome": "PADARIA ESTRELA LTDA",
                "fantasia": "PADARIA ESTRELA",
                "atividade_principal": [{"code": "10.91-1-02", "text": "Padaria e confeitaria"}],
                "situacao": "ATIVA",
                "abertura": "01/02/2010",
                "porte": "ME",
                "capital_social": "50000.00"
            }"#,
        )
        .expect("payload parses");

        let profile = payload.into_profile();
        assert_eq!(profile.legal_name, "PADARIA ESTRELA LTDA");
        assert_eq!(profile.industry_code, "10.91-1-02");
        assert_eq!(profile.status, "ATIVA");
    }
}
