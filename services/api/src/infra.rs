use lead_qualifier::config::QualificationSettings;
use lead_qualifier::error::AppError;
use lead_qualifier::workflows::prospecting::campaign::RepositoryError;
use lead_qualifier::workflows::prospecting::{
    CampaignId, CampaignRecord, CampaignRepository, CampaignService, HttpRegistryLookup,
    HttpWebsiteProbe, OfflineProbe, QualificationEngine, WebsiteProbe,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Campaign records kept in arrival order for the lifetime of the process.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCampaignRepository {
    records: Arc<Mutex<Vec<CampaignRecord>>>,
}

impl CampaignRepository for InMemoryCampaignRepository {
    fn insert(&self, record: CampaignRecord) -> Result<CampaignRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &CampaignId) -> Result<Option<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn latest(&self) -> Result<Option<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.last().cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<CampaignRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(crate) type LocalCampaignService = CampaignService<InMemoryCampaignRepository>;

/// Builds the engine; `offline` swaps the HTTP probe for one that never reports a live site.
pub(crate) fn build_engine(
    settings: &QualificationSettings,
    offline: bool,
) -> Result<Arc<QualificationEngine>, AppError> {
    let probe: Arc<dyn WebsiteProbe> = if offline {
        Arc::new(OfflineProbe)
    } else {
        Arc::new(HttpWebsiteProbe::new(settings.probe_timeout)?)
    };

    Ok(Arc::new(QualificationEngine::new(
        settings.engine.clone(),
        probe,
    )))
}

pub(crate) fn build_campaign_service(
    settings: &QualificationSettings,
    offline: bool,
    shutdown: CancellationToken,
) -> Result<(Arc<LocalCampaignService>, InMemoryCampaignRepository), AppError> {
    let repository = InMemoryCampaignRepository::default();
    let engine = build_engine(settings, offline)?;
    let mut service = CampaignService::new(
        Arc::new(repository.clone()),
        engine,
        settings.batch_options(),
    )
    .with_shutdown(shutdown);

    match settings.registry_url.as_deref() {
        Some(url) if !offline => {
            info!(registry = url, "registry enrichment enabled");
            service = service.with_registry(Arc::new(HttpRegistryLookup::new(url)?));
        }
        _ => {}
    }

    Ok((Arc::new(service), repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_qualifier::config::AppConfig;

    fn settings() -> QualificationSettings {
        AppConfig::from_lookup(|_| None)
            .expect("defaults load")
            .qualification
    }

    #[test]
    fn offline_service_skips_registry() {
        let mut settings = settings();
        settings.registry_url = Some("https://registry.example.com/v1/cnpj".to_string());

        let (service, repository) = build_campaign_service(&settings, true, CancellationToken::new())
            .expect("service builds");

        assert!(service.latest().is_err());
        assert!(repository.latest().expect("latest").is_none());
    }
}
