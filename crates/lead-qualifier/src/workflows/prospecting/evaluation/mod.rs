mod batch;
mod config;
pub(crate) mod policy;
mod probe;
mod rules;

pub use batch::{BatchOptions, BatchOutcome};
pub use config::{
    LevelThresholds, QualificationConfig, QualificationConfigError,
    DEFAULT_HIGH_CONSUMPTION_CODES,
};
pub use policy::QualificationLevel;
pub use probe::{HttpWebsiteProbe, OfflineProbe, ProbeError, WebsiteProbe};

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, warn};

use super::domain::{Candidate, Criterion, ScoredLead};

/// An evaluator that blew up instead of answering. Counted as "not matched".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} evaluation failed: {detail}", .criterion.label())]
pub struct EvaluationFailure {
    pub criterion: Criterion,
    pub detail: String,
}

impl EvaluationFailure {
    pub(crate) fn from_panic(criterion: Criterion, payload: &(dyn Any + Send)) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "evaluator panicked".to_string()
        };

        Self { criterion, detail }
    }
}

/// Applies the weighted criteria to candidates. Shared across tasks behind an `Arc`.
pub struct QualificationEngine {
    config: QualificationConfig,
    probe: Arc<dyn WebsiteProbe>,
}

impl QualificationEngine {
    pub fn new(config: QualificationConfig, probe: Arc<dyn WebsiteProbe>) -> Self {
        Self { config, probe }
    }

    /// Engine that never touches the network; the website criterion never matches.
    pub fn offline(config: QualificationConfig) -> Self {
        Self::new(config, Arc::new(OfflineProbe))
    }

    pub fn config(&self) -> &QualificationConfig {
        &self.config
    }

    pub fn classify(&self, score: u32) -> QualificationLevel {
        QualificationLevel::for_score(score, self.config.thresholds())
    }

    /// Scores one candidate. Evaluator failures degrade to "not matched"; this never fails.
    pub async fn score(&self, candidate: Candidate) -> ScoredLead {
        let mut matched = Vec::new();

        for criterion in Criterion::ordered() {
            let outcome = match criterion {
                Criterion::ActiveWebsite => self.website_is_active(&candidate).await,
                _ => rules::evaluate(criterion, &candidate, &self.config),
            };

            match outcome {
                Ok(true) => matched.push(criterion),
                Ok(false) => {}
                Err(failure) => {
                    warn!(
                        candidate = %candidate.name,
                        criterion = criterion.label(),
                        error = %failure,
                        "criterion evaluation failed"
                    );
                }
            }
        }

        let lead =
            ScoredLead::from_matches(candidate, matched, self.config.thresholds(), Utc::now());
        debug!(
            candidate = %lead.name(),
            score = lead.score(),
            level = lead.level().label(),
            "candidate scored"
        );
        lead
    }

    async fn website_is_active(&self, candidate: &Candidate) -> Result<bool, EvaluationFailure> {
        let Some(url) = rules::website_url(candidate) else {
            return Ok(false);
        };

        let probe = AssertUnwindSafe(self.probe.probe(&url)).catch_unwind().await;
        match probe {
            Ok(Ok(())) => Ok(true),
            Ok(Err(error)) => {
                debug!(candidate = %candidate.name, url = %url, error = %error, "website inactive");
                Ok(false)
            }
            Err(payload) => Err(EvaluationFailure::from_panic(
                Criterion::ActiveWebsite,
                payload.as_ref(),
            )),
        }
    }
}

impl fmt::Debug for QualificationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualificationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
