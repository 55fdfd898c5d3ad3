use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::super::domain::{Candidate, ScoredLead};
use super::QualificationEngine;

const PROGRESS_EVERY: usize = 10;

/// Tuning for [`QualificationEngine::score_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Upper bound on candidates being scored (and probed) at once.
    pub max_concurrency: usize,
}

impl BatchOptions {
    pub const DEFAULT_CONCURRENCY: usize = 8;

    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::with_concurrency(Self::DEFAULT_CONCURRENCY)
    }
}

/// Leads for every scheduled candidate, in input order, plus whatever cancellation left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub leads: Vec<ScoredLead>,
    pub unscheduled: Vec<Candidate>,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn scoring_failures(&self) -> usize {
        self.leads
            .iter()
            .filter(|lead| lead.scoring_failure().is_some())
            .count()
    }
}

impl QualificationEngine {
    /// Scores candidates concurrently while preserving input order.
    ///
    /// Cancelling `cancel` stops new work from being scheduled; tasks already running are
    /// awaited and returned. A task that dies yields a passthrough lead instead of vanishing.
    pub async fn score_batch(
        self: &Arc<Self>,
        candidates: Vec<Candidate>,
        options: BatchOptions,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let total = candidates.len();
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        let mut scheduled: Vec<(Candidate, JoinHandle<ScoredLead>)> = Vec::with_capacity(total);
        let mut unscheduled = Vec::new();
        let mut cancelled = false;

        let mut pending = candidates.into_iter();
        for candidate in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                cancelled = true;
                unscheduled.push(candidate);
                break;
            };

            let engine = Arc::clone(self);
            let fallback = candidate.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                engine.score(candidate).await
            });
            scheduled.push((fallback, handle));
        }
        unscheduled.extend(pending);

        if cancelled {
            warn!(
                scheduled = scheduled.len(),
                unscheduled = unscheduled.len(),
                "batch cancelled before all candidates were scheduled"
            );
        }

        let mut leads = Vec::with_capacity(scheduled.len());
        for (index, (fallback, handle)) in scheduled.into_iter().enumerate() {
            let lead = match handle.await {
                Ok(lead) => lead,
                Err(error) => {
                    warn!(candidate = %fallback.name, error = %error, "scoring task failed");
                    ScoredLead::scoring_failed(fallback, error.to_string(), Utc::now())
                }
            };
            leads.push(lead);

            let done = index + 1;
            if done % PROGRESS_EVERY == 0 {
                info!(scored = done, total, "batch progress");
            }
        }

        let qualified = leads.iter().filter(|lead| lead.qualified()).count();
        let mean_score = if leads.is_empty() {
            0.0
        } else {
            leads.iter().map(|lead| f64::from(lead.score())).sum::<f64>() / leads.len() as f64
        };
        info!(
            scored = leads.len(),
            qualified,
            mean_score,
            cancelled,
            "batch scoring finished"
        );

        BatchOutcome {
            leads,
            unscheduled,
            cancelled,
        }
    }

    /// Scores everything with default options and no cancellation.
    pub async fn score_all(self: &Arc<Self>, candidates: Vec<Candidate>) -> Vec<ScoredLead> {
        let never = CancellationToken::new();
        self.score_batch(candidates, BatchOptions::default(), &never)
            .await
            .leads
    }
}
