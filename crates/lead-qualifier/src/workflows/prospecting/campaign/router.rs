use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::super::export::write_leads_csv;
use super::super::intake::RawRecord;
use super::query::LeadQuery;
use super::repository::{CampaignId, CampaignRepository, RepositoryError};
use super::service::{CampaignRequest, CampaignService, CampaignServiceError};

const DEFAULT_LIST_LIMIT: usize = 20;

/// Router builder exposing campaign runs, their leads and reports, cross-campaign reads and
/// stateless scoring.
pub fn campaign_router<R>(service: Arc<CampaignService<R>>) -> Router
where
    R: CampaignRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/campaigns",
            post(run_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/campaigns/latest", get(latest_handler::<R>))
        .route("/api/v1/campaigns/:campaign_id", get(status_handler::<R>))
        .route(
            "/api/v1/campaigns/:campaign_id/leads",
            get(leads_handler::<R>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/report",
            get(report_handler::<R>),
        )
        .route("/api/v1/stats", get(stats_handler::<R>))
        .route("/api/v1/leads", get(all_leads_handler::<R>))
        .route("/api/v1/leads/export", get(export_handler::<R>))
        .route("/api/v1/leads/qualify", post(qualify_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum QualifyPayload {
    Records(Vec<RawRecord>),
    Wrapped { records: Vec<RawRecord> },
}

impl QualifyPayload {
    fn into_records(self) -> Vec<RawRecord> {
        match self {
            Self::Records(records) | Self::Wrapped { records } => records,
        }
    }
}

pub(crate) async fn run_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    axum::Json(request): axum::Json<CampaignRequest>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    let cancel = service.shutdown_token().child_token();
    match service.run(request, &cancel).await {
        Ok(record) => {
            let payload = json!({
                "campaign": record.status_view(),
                "report": record.report.summary(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.list(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn latest_handler<R>(State(service): State<Arc<CampaignService<R>>>) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.latest() {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.get(&CampaignId(campaign_id)) {
        Ok(record) => {
            let payload = json!({
                "campaign": record.status_view(),
                "skipped": record.skipped,
                "duplicates": record.duplicates,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn leads_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Path(campaign_id): Path<String>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.leads(&CampaignId(campaign_id), &query) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.get(&CampaignId(campaign_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.report.summary())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R>(State(service): State<Arc<CampaignService<R>>>) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn all_leads_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    match service.search_leads(&query) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    let leads = match service.export_leads(&query) {
        Ok(leads) => leads,
        Err(error) => return error_response(error),
    };

    let mut body = Vec::new();
    if let Err(err) = write_leads_csv(&mut body, &leads) {
        error!(error = %err, "lead export failed");
        let payload = json!({ "error": "lead export failed" });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"leads.csv\""),
        ],
        body,
    )
        .into_response()
}

pub(crate) async fn qualify_handler<R>(
    State(service): State<Arc<CampaignService<R>>>,
    axum::Json(payload): axum::Json<QualifyPayload>,
) -> Response
where
    R: CampaignRepository + 'static,
{
    let outcome = service.qualify(payload.into_records()).await;
    let payload = json!({
        "leads": outcome.leads,
        "skipped": outcome.skipped,
        "report": outcome.report.summary(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_response(error: CampaignServiceError) -> Response {
    let status = match &error {
        CampaignServiceError::EmptyRequest | CampaignServiceError::Query(_) => {
            StatusCode::BAD_REQUEST
        }
        CampaignServiceError::NotFound(_) | CampaignServiceError::NoCampaigns => {
            StatusCode::NOT_FOUND
        }
        CampaignServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        CampaignServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
