use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use lead_qualifier::workflows::prospecting::{campaign_router, CampaignRepository, CampaignService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_campaign_routes<R>(service: Arc<CampaignService<R>>) -> axum::Router
where
    R: CampaignRepository + 'static,
{
    campaign_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryCampaignRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use lead_qualifier::workflows::prospecting::{
        BatchOptions, QualificationConfig, QualificationEngine,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state() -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let service = Arc::new(CampaignService::new(
            Arc::new(InMemoryCampaignRepository::default()),
            Arc::new(QualificationEngine::offline(QualificationConfig::default())),
            BatchOptions::default(),
        ));
        with_campaign_routes(service).layer(Extension(state))
    }

    #[tokio::test]
    async fn readiness_tracks_the_startup_flag() {
        let state = state();
        let response = app(state.clone())
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = app(state)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn campaign_routes_share_the_router() {
        let response = app(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/leads/qualify")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"[{"name": "Padaria Estrela"}]"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["leads"][0]["score"], 1);
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
