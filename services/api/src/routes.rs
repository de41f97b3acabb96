use crate::infra::{default_scoring_config, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use empathy_coach::training::debrief::{
    debrief_router, DebriefService, DialogueBlueprint, ScoreSnapshot, ScoringEngine, ScoringMode,
    SelectionSet, SessionStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct TrainingScoreRequest {
    pub(crate) script: ScriptChoice,
    /// One chosen option index per script line, in line order.
    pub(crate) selections: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptChoice {
    Assessment,
    Coaching,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrainingScoreResponse {
    pub(crate) script: ScriptChoice,
    pub(crate) snapshot: ScoreSnapshot,
    pub(crate) weak_points: Vec<usize>,
}

pub(crate) fn with_debrief_routes<S>(service: Arc<DebriefService<S>>) -> axum::Router
where
    S: SessionStore + 'static,
{
    debrief_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/training/score",
            axum::routing::post(training_score_endpoint),
        )
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

/// One-shot scorer over the packaged scripts. No session state is read or
/// written; the caller supplies a full set of answers and gets back the
/// snapshot plus the lines a re-run would target.
pub(crate) async fn training_score_endpoint(
    Json(payload): Json<TrainingScoreRequest>,
) -> impl IntoResponse {
    let TrainingScoreRequest { script, selections } = payload;

    let (dialogue, catalog) = match script {
        ScriptChoice::Assessment => DialogueBlueprint::assessment(),
        ScriptChoice::Coaching => DialogueBlueprint::coaching(),
    };

    let choices = selections.into_iter().map(Some).collect();
    let run = match SelectionSet::from_choices(&dialogue, choices) {
        Ok(run) => run,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    };

    let engine = ScoringEngine::new(catalog, default_scoring_config());
    let (snapshot, weak_points) = match script {
        ScriptChoice::Assessment => (engine.assessment_snapshot(&run), engine.weak_points(&run)),
        ScriptChoice::Coaching => (
            engine.continuous_snapshot(&dialogue, &run),
            engine.weak_points_continuous(&dialogue, &run),
        ),
    };

    (
        StatusCode::OK,
        Json(TrainingScoreResponse {
            script,
            snapshot,
            weak_points,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use empathy_coach::training::debrief::ScoringConfig;
    use tower::ServiceExt;

    fn assessment_app() -> axum::Router {
        let (script, catalog) = DialogueBlueprint::assessment();
        let store = Arc::new(InMemorySessionStore::default());
        let service = Arc::new(
            DebriefService::new(
                script,
                catalog,
                ScoringMode::Assessment,
                ScoringConfig::default(),
                store,
            )
            .expect("packaged script validates"),
        );
        with_debrief_routes(service)
    }

    async fn post_score(app: axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/training/score")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = serde_json::from_slice(&bytes).expect("body is json");
        (status, json)
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let response = assessment_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn training_score_endpoint_scores_a_perfect_assessment() {
        let body = json!({
            "script": "assessment",
            "selections": [0, 0, 0, 0, 0, 0],
        });

        let (status, json) = post_score(assessment_app(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["snapshot"]["total"], 12.0);
        assert_eq!(json["snapshot"]["max"], 12.0);
        assert!(json["weak_points"].as_array().expect("array").is_empty());
    }

    #[tokio::test]
    async fn training_score_endpoint_flags_weak_beats() {
        let body = json!({
            "script": "assessment",
            "selections": [0, 0, 0, 2, 0, 1],
        });

        let (status, json) = post_score(assessment_app(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["snapshot"]["total"], 9.0);
        assert_eq!(json["weak_points"], json!([3, 5]));
    }

    #[tokio::test]
    async fn training_score_endpoint_rejects_wrong_length() {
        let body = json!({
            "script": "assessment",
            "selections": [0, 0],
        });

        let (status, json) = post_score(assessment_app(), body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"]
            .as_str()
            .expect("message")
            .contains("entries"));
    }

    #[tokio::test]
    async fn training_score_endpoint_scores_the_coaching_script() {
        let body = json!({
            "script": "coaching",
            "selections": [0, 0, 0, 0, 0],
        });

        let (status, json) = post_score(assessment_app(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["script"], "coaching");
        assert!(json["snapshot"]["total"].as_f64().expect("total") >= 0.0);
    }
}
