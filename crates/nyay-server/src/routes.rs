use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use nyay_core::{CaseContext, TrialError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::AppState;

const MISSING_DESCRIPTION: &str = "Case description is required";
const TRIAL_FAILED: &str = "The courtroom simulation could not be completed. Please try again.";

// ── Error helper ──────────────────────────────────────────────────────────

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn trial_failure(e: &TrialError) -> ApiError {
    if e.is_client_error() {
        warn!("courtroom battle rejected: {e}");
        return api_error(StatusCode::BAD_REQUEST, MISSING_DESCRIPTION);
    }
    error!("courtroom battle failed: {e}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, TRIAL_FAILED)
}

// ── Request body types ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourtroomBattleBody {
    pub case_title: Option<String>,
    pub case_description: Option<String>,
    pub case_type: Option<String>,
    pub plaintiff_side: Option<String>,
    pub defense_side: Option<String>,
}

impl From<CourtroomBattleBody> for CaseContext {
    fn from(body: CourtroomBattleBody) -> Self {
        CaseContext {
            title: body.case_title,
            description: body.case_description.unwrap_or_default(),
            case_type: body.case_type,
            plaintiff_side: body.plaintiff_side,
            defense_side: body.defense_side,
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────────

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/ai/courtroom-battle", post(courtroom_battle))
        .route("/api/logs", get(sse_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.trial.backend_name(),
        "uptime_s": state.start_time.elapsed().as_secs(),
    }))
}

pub(crate) async fn courtroom_battle(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CourtroomBattleBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    // An unreadable body carries no description either
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("unreadable courtroom battle body: {rejection}");
            return Err(api_error(StatusCode::BAD_REQUEST, MISSING_DESCRIPTION));
        },
    };

    let case = CaseContext::from(body);
    info!(case_title = %case.title(), case_type = %case.case_type(), "courtroom battle requested");

    let result = state.trial.run(&case).await.map_err(|e| trial_failure(&e))?;
    let value = serde_json::to_value(&result).map_err(|e| {
        error!("failed to serialize trial result: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, TRIAL_FAILED)
    })?;
    Ok(Json(value))
}

pub(crate) async fn sse_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    // Subscribe before snapshotting ring to avoid race
    let live_rx = state.log_tx.subscribe();
    let history: Vec<String> = state
        .log_ring
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .cloned()
        .collect();
    tokio::spawn(async move {
        for line in history {
            if tx.send(line).is_err() {
                return;
            }
        }
        let mut live_rx = live_rx;
        loop {
            match live_rx.recv().await {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });
    let stream = UnboundedReceiverStream::new(rx)
        .map(|data| Ok::<_, std::convert::Infallible>(Event::default().data(data)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use nyay_core::{
        agent::{CompletionBackend, CompletionRequest, ResponseFormat},
        Trial,
    };
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
        time::Instant,
    };
    use tower::ServiceExt;

    const VERDICT: &str = r#"{
        "ruling": "In favor of Plaintiff",
        "win_probability_plaintiff": 70,
        "win_probability_defense": 30,
        "judge_summary": "The deposit was withheld without cause.",
        "key_precedents": ["Section 73 of the Indian Contract Act, 1872"],
        "deciding_factor": "No damage was proved.",
        "final_order": "Refund the deposit with interest."
    }"#;

    struct Courtroom {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionBackend for Courtroom {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &CompletionRequest) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("upstream unavailable");
            }
            match request.format {
                ResponseFormat::Text => Ok(format!("Speech {n} relying on Article 21.")),
                ResponseFormat::Json { .. } => Ok(VERDICT.to_string()),
            }
        }
    }

    fn app(fail: bool) -> (Router, Arc<Courtroom>) {
        let backend = Arc::new(Courtroom {
            fail,
            calls: AtomicUsize::new(0),
        });
        let (log_tx, _) = broadcast::channel(16);
        let state = Arc::new(AppState {
            trial: Trial::new(backend.clone()),
            start_time: Instant::now(),
            log_tx,
            log_ring: Arc::new(std::sync::Mutex::new(VecDeque::new())),
        });
        (router(state), backend)
    }

    fn post_battle(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ai/courtroom-battle")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_battle_returns_rounds_and_verdict() {
        let (app, backend) = app(false);
        let response = app
            .oneshot(post_battle(
                r#"{"caseDescription":"Landlord kept a deposit of Rs 50,000.","caseType":"Civil"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["case_title"], "The Instant Case");
        assert_eq!(body["case_type"], "Civil");

        let rounds = body["rounds"].as_array().unwrap();
        assert_eq!(rounds.len(), 5);
        assert_eq!(rounds[0]["speaker"], "plaintiff");
        assert_eq!(rounds[0]["type"], "Opening Argument");
        assert_eq!(rounds[2]["speaker"], "judge");
        assert_eq!(rounds[0]["sections"], json!(["Article 21"]));

        assert_eq!(body["verdict"]["ruling"], "In favor of Plaintiff");
        assert_eq!(body["verdict"]["win_probability_plaintiff"], 70.0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_blank_description_is_rejected_without_calls() {
        for body in [r#"{"caseDescription":"   "}"#, r#"{"caseTitle":"X"}"#, "not json"] {
            let (app, backend) = app(false);
            let response = app.oneshot(post_battle(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(
                read_json(response).await,
                json!({ "error": "Case description is required" })
            );
            assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_a_generic_500() {
        let (app, backend) = app(true);
        let response = app
            .oneshot(post_battle(r#"{"caseDescription":"A cheque bounced."}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("try again"), "{message}");
        assert!(!message.contains("upstream"), "{message}");
        assert!(body.get("rounds").is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (app, _) = app(false);
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "scripted");
    }
}
