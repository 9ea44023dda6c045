use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::eligibility::{evaluate, explain, PredicateOutcome, Verdict};
use crate::extract::Extractor;
use crate::predicate::Predicate;
use crate::profile::UserProfile;
use crate::ranking::{rank, MatchResult};
use crate::rules::RuleBook;
use crate::scheme::Scheme;
use crate::source::source_for;

#[derive(Clone)]
pub struct ApiState {
    config: Config,
    extractor: Extractor,
}

impl ApiState {
    pub fn new(config: Config, extractor: Extractor) -> Self {
        Self { config, extractor }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    rules_version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExtractRequest {
    text: Option<String>,
    #[serde(default)]
    clauses: Vec<String>,
    region: Option<String>,
    ministry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RankRequest {
    #[serde(default)]
    user: UserProfile,
    schemes: Option<Vec<Scheme>>,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EvaluateRequest {
    #[serde(default)]
    user: UserProfile,
    scheme: Option<Scheme>,
    predicates: Option<Vec<Predicate>>,
    #[serde(default)]
    explain: bool,
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    #[serde(flatten)]
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcomes: Option<Vec<PredicateOutcome>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/rules", get(show_rules))
        .route("/v1/extract", post(extract_predicates))
        .route("/v1/rank", post(rank_schemes))
        .route("/v1/evaluate", post(evaluate_scheme))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let extractor = config.extractor()?;
    let app = router(ApiState::new(config, extractor));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        rules_version: state.extractor.rules().version.clone(),
    })
}

async fn show_rules(State(state): State<ApiState>) -> Json<ApiResponse<RuleBook>> {
    ok(state.extractor.rules().book().clone())
}

async fn extract_predicates(
    State(state): State<ApiState>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<Vec<Predicate>> {
    let mut clauses = request.clauses;
    if let Some(text) = request.text {
        clauses.insert(0, text);
    }
    if clauses.is_empty() {
        return Err(ApiError::bad_request("provide `text` or `clauses`"));
    }
    Ok(ok(state.extractor.extract_all(
        &clauses,
        request.region.as_deref(),
        request.ministry.as_deref(),
    )))
}

async fn rank_schemes(
    State(state): State<ApiState>,
    Json(request): Json<RankRequest>,
) -> ApiResult<Vec<MatchResult>> {
    let schemes = match request.schemes {
        Some(schemes) => schemes,
        None => source_for(&state.config.resolved_schemes())
            .fetch()
            .await
            .map_err(|e| ApiError::internal(format!("{e:#}")))?,
    };
    let resolved: Vec<Scheme> = schemes
        .iter()
        .map(|scheme| scheme.resolve(&state.extractor))
        .collect();
    let limit = request.limit.unwrap_or(state.config.ranking.limit);
    Ok(ok(rank(&request.user, &resolved, limit)))
}

async fn evaluate_scheme(
    State(state): State<ApiState>,
    Json(request): Json<EvaluateRequest>,
) -> ApiResult<EvaluateResponse> {
    let predicates: Vec<Predicate> = match (request.predicates, request.scheme) {
        (Some(predicates), _) => predicates,
        (None, Some(scheme)) => scheme.resolve(&state.extractor).predicates().cloned().collect(),
        (None, None) => return Err(ApiError::bad_request("provide `scheme` or `predicates`")),
    };
    let verdict = evaluate(&request.user, &predicates);
    let outcomes = request
        .explain
        .then(|| explain(&request.user, &predicates));
    Ok(ok(EvaluateResponse { verdict, outcomes }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}
