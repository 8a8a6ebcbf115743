use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{Next, from_fn},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use solar_analysis::{
    AnalysisClient, AnalyzerError, EncodedImagePayload, InMemorySessionStorage, ReportView,
    Session, SessionPhase, SessionStorage, SolarAnalysis, encode_image, parse_analysis,
    report_json,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::config::Config;

// Fixed download filename, matching the report action on the page.
const REPORT_CONTENT_DISPOSITION: &str = "attachment; filename=\"solar_analysis_report.json\"";

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn decode_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn parse_error(message: &str, raw_reply: &str) -> ApiError {
    // The offending reply text rides along for diagnosis.
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": message,
            "raw_reply": raw_reply
        })),
    )
}

fn upstream_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "details": details,
            "hint": "check your OpenRouter API key and try again"
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    session_storage: Arc<dyn SessionStorage>,
    client: Arc<AnalysisClient>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    phase: SessionPhase,
    status_message: Option<String>,
    report: Option<ReportView>,
}

impl SessionResponse {
    fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            phase: session.phase,
            status_message: session.status_message.clone(),
            report: session.analysis.as_ref().map(ReportView::from_analysis),
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn create_app(config: &Config) -> Router {
    let state = AppState {
        session_storage: Arc::new(InMemorySessionStorage::new()),
        client: Arc::new(AnalysisClient::new(
            &config.base_url,
            &config.api_key,
            &config.model,
        )),
    };
    build_router(state)
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/image", post(upload_image))
        .route("/api/sessions/{id}/analyze", post(analyze))
        .route("/api/sessions/{id}/report", get(download_report))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Rooftop photos routinely exceed the framework's default body cap;
        // uploads are bounded only by what the decoder will accept.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let session = Session::new(Uuid::new_v4().to_string());
    info!(session_id = %session.id, "creating new session");

    let response = SessionResponse::from_session(&session);
    save_session(&state, session).await?;
    Ok(Json(response))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// The session's end clears its slot; nothing outlives the interaction.
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!(session_id = %session_id, "deleting session");
    state.session_storage.delete(&session_id).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "failed to delete session");
        internal_error("failed to delete session", &e.to_string())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<SessionResponse> {
    let mut session = load_session(&state, &session_id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request_error(&format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| bad_request_error(&format!("failed to read upload: {e}")))?;
            upload = Some((file_name, data));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| bad_request_error("multipart field 'image' is required"))?;

    // Same gate as the original file picker: extension only, no sniffing.
    if !has_supported_extension(&file_name) {
        return Err(bad_request_error(
            "only jpg, jpeg, and png uploads are accepted",
        ));
    }

    info!(
        session_id = %session_id,
        file_name = %file_name,
        bytes = data.len(),
        "ingesting uploaded image"
    );

    // Decode failures are terminal for the request; no fallback.
    let payload = encode_image(&data)
        .map_err(|e| decode_error("could not decode uploaded image", &e.to_string()))?;

    session.accept_image(payload);
    let response = SessionResponse::from_session(&session);
    save_session(&state, session).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    session_id: String,
    phase: SessionPhase,
    report: ReportView,
}

async fn analyze(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<AnalyzeResponse> {
    let mut session = load_session(&state, &session_id).await?;

    let image = session
        .begin_analysis()
        .map_err(|e| conflict_error(&e.to_string()))?;

    // Persist the in-flight phase so status polls see it while the
    // (potentially long) upstream call is awaited.
    save_session(&state, session.clone()).await?;

    info!(session_id = %session_id, "analysis started");

    match run_analysis(&state.client, &image).await {
        Ok(analysis) => {
            let report = ReportView::from_analysis(&analysis);
            session.complete_analysis(analysis);
            save_session(&state, session).await?;

            info!(session_id = %session_id, "analysis complete");
            Ok(Json(AnalyzeResponse {
                session_id,
                phase: SessionPhase::ResultReady,
                report,
            }))
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "analysis failed");
            session.fail_analysis(e.to_string());
            save_session(&state, session).await?;

            Err(match e {
                AnalyzerError::Parse { ref raw } => {
                    parse_error("could not parse model reply as JSON", raw)
                }
                _ => upstream_error("analysis failed", &e.to_string()),
            })
        }
    }
}

async fn run_analysis(
    client: &AnalysisClient,
    image: &EncodedImagePayload,
) -> solar_analysis::Result<SolarAnalysis> {
    let reply = client.request_analysis(image).await?;
    parse_analysis(&reply)
}

async fn download_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let session = load_session(&state, &session_id).await?;

    let analysis = session
        .analysis
        .as_ref()
        .ok_or_else(|| not_found_error("no analysis result for session", &session_id))?;

    let body = report_json(analysis)
        .map_err(|e| internal_error("failed to serialize report", &e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, REPORT_CONTENT_DISPOSITION),
        ],
        body,
    )
        .into_response())
}

fn has_supported_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
}

async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("session not found", session_id)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to load session");
            Err(internal_error("failed to load session", &e.to_string()))
        }
    }
}

async fn save_session(state: &AppState, session: Session) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!(error = %e, "failed to save session");
        internal_error("failed to save session", &e.to_string())
    })
}
