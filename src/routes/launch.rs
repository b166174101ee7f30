//! Launch handling and report assembly
//!
//! One handler drives the whole pipeline: verify the launch (or re-enter an
//! authenticated session), fetch statements from the LRS, aggregate them
//! into an activity tree, match the current assignment, compute a grade, and
//! sync it to the LMS. The response is the JSON report consumed by the
//! rendering front end.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::lti::launch::{reconstruct_launch_url, LaunchContext};
use crate::report::{aggregate_statements, calculate_grade, Activity};
use crate::server::AppState;

pub const SESSION_COOKIE: &str = "gradeway_session";

/// Cookie attributes follow LTI iframe requirements: the tool is embedded
/// cross-origin, so SameSite=None and Secure are mandatory.
pub fn session_cookie(session_id: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=None",
        SESSION_COOKIE, session_id
    )
}

/// Pull our session id out of the Cookie header, if any
pub fn extract_session_id<B>(req: &Request<B>) -> Option<String> {
    let cookies = req.headers().get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

// =============================================================================
// Report payload
// =============================================================================

#[derive(Serialize)]
struct ActivityView {
    id: String,
    name: String,
    status: crate::report::ActivityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    highest_score: Option<f64>,
    attempts: usize,
    latest_timestamp: String,
    children: Vec<ActivityView>,
}

impl ActivityView {
    fn from_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id.clone(),
            name: activity.name.clone(),
            status: activity.status,
            highest_score: activity.highest_score,
            attempts: activity.attempts.len(),
            latest_timestamp: activity.latest_timestamp.clone(),
            children: activity
                .children
                .iter()
                .map(ActivityView::from_activity)
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ReportStats {
    total_activities: usize,
    passed: usize,
    /// Average best score as a percentage with one decimal; absent when no
    /// activity carries a score
    #[serde(skip_serializing_if = "Option::is_none")]
    average_best_score: Option<f64>,
}

#[derive(Serialize)]
struct GradePassbackView {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_activity: Option<MatchedActivityView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grade: Option<f64>,
    transmitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct MatchedActivityView {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct ReportResponse {
    user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    course: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    stats: ReportStats,
    grade_passback: GradePassbackView,
    activities: Vec<ActivityView>,
}

fn report_stats(activities: &[Activity]) -> ReportStats {
    let scores: Vec<f64> = activities.iter().filter_map(|a| a.highest_score).collect();
    let average_best_score = (!scores.is_empty()).then(|| {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        (mean * 1000.0).round() / 10.0
    });

    ReportStats {
        total_activities: activities.len(),
        passed: activities
            .iter()
            .filter(|a| a.status == crate::report::ActivityStatus::Passed)
            .count(),
        average_best_score,
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Handle GET/POST on the launch endpoint
pub async fn handle_launch(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let existing_session = extract_session_id(&req);
    let session_record = existing_session
        .as_deref()
        .and_then(|id| state.sessions.get(id));

    if method == Method::POST {
        // Canonical launch URL reconstruction: forwarded proto wins over the
        // raw scheme, default ports are stripped, query string dropped
        let scheme = req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("http")
            .to_string();
        let host = req
            .headers()
            .get("host")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost")
            .to_string();
        let path = req.uri().path().to_string();
        let launch_url = reconstruct_launch_url(&scheme, &host, &path);

        let body = req.collect().await?.to_bytes();
        let params: Vec<(String, String)> =
            serde_urlencoded::from_bytes(&body).unwrap_or_default();
        let has_param = |key: &str| params.iter().any(|(k, _)| k == key);

        if has_param("lti_message_type") || has_param("id_token") {
            let verification = if has_param("lti_message_type") {
                state
                    .verifier
                    .verify_lti11(&launch_url, &params, chrono::Utc::now().timestamp())
            } else {
                let id_token = params
                    .iter()
                    .find(|(k, _)| k == "id_token")
                    .map(|(_, v)| v.as_str())
                    .unwrap_or_default();
                let access_token = session_record
                    .as_ref()
                    .and_then(|r| r.lti13_access_token.clone());
                state.verifier.verify_lti13(id_token, access_token.as_deref())
            };

            return match verification {
                Ok(launch) => {
                    info!(
                        "launch verified ({:?}) for {}",
                        launch.version,
                        launch.actor_email.as_deref().unwrap_or("<no email>")
                    );
                    let (session_id, is_new) = match existing_session {
                        Some(id) if session_record.is_some() => (id, false),
                        _ => (state.sessions.create(), true),
                    };
                    state.sessions.put_launch(&session_id, launch.clone());

                    let report = build_report(&state, &launch).await;
                    let mut builder = Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", "application/json");
                    if is_new {
                        builder = builder.header("Set-Cookie", session_cookie(&session_id));
                    }
                    Ok(builder
                        .body(Full::new(Bytes::from(
                            serde_json::to_string(&report).unwrap_or_default(),
                        )))
                        .unwrap())
                }
                Err(rejection) => {
                    warn!("launch rejected: {}", rejection);
                    Ok(launch_error(&rejection.to_string()))
                }
            };
        }
        // POST without launch parameters falls through to session re-entry
    }

    // Re-entry: an authenticated session skips re-verification entirely
    if let Some(launch) = session_record.and_then(|r| r.launch) {
        let report = build_report(&state, &launch).await;
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(
                serde_json::to_string(&report).unwrap_or_default(),
            )))
            .unwrap());
    }

    Ok(launch_error("Please launch this tool from your LMS"))
}

/// Run the report pipeline for a verified launch
async fn build_report(state: &AppState, launch: &LaunchContext) -> ReportResponse {
    let mut report = ReportResponse {
        user: launch.display_name.clone(),
        email: launch.actor_email.clone(),
        course: launch.context_title.clone(),
        error: None,
        stats: report_stats(&[]),
        grade_passback: GradePassbackView {
            available: launch.grade_passback.is_available(),
            matched_activity: None,
            grade: None,
            transmitted: false,
            error: None,
        },
        activities: Vec::new(),
    };

    let Some(email) = launch.actor_email.as_deref() else {
        report.error = Some(
            "Your email address was not provided by the LMS. Please contact your instructor."
                .to_string(),
        );
        return report;
    };

    let statements = match state.lrs.fetch_statements(email).await {
        Ok(statements) => statements,
        Err(e) => {
            report.error = Some(format!("Error fetching records: {}", e));
            return report;
        }
    };

    let activities = aggregate_statements(&statements);
    report.stats = report_stats(&activities);

    if launch.grade_passback.is_available() && !activities.is_empty() {
        let matched = state.matcher.find_match(
            &activities,
            launch.resource_link_title.as_deref(),
            launch.custom_lab_id.as_deref(),
        );

        match matched {
            Some(activity) => {
                let grade = calculate_grade(activity);
                report.grade_passback.matched_activity = Some(MatchedActivityView {
                    id: activity.id.clone(),
                    name: activity.name.clone(),
                });

                let result = state.passback.submit(&launch.grade_passback, grade).await;
                report.grade_passback.grade = Some(result.grade);
                report.grade_passback.transmitted = result.transmitted;
                report.grade_passback.error = result.transport_error;
            }
            None => {
                // Informational, not an error: passback is simply unavailable
                report.grade_passback.error =
                    Some("No matching activity found for this assignment".to_string());
            }
        }
    }

    report.activities = activities.iter().map(ActivityView::from_activity).collect();
    report
}

fn launch_error(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Launch Error",
        "message": message,
    });
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
