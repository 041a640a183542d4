//! ICP generation routes.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use icp_core::icp::{IcpError, IcpFileName, IcpReport, IcpRequest};
use icp_shared::{AppError, ReportMonth};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Creates the ICP routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/icp/append", post(append))
        .route("/icp/taxAgency/{duty_party}", get(generate_for_duty_party))
        .route("/icp/download/{filename}", get(download))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for regenerating a named file.
#[derive(Debug, Deserialize)]
pub struct AppendRequest {
    /// Existing file name, e.g. `BE0796544895_202209_01154020.xlsx`.
    pub file_name: String,
    /// Declarations to write into it.
    pub customs_ids: Vec<String>,
}

/// Query string of the duty party route.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`; empty means the current month.
    #[serde(default)]
    pub month: Option<String>,
}

/// Outcome of a generation request.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// `success` or `fail`.
    pub status: &'static str,
    /// Generated file name.
    pub file_name: String,
    /// Accumulated errors.
    pub errors: Vec<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn classify(err: &IcpError) -> AppError {
    match err {
        IcpError::InvalidFileName(_)
        | IcpError::NoDeclarations(_)
        | IcpError::NoDutyParties(_) => AppError::Validation(err.to_string()),
        _ => AppError::Generation(err.to_string()),
    }
}

fn status_of(err: &AppError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn parse_month(month: Option<&str>) -> Result<ReportMonth, AppError> {
    match month.map(str::trim) {
        None | Some("") => Ok(ReportMonth::current()),
        Some(m) => ReportMonth::parse(m)
            .map_err(|_| AppError::Validation(format!("invalid month {m}, expected YYYY-MM"))),
    }
}

fn fail(err: &AppError, file_name: String) -> Response {
    (
        status_of(err),
        Json(GenerationResponse {
            status: "fail",
            file_name,
            errors: vec![err.to_string()],
        }),
    )
        .into_response()
}

fn report_response(result: Result<IcpReport, IcpError>) -> Response {
    match result {
        Ok(report) if report.errors.is_empty() && report.written => {
            info!(file = %report.file_name, rows = report.rows, "ICP generated");
            (
                StatusCode::OK,
                Json(GenerationResponse {
                    status: "success",
                    file_name: report.file_name,
                    errors: Vec::new(),
                }),
            )
                .into_response()
        }
        Ok(report) => {
            warn!(
                file = %report.file_name,
                errors = report.errors.len(),
                "ICP generated with errors"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerationResponse {
                    status: "fail",
                    file_name: report.file_name,
                    errors: report.errors.iter().map(ToString::to_string).collect(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "ICP generation failed");
            fail(&classify(&e), String::new())
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/icp/append`
/// Rewrite an existing file name with an explicit declaration list.
async fn append(
    State(state): State<AppState>,
    payload: Result<Json<AppendRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected append body");
            return fail(&AppError::Validation(e.body_text()), String::new());
        }
    };
    let request = IcpRequest::Append {
        file_name: payload.file_name,
        customs_ids: payload.customs_ids,
    };
    report_response(state.icp.generate(request).await)
}

/// GET `/icp/taxAgency/{duty_party}?month=YYYY-MM`
/// Generate a fresh file for one duty party.
async fn generate_for_duty_party(
    State(state): State<AppState>,
    Path(duty_party): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Response {
    let month = match parse_month(query.month.as_deref()) {
        Ok(month) => month,
        Err(e) => return fail(&e, String::new()),
    };
    let request = IcpRequest::Period { duty_party, month };
    report_response(state.icp.generate(request).await)
}

/// GET `/icp/download/{filename}`
/// Serve a generated workbook as an attachment.
async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("File {filename} not found")
            })),
        )
            .into_response()
    };

    let Ok(name) = IcpFileName::parse(&filename) else {
        return not_found();
    };
    let path = name.path(&state.config.icp.save_dir);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", name.as_str()),
                ),
            ],
            Body::from(bytes),
        )
            .into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Download failed");
            not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let invalid = classify(&IcpError::InvalidFileName("x.xlsx".to_string()));
        assert_eq!(status_of(&invalid), StatusCode::BAD_REQUEST);

        let empty = classify(&IcpError::NoDeclarations("BE01 2022-09".to_string()));
        assert_eq!(status_of(&empty), StatusCode::BAD_REQUEST);

        let db = classify(&IcpError::repository("connection reset"));
        assert_eq!(status_of(&db), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(None).unwrap(), ReportMonth::current());
        assert_eq!(parse_month(Some(" ")).unwrap(), ReportMonth::current());
        assert_eq!(
            parse_month(Some("2022-09")).unwrap(),
            ReportMonth::parse("2022-09").unwrap()
        );
        assert!(parse_month(Some("09-2022")).is_err());
    }
}
