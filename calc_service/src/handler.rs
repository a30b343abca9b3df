use calculator::EvalError;
use serde::{Deserialize, Serialize};
use std::panic;

use crate::http::{Request, Response, StatusCode};
use crate::logger::Logger;

pub const CALCULATE_PATH: &str = "/api/v1/calculate";
pub const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// A missing field reads as the empty string and is reported as an
    /// empty expression rather than a decoding failure.
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalculateResponse {
    pub fn result(value: f64) -> Self {
        CalculateResponse {
            result: Some(format_result(value)),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        CalculateResponse {
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Six fixed decimals, the presentation both front ends use. Non-finite
/// values are spelled `+Inf`, `-Inf` and `NaN`.
pub fn format_result(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:.6}", value)
    }
}

pub fn status_for(error: &EvalError) -> StatusCode {
    match error {
        EvalError::EmptyExpression
        | EvalError::InvalidExpression
        | EvalError::DivisionByZero => StatusCode::UnprocessableEntity,
    }
}

/// Runs the evaluator, turning a panic into `None` so the caller can answer
/// with a generic server error.
fn evaluate_guarded(expression: &str) -> Option<Result<f64, EvalError>> {
    panic::catch_unwind(|| calculator::evaluate(expression)).ok()
}

pub fn route(request: &Request, logger: &Logger) -> Response {
    if request.path != CALCULATE_PATH {
        logger.log(&format!("Not Found: {} {}", request.method, request.path));
        return Response::json(StatusCode::NotFound, &CalculateResponse::error("not found"));
    }
    if request.method != "POST" {
        logger.log(&format!("Method Not Allowed: {} {}", request.method, request.path));
        return Response::json(
            StatusCode::MethodNotAllowed,
            &CalculateResponse::error("method not allowed"),
        )
        .with_header("Allow", "POST");
    }
    calculate(&request.body, logger)
}

pub fn calculate(body: &[u8], logger: &Logger) -> Response {
    let request: CalculateRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            logger.log(&format!("Bad Request: {}", e));
            return Response::json(StatusCode::BadRequest, &CalculateResponse::error(e.to_string()));
        }
    };

    let (status, message) = match evaluate_guarded(&request.expression) {
        Some(Ok(value)) => {
            logger.log(&format!(
                "Successful calculation: {} = {}",
                request.expression,
                format_result(value)
            ));
            return Response::json(StatusCode::Ok, &CalculateResponse::result(value));
        }
        Some(Err(e)) => (status_for(&e), e.to_string()),
        None => (StatusCode::InternalServerError, UNKNOWN_ERROR.to_string()),
    };

    logger.log(&format!(
        "Error: {}, Status: {}, Message: {}",
        request.expression,
        status.code(),
        message
    ));
    Response::json(status, &CalculateResponse::error(message))
}
