use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Internal classification of a tagged failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum InternalErrorCode {
    Others = 0,
    SecurityValidation = 1,
    InvalidPassword = 2,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Authentication or authorization failure.
    #[error("security validation failed ({internal:?})")]
    Security {
        internal: InternalErrorCode,
        error_code: Option<i32>,
        additional_info: Option<String>,
    },
    /// Expected business failure reported to the caller.
    #[error("service error ({internal:?})")]
    Tagged {
        internal: InternalErrorCode,
        error_code: Option<i32>,
        additional_info: Option<String>,
    },
    /// Anything else; details never leave the service.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn security(info: impl Into<String>) -> Self {
        ServiceError::Security {
            internal: InternalErrorCode::SecurityValidation,
            error_code: None,
            additional_info: Some(info.into()),
        }
    }

    pub fn tagged(internal: InternalErrorCode, error_code: Option<i32>, info: Option<String>) -> Self {
        ServiceError::Tagged {
            internal,
            error_code,
            additional_info: info,
        }
    }
}

/// Body returned to callers for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub internal_error_code: Option<i32>,
    pub error_code: Option<i32>,
    pub additional_info: Option<String>,
}

/// Maps a failure onto the response a caller sees. Security failures become
/// 401, other tagged failures 500 with their codes, and untagged failures a
/// bare 500. The full error is logged first.
pub fn translate(err: &ServiceError) -> (StatusCode, ErrorPayload) {
    tracing::error!(error = ?err, "request failed");
    match err {
        ServiceError::Security {
            internal,
            error_code,
            additional_info,
        } => (
            StatusCode::UNAUTHORIZED,
            ErrorPayload {
                internal_error_code: Some(*internal as i32),
                error_code: *error_code,
                additional_info: additional_info.clone(),
            },
        ),
        ServiceError::Tagged {
            internal,
            error_code,
            additional_info,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorPayload {
                internal_error_code: Some(*internal as i32),
                error_code: *error_code,
                additional_info: additional_info.clone(),
            },
        ),
        ServiceError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorPayload {
                internal_error_code: None,
                error_code: None,
                additional_info: None,
            },
        ),
    }
}

/// `translate` rendered as a JSON body.
pub fn translate_to_json(err: &ServiceError) -> (StatusCode, String) {
    let (status, payload) = translate(err);
    let body = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    (status, body)
}
