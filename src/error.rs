use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use std::env;
use std::fmt::Debug;

/// Error codes below 100 are internal and rendered as an opaque 500; codes
/// from 100 up are caller-visible and map to a concrete client status.
#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
    pub details: Value,
}

impl Error {
    pub fn env_var_error(_: env::VarError) -> Error {
        Error {
            code: 1,
            message: "environment variable error".into(),
            details: Value::Null,
        }
    }

    pub fn database_error<T: Debug>(err: T) -> Error {
        tracing::error!(?err, "database error");

        Error {
            code: 2,
            message: "database error".into(),
            details: Value::Null,
        }
    }

    pub fn http_client_error(err: reqwest::Error) -> Error {
        tracing::error!(?err, "http client error");

        Error {
            code: 3,
            message: "http client error".into(),
            details: Value::Null,
        }
    }

    pub fn upstream_error() -> Error {
        Error {
            code: 4,
            message: "upstream error".into(),
            details: Value::Null,
        }
    }

    pub fn unexpected_error<T: Debug>(err: T) -> Error {
        tracing::error!(?err, "unexpected error");

        Error {
            code: 5,
            message: "unexpected error".into(),
            details: Value::Null,
        }
    }

    pub fn config_error(message: &str) -> Error {
        Error {
            code: 6,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn state_conflict_error(current_status: &str) -> Error {
        Error {
            code: 100,
            message: format!("operation not valid in the {} state", current_status),
            details: json!({ "current_status": current_status }),
        }
    }

    pub fn validation_error(message: &str) -> Error {
        Error {
            code: 101,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn not_found_error(what: &str) -> Error {
        Error {
            code: 102,
            message: format!("{} not found", what),
            details: Value::Null,
        }
    }

    pub fn unauthorized_error() -> Error {
        Error {
            code: 103,
            message: "not authorized".into(),
            details: Value::Null,
        }
    }

    pub fn quota_exceeded_error(remaining_rides: u32, daily_limit: u32) -> Error {
        Error {
            code: 104,
            message: format!("daily ride limit of {} reached", daily_limit),
            details: json!({
                "remaining_rides": remaining_rides,
                "daily_limit": daily_limit,
            }),
        }
    }

    pub fn commission_not_configured_error() -> Error {
        Error {
            code: 105,
            message: "app commission not configured".into(),
            details: Value::Null,
        }
    }

    pub fn is_state_conflict_error(&self) -> bool {
        self.code == 100
    }

    pub fn is_not_found_error(&self) -> bool {
        self.code == 102
    }

    pub fn is_quota_exceeded_error(&self) -> bool {
        self.code == 104
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        Error::env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::http_client_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        Error::unexpected_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            100 | 104 => (StatusCode::CONFLICT, self.message.as_str()),
            101 => (StatusCode::BAD_REQUEST, self.message.as_str()),
            102 | 105 => (StatusCode::NOT_FOUND, self.message.as_str()),
            103 => (StatusCode::FORBIDDEN, self.message.as_str()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        let mut body = serde_json::Map::new();
        body.insert("code".into(), json!(self.code));
        body.insert("error".into(), json!(error_message));

        if let Value::Object(details) = self.details {
            for (key, value) in details {
                body.insert(key, value);
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}
