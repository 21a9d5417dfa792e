//! Handler error type and its mapping onto HTTP responses.
//!
//! Page routes turn authorization failures into a redirect to `/` carrying
//! a notice header. The JSON API wraps errors in [`ApiError`] to get plain
//! status codes instead.

use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

use warbler_db::DbError;
use warbler_types::api::{ErrorBody, FieldError, FormKind, FormView};

/// Header carrying the human-readable reason for a rejection redirect.
pub const NOTICE_HEADER: &str = "x-warbler-notice";

const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("form failed validation")]
    Validation(FormView),

    /// A uniqueness rule rejected the write. `form` is set when the write
    /// came from a form that should be shown again.
    #[error("{message}")]
    Conflict {
        form: Option<FormKind>,
        message: String,
    },

    #[error("invalid credentials")]
    InvalidCredentials(FormView),

    /// A request that is well-formed but not allowed, outside any form.
    #[error("{0}")]
    Invalid(String),

    #[error("not found")]
    NotFound,

    #[error("login required")]
    Unauthorized,

    #[error("not the owner of the resource")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl Display) -> Self {
        Self::Internal(anyhow::anyhow!("{err}"))
    }

    pub fn invalid(form: FormKind, errors: Vec<FieldError>) -> Self {
        Self::Validation(FormView::with_errors(form, errors))
    }

    pub fn credentials(form: FormKind, message: &str) -> Self {
        Self::InvalidCredentials(FormView::with_errors(form, vec![FieldError::form(message)]))
    }

    /// Attach the submitting form to a conflict so it is shown again.
    pub fn in_form(self, form: FormKind) -> Self {
        match self {
            Self::Conflict { message, .. } => Self::Conflict {
                form: Some(form),
                message,
            },
            other => other,
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict { ref constraint } => Self::Conflict {
                form: None,
                message: conflict_message(constraint).to_string(),
            },
            DbError::NotFound => Self::NotFound,
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

fn conflict_message(constraint: &str) -> &'static str {
    if constraint.contains("users.username") {
        "Username already taken"
    } else if constraint.contains("users.email") {
        "Email already taken"
    } else if constraint.contains("follows.") {
        "Already following this user"
    } else {
        "Already exists"
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn reject_to_home() -> Response {
    ([(NOTICE_HEADER, ACCESS_UNAUTHORIZED)], Redirect::to("/")).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(view) => (StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response(),
            Self::Conflict {
                form: Some(form),
                message,
            } => (
                StatusCode::CONFLICT,
                Json(FormView::with_errors(form, vec![FieldError::form(message)])),
            )
                .into_response(),
            Self::Conflict {
                form: None,
                message,
            } => json_error(StatusCode::CONFLICT, &message),
            Self::InvalidCredentials(view) => (StatusCode::UNAUTHORIZED, Json(view)).into_response(),
            Self::Invalid(message) => json_error(StatusCode::UNPROCESSABLE_ENTITY, &message),
            Self::NotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
            Self::Unauthorized => {
                warn!("rejected anonymous request");
                reject_to_home()
            }
            Self::Forbidden => {
                warn!("rejected request on a resource the user does not own");
                reject_to_home()
            }
            Self::Internal(err) => {
                error!("internal error: {:#}", err);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Error wrapper for the JSON API: authorization failures become 401/403
/// bodies rather than redirects.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, ACCESS_UNAUTHORIZED),
            AppError::Forbidden => json_error(StatusCode::FORBIDDEN, "Forbidden"),
            other => other.into_response(),
        }
    }
}
