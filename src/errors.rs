use axum::http::StatusCode;
use thiserror::Error;

/// Why a backend call did not produce usable rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failures inside the dashboard. None of them is fatal; each degrades a
/// subset of the panels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("failed to fetch {resource}: {cause}")]
    Fetch {
        resource: &'static str,
        cause: FetchCause,
    },
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("no rows returned for {resource}")]
    EmptyResult { resource: &'static str },
}

impl DashboardError {
    pub fn fetch(resource: &'static str, cause: FetchCause) -> Self {
        Self::Fetch { resource, cause }
    }

    /// Short text for the shared status line. Never includes the raw cause.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch { resource, .. } => format!("Failed to load {resource} data."),
            Self::InvalidSelection(_) => "That selection is not available.".to_string(),
            Self::EmptyResult { resource } => format!("No {resource} data is available."),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::InvalidSelection(_) => Self::bad_request(err.to_string()),
            DashboardError::EmptyResult { .. } => Self::not_found(err.user_message()),
            DashboardError::Fetch { .. } => Self {
                status: StatusCode::BAD_GATEWAY,
                message: err.user_message(),
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
