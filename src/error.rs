use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error fetching {resource}: HTTP {status}: {body}")]
    Fetch {
        resource: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error in {resource} row {row}: {reason}")]
    Parse {
        resource: &'static str,
        row: usize,
        reason: String,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True for failures that came from talking to or reading the upstream site.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Fetch { .. } | AppError::Http(_) | AppError::Parse { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = if self.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}
