use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

/// Failure reported by a record store or the employee directory.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write collided with the one-record-per-employee-per-day constraint.
    #[error("duplicate attendance: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt attendance row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Only duplicate-key errors (MySQL 1062) become [`StoreError::Duplicate`].
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The request violates the check-in/check-out state machine.
    #[error("{0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AttendanceError {
    pub fn employee_not_found(employee_id: u64) -> Self {
        AttendanceError::NotFound {
            entity: "Employee",
            id: employee_id.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        AttendanceError::InvalidState(message.into())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::NotFound { .. } => StatusCode::NOT_FOUND,
            AttendanceError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AttendanceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Store(e) => {
                tracing::error!(error = %e, "Attendance store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
