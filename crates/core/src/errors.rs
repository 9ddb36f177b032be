use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Time slot already scheduled: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Tenant partition error: {0}")]
    Tenant(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ScheduleError {
    /// Errors the caller can fix by resubmitting different input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScheduleError::NotFound(_)
                | ScheduleError::Validation(_)
                | ScheduleError::Conflict(_)
                | ScheduleError::Authentication(_)
        )
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
