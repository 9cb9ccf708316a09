use http::StatusCode;

/// Errors returned by a [`StorageApi`](super::StorageApi) backend.
///
/// The variants follow how the drive reacts to them: `NotFound` is a normal
///  negative answer for probes, `Conflict` is recovered from when emptying a
///  bucket, `Forbidden` is skipped during drive-wide enumeration, and
///  everything else is surfaced with its status code intact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl StorageError {
    /// Map an HTTP status and message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::NOT_FOUND => StorageError::NotFound(message),
            StatusCode::CONFLICT => StorageError::Conflict(message),
            StatusCode::FORBIDDEN => StorageError::Forbidden(message),
            status => StorageError::Status { status, message },
        }
    }

    /// The HTTP status this error corresponds to, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StorageError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            StorageError::Conflict(_) => Some(StatusCode::CONFLICT),
            StorageError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            StorageError::Status { status, .. } => Some(*status),
            StorageError::Transport(_) | StorageError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, StorageError::Forbidden(_))
    }
}

/// Outcome of a probe where absence is an answer rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Fold a backend result: `NotFound` becomes [`Lookup::NotFound`], every
    ///  other error propagates.
    pub fn from_result(result: Result<T, StorageError>) -> Result<Self, StorageError> {
        match result {
            Ok(value) => Ok(Lookup::Found(value)),
            Err(StorageError::NotFound(_)) => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}
