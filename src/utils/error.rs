use thiserror::Error;

/// Failure reported by a remote collaborator (registrar or renderer).
#[derive(Error, Debug)]
pub enum RemoteFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected reply: {0}")]
    Decode(String),

    #[error("refused tracking codes: {}", .codes.join(", "))]
    Refused { codes: Vec<String> },
}

#[derive(Error, Debug)]
pub enum SigepError {
    #[error("Validation error on '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Cannot close posting list, {field}: {message}")]
    Precondition { field: String, message: String },

    #[error("Configuration error on '{field}': {message}")]
    Configuration { field: String, message: String },

    #[error("No posting list has been closed in this session")]
    NotClosed,

    #[error("Remote operation '{operation}' failed{}: {source}", batch_suffix(.batch_id))]
    RemoteOperation {
        operation: &'static str,
        batch_id: Option<u32>,
        #[source]
        source: RemoteFailure,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn batch_suffix(batch_id: &Option<u32>) -> String {
    match batch_id {
        Some(id) => format!(" for batch {}", id),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lifecycle,
    Configuration,
    Remote,
    System,
}

impl SigepError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SigepError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn precondition(field: impl Into<String>, message: impl Into<String>) -> Self {
        SigepError::Precondition {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        SigepError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn remote(operation: &'static str, batch_id: Option<u32>, source: impl Into<RemoteFailure>) -> Self {
        SigepError::RemoteOperation {
            operation,
            batch_id,
            source: source.into(),
        }
    }

    /// Attaches a batch id to a remote failure that was raised without one.
    pub fn for_batch(self, id: u32) -> Self {
        match self {
            SigepError::RemoteOperation {
                operation,
                batch_id: None,
                source,
            } => SigepError::RemoteOperation {
                operation,
                batch_id: Some(id),
                source,
            },
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SigepError::Validation { .. } => ErrorCategory::Input,
            SigepError::Precondition { .. } | SigepError::NotClosed => ErrorCategory::Lifecycle,
            SigepError::Configuration { .. } => ErrorCategory::Configuration,
            SigepError::RemoteOperation { .. } => ErrorCategory::Remote,
            SigepError::Io(_)
            | SigepError::Serialization(_)
            | SigepError::Csv(_)
            | SigepError::Zip(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Fix the offending field in the batch input and try again",
            ErrorCategory::Lifecycle => {
                "Register a sender, a receiver and at least one package, then close the posting list"
            }
            ErrorCategory::Configuration => "Check the session configuration file and environment variables",
            ErrorCategory::Remote => {
                "The batch data was kept; check registrar connectivity and credentials, then retry the close"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, SigepError>;
