//! Error types for the lead funnel.

/// Top-level error type for the funnel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Session store errors.
///
/// Only writes can fail from a caller's point of view; reads resolve to
/// empty defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write session key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating a form schema at construction time.
///
/// Returned directly by `FormSchema::new`; a schema is fixed before any
/// funnel operation runs, so this never travels inside [`Error`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Form schema declares no steps")]
    NoSteps,

    #[error("Step {step} declares no fields")]
    EmptyStep { step: usize },

    #[error("Field {name} is declared more than once")]
    DuplicateField { name: String },

    #[error("Field {name} must be multi-valued")]
    MustBeMulti { name: String },

    #[error("Field {name} lists option {option} more than once")]
    DuplicateOption { name: String, option: String },
}

/// Onboarding wizard errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("Unknown form field: {name}")]
    UnknownField { name: String },

    #[error("Field {name} is {expected}, not {actual}")]
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Field {name} has no option {option}")]
    UnknownOption { name: String, option: String },

    #[error("Required field {name} is empty")]
    MissingRequired { name: String },

    #[error("Submit is only available on the final step (current step {step} of {total})")]
    NotOnFinalStep { step: usize, total: usize },
}

/// Backend endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Result type alias for the funnel.
pub type Result<T> = std::result::Result<T, Error>;
