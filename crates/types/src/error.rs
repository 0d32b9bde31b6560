use snafu::Snafu;

/// Result type alias for Albar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Albar API
///
/// Use the constructor methods (e.g., `Error::validation("message")`) to
/// create errors. `status_code()` gives the HTTP status the transport layer
/// should answer with; `message()` gives the single human-readable message
/// carried to the client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Configuration errors
    #[snafu(display("Configuration error: {message}"))]
    Config { message: String },

    /// Storage errors
    #[snafu(display("Storage error: {message}"))]
    Storage { message: String },

    /// Authentication errors
    #[snafu(display("Authentication error: {message}"))]
    Auth { message: String },

    /// Authorization errors
    #[snafu(display("Authorization error: {message}"))]
    Authz { message: String },

    /// Validation errors
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },

    /// Resource not found
    #[snafu(display("Resource not found: {message}"))]
    NotFound { message: String },

    /// Resource already exists
    #[snafu(display("Resource already exists: {message}"))]
    AlreadyExists { message: String },

    /// External service errors
    #[snafu(display("External service error: {message}"))]
    External { message: String },

    /// Internal system errors
    #[snafu(display("Internal error: {message}"))]
    Internal { message: String },
}

impl Error {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ConfigSnafu { message: message.into() }.build()
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        StorageSnafu { message: message.into() }.build()
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        AuthSnafu { message: message.into() }.build()
    }

    /// Create an authorization error
    pub fn authz(message: impl Into<String>) -> Self {
        AuthzSnafu { message: message.into() }.build()
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ValidationSnafu { message: message.into() }.build()
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        NotFoundSnafu { message: message.into() }.build()
    }

    /// Create an already exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        AlreadyExistsSnafu { message: message.into() }.build()
    }

    /// Create an external service error
    pub fn external(message: impl Into<String>) -> Self {
        ExternalSnafu { message: message.into() }.build()
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        InternalSnafu { message: message.into() }.build()
    }

    // =========================================================================
    // Metadata accessors
    // =========================================================================

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 500,
            Error::Storage { .. } => 500,
            Error::Auth { .. } => 401,
            Error::Authz { .. } => 403,
            Error::Validation { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::AlreadyExists { .. } => 409,
            Error::External { .. } => 502,
            Error::Internal { .. } => 500,
        }
    }

    /// Get error code for client consumption
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "CONFIGURATION_ERROR",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::Auth { .. } => "AUTHENTICATION_ERROR",
            Error::Authz { .. } => "AUTHORIZATION_ERROR",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::AlreadyExists { .. } => "ALREADY_EXISTS",
            Error::External { .. } => "EXTERNAL_SERVICE_ERROR",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// The human-readable message carried to the client
    pub fn message(&self) -> &str {
        match self {
            Error::Config { message }
            | Error::Storage { message }
            | Error::Auth { message }
            | Error::Authz { message }
            | Error::Validation { message }
            | Error::NotFound { message }
            | Error::AlreadyExists { message }
            | Error::External { message }
            | Error::Internal { message } => message,
        }
    }
}
