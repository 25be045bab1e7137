use thiserror::Error;

/// What went wrong on the wire, before any meaning is attached to it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiFailure {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("{0} is not available on this backend")]
    Unsupported(&'static str),
    #[error("'{0}' cannot be used as a username in a url")]
    InvalidUsername(String),
}

impl ApiFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn is_client_rejection(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

/// Outcome taxonomy surfaced to the UI. Every variant has exactly one
/// human-readable status line, see [`AuthError::status_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account already exists")]
    AccountConflict,
    #[error("old password rejected")]
    InvalidOldPassword,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("server error (status {status})")]
    Server { status: u16 },
}

impl AuthError {
    /// Maps a failure of an operation whose 4xx answers all mean `rejection`.
    pub fn rejected_as(failure: ApiFailure, rejection: AuthError) -> Self {
        if failure.is_client_rejection() {
            rejection
        } else {
            failure.into()
        }
    }

    pub fn status_message(&self) -> String {
        match self {
            Self::Connection(_) => {
                "Unable to connect to the server. Please try again later.".to_string()
            }
            Self::InvalidCredentials => "Invalid username or password.".to_string(),
            Self::AccountConflict => {
                "Could not create the account. That username may already be taken.".to_string()
            }
            Self::InvalidOldPassword => "Your current password is incorrect.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::NotAuthenticated => "Please sign in first.".to_string(),
            Self::NotFound(what) => format!("{what} not found."),
            Self::Unsupported(operation) => {
                format!("This server does not support {operation}.")
            }
            Self::UnexpectedResponse(_) => "The server sent an unexpected response.".to_string(),
            Self::Server { status } => {
                format!("The server could not complete the request (status {status}).")
            }
        }
    }
}

impl From<ApiFailure> for AuthError {
    fn from(value: ApiFailure) -> Self {
        match value {
            ApiFailure::Transport(message) => Self::Connection(message),
            ApiFailure::Status { status: 404, .. } => Self::NotFound("Record".to_string()),
            ApiFailure::Status { status: 401, .. } | ApiFailure::Status { status: 403, .. } => {
                Self::NotAuthenticated
            }
            ApiFailure::Status { status: 409, .. } => Self::AccountConflict,
            ApiFailure::Status {
                status,
                detail: Some(detail),
            } if (400..500).contains(&status) => Self::Validation(detail),
            ApiFailure::Status { status, .. } => Self::Server { status },
            ApiFailure::Decode(message) => Self::UnexpectedResponse(message),
            ApiFailure::Unsupported(operation) => Self::Unsupported(operation),
            ApiFailure::InvalidUsername(username) => {
                Self::Validation(format!("'{username}' is not a valid username."))
            }
        }
    }
}
