//! Session error types

use thiserror::Error;

use crate::ports::TransportError;

/// Fallback message for login failures that carry nothing better.
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";

/// Errors produced by session operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Username or password missing; raised before any network call.
    #[error("Username and password are required")]
    CredentialsRequired,

    /// The server answered 401 on a protected call.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// A login or refresh response carried no `Bearer` header.
    #[error("Response did not include a bearer token")]
    MissingBearerHeader,

    /// The server answered with a non-success status.
    #[error("Request rejected with status {status}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Message extracted from the response body, if any.
        message: Option<String>,
    },

    /// A success response had a body that could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CredentialsRequired => "credentials-required",
            Self::NotAuthenticated => "not-authenticated",
            Self::MissingBearerHeader => "missing-bearer",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse(_) => "invalid-response",
            Self::Transport(_) => "transport",
        }
    }

    /// Message shown on the login view.
    ///
    /// Prefers the server's own message, then the transport error, then a
    /// generic text.
    #[must_use]
    pub fn login_failure_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Transport(error) => error.to_string(),
            Self::CredentialsRequired | Self::NotAuthenticated => self.to_string(),
            Self::Rejected { message: None, .. }
            | Self::MissingBearerHeader
            | Self::InvalidResponse(_) => GENERIC_LOGIN_FAILURE.to_string(),
        }
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
