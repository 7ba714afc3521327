//! Result-to-outcome adapter.
//!
//! Screens usually react to the origin of a failure rather than to the error
//! itself: a 401 has already redirected to login, a 4xx shows the server's
//! message inline, a 5xx or network failure shows a generic banner.
//! [`Outcome`] puts those branches in one `match`.
//!
//! ```ignore
//! use satchel::{IntoOutcome, Outcome};
//!
//! match api.get::<Vec<Invoice>>("/invoices/").await.into_outcome() {
//!     Outcome::Success(invoices) => render(invoices),
//!     Outcome::Unauthorized(_) => {}
//!     Outcome::Rejected(err) => show_inline(err.message()),
//!     Outcome::ServerError(_) | Outcome::Failed(_) => show_banner(),
//! }
//! ```

use crate::{Error, ErrorKind, Result};

/// A call result split by failure origin.
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    /// The call succeeded.
    Success(T),
    /// The API answered 401; the session has been cleared.
    Unauthorized(Error),
    /// The API rejected the request (4xx other than 401).
    Rejected(Error),
    /// The API failed (5xx).
    ServerError(Error),
    /// The request never completed, could not be built, its response could
    /// not be decoded, or the status was neither 2xx, 4xx nor 5xx.
    Failed(Error),
}

impl<T> Outcome<T> {
    /// `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success value, if any.
    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if the call failed.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Success(_) => None,
            Self::Unauthorized(err)
            | Self::Rejected(err)
            | Self::ServerError(err)
            | Self::Failed(err) => Some(err),
        }
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Unauthorized(err) => Outcome::Unauthorized(err),
            Self::Rejected(err) => Outcome::Rejected(err),
            Self::ServerError(err) => Outcome::ServerError(err),
            Self::Failed(err) => Outcome::Failed(err),
        }
    }

    /// Convert back into a [`Result`].
    ///
    /// # Errors
    ///
    /// Returns the carried error for every variant but [`Outcome::Success`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Unauthorized(err)
            | Self::Rejected(err)
            | Self::ServerError(err)
            | Self::Failed(err) => Err(err),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => match err.kind() {
                ErrorKind::Unauthorized => Self::Unauthorized(err),
                ErrorKind::Client => Self::Rejected(err),
                ErrorKind::Server => Self::ServerError(err),
                ErrorKind::UnexpectedStatus
                | ErrorKind::Transport
                | ErrorKind::Decode
                | ErrorKind::Invalid => Self::Failed(err),
            },
        }
    }
}

/// Extension trait turning a [`Result`] into an [`Outcome`].
pub trait IntoOutcome<T> {
    /// Split the result by failure origin.
    fn into_outcome(self) -> Outcome<T>;
}

impl<T> IntoOutcome<T> for Result<T> {
    fn into_outcome(self) -> Outcome<T> {
        Outcome::from(self)
    }
}
