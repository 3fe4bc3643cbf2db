use newsdesk_common::{interp, Doc};
use std::fmt;

/// Outcome of one backend request. Transport failures carry a status code of `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    status_code: u16,
    body: Option<String>,
    success: bool,
    error_message: Option<String>,
}

impl RequestResult {
    /// Wrap an HTTP response. Non-2xx responses surface the backend's `detail` string when
    /// there is one, otherwise `HTTP <status>`.
    pub fn from_response(status_code: u16, body: String) -> Self {
        let success = (200..300).contains(&status_code);
        let error_message = if success {
            None
        } else {
            Some(interp::detail(&body).unwrap_or_else(|| format!("HTTP {status_code}")))
        };
        Self {
            status_code,
            body: Some(body),
            success,
            error_message,
        }
    }

    /// A request that never produced a response (refused, timed out, unreadable).
    pub fn from_failure(message: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            body: None,
            success: false,
            error_message: Some(message.into()),
        }
    }

    /// Shorthand for a 200 response; mostly useful for canned transports.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::from_response(200, body.into())
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The error message for display, never empty.
    pub fn error(&self) -> &str {
        self.error_message.as_deref().unwrap_or("unknown error")
    }

    /// The body parsed for field extraction.
    pub fn doc(&self) -> Doc {
        Doc::parse(self.body.as_deref().unwrap_or_default())
    }
}

impl fmt::Display for RequestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status={}, success={}", self.status_code, self.success)?;
        if let Some(error) = &self.error_message {
            write!(f, ", error={error}")?;
        }
        Ok(())
    }
}
