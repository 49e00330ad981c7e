use std::fmt;


// =========================================================
// Error kinds
// =========================================================

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 401: credentials missing or expired
    Unauthorized,
    /// 403: credentials valid but refused
    Forbidden,
    /// any other non-2xx status; message comes from the response body
    Http,
    /// no response received
    Network,
    /// no response within the configured timeout
    Timeout,
    /// response arrived but its shape is not one we accept
    Decode,
    /// the request could not be built from the caller's input
    InvalidInput,
    /// the token store refused a write
    Storage,
}

impl ApiErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorKind::Unauthorized => "UNAUTHORIZED",
            ApiErrorKind::Forbidden => "FORBIDDEN",
            ApiErrorKind::Http => "HTTP_ERROR",
            ApiErrorKind::Network => "NETWORK_ERROR",
            ApiErrorKind::Timeout => "TIMEOUT",
            ApiErrorKind::Decode => "UNEXPECTED_RESPONSE",
            ApiErrorKind::InvalidInput => "INVALID_INPUT",
            ApiErrorKind::Storage => "STORAGE_ERROR",
        }
    }

    /// 401 and 403 both tear the session down.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiErrorKind::Unauthorized | ApiErrorKind::Forbidden)
    }

    /// Errors where the backend was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiErrorKind::Network | ApiErrorKind::Timeout)
    }
}

// =========================================================
// Error context
// =========================================================

/// One step of the operation trace, e.g. `session.login`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSpan {
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

/// Transport-level description of a non-2xx reply, kept as the error source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    pub status: u16,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request failed with status code {}", self.status)
    }
}

impl std::error::Error for StatusError {}

// =========================================================
// Core error type
// =========================================================

/// Normalized client error.
///
/// Carries the human-readable message shown in forms and banners, plus what
/// is needed for diagnostics: HTTP status, raw response body, the original
/// error and the operation trace.
#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
    body: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message).with_status(401)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message).with_status(403)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Http, message).with_status(status)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidInput, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Storage, message)
    }

    /// Maps a non-2xx status to the matching kind.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => Self::unauthorized(message),
            403 => Self::forbidden(message),
            _ => Self::http(status, message),
        }
    }

    // --- Builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    // --- Accessors ---

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// Message suitable for inline display next to a form or as a page banner.
    pub fn display_message(&self) -> &str {
        if self.message.is_empty() {
            "An unexpected error occurred"
        } else {
            &self.message
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::decode(e.to_string()).with_source(e)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_trace() {
        let err = ApiError::http(500, "Database unavailable")
            .in_op("api.list_users")
            .in_op_with("page", "users");
        assert_eq!(
            err.to_string(),
            "[HTTP_ERROR] Database unavailable | trace: api.list_users -> page(users)"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_from_status_classifies_auth() {
        assert_eq!(ApiError::from_status(401, "x").kind(), ApiErrorKind::Unauthorized);
        assert_eq!(ApiError::from_status(403, "x").kind(), ApiErrorKind::Forbidden);
        assert_eq!(ApiError::from_status(422, "x").kind(), ApiErrorKind::Http);
        assert!(ApiErrorKind::Forbidden.is_auth_rejection());
        assert!(!ApiErrorKind::Http.is_auth_rejection());
        assert!(ApiErrorKind::Timeout.is_transport());
    }

    #[test]
    fn test_source_is_kept() {
        let err = ApiError::http(502, "Bad gateway").with_source(StatusError { status: 502 });
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Request failed with status code 502");
    }

    #[test]
    fn test_display_message_never_empty() {
        assert_eq!(
            ApiError::network("").display_message(),
            "An unexpected error occurred"
        );
        assert_eq!(ApiError::network("offline").display_message(), "offline");
    }
}
