//! Error types for gcal-mcp

use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for calendar operations
pub type Result<T> = std::result::Result<T, CalendarError>;

/// The remote call that produced a [`CalendarError::Remote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    FetchEvent,
    PatchEvent,
    InsertEvent,
    DeleteEvent,
    ListEvents,
    GetCalendar,
    ListCalendars,
    QueryFreeBusy,
    GetColors,
    /// Patch that installs the UNTIL bound on the original series during a split
    TruncateSeries,
    /// Insert of the continuation series during a split
    InsertContinuation,
    TokenExchange,
    TokenRefresh,
}

impl RemoteOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchEvent => "fetch",
            Self::PatchEvent => "patch",
            Self::InsertEvent => "insert",
            Self::DeleteEvent => "delete",
            Self::ListEvents => "list-events",
            Self::GetCalendar => "get-calendar",
            Self::ListCalendars => "list-calendars",
            Self::QueryFreeBusy => "freebusy",
            Self::GetColors => "colors",
            Self::TruncateSeries => "truncate-patch",
            Self::InsertContinuation => "insert-continuation",
            Self::TokenExchange => "token-exchange",
            Self::TokenRefresh => "token-refresh",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure classes reported to tool callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotRecurring,
    RemoteFailure,
    Auth,
    Internal,
}

/// Main error type for gcal-mcp
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Event is not recurring: {0}")]
    NotRecurring(String),

    #[error("Calendar API {operation} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Remote {
        operation: RemoteOperation,
        status: Option<u16>,
        message: String,
    },

    /// The original series was truncated but its continuation was not created.
    #[error("Series {series_id} was truncated but the continuation series could not be created: {source}")]
    PartialSplit {
        series_id: String,
        truncated_recurrence: Vec<String>,
        #[source]
        source: Box<CalendarError>,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Known failure categories and the hint prepended to matching messages
const HINTS: &[(&str, &str)] = &[
    ("not found", "The requested resource was not found"),
    (
        "unauthorized",
        "Authentication failed; re-authorization may be required",
    ),
    ("forbidden", "Access to this resource is not permitted"),
    ("invalid", "The request parameters were rejected"),
    ("quota", "API quota exhausted; wait before retrying"),
    ("rate limit", "Request rate limit reached; wait before retrying"),
];

impl CalendarError {
    /// Build a remote failure for `operation`
    pub fn remote(operation: RemoteOperation, status: Option<u16>, message: impl Into<String>) -> Self {
        CalendarError::Remote {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Re-tag a remote failure with the step that produced it.
    ///
    /// Other variants pass through untouched.
    pub fn during(self, step: RemoteOperation) -> Self {
        match self {
            CalendarError::Remote {
                status, message, ..
            } => CalendarError::Remote {
                operation: step,
                status,
                message,
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CalendarError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CalendarError::NotRecurring(_) => ErrorKind::NotRecurring,
            CalendarError::Remote { .. }
            | CalendarError::PartialSplit { .. }
            | CalendarError::Http(_) => ErrorKind::RemoteFailure,
            CalendarError::Auth(_) => ErrorKind::Auth,
            CalendarError::Config(_) | CalendarError::Serialization(_) | CalendarError::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The remote step that failed, if any
    pub fn operation(&self) -> Option<RemoteOperation> {
        match self {
            CalendarError::Remote { operation, .. } => Some(*operation),
            CalendarError::PartialSplit { source, .. } => source.operation(),
            _ => None,
        }
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self.kind() {
            ErrorKind::InvalidArgument => -32602,
            ErrorKind::NotRecurring => -32007,
            ErrorKind::Auth => -32003,
            ErrorKind::RemoteFailure => -32010,
            ErrorKind::Internal => -32000,
        }
    }

    /// Human-readable hint for remote failures, matched on the message text
    pub fn hint(&self) -> Option<&'static str> {
        if self.kind() != ErrorKind::RemoteFailure {
            return None;
        }
        let lower = self.to_string().to_lowercase();
        HINTS
            .iter()
            .find(|(pattern, _)| lower.contains(pattern))
            .map(|(_, hint)| *hint)
    }

    /// Structured state a caller needs to reconcile by hand, beyond the message
    pub fn details(&self) -> Option<Value> {
        match self {
            CalendarError::PartialSplit {
                series_id,
                truncated_recurrence,
                source,
            } => Some(json!({
                "code": self.code(),
                "seriesId": series_id,
                "truncated": true,
                "truncatedRecurrence": truncated_recurrence,
                "failedStep": source.operation().map(RemoteOperation::as_str),
                "cause": source.to_string(),
            })),
            _ => None,
        }
    }

    /// Message shown to tool callers: the error text, prefixed by its hint
    pub fn user_message(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{hint}: {self}"),
            None => self.to_string(),
        }
    }
}
