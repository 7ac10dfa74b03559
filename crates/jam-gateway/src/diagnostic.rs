//! Classification of remote error payloads.
//!
//! The store returns errors as `{code, message, details, hint}` JSON bodies
//! where `code` is a SQLSTATE. The schema-negotiating writer reacts to the
//! classified variants; anything it does not recognize is fatal for the
//! candidate being tried.
//!
//! Classification prefers the SQLSTATE code and falls back to an ordered set
//! of message-substring matchers, since some proxies strip the code field.

use serde::Deserialize;
use std::fmt;

const SQLSTATE_UNDEFINED_COLUMN: &str = "42703";
const SQLSTATE_NOT_NULL_VIOLATION: &str = "23502";
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
const SQLSTATE_INSUFFICIENT_PRIVILEGE: &str = "42501";

/// A classified remote diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The relation rejected a column present in the payload.
    UnknownColumn(String),
    /// A NOT NULL column was missing from the payload.
    NotNullViolation(String),
    /// A unique constraint collided; carries the conflicting column.
    UniqueConflict(String),
    /// The payload referenced a row that does not exist.
    ForeignKeyViolation(String),
    /// The configured role cannot reach the schema at all.
    PermissionDenied { message: String },
    /// Anything else, kept raw for the caller.
    Other {
        code: Option<String>,
        message: String,
    },
}

#[derive(Deserialize)]
struct ApiBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    #[allow(dead_code)]
    hint: Option<String>,
}

impl Diagnostic {
    /// Classify a raw response body.
    ///
    /// Accepts both the JSON error shape and bare text (some proxies return
    /// plain strings on 5xx).
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let parsed: Option<ApiBody> = serde_json::from_str(body).ok();
        let (code, message, details) = match parsed {
            Some(b) => (b.code, b.message.unwrap_or_else(|| body.to_string()), b.details),
            None => (None, body.to_string(), None),
        };
        Self::classify(code.as_deref(), &message, details.as_deref())
    }

    fn classify(code: Option<&str>, message: &str, details: Option<&str>) -> Self {
        // Code first, then message substrings, in writer precedence order.
        if code == Some(SQLSTATE_UNDEFINED_COLUMN)
            || (message.contains("column") && message.contains("does not exist"))
        {
            if let Some(column) = first_quoted(message) {
                return Self::UnknownColumn(column);
            }
        }
        if code == Some(SQLSTATE_NOT_NULL_VIOLATION)
            || message.contains("violates not-null constraint")
            || message.contains("null value in column")
        {
            if let Some(column) = first_quoted(message) {
                return Self::NotNullViolation(column);
            }
        }
        if code == Some(SQLSTATE_UNIQUE_VIOLATION) || message.contains("duplicate key value") {
            if let Some(column) = details.and_then(key_column).or_else(|| first_quoted(message)) {
                return Self::UniqueConflict(column);
            }
        }
        if code == Some(SQLSTATE_FOREIGN_KEY_VIOLATION)
            || message.contains("violates foreign key constraint")
        {
            if let Some(column) = details.and_then(key_column) {
                return Self::ForeignKeyViolation(column);
            }
        }
        if code == Some(SQLSTATE_INSUFFICIENT_PRIVILEGE)
            || message.contains("permission denied for schema")
        {
            return Self::PermissionDenied {
                message: message.to_string(),
            };
        }
        Self::Other {
            code: code.map(String::from),
            message: message.to_string(),
        }
    }

    /// The human-readable message for logging and error display.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::UnknownColumn(column) => format!("unknown column \"{column}\""),
            Self::NotNullViolation(column) => format!("not-null violation on \"{column}\""),
            Self::UniqueConflict(column) => format!("unique conflict on \"{column}\""),
            Self::ForeignKeyViolation(column) => format!("foreign key violation on \"{column}\""),
            Self::PermissionDenied { message } | Self::Other { message, .. } => message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Extract the first double-quoted identifier from a message, e.g.
/// `column "team_id" of relation "projects" does not exist` → `team_id`.
fn first_quoted(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    let ident = &message[start..start + len];
    if ident.is_empty() {
        None
    } else {
        Some(ident.to_string())
    }
}

/// Extract the column from a constraint detail, e.g.
/// `Key (team_id)=(team-1) already exists.` → `team_id`.
fn key_column(details: &str) -> Option<String> {
    let start = details.find("Key (")? + "Key (".len();
    let len = details[start..].find(')')?;
    let ident = &details[start..start + len];
    if ident.is_empty() {
        None
    } else {
        Some(ident.to_string())
    }
}
