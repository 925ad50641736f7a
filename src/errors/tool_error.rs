use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Connection,
    Denied,
    NotFound,
    Timeout,
    Io,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Connection, "CONNECTION", message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Denied, "DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Io, "IO", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn to_meta(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::io(err.to_string())
    }
}
