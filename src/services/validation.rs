use crate::constants::limits::{MAX_PORT, MIN_PORT};
use crate::errors::ToolError;

#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: &str, label: &str, trim: bool) -> Result<String, ToolError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            value.to_string()
        })
    }

    pub fn ensure_port(&self, value: u16) -> Result<u16, ToolError> {
        if value < MIN_PORT {
            return Err(ToolError::invalid_params(format!(
                "Port must be an integer between {} and {}",
                MIN_PORT, MAX_PORT
            )));
        }
        Ok(value)
    }

    /// Absolute remote directory with trailing separators stripped.
    pub fn ensure_site_path(&self, value: &str) -> Result<String, ToolError> {
        let trimmed = self.ensure_string(value, "path", true)?;
        if !trimmed.starts_with('/') {
            return Err(ToolError::invalid_params("path must be an absolute remote path")
                .with_hint("Example: --path /var/www/html"));
        }
        let stripped = trimmed.trim_end_matches('/');
        if stripped.is_empty() {
            return Err(ToolError::invalid_params("path must not be the filesystem root"));
        }
        if stripped.contains('\0') {
            return Err(ToolError::invalid_params("path must not contain null bytes"));
        }
        Ok(stripped.to_string())
    }

    pub fn ensure_fingerprint(&self, value: &str) -> Result<String, ToolError> {
        let trimmed = value.trim().trim_end_matches('=');
        if trimmed.is_empty() {
            return Err(ToolError::invalid_params(
                "host key fingerprint must not be empty",
            ));
        }
        if trimmed.to_lowercase().starts_with("sha256:") {
            return Ok(format!("SHA256:{}", trimmed[7..].trim()));
        }
        Ok(format!("SHA256:{}", trimmed))
    }
}
