use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;

const INLINE_REDACTION: &str = "***REDACTED***";

static SECRET_OPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(--(?:dbpass|admin_password|password|passw)=)('(?:[^']|'\\'')*'|[^\s]+)"#)
        .expect("secret option regex")
});

/// Masks password-bearing options in a command line before it is logged.
pub fn redact_command(command: &str) -> String {
    SECRET_OPTION_RE
        .replace_all(command, format!("${{1}}{}", INLINE_REDACTION).as_str())
        .to_string()
}

/// Masks known secret values in free text, such as stderr echoing a password.
pub fn redact_text(value: &str, max_bytes: usize, secrets: &[&str]) -> String {
    let mut out = redact_command(value);
    for secret in secrets {
        let needle = secret.trim();
        if needle.len() < 4 {
            continue;
        }
        out = out.replace(needle, INLINE_REDACTION);
    }
    if max_bytes == usize::MAX {
        return out;
    }
    truncate_utf8_prefix(&out, max_bytes)
}
