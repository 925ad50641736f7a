/// Quotes a value for a POSIX shell.
///
/// Strings made only of `[A-Za-z0-9_@%+=:,./-]` pass through unchanged;
/// anything else is wrapped in single quotes with embedded `'` written as
/// `'\''`. The empty string becomes `''`.
pub fn quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Joins a long option and a quoted value: `--name=<value>`.
pub fn option(name: &str, value: &str) -> String {
    format!("--{}={}", name, quote(value))
}
