pub mod fs_atomic;
pub mod redact;
pub mod shell;
pub mod text;
