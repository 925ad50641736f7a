pub mod network {
    pub const SSH_DEFAULT_PORT: u16 = 2222;
    pub const TIMEOUT_SSH_CONNECT_MS: u64 = 15_000;
    pub const TIMEOUT_SSH_EXEC_DEFAULT_MS: u64 = 30_000;
    pub const EXEC_POLL_INTERVAL_MS: u64 = 20;
    pub const KEEPALIVE_INTERVAL_SECS: u32 = 30;
}

pub mod limits {
    pub const MAX_PORT: u16 = 65_535;
    pub const MIN_PORT: u16 = 1;
    pub const LOG_SUBSTRING_LENGTH: usize = 200;
    pub const READ_CHUNK_BYTES: usize = 8192;
    /// Site paths at or below this many characters never get `rm -rf`.
    pub const CLEAN_MIN_PATH_CHARS: usize = 5;
}

pub mod exec {
    pub const TIMEOUT_EXIT_STATUS: i32 = 124;
    pub const TIMEOUT_STDERR: &str = "Command timed out";
}

pub mod wp {
    pub const CLI_BINARY: &str = "wp";
    pub const INSTALL_MARKER: &str = "wp-config.php";
    pub const CONTENT_DIR: &str = "wp-content";
    pub const UP_TO_DATE_MARKER: &str = "Success";
    pub const SITE_TITLE: &str = "Dev Site";
    pub const ADMIN_USER: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "password123";
    pub const ADMIN_EMAIL: &str = "admin@example.com";
    pub const SITE_URL_PORT: u16 = 8080;
    pub const REMOTE_BACKUP_DIR: &str = "/tmp";
}

pub mod files {
    pub const LOG_DIR_NAME: &str = "logs";
    pub const REPORT_FILE: &str = "wp_report.md";
    pub const LOG_FILE_PREFIX: &str = "maintenance_";
    pub const BACKUP_FILE_PREFIX: &str = "wp_backup_";
}

pub mod report {
    pub const UNKNOWN: &str = "Unknown";
    pub const EMPTY_LIST: &str = "None";
    pub const STATUS_UP_TO_DATE: &str = "✅ Up to date";
    pub const STATUS_UPDATE_AVAILABLE: &str = "⚠️ Update Available";
}
