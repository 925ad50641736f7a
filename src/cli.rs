use crate::constants::network::SSH_DEFAULT_PORT;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "wpmaint", version, about = "Remote WordPress maintenance over SSH")]
pub struct Cli {
    #[arg(long, default_value = "testuser")]
    pub user: String,

    /// SSH password; ignored when --identity-file is given.
    #[arg(long, default_value = "password")]
    pub passw: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = SSH_DEFAULT_PORT)]
    pub port: u16,

    /// Remote WordPress root. Must be absolute and not `/`; trailing `/` is stripped.
    #[arg(long, default_value = "/var/www/html")]
    pub path: String,

    #[arg(long = "db_host", default_value = "db")]
    pub db_host: String,

    #[arg(long = "db_user", default_value = "wp_user")]
    pub db_user: String,

    #[arg(long = "db_pass", default_value = "wp_password")]
    pub db_pass: String,

    #[arg(long = "db_name", default_value = "wordpress")]
    pub db_name: String,

    /// Download, configure and install WordPress unless wp-config.php exists.
    #[arg(long)]
    pub setup: bool,

    /// Reset the database and delete every file under --path.
    #[arg(long)]
    pub clean: bool,

    /// Back up the database, then update core and all plugins.
    #[arg(long)]
    pub update: bool,

    #[arg(long)]
    pub optimize: bool,

    /// Private key for public-key authentication.
    #[arg(long = "identity-file")]
    pub identity_file: Option<PathBuf>,

    #[arg(long = "identity-passphrase")]
    pub identity_passphrase: Option<String>,

    /// Expected host key, e.g. SHA256:AbC...; connections to other keys fail.
    #[arg(long = "host-key-fingerprint")]
    pub host_key_fingerprint: Option<String>,

    /// URL passed to `wp core install` (default http://<host>:8080).
    #[arg(long = "site-url")]
    pub site_url: Option<String>,

    /// Where logs, backups and the report go (default: `logs` next to the binary).
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,

    /// Per-command timeout in milliseconds.
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}
