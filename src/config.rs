use crate::cli::Cli;
use crate::constants::{files, network as network_constants, wp};
use crate::errors::ToolError;
use crate::managers::ssh::{SshAuth, SshConnection};
use crate::services::validation::Validation;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
}

/// Which conditional operations run. Diagnostics always run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operations {
    pub clean: bool,
    pub setup: bool,
    pub update: bool,
    pub optimize: bool,
}

#[derive(Clone, Debug)]
pub struct MaintenanceConfig {
    pub connection: SshConnection,
    pub site_path: String,
    pub site_url: String,
    pub database: DatabaseSettings,
    pub operations: Operations,
    pub exec_timeout: Duration,
    pub log_dir: PathBuf,
}

impl MaintenanceConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ToolError> {
        let validation = Validation::new();
        let host = validation.ensure_string(&cli.host, "host", true)?;
        let username = validation.ensure_string(&cli.user, "user", true)?;
        let port = validation.ensure_port(cli.port)?;
        let site_path = validation.ensure_site_path(&cli.path)?;
        let host_key_fingerprint = cli
            .host_key_fingerprint
            .as_deref()
            .map(|value| validation.ensure_fingerprint(value))
            .transpose()?;

        let auth = match cli.identity_file.as_ref() {
            Some(path) => SshAuth::KeyFile {
                path: path.clone(),
                passphrase: cli.identity_passphrase.clone(),
            },
            None => SshAuth::Password(cli.passw.clone()),
        };

        let site_url = match cli.site_url.as_deref() {
            Some(url) => validation.ensure_string(url, "site-url", true)?,
            None => format!("http://{}:{}", host, wp::SITE_URL_PORT),
        };

        let exec_timeout_ms = match cli.timeout_ms {
            Some(0) => return Err(ToolError::invalid_params("timeout-ms must be positive")),
            Some(value) => value,
            None => resolve_exec_default_timeout_ms(),
        };

        Ok(Self {
            connection: SshConnection {
                host,
                port,
                username,
                auth,
                connect_timeout_ms: resolve_connect_timeout_ms(),
                host_key_fingerprint,
            },
            site_path,
            site_url,
            database: DatabaseSettings {
                name: cli.db_name.clone(),
                user: cli.db_user.clone(),
                password: cli.db_pass.clone(),
                host: cli.db_host.clone(),
            },
            operations: Operations {
                clean: cli.clean,
                setup: cli.setup,
                update: cli.update,
                optimize: cli.optimize,
            },
            exec_timeout: Duration::from_millis(exec_timeout_ms),
            log_dir: resolve_log_dir(cli.log_dir.clone()),
        })
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(format!(
            "{}{}.log",
            files::LOG_FILE_PREFIX,
            chrono::Local::now().format("%Y%m%d")
        ))
    }

    pub fn report_path(&self) -> PathBuf {
        self.log_dir.join(files::REPORT_FILE)
    }

    /// Values that must never appear verbatim in logs.
    pub fn secrets(&self) -> Vec<String> {
        let mut out = vec![self.database.password.clone()];
        match &self.connection.auth {
            SshAuth::Password(password) => out.push(password.clone()),
            SshAuth::KeyFile { passphrase, .. } => out.extend(passphrase.iter().cloned()),
        }
        out
    }
}

fn read_env_ms(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

pub fn resolve_exec_default_timeout_ms() -> u64 {
    read_env_ms("WPMAINT_SSH_EXEC_TIMEOUT_MS")
        .unwrap_or(network_constants::TIMEOUT_SSH_EXEC_DEFAULT_MS)
}

pub fn resolve_connect_timeout_ms() -> u64 {
    read_env_ms("WPMAINT_SSH_CONNECT_TIMEOUT_MS")
        .unwrap_or(network_constants::TIMEOUT_SSH_CONNECT_MS)
}

/// `--log-dir`, then `WPMAINT_LOG_DIR`, then `logs/` beside the executable.
pub fn resolve_log_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Ok(dir) = std::env::var("WPMAINT_LOG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|parent| parent.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(files::LOG_DIR_NAME)
}
