use crate::config::{DatabaseSettings, MaintenanceConfig};
use crate::constants::{files, limits, report as report_constants, wp};
use crate::errors::ToolError;
use crate::managers::remote::{CommandResult, RemoteShell};
use crate::managers::wp_cli::WpCli;
use crate::services::logger::Logger;
use crate::services::report::{
    CoreUpdateStatus, HealthReport, PermissionReport, ReportData, StatusReport,
};
use crate::utils::redact::redact_text;
use crate::utils::text::output_lines;
use std::path::PathBuf;
use std::time::Duration;

const DISK_USAGE_COMMAND: &str = "df -h / --output=pcent | tail -1";
const MEM_USAGE_COMMAND: &str = r#"free -m | awk '/Mem:/ {print $3 "MB/" $2 "MB"}'"#;
const ACTIVE_PLUGINS: &str =
    "plugin list --status=active --fields=name,version --format=csv --skip-column-names";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    AlreadyInstalled,
    Installed,
    Failed { step: &'static str, stderr: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    Cleared,
    /// The site path was too short for the file purge to run.
    PathGuardRefused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Downloaded { local_path: PathBuf, bytes: u64 },
    ExportFailed { stderr: String },
    DownloadFailed { reason: String },
}

/// The maintenance catalog, run over one exclusively owned remote session.
pub struct MaintenanceTool<R: RemoteShell> {
    remote: R,
    cli: WpCli,
    host: String,
    exec_timeout: Duration,
    log_dir: PathBuf,
    secrets: Vec<String>,
    logger: Logger,
}

impl<R: RemoteShell> MaintenanceTool<R> {
    pub fn new(remote: R, config: &MaintenanceConfig, logger: &Logger) -> Self {
        Self {
            remote,
            cli: WpCli::new(config.site_path.clone()),
            host: config.connection.host.clone(),
            exec_timeout: config.exec_timeout,
            log_dir: config.log_dir.clone(),
            secrets: config.secrets(),
            logger: logger.child("wp"),
        }
    }

    fn describe(&self, text: &str) -> String {
        let secrets: Vec<&str> = self.secrets.iter().map(String::as_str).collect();
        redact_text(text, limits::LOG_SUBSTRING_LENGTH, &secrets)
    }

    pub fn run_command(&mut self, command: &str) -> Result<CommandResult, ToolError> {
        self.run_command_with_timeout(command, self.exec_timeout)
    }

    pub fn run_command_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ToolError> {
        self.remote.run(command, timeout)
    }

    fn wp(&mut self, subcommand: &str) -> Result<CommandResult, ToolError> {
        let command = self.cli.command(subcommand);
        self.run_command(&command)
    }

    /// Fails with `NOT_FOUND` when the remote host has no `wp` on PATH.
    pub fn verify_cli(&mut self) -> Result<(), ToolError> {
        let result = self.run_command(&WpCli::availability_check())?;
        if !result.success() {
            return Err(ToolError::not_found("WP-CLI not found on remote host.")
                .with_hint("Install wp-cli and make sure it is on the SSH user's PATH."));
        }
        self.logger.info("Connection established successfully.", None);
        Ok(())
    }

    pub fn setup_wordpress(
        &mut self,
        db: &DatabaseSettings,
        site_url: &str,
    ) -> Result<SetupOutcome, ToolError> {
        self.logger.info("Checking WordPress installation...", None);
        let marker = self.run_command(&self.cli.install_marker_check())?;
        if marker.success() {
            self.logger
                .warn("WordPress already configured. Skipping setup.", None);
            return Ok(SetupOutcome::AlreadyInstalled);
        }

        let mkdir = self.run_command(&self.cli.create_site_dir())?;
        if !mkdir.success() {
            self.logger.warn(
                &format!("Could not create {}: {}", self.cli.site_path(), mkdir.stderr),
                None,
            );
        }

        let steps: [(&'static str, String); 3] = [
            ("core download", "core download".to_string()),
            ("config create", WpCli::config_create(db)),
            ("core install", WpCli::core_install(site_url)),
        ];
        for (step, subcommand) in steps {
            self.logger
                .info(&format!("Running: wp {}", self.describe(&subcommand)), None);
            let result = self.wp(&subcommand)?;
            if !result.success() {
                self.logger.error(
                    &format!("Setup step failed: {}", self.describe(&result.stderr)),
                    Some(&serde_json::json!({
                        "step": step,
                        "exit_status": result.exit_status,
                    })),
                );
                return Ok(SetupOutcome::Failed {
                    step,
                    stderr: result.stderr,
                });
            }
        }
        self.logger.info("WordPress installed.", None);
        Ok(SetupOutcome::Installed)
    }

    /// Resets the database and deletes the site's files. The only safeguard
    /// on the purge is the length of the path string.
    pub fn clean_environment(&mut self) -> Result<CleanOutcome, ToolError> {
        self.logger.info("Cleaning remote environment...", None);
        let reset = self.wp("db reset --yes")?;
        if !reset.success() {
            self.logger
                .error(&format!("Database reset failed: {}", reset.stderr), None);
        }

        if self.cli.site_path().chars().count() <= limits::CLEAN_MIN_PATH_CHARS {
            self.logger.warn(
                &format!(
                    "Refusing to clear {}: path is too short.",
                    self.cli.site_path()
                ),
                None,
            );
            return Ok(CleanOutcome::PathGuardRefused);
        }
        let purge = self.run_command(&self.cli.remove_site_files())?;
        if !purge.success() {
            self.logger
                .error(&format!("File removal failed: {}", purge.stderr), None);
        }
        self.logger.info(
            &format!("Directory {} cleared.", self.cli.site_path()),
            None,
        );
        Ok(CleanOutcome::Cleared)
    }

    fn backup_paths(&self) -> (String, PathBuf) {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let token = &token[..8];
        let remote = format!(
            "{}/wp_bak_{}_{}.sql",
            wp::REMOTE_BACKUP_DIR,
            timestamp,
            token
        );
        let local = self.log_dir.join(format!(
            "{}{}_{}.sql",
            files::BACKUP_FILE_PREFIX,
            timestamp,
            token
        ));
        (remote, local)
    }

    /// Exports the database to a unique remote temp file, downloads it, and
    /// removes the remote file whatever happened before.
    pub fn backup_database(&mut self) -> Result<BackupOutcome, ToolError> {
        let (remote_path, local_path) = self.backup_paths();
        self.logger.info(
            &format!("Exporting database to local: {}...", local_path.display()),
            None,
        );

        let outcome = match self.wp(&WpCli::db_export(&remote_path)) {
            Ok(export) if export.success() => {
                Ok(match self.remote.download(&remote_path, &local_path) {
                    Ok(bytes) => {
                        self.logger.info(
                            "Backup successfully downloaded.",
                            Some(&serde_json::json!({ "bytes": bytes })),
                        );
                        BackupOutcome::Downloaded { local_path, bytes }
                    }
                    Err(err) => {
                        self.logger.error(
                            &format!("Backup process failed: {}", err),
                            Some(&err.to_meta()),
                        );
                        BackupOutcome::DownloadFailed {
                            reason: err.message,
                        }
                    }
                })
            }
            Ok(export) => {
                self.logger
                    .error(&format!("Export failed: {}", export.stderr), None);
                Ok(BackupOutcome::ExportFailed {
                    stderr: export.stderr,
                })
            }
            Err(err) => {
                self.logger
                    .error(&format!("Backup process failed: {}", err), None);
                Err(err)
            }
        };

        match self.run_command(&WpCli::remove_remote_file(&remote_path)) {
            Ok(cleanup) if !cleanup.success() => {
                self.logger.warn(
                    &format!("Could not remove {}: {}", remote_path, cleanup.stderr),
                    None,
                );
            }
            Ok(_) => {}
            Err(err) if outcome.is_ok() => return Err(err),
            Err(err) => {
                self.logger
                    .debug(&format!("Remote cleanup skipped: {}", err), None);
            }
        }
        outcome
    }

    /// Core first, then plugins; neither step gates the other.
    pub fn perform_updates(&mut self) -> Result<(), ToolError> {
        self.logger.info("Updating core and plugins...", None);
        for subcommand in ["core update", "plugin update --all"] {
            let result = self.wp(subcommand)?;
            if !result.success() {
                self.logger.error(
                    &format!("wp {} failed: {}", subcommand, result.stderr),
                    Some(&serde_json::json!({ "exit_status": result.exit_status })),
                );
            }
        }
        Ok(())
    }

    /// A backup always precedes the update.
    pub fn update_site(&mut self) -> Result<BackupOutcome, ToolError> {
        let backup = self.backup_database()?;
        self.perform_updates()?;
        Ok(backup)
    }

    pub fn optimize_database(&mut self) -> Result<bool, ToolError> {
        self.logger.info("Optimizing database...", None);
        let result = self.wp("db optimize")?;
        if !result.success() {
            self.logger
                .error(&format!("Optimize failed: {}", result.stderr), None);
        }
        Ok(result.success())
    }

    pub fn check_permissions(&mut self) -> Result<PermissionReport, ToolError> {
        let result = self.run_command(&self.cli.find_world_writable_dirs())?;
        let insecure_dirs = output_lines(&result.stdout);
        if !insecure_dirs.is_empty() {
            self.logger.warn(
                &format!("{} world-writable directories found", insecure_dirs.len()),
                None,
            );
        }
        Ok(PermissionReport { insecure_dirs })
    }

    pub fn check_server_health(&mut self) -> Result<HealthReport, ToolError> {
        let disk = self.run_command(DISK_USAGE_COMMAND)?;
        let mem = self.run_command(MEM_USAGE_COMMAND)?;
        let known = |result: CommandResult| {
            if result.success() {
                result.stdout
            } else {
                report_constants::UNKNOWN.to_string()
            }
        };
        Ok(HealthReport {
            disk_usage: known(disk),
            mem_usage: known(mem),
        })
    }

    pub fn check_wp_status(&mut self) -> Result<StatusReport, ToolError> {
        let core = self.wp("core check-update")?;
        let plugins = self.wp(ACTIVE_PLUGINS)?;
        Ok(StatusReport {
            core_update: CoreUpdateStatus::classify(&core.stdout),
            active_plugins: output_lines(&plugins.stdout),
        })
    }

    pub fn run_diagnostics(&mut self) -> Result<ReportData, ToolError> {
        let permissions = self.check_permissions()?;
        let health = self.check_server_health()?;
        let status = self.check_wp_status()?;
        Ok(ReportData::new(self.host.clone())
            .with_permissions(permissions)
            .with_health(health)
            .with_status(status))
    }

    pub fn close(&mut self) {
        self.remote.close();
    }
}
