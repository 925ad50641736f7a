use crate::cli::Cli;
use crate::config::MaintenanceConfig;
use crate::errors::ToolError;
use crate::managers::maintenance::MaintenanceTool;
use crate::managers::remote::RemoteShell;
use crate::managers::ssh::SshSession;
use crate::services::logger::Logger;
use crate::services::report;
use crate::utils::fs_atomic::ensure_dir;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Disconnected,
    Connecting,
    Connected,
    Executing,
    Reporting,
}

impl RunState {
    fn as_str(self) -> &'static str {
        match self {
            RunState::Disconnected => "disconnected",
            RunState::Connecting => "connecting",
            RunState::Connected => "connected",
            RunState::Executing => "executing",
            RunState::Reporting => "reporting",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_path: PathBuf,
}

struct StateTracker<'a> {
    state: RunState,
    logger: &'a Logger,
}

impl<'a> StateTracker<'a> {
    fn new(logger: &'a Logger) -> Self {
        Self {
            state: RunState::Disconnected,
            logger,
        }
    }

    fn enter(&mut self, next: RunState) {
        self.logger.debug(
            "state",
            Some(&serde_json::json!({
                "from": self.state.as_str(),
                "to": next.as_str(),
            })),
        );
        self.state = next;
    }
}

/// One full maintenance run against an already-resolved config.
///
/// `connect` opens the session. Once it succeeds the session is closed on
/// every path out of this function, including fatal errors.
pub fn run<R, F>(
    config: &MaintenanceConfig,
    logger: &Logger,
    connect: F,
) -> Result<RunSummary, ToolError>
where
    R: RemoteShell,
    F: FnOnce(&MaintenanceConfig, &Logger) -> Result<R, ToolError>,
{
    let mut state = StateTracker::new(logger);
    state.enter(RunState::Connecting);
    let remote = connect(config, logger)?;
    let mut tool = MaintenanceTool::new(remote, config, logger);
    state.enter(RunState::Connected);

    let outcome = execute(&mut tool, config, logger, &mut state);

    tool.close();
    state.enter(RunState::Disconnected);
    outcome
}

fn execute<R: RemoteShell>(
    tool: &mut MaintenanceTool<R>,
    config: &MaintenanceConfig,
    logger: &Logger,
    state: &mut StateTracker<'_>,
) -> Result<RunSummary, ToolError> {
    tool.verify_cli().map_err(|err| ToolError {
        message: format!("Connection failed: {}", err.message),
        ..err
    })?;

    state.enter(RunState::Executing);
    let operations = config.operations;
    if operations.clean {
        tool.clean_environment()?;
    }
    if operations.setup {
        tool.setup_wordpress(&config.database, &config.site_url)?;
    }
    if operations.update {
        tool.update_site()?;
    }
    if operations.optimize {
        tool.optimize_database()?;
    }
    let report_data = tool.run_diagnostics()?;

    state.enter(RunState::Reporting);
    let report_path = config.report_path();
    let document = report::assemble(&report_data);
    report::write(&document, &report_path)?;
    logger.info(
        &format!("Report generated: {}", report_path.display()),
        None,
    );

    Ok(RunSummary { report_path })
}

/// Entry point used by the binary. Returns the process exit code.
pub fn run_cli(cli: Cli) -> i32 {
    let logger = Logger::new("wpmaint");
    let config = match MaintenanceConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            logger.error(&format!("Invalid arguments: {}", err), Some(&err.to_meta()));
            return 2;
        }
    };

    if let Err(err) = ensure_dir(&config.log_dir) {
        logger.error(
            &format!(
                "Cannot create log directory {}: {}",
                config.log_dir.display(),
                err
            ),
            None,
        );
        return 1;
    }
    if let Err(err) = logger.attach_file(&config.log_file_path()) {
        logger.warn(&err.message, None);
    }

    let result = run(&config, &logger, |config, logger| {
        SshSession::connect(&config.connection, logger)
    });
    match result {
        Ok(summary) => {
            logger.info(
                "Run finished",
                Some(&serde_json::json!({
                    "report": summary.report_path.display().to_string(),
                    "log": logger.stats(),
                })),
            );
            0
        }
        Err(err) => {
            logger.error(
                &format!("Execution failed: {}", err),
                Some(&err.to_meta()),
            );
            1
        }
    }
}
