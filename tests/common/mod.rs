#![allow(dead_code)]

use clap::Parser;
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;
use wpmaint::cli::Cli;
use wpmaint::config::MaintenanceConfig;
use wpmaint::errors::ToolError;
use wpmaint::managers::remote::{CommandResult, RemoteShell};

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Run(String),
    Download { remote: String, local: PathBuf },
    Close,
}

/// In-memory session: answers commands from substring rules and records
/// every call in order.
pub struct ScriptedRemote {
    calls: Rc<RefCell<Vec<Call>>>,
    rules: Vec<(String, CommandResult)>,
    broken_on: Option<String>,
    download_error: Option<ToolError>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            rules: vec![("which wp".to_string(), CommandResult::new("/usr/local/bin/wp", "", 0))],
            broken_on: None,
            download_error: None,
        }
    }

    /// First matching rule wins; later calls to `on` take priority.
    pub fn on(mut self, pattern: &str, result: CommandResult) -> Self {
        self.rules.insert(0, (pattern.to_string(), result));
        self
    }

    pub fn drop_connection_on(mut self, pattern: &str) -> Self {
        self.broken_on = Some(pattern.to_string());
        self
    }

    pub fn fail_downloads(mut self, error: ToolError) -> Self {
        self.download_error = Some(error);
        self
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        self.calls.clone()
    }
}

impl RemoteShell for ScriptedRemote {
    fn run(&mut self, command: &str, _timeout: Duration) -> Result<CommandResult, ToolError> {
        self.calls.borrow_mut().push(Call::Run(command.to_string()));
        if let Some(pattern) = self.broken_on.as_ref() {
            if command.contains(pattern.as_str()) {
                return Err(ToolError::connection("SSH stdout read failed: connection reset"));
            }
        }
        Ok(self
            .rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| CommandResult::new("", "", 0)))
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, ToolError> {
        self.calls.borrow_mut().push(Call::Download {
            remote: remote_path.to_string(),
            local: local_path.to_path_buf(),
        });
        if let Some(err) = self.download_error.clone() {
            return Err(err);
        }
        let body = "-- MySQL dump\n";
        std::fs::create_dir_all(local_path.parent().expect("parent")).expect("mkdir");
        std::fs::write(local_path, body).expect("write backup");
        Ok(body.len() as u64)
    }

    fn close(&mut self) {
        self.calls.borrow_mut().push(Call::Close);
    }
}

pub fn tmp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}

pub fn config_with(log_dir: &Path, extra: &[&str]) -> MaintenanceConfig {
    let mut argv = vec![
        "wpmaint".to_string(),
        "--host".to_string(),
        "10.0.0.5".to_string(),
        "--log-dir".to_string(),
        log_dir.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    MaintenanceConfig::from_cli(&Cli::parse_from(argv)).expect("valid config")
}

pub fn commands(calls: &Rc<RefCell<Vec<Call>>>) -> Vec<String> {
    calls
        .borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Run(command) => Some(command.clone()),
            _ => None,
        })
        .collect()
}
