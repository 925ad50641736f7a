use crate::constants::{report, wp};
use crate::errors::ToolError;
use crate::utils::fs_atomic::atomic_write_text_file;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionReport {
    pub insecure_dirs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub disk_usage: String,
    pub mem_usage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreUpdateStatus {
    UpToDate,
    UpdateAvailable,
}

impl CoreUpdateStatus {
    /// `wp core check-update` prints "Success: WordPress is at the latest
    /// version." when nothing is pending. Any output that does not contain
    /// the marker, including a timeout or an error, counts as an update.
    pub fn classify(check_update_stdout: &str) -> Self {
        if check_update_stdout.contains(wp::UP_TO_DATE_MARKER) {
            CoreUpdateStatus::UpToDate
        } else {
            CoreUpdateStatus::UpdateAvailable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CoreUpdateStatus::UpToDate => report::STATUS_UP_TO_DATE,
            CoreUpdateStatus::UpdateAvailable => report::STATUS_UPDATE_AVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub core_update: CoreUpdateStatus,
    pub active_plugins: Vec<String>,
}

/// Everything the diagnostics produced in one run. Absent parts render as
/// placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportData {
    pub host: String,
    pub permissions: Option<PermissionReport>,
    pub health: Option<HealthReport>,
    pub status: Option<StatusReport>,
}

impl ReportData {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionReport) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_health(mut self, health: HealthReport) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_status(mut self, status: StatusReport) -> Self {
        self.status = Some(status);
        self
    }
}

fn render_list(items: &[String]) -> String {
    let lines: Vec<&str> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    if lines.is_empty() {
        return report::EMPTY_LIST.to_string();
    }
    lines.join("\n")
}

pub fn assemble(data: &ReportData) -> String {
    let (disk, mem) = data
        .health
        .as_ref()
        .map(|health| (health.disk_usage.as_str(), health.mem_usage.as_str()))
        .unwrap_or((report::UNKNOWN, report::UNKNOWN));
    let core = data
        .status
        .as_ref()
        .map(|status| status.core_update.label())
        .unwrap_or(report::UNKNOWN);
    let insecure: &[String] = data
        .permissions
        .as_ref()
        .map(|permissions| permissions.insecure_dirs.as_slice())
        .unwrap_or(&[]);
    let plugins: &[String] = data
        .status
        .as_ref()
        .map(|status| status.active_plugins.as_slice())
        .unwrap_or(&[]);

    format!(
        "# WP Maintenance Report: {host}\n\n\
         ### 🖥️ Health: Disk {disk} | Mem {mem}\n\
         ### 🛡️ Status: Core {core} | 777 Dirs: {count}\n\n\
         ### 🔌 Active Plugins\n{plugins}\n\n\
         ### 📂 World-Writable Directories\n{dirs}\n",
        host = data.host,
        disk = disk,
        mem = mem,
        core = core,
        count = insecure.len(),
        plugins = render_list(plugins),
        dirs = render_list(insecure),
    )
}

/// Replaces any previous report at `path`.
pub fn write(document: &str, path: &Path) -> Result<(), ToolError> {
    atomic_write_text_file(path, document).map_err(|err| {
        ToolError::io(format!(
            "Failed to write report {}: {}",
            path.display(),
            err
        ))
    })
}
