mod common;
use common::{commands, config_with, tmp_dir, Call, ScriptedRemote};

use wpmaint::app;
use wpmaint::errors::{ToolError, ToolErrorKind};
use wpmaint::managers::remote::CommandResult;
use wpmaint::services::logger::Logger;

const UP_TO_DATE: &str = "Success: WordPress is at the latest version.";

fn healthy_remote() -> ScriptedRemote {
    ScriptedRemote::new()
        .on("df -h", CommandResult::new("37%", "", 0))
        .on("free -m", CommandResult::new("640MB/1986MB", "", 0))
        .on("core check-update", CommandResult::new(UP_TO_DATE, "", 0))
        .on(
            "plugin list",
            CommandResult::new("akismet,5.3\nhello-dolly,1.7.2", "", 0),
        )
}

#[test]
fn update_only_runs_backup_then_updates_then_diagnostics() {
    let dir = tmp_dir("wpmaint-update");
    let config = config_with(&dir, &["--update"]);
    let remote = healthy_remote();
    let calls = remote.calls();

    let summary = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect("run");

    let recorded = calls.borrow().clone();
    assert_eq!(recorded.len(), 12, "unexpected call sequence: {:#?}", recorded);
    assert_eq!(recorded[0], Call::Run("which wp".to_string()));

    let Call::Run(export) = &recorded[1] else {
        panic!("expected export, got {:?}", recorded[1]);
    };
    assert!(export.starts_with("wp db export /tmp/wp_bak_"), "{}", export);
    assert!(export.ends_with(".sql --path=/var/www/html --no-color"), "{}", export);

    let Call::Download { remote, local } = &recorded[2] else {
        panic!("expected download, got {:?}", recorded[2]);
    };
    assert!(export.contains(remote.as_str()));
    assert!(local.starts_with(&dir));
    assert!(local
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("wp_backup_"));
    assert_eq!(recorded[3], Call::Run(format!("rm -f {}", remote)));

    assert_eq!(
        recorded[4..11].to_vec(),
        vec![
            Call::Run("wp core update --path=/var/www/html --no-color".to_string()),
            Call::Run("wp plugin update --all --path=/var/www/html --no-color".to_string()),
            Call::Run("find /var/www/html/wp-content/ -type d -perm 777".to_string()),
            Call::Run("df -h / --output=pcent | tail -1".to_string()),
            Call::Run(r#"free -m | awk '/Mem:/ {print $3 "MB/" $2 "MB"}'"#.to_string()),
            Call::Run("wp core check-update --path=/var/www/html --no-color".to_string()),
            Call::Run(
                "wp plugin list --status=active --fields=name,version --format=csv \
                 --skip-column-names --path=/var/www/html --no-color"
                    .to_string()
            ),
        ]
    );
    assert_eq!(recorded[11], Call::Close);

    let text = std::fs::read_to_string(&summary.report_path).expect("report written");
    assert!(text.starts_with("# WP Maintenance Report: 10.0.0.5\n"));
    assert!(text.contains("### 🖥️ Health: Disk 37% | Mem 640MB/1986MB"));
    assert!(text.contains("### 🛡️ Status: Core ✅ Up to date | 777 Dirs: 0"));
    assert!(text.contains("### 🔌 Active Plugins\nakismet,5.3\nhello-dolly,1.7.2\n"));
    assert!(text.contains("### 📂 World-Writable Directories\nNone\n"));
    assert!(std::fs::read_to_string(local).unwrap().contains("MySQL dump"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn no_flags_runs_only_diagnostics_and_report() {
    let dir = tmp_dir("wpmaint-diag");
    let config = config_with(&dir, &[]);
    let remote = healthy_remote().on(
        "core check-update",
        CommandResult::new(
            "version,update_type,package_url\n6.5.3,minor,https://downloads.wordpress.org/x.zip",
            "",
            0,
        ),
    );
    let calls = remote.calls();

    let summary = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect("run");

    let sent = commands(&calls);
    assert_eq!(sent.len(), 6, "{:#?}", sent);
    assert_eq!(sent[0], "which wp");
    assert!(sent[1].starts_with("find "));
    assert!(sent[2].starts_with("df "));
    assert!(sent[3].starts_with("free "));
    assert!(sent[4].starts_with("wp core check-update"));
    assert!(sent[5].starts_with("wp plugin list"));
    assert_eq!(calls.borrow().last(), Some(&Call::Close));

    let text = std::fs::read_to_string(&summary.report_path).expect("report written");
    assert!(text.contains("Status: Core ⚠️ Update Available | 777 Dirs: 0"));
    assert_eq!(
        summary.report_path.file_name().unwrap().to_string_lossy(),
        "wp_report.md"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn all_flags_run_in_fixed_order() {
    let dir = tmp_dir("wpmaint-all");
    let config = config_with(&dir, &["--optimize", "--update", "--setup", "--clean"]);
    let remote = healthy_remote().on("ls /var/www/html/wp-config.php", CommandResult::new("", "No such file", 2));
    let calls = remote.calls();

    app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect("run");

    let sent = commands(&calls);
    let position = |needle: &str| {
        sent.iter()
            .position(|cmd| cmd.contains(needle))
            .unwrap_or_else(|| panic!("{} not sent: {:#?}", needle, sent))
    };
    assert!(position("db reset --yes") < position("ls /var/www/html/wp-config.php"));
    assert!(position("core install") < position("db export"));
    assert!(position("db export") < position("core update"));
    assert!(position("plugin update --all") < position("db optimize"));
    assert!(position("db optimize") < position("find /var/www/html"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn connection_failure_is_fatal_before_any_command() {
    let dir = tmp_dir("wpmaint-noconn");
    let config = config_with(&dir, &["--update"]);

    let err = app::run::<common::ScriptedRemote, _>(&config, &Logger::quiet("test"), |_, _| {
        Err(ToolError::connection("Connection failed: 10.0.0.5:2222: Connection refused"))
    })
    .expect_err("must fail");

    assert_eq!(err.kind, ToolErrorKind::Connection);
    assert!(!dir.join("wp_report.md").exists());
}

#[test]
fn missing_wp_cli_is_fatal_and_still_closes_session() {
    let dir = tmp_dir("wpmaint-nowp");
    let config = config_with(&dir, &[]);
    let remote = ScriptedRemote::new().on("which wp", CommandResult::new("", "", 1));
    let calls = remote.calls();

    let err = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect_err("must fail");

    assert_eq!(err.kind, ToolErrorKind::NotFound);
    assert_eq!(err.message, "Connection failed: WP-CLI not found on remote host.");
    assert_eq!(
        calls.borrow().clone(),
        vec![Call::Run("which wp".to_string()), Call::Close]
    );
    assert!(!dir.join("wp_report.md").exists());
}

#[test]
fn dropped_connection_mid_run_aborts_after_closing() {
    let dir = tmp_dir("wpmaint-drop");
    let config = config_with(&dir, &["--update"]);
    let remote = healthy_remote().drop_connection_on("core update");
    let calls = remote.calls();

    let err = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect_err("must fail");

    assert_eq!(err.kind, ToolErrorKind::Connection);
    let sent = commands(&calls);
    assert!(!sent.iter().any(|cmd| cmd.contains("plugin update")));
    assert!(!sent.iter().any(|cmd| cmd.starts_with("find ")));
    assert_eq!(calls.borrow().last(), Some(&Call::Close));
    assert_eq!(
        calls.borrow().iter().filter(|call| **call == Call::Close).count(),
        1
    );
    assert!(!dir.join("wp_report.md").exists());
}

#[test]
fn timed_out_diagnostics_still_produce_a_report() {
    let dir = tmp_dir("wpmaint-timeout");
    let config = config_with(&dir, &[]);
    let remote = healthy_remote()
        .on("df -h", CommandResult::timed_out())
        .on("core check-update", CommandResult::timed_out())
        .on("plugin list", CommandResult::timed_out());

    let summary = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect("run");

    let text = std::fs::read_to_string(&summary.report_path).expect("report");
    assert!(text.contains("Health: Disk Unknown | Mem 640MB/1986MB"));
    assert!(text.contains("Core ⚠️ Update Available"));
    assert!(text.contains("### 🔌 Active Plugins\nNone\n"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn report_write_failure_ends_the_run_after_closing() {
    let dir = tmp_dir("wpmaint-blocked");
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("not-a-dir");
    std::fs::write(&blocker, "plain file").unwrap();
    let config = config_with(&blocker, &[]);
    let remote = healthy_remote();
    let calls = remote.calls();

    let err = app::run(&config, &Logger::quiet("test"), |_, _| Ok(remote)).expect_err("must fail");

    assert_eq!(err.kind, ToolErrorKind::Io);
    assert_eq!(calls.borrow().last(), Some(&Call::Close));
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "plain file");

    let _ = std::fs::remove_dir_all(&dir);
}
