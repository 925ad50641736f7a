use crate::config::DatabaseSettings;
use crate::constants::wp;
use crate::utils::shell::{option, quote};

/// Builds WP-CLI and shell command lines scoped to one site directory.
///
/// Every value that reaches a command line goes through [`quote`] exactly
/// once. Nothing here touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WpCli {
    site_path: String,
}

impl WpCli {
    pub fn new(site_path: impl Into<String>) -> Self {
        Self {
            site_path: site_path.into(),
        }
    }

    pub fn site_path(&self) -> &str {
        &self.site_path
    }

    /// `wp <subcommand> --path=<site> --no-color`
    pub fn command(&self, subcommand: &str) -> String {
        format!(
            "{} {} --path={} --no-color",
            wp::CLI_BINARY,
            subcommand,
            quote(&self.site_path)
        )
    }

    pub fn availability_check() -> String {
        format!("which {}", wp::CLI_BINARY)
    }

    pub fn config_create(db: &DatabaseSettings) -> String {
        format!(
            "config create {} {} {} {}",
            option("dbname", &db.name),
            option("dbuser", &db.user),
            option("dbpass", &db.password),
            option("dbhost", &db.host),
        )
    }

    pub fn core_install(site_url: &str) -> String {
        format!(
            "core install {} {} {} {} {}",
            option("url", site_url),
            option("title", wp::SITE_TITLE),
            option("admin_user", wp::ADMIN_USER),
            option("admin_password", wp::ADMIN_PASSWORD),
            option("admin_email", wp::ADMIN_EMAIL),
        )
    }

    pub fn db_export(remote_path: &str) -> String {
        format!("db export {}", quote(remote_path))
    }

    pub fn install_marker_check(&self) -> String {
        format!("ls {}/{}", quote(&self.site_path), wp::INSTALL_MARKER)
    }

    pub fn create_site_dir(&self) -> String {
        format!("mkdir -p {}", quote(&self.site_path))
    }

    /// The glob stays outside the quotes so the shell expands it.
    pub fn remove_site_files(&self) -> String {
        format!("rm -rf {}/*", quote(&self.site_path))
    }

    pub fn find_world_writable_dirs(&self) -> String {
        format!(
            "find {}/{}/ -type d -perm 777",
            quote(&self.site_path),
            wp::CONTENT_DIR
        )
    }

    pub fn remove_remote_file(remote_path: &str) -> String {
        format!("rm -f {}", quote(remote_path))
    }
}
