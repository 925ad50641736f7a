pub mod maintenance;
pub mod remote;
pub mod sftp;
pub mod ssh;
pub mod wp_cli;
