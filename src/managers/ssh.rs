use crate::constants::limits::{LOG_SUBSTRING_LENGTH, READ_CHUNK_BYTES};
use crate::constants::network as network_constants;
use crate::errors::{ToolError, ToolErrorKind};
use crate::managers::remote::{CommandResult, RemoteShell};
use crate::managers::sftp;
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use base64::Engine;
use ssh2::{Channel, ErrorCode, Session};
use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;
const LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED: i32 = -19;
const LIBSSH2_ERROR_EAGAIN: i32 = -37;

#[derive(Clone, Debug)]
pub enum SshAuth {
    Password(String),
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct SshConnection {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SshAuth,
    pub connect_timeout_ms: u64,
    pub host_key_fingerprint: Option<String>,
}

impl SshConnection {
    fn secrets(&self) -> Vec<&str> {
        match &self.auth {
            SshAuth::Password(password) => vec![password.as_str()],
            SshAuth::KeyFile { passphrase, .. } => passphrase.iter().map(String::as_str).collect(),
        }
    }
}

/// An authenticated SSH session. Existing at all means the handshake and
/// authentication succeeded.
pub struct SshSession {
    session: Option<Session>,
    logger: Logger,
    secrets: Vec<String>,
}

impl SshSession {
    pub fn connect(connection: &SshConnection, logger: &Logger) -> Result<Self, ToolError> {
        let logger = logger.child("ssh");
        logger.info(
            &format!("Connecting to {}:{}...", connection.host, connection.port),
            None,
        );
        let (session, observed) = connect_session(connection)?;
        logger.debug(
            "SSH handshake complete",
            Some(&serde_json::json!({
                "host_key_sha256": observed,
                "user": connection.username,
            })),
        );
        Ok(Self {
            session: Some(session),
            logger,
            secrets: connection.secrets().into_iter().map(str::to_string).collect(),
        })
    }

    fn session(&self) -> Result<&Session, ToolError> {
        self.session
            .as_ref()
            .ok_or_else(|| ToolError::connection("SSH session is closed"))
    }

    fn describe(&self, command: &str) -> String {
        let secrets: Vec<&str> = self.secrets.iter().map(String::as_str).collect();
        redact_text(command, LOG_SUBSTRING_LENGTH, &secrets)
    }
}

impl RemoteShell for SshSession {
    fn run(&mut self, command: &str, timeout: Duration) -> Result<CommandResult, ToolError> {
        self.logger.debug(
            "exec",
            Some(&serde_json::json!({
                "command": self.describe(command),
                "timeout_ms": timeout.as_millis() as u64,
            })),
        );
        let session = self.session()?;
        let result = classify_exec(exec_blocking(session, command, timeout))?;
        if result.is_timeout() {
            self.logger
                .error(&format!("Command timed out: {}", self.describe(command)), None);
        }
        Ok(result)
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, ToolError> {
        let session = self.session()?;
        sftp::download(session, remote_path, local_path, &self.logger)
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.disconnect(None, "wpmaint run finished", None);
            self.logger.info("SSH connection closed.", None);
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect_session(connection: &SshConnection) -> Result<(Session, Option<String>), ToolError> {
    let timeout = Duration::from_millis(connection.connect_timeout_ms);
    let addrs: Vec<_> = (connection.host.as_str(), connection.port)
        .to_socket_addrs()
        .map_err(|err| {
            ToolError::connection(format!(
                "Connection failed: cannot resolve {}: {}",
                connection.host, err
            ))
        })?
        .collect();
    let mut last_err = None;
    let mut tcp = None;
    for addr in &addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => {
                tcp = Some(stream);
                break;
            }
            Err(err) => last_err = Some(err),
        }
    }
    let tcp = tcp.ok_or_else(|| {
        let reason = last_err
            .map(|err| err.to_string())
            .unwrap_or_else(|| "no addresses".to_string());
        ToolError::connection(format!(
            "Connection failed: {}:{}: {}",
            connection.host, connection.port, reason
        ))
    })?;
    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = Session::new()
        .map_err(|_| ToolError::internal("Failed to create SSH session"))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(connection.connect_timeout_ms.min(u32::MAX as u64) as u32);
    session.handshake().map_err(map_connect_error)?;

    let observed = fingerprint_host_key_sha256(&session);
    if let Some(expected) = connection.host_key_fingerprint.as_ref() {
        if observed.as_ref() != Some(expected) {
            return Err(ToolError::denied(format!(
                "SSH host key mismatch (expected {}, got {})",
                expected,
                observed.clone().unwrap_or_else(|| "unknown".to_string())
            )));
        }
    }

    match &connection.auth {
        SshAuth::Password(password) => session
            .userauth_password(&connection.username, password)
            .map_err(map_connect_error)?,
        SshAuth::KeyFile { path, passphrase } => session
            .userauth_pubkey_file(&connection.username, None, path, passphrase.as_deref())
            .map_err(map_connect_error)?,
    }

    if !session.authenticated() {
        return Err(ToolError::denied("SSH authentication failed"));
    }
    session.set_keepalive(true, network_constants::KEEPALIVE_INTERVAL_SECS);

    Ok((session, observed))
}

fn fingerprint_host_key_sha256(session: &Session) -> Option<String> {
    let hash = session.host_key_hash(ssh2::HashType::Sha256)?;
    Some(format_fingerprint(hash))
}

fn format_fingerprint(hash: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(hash);
    format!("SHA256:{}", encoded)
}

/// A passed deadline and a libssh2 timeout both become the timeout sentinel;
/// every other transport error stays an error.
fn classify_exec(
    outcome: Result<Option<CommandResult>, ToolError>,
) -> Result<CommandResult, ToolError> {
    match outcome {
        Ok(Some(result)) => Ok(result),
        Ok(None) => Ok(CommandResult::timed_out()),
        Err(err) if err.kind == ToolErrorKind::Timeout => Ok(CommandResult::timed_out()),
        Err(err) => Err(err),
    }
}

/// Runs one command on a fresh channel. `Ok(None)` means the deadline passed.
fn exec_blocking(
    session: &Session,
    command: &str,
    timeout: Duration,
) -> Result<Option<CommandResult>, ToolError> {
    let mut channel = session.channel_session().map_err(map_ssh_error)?;
    channel.exec(command).map_err(map_ssh_error)?;

    session.set_blocking(false);
    let polled = poll_channel(&mut channel, timeout);
    session.set_blocking(true);
    let (mut stdout, mut stderr, timed_out) = polled?;

    if timed_out {
        let _ = channel.close();
        return Ok(None);
    }

    channel
        .read_to_end(&mut stdout)
        .map_err(|err| map_io_error("stdout", err))?;
    channel
        .stderr()
        .read_to_end(&mut stderr)
        .map_err(|err| map_io_error("stderr", err))?;
    channel.wait_close().map_err(map_ssh_error)?;
    let exit_status = channel.exit_status().unwrap_or(-1);

    Ok(Some(CommandResult::new(
        String::from_utf8_lossy(&stdout).trim(),
        String::from_utf8_lossy(&stderr).trim(),
        exit_status,
    )))
}

fn poll_channel(
    channel: &mut Channel,
    timeout: Duration,
) -> Result<(Vec<u8>, Vec<u8>, bool), ToolError> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut stderr_stream = channel.stderr();
    let started = Instant::now();
    let mut buf = [0u8; READ_CHUNK_BYTES];

    loop {
        let mut progressed = false;
        match channel.read(&mut buf) {
            Ok(n) if n > 0 => {
                stdout.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(map_io_error("stdout", err)),
        }
        match stderr_stream.read(&mut buf) {
            Ok(n) if n > 0 => {
                stderr.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(map_io_error("stderr", err)),
        }

        if channel.eof() {
            return Ok((stdout, stderr, false));
        }
        if started.elapsed() > timeout {
            return Ok((stdout, stderr, true));
        }
        if !progressed {
            std::thread::sleep(Duration::from_millis(
                network_constants::EXEC_POLL_INTERVAL_MS,
            ));
        }
    }
}

fn map_io_error(stream: &str, err: std::io::Error) -> ToolError {
    if err.kind() == ErrorKind::TimedOut {
        return ToolError::timeout(format!("SSH {} read timed out", stream));
    }
    ToolError::connection(format!("SSH {} read failed: {}", stream, err))
}

pub(crate) fn map_ssh_error(err: ssh2::Error) -> ToolError {
    match err.code() {
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => {
            ToolError::timeout("SSH operation timed out")
        }
        ErrorCode::Session(LIBSSH2_ERROR_EAGAIN) => {
            ToolError::internal("SSH operation would block")
        }
        ErrorCode::Session(_) => ToolError::connection(format!("SSH error: {}", err)),
        ErrorCode::SFTP(_) => ToolError::io(format!("SFTP error: {}", err)),
    }
}

/// Connect-phase errors are all fatal; authentication failures are labelled.
fn map_connect_error(err: ssh2::Error) -> ToolError {
    match err.code() {
        ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED)
        | ErrorCode::Session(LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED) => {
            ToolError::denied(format!("Connection failed: authentication rejected: {}", err))
                .with_hint("Check --user and --passw, or --identity-file.")
        }
        ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) => {
            ToolError::timeout(format!("Connection failed: {}", err))
        }
        _ => ToolError::connection(format!("Connection failed: {}", err)),
    }
}
