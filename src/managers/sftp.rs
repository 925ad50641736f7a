use crate::errors::ToolError;
use crate::managers::ssh::map_ssh_error;
use crate::services::logger::Logger;
use crate::utils::fs_atomic::{ensure_dir_for_file, temp_sibling_path};
use ssh2::Session;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Copies `remote_path` to `local_path`, replacing any existing file.
///
/// The SFTP subsystem is opened for this transfer only and released before
/// the local file is finalized, whether or not the copy succeeded.
pub fn download(
    session: &Session,
    remote_path: &str,
    local_path: &Path,
    logger: &Logger,
) -> Result<u64, ToolError> {
    let sftp = session.sftp().map_err(map_ssh_error)?;
    logger.debug("SFTP channel opened", None);

    let copied = sftp
        .open(Path::new(remote_path))
        .map_err(map_ssh_error)
        .and_then(|remote_file| copy_into_place(remote_file, local_path));

    drop(sftp);
    logger.debug("SFTP channel closed", None);

    let bytes = copied?;
    logger.debug(
        "SFTP download complete",
        Some(&serde_json::json!({
            "remote_path": remote_path,
            "local_path": local_path.display().to_string(),
            "bytes": bytes,
        })),
    );
    Ok(bytes)
}

/// Streams `reader` into a temporary sibling of `local_path`, then renames it
/// into place. A failed copy never leaves a truncated file under either name.
fn copy_into_place(mut reader: impl Read, local_path: &Path) -> Result<u64, ToolError> {
    ensure_dir_for_file(local_path)?;
    let tmp_path = temp_sibling_path(local_path);

    let copied = (|| -> Result<u64, ToolError> {
        let mut tmp_file = fs::File::create(&tmp_path)
            .map_err(|err| ToolError::io(format!("Failed to create temp file: {}", err)))?;
        let bytes = std::io::copy(&mut reader, &mut tmp_file)
            .map_err(|err| ToolError::io(format!("SFTP read failed: {}", err)))?;
        tmp_file
            .sync_all()
            .map_err(|err| ToolError::io(format!("Failed to flush download: {}", err)))?;
        Ok(bytes)
    })();

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
    };
    fs::rename(&tmp_path, local_path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        ToolError::io(format!("Failed to finalize download: {}", err))
    })?;
    Ok(bytes)
}
