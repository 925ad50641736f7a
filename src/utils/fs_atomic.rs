use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(path)
}

pub fn ensure_dir_for_file(path: impl AsRef<Path>) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn temp_sibling_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("temp");
    parent.join(format!("{}.{}.tmp", file_name, random_token(8)))
}

/// Replaces `path` with `content`, never leaving a half-written file behind.
pub fn atomic_write_text_file(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    ensure_dir_for_file(path)?;
    let tmp = temp_sibling_path(path);
    let written = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::{atomic_write_text_file, temp_sibling_path};

    #[test]
    fn temp_sibling_stays_in_same_directory() {
        let tmp = temp_sibling_path("/var/log/wp_report.md");
        assert_eq!(tmp.parent().unwrap(), std::path::Path::new("/var/log"));
        let name = tmp.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("wp_report.md."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn atomic_write_overwrites_existing_file() {
        let dir = std::env::temp_dir().join(format!("wpmaint-fs-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("out.md");
        atomic_write_text_file(&path, "first run, longer text").expect("first write");
        atomic_write_text_file(&path, "second").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "temp files must not be left behind");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
