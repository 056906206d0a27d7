//! Home-based storage paths under `~/.devflow/`:
//! - `logs/<wd-hash>/` - audit logs, qualified by working directory
//! - `config.yaml` - optional user configuration
//!
//! Nothing here creates directories; the audit logger creates its own on open.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const DEVFLOW_DIR: &str = ".devflow";

/// Returns `~/.devflow/`.
pub fn devflow_home_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for devflow storage")?;
    Ok(home.join(DEVFLOW_DIR))
}

/// Returns the logs directory for a working directory: `~/.devflow/logs/<wd-hash>/`
pub fn logs_dir(working_dir: &Path) -> Result<PathBuf> {
    Ok(devflow_home_dir()?
        .join("logs")
        .join(working_dir_hash(working_dir)))
}

/// Returns the default configuration file path: `~/.devflow/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(devflow_home_dir()?.join("config.yaml"))
}

/// Computes a working directory hash (SHA256 truncated to 12 hex characters).
///
/// Canonicalizes first so symlinked paths agree; falls back to the raw path
/// bytes when that fails.
pub fn working_dir_hash(path: &Path) -> String {
    let bytes = match fs::canonicalize(path) {
        Ok(canonical) => canonical.to_string_lossy().into_owned().into_bytes(),
        Err(_) => {
            #[cfg(unix)]
            {
                use std::os::unix::ffi::OsStrExt;
                path.as_os_str().as_bytes().to_vec()
            }
            #[cfg(not(unix))]
            {
                path.to_string_lossy().into_owned().into_bytes()
            }
        }
    };

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let result = hasher.finalize();

    // First 6 bytes (12 hex characters)
    hex_encode(&result[..6])
}

/// Encodes bytes as lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_working_dir_hash_consistency() {
        let dir = tempdir().unwrap();

        let hash1 = working_dir_hash(dir.path());
        let hash2 = working_dir_hash(dir.path());

        assert_eq!(hash1, hash2, "Hash should be consistent across calls");
        assert_eq!(hash1.len(), 12, "Hash should be 12 hex characters");
    }

    #[test]
    fn test_working_dir_hash_different_paths() {
        let dir1 = tempdir().unwrap();
        let dir2 = tempdir().unwrap();
        assert_ne!(working_dir_hash(dir1.path()), working_dir_hash(dir2.path()));
    }

    #[test]
    fn test_working_dir_hash_missing_path() {
        let hash = working_dir_hash(Path::new("/definitely/not/a/real/dir"));
        assert_eq!(hash.len(), 12);
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(hex_encode(&[0xab, 0xcd, 0xef]), "abcdef");
    }

    #[test]
    fn test_logs_dir_layout() {
        let dir = tempdir().unwrap();
        let Ok(logs) = logs_dir(dir.path()) else {
            panic!("home directory should resolve in tests");
        };
        assert!(logs.ends_with(working_dir_hash(dir.path())));
        assert!(logs.parent().unwrap().ends_with(".devflow/logs"));
    }
}
