use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_MB: usize = 50;
const MAX_UPLOAD_MB_CEILING: usize = 1024;

/// Media service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Uploads and job results live under this directory.
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port = std::env::var("MEDIA_PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse::<u16>()
            .context("MEDIA_PORT must be a valid port number")?;

        let max_upload_bytes =
            upload_limit_bytes(std::env::var("MEDIA_MAX_UPLOAD_MB").ok().as_deref())?;

        Ok(Config {
            port,
            storage_dir: std::env::var("MEDIA_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media-data")),
            max_upload_bytes,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Parses `MEDIA_MAX_UPLOAD_MB` into a byte count, 1..=1024 MB.
fn upload_limit_bytes(raw: Option<&str>) -> Result<usize> {
    let megabytes = match raw {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .context("MEDIA_MAX_UPLOAD_MB must be a whole number of megabytes")?,
        None => DEFAULT_MAX_UPLOAD_MB,
    };
    if !(1..=MAX_UPLOAD_MB_CEILING).contains(&megabytes) {
        bail!("MEDIA_MAX_UPLOAD_MB must be between 1 and {MAX_UPLOAD_MB_CEILING}, got {megabytes}");
    }
    Ok(megabytes.saturating_mul(1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limit_defaults_to_fifty_megabytes() {
        assert_eq!(upload_limit_bytes(None).unwrap(), 50 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(Some(" 8 ")).unwrap(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_upload_limit_rejects_zero_and_oversized_values() {
        assert!(upload_limit_bytes(Some("0")).is_err());
        assert!(upload_limit_bytes(Some("1025")).is_err());
        assert!(upload_limit_bytes(Some("18446744073709551615")).is_err());
        assert!(upload_limit_bytes(Some("lots")).is_err());
    }
}
