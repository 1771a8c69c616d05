// Dataset sources: local files, or URLs downloaded once into a cache directory.
use crate::snapshot::sha256_hex;
use anyhow::{anyhow, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_DOWNLOAD_NAME: &str = "dataset.json.gz";

/// Where a dataset comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` / `https://` become URLs, everything else a local path
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::Path(PathBuf::from(s))
        }
    }
}

impl From<&str> for DataSource {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<PathBuf> for DataSource {
    fn from(p: PathBuf) -> Self {
        DataSource::Path(p)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => f.write_str(u),
        }
    }
}

/// File name a URL is cached under: its last path segment without query or fragment
pub fn cache_file_name(url: &str) -> String {
    url.split(|c: char| c == '?' || c == '#')
        .next()
        .and_then(|s| s.rsplit('/').next())
        .filter(|s| !s.is_empty() && s.contains('.'))
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string())
}

fn checksum_matches(path: &Path, expected: &str) -> Result<bool> {
    let data = fs::read(path)?;
    Ok(sha256_hex(&data).eq_ignore_ascii_case(expected))
}

/// Download `url` into `cache_dir`, reusing an existing cached copy.
///
/// With `expected_sha256` set, a cached file that doesn't match is fetched
/// again and a download that doesn't match is discarded.
pub async fn fetch_to_cache(
    url: &str,
    cache_dir: &Path,
    expected_sha256: Option<&str>,
) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;
    let path = cache_dir.join(cache_file_name(url));

    if path.exists() {
        match expected_sha256 {
            Some(expected) if !checksum_matches(&path, expected)? => {
                warn!(path = %path.display(), "cached dataset fails checksum, downloading again");
            }
            _ => {
                info!(path = %path.display(), "using cached dataset");
                return Ok(path);
            }
        }
    }

    info!(url, "downloading dataset");
    let response = reqwest::get(url)
        .await
        .map_err(|e| anyhow!("Failed to download dataset: {}", e))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download dataset: HTTP {}",
            response.status()
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| anyhow!("Failed to read dataset body: {}", e))?;

    if let Some(expected) = expected_sha256 {
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(anyhow!(
                "Checksum mismatch: expected {}, got {}",
                expected,
                actual
            ));
        }
    }

    AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite).write(|f| f.write_all(&bytes))?;
    info!(path = %path.display(), size = bytes.len(), "dataset downloaded");
    Ok(path)
}
