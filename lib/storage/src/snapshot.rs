// Dataset snapshot files: the catalog columns plus the similarity matrix,
// stored as gzip'd JSON, plain JSON or bincode.
use anyhow::{anyhow, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use simrec_core::{Column, Table};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Column that holds the matrix inside a snapshot, next to the catalog columns
pub const DEFAULT_MATRIX_KEY: &str = "similarity_matrix";

/// Description of a written snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// On-disk dataset: every catalog column, and the matrix as one more
/// `vectors` column with one row per catalog row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSnapshot {
    pub version: u32,
    pub created_at: u64,
    pub columns: Table,
}

impl DatasetSnapshot {
    pub fn new(columns: Table) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now().timestamp().max(0) as u64,
            columns,
        }
    }

    /// Catalog table and matrix rows stored under [`DEFAULT_MATRIX_KEY`]
    pub fn with_matrix(mut columns: Table, matrix: Vec<Vec<f32>>) -> Self {
        columns.insert(DEFAULT_MATRIX_KEY, Column::Vectors(matrix));
        Self::new(columns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    GzipJson,
    Json,
    Bincode,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid dataset path {:?}", path))?;

        if name.ends_with(".gz") {
            Ok(DatasetFormat::GzipJson)
        } else if name.ends_with(".json") {
            Ok(DatasetFormat::Json)
        } else if name.ends_with(".bin") || name.ends_with(".simrec") {
            Ok(DatasetFormat::Bincode)
        } else {
            Err(anyhow!(
                "unrecognised dataset extension for '{}' (expected .json.gz, .json, .bin or .simrec)",
                name
            ))
        }
    }
}

pub fn encode(snapshot: &DatasetSnapshot, format: DatasetFormat) -> Result<Vec<u8>> {
    match format {
        DatasetFormat::Json => Ok(serde_json::to_vec(snapshot)?),
        DatasetFormat::GzipJson => {
            let json_data = serde_json::to_vec(snapshot)?;
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json_data)?;
            Ok(encoder.finish()?)
        }
        DatasetFormat::Bincode => bincode::serialize(snapshot)
            .map_err(|e| anyhow!("Serialization error: {}", e)),
    }
}

pub fn decode(bytes: &[u8], format: DatasetFormat) -> Result<DatasetSnapshot> {
    let snapshot: DatasetSnapshot = match format {
        DatasetFormat::Json => serde_json::from_slice(bytes)?,
        DatasetFormat::GzipJson => {
            let mut decoder = GzDecoder::new(bytes);
            let mut json_data = Vec::new();
            decoder.read_to_end(&mut json_data)?;
            serde_json::from_slice(&json_data)?
        }
        DatasetFormat::Bincode => bincode::deserialize(bytes)
            .map_err(|e| anyhow!("Deserialization error: {}", e))?,
    };

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(anyhow!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version,
            SNAPSHOT_VERSION
        ));
    }
    Ok(snapshot)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write a snapshot atomically; the format follows the file extension.
pub fn save_snapshot(path: &Path, snapshot: &DatasetSnapshot) -> Result<SnapshotDescription> {
    let format = DatasetFormat::from_path(path)?;
    let data = encode(snapshot, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite).write(|f| f.write_all(&data))?;

    let creation_time = DateTime::from_timestamp(snapshot.created_at as i64, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());

    Ok(SnapshotDescription {
        name: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string(),
        creation_time,
        size: data.len() as u64,
        checksum: Some(sha256_hex(&data)),
    })
}

pub fn read_snapshot(path: &Path) -> Result<DatasetSnapshot> {
    let format = DatasetFormat::from_path(path)?;
    let bytes = fs::read(path)?;
    decode(&bytes, format)
}
