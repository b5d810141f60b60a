use crate::types::Suite;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUITE_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read test suite {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse test suite {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("test suite {} must declare a timeout greater than zero", path.display())]
    InvalidTimeout { path: PathBuf },
}

/// Resolve a logical suite name to its JSON file: `sums` becomes `sums.json`
pub fn suite_path(name: &str) -> PathBuf {
    let path = Path::new(name);
    match path.extension() {
        Some(ext) if ext == SUITE_EXTENSION => path.to_path_buf(),
        _ => PathBuf::from(format!("{}.{}", name, SUITE_EXTENSION)),
    }
}

/// Load a suite by logical name
pub fn load_suite(name: &str) -> Result<Suite, LoadError> {
    load_suite_from(&suite_path(name))
}

pub fn load_suite_from(path: &Path) -> Result<Suite, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let suite = parse_suite(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if suite.timeout_secs == 0 {
        return Err(LoadError::InvalidTimeout {
            path: path.to_path_buf(),
        });
    }

    Ok(suite)
}

pub fn parse_suite(content: &str) -> Result<Suite, serde_json::Error> {
    serde_json::from_str(content)
}
