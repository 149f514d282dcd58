//! JSON persistence of agents and their replay buffers.
//!
//! An agent named `walls` saved to `models/` produces
//! `models/walls.agent.json` and `models/walls.buffer.json`.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{network::DuelingNetwork, optimizer::Adam};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistError {
    #[display("no checkpoint at {}", path.display())]
    NotFound { path: PathBuf },
    #[display("I/O error on {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed JSON in {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display(
        "checkpoint {} expects {found_inputs} inputs and {found_actions} actions, agent has {inputs} and {actions}",
        path.display()
    )]
    ShapeMismatch {
        path: PathBuf,
        inputs: usize,
        actions: usize,
        found_inputs: usize,
        found_actions: usize,
    },
}

impl PersistError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::NotFound { .. })
    }
}

/// Saved learning state of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCheckpoint {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub epsilon: f32,
    pub observation_size: usize,
    pub action_count: usize,
    pub online: DuelingNetwork,
    pub target: DuelingNetwork,
    pub optimizer: Adam,
}

#[must_use]
pub fn agent_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.agent.json"))
}

#[must_use]
pub fn buffer_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.buffer.json"))
}

pub(crate) fn write_json<T>(path: &Path, value: &T) -> Result<(), PersistError>
where
    T: Serialize,
{
    let io_error = |source| PersistError::Io {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| PersistError::Json {
        path: path.to_owned(),
        source,
    })?;
    writer.flush().map_err(io_error)
}

pub(crate) fn read_json<T>(path: &Path) -> Result<T, PersistError>
where
    T: DeserializeOwned,
{
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PersistError::NotFound {
                path: path.to_owned(),
            }
        } else {
            PersistError::Io {
                path: path.to_owned(),
                source,
            }
        }
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| PersistError::Json {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json_is_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json::<Vec<u8>>(&path).unwrap_err();
        assert!(matches!(err, PersistError::Json { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("values.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let values: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn test_paths_are_keyed_by_name() {
        let dir = Path::new("models");
        assert_eq!(agent_path(dir, "item"), Path::new("models/item.agent.json"));
        assert_eq!(buffer_path(dir, "item"), Path::new("models/item.buffer.json"));
    }
}
