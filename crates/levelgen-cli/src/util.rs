use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use serde::de::DeserializeOwned;

pub(crate) fn read_json_file<T>(path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).with_context(|| format!("Failed to parse JSON from {}", path.display()))
}
