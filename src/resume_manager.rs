use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::WatchError;

/// Identifiers already handled, in the order they were first seen.
/// Loaded once at startup and saved at the end of every cycle.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl SeenSet {
    /// A missing file means a fresh start. A file that cannot be read or
    /// parsed is an error: starting over would re-announce every posting.
    pub fn load(path: &Path) -> Result<Self, WatchError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No seen file at {:?}. Starting fresh.", path);
                return Ok(SeenSet::default());
            }
            Err(e) => return Err(WatchError::io(path, e)),
        };

        let ids: Vec<String> = serde_json::from_str(&content).map_err(|e| WatchError::json(path, e))?;
        let seen: SeenSet = ids.into_iter().collect();
        info!("Resumed previous session: {} jobs already seen.", seen.len());
        Ok(seen)
    }

    pub fn save(&self, path: &Path) -> Result<(), WatchError> {
        write_json_atomic(path, &self.order)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: String) -> bool {
        if self.index.insert(id.clone()) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut seen = SeenSet::default();
        for id in iter {
            seen.insert(id);
        }
        seen
    }
}

/// Serializes next to the target and renames over it, so a crash mid-write
/// leaves the previous file intact.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WatchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WatchError::io(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let file = File::create(tmp).map_err(|e| WatchError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| WatchError::json(tmp, e))?;
    writer.flush().map_err(|e| WatchError::io(tmp, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| WatchError::io(tmp, e))?;

    fs::rename(tmp, path).map_err(|e| WatchError::io(path, e))
}
