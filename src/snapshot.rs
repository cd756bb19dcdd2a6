use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::WatchError;
use crate::job::JobSummary;
use crate::resume_manager::write_json_atomic;

/// New jobs found in one cycle, keyed by identifier.
///
/// Keys keep the position of their first insertion; re-inserting a key
/// replaces the job with the later one.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    entries: Vec<(String, JobSummary)>,
    index: HashMap<String, usize>,
}

impl Snapshot {
    pub fn insert(&mut self, id: String, job: JobSummary) {
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = job,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, job));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobSummary)> {
        self.entries.iter().map(|(id, job)| (id.as_str(), job))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Writes `<dir>/<ISO-8601 timestamp>.json` and returns the path.
    pub fn write<Tz: TimeZone>(&self, dir: &Path, at: &DateTime<Tz>) -> Result<PathBuf, WatchError> {
        let path = snapshot_path(dir, at);
        write_json_atomic(&path, self)?;
        Ok(path)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(id, job)| (id, job)))
    }
}

pub fn snapshot_path<Tz: TimeZone>(dir: &Path, at: &DateTime<Tz>) -> PathBuf {
    dir.join(format!("{}.json", at.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f")))
}

/// Reads a snapshot back as raw JSON.
pub fn read_snapshot(path: &Path) -> Result<Map<String, Value>, WatchError> {
    let content = fs::read_to_string(path).map_err(|e| WatchError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| WatchError::json(path, e))
}
