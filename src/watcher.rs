use std::path::PathBuf;

use chrono::Local;
use log::info;

use crate::board::JobBoard;
use crate::config::Config;
use crate::delay_manager;
use crate::error::{ScrapeError, WatchError};
use crate::job::JobSummary;
use crate::notifier::Notifier;
use crate::resume_manager::SeenSet;
use crate::search_engine::SearchEngine;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub found: usize,
    pub new_jobs: usize,
    pub pages: u32,
    pub retries: u32,
    pub snapshot: Option<PathBuf>,
}

/// The search, dedup, notify, persist, sleep loop.
pub struct Watcher<B, N> {
    engine: SearchEngine<B>,
    notifier: N,
    seen: SeenSet,
    config: Config,
}

impl<B: JobBoard, N: Notifier> Watcher<B, N> {
    /// Loads the seen set from `config.seen_path()`.
    pub fn new(board: B, notifier: N, config: Config) -> Result<Self, WatchError> {
        let seen = SeenSet::load(&config.seen_path())?;
        let engine = SearchEngine::new(board, config.retry.clone(), config.max_pages);
        Ok(Watcher {
            engine,
            notifier,
            seen,
            config,
        })
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs cycles back to back with `config.interval` between them. Only
    /// returns when a cycle fails.
    pub fn run(&mut self) -> Result<(), WatchError> {
        loop {
            self.run_cycle()?;
            delay_manager::cycle_delay(self.config.interval);
        }
    }

    pub fn run_cycle(&mut self) -> Result<CycleReport, WatchError> {
        let (results, stats) = self.engine.search_with_stats(&self.config.query)?;
        let found = results.len();
        let new_jobs = select_new(&self.seen, results)?;

        for (id, job) in new_jobs.iter() {
            self.notifier.notify(job).map_err(|source| WatchError::Notify {
                id: id.to_string(),
                source,
            })?;
            self.seen.insert(id.to_string());
        }

        let snapshot = if new_jobs.is_empty() {
            None
        } else {
            let path = new_jobs.write(&self.config.data_dir, &Local::now())?;
            info!("Wrote {} new jobs to {:?}", new_jobs.len(), path);
            Some(path)
        };

        // Saved every cycle, even when nothing was new.
        self.seen.save(&self.config.seen_path())?;

        info!("done: {} jobs found, {} new, {} seen in total", found, new_jobs.len(), self.seen.len());
        Ok(CycleReport {
            found,
            new_jobs: new_jobs.len(),
            pages: stats.pages,
            retries: stats.retries,
            snapshot,
        })
    }
}

/// Jobs whose identifier is not in `seen`, in result order. A repeated
/// identifier keeps its first position and its last value.
pub fn select_new(seen: &SeenSet, results: Vec<JobSummary>) -> Result<Snapshot, ScrapeError> {
    let mut new_jobs = Snapshot::default();
    for job in results {
        let id = job.id()?;
        if !seen.contains(&id) {
            new_jobs.insert(id, job);
        }
    }
    Ok(new_jobs)
}
