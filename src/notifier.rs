use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::error::BoxError;
use crate::job::JobSummary;

/// Sink for newly discovered jobs. Called once per new job, before the job
/// is marked as seen.
pub trait Notifier {
    fn notify(&mut self, job: &JobSummary) -> Result<(), BoxError>;
}

pub fn headline(job: &JobSummary) -> String {
    format!("{} ({})", job.title(), job.location())
}

/// Appends `Title (Location)` lines to a text file.
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileNotifier { path: path.into() }
    }
}

impl Notifier for FileNotifier {
    fn notify(&mut self, job: &JobSummary) -> Result<(), BoxError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", headline(job))?;
        Ok(())
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, job: &JobSummary) -> Result<(), BoxError> {
        info!("New job: {}", headline(job));
        Ok(())
    }
}
