pub mod board;
pub mod config;
pub mod delay_manager;
pub mod detail_fetcher;
pub mod error;
pub mod job;
pub mod logger;
pub mod notifier;
pub mod resume_manager;
pub mod search_engine;
pub mod snapshot;
pub mod watcher;

// Exporting types for convenience
pub use board::{JobBoard, SearchRequest, UsaJobsBoard};
pub use config::{Config, RetryPolicy};
pub use error::{ScrapeError, WatchError};
pub use job::{JobSummary, LocationEntry, Pager};
pub use notifier::{FileNotifier, LogNotifier, Notifier};
pub use resume_manager::SeenSet;
pub use search_engine::{SearchEngine, SearchStats};
pub use snapshot::Snapshot;
pub use watcher::{CycleReport, Watcher};
