use std::error::Error;

use job_watch_lib::{logger, Config, FileNotifier, UsaJobsBoard, Watcher, WatchError};
use log::{error, info};

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();

    if let Err(e) = run(Config::default()) {
        error!("Stopping: {}", e);
        return Err(e.into());
    }
    Ok(())
}

fn run(config: Config) -> Result<(), WatchError> {
    info!(
        "Watching {} for '{}' every {} hours",
        config.base_url,
        config.query,
        config.interval.as_secs() / 3600
    );

    let board = UsaJobsBoard::new(&config.base_url)?;
    let notifier = FileNotifier::new(config.notify_path.clone());
    let mut watcher = Watcher::new(board, notifier, config)?;
    watcher.run()
}
