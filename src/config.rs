use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL: &str = "https://www.usajobs.gov";
pub const QUERY: &str = "immigration";
pub const INTERVAL: Duration = Duration::from_secs(60 * 60 * 12);
const SEEN_FILE: &str = ".seen.json";

/// How a failing search page is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per page, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub query: String,
    pub interval: Duration,
    pub data_dir: PathBuf,
    pub notify_path: PathBuf,
    pub retry: RetryPolicy,
    pub max_pages: u32,
}

impl Config {
    pub fn seen_path(&self) -> PathBuf {
        self.data_dir.join(SEEN_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: BASE_URL.to_string(),
            query: QUERY.to_string(),
            interval: INTERVAL,
            data_dir: PathBuf::from("data"),
            notify_path: PathBuf::from("/tmp/ice_jobs.txt"),
            retry: RetryPolicy::default(),
            max_pages: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_file_lives_in_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/var/lib/watch"),
            ..Config::default()
        };
        assert_eq!(config.seen_path(), PathBuf::from("/var/lib/watch/.seen.json"));
        assert_eq!(config.interval, Duration::from_secs(43_200));
    }
}
