use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures while talking to the job board or reading what it sent back.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Connect failures, timeouts and dropped connections. These are the only errors the paginator retries.
    #[error("connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("search page {page} has no UniqueSearchID token")]
    MissingToken { page: u32 },

    #[error("unexpected search response for page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("job has neither PositionID nor DocumentID")]
    MissingIdentifier,

    #[error("pager stalled on page {current}: next page reported as {next}")]
    Stalled { current: i64, next: i64 },

    #[error("gave up after fetching {limit} pages")]
    PageLimit { limit: u32 },

    #[error("page {page} still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        page: u32,
        attempts: u32,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("invalid selector {0}")]
    Selector(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl ScrapeError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        // Send and body-read failures are the peer closing or resetting mid-exchange.
        let transient = source.is_connect()
            || source.is_timeout()
            || source.is_request()
            || source.is_body()
            || dropped_connection(&source);
        if transient {
            ScrapeError::Connection {
                url: url.to_string(),
                source: Box::new(source),
            }
        } else {
            ScrapeError::Http {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::Connection { .. })
    }
}

/// True when any error in the chain is the peer dropping or resetting the
/// connection after it was opened.
pub(crate) fn dropped_connection(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Failures of a watch cycle. None of them are recovered; they end the process.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("notifier failed for job {id}: {source}")]
    Notify {
        id: String,
        #[source]
        source: BoxError,
    },
}

impl WatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        WatchError::Json {
            path: path.into(),
            source,
        }
    }
}
