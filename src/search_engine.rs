use log::{info, warn};
use scraper::{Html, Selector};

use crate::board::{JobBoard, SearchRequest};
use crate::config::RetryPolicy;
use crate::delay_manager;
use crate::detail_fetcher;
use crate::error::ScrapeError;
use crate::job::{JobSummary, SearchResponse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub pages: u32,
    /// Connection-level retries across all pages.
    pub retries: u32,
}

pub struct SearchEngine<B> {
    board: B,
    retry: RetryPolicy,
    max_pages: u32,
}

impl<B: JobBoard> SearchEngine<B> {
    pub fn new(board: B, retry: RetryPolicy, max_pages: u32) -> Self {
        SearchEngine {
            board,
            retry,
            max_pages,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn search(&self, query: &str) -> Result<Vec<JobSummary>, ScrapeError> {
        self.search_with_stats(query).map(|(jobs, _)| jobs)
    }

    /// Walks every result page in order, enriching each job with its detail
    /// page before the page is merged.
    pub fn search_with_stats(&self, query: &str) -> Result<(Vec<JobSummary>, SearchStats), ScrapeError> {
        let mut results = Vec::new();
        let mut stats = SearchStats::default();
        let mut page: u32 = 1;

        loop {
            if stats.pages >= self.max_pages {
                return Err(ScrapeError::PageLimit { limit: self.max_pages });
            }

            info!("scraping page: {}", page);
            let SearchResponse { mut jobs, pager } = if page == 1 {
                self.fetch_page(query, page)?
            } else {
                self.fetch_page_with_retry(query, page, &mut stats)?
            };
            stats.pages += 1;

            for job in jobs.iter_mut() {
                detail_fetcher::enrich(&self.board, job)?;
            }
            results.append(&mut jobs);

            if !pager.has_more() {
                break;
            }
            if pager.next_page_index <= pager.current_page_index {
                return Err(ScrapeError::Stalled {
                    current: pager.current_page_index,
                    next: pager.next_page_index,
                });
            }
            page = u32::try_from(pager.next_page_index).map_err(|_| ScrapeError::Stalled {
                current: pager.current_page_index,
                next: pager.next_page_index,
            })?;
        }

        info!("Collected {} jobs over {} pages ({} retries)", results.len(), stats.pages, stats.retries);
        Ok((results, stats))
    }

    fn fetch_page_with_retry(
        &self,
        query: &str,
        page: u32,
        stats: &mut SearchStats,
    ) -> Result<SearchResponse, ScrapeError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_page(query, page) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!("Page {} attempt {}/{} failed: {}", page, attempt, max_attempts, e);
                    stats.retries += 1;
                    delay_manager::retry_delay(&self.retry, attempt);
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(ScrapeError::RetriesExhausted {
                        page,
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fetch_page(&self, query: &str, page: u32) -> Result<SearchResponse, ScrapeError> {
        let html = self.board.search_page(query, page)?;
        let token = parse_search_token(&html)?.ok_or(ScrapeError::MissingToken { page })?;

        let request = SearchRequest::new(query, page, &token);
        let body = self.board.execute_search(&request)?;
        serde_json::from_str(&body).map_err(|source| ScrapeError::Decode { page, source })
    }
}

/// The per-session token lives in the `value` of `#UniqueSearchID`.
pub fn parse_search_token(html: &str) -> Result<Option<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("#UniqueSearchID").map_err(|e| ScrapeError::Selector(e.to_string()))?;
    Ok(document
        .select(&selector)
        .find_map(|el| el.value().attr("value"))
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves canned pages; `failures[page]` connection errors are raised
    /// before that page's search page succeeds.
    #[derive(Default)]
    struct ScriptedBoard {
        pages: HashMap<u32, Value>,
        failures: RefCell<HashMap<u32, u32>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedBoard {
        fn page(mut self, page: u32, ids: &[&str], current: i64, last: i64, next: i64) -> Self {
            let jobs: Vec<Value> = ids
                .iter()
                .map(|id| json!({"PositionID": id, "DocumentID": format!("doc-{}", id), "Title": "Officer", "Location": "Dallas, Texas"}))
                .collect();
            self.pages.insert(
                page,
                json!({"Jobs": jobs, "Pager": {"CurrentPageIndex": current, "LastPageIndex": last, "NextPageIndex": next}}),
            );
            self
        }

        fn failing(self, page: u32, times: u32) -> Self {
            self.failures.borrow_mut().insert(page, times);
            self
        }
    }

    impl JobBoard for ScriptedBoard {
        fn search_page(&self, _query: &str, page: u32) -> Result<String, ScrapeError> {
            self.calls.borrow_mut().push(format!("search:{}", page));
            if let Some(left) = self.failures.borrow_mut().get_mut(&page) {
                if *left > 0 {
                    *left -= 1;
                    return Err(ScrapeError::Connection {
                        url: format!("https://board.test/Search/?p={}", page),
                        source: Box::new(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
                    });
                }
            }
            Ok(format!(r#"<form><input type="hidden" id="UniqueSearchID" value="tok-{}"></form>"#, page))
        }

        fn execute_search(&self, request: &SearchRequest) -> Result<String, ScrapeError> {
            assert_eq!(request.unique_search_id, format!("tok-{}", request.page));
            self.calls.borrow_mut().push(format!("execute:{}", request.page));
            Ok(self.pages[&request.page].to_string())
        }

        fn job_detail(&self, detail_id: &str) -> Result<String, ScrapeError> {
            self.calls.borrow_mut().push(format!("detail:{}", detail_id));
            Ok(format!("<html>{}</html>", detail_id))
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn ids(jobs: &[JobSummary]) -> Vec<String> {
        jobs.iter().map(|j| j.id().unwrap()).collect()
    }

    #[test]
    fn fetches_exactly_three_pages_then_stops() {
        let board = ScriptedBoard::default()
            .page(1, &["A"], 1, 3, 2)
            .page(2, &["B"], 2, 3, 3)
            .page(3, &["C"], 3, 3, 4);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let (jobs, stats) = engine.search_with_stats("immigration").unwrap();

        assert_eq!(ids(&jobs), vec!["A", "B", "C"]);
        assert_eq!(stats, SearchStats { pages: 3, retries: 0 });
        assert_eq!(
            engine.board().calls.borrow().as_slice(),
            [
                "search:1", "execute:1", "detail:doc-A",
                "search:2", "execute:2", "detail:doc-B",
                "search:3", "execute:3", "detail:doc-C",
            ]
        );
    }

    #[test]
    fn every_job_carries_its_detail_page() {
        let board = ScriptedBoard::default().page(1, &["A", "B"], 1, 1, 2);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let jobs = engine.search("immigration").unwrap();

        assert_eq!(jobs[0].detail_html(), Some("<html>doc-A</html>"));
        assert_eq!(jobs[1].detail_html(), Some("<html>doc-B</html>"));
    }

    #[test]
    fn non_advancing_pager_is_rejected() {
        let board = ScriptedBoard::default()
            .page(1, &["A"], 1, 3, 2)
            .page(2, &["B"], 2, 3, 2);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let err = engine.search("immigration").unwrap_err();
        assert!(matches!(err, ScrapeError::Stalled { current: 2, next: 2 }));
    }

    #[test]
    fn page_cap_bounds_the_walk() {
        let board = ScriptedBoard::default()
            .page(1, &["A"], 1, 9, 2)
            .page(2, &["B"], 2, 9, 3);
        let engine = SearchEngine::new(board, fast_retry(3), 2);

        let err = engine.search("immigration").unwrap_err();
        assert!(matches!(err, ScrapeError::PageLimit { limit: 2 }));
    }

    #[test]
    fn transient_failures_on_later_pages_are_retried() {
        let board = ScriptedBoard::default()
            .page(1, &["A"], 1, 2, 2)
            .page(2, &["B"], 2, 2, 3)
            .failing(2, 2);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let (jobs, stats) = engine.search_with_stats("immigration").unwrap();

        assert_eq!(ids(&jobs), vec!["A", "B"]);
        assert_eq!(stats.retries, 2);
    }

    #[test]
    fn retries_are_bounded() {
        let board = ScriptedBoard::default()
            .page(1, &["A"], 1, 2, 2)
            .page(2, &["B"], 2, 2, 3)
            .failing(2, 10);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let err = engine.search("immigration").unwrap_err();
        assert!(matches!(err, ScrapeError::RetriesExhausted { page: 2, attempts: 3, .. }));
        let searches = engine.board().calls.borrow().iter().filter(|c| *c == "search:2").count();
        assert_eq!(searches, 3);
    }

    #[test]
    fn first_page_failure_is_not_retried() {
        let board = ScriptedBoard::default().page(1, &["A"], 1, 1, 2).failing(1, 1);
        let engine = SearchEngine::new(board, fast_retry(3), 50);

        let err = engine.search("immigration").unwrap_err();
        assert!(err.is_transient());
        assert_eq!(engine.board().calls.borrow().as_slice(), ["search:1"]);
    }

    #[test]
    fn missing_token_fails_the_page() {
        assert_eq!(parse_search_token("<html><body>maintenance</body></html>").unwrap(), None);
        assert_eq!(
            parse_search_token(r#"<input id="UniqueSearchID" value="abc-123">"#).unwrap(),
            Some("abc-123".to_string())
        );
    }
}
