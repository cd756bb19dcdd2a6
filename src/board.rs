use std::time::Duration;

use log::debug;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use serde::Serialize;
use url::Url;

use crate::error::ScrapeError;

/// The three requests the site needs. Everything above this trait is pure
/// orchestration, so tests swap in an in-memory board.
pub trait JobBoard {
    /// HTML of the search page; carries the session token.
    fn search_page(&self, query: &str, page: u32) -> Result<String, ScrapeError>;

    /// Raw JSON returned by the search execution endpoint.
    fn execute_search(&self, request: &SearchRequest) -> Result<String, ScrapeError>;

    /// HTML of a single posting.
    fn job_detail(&self, detail_id: &str) -> Result<String, ScrapeError>;
}

/// JSON body for `/Search/ExecuteSearch`. Every facet is sent empty.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchRequest {
    pub grade_bucket: Vec<String>,
    pub job_category_code: Vec<String>,
    pub location_name: Vec<String>,
    pub posting_channel: Vec<String>,
    pub department: Vec<String>,
    pub agency: Vec<String>,
    pub position_offering_type_code: Vec<String>,
    pub travel_percentage: Vec<String>,
    pub position_schedule_type_code: Vec<String>,
    pub security_clearance_required: Vec<String>,
    pub show_all_filters: Vec<String>,
    pub hiring_path: Vec<String>,
    pub keyword: String,
    pub page: u32,
    #[serde(rename = "UniqueSearchID")]
    pub unique_search_id: String,
}

impl SearchRequest {
    pub fn new(keyword: &str, page: u32, token: &str) -> Self {
        SearchRequest {
            keyword: keyword.to_string(),
            page,
            unique_search_id: token.to_string(),
            ..Default::default()
        }
    }
}

pub struct UsaJobsBoard {
    client: Client,
    base: Url,
}

impl UsaJobsBoard {
    pub fn new(base_url: &str) -> Result<Self, ScrapeError> {
        let base = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ScrapeError::from_reqwest(base_url, e))?;

        Ok(UsaJobsBoard { client, base })
    }

    pub fn search_url(&self, query: &str, page: u32) -> Result<Url, ScrapeError> {
        let mut url = self.base.join("Search/")?;
        url.query_pairs_mut()
            .append_pair("k", query)
            .append_pair("p", &page.to_string());
        Ok(url)
    }

    pub fn detail_url(&self, detail_id: &str) -> Result<Url, ScrapeError> {
        Ok(self.base.join(&format!("GetJob/ViewDetails/{}", detail_id))?)
    }

    fn random_user_agent(&self) -> &'static str {
        let uas = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        let mut rng = rand::thread_rng();
        uas[rng.gen_range(0..uas.len())]
    }

    fn get_text(&self, url: Url) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, self.random_user_agent())
            .send()
            .map_err(|e| ScrapeError::from_reqwest(url.as_str(), e))?;
        resp.text().map_err(|e| ScrapeError::from_reqwest(url.as_str(), e))
    }
}

impl JobBoard for UsaJobsBoard {
    fn search_page(&self, query: &str, page: u32) -> Result<String, ScrapeError> {
        let url = self.search_url(query, page)?;
        self.get_text(url)
    }

    fn execute_search(&self, request: &SearchRequest) -> Result<String, ScrapeError> {
        let url = self.base.join("Search/ExecuteSearch")?;
        let referer = self.search_url(&request.keyword, request.page)?;
        let origin = self.base.origin().ascii_serialization();
        debug!("POST {} (page {})", url, request.page);

        let resp = self
            .client
            .post(url.as_str())
            .header(USER_AGENT, self.random_user_agent())
            .header(ORIGIN, origin)
            .header(REFERER, referer.as_str())
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .json(request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScrapeError::from_reqwest(url.as_str(), e))?;
        resp.text().map_err(|e| ScrapeError::from_reqwest(url.as_str(), e))
    }

    fn job_detail(&self, detail_id: &str) -> Result<String, ScrapeError> {
        let url = self.detail_url(detail_id)?;
        self.get_text(url)
    }
}
