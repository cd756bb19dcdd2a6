use log::{debug, warn};
use scraper::{Html, Selector};

use crate::board::JobBoard;
use crate::error::ScrapeError;
use crate::job::{JobSummary, LocationEntry};

// Newer postings list extra sites under #additional-locations; older ones
// keep them in the intro summary.
const LOCATION_SELECTORS: [&str; 2] = [
    "#additional-locations li a",
    ".usajobs-joa-intro__summary li a",
];

/// Single GET of the posting page. Not retried.
pub fn fetch_detail<B: JobBoard + ?Sized>(board: &B, job: &JobSummary) -> Result<String, ScrapeError> {
    let detail_id = job.detail_id()?;
    debug!("Fetching details for {}", detail_id);
    board.job_detail(&detail_id)
}

pub fn extract_locations(html: &str) -> Result<Vec<LocationEntry>, ScrapeError> {
    let document = Html::parse_document(html);

    for sel_str in LOCATION_SELECTORS {
        let selector = Selector::parse(sel_str).map_err(|e| ScrapeError::Selector(e.to_string()))?;
        let mut locations = Vec::new();
        let mut matched = false;

        for element in document.select(&selector) {
            matched = true;
            let attrs = element.value();
            match (
                attrs.attr("data-name"),
                attrs.attr("data-coord-lat"),
                attrs.attr("data-coord-long"),
            ) {
                (Some(name), Some(lat), Some(lng)) => locations.push(LocationEntry {
                    name: name.to_string(),
                    lat: lat.to_string(),
                    lng: lng.to_string(),
                }),
                _ => warn!("Skipping location anchor without coordinates under '{}'", sel_str),
            }
        }

        if matched {
            return Ok(locations);
        }
    }

    Ok(Vec::new())
}

/// Attaches the detail page, and the location list for multi-location postings.
pub fn enrich<B: JobBoard + ?Sized>(board: &B, job: &mut JobSummary) -> Result<(), ScrapeError> {
    let html = fetch_detail(board, job)?;
    if job.is_multi_location() {
        let locations = extract_locations(&html)?;
        debug!("{} lists {} locations", job.title(), locations.len());
        job.set_locations(&locations);
    }
    job.set_detail_html(html);
    Ok(())
}
