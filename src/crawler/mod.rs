//! Crawler module for the two extraction phases
//!
//! This module contains the core extraction logic, including:
//! - The listing phase, driving the search UI to build the seed list
//! - Static detail page fetching and HTML field extraction
//! - Text-level field extractors shared by both phases
//! - The detail phase, merging static and interactive fields with checkpointing

mod detail;
mod fetcher;
mod fields;
mod listing;
mod parser;

pub use detail::{
    merge_record, run_details, sample_delay, DetailCrawler, DetailReport, DynamicFields, Skip,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult, HttpFetcher, PageFetcher};
pub use fields::{
    classify_contact, parse_club_id, resolve_detail_url, split_address, split_postal_line,
    ContactCandidate, ContactField, ContactInfo,
};
pub use listing::{run_listing, ListingCrawler, ListingReport};
pub use parser::{extract_static_fields, ExtractError, PageSelectors, StaticFields};

use crate::config::Config;
use crate::HarvestError;

/// Summary of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub listing: Option<ListingReport>,
    pub details: Option<DetailReport>,
}

/// Runs the listing phase and then the detail phase
///
/// The detail phase reads the listing table back from disk, so both phases see
/// exactly what a separate `--details-only` run would.
pub async fn harvest(config: &Config) -> Result<HarvestReport, HarvestError> {
    let listing = run_listing(config).await?;
    let details = run_details(config).await?;

    Ok(HarvestReport {
        listing: Some(listing),
        details: Some(details),
    })
}
