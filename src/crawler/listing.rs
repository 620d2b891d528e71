//! Listing phase: search page to seed dataset
//!
//! Drives the search UI, enumerates the result nodes and writes one [`Entity`]
//! per node to the listing table.

use crate::browser::{ChromiumDriver, Lookup, NodeHandle, UiDriver};
use crate::config::Config;
use crate::crawler::fields::{parse_club_id, resolve_detail_url, split_address};
use crate::logging::log_separator;
use crate::output::write_table;
use crate::record::{Entity, SENTINEL};
use crate::HarvestError;
use std::path::Path;
use std::time::Duration;

/// Outcome of a listing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReport {
    /// Seeds written to the listing table, in discovery order
    pub entities: Vec<Entity>,

    /// Result nodes on the search page
    pub nodes_found: usize,

    /// 1-based positions of nodes that could not be parsed
    pub skipped: Vec<usize>,
}

/// Orchestrates the UI driver against the search page
pub struct ListingCrawler<'a> {
    config: &'a Config,
}

impl<'a> ListingCrawler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.browser.wait_timeout_secs)
    }

    /// Runs the listing phase against `driver`
    ///
    /// # Errors
    ///
    /// Fatal conditions only: the search page does not load, the search never
    /// produces results, the results cannot be enumerated, or the listing table
    /// cannot be written. Per-node problems are logged and skipped.
    pub async fn run<D>(&self, driver: &mut D) -> Result<ListingReport, HarvestError>
    where
        D: UiDriver + ?Sized,
    {
        let search_url = &self.config.site.search_url;
        let selectors = &self.config.selectors;
        let timeout = self.timeout();

        log_separator();
        tracing::info!("URL: {}", search_url);

        driver.navigate(search_url).await?;
        tracing::info!("Search page loaded");

        match driver.dismiss_overlay(&selectors.popup, timeout).await {
            Lookup::Found(()) => tracing::info!("Popup closed successfully"),
            Lookup::NotFound => tracing::info!("No registration popup found"),
        }

        tracing::info!("Trying to open search panel...");
        match driver
            .expand_panel(
                &selectors.search_toggle,
                &selectors.expanded_search_panel,
                timeout,
            )
            .await
        {
            Lookup::Found(()) => tracing::info!("Search panel expanded successfully"),
            Lookup::NotFound => tracing::warn!("Failed to expand search panel"),
        }

        driver
            .submit_and_wait(&selectors.submit_button, &selectors.results, timeout)
            .await?;

        let nodes = driver.enumerate(&selectors.results).await?;
        let total = nodes.len();
        tracing::info!("Found {} clubs", total);

        let mut entities = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (position, node) in nodes.iter().enumerate() {
            tracing::info!("Extraction [{}/{}]", position + 1, total);

            let index = if self.config.listing.renumber_on_skip {
                entities.len() + 1
            } else {
                position + 1
            };

            match self.read_entity(driver, node, index as u32).await {
                Ok(entity) => entities.push(entity),
                Err(reason) => {
                    tracing::warn!("Error parsing club {}: {}", position + 1, reason);
                    skipped.push(position + 1);
                }
            }
        }

        let path = Path::new(&self.config.output.listing_path);
        write_table(path, self.config.output.delimiter, &entities)?;
        tracing::info!("Saved {} total records to {}", entities.len(), path.display());

        Ok(ListingReport {
            entities,
            nodes_found: total,
            skipped,
        })
    }

    /// Reads one result node; `Err` carries the reason the node was skipped
    async fn read_entity<D>(
        &self,
        driver: &mut D,
        node: &NodeHandle,
        index: u32,
    ) -> Result<Entity, String>
    where
        D: UiDriver + ?Sized,
    {
        let selectors = &self.config.selectors;

        let name = driver
            .read_text(node, &selectors.name_link)
            .await
            .found()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("no name at {}", selectors.name_link))?;

        let path = driver
            .read_attribute(node, &selectors.name_link, &selectors.detail_url_attribute)
            .await
            .found()
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| format!("no {} attribute on {}", selectors.detail_url_attribute, name))?;

        let summary = driver.read_texts(node, &selectors.summary_fields).await;
        let image_url = driver
            .read_attribute(node, &selectors.image, "src")
            .await
            .or_sentinel();

        Ok(assemble_entity(
            index,
            name,
            resolve_detail_url(&self.config.site.base_url, &path),
            &summary,
            image_url,
        ))
    }
}

/// Builds a seed from the values read off one result node
///
/// `summary` holds the node's definition values: position 1 is the address
/// block, position 2 the optional facility summary.
fn assemble_entity(
    index: u32,
    name: String,
    url: String,
    summary: &[String],
    image_url: String,
) -> Entity {
    let value_at = |i: usize| {
        summary
            .get(i)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| SENTINEL.to_string())
    };

    let street_address = value_at(1);
    let (postal_code, city) = split_address(&street_address);

    Entity {
        index,
        id: parse_club_id(&name),
        name,
        url,
        street_address,
        postal_code,
        city,
        facility_summary: value_at(2),
        image_url,
    }
}

/// Launches a browser session and runs the listing phase with it
///
/// The session is closed whether or not the run succeeds.
pub async fn run_listing(config: &Config) -> Result<ListingReport, HarvestError> {
    let mut driver = ChromiumDriver::launch(&config.browser).await?;
    let result = ListingCrawler::new(config).run(&mut driver).await;
    driver.close().await;

    if let Ok(report) = &result {
        tracing::info!(
            "Listing finished: {} of {} clubs written, {} skipped",
            report.entities.len(),
            report.nodes_found,
            report.skipped.len()
        );
    }
    result
}
