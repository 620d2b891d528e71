//! Detail phase: seed dataset to enriched dataset
//!
//! For every seed, the static page is fetched and parsed, then the same URL is
//! opened in the browser session to read the tabbed panels that only render on
//! the client. Both halves are merged with the seed's preview fields into one
//! [`EntityDetail`] and handed to the [`CheckpointWriter`].
//!
//! Failures are contained per seed. A failed fetch or a page without a heading
//! skips the seed; a missing tab or panel only degrades the affected fields.

use crate::browser::{ChromiumDriver, Lookup, UiDriver};
use crate::config::{Config, DelayRange};
use crate::crawler::fetcher::{FetchResult, HttpFetcher, PageFetcher};
use crate::crawler::parser::{extract_static_fields, PageSelectors, StaticFields};
use crate::logging::log_separator;
use crate::output::{read_table, CheckpointWriter};
use crate::record::{pad_installations, Entity, EntityDetail, PostalCode, SENTINEL};
use crate::HarvestError;
use futures::FutureExt;
use rand::Rng;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::Duration;

/// A seed that produced no output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub index: u32,
    pub url: String,
    pub reason: String,
}

/// Outcome of a detail run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailReport {
    /// Seeds read from the listing table
    pub seeds: usize,

    /// Rows written to the enriched table
    pub written: usize,

    /// Seeds whose static page could not be fetched
    pub fetch_skips: Vec<Skip>,

    /// Seeds whose processing failed after a successful fetch
    pub failures: Vec<Skip>,
}

/// Fields read through the browser session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFields {
    pub installations: Vec<String>,
    pub president: String,
}

impl Default for DynamicFields {
    fn default() -> Self {
        Self {
            installations: Vec::new(),
            president: SENTINEL.to_string(),
        }
    }
}

enum EntityOutcome {
    Enriched(Box<EntityDetail>),
    Skipped { reason: String },
}

/// Orchestrates the static fetcher and the UI driver over the seed list
pub struct DetailCrawler<'a, F, D> {
    config: &'a Config,
    selectors: PageSelectors,
    fetcher: F,
    driver: D,
}

impl<'a, F, D> DetailCrawler<'a, F, D>
where
    F: PageFetcher,
    D: UiDriver,
{
    pub fn new(config: &'a Config, selectors: PageSelectors, fetcher: F, driver: D) -> Self {
        Self {
            config,
            selectors,
            fetcher,
            driver,
        }
    }

    /// Hands back the fetcher and the driver
    pub fn into_parts(self) -> (F, D) {
        (self.fetcher, self.driver)
    }

    /// Processes every seed in order and writes the enriched table
    ///
    /// The browser session is closed once the loop ends, even when the final
    /// write fails.
    ///
    /// # Errors
    ///
    /// Only a failure to write the final table is returned. Everything scoped to a
    /// single seed is logged and recorded in the report instead.
    pub async fn run(&mut self, seeds: &[Entity]) -> Result<DetailReport, HarvestError> {
        log_separator();
        tracing::info!("Start extracting clubs info");
        tracing::info!("Found {} club URLs to extract", seeds.len());

        let mut writer = CheckpointWriter::for_details(&self.config.output);
        let mut report = DetailReport {
            seeds: seeds.len(),
            ..DetailReport::default()
        };

        for (position, seed) in seeds.iter().enumerate() {
            tracing::info!(
                "Extracting club [{}/{}] info, url: {}",
                position + 1,
                seeds.len(),
                seed.url
            );

            let outcome = AssertUnwindSafe(self.process_entity(position, seed))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(EntityOutcome::Enriched(detail))) => {
                    writer.push(*detail);
                    tracing::info!("Extraction successful");
                    if let Err(e) = writer.checkpoint(position + 1) {
                        tracing::error!("Failed to save partial snapshot: {}", e);
                    }
                }
                Ok(Ok(EntityOutcome::Skipped { reason })) => {
                    report.fetch_skips.push(skip(seed, reason));
                }
                Ok(Err(e)) => {
                    tracing::error!("Error scraping {}: {}", seed.url, e);
                    report.failures.push(skip(seed, e.to_string()));
                }
                Err(_) => {
                    let e = HarvestError::Panicked {
                        url: seed.url.clone(),
                    };
                    tracing::error!("Error scraping {}: {}", seed.url, e);
                    report.failures.push(skip(seed, e.to_string()));
                }
            }
        }

        let finished = writer.finish();
        self.driver.close().await;
        report.written = finished?.len();
        tracing::info!(
            "Detail phase finished: {} of {} clubs written, {} fetch failures, {} errors",
            report.written,
            report.seeds,
            report.fetch_skips.len(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn process_entity(
        &mut self,
        position: usize,
        seed: &Entity,
    ) -> Result<EntityOutcome, HarvestError> {
        let body = match self.fetcher.fetch(&seed.url).await {
            FetchResult::Success { body, .. } => body,
            failed => {
                let reason = failed.failure_reason().unwrap_or_default();
                tracing::warn!("Failed to fetch {}: {}", seed.url, reason);
                return Ok(EntityOutcome::Skipped { reason });
            }
        };

        let fields = extract_static_fields(&body, &self.selectors)?;
        tracing::info!("Static page extraction successful");

        let dynamic = self.collect_dynamic(position, &seed.url).await;
        Ok(EntityOutcome::Enriched(Box::new(merge_record(
            seed, fields, dynamic,
        ))))
    }

    async fn collect_dynamic(&mut self, position: usize, url: &str) -> DynamicFields {
        let config = self.config;
        let timeout = Duration::from_secs(config.browser.wait_timeout_secs);

        if let Err(e) = self.driver.navigate(url).await {
            tracing::error!("Browser error for {}: {}", url, e);
            return DynamicFields::default();
        }

        pause(config.browser.settle_delay).await;
        tracing::info!("Start browser session for dynamic content");

        if position == 0 || config.browser.dismiss_overlay_every_entity {
            match self
                .driver
                .dismiss_overlay(&config.selectors.popup, timeout)
                .await
            {
                Lookup::Found(()) => tracing::info!("Popup closed successfully"),
                Lookup::NotFound => tracing::info!("No registration popup found"),
            }
        }

        pause(config.browser.installation_delay).await;
        let installations = self.collect_installations(timeout).await;

        pause(config.browser.committee_delay).await;
        let president = self.read_president(timeout).await;

        DynamicFields {
            installations,
            president,
        }
    }

    async fn collect_installations(&mut self, timeout: Duration) -> Vec<String> {
        let selectors = &self.config.selectors;

        let panel = match self
            .driver
            .click_tab_and_await_panel(
                &selectors.installation_tab,
                &selectors.installation_panel,
                timeout,
            )
            .await
        {
            Lookup::Found(panel) => panel,
            Lookup::NotFound => {
                tracing::error!("Could not open installation tab");
                return Vec::new();
            }
        };
        tracing::info!("Clicked installation tab");

        let blocks = match self
            .driver
            .enumerate_within(&panel, &selectors.installation_block)
            .await
        {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::error!("Could not list installations: {}", e);
                return Vec::new();
            }
        };

        let mut installations = Vec::new();
        for block in &blocks {
            let values = self
                .driver
                .read_texts(block, &selectors.installation_value)
                .await;
            if let Some(first) = values
                .into_iter()
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
            {
                installations.push(first);
            }
        }
        installations
    }

    async fn read_president(&mut self, timeout: Duration) -> String {
        let selectors = &self.config.selectors;

        let opened = self
            .driver
            .click_tab_and_await_panel(
                &selectors.committee_tab,
                &selectors.committee_panel,
                timeout,
            )
            .await;
        if !opened.is_found() {
            tracing::error!("Could not open committee tab");
            return SENTINEL.to_string();
        }
        tracing::info!("Clicked committee tab");

        let panel = match self
            .driver
            .await_visible(&selectors.president_panel, timeout)
            .await
        {
            Lookup::Found(panel) => panel,
            Lookup::NotFound => {
                tracing::warn!("President panel not visible");
                return SENTINEL.to_string();
            }
        };

        match self
            .driver
            .read_text(&panel, &selectors.president_name)
            .await
        {
            Lookup::Found(name) if !name.is_empty() => name,
            _ => {
                tracing::warn!("President name not found");
                SENTINEL.to_string()
            }
        }
    }
}

fn skip(seed: &Entity, reason: String) -> Skip {
    Skip {
        index: seed.index,
        url: seed.url.clone(),
        reason,
    }
}

/// Combines the seed previews with the static and dynamic fields
pub fn merge_record(seed: &Entity, fields: StaticFields, dynamic: DynamicFields) -> EntityDetail {
    EntityDetail {
        index: seed.index,
        club_id: seed.id.clone(),
        name_preview: seed.name.clone(),
        postal_code_preview: PostalCode::normalize(&seed.postal_code),
        city_preview: seed.city.clone(),
        facility_summary_preview: seed.facility_summary.clone(),
        detail_url: seed.url.clone(),
        image_url_preview: seed.image_url.clone(),
        postal_city_country: fields.postal_city_country(),
        full_name: fields.full_name,
        street: fields.street,
        phone: fields.phone,
        website: fields.website,
        email: fields.email,
        total_members: fields.total_members,
        installations: pad_installations(dynamic.installations),
        president: dynamic.president,
    }
}

/// Draws a pause length uniformly from `range`
pub fn sample_delay(range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
        return Duration::from_millis(range.min_ms);
    }
    Duration::from_millis(rand::rng().random_range(range.min_ms..=range.max_ms))
}

async fn pause(range: DelayRange) {
    let delay = sample_delay(range);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Reads the listing table, then runs the detail phase with a fresh browser session
///
/// # Errors
///
/// * `HarvestError::MissingColumn` - the listing table has no `url` column
/// * `HarvestError::Driver` - the browser could not be started
/// * `HarvestError::Io` / `HarvestError::Csv` - a table could not be read or written
pub async fn run_details(config: &Config) -> Result<DetailReport, HarvestError> {
    let path = Path::new(&config.output.listing_path);
    let seeds: Vec<Entity> = read_table(path, config.output.delimiter, &["url"])?;
    tracing::info!("Read file: {}", path.display());

    let selectors = PageSelectors::compile(&config.static_page)?;
    let fetcher = HttpFetcher::new(&config.http)?;
    let driver = ChromiumDriver::launch(&config.browser).await?;

    DetailCrawler::new(config, selectors, fetcher, driver)
        .run(&seeds)
        .await
}
