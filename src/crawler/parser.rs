//! HTML parser for static club detail pages
//!
//! This module extracts the fields that are present in the server-rendered page:
//! - Full club name from the detail heading
//! - Street and "postal city-country" line from the info block
//! - Phone, email and website from the remaining info values
//! - Total membership from the summary table
//!
//! Selectors are compiled once from the configuration. Parsing happens in a plain
//! synchronous function because `scraper::Html` must not be held across awaits.

use crate::config::StaticPageConfig;
use crate::crawler::fields::{split_postal_line, ContactCandidate, ContactInfo};
use crate::record::SENTINEL;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors that make a static page unusable
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing element: {0}")]
    MissingElement(String),
}

/// Compiled selectors for the static detail page
#[derive(Debug, Clone)]
pub struct PageSelectors {
    heading: Selector,
    info_values: Selector,
    members_rows: Selector,
    cell: Selector,
    link: Selector,
    heading_source: String,
    placeholder: String,
    non_phone_prefixes: Vec<String>,
}

impl PageSelectors {
    /// Compiles the configured selectors
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidSelector` - a selector is not valid CSS
    pub fn compile(config: &StaticPageConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            heading: compile(&config.heading)?,
            info_values: compile(&config.info_values)?,
            members_rows: compile(&config.members_rows)?,
            cell: compile("td")?,
            link: compile("a")?,
            heading_source: config.heading.clone(),
            placeholder: config.placeholder.clone(),
            non_phone_prefixes: config.non_phone_prefixes.clone(),
        })
    }
}

fn compile(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector(format!("{}: {:?}", css, e)))
}

/// Fields read from the static detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFields {
    pub full_name: String,
    pub street: String,
    pub postal_code: String,
    pub city_country: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub total_members: String,
}

impl StaticFields {
    /// The `"postal city-country"` composite written to the enriched dataset
    pub fn postal_city_country(&self) -> String {
        format!("{} {}", self.postal_code, self.city_country)
    }
}

/// Extracts the static fields from a detail page
///
/// # Errors
///
/// * `ExtractError::MissingElement` - the page has no detail heading, which means
///   the page is not a club detail page at all
///
/// Every other missing piece falls back to the sentinel.
pub fn extract_static_fields(
    html: &str,
    selectors: &PageSelectors,
) -> Result<StaticFields, ExtractError> {
    let document = Html::parse_document(html);

    let heading = document
        .select(&selectors.heading)
        .next()
        .ok_or_else(|| ExtractError::MissingElement(selectors.heading_source.clone()))?;
    let full_name = joined_text(heading)
        .replace(selectors.placeholder.as_str(), "")
        .trim()
        .to_string();

    let values: Vec<ElementRef> = document.select(&selectors.info_values).collect();

    let street = values
        .first()
        .map(|dd| stripped_text(*dd))
        .unwrap_or_else(|| SENTINEL.to_string());

    let postal_line = values
        .get(1)
        .map(|dd| stripped_text(*dd))
        .unwrap_or_else(|| SENTINEL.to_string());
    let (postal_code, city_country) = split_postal_line(&postal_line);

    let candidates: Vec<ContactCandidate> = values
        .iter()
        .skip(2)
        .map(|dd| ContactCandidate {
            text: stripped_text(*dd),
            href: dd
                .select(&selectors.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(String::from),
        })
        .collect();
    let contacts = ContactInfo::collect(&candidates, &selectors.non_phone_prefixes);

    let total_members = document
        .select(&selectors.members_rows)
        .last()
        .and_then(|row| row.select(&selectors.cell).last())
        .map(stripped_text)
        .unwrap_or_else(|| SENTINEL.to_string());

    Ok(StaticFields {
        full_name,
        street,
        postal_code,
        city_country,
        phone: contacts.phone,
        email: contacts.email,
        website: contacts.website,
        total_members,
    })
}

/// Text nodes of `element`, each trimmed, concatenated without separator
fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

/// Text nodes of `element`, each trimmed, non-empty ones joined with a space
fn joined_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
