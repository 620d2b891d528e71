//! Interactive UI driver
//!
//! The crawlers talk to the live site only through the [`UiDriver`] trait, so
//! they can be exercised against in-memory fakes. [`ChromiumDriver`] is the
//! production implementation backed by a headless Chromium session.
//!
//! Optional interactions return [`Lookup`] instead of an error: a missing
//! popup or panel degrades a single field rather than aborting the batch.
//! Only navigation, search submission and enumeration report hard errors.

mod chromium;
mod script;

pub use chromium::ChromiumDriver;

use crate::config::Locator;
use crate::record::SENTINEL;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the browser session
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("Unexpected script result: {0}")]
    Script(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u128 },
}

/// Outcome of a best-effort lookup or interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}

impl Lookup<String> {
    /// Returns the value, or the sentinel when nothing was found
    pub fn or_sentinel(self) -> String {
        match self {
            Lookup::Found(value) => value,
            Lookup::NotFound => SENTINEL.to_string(),
        }
    }
}

/// Opaque reference to an element of the live page
///
/// Handles are paths of `(locator, position)` steps resolved from the document
/// root on every use, so they survive re-renders that keep the structure intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    steps: Vec<(Locator, usize)>,
}

impl NodeHandle {
    /// The `position`-th match of `locator` in the document
    pub fn new(locator: Locator, position: usize) -> Self {
        Self {
            steps: vec![(locator, position)],
        }
    }

    /// The `position`-th match of `locator` inside this node
    pub fn child(&self, locator: Locator, position: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push((locator, position));
        Self { steps }
    }

    pub fn steps(&self) -> &[(Locator, usize)] {
        &self.steps
    }

    /// Position of this node among its siblings
    pub fn position(&self) -> usize {
        self.steps.last().map(|(_, p)| *p).unwrap_or_default()
    }
}

/// Operations the crawlers need from an interactive browser session
#[async_trait]
pub trait UiDriver: Send {
    /// Loads `url` in the session's single tab
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Clicks the overlay's close control if it shows up within `timeout`
    async fn dismiss_overlay(&mut self, overlay: &Locator, timeout: Duration) -> Lookup<()>;

    /// Clicks `toggle`, then waits for `expanded_marker` to become visible
    async fn expand_panel(
        &mut self,
        toggle: &Locator,
        expanded_marker: &Locator,
        timeout: Duration,
    ) -> Lookup<()>;

    /// Clicks `control` and blocks until `results` is present
    ///
    /// Unlike the other interactions this one is not best-effort.
    async fn submit_and_wait(
        &mut self,
        control: &Locator,
        results: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// All current matches of `locator`, in document order
    async fn enumerate(&mut self, locator: &Locator) -> Result<Vec<NodeHandle>, DriverError>;

    /// All matches of `locator` inside `node`, in document order
    async fn enumerate_within(
        &mut self,
        node: &NodeHandle,
        locator: &Locator,
    ) -> Result<Vec<NodeHandle>, DriverError>;

    /// Clicks `tab` and waits for `panel` to become visible
    async fn click_tab_and_await_panel(
        &mut self,
        tab: &Locator,
        panel: &Locator,
        timeout: Duration,
    ) -> Lookup<NodeHandle>;

    /// Waits for `panel` to become visible without clicking anything
    async fn await_visible(&mut self, panel: &Locator, timeout: Duration) -> Lookup<NodeHandle>;

    /// Trimmed text of the first `sub` match inside `node`
    async fn read_text(&mut self, node: &NodeHandle, sub: &Locator) -> Lookup<String>;

    /// Trimmed text of every `sub` match inside `node`, in document order
    async fn read_texts(&mut self, node: &NodeHandle, sub: &Locator) -> Vec<String>;

    /// Attribute `attr` of the first `sub` match inside `node`
    async fn read_attribute(
        &mut self,
        node: &NodeHandle,
        sub: &Locator,
        attr: &str,
    ) -> Lookup<String>;

    /// Ends the session
    async fn close(&mut self);
}
