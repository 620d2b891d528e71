//! Headless Chromium implementation of [`UiDriver`]
//!
//! All element work happens through small DOM scripts (see `script.rs`), which
//! keeps CSS, XPath and id locators on one code path. Waits are plain polls
//! against the page with a fixed interval.

use crate::browser::{script, DriverError, Lookup, NodeHandle, UiDriver};
use crate::config::{BrowserSettings, Locator};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Pause after a click that triggers a CSS animation
const ANIMATION_PAUSE: Duration = Duration::from_secs(1);

/// A single long-lived browser with one working tab
pub struct ChromiumDriver {
    browser: Browser,
    tab: Tab,
    handler_task: JoinHandle<()>,
    closed: bool,
}

/// The working tab plus its polling cadence
struct Tab {
    page: Page,
    poll_interval: Duration,
}

impl ChromiumDriver {
    /// Launches Chromium and opens the working tab
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--start-maximized");
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        tracing::info!("Started browser session");

        Ok(Self {
            browser,
            tab: Tab {
                page,
                poll_interval: Duration::from_millis(settings.poll_interval_ms),
            },
            handler_task,
            closed: false,
        })
    }
}

impl Tab {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, DriverError> {
        let result = self.page.evaluate_expression(script).await?;
        result
            .into_value::<T>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    /// Polls until a visible match of `locator` exists; returns its position
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Option<usize> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.eval::<i64>(script::first_visible(locator)).await {
                Ok(position) if position >= 0 => return Some(position as usize),
                Ok(_) => {}
                Err(e) => tracing::debug!("Visibility check for {} failed: {}", locator, e),
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Polls until `locator` is present in the document
    async fn wait_present(&self, locator: &Locator, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.eval::<bool>(script::is_present(locator)).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => tracing::debug!("Presence check for {} failed: {}", locator, e),
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Waits for `locator` to become clickable, then clicks it through the DOM
    async fn click_when_visible(&self, locator: &Locator, timeout: Duration) -> bool {
        if self.wait_visible(locator, timeout).await.is_none() {
            return false;
        }
        match self.eval::<bool>(script::click_first_visible(locator)).await {
            Ok(clicked) => clicked,
            Err(e) => {
                tracing::debug!("Click on {} failed: {}", locator, e);
                false
            }
        }
    }

    async fn first_of(&self, script: String) -> Lookup<String> {
        match self.eval::<Vec<String>>(script).await {
            Ok(values) => values.into_iter().next().into(),
            Err(e) => {
                tracing::debug!("Read failed: {}", e);
                Lookup::NotFound
            }
        }
    }
}

#[async_trait]
impl UiDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.tab.page.goto(url).await?;
        Ok(())
    }

    async fn dismiss_overlay(&mut self, overlay: &Locator, timeout: Duration) -> Lookup<()> {
        if !self.tab.click_when_visible(overlay, timeout).await {
            return Lookup::NotFound;
        }
        tokio::time::sleep(ANIMATION_PAUSE).await;
        Lookup::Found(())
    }

    async fn expand_panel(
        &mut self,
        toggle: &Locator,
        expanded_marker: &Locator,
        timeout: Duration,
    ) -> Lookup<()> {
        if !self.tab.click_when_visible(toggle, timeout).await {
            return Lookup::NotFound;
        }
        tokio::time::sleep(ANIMATION_PAUSE).await;
        self.tab
            .wait_visible(expanded_marker, timeout)
            .await
            .map(|_| ())
            .into()
    }

    async fn submit_and_wait(
        &mut self,
        control: &Locator,
        results: &Locator,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if !self.tab.click_when_visible(control, timeout).await {
            return Err(DriverError::Timeout {
                what: format!("search control {}", control),
                timeout_ms: timeout.as_millis(),
            });
        }
        if !self.tab.wait_present(results, timeout).await {
            return Err(DriverError::Timeout {
                what: format!("results {}", results),
                timeout_ms: timeout.as_millis(),
            });
        }
        Ok(())
    }

    async fn enumerate(&mut self, locator: &Locator) -> Result<Vec<NodeHandle>, DriverError> {
        let count = self.tab.eval::<usize>(script::count(None, locator)).await?;
        Ok((0..count)
            .map(|i| NodeHandle::new(locator.clone(), i))
            .collect())
    }

    async fn enumerate_within(
        &mut self,
        node: &NodeHandle,
        locator: &Locator,
    ) -> Result<Vec<NodeHandle>, DriverError> {
        let count = self.tab.eval::<usize>(script::count(Some(node), locator)).await?;
        Ok((0..count).map(|i| node.child(locator.clone(), i)).collect())
    }

    async fn click_tab_and_await_panel(
        &mut self,
        tab: &Locator,
        panel: &Locator,
        timeout: Duration,
    ) -> Lookup<NodeHandle> {
        if !self.tab.click_when_visible(tab, timeout).await {
            return Lookup::NotFound;
        }
        self.await_visible(panel, timeout).await
    }

    async fn await_visible(&mut self, panel: &Locator, timeout: Duration) -> Lookup<NodeHandle> {
        self.tab
            .wait_visible(panel, timeout)
            .await
            .map(|position| NodeHandle::new(panel.clone(), position))
            .into()
    }

    async fn read_text(&mut self, node: &NodeHandle, sub: &Locator) -> Lookup<String> {
        self.tab.first_of(script::text(node, sub)).await
    }

    async fn read_texts(&mut self, node: &NodeHandle, sub: &Locator) -> Vec<String> {
        match self.tab.eval::<Vec<String>>(script::texts(node, sub)).await {
            Ok(values) => values,
            Err(e) => {
                tracing::debug!("Reading {} failed: {}", sub, e);
                Vec::new()
            }
        }
    }

    async fn read_attribute(
        &mut self,
        node: &NodeHandle,
        sub: &Locator,
        attr: &str,
    ) -> Lookup<String> {
        self.tab.first_of(script::attribute(node, sub, attr)).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        self.handler_task.abort();
        tracing::info!("Browser session closed");
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if !self.closed {
            self.handler_task.abort();
        }
    }
}
