// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser session lifecycle and selector waits.
//!
//! One headless Chromium process serves all trials for a single target;
//! pages are cheap, browser launches are not. Pages come up with the HTTP
//! cache disabled and the Network domain enabled so that trial measurements
//! never see cross-trial contamination.

use crate::error::{HarnessError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetCacheDisabledParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use routebench_core::Timeouts;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Extra headroom on the DevTools request timeout over the longest in-page
/// wait, so a CDP call never times out underneath a bounded measurement.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// A headless Chromium process owned by one target's measurement session.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a headless browser configured for quiet, repeatable runs.
    pub async fn launch(timeouts: &Timeouts) -> Result<Self> {
        let request_timeout = timeouts
            .navigation()
            .max(Duration::from_millis(timeouts.paint_ms))
            + REQUEST_TIMEOUT_MARGIN;
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .request_timeout(request_timeout)
            .arg("--disable-background-networking")
            .arg("--disable-component-update")
            .arg("--disable-default-apps")
            .arg("--disable-sync")
            .arg("--metrics-recording-only")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .build()
            .map_err(HarnessError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        debug!("browser launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a fresh page with the cache disabled and network events enabled.
    pub async fn new_page(&self) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(EnableParams::default()).await?;
        page.execute(SetCacheDisabledParams::new(true)).await?;
        Ok(page)
    }

    /// Close the browser process and reap its event handler.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler_task).await;
        debug!("browser closed");
        Ok(())
    }
}

/// Poll until `selector` is present and has a non-empty bounding box.
///
/// Presence alone is not enough: frameworks mount placeholders before data
/// arrives, so the wait requires layout to have produced visible geometry.
pub async fn wait_for_visible(
    page: &Page,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let script = visibility_script(selector);
    let started = Instant::now();
    loop {
        let visible = page
            .evaluate(script.clone())
            .await?
            .into_value::<bool>()
            .unwrap_or(false);
        if visible {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(HarnessError::SelectorTimeout {
                selector: selector.to_string(),
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Build the visibility probe with the selector embedded as a JSON literal.
fn visibility_script(selector: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into());
    format!(
        "(() => {{ const el = document.querySelector({literal}); \
         if (!el) return false; \
         const rect = el.getBoundingClientRect(); \
         return rect.width > 0 && rect.height > 0; }})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_script_escapes_selector() {
        let script = visibility_script("a[href='/posts\"]");
        assert!(script.contains("querySelector(\"a[href='/posts\\\"]\")"));
    }

    #[test]
    fn test_visibility_script_checks_geometry() {
        let script = visibility_script(".post-list");
        assert!(script.contains("getBoundingClientRect"));
        assert!(script.contains("rect.width > 0"));
    }
}
