//! Chromium-backed surface driver using chromiumoxide.
//!
//! Owns the session lifecycle (launch, search navigation, teardown) and
//! implements the three listing primitives on top of in-page JavaScript.
//! All selectors live here; the acquisition engine never sees the DOM.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use crate::acquisition::types::{AcquireError, EntryHandle};
use crate::config::{AcquisitionConfig, BrowserConfig};
use crate::driver::{EntryField, SurfaceDriver};
use crate::models::{Result, SearchRequest};

/// Anchor that every result card renders for its place link.
const ENTRY_LINK_SELECTOR: &str = "a.hfpxzc";
/// The scrollable results panel.
const RESULTS_PANEL_SELECTOR: &str = "[role='main']";
/// The results panel needs a beat to hydrate after navigation.
const POST_NAVIGATION_WAIT: Duration = Duration::from_secs(3);

/// Find the Chrome/Chromium binary: env override, then config, then PATH.
pub fn find_chromium(config: &BrowserConfig) -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MAPS_SCRAPER_CHROME") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(p) = &config.binary_path {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    None
}

pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    per_op_timeout: Duration,
}

impl ChromiumDriver {
    /// Launch a Chromium instance with the anti-automation flags the
    /// listing surface expects from a regular browser.
    pub async fn launch(browser: &BrowserConfig, acquisition: &AcquisitionConfig) -> Result<Self> {
        let chrome_path = find_chromium(browser).ok_or(
            "Chrome binary not found. Set MAPS_SCRAPER_CHROME or browser.binary_path in config.yml",
        )?;
        debug!("Launching {}", chrome_path.display());

        let mut builder = ChromeConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--log-level=3");
        if browser.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let chrome_config = builder
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(chrome_config).await?;

        // Drain CDP events for the lifetime of the browser
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            per_op_timeout: Duration::from_millis(acquisition.per_op_timeout_ms),
        })
    }

    /// Navigate to the search results for this request and let the panel
    /// hydrate. Called once per run, before the engine starts.
    pub async fn open_search(&self, request: &SearchRequest, page_load_timeout: Duration) -> Result<()> {
        let url = search_url(request);
        info!("🌍 Opening search: {}", url);

        tokio::time::timeout(page_load_timeout, self.page.goto(url.as_str()))
            .await
            .map_err(|_| format!("page load timed out after {}s", page_load_timeout.as_secs()))??;
        let _ = self.page.wait_for_navigation().await;
        tokio::time::sleep(POST_NAVIGATION_WAIT).await;

        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        let _ = self.page.close().await;
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        Ok(())
    }

    /// Evaluate JS with the per-operation timeout, mapping every failure
    /// mode to `SurfaceUnavailable`.
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> std::result::Result<T, AcquireError> {
        let evaluated = tokio::time::timeout(self.per_op_timeout, self.page.evaluate(script))
            .await
            .map_err(|_| {
                AcquireError::SurfaceUnavailable(format!(
                    "driver call timed out after {}ms",
                    self.per_op_timeout.as_millis()
                ))
            })?
            .map_err(|e| AcquireError::SurfaceUnavailable(e.to_string()))?;

        evaluated
            .into_value()
            .map_err(|e| AcquireError::SurfaceUnavailable(format!("bad JS result: {e}")))
    }
}

pub fn search_url(request: &SearchRequest) -> String {
    format!(
        "https://www.google.com/maps/search/{}+in+{}/",
        request.query.trim().replace(' ', "+"),
        request.location.trim().replace(' ', "+")
    )
}

#[derive(Debug, Deserialize)]
struct FieldRead {
    #[serde(default)]
    stale: bool,
    value: Option<String>,
}

/// JS expression for one field of one card. The card is located from the
/// entry link by href, so a re-rendered list simply stops matching and the
/// read reports stale instead of returning another entry's data.
fn field_script(href: &str, field: EntryField) -> String {
    let href_json = serde_json::to_string(href).unwrap_or_else(|_| "\"\"".into());
    let field_name = match field {
        EntryField::Name => "name",
        EntryField::Address => "address",
        EntryField::Phone => "phone",
        EntryField::Website => "website",
        EntryField::RatingSummary => "rating_summary",
        EntryField::Category => "category",
        EntryField::MapUrl => "map_url",
    };
    format!(
        r#"(() => {{
  const href = {href_json};
  const link = Array.from(document.querySelectorAll("{ENTRY_LINK_SELECTOR}"))
    .find(a => a.href === href);
  if (!link) return {{ stale: true, value: null }};
  const card = link.closest("div[jsaction]") || link.parentElement;
  const pick = (sel, attr) => {{
    const el = card && card.querySelector(sel);
    if (!el) return null;
    return attr ? el.getAttribute(attr) : el.textContent;
  }};
  let value = null;
  switch ("{field_name}") {{
    case "map_url":
      value = link.href;
      break;
    case "name":
      value = link.getAttribute("aria-label");
      break;
    case "rating_summary":
      value = pick("span[role='img']", "aria-label");
      break;
    case "website": {{
      const site = card && card.querySelector("a[data-value='Website']");
      value = site ? site.href : null;
      break;
    }}
    case "category": {{
      const line = pick(".W4Efsd", null);
      value = line ? line.split("·")[0] : null;
      break;
    }}
    case "address": {{
      const line = pick(".W4Efsd", null);
      const parts = line ? line.split("·") : [];
      value = parts.length > 1 ? parts[parts.length - 1] : null;
      break;
    }}
    case "phone": {{
      const text = card ? card.textContent : "";
      const m = text.match(/\(?\+?[0-9][0-9()\-\s.]{{6,}}[0-9]/);
      value = m ? m[0] : null;
      break;
    }}
  }}
  return {{ stale: false, value: value }};
}})()"#
    )
}

#[async_trait]
impl SurfaceDriver for ChromiumDriver {
    async fn find_visible_entries(&self) -> std::result::Result<Vec<EntryHandle>, AcquireError> {
        let script = format!(
            r#"Array.from(document.querySelectorAll("{ENTRY_LINK_SELECTOR}")).map(a => a.href).filter(h => !!h)"#
        );
        let hrefs: Vec<String> = self.eval(script).await?;
        Ok(hrefs
            .iter()
            .filter_map(|href| EntryHandle::from_href(href))
            .collect())
    }

    async fn read_attribute(
        &self,
        handle: &EntryHandle,
        field: EntryField,
    ) -> std::result::Result<Option<String>, AcquireError> {
        let read: FieldRead = self.eval(field_script(&handle.href, field)).await?;
        if read.stale {
            return Err(AcquireError::StaleHandle);
        }
        Ok(read.value)
    }

    async fn trigger_reveal(&self) -> std::result::Result<(), AcquireError> {
        let script = format!(
            r#"(() => {{
  const panel = document.querySelector("{RESULTS_PANEL_SELECTOR}");
  if (!panel) return false;
  panel.scrollTop = panel.scrollHeight;
  return true;
}})()"#
        );
        let scrolled: bool = self.eval(script).await?;
        if !scrolled {
            return Err(AcquireError::SurfaceUnavailable(
                "results panel not found".to_string(),
            ));
        }
        Ok(())
    }
}
