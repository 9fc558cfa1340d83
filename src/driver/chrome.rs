//! Chrome over CDP.

use super::{Driver, Locator};
use crate::config::BrowserConfig;
use crate::{Error, Result};
use eoka::Page;
use tracing::{debug, info};

/// A running Chrome with one page.
pub struct ChromeSession {
    browser: eoka::Browser,
    page: Page,
}

impl ChromeSession {
    /// Start Chrome and open a blank page.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching Chrome (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = eoka::Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;
        info!("Chrome launched");

        Ok(Self { browser, page })
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

impl Driver for ChromeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.page.evaluate(&locator.exists_js()).await?)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("click: {}", locator);
        if let Some(selector) = locator.css() {
            if !self.exists(locator).await? {
                return Err(Error::ElementNotFound(locator.to_string()));
            }
            self.page.click(&selector).await?;
            return Ok(());
        }
        let js = format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            locator.js()
        );
        let clicked: bool = self.page.evaluate(&js).await?;
        if !clicked {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        let text: Option<String> = self.page.evaluate(&locator.text_js()).await?;
        text.ok_or_else(|| Error::ElementNotFound(locator.to_string()))
    }

    async fn drag_by(&self, locator: &Locator, dx: f64, dy: f64) -> Result<()> {
        debug!("drag: {} by ({:.1}, {:.1})", locator, dx, dy);
        let dragged: bool = self.page.evaluate(&locator.drag_js(dx, dy)).await?;
        if !dragged {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(())
    }

    async fn wait(&self, ms: u64) {
        self.page.wait(ms).await;
    }
}
