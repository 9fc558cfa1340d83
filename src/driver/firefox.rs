//! Firefox over WebDriver, through geckodriver.

use super::{Driver, Locator};
use crate::config::BrowserConfig;
use crate::{Error, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Binary spawned when `browser.geckodriver` is not set.
const GECKODRIVER: &str = "geckodriver";

/// Connection attempts while geckodriver starts up.
const CONNECT_ATTEMPTS: u32 = 40;
const CONNECT_INTERVAL_MS: u64 = 250;

/// A running Firefox with one window.
pub struct FirefoxSession {
    client: Client,
    /// Spawned geckodriver, if we own one.
    geckodriver: Option<Child>,
}

impl FirefoxSession {
    /// Start Firefox. Connects to `browser.webdriver_url` when set,
    /// otherwise spawns geckodriver on a free local port.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let (url, mut geckodriver) = match &config.webdriver_url {
            Some(url) => (url.clone(), None),
            None => {
                let (url, child) = spawn_geckodriver(config)?;
                (url, Some(child))
            }
        };

        debug!(
            "Launching Firefox via {} (headless: {}, proxy: {:?})",
            url, config.headless, config.proxy
        );
        let client = connect(&url, capabilities(config), geckodriver.as_mut()).await?;
        info!("Firefox launched");

        Ok(Self {
            client,
            geckodriver,
        })
    }

    /// End the WebDriver session and stop geckodriver.
    pub async fn close(self) -> Result<()> {
        let closed = self.client.close().await;
        if let Some(mut child) = self.geckodriver {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop geckodriver: {}", e);
            }
        }
        closed?;
        Ok(())
    }

    async fn script<T: serde::de::DeserializeOwned>(&self, expr: &str) -> Result<T> {
        let value = self
            .client
            .execute(&format!("return {};", expr), vec![])
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Session capabilities for the browser config.
fn capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let mut args = Vec::new();
    if config.headless {
        args.push("-headless".to_string());
    }
    if let Some(v) = &config.viewport {
        args.extend([
            "-width".to_string(),
            v.width.to_string(),
            "-height".to_string(),
            v.height.to_string(),
        ]);
    }

    let mut prefs = Map::new();
    if let Some(ua) = &config.user_agent {
        prefs.insert("general.useragent.override".into(), Value::from(ua.as_str()));
    }

    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("firefox"));
    caps.insert(
        "moz:firefoxOptions".into(),
        json!({ "args": args, "prefs": prefs }),
    );
    if let Some(proxy) = &config.proxy {
        let host = proxy_host(proxy);
        caps.insert(
            "proxy".into(),
            json!({ "proxyType": "manual", "httpProxy": host, "sslProxy": host }),
        );
    }
    caps
}

/// `host:port` part of a proxy URL. WebDriver takes no scheme or credentials.
fn proxy_host(proxy: &str) -> &str {
    let rest = proxy.split_once("://").map_or(proxy, |(_, rest)| rest);
    let rest = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
    rest.trim_end_matches('/')
}

fn spawn_geckodriver(config: &BrowserConfig) -> Result<(String, Child)> {
    let bin = config.geckodriver.as_deref().unwrap_or(GECKODRIVER);
    let port = std::net::TcpListener::bind("127.0.0.1:0")?
        .local_addr()?
        .port();

    debug!("Spawning {} on port {}", bin, port);
    let child = Command::new(bin)
        .arg("--port")
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::DriverUnavailable(format!("cannot start {}: {}", bin, e)))?;

    Ok((format!("http://127.0.0.1:{}", port), child))
}

async fn connect(
    url: &str,
    caps: Map<String, Value>,
    mut geckodriver: Option<&mut Child>,
) -> Result<Client> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match ClientBuilder::native()
            .capabilities(caps.clone())
            .connect(url)
            .await
        {
            Ok(client) => return Ok(client),
            Err(e) if attempt >= CONNECT_ATTEMPTS => return Err(e.into()),
            Err(e) => debug!("WebDriver not ready (attempt {}): {}", attempt, e),
        }

        if let Some(child) = geckodriver.as_deref_mut() {
            if let Some(status) = child.try_wait()? {
                return Err(Error::DriverUnavailable(format!(
                    "geckodriver exited with {}",
                    status
                )));
            }
        }
        tokio::time::sleep(Duration::from_millis(CONNECT_INTERVAL_MS)).await;
    }
}

impl Driver for FirefoxSession {
    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        self.script(&locator.exists_js()).await
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("click: {}", locator);
        if !self.exists(locator).await? {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        let element = match locator {
            Locator::Id(id) => self.client.find(fantoccini::Locator::Id(id)).await?,
            Locator::XPath(path) => self.client.find(fantoccini::Locator::XPath(path)).await?,
        };
        element.click().await?;
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        let text: Option<String> = self.script(&locator.text_js()).await?;
        text.ok_or_else(|| Error::ElementNotFound(locator.to_string()))
    }

    async fn drag_by(&self, locator: &Locator, dx: f64, dy: f64) -> Result<()> {
        debug!("drag: {} by ({:.1}, {:.1})", locator, dx, dy);
        let dragged: bool = self.script(&locator.drag_js(dx, dy)).await?;
        if !dragged {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(())
    }

    async fn wait(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
