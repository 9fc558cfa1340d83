//! Browser sessions and the element primitives the runner needs.
//!
//! Chrome is driven over CDP through `eoka`, Firefox over WebDriver through
//! `fantoccini` and geckodriver. Everything above this module talks to the
//! [`Driver`] trait, so the slider loop can run against an in-memory page in
//! tests.

mod chrome;
mod firefox;

pub use chrome::ChromeSession;
pub use firefox::FirefoxSession;

use crate::config::BrowserConfig;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Browser to automate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl BrowserKind {
    pub const ALL: [BrowserKind; 2] = [BrowserKind::Chrome, BrowserKind::Firefox];

    /// Protocol used to drive this browser.
    pub fn protocol(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "CDP",
            BrowserKind::Firefox => "WebDriver",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserKind::Chrome => f.write_str("Chrome"),
            BrowserKind::Firefox => f.write_str("Firefox"),
        }
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BrowserKind::ALL
            .into_iter()
            .find(|b| b.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::UnsupportedBrowser(format!("'{}' (options: Chrome, Firefox)", s))
            })
    }
}

/// How to find an element: by `id` or by absolute XPath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    XPath(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }

    /// CSS selector, when one exists for this locator.
    pub fn css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("#{}", id)),
            Locator::XPath(_) => None,
        }
    }

    /// JS expression evaluating to the element or `null`.
    pub fn js(&self) -> String {
        match self {
            Locator::Id(id) => format!("document.getElementById({})", js_string(id)),
            Locator::XPath(path) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(path)
            ),
        }
    }

    /// JS expression: whether the element exists.
    fn exists_js(&self) -> String {
        format!("!!({})", self.js())
    }

    /// JS expression: trimmed visible text, or `null` when missing.
    fn text_js(&self) -> String {
        format!(
            "(() => {{ const el = {}; return el ? (el.innerText ?? el.textContent ?? '').trim() : null; }})()",
            self.js()
        )
    }

    /// JS expression: drag the element by `(dx, dy)`; `false` when missing.
    fn drag_js(&self, dx: f64, dy: f64) -> String {
        let arg = serde_json::json!({ "dx": dx, "dy": dy, "steps": DRAG_STEPS });
        DRAG_JS
            .replace("__ELEMENT__", &self.js())
            .replace("__ARG__", &arg.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::XPath(path) => f.write_str(path),
        }
    }
}

/// Quote a string as a JS literal.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Number of intermediate mouse moves per drag.
const DRAG_STEPS: u32 = 5;

/// Mouse-driven drag. jQuery UI sliders listen for mousedown on the handle
/// and mousemove/mouseup on the document.
const DRAG_JS: &str = r#"(() => {
    const el = __ELEMENT__;
    if (!el) return false;
    const arg = __ARG__;
    const doc = el.ownerDocument;
    const rect = el.getBoundingClientRect();
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    const fire = (target, type, cx, cy, buttons) => target.dispatchEvent(new MouseEvent(type, {
        bubbles: true, cancelable: true, view: window,
        clientX: cx, clientY: cy, screenX: cx, screenY: cy,
        button: 0, buttons: buttons,
    }));
    fire(el, 'mouseover', x, y, 0);
    fire(el, 'mousedown', x, y, 1);
    for (let i = 1; i <= arg.steps; i++) {
        fire(doc, 'mousemove', x + arg.dx * i / arg.steps, y + arg.dy * i / arg.steps, 1);
    }
    fire(doc, 'mouseup', x + arg.dx, y + arg.dy, 0);
    return true;
})()"#;

/// Element operations against a loaded page.
#[allow(async_fn_in_trait)]
pub trait Driver {
    /// Navigate to a URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Whether the element is present.
    async fn exists(&self, locator: &Locator) -> Result<bool>;

    /// Click the element.
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Visible text of the element, trimmed.
    async fn text(&self, locator: &Locator) -> Result<String>;

    /// Press on the element's centre, move by `(dx, dy)` pixels, release.
    async fn drag_by(&self, locator: &Locator, dx: f64, dy: f64) -> Result<()>;

    /// Pause for `ms` milliseconds.
    async fn wait(&self, ms: u64);
}

/// A running browser of either kind.
pub enum Session {
    Chrome(ChromeSession),
    Firefox(FirefoxSession),
}

impl Session {
    /// Start a browser session for `kind`.
    pub async fn launch(kind: BrowserKind, config: &BrowserConfig) -> Result<Self> {
        match kind {
            BrowserKind::Chrome => Ok(Session::Chrome(ChromeSession::launch(config).await?)),
            BrowserKind::Firefox => Ok(Session::Firefox(FirefoxSession::launch(config).await?)),
        }
    }

    pub fn kind(&self) -> BrowserKind {
        match self {
            Session::Chrome(_) => BrowserKind::Chrome,
            Session::Firefox(_) => BrowserKind::Firefox,
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        match self {
            Session::Chrome(s) => s.close().await,
            Session::Firefox(s) => s.close().await,
        }
    }
}

impl Driver for Session {
    async fn goto(&self, url: &str) -> Result<()> {
        match self {
            Session::Chrome(s) => s.goto(url).await,
            Session::Firefox(s) => s.goto(url).await,
        }
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        match self {
            Session::Chrome(s) => s.exists(locator).await,
            Session::Firefox(s) => s.exists(locator).await,
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        match self {
            Session::Chrome(s) => s.click(locator).await,
            Session::Firefox(s) => s.click(locator).await,
        }
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        match self {
            Session::Chrome(s) => s.text(locator).await,
            Session::Firefox(s) => s.text(locator).await,
        }
    }

    async fn drag_by(&self, locator: &Locator, dx: f64, dy: f64) -> Result<()> {
        match self {
            Session::Chrome(s) => s.drag_by(locator, dx, dy).await,
            Session::Firefox(s) => s.drag_by(locator, dx, dy).await,
        }
    }

    async fn wait(&self, ms: u64) {
        match self {
            Session::Chrome(s) => s.wait(ms).await,
            Session::Firefox(s) => s.wait(ms).await,
        }
    }
}
