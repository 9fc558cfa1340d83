//! # fishes
//!
//! Spawn the [WebGL aquarium](https://webglsamples.org/aquarium/aquarium.html)
//! in Chrome or Firefox and tune it: fish count, overall speed, fish speed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fishes::{BrowserKind, Config, Runner, Targets};
//!
//! # #[tokio::main]
//! # async fn main() -> fishes::Result<()> {
//! let runner = Runner::launch(BrowserKind::Chrome, Config::default()).await?;
//! let report = runner.run(&Targets::default()).await?;
//! println!("Success: {}", report.success());
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
pub mod logging;
mod runner;

pub use config::{
    BrowserConfig, Config, FishCount, FishSpeed, PageLayout, SliderConfig, SliderLayout, Speed,
    TargetUrl, Targets, FISH_COUNTS,
};
pub use driver::{BrowserKind, ChromeSession, Driver, FirefoxSession, Locator, Session};
pub use runner::{set_slider, RunReport, Runner, SliderOutcome, Step, StepOutcome, StepStatus};

/// Result type for fishes operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring the aquarium.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("webdriver error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("webdriver session error: {0}")]
    WebDriverSession(#[from] fantoccini::error::NewSessionError),

    #[error("driver unavailable: {0}")]
    DriverUnavailable(String),

    #[error("unsupported browser: {0}")]
    UnsupportedBrowser(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("slider not found: {0}")]
    SliderNotFound(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("invalid slider value: {0}")]
    InvalidValue(String),

    #[error("slider did not reach {target} after {drags} drags (last read {last})")]
    SliderDidNotConverge { target: f64, last: f64, drags: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.target.url, config::schema::AQUARIUM_URL);
        assert_eq!(config.page.fish_option_prefix, "setSetting");
        assert_eq!(config.page.advanced_toggle, "setSettingAdvanced");
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_default_slider_layout() {
        let config = Config::default();
        assert_eq!(
            config.page.speed.value,
            "/html/body/div[3]/div/div[1]/div[1]/span[2]"
        );
        assert_eq!(config.page.speed.handle, "/html/body/div[3]/div/div[1]/div[2]/a");
        assert_eq!(
            config.page.fish_speed.value,
            "/html/body/div[3]/div/div[19]/div[1]/span[2]"
        );
        assert_eq!(
            config.page.fish_speed.handle,
            "/html/body/div[3]/div/div[19]/div[2]/a"
        );
    }

    #[test]
    fn test_default_slider_tuning() {
        let config = Config::default();
        assert_eq!(config.slider.tolerance, 0.2);
        assert_eq!(config.slider.gain, 15.0);
        assert_eq!(config.slider.max_iterations, 50);
        assert_eq!(config.slider.settle_ms, 0);
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
browser:
  headless: true
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  viewport:
    width: 1920
    height: 1080
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.proxy, Some("http://localhost:8080".into()));
        assert_eq!(config.browser.user_agent, Some("Custom UA".into()));
        let viewport = config.browser.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
        // Untouched sections keep their defaults.
        assert_eq!(config.target.url, config::schema::AQUARIUM_URL);
    }

    #[test]
    fn test_parse_webdriver_config() {
        let yaml = r#"
browser:
  webdriver_url: "http://127.0.0.1:4444"
  geckodriver: "/opt/geckodriver"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(
            config.browser.webdriver_url.as_deref(),
            Some("http://127.0.0.1:4444")
        );
        assert_eq!(config.browser.geckodriver.as_deref(), Some("/opt/geckodriver"));

        let result = Config::parse("browser:\n  webdriver_url: \"  \"\n");
        assert!(matches!(result, Err(Error::Config(ref s)) if s.contains("webdriver_url")));
    }

    #[test]
    fn test_parse_partial_page_layout() {
        let yaml = r#"
target:
  url: "http://localhost:8000/aquarium.html"
page:
  advanced_toggle: "advanced"
  speed:
    value: "//span[@id='speed']"
    handle: "//div[@id='speed-slider']/a"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.target.url, "http://localhost:8000/aquarium.html");
        assert_eq!(config.page.advanced_toggle, "advanced");
        assert_eq!(config.page.fish_option_prefix, "setSetting");
        assert_eq!(config.page.speed.value, "//span[@id='speed']");
        assert_eq!(
            config.page.fish_speed.handle,
            "/html/body/div[3]/div/div[19]/div[2]/a"
        );
    }

    #[test]
    fn test_parse_slider_tuning() {
        let yaml = r#"
slider:
  tolerance: 0.05
  max_iterations: 10
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.slider.tolerance, 0.05);
        assert_eq!(config.slider.max_iterations, 10);
        assert_eq!(config.slider.gain, 15.0); // default
    }

    #[test]
    fn test_validation_empty_url() {
        let yaml = r#"
target:
  url: ""
"#;
        let result = Config::parse(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("target.url"));
    }

    #[test]
    fn test_validation_relative_xpath() {
        let yaml = r#"
page:
  fish_speed:
    value: "span[2]"
    handle: "/html/body/a"
"#;
        let result = Config::parse(yaml);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("page.fish_speed.value must be an absolute XPath"));
    }

    #[test]
    fn test_validation_zero_iterations() {
        let yaml = r#"
slider:
  max_iterations: 0
"#;
        let result = Config::parse(yaml);
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_validation_non_positive_tuning() {
        assert!(Config::parse("slider:\n  tolerance: 0\n").is_err());
        assert!(Config::parse("slider:\n  gain: -15\n").is_err());
    }

    #[test]
    fn test_validation_empty_prefix() {
        let result = Config::parse("page:\n  fish_option_prefix: \"\"\n");
        assert!(result.unwrap_err().to_string().contains("fish_option_prefix"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = Config::parse("slider: [unclosed");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_load_aquarium_config() {
        let config = Config::load("configs/aquarium.yaml").unwrap();
        assert_eq!(config.target.url, config::schema::AQUARIUM_URL);
        assert_eq!(config.slider.tolerance, 0.2);
        assert_eq!(config.page.advanced_toggle, "setSettingAdvanced");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("configs/does-not-exist.yaml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
