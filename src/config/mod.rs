pub mod schema;
pub mod settings;

pub use schema::{BrowserConfig, Config, PageLayout, SliderConfig, SliderLayout, TargetUrl};
pub use settings::{FishCount, FishSpeed, Speed, Targets, FISH_COUNTS};
