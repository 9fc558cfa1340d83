mod slider;

pub use slider::{set_slider, SliderOutcome};

use crate::config::{Config, SliderLayout, Targets};
use crate::driver::{BrowserKind, Driver, Session};
use crate::{Error, Result};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info};

/// A configuration step after the page has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FishCount,
    AdvancedSettings,
    Speed,
    FishSpeed,
}

impl Step {
    /// What the step was doing, for "There was an error ..." messages.
    pub fn activity(self) -> &'static str {
        match self {
            Step::FishCount => "setting the fish number",
            Step::AdvancedSettings => "opening the advanced settings",
            Step::Speed => "setting the speed",
            Step::FishSpeed => "setting the fish speed",
        }
    }

    /// What a failed element lookup was after, for steps that look one up.
    pub fn lookup(self) -> Option<&'static str> {
        match self {
            Step::Speed => Some("getting the speed slider"),
            Step::FishSpeed => Some("getting the fish speed slider"),
            Step::FishCount | Step::AdvancedSettings => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::FishCount => "fish_count",
            Step::AdvancedSettings => "advanced_settings",
            Step::Speed => "speed",
            Step::FishSpeed => "fish_speed",
        };
        f.write_str(name)
    }
}

/// How a step went.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Done,
    Failed(String),
    /// The step's slider was not on the page.
    NotFound(String),
    /// Not attempted because an earlier step it depends on failed.
    Skipped,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Done
    }

    /// What went wrong, as "There was an error ..." wording.
    pub fn failure(&self) -> Option<&'static str> {
        match self.status {
            StepStatus::Failed(_) => Some(self.step.activity()),
            StepStatus::NotFound(_) => Some(self.step.lookup().unwrap_or(self.step.activity())),
            StepStatus::Done | StepStatus::Skipped => None,
        }
    }
}

/// Result of configuring the page.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Per-step outcomes, in execution order.
    pub steps: Vec<StepOutcome>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Whether every step succeeded.
    pub fn success(&self) -> bool {
        self.steps.iter().all(StepOutcome::succeeded)
    }

    pub fn get(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|o| o.step == step)
    }
}

/// Drives the aquarium settings panel.
pub struct Runner<D> {
    driver: D,
    config: Config,
}

impl Runner<Session> {
    /// Launch a browser for this config.
    pub async fn launch(kind: BrowserKind, config: Config) -> Result<Self> {
        let session = Session::launch(kind, &config.browser).await?;
        Ok(Self::new(session, config))
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.driver.close().await
    }
}

impl<D: Driver> Runner<D> {
    pub fn new(driver: D, config: Config) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the target page.
    pub async fn navigate(&self) -> Result<()> {
        self.driver.goto(&self.config.target.url).await
    }

    /// Apply the targets. Each step is attempted even if an earlier one
    /// failed, except the sliders, which need the advanced panel open.
    pub async fn configure(&self, targets: &Targets) -> RunReport {
        self.configure_with(targets, |_| {}).await
    }

    /// Like [`configure`](Self::configure), calling `on_step` as each step
    /// finishes.
    pub async fn configure_with(
        &self,
        targets: &Targets,
        mut on_step: impl FnMut(&StepOutcome),
    ) -> RunReport {
        let start = Instant::now();
        let page = &self.config.page;
        let mut steps = Vec::with_capacity(4);
        let mut record = |outcome: StepOutcome| {
            on_step(&outcome);
            steps.push(outcome);
        };

        let fish = targets.fishes.locator(&page.fish_option_prefix);
        record(
            self.step(Step::FishCount, async {
                self.driver.click(&fish).await?;
                info!("Spawned {} fish", targets.fishes);
                Ok::<_, Error>(())
            })
            .await,
        );

        let advanced = self
            .step(Step::AdvancedSettings, self.driver.click(&page.advanced_toggle()))
            .await;
        let panel_open = advanced.succeeded();
        record(advanced);

        let sliders = [
            (Step::Speed, &page.speed, f64::from(targets.speed.value())),
            (Step::FishSpeed, &page.fish_speed, f64::from(targets.fish_speed.value())),
        ];
        for (step, layout, target) in sliders {
            if !panel_open {
                debug!("{}: skipped, advanced settings unavailable", step);
                record(StepOutcome {
                    step,
                    status: StepStatus::Skipped,
                });
                continue;
            }
            record(self.step(step, self.slide(step, layout, target)).await);
        }

        RunReport {
            steps,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Navigate, then configure.
    pub async fn run(&self, targets: &Targets) -> Result<RunReport> {
        self.navigate().await?;
        Ok(self.configure(targets).await)
    }

    async fn slide(&self, step: Step, layout: &SliderLayout, target: f64) -> Result<()> {
        let out = set_slider(&self.driver, layout, target, &self.config.slider).await?;
        info!(
            "{} set to {} ({} drags, reads {})",
            step, target, out.drags, out.value
        );
        Ok(())
    }

    async fn step<T>(&self, step: Step, work: impl Future<Output = Result<T>>) -> StepOutcome {
        match work.await {
            Ok(_) => StepOutcome {
                step,
                status: StepStatus::Done,
            },
            Err(e @ Error::SliderNotFound(_)) => {
                let activity = step.lookup().unwrap_or(step.activity());
                error!(step = %step, "error {}: {}", activity, e);
                StepOutcome {
                    step,
                    status: StepStatus::NotFound(e.to_string()),
                }
            }
            Err(e) => {
                error!(step = %step, "error {}: {}", step.activity(), e);
                StepOutcome {
                    step,
                    status: StepStatus::Failed(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FishCount, FishSpeed, Speed};
    use crate::driver::fake::FakePage;
    use crate::driver::Locator;

    /// The default aquarium layout, sliders hidden behind the advanced toggle.
    fn aquarium(speed: f64, fish_speed: f64) -> FakePage {
        let layout = Config::default().page;
        let mut page = FakePage::new().button(layout.advanced_toggle());
        for i in 0..10 {
            page = page.button(Locator::id(format!("setSetting{}", i)));
        }
        page.slider(
            layout.speed.value_locator(),
            layout.speed.handle_locator(),
            speed,
            18.0,
            (0.0, 4.0),
            Some(layout.advanced_toggle()),
        )
        .slider(
            layout.fish_speed.value_locator(),
            layout.fish_speed.handle_locator(),
            fish_speed,
            40.0,
            (0.0, 2.0),
            Some(layout.advanced_toggle()),
        )
    }

    fn targets(fishes: u32, speed: u8, fish_speed: u8) -> Targets {
        Targets {
            fishes: FishCount::new(fishes).unwrap(),
            speed: Speed::new(speed).unwrap(),
            fish_speed: FishSpeed::new(fish_speed).unwrap(),
        }
    }

    #[tokio::test]
    async fn full_run_sets_everything() {
        let runner = Runner::new(aquarium(1.0, 1.0), Config::default());
        let report = runner.run(&targets(5000, 4, 0)).await.unwrap();

        assert!(report.success(), "{:?}", report.steps);
        assert_eq!(report.steps.len(), 4);

        let page = runner.driver();
        assert_eq!(page.url().as_deref(), Some(crate::config::schema::AQUARIUM_URL));
        assert_eq!(page.clicks(&Locator::id("setSetting4")), 1);
        assert_eq!(page.clicks(&Locator::id("setSettingAdvanced")), 1);

        let layout = &runner.config().page;
        let speed = page.value_of(&layout.speed.value_locator()).unwrap();
        let fish_speed = page.value_of(&layout.fish_speed.value_locator()).unwrap();
        assert!((speed - 4.0).abs() <= 0.2, "speed {}", speed);
        assert!(fish_speed.abs() <= 0.2, "fish speed {}", fish_speed);
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let runner = Runner::new(aquarium(2.0, 1.0), Config::default());
        let report = runner.configure(&Targets::default()).await;
        let order: Vec<Step> = report.steps.iter().map(|o| o.step).collect();
        assert_eq!(
            order,
            vec![
                Step::FishCount,
                Step::AdvancedSettings,
                Step::Speed,
                Step::FishSpeed
            ]
        );
    }

    #[tokio::test]
    async fn missing_fish_option_does_not_stop_the_run() {
        let layout = Config::default().page;
        let page = FakePage::new().button(layout.advanced_toggle()).slider(
            layout.speed.value_locator(),
            layout.speed.handle_locator(),
            0.0,
            15.0,
            (0.0, 4.0),
            None,
        );
        let page = page.slider(
            layout.fish_speed.value_locator(),
            layout.fish_speed.handle_locator(),
            0.0,
            15.0,
            (0.0, 2.0),
            None,
        );
        let runner = Runner::new(page, Config::default());
        let report = runner.configure(&Targets::default()).await;

        assert!(!report.success());
        assert!(matches!(
            report.get(Step::FishCount).unwrap().status,
            StepStatus::Failed(_)
        ));
        assert!(report.get(Step::Speed).unwrap().succeeded());
        assert!(report.get(Step::FishSpeed).unwrap().succeeded());
    }

    #[tokio::test]
    async fn sliders_skipped_without_advanced_panel() {
        let page = FakePage::new().button(Locator::id("setSetting2"));
        let runner = Runner::new(page, Config::default());
        let report = runner.configure(&Targets::default()).await;

        assert!(report.get(Step::FishCount).unwrap().succeeded());
        assert!(!report.get(Step::AdvancedSettings).unwrap().succeeded());
        assert_eq!(report.get(Step::Speed).unwrap().status, StepStatus::Skipped);
        assert_eq!(
            report.get(Step::FishSpeed).unwrap().status,
            StepStatus::Skipped
        );
        assert_eq!(runner.driver().drags(), 0);
    }

    #[tokio::test]
    async fn slider_failure_is_isolated() {
        // Only the speed slider exists; fish speed fails, speed still lands.
        let layout = Config::default().page;
        let page = FakePage::new()
            .button(Locator::id("setSetting2"))
            .button(layout.advanced_toggle())
            .slider(
                layout.speed.value_locator(),
                layout.speed.handle_locator(),
                0.0,
                15.0,
                (0.0, 4.0),
                None,
            );
        let runner = Runner::new(page, Config::default());
        let report = runner.configure(&Targets::default()).await;

        assert!(report.get(Step::Speed).unwrap().succeeded());
        let fish_speed = report.get(Step::FishSpeed).unwrap();
        match &fish_speed.status {
            StepStatus::NotFound(msg) => assert!(msg.contains("slider handle"), "{}", msg),
            other => panic!("unexpected status: {:?}", other),
        }
        assert_eq!(fish_speed.failure(), Some("getting the fish speed slider"));
    }

    #[tokio::test]
    async fn failure_wording_per_step() {
        let page = FakePage::new().button(Locator::id("setSetting2"));
        let runner = Runner::new(page, Config::default());
        let report = runner.configure(&Targets::default()).await;

        assert_eq!(report.get(Step::FishCount).unwrap().failure(), None);
        assert_eq!(
            report.get(Step::AdvancedSettings).unwrap().failure(),
            Some("opening the advanced settings")
        );
        assert_eq!(report.get(Step::Speed).unwrap().failure(), None);
    }

    #[tokio::test]
    async fn unreadable_slider_is_a_plain_failure() {
        let layout = Config::default().page;
        let page = FakePage::new()
            .button(Locator::id("setSetting2"))
            .button(layout.advanced_toggle())
            .button(layout.speed.handle_locator())
            .label(layout.speed.value_locator(), "fast");
        let runner = Runner::new(page, Config::default());
        let report = runner.configure(&Targets::default()).await;

        let speed = report.get(Step::Speed).unwrap();
        assert!(matches!(speed.status, StepStatus::Failed(_)));
        assert_eq!(speed.failure(), Some("setting the speed"));
    }

    #[tokio::test]
    async fn each_step_is_reported_as_it_finishes() {
        let runner = Runner::new(aquarium(2.0, 1.0), Config::default());
        let mut seen = Vec::new();
        let report = runner
            .configure_with(&Targets::default(), |outcome| {
                // Nothing after this step has run yet.
                if outcome.step == Step::FishCount {
                    assert_eq!(runner.driver().clicks(&Locator::id("setSettingAdvanced")), 0);
                }
                seen.push(outcome.clone());
            })
            .await;
        assert_eq!(seen, report.steps);
    }

    #[tokio::test]
    async fn navigation_failure_aborts() {
        let mut config = Config::default();
        config.target.url.clear();
        let runner = Runner::new(aquarium(0.0, 0.0), config);
        assert!(runner.run(&Targets::default()).await.is_err());
        assert_eq!(runner.driver().clicks(&Locator::id("setSetting2")), 0);
    }
}
