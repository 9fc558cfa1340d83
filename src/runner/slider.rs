use crate::config::{SliderConfig, SliderLayout};
use crate::driver::{Driver, Locator};
use crate::{Error, Result};
use tracing::debug;

/// Where a slider ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderOutcome {
    /// Last value read from the page.
    pub value: f64,
    /// Drags issued to get there.
    pub drags: u32,
}

/// Drag a slider until its displayed value is within `tuning.tolerance`
/// of `target`.
///
/// Each drag moves the handle `tuning.gain * (target - current)` pixels,
/// then the value is read back.
pub async fn set_slider<D: Driver>(
    driver: &D,
    layout: &SliderLayout,
    target: f64,
    tuning: &SliderConfig,
) -> Result<SliderOutcome> {
    let handle = layout.handle_locator();
    let value = layout.value_locator();

    if !driver.exists(&handle).await? {
        return Err(Error::SliderNotFound(format!("slider handle {}", handle)));
    }

    let mut current = read_value(driver, &value).await?;
    let mut drags = 0;

    while (current - target).abs() > tuning.tolerance {
        if drags >= tuning.max_iterations {
            return Err(Error::SliderDidNotConverge {
                target,
                last: current,
                drags,
            });
        }

        let offset = target - current;
        driver.drag_by(&handle, tuning.gain * offset, 0.0).await?;
        drags += 1;

        if tuning.settle_ms > 0 {
            driver.wait(tuning.settle_ms).await;
        }
        current = read_value(driver, &value).await?;
        debug!("slider {}: {:.2} -> {} (drag {})", handle, current, target, drags);
    }

    Ok(SliderOutcome {
        value: current,
        drags,
    })
}

async fn read_value<D: Driver>(driver: &D, locator: &Locator) -> Result<f64> {
    let text = driver.text(locator).await?;
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidValue(format!("'{}' at {}", text, locator)))
}
