use crate::driver::Locator;
use crate::{Error, Result};
use std::fmt;

/// Fish counts offered by the page, in option order.
pub const FISH_COUNTS: [u32; 10] = [1, 100, 500, 1000, 5000, 10000, 15000, 20000, 25000, 30000];

/// A fish count the page offers as a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FishCount(u32);

impl FishCount {
    /// Accept only counts listed in [`FISH_COUNTS`].
    pub fn new(count: u32) -> Result<Self> {
        if FISH_COUNTS.contains(&count) {
            Ok(Self(count))
        } else {
            Err(Error::InvalidSetting(format!(
                "fish count {} is not one of {}",
                count,
                join(&FISH_COUNTS)
            )))
        }
    }

    pub fn count(self) -> u32 {
        self.0
    }

    /// Position of this preset among the page's options.
    pub fn option_index(self) -> usize {
        FISH_COUNTS
            .iter()
            .position(|&c| c == self.0)
            .unwrap_or_default()
    }

    /// Locator of the option element, e.g. `#setSetting2` for 500 fish.
    pub fn locator(self, prefix: &str) -> Locator {
        Locator::id(format!("{}{}", prefix, self.option_index()))
    }
}

impl Default for FishCount {
    fn default() -> Self {
        Self(500)
    }
}

impl fmt::Display for FishCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Overall speed of the aquarium, 0 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(u8);

impl Speed {
    pub const MAX: u8 = 4;

    pub fn new(value: u8) -> Result<Self> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSetting(format!(
                "speed {} is out of range 0..={}",
                value,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(2)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Speed of the fish themselves, 0 to 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FishSpeed(u8);

impl FishSpeed {
    pub const MAX: u8 = 2;

    pub fn new(value: u8) -> Result<Self> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSetting(format!(
                "fish speed {} is out of range 0..={}",
                value,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for FishSpeed {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for FishSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three values a run configures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targets {
    pub fishes: FishCount,
    pub speed: Speed,
    pub fish_speed: FishSpeed,
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
