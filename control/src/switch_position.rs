//! Detection of the probe switch position.
//!
//! The probe switch either selects pads or routes the tip to measurement.
//! It is not wired to any pin, it is inferred from the current drawn from a
//! test voltage routed through the tip.

use crate::collaborator::Glyph;
use crate::hal::{elapsed, CurrentSense};
use crate::log;

/// Current thresholds of the switch position hysteresis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    pub low_ma: f32,
    pub high_ma: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_ma: 0.5,
            high_ma: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchPosition {
    Measure,
    #[default]
    Select,
}

impl SwitchPosition {
    #[must_use]
    pub fn glyph(self) -> Glyph {
        match self {
            Self::Measure => Glyph::Measure,
            Self::Select => Glyph::Select,
        }
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchPositionMonitor {
    position: SwitchPosition,
    thresholds: Thresholds,
    interval_ms: u32,
    last_check: Option<u32>,
}

impl SwitchPositionMonitor {
    #[must_use]
    pub fn new(thresholds: Thresholds, interval_ms: u32) -> Self {
        Self {
            position: SwitchPosition::default(),
            thresholds,
            interval_ms,
            last_check: None,
        }
    }

    #[must_use]
    pub fn position(&self) -> SwitchPosition {
        self.position
    }

    /// Apply a single current reading. Readings between the thresholds
    /// never change the position.
    pub fn update(&mut self, current_ma: f32) -> SwitchPosition {
        self.position = match self.position {
            SwitchPosition::Measure if current_ma > self.thresholds.high_ma => {
                SwitchPosition::Select
            }
            SwitchPosition::Select if current_ma < self.thresholds.low_ma => {
                SwitchPosition::Measure
            }
            unchanged => unchanged,
        };
        self.position
    }

    /// Sample the current if the check is due. Returns the new position
    /// when it changed.
    pub fn poll<S: CurrentSense>(
        &mut self,
        sense: &mut S,
        now: u32,
        checking_button: bool,
    ) -> Option<SwitchPosition> {
        if checking_button {
            return None;
        }
        if let Some(last) = self.last_check {
            if elapsed(last, now) < self.interval_ms {
                return None;
            }
        }
        self.last_check = Some(now);

        let previous = self.position;
        let position = self.update(sense.current_ma());
        if position == previous {
            None
        } else {
            log::info!("Probe switch moved to {}", position);
            Some(position)
        }
    }
}
