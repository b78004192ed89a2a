//! Feedback animations advanced on housekeeping ticks.

use crate::bridge::Bridge;
use crate::pad::PadId;

/// Brightness decay of a cleared pad, one step per tick.
pub const FADE_STEPS: [i16; 13] = [-6, -8, -10, -12, -14, -16, -18, -20, -24, -28, -32, -40, -64];

/// Brightness boost of a freshly connected bridge.
pub const FLASH_DELTA: i16 = 80;

/// Number of ticks a connected bridge stays flashed.
const FLASH_TICKS: u32 = 4;

/// Fading of a removed pad, so its removal is visible instead of snapping
/// to black.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fade {
    pad: Option<PadId>,
    step: usize,
}

impl Fade {
    pub fn start(&mut self, pad: PadId) {
        self.pad = Some(pad);
        self.step = 0;
    }

    /// Next decay step to apply, if the fade is running.
    pub fn tick(&mut self) -> Option<(PadId, i16)> {
        let pad = self.pad?;
        let delta = FADE_STEPS[self.step];
        self.step += 1;
        if self.step == FADE_STEPS.len() {
            self.pad = None;
        }
        Some((pad, delta))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.pad.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashStep {
    Holding,
    /// The flash is over, the bridge should settle to its net color.
    Settle(Bridge),
}

/// Brief flash of a connected bridge.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flash {
    bridge: Option<Bridge>,
    since: u32,
}

impl Flash {
    pub fn trigger(&mut self, bridge: Bridge) {
        self.bridge = Some(bridge);
        self.since = 0;
    }

    pub fn tick(&mut self) -> Option<FlashStep> {
        let bridge = self.bridge?;
        self.since = self.since.saturating_add(1);
        if self.since < FLASH_TICKS {
            Some(FlashStep::Holding)
        } else {
            self.bridge = None;
            Some(FlashStep::Settle(bridge))
        }
    }
}
