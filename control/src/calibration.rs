//! Calculate calibration bounds of the probe-sense line.

use core::fmt;

use crate::decoder::MINIMUM_PROBE_READING;
use crate::log;
use crate::pad::TABLE_SIZE;

/// Readings of two samples are considered to agree within this distance.
const AGREEMENT_TOLERANCE: u16 = 8;

/// The calibrated range must span at least this many counts, otherwise pads
/// would not be distinguishable.
const MINIMUM_SPAN: u16 = 1000;

/// Raw reading bounds used to map a reading onto the pad table.
///
/// `probe_min` is the bottom of the first bucket, not the noise floor.
/// Calibration measures it with nothing touched, so it sits below
/// [`MINIMUM_PROBE_READING`]. Readings between the two still decode to the
/// first pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationBounds {
    pub probe_min: u16,
    pub probe_max: u16,
}

/// Uncalibrated bounds. The floor is a conservative guess above the noise
/// floor, so the first pad is readable before the probe gets calibrated.
impl Default for CalibrationBounds {
    fn default() -> Self {
        Self {
            probe_min: 100,
            probe_max: 4050,
        }
    }
}

impl CalibrationBounds {
    /// # Errors
    ///
    /// Fails when the range is empty or too narrow to tell pads apart, or
    /// when the first bucket ends below the noise floor.
    pub fn try_new(probe_min: u16, probe_max: u16) -> Result<Self, CalibrationError> {
        if probe_max <= probe_min || probe_max - probe_min < MINIMUM_SPAN {
            return Err(CalibrationError::NarrowScale);
        }
        let span = u32::from(probe_max - probe_min);
        let hidden = u32::from(MINIMUM_PROBE_READING.saturating_sub(probe_min));
        if hidden * (TABLE_SIZE as u32 - 1) >= span {
            return Err(CalibrationError::NarrowScale);
        }
        Ok(Self {
            probe_min,
            probe_max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Nothing-touched level is above the noise floor, the hardware should
    /// be checked.
    FloorTooHigh(u16),
    /// Majority of the nothing-touched samples disagree with each other.
    Unstable,
    /// End of scale is too close to the floor.
    NarrowScale,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FloorTooHigh(floor) => {
                write!(f, "probe reads {floor} with nothing touched, check the hardware")
            }
            Self::Unstable => f.write_str("probe readings are unstable, check the hardware"),
            Self::NarrowScale => f.write_str("probe scale is too narrow, check the hardware"),
        }
    }
}

/// Find the level the probe reads while touching nothing.
///
/// Each sample votes for the samples it agrees with. The sample with the
/// most votes wins and the result is the average of its supporters, the rest
/// is rejected as outliers. If the supporters are not a majority, the
/// calibration is rejected.
///
/// # Errors
///
/// Fails when there is no majority or when the level is implausibly high.
pub fn calibrate_floor(samples: &[u16]) -> Result<u16, CalibrationError> {
    let supporters = |candidate: u16| {
        samples
            .iter()
            .filter(move |s| s.abs_diff(candidate) <= AGREEMENT_TOLERANCE)
    };

    let winner = samples
        .iter()
        .copied()
        .max_by_key(|candidate| supporters(*candidate).count())
        .ok_or(CalibrationError::Unstable)?;

    let votes = supporters(winner).count();
    if votes * 2 <= samples.len() {
        log::warning!(
            "Calibration rejected, only {} of {} samples agree",
            votes,
            samples.len()
        );
        return Err(CalibrationError::Unstable);
    }

    let sum: u32 = supporters(winner).map(|s| u32::from(*s)).sum();
    let floor = (sum / votes as u32) as u16;
    if floor >= MINIMUM_PROBE_READING {
        log::warning!("Calibration rejected, floor={} is too high", floor);
        return Err(CalibrationError::FloorTooHigh(floor));
    }

    Ok(floor)
}

/// Calculate bounds from nothing-touched samples and a sample taken at the
/// end of the scale.
///
/// # Errors
///
/// See [`calibrate_floor`] and [`CalibrationBounds::try_new`].
pub fn calibrate(
    floor_samples: &[u16],
    end_of_scale: u16,
) -> Result<CalibrationBounds, CalibrationError> {
    let floor = calibrate_floor(floor_samples)?;
    let bounds = CalibrationBounds::try_new(floor, end_of_scale)?;
    log::info!(
        "Calibrated probe_min={} probe_max={}",
        bounds.probe_min,
        bounds.probe_max
    );
    Ok(bounds)
}
