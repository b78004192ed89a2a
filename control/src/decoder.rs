//! Translation of probe readings into pads.

use crate::calibration::CalibrationBounds;
use crate::pad::{PadId, TABLE_SIZE};
use crate::sampler::Sample;

/// Hardware noise floor. Nothing below this is a touched pad.
pub const MINIMUM_PROBE_READING: u16 = 30;

/// Map a filtered reading onto the pad table.
///
/// The calibrated range is split into equal-width buckets, one per table
/// slot. Readings between the noise floor and `probe_min` land in the first
/// bucket, readings above `probe_max` are outside of the table.
#[must_use]
pub fn decode(filtered: u16, bounds: CalibrationBounds, noise_floor: u16) -> Option<PadId> {
    if filtered < noise_floor || bounds.probe_max <= bounds.probe_min {
        return None;
    }
    let span = u32::from(bounds.probe_max - bounds.probe_min);
    let offset = u32::from(filtered.saturating_sub(bounds.probe_min));
    let index = offset * (TABLE_SIZE as u32 - 1) / span;
    PadId::from_slot(index as usize)
}

/// Mean of the plausible (non-zero) readings.
///
/// Used to confirm readings from the function pad region, where single
/// samples are not trustworthy.
#[must_use]
pub fn plausible_mean(readings: &[u16]) -> Option<u16> {
    let (sum, count) = readings
        .iter()
        .filter(|r| **r > 0)
        .fold((0_u32, 0_u32), |(sum, count), r| {
            (sum + u32::from(*r), count + 1)
        });
    if count == 0 {
        None
    } else {
        Some((sum / count) as u16)
    }
}

/// Noise rejection applied before decoding.
///
/// A sample is accepted only when its reads agree with each other and,
/// unless duplicates are requested, when it moved far enough from the
/// previously accepted reading.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingFilter {
    last_accepted: Option<u16>,
    max_variance: u16,
    min_delta: u16,
}

impl ReadingFilter {
    #[must_use]
    pub fn new(max_variance: u16, min_delta: u16) -> Self {
        Self {
            last_accepted: None,
            max_variance,
            min_delta,
        }
    }

    pub fn accept(&mut self, sample: &Sample, allow_duplicates: bool) -> Option<u16> {
        if sample.spread() > self.max_variance {
            return None;
        }

        let reading = sample.mean();
        if !allow_duplicates {
            if let Some(last) = self.last_accepted {
                if reading.abs_diff(last) <= self.min_delta {
                    return None;
                }
            }
        }

        self.last_accepted = Some(reading);
        Some(reading)
    }

    #[must_use]
    pub fn last_accepted(&self) -> Option<u16> {
        self.last_accepted
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
