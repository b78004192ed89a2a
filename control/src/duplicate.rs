//! Suppression of repeated pad readings.

use crate::hal::elapsed;
use crate::pad::PadId;

/// Decides whether a decoded pad should be reported again.
///
/// A held touch keeps producing the same pad. It is reported once, and
/// again only after the window elapsed and only if the caller asks for
/// repeats (e.g. when scrolling through a menu). A different pad is always
/// reported immediately.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DuplicateSuppressor {
    last_pad: Option<PadId>,
    last_emit: u32,
    window_ms: u32,
}

impl DuplicateSuppressor {
    #[must_use]
    pub fn new(window_ms: u32) -> Self {
        Self {
            last_pad: None,
            last_emit: 0,
            window_ms,
        }
    }

    pub fn admit(&mut self, pad: PadId, allow_duplicates: bool, now: u32) -> Option<PadId> {
        if self.last_pad == Some(pad) {
            let window_elapsed = elapsed(self.last_emit, now) >= self.window_ms;
            if !(allow_duplicates && window_elapsed) {
                return None;
            }
        }
        self.last_pad = Some(pad);
        self.last_emit = now;
        Some(pad)
    }

    /// Forget the last pad, so touching it again is reported. Called when
    /// the probe is lifted.
    pub fn forget(&mut self) {
        self.last_pad = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_burst_of_identical_pads_comes_in_it_admits_exactly_one() {
        let mut suppressor = DuplicateSuppressor::new(500);
        let admitted = (0..10)
            .filter_map(|i| suppressor.admit(PadId::Row(12), false, i * 10))
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn when_duplicates_are_not_allowed_it_stays_silent_even_after_window() {
        let mut suppressor = DuplicateSuppressor::new(500);
        assert!(suppressor.admit(PadId::Row(12), false, 0).is_some());
        assert!(suppressor.admit(PadId::Row(12), false, 5000).is_none());
    }

    #[test]
    fn when_duplicates_are_allowed_it_repeats_after_window() {
        let mut suppressor = DuplicateSuppressor::new(500);
        assert!(suppressor.admit(PadId::Row(12), true, 0).is_some());
        assert!(suppressor.admit(PadId::Row(12), true, 499).is_none());
        assert!(suppressor.admit(PadId::Row(12), true, 500).is_some());
        assert!(suppressor.admit(PadId::Row(12), true, 700).is_none());
        assert!(suppressor.admit(PadId::Row(12), true, 1000).is_some());
    }

    #[test]
    fn when_pad_changes_it_is_admitted_immediately() {
        let mut suppressor = DuplicateSuppressor::new(500);
        assert!(suppressor.admit(PadId::Row(12), false, 0).is_some());
        assert_eq!(
            suppressor.admit(PadId::Row(13), false, 1),
            Some(PadId::Row(13))
        );
        assert!(suppressor.admit(PadId::Row(12), false, 2).is_some());
    }

    #[test]
    fn when_probe_is_lifted_the_same_pad_is_admitted_again() {
        let mut suppressor = DuplicateSuppressor::new(500);
        assert!(suppressor.admit(PadId::Row(12), false, 0).is_some());
        suppressor.forget();
        assert!(suppressor.admit(PadId::Row(12), false, 100).is_some());
    }
}
