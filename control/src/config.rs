//! Tuned timing and filtering constants.
//!
//! These were found empirically on the hardware. They are kept configurable
//! so a board revision can adjust them, but the defaults are what the board
//! ships with.

use crate::button::ButtonMapping;
use crate::decoder::MINIMUM_PROBE_READING;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Repeated reading of the same pad is not reported within this window.
    pub duplicate_window_ms: u32,
    /// A half finished gesture is abandoned after this long without a pad.
    pub double_selection_timeout_ms: u32,
    /// Minimal period between two checks of the probe switch position.
    pub switch_position_interval_ms: u32,
    /// Button held at least this long is a long press.
    pub long_press_ms: u32,
    /// Session ends after this long without any event.
    pub session_timeout_ms: u32,
    /// Period of flushing staged bridges to durable storage.
    pub flush_interval_ms: u32,
    /// How long a single blocking read waits before reporting timeout.
    pub read_timeout_ms: u32,
    /// The button is sensed at most this often.
    pub button_poll_interval_ms: u32,
    /// Maximum spread of raw reads within one sample.
    pub max_variance: u16,
    /// Minimum distance of a new reading from the previously accepted one.
    pub min_delta: u16,
    /// Samples below this are never a touched pad.
    pub noise_floor: u16,
    pub button_mapping: ButtonMapping,
    /// Write the very first bridge of a session directly to durable storage.
    pub durable_first_connection: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_window_ms: 500,
            double_selection_timeout_ms: 700,
            switch_position_interval_ms: 1500,
            long_press_ms: 750,
            session_timeout_ms: 6200,
            flush_interval_ms: 500,
            read_timeout_ms: 50,
            button_poll_interval_ms: 20,
            max_variance: 4,
            min_delta: 5,
            noise_floor: MINIMUM_PROBE_READING,
            button_mapping: ButtonMapping::default(),
            durable_first_connection: false,
        }
    }
}
