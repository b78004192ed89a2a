//! Narrow hardware seams consumed by the probing core.
//!
//! Firmware implements these on top of its HAL. Tests implement them with
//! scripted mocks, so the whole core runs on host.

use embedded_hal::delay::DelayNs;

/// Analog probe-sense line.
pub trait ProbeAdc {
    /// Single raw conversion. A hardware fault is reported as an
    /// out-of-range reading, never as an error.
    fn read(&mut self) -> u16;
}

/// Function the shared LED-data/button pin currently serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    LedData,
    ButtonSense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    Up,
    Down,
    Floating,
}

/// Pin driving the LED strip that also senses the probe buttons.
pub trait ButtonPin {
    fn role(&self) -> PinRole;

    fn set_role(&mut self, role: PinRole);

    fn set_input(&mut self, pull: Pull);

    fn drive_low(&mut self);

    fn is_high(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderEdge {
    Up,
    Down,
    Pressed,
}

/// Rotary encoder, reporting edges collected since the last poll.
pub trait Encoder {
    fn poll(&mut self) -> Option<EncoderEdge>;
}

/// Current drawn from the routed test voltage.
pub trait CurrentSense {
    fn current_ma(&mut self) -> f32;
}

/// Monotonic millisecond clock, able to sleep for short periods.
///
/// The millisecond counter is expected to wrap, all users compare it
/// through `wrapping_sub`.
pub trait Clock: DelayNs {
    fn now_ms(&self) -> u32;
}

/// Milliseconds passed between `since` and `now`.
#[must_use]
pub fn elapsed(since: u32, now: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_survives_counter_wrap() {
        assert_eq!(elapsed(u32::MAX - 9, 10), 20);
        assert_eq!(elapsed(100, 350), 250);
    }
}
