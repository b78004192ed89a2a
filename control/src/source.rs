//! Unified stream of probe events.
//!
//! Each poll cycle merges three inputs in strict priority: a pending rotary
//! encoder edge, the probe buttons (sensed only every few milliseconds, the
//! sequence is not cheap and it borrows the LED pin) and finally the analog
//! pad reading.

use heapless::Vec;

use crate::button::{ButtonDecoder, ButtonState, Press};
use crate::calibration::CalibrationBounds;
use crate::config::Config;
use crate::decoder::{decode, plausible_mean, ReadingFilter};
use crate::duplicate::DuplicateSuppressor;
use crate::hal::{elapsed, ButtonPin, Clock, Encoder, EncoderEdge, ProbeAdc};
use crate::log;
use crate::pad::PadId;
use crate::sampler::{AnalogSampler, SampleContext};

/// Number of sub-samples taken to confirm a function pad.
const FUNCTION_PAD_SUBSAMPLES: usize = 4;

/// Sleep between two poll cycles.
const POLL_SLEEP_US: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Pad(PadId),
    RemoveButton(Press),
    ConnectButton(Press),
    EncoderUp,
    EncoderDown,
    EncoderPressed,
    Timeout,
}

impl From<EncoderEdge> for Event {
    fn from(edge: EncoderEdge) -> Self {
        match edge {
            EncoderEdge::Up => Self::EncoderUp,
            EncoderEdge::Down => Self::EncoderDown,
            EncoderEdge::Pressed => Self::EncoderPressed,
        }
    }
}

impl Event {
    #[must_use]
    pub fn is_encoder(self) -> bool {
        matches!(
            self,
            Self::EncoderUp | Self::EncoderDown | Self::EncoderPressed
        )
    }
}

pub struct ProbeEventSource<A, P, E> {
    adc: A,
    encoder: E,
    button: ButtonDecoder<P>,
    sampler: AnalogSampler,
    filter: ReadingFilter,
    suppressor: DuplicateSuppressor,
    bounds: CalibrationBounds,
    config: Config,
    last_button_poll: Option<u32>,
    checking_button: bool,
}

impl<A, P, E> ProbeEventSource<A, P, E>
where
    A: ProbeAdc,
    P: ButtonPin,
    E: Encoder,
{
    pub fn new(
        adc: A,
        button_pin: P,
        encoder: E,
        bounds: CalibrationBounds,
        config: Config,
    ) -> Self {
        Self {
            adc,
            encoder,
            button: ButtonDecoder::new(button_pin, config.button_mapping),
            sampler: AnalogSampler::default(),
            filter: ReadingFilter::new(config.max_variance, config.min_delta),
            suppressor: DuplicateSuppressor::new(config.duplicate_window_ms),
            bounds,
            config,
            last_button_poll: None,
            checking_button: false,
        }
    }

    pub fn set_bounds(&mut self, bounds: CalibrationBounds) {
        self.bounds = bounds;
        self.filter.reset();
    }

    #[must_use]
    pub fn bounds(&self) -> CalibrationBounds {
        self.bounds
    }

    /// Whether a button press is being measured at the moment.
    #[must_use]
    pub fn is_checking_button(&self) -> bool {
        self.checking_button
    }

    #[must_use]
    pub fn sample_context(&self) -> SampleContext {
        self.sampler.context()
    }

    /// Poll inputs until an event comes or until `timeout_ms` passes.
    pub fn read_blocking<C: Clock>(
        &mut self,
        clock: &mut C,
        timeout_ms: u32,
        allow_duplicates: bool,
    ) -> Event {
        let start = clock.now_ms();
        loop {
            if let Some(edge) = self.encoder.poll() {
                return edge.into();
            }

            if let Some(event) = self.poll_button(clock) {
                return event;
            }

            if let Some(pad) = self.read_pad(clock.now_ms(), allow_duplicates) {
                return Event::Pad(pad);
            }

            if elapsed(start, clock.now_ms()) >= timeout_ms {
                return Event::Timeout;
            }

            clock.delay_us(POLL_SLEEP_US);
        }
    }

    fn poll_button<C: Clock>(&mut self, clock: &mut C) -> Option<Event> {
        let now = clock.now_ms();
        if let Some(last) = self.last_button_poll {
            if elapsed(last, now) < self.config.button_poll_interval_ms {
                return None;
            }
        }
        self.last_button_poll = Some(now);

        let state = self.button.poll(clock);
        if state == ButtonState::None {
            return None;
        }

        self.checking_button = true;
        let press = self
            .button
            .measure_press(state, clock, self.config.long_press_ms);
        self.checking_button = false;

        match state {
            ButtonState::Remove => Some(Event::RemoveButton(press)),
            ButtonState::Connect => Some(Event::ConnectButton(press)),
            ButtonState::None => None,
        }
    }

    /// Run a single sample through filtering, decoding and duplicate
    /// suppression.
    pub fn read_pad(&mut self, now: u32, allow_duplicates: bool) -> Option<PadId> {
        let sample = self.sampler.sample(&mut self.adc);

        if sample.mean() < self.config.noise_floor {
            self.lifted();
            return None;
        }

        let reading = self.filter.accept(&sample, allow_duplicates)?;
        let mut pad = decode(reading, self.bounds, self.config.noise_floor)?;

        if pad.is_function_pad() {
            self.sampler.set_context(SampleContext::Pads);
            match self.confirm_function_pad() {
                Some(confirmed) => pad = confirmed,
                None => {
                    // The rejected reading must not shadow the next touch.
                    self.filter.reset();
                    return None;
                }
            }
        } else {
            self.sampler.set_context(SampleContext::Rows);
        }

        self.suppressor.admit(pad, allow_duplicates, now)
    }

    fn confirm_function_pad(&mut self) -> Option<PadId> {
        let mut readings: Vec<u16, FUNCTION_PAD_SUBSAMPLES> = Vec::new();
        for _ in 0..FUNCTION_PAD_SUBSAMPLES {
            let sample = self.sampler.sample(&mut self.adc);
            let reading = if sample.spread() <= self.config.max_variance {
                sample.mean()
            } else {
                0
            };
            // NOTE: This is safe since the loop does not exceed capacity.
            let _: Result<_, _> = readings.push(reading);
        }
        let mean = plausible_mean(&readings)?;
        let pad = decode(mean, self.bounds, self.config.noise_floor);
        if pad.is_none() {
            log::debug!("Function pad reading={} not confirmed", mean);
        }
        pad
    }

    fn lifted(&mut self) {
        self.suppressor.forget();
        self.filter.reset();
        self.sampler.set_context(SampleContext::Rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::{FunctionPad, HeaderPad};
    use crate::testing::{MockAdc, MockClock, MockEncoder, MockPin};

    type Source = ProbeEventSource<MockAdc, MockPin, MockEncoder>;

    fn source(clock: &MockClock, adc: MockAdc) -> Source {
        ProbeEventSource::new(
            adc,
            MockPin::new(clock),
            MockEncoder::default(),
            CalibrationBounds::default(),
            Config::default(),
        )
    }

    #[test]
    fn when_row_is_touched_it_is_reported() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[2001, 2001, 1998]));
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::Pad(PadId::Row(31))
        );
    }

    #[test]
    fn when_low_end_is_touched_header_pad_is_reported() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[50, 52, 49]));
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::Pad(PadId::Header(HeaderPad::Gnd(0)))
        );
    }

    #[test]
    fn when_touch_is_held_it_is_reported_only_once() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[2001, 2001, 1998]));
        let mut pads = 0;
        for _ in 0..10 {
            if let Event::Pad(_) = source.read_blocking(&mut clock, 10, false) {
                pads += 1;
            }
        }
        assert_eq!(pads, 1);
    }

    #[test]
    fn when_probe_is_lifted_and_touches_again_it_is_reported_again() {
        let mut clock = MockClock::new();
        let adc = MockAdc::cycling(&[2000]);
        let mut source = source(&clock, adc.clone());
        assert!(matches!(
            source.read_blocking(&mut clock, 10, false),
            Event::Pad(_)
        ));
        adc.set_cycle(&[0]);
        assert_eq!(source.read_blocking(&mut clock, 10, false), Event::Timeout);
        adc.set_cycle(&[2000]);
        assert_eq!(
            source.read_blocking(&mut clock, 10, false),
            Event::Pad(PadId::Row(31))
        );
    }

    #[test]
    fn when_nothing_happens_it_times_out() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[5]));
        assert_eq!(source.read_blocking(&mut clock, 50, false), Event::Timeout);
        assert!(clock.now_ms() >= 50);
        assert!(clock.now_ms() < 60);
    }

    #[test]
    fn when_reading_is_noisy_it_is_ignored() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[2000, 2020, 1980]));
        assert_eq!(source.read_blocking(&mut clock, 50, false), Event::Timeout);
    }

    #[test]
    fn encoder_edge_takes_priority() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[2000]));
        source.encoder.push(EncoderEdge::Down);
        assert_eq!(source.read_blocking(&mut clock, 50, false), Event::EncoderDown);
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::Pad(PadId::Row(31))
        );
    }

    #[test]
    fn button_takes_priority_over_pads() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[2000]));
        source.button.pin().press(true, 0, 100);
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::ConnectButton(Press::Short)
        );
        assert!(!source.is_checking_button());
    }

    #[test]
    fn when_button_is_held_it_is_reported_as_long_press() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[5]));
        source.button.pin().press(false, 0, 2000);
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::RemoveButton(Press::Long)
        );
        assert_eq!(source.read_blocking(&mut clock, 50, false), Event::Timeout);
    }

    #[test]
    fn button_is_not_sensed_on_every_cycle() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[5]));
        assert_eq!(source.read_blocking(&mut clock, 50, false), Event::Timeout);
        let senses = source.button.pin().roles_taken().len() / 2;
        assert!((2..=4).contains(&senses), "{senses}");
    }

    #[test]
    fn when_function_pad_is_touched_it_is_confirmed_by_resampling() {
        let mut clock = MockClock::new();
        let adc = MockAdc::cycling(&[420]);
        let mut source = source(&clock, adc.clone());
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::Pad(PadId::Function(FunctionPad::Adc))
        );
        assert_eq!(source.sample_context(), SampleContext::Pads);
        // One sample of rows, four confirming samples of pads.
        assert_eq!(adc.reads_taken(), 4 + 4 * 8);
    }

    #[test]
    fn when_function_pad_cannot_be_confirmed_it_is_not_reported() {
        let mut clock = MockClock::new();
        let adc = MockAdc::cycling(&[420, 420, 420, 420, 400, 440, 400, 440]);
        let mut source = source(&clock, adc);
        assert_eq!(source.read_pad(0, false), None);
    }

    #[test]
    fn when_function_pad_confirmation_fails_a_steady_touch_is_reported_later() {
        let mut clock = MockClock::new();
        let adc = MockAdc::cycling(&[420, 420, 420, 420, 400, 440, 400, 440]);
        let mut source = source(&clock, adc.clone());
        assert_eq!(source.read_pad(0, false), None);
        assert_eq!(source.filter.last_accepted(), None);

        adc.set_cycle(&[420]);
        assert_eq!(
            source.read_blocking(&mut clock, 50, false),
            Event::Pad(PadId::Function(FunctionPad::Adc))
        );
    }

    #[test]
    fn when_button_is_held_for_seconds_it_is_reported_once() {
        let mut clock = MockClock::new();
        let mut source = source(&clock, MockAdc::cycling(&[5]));
        source.button.pin().press(true, 0, 5000);

        let mut presses = std::vec::Vec::new();
        while clock.now_ms() < 6000 {
            match source.read_blocking(&mut clock, 50, false) {
                Event::Timeout => {}
                event => presses.push(event),
            }
        }
        assert_eq!(presses, std::vec![Event::ConnectButton(Press::Long)]);
    }
}
