//! Probe buttons sensed through the LED data pin.
//!
//! The two buttons of the probe share a single line with the LED strip data
//! signal. One button pulls the line hard high, the other hard low. With no
//! button pressed, the line follows whatever pull is configured. Sampling it
//! under three different configurations tells the three cases apart:
//!
//! ```text
//!                 pull-down   pull-up   driven low, released
//!   no button         0          1              0
//!   high button       1          1              1
//!   low button        0          0              0
//! ```

use crate::hal::{elapsed, ButtonPin, Clock, PinRole, Pull};
use crate::log;

/// How long the pin is driven low in the third phase.
const DISCHARGE_US: u32 = 10;

/// Period of re-sensing the button while measuring the press length.
const PRESS_POLL_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    None,
    Remove,
    Connect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Short,
    Long,
}

/// Which button pulls the line high. Differs between board revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonMapping {
    #[default]
    HighIsConnect,
    HighIsRemove,
}

impl ButtonMapping {
    fn high(self) -> ButtonState {
        match self {
            Self::HighIsConnect => ButtonState::Connect,
            Self::HighIsRemove => ButtonState::Remove,
        }
    }

    fn low(self) -> ButtonState {
        match self {
            Self::HighIsConnect => ButtonState::Remove,
            Self::HighIsRemove => ButtonState::Connect,
        }
    }
}

/// Interpret the three phase samples. Any disagreement means no button.
#[must_use]
pub fn interpret(samples: [bool; 3], mapping: ButtonMapping) -> ButtonState {
    match samples {
        [true, true, true] => mapping.high(),
        [false, false, false] => mapping.low(),
        _ => ButtonState::None,
    }
}

/// Pin serving two roles, lent out for one of them at a time.
#[derive(Debug)]
pub struct SharedPin<P> {
    pin: P,
}

impl<P: ButtonPin> SharedPin<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Switch the pin to `role` for the duration of `f`.
    ///
    /// The previous role is restored on every exit path, including
    /// unwinding.
    pub fn with_role<R>(&mut self, role: PinRole, f: impl FnOnce(&mut P) -> R) -> R {
        let restore = self.pin.role();
        self.pin.set_role(role);
        let guard = RoleGuard {
            pin: &mut self.pin,
            restore,
        };
        f(&mut *guard.pin)
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

struct RoleGuard<'a, P: ButtonPin> {
    pin: &'a mut P,
    restore: PinRole,
}

impl<P: ButtonPin> Drop for RoleGuard<'_, P> {
    fn drop(&mut self) {
        self.pin.set_role(self.restore);
    }
}

/// Senses the probe buttons and turns a held button into a single report.
#[derive(Debug)]
pub struct ButtonDecoder<P> {
    pin: SharedPin<P>,
    mapping: ButtonMapping,
    blocked: bool,
}

impl<P: ButtonPin> ButtonDecoder<P> {
    pub fn new(pin: P, mapping: ButtonMapping) -> Self {
        Self {
            pin: SharedPin::new(pin),
            mapping,
            blocked: false,
        }
    }

    /// Run the three phase probing sequence, ignoring the block.
    pub fn sense<C: Clock>(&mut self, clock: &mut C) -> ButtonState {
        let samples = self.pin.with_role(PinRole::ButtonSense, |pin| {
            pin.set_input(Pull::Down);
            let pulled_down = pin.is_high();
            pin.set_input(Pull::Up);
            let pulled_up = pin.is_high();
            pin.drive_low();
            clock.delay_us(DISCHARGE_US);
            pin.set_input(Pull::Floating);
            let released = pin.is_high();
            [pulled_down, pulled_up, released]
        });
        interpret(samples, self.mapping)
    }

    /// Sense the button, reporting a press only once per hold.
    ///
    /// After a report, the button stays blocked for as long as it is held.
    /// Only an observed release lifts the block.
    pub fn poll<C: Clock>(&mut self, clock: &mut C) -> ButtonState {
        let state = self.sense(clock);

        if self.blocked {
            if state == ButtonState::None {
                self.blocked = false;
            }
            return ButtonState::None;
        }

        if state != ButtonState::None {
            log::debug!("Button {} pressed", state);
            self.blocked = true;
        }
        state
    }

    /// Busy-wait until the button is released or held long enough.
    pub fn measure_press<C: Clock>(
        &mut self,
        pressed: ButtonState,
        clock: &mut C,
        long_press_ms: u32,
    ) -> Press {
        let start = clock.now_ms();
        loop {
            if self.sense(clock) != pressed {
                self.blocked = false;
                return Press::Short;
            }
            if elapsed(start, clock.now_ms()) >= long_press_ms {
                return Press::Long;
            }
            clock.delay_ms(PRESS_POLL_MS);
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn pin(&self) -> &P {
        self.pin.pin()
    }
}
