//! Probing core of a breadboard, turning touches of a resistive probe into
//! bridges of its crosspoint matrix.
//!
//! It is targetted to run on the logic core of a dual-core firmware, with the
//! LED core rendering in parallel. Peripherals and the surrounding matrix,
//! LED and storage components are reached through traits, so all of it runs
//! on host in tests as well.
//!
//! Following is the flow of a single probing session:
//!
//! ```text
//!   [ ADC ]   [ LED data pin ]   [ Encoder ]
//!      |             |                |
//!  (Sample)   (ButtonState)    (EncoderEdge)
//!      V             V                V
//!   [ ProbeEventSource {Filter, Suppressor} ]
//!                    |
//!                 (Event)
//!                    V
//!   [ Session {Selection, Fade, Flash} ] --> {NodeList}
//!          |                 |
//!  (highlight, glyph)  (RefreshKind)
//!          V                 V
//!     {Feedback} <-- [ Coordinator ] --> [ LED core ]
//! ```

#![no_std]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod animation;
pub mod bridge;
pub mod button;
pub mod calibration;
pub mod collaborator;
pub mod config;
pub mod coordinator;
pub mod decoder;
pub mod duplicate;
pub mod hal;
mod log;
pub mod pad;
pub mod sampler;
mod save;
pub mod session;
pub mod source;
pub mod switch_position;

#[cfg(test)]
mod testing;

pub use crate::bridge::{Bridge, Bridges, Nodes};
pub use crate::calibration::{calibrate, CalibrationBounds, CalibrationError};
pub use crate::collaborator::{
    Breadboard, Connectivity, Feedback, Glyph, NodeList, RefreshKind, StorageError,
};
pub use crate::config::Config;
pub use crate::coordinator::{Claim, Coordinator, Core};
pub use crate::pad::PadId;
pub use crate::save::{latest as latest_save, InvalidData, Save, Store as SaveStore};
pub use crate::session::{ExitReason, Mode, Outcome, Session, SessionState, Summary};
pub use crate::source::{Event, ProbeEventSource};
pub use crate::switch_position::{SwitchPosition, Thresholds};
