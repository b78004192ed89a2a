//! Interfaces of the components surrounding the probing core.
//!
//! The crosspoint matrix driver, LED engine and node file storage are black
//! boxes to the core. It only asks them for policy decisions, node list
//! mutations and redraws.

use core::fmt;

use crate::bridge::Nodes;
use crate::pad::PadId;

/// Policy gate consulted before any mutation.
pub trait Connectivity {
    fn is_connectable(&self, pad: PadId) -> bool;

    /// Expected to be symmetric.
    fn connection_allowed(&self, a: PadId, b: PadId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// There is no room left for another bridge.
    Full,
    /// Durable storage rejected the write.
    Write,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("node list is full"),
            Self::Write => f.write_str("failed to write node file"),
        }
    }
}

/// Node list of the active slot.
///
/// `staged` mutations touch only the fast in-memory list, the rest goes to
/// durable storage right away.
pub trait NodeList {
    /// # Errors
    ///
    /// Fails when the list is full or durable storage cannot be written.
    fn add_bridge(&mut self, a: PadId, b: PadId, slot: u8, staged: bool)
        -> Result<(), StorageError>;

    /// Remove bridges touching `pad`, or only `pad`-`other` when given.
    ///
    /// Only the list selected by `staged` is touched.
    ///
    /// # Errors
    ///
    /// Fails when durable storage cannot be written.
    fn remove_bridge(
        &mut self,
        pad: PadId,
        other: Option<PadId>,
        slot: u8,
        staged: bool,
    ) -> Result<usize, StorageError>;

    /// Pads currently bridged to `pad`.
    fn connected_to(&self, pad: PadId, slot: u8) -> Nodes;

    /// Write staged bridges to durable storage.
    ///
    /// # Errors
    ///
    /// Fails when durable storage cannot be written. Staged bridges are kept
    /// for another attempt.
    fn flush_staged(&mut self, slot: u8) -> Result<(), StorageError>;
}

/// Extent of a requested matrix and LED refresh, ordered by cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RefreshKind {
    LedOnly = 1,
    Local = 2,
    Full = 3,
}

impl RefreshKind {
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::LedOnly),
            2 => Some(Self::Local),
            3 => Some(Self::Full),
            _ => None,
        }
    }
}

/// Idle indicator shown while the probe is not touching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    Measure,
    Select,
}

/// Visual feedback surface.
pub trait Feedback {
    fn request_refresh(&mut self, kind: RefreshKind);

    fn highlight(&mut self, pad: PadId, brightness_delta: i16);

    fn clear_highlight(&mut self);

    fn show_glyph(&mut self, glyph: Glyph);
}

/// Everything a probing session talks to.
pub trait Breadboard: Connectivity + NodeList + Feedback {}

impl<T: Connectivity + NodeList + Feedback> Breadboard for T {}
