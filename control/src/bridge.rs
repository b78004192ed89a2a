//! Requested connections between pads.

use heapless::Vec;

use crate::pad::PadId;

/// Capacity of a bridge list of a single slot.
pub const MAX_BRIDGES: usize = 128;

/// Upper bound of pads one pad may be bridged to.
pub const MAX_NODES: usize = 16;

/// Set of pads, e.g. those disconnected by clearing a pad.
pub type Nodes = Vec<PadId, MAX_NODES>;

/// Unordered pair of pads.
#[derive(Debug, Clone, Copy, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bridge {
    pub a: PadId,
    pub b: PadId,
}

impl Bridge {
    #[must_use]
    pub fn new(a: PadId, b: PadId) -> Self {
        Self { a, b }
    }

    #[must_use]
    pub fn touches(&self, pad: PadId) -> bool {
        self.a == pad || self.b == pad
    }

    /// The other end of the bridge, if it touches `pad`.
    #[must_use]
    pub fn other(&self, pad: PadId) -> Option<PadId> {
        if self.a == pad {
            Some(self.b)
        } else if self.b == pad {
            Some(self.a)
        } else {
            None
        }
    }
}

impl PartialEq for Bridge {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListFull;

/// Bounded list of bridges without duplicates.
///
/// Suitable both as the staging list of a session and as the in-memory image
/// of a persisted slot.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bridges {
    bridges: Vec<Bridge, MAX_BRIDGES>,
}

impl Bridges {
    /// Insert a bridge. Already present bridges are not duplicated.
    ///
    /// # Errors
    ///
    /// Fails with `ListFull` when there is no capacity left.
    pub fn add(&mut self, bridge: Bridge) -> Result<(), ListFull> {
        if self.contains(bridge) {
            return Ok(());
        }
        self.bridges.push(bridge).map_err(|_| ListFull)
    }

    /// Remove bridges touching `pad`, or only the bridge `pad`-`other` when
    /// `other` is given. Returns the number of removed bridges.
    pub fn remove(&mut self, pad: PadId, other: Option<PadId>) -> usize {
        let before = self.bridges.len();
        self.bridges.retain(|bridge| match other {
            Some(other) => *bridge != Bridge::new(pad, other),
            None => !bridge.touches(pad),
        });
        before - self.bridges.len()
    }

    /// Pads bridged to `pad`.
    #[must_use]
    pub fn connected_to(&self, pad: PadId) -> Nodes {
        let mut nodes = Nodes::new();
        for other in self.bridges.iter().filter_map(|b| b.other(pad)) {
            if !nodes.contains(&other) {
                // NOTE: Pads connected beyond capacity are not reported.
                let _: Result<_, _> = nodes.push(other);
            }
        }
        nodes
    }

    #[must_use]
    pub fn contains(&self, bridge: Bridge) -> bool {
        self.bridges.contains(&bridge)
    }

    /// Move all bridges into `destination`, keeping those that did not fit.
    ///
    /// # Errors
    ///
    /// Fails with `ListFull` when the destination ran out of capacity.
    pub fn drain_into(&mut self, destination: &mut Bridges) -> Result<(), ListFull> {
        while let Some(bridge) = self.bridges.last().copied() {
            destination.add(bridge)?;
            self.bridges.pop();
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bridge> {
        self.bridges.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}
