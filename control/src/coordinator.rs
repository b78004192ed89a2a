//! Handoff of the LED strip and crosspoint matrix between the two cores.
//!
//! The logic core runs the probing session, the LED core renders and writes
//! the matrix. Both touch the same LED buffer and matrix driver. Before doing
//! so, a core claims the shared devices. A claim announces the core as busy
//! and waits until the peer is not. Claims are released when dropped.
//!
//! The logic core also posts refresh requests for the LED core to pick up.
//! A pending request is never downgraded by a later, cheaper one.

use core::hint;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::collaborator::RefreshKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Core {
    Logic,
    Led,
}

impl Core {
    fn index(self) -> usize {
        match self {
            Self::Logic => 0,
            Self::Led => 1,
        }
    }

    fn peer(self) -> Self {
        match self {
            Self::Logic => Self::Led,
            Self::Led => Self::Logic,
        }
    }
}

#[derive(Debug)]
pub struct Coordinator {
    busy: [AtomicBool; 2],
    probe_active: AtomicBool,
    refresh: AtomicU8,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: [AtomicBool::new(false), AtomicBool::new(false)],
            probe_active: AtomicBool::new(false),
            refresh: AtomicU8::new(0),
        }
    }

    /// Spin until the peer core is idle, then hold the shared devices.
    pub fn claim(&self, core: Core) -> Claim<'_> {
        loop {
            if let Some(claim) = self.try_claim(core) {
                return claim;
            }
            hint::spin_loop();
        }
    }

    /// Hold the shared devices if the peer core is idle.
    pub fn try_claim(&self, core: Core) -> Option<Claim<'_>> {
        let own = &self.busy[core.index()];
        let peer = &self.busy[core.peer().index()];

        // Announce first, then look. With sequentially consistent ordering
        // at most one of two racing cores sees its peer idle.
        own.store(true, Ordering::SeqCst);
        if peer.load(Ordering::SeqCst) {
            own.store(false, Ordering::SeqCst);
            return None;
        }
        Some(Claim {
            coordinator: self,
            core,
        })
    }

    #[must_use]
    pub fn is_busy(&self, core: Core) -> bool {
        self.busy[core.index()].load(Ordering::SeqCst)
    }

    pub fn set_probe_active(&self, active: bool) {
        self.probe_active.store(active, Ordering::Release);
    }

    /// The LED core keeps its hands off probe highlights while a session
    /// runs.
    #[must_use]
    pub fn probe_active(&self) -> bool {
        self.probe_active.load(Ordering::Acquire)
    }

    pub fn post_refresh(&self, kind: RefreshKind) {
        self.refresh.fetch_max(kind as u8, Ordering::AcqRel);
    }

    /// Take the pending refresh request, leaving none behind.
    pub fn take_refresh(&self) -> Option<RefreshKind> {
        RefreshKind::from_level(self.refresh.swap(0, Ordering::AcqRel))
    }
}

/// Exclusive access of one core to the shared devices.
#[derive(Debug)]
pub struct Claim<'a> {
    coordinator: &'a Coordinator,
    core: Core,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.coordinator.busy[self.core.index()].store(false, Ordering::SeqCst);
    }
}
