//! Interactive connect and clear session of the probe.
//!
//! A session turns a stream of probe events into node list mutations:
//!
//! ```text
//!            Pad(p)                   Pad(q), q != p
//!   [Idle] ---------> [AwaitingFirst] ----------------> [AwaitingSecond]
//!     A                   |    (Clear mode: p alone)           |
//!     |                   +-------------+    +-----------------+
//!     |                                 V    V
//!     +----------------------------- [Committing]
//!
//!   short button press, inactivity ----------------------> [Exiting]
//!   long button press -------------------> [Idle] with the other mode
//! ```
//!
//! A half finished gesture is abandoned after a short while without a pad,
//! by re-tapping the selected pad, by an encoder edge or by a mode switch.
//! Abandoning never commits anything.

use heapless::Vec;

use crate::animation::{Fade, Flash, FlashStep, FLASH_DELTA};
use crate::bridge::{Bridge, Nodes};
use crate::button::Press;
use crate::collaborator::{Breadboard, RefreshKind, StorageError};
use crate::config::Config;
use crate::coordinator::{Coordinator, Core};
use crate::hal::{elapsed, ButtonPin, Clock, CurrentSense, Encoder, ProbeAdc};
use crate::log;
use crate::pad::PadId;
use crate::source::{Event, ProbeEventSource};
use crate::switch_position::{SwitchPositionMonitor, Thresholds};

/// Brightness boost of a selected pad.
const SELECT_DELTA: i16 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Idle,
    AwaitingFirst,
    AwaitingSecond,
    Committing,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Connect,
    Clear,
}

impl Mode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Connect => Self::Clear,
            Self::Clear => Self::Connect,
        }
    }
}

/// Pads selected within the gesture in progress.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingSelection {
    pads: Vec<PadId, 2>,
}

impl PendingSelection {
    fn push(&mut self, pad: PadId) {
        // NOTE: The session never selects more than two pads.
        let _: Result<_, _> = self.pads.push(pad);
    }

    fn clear(&mut self) {
        self.pads.clear();
    }

    #[must_use]
    pub fn first(&self) -> Option<PadId> {
        self.pads.first().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PadId] {
        &self.pads
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    NotConnectable(PadId),
    NotAllowed(Bridge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExitReason {
    Button,
    Inactivity,
}

/// Result of handling a single event, meant to be rendered by the console
/// or display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Idle,
    Selected(PadId),
    Connected(Bridge),
    Cleared {
        pad: PadId,
        removed: usize,
        nodes: Nodes,
    },
    Rejected(Rejection),
    Cancelled,
    ModeChanged(Mode),
    StorageFailed(StorageError),
    Exited(ExitReason),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Summary {
    pub bridges_added: u16,
    pub bridges_removed: u16,
    pub storage_failures: u16,
    /// Staged bridges could not be written before the session ended.
    pub unflushed: bool,
    pub exit: Option<ExitReason>,
}

#[derive(Debug)]
pub struct Session<'a> {
    coordinator: &'a Coordinator,
    config: Config,
    slot: u8,
    state: SessionState,
    mode: Mode,
    selection: PendingSelection,
    last_selection: u32,
    last_activity: u32,
    last_flush: u32,
    staged_dirty: bool,
    connected_once: bool,
    fade: Fade,
    flash: Flash,
    monitor: SwitchPositionMonitor,
    summary: Summary,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(
        mode: Mode,
        slot: u8,
        config: Config,
        thresholds: Thresholds,
        coordinator: &'a Coordinator,
        now: u32,
    ) -> Self {
        match mode {
            Mode::Connect => {
                log::info!("connect nodes");
            }
            Mode::Clear => {
                log::info!("clear nodes");
            }
        }
        Self {
            coordinator,
            config,
            slot,
            state: SessionState::Idle,
            mode,
            selection: PendingSelection::default(),
            last_selection: now,
            last_activity: now,
            last_flush: now,
            staged_dirty: false,
            connected_once: false,
            fade: Fade::default(),
            flash: Flash::default(),
            monitor: SwitchPositionMonitor::new(thresholds, config.switch_position_interval_ms),
            summary: Summary::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn selection(&self) -> &PendingSelection {
        &self.selection
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Drive the session until it exits.
    pub fn run<A, P, E, C, S, B>(
        &mut self,
        source: &mut ProbeEventSource<A, P, E>,
        clock: &mut C,
        sense: &mut S,
        board: &mut B,
    ) -> Summary
    where
        A: ProbeAdc,
        P: ButtonPin,
        E: Encoder,
        C: Clock,
        S: CurrentSense,
        B: Breadboard,
    {
        self.coordinator.set_probe_active(true);
        loop {
            let event = source.read_blocking(clock, self.config.read_timeout_ms, false);
            let now = clock.now_ms();
            if event == Event::Timeout {
                self.poll_switch_position(sense, now, source.is_checking_button(), board);
            }
            if let Outcome::Exited(_) = self.handle(event, now, board) {
                return self.summary;
            }
        }
    }

    /// Advance the state machine by a single event.
    pub fn handle<B: Breadboard>(&mut self, event: Event, now: u32, board: &mut B) -> Outcome {
        if self.state == SessionState::Exiting {
            return Outcome::Exited(self.summary.exit.unwrap_or(ExitReason::Button));
        }

        if event == Event::Timeout {
            return self.housekeeping(now, board);
        }

        self.last_activity = now;
        let abandoned = self.abandon_stale_selection(now, board);

        match event {
            Event::Pad(pad) => self.select(pad, now, board),
            Event::RemoveButton(press) | Event::ConnectButton(press) => match press {
                Press::Short => self.exit(ExitReason::Button, board),
                Press::Long => self.toggle_mode(board),
            },
            _ => {
                if self.cancel(board) || abandoned {
                    Outcome::Cancelled
                } else {
                    Outcome::Idle
                }
            }
        }
    }

    /// Check the probe switch and show the matching idle glyph when it
    /// moved.
    pub fn poll_switch_position<S: CurrentSense, B: Breadboard>(
        &mut self,
        sense: &mut S,
        now: u32,
        checking_button: bool,
        board: &mut B,
    ) {
        if let Some(position) = self.monitor.poll(sense, now, checking_button) {
            let _claim = self.coordinator.claim(Core::Logic);
            board.show_glyph(position.glyph());
        }
    }

    fn select<B: Breadboard>(&mut self, pad: PadId, now: u32, board: &mut B) -> Outcome {
        match (self.state, self.selection.first()) {
            (SessionState::AwaitingFirst, Some(first)) => {
                self.select_second(first, pad, now, board)
            }
            _ => self.select_first(pad, now, board),
        }
    }

    fn select_first<B: Breadboard>(&mut self, pad: PadId, now: u32, board: &mut B) -> Outcome {
        if !board.is_connectable(pad) {
            log::warning!("{} is not connectable", pad.name());
            return Outcome::Rejected(Rejection::NotConnectable(pad));
        }

        log::info!("{}", pad.name());
        self.selection.clear();
        self.selection.push(pad);
        self.state = SessionState::AwaitingFirst;
        self.last_selection = now;
        {
            let _claim = self.coordinator.claim(Core::Logic);
            board.highlight(pad, SELECT_DELTA);
        }

        match self.mode {
            Mode::Connect => Outcome::Selected(pad),
            Mode::Clear => self.commit_clear(pad, board),
        }
    }

    fn select_second<B: Breadboard>(
        &mut self,
        first: PadId,
        pad: PadId,
        now: u32,
        board: &mut B,
    ) -> Outcome {
        if pad == first {
            self.cancel(board);
            return Outcome::Cancelled;
        }

        log::info!("{}", pad.name());
        self.selection.push(pad);
        self.state = SessionState::AwaitingSecond;
        self.last_selection = now;
        self.commit_connect(first, pad, board)
    }

    fn commit_connect<B: Breadboard>(&mut self, a: PadId, b: PadId, board: &mut B) -> Outcome {
        self.state = SessionState::Committing;
        let bridge = Bridge::new(a, b);

        let outcome = if !board.connection_allowed(a, b) {
            log::warning!("Connecting {} to {} is not allowed", a.name(), b.name());
            let _claim = self.coordinator.claim(Core::Logic);
            board.clear_highlight();
            Outcome::Rejected(Rejection::NotAllowed(bridge))
        } else {
            match self.add_bridge(bridge, board) {
                Ok(()) => {
                    log::info!("connected {} to {}", a.name(), b.name());
                    self.connected_once = true;
                    self.summary.bridges_added = self.summary.bridges_added.saturating_add(1);
                    self.flash.trigger(bridge);
                    let _claim = self.coordinator.claim(Core::Logic);
                    board.highlight(a, FLASH_DELTA);
                    board.highlight(b, FLASH_DELTA);
                    self.request_refresh(board, RefreshKind::Local);
                    Outcome::Connected(bridge)
                }
                Err(error) => {
                    log::warning!("Failed to connect {} to {}: {}", a.name(), b.name(), error);
                    self.count_storage_failure();
                    Outcome::StorageFailed(error)
                }
            }
        };

        self.reset_selection();
        outcome
    }

    fn add_bridge<B: Breadboard>(
        &mut self,
        bridge: Bridge,
        board: &mut B,
    ) -> Result<(), StorageError> {
        if self.config.durable_first_connection && !self.connected_once {
            match board.add_bridge(bridge.a, bridge.b, self.slot, false) {
                Ok(()) => return Ok(()),
                Err(_error) => {
                    log::warning!(
                        "Failed to write the first connection, staging it: {}",
                        _error
                    );
                    self.count_storage_failure();
                }
            }
        }
        board.add_bridge(bridge.a, bridge.b, self.slot, true)?;
        self.staged_dirty = true;
        Ok(())
    }

    fn commit_clear<B: Breadboard>(&mut self, pad: PadId, board: &mut B) -> Outcome {
        self.state = SessionState::Committing;
        let nodes = board.connected_to(pad, self.slot);

        // Durable first, so a failed write leaves the staged list untouched.
        let removed = board
            .remove_bridge(pad, None, self.slot, false)
            .and_then(|durable| {
                let staged = board.remove_bridge(pad, None, self.slot, true)?;
                Ok(durable + staged)
            });

        let outcome = match removed {
            Ok(removed) => {
                log::info!("cleared {} bridges of {}", removed, pad.name());
                self.summary.bridges_removed = self
                    .summary
                    .bridges_removed
                    .saturating_add(removed as u16);
                self.fade.start(pad);
                let _claim = self.coordinator.claim(Core::Logic);
                self.request_refresh(board, RefreshKind::Local);
                Outcome::Cleared {
                    pad,
                    removed,
                    nodes,
                }
            }
            Err(error) => {
                log::warning!("Failed to clear {}: {}", pad.name(), error);
                self.count_storage_failure();
                Outcome::StorageFailed(error)
            }
        };

        self.reset_selection();
        outcome
    }

    fn toggle_mode<B: Breadboard>(&mut self, board: &mut B) -> Outcome {
        self.mode = self.mode.toggled();
        self.reset_selection();
        match self.mode {
            Mode::Connect => {
                log::info!("connect nodes");
            }
            Mode::Clear => {
                log::info!("clear nodes");
            }
        }
        let _claim = self.coordinator.claim(Core::Logic);
        board.clear_highlight();
        Outcome::ModeChanged(self.mode)
    }

    fn exit<B: Breadboard>(&mut self, reason: ExitReason, board: &mut B) -> Outcome {
        self.reset_selection();
        self.state = SessionState::Exiting;

        if self.staged_dirty && self.flush(board).is_err() {
            self.summary.unflushed = true;
        }

        {
            let _claim = self.coordinator.claim(Core::Logic);
            board.clear_highlight();
            self.request_refresh(board, RefreshKind::Full);
        }
        self.coordinator.set_probe_active(false);
        self.summary.exit = Some(reason);
        log::info!("Probing session ended: {}", reason);
        Outcome::Exited(reason)
    }

    fn housekeeping<B: Breadboard>(&mut self, now: u32, board: &mut B) -> Outcome {
        if elapsed(self.last_activity, now) >= self.config.session_timeout_ms {
            return self.exit(ExitReason::Inactivity, board);
        }

        let mut outcome = if self.abandon_stale_selection(now, board) {
            Outcome::Cancelled
        } else {
            Outcome::Idle
        };

        if self.staged_dirty && elapsed(self.last_flush, now) >= self.config.flush_interval_ms {
            self.last_flush = now;
            if let Err(error) = self.flush(board) {
                outcome = Outcome::StorageFailed(error);
            }
        }

        self.animate(board);
        outcome
    }

    fn flush<B: Breadboard>(&mut self, board: &mut B) -> Result<(), StorageError> {
        match board.flush_staged(self.slot) {
            Ok(()) => {
                self.staged_dirty = false;
                Ok(())
            }
            Err(error) => {
                log::warning!("Failed to flush staged bridges: {}", error);
                self.count_storage_failure();
                Err(error)
            }
        }
    }

    fn animate<B: Breadboard>(&mut self, board: &mut B) {
        let fade = self.fade.tick();
        let flash = self.flash.tick();
        if fade.is_none() && !matches!(flash, Some(FlashStep::Settle(_))) {
            return;
        }

        let _claim = self.coordinator.claim(Core::Logic);
        if let Some((pad, delta)) = fade {
            board.highlight(pad, delta);
        }
        if let Some(FlashStep::Settle(bridge)) = flash {
            board.highlight(bridge.a, -FLASH_DELTA);
            board.highlight(bridge.b, -FLASH_DELTA);
            self.request_refresh(board, RefreshKind::LedOnly);
        }
    }

    fn abandon_stale_selection<B: Breadboard>(&mut self, now: u32, board: &mut B) -> bool {
        let pending = matches!(
            self.state,
            SessionState::AwaitingFirst | SessionState::AwaitingSecond
        );
        if pending && elapsed(self.last_selection, now) >= self.config.double_selection_timeout_ms {
            log::debug!("Selection abandoned");
            self.cancel(board)
        } else {
            false
        }
    }

    fn cancel<B: Breadboard>(&mut self, board: &mut B) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.reset_selection();
        let _claim = self.coordinator.claim(Core::Logic);
        board.clear_highlight();
        true
    }

    fn reset_selection(&mut self) {
        self.selection.clear();
        if self.state != SessionState::Exiting {
            self.state = SessionState::Idle;
        }
    }

    /// Ask for a redraw, posting it to the LED core as well.
    fn request_refresh<B: Breadboard>(&self, board: &mut B, kind: RefreshKind) {
        board.request_refresh(kind);
        self.coordinator.post_refresh(kind);
    }

    fn count_storage_failure(&mut self) {
        self.summary.storage_failures = self.summary.storage_failures.saturating_add(1);
    }
}
