//! Simulated peripherals and collaborators for host tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::bridge::{Bridge, Bridges, Nodes};
use crate::collaborator::{Connectivity, Feedback, Glyph, NodeList, RefreshKind, StorageError};
use crate::coordinator::{Coordinator, Core};
use crate::hal::{ButtonPin, Clock, CurrentSense, Encoder, EncoderEdge, PinRole, ProbeAdc, Pull};
use crate::pad::PadId;

/// Clock advancing only when slept on. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    ns: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u32) {
        self.ns.set(self.ns.get() + u64::from(ms) * 1_000_000);
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.ns.set(self.ns.get() + u64::from(ns));
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        (self.ns.get() / 1_000_000) as u32
    }
}

#[derive(Debug)]
enum Script {
    Cycle(Vec<u16>),
    /// Readings taking effect at the given millisecond.
    Timeline(MockClock, Vec<(u32, u16)>),
}

#[derive(Debug)]
struct AdcState {
    script: Script,
    reads: usize,
}

/// ADC replaying scripted readings. Clones share the same script.
#[derive(Debug, Clone)]
pub struct MockAdc {
    state: Rc<RefCell<AdcState>>,
}

impl MockAdc {
    pub fn cycling(readings: &[u16]) -> Self {
        Self::with_script(Script::Cycle(readings.iter().copied().collect()))
    }

    pub fn timeline(clock: &MockClock, readings: &[(u32, u16)]) -> Self {
        Self::with_script(Script::Timeline(clock.clone(), readings.iter().copied().collect()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            state: Rc::new(RefCell::new(AdcState { script, reads: 0 })),
        }
    }

    pub fn set_cycle(&self, readings: &[u16]) {
        let mut state = self.state.borrow_mut();
        state.script = Script::Cycle(readings.iter().copied().collect());
        state.reads = 0;
    }

    pub fn reads_taken(&self) -> usize {
        self.state.borrow().reads
    }
}

impl ProbeAdc for MockAdc {
    fn read(&mut self) -> u16 {
        let mut state = self.state.borrow_mut();
        let reads = state.reads;
        state.reads += 1;
        match &state.script {
            Script::Cycle(readings) => readings[reads % readings.len()],
            Script::Timeline(clock, readings) => {
                let now = clock.now_ms();
                readings
                    .iter()
                    .take_while(|(since, _)| *since <= now)
                    .last()
                    .map_or(0, |(_, reading)| *reading)
            }
        }
    }
}

#[derive(Debug)]
struct PinState {
    role: PinRole,
    roles_taken: Vec<PinRole>,
    level: bool,
    presses: Vec<(bool, u32, u32)>,
}

/// LED data pin with a simulated button on it.
///
/// A pressed button forces its level on the pin. A released pin follows its
/// pull, a floating one keeps the level it was left with.
#[derive(Debug)]
pub struct MockPin {
    clock: MockClock,
    state: RefCell<PinState>,
}

impl MockPin {
    pub fn new(clock: &MockClock) -> Self {
        Self {
            clock: clock.clone(),
            state: RefCell::new(PinState {
                role: PinRole::LedData,
                roles_taken: Vec::new(),
                level: false,
                presses: Vec::new(),
            }),
        }
    }

    /// Hold the button forcing `level_high` between `start_ms` and `end_ms`.
    pub fn press(&self, level_high: bool, start_ms: u32, end_ms: u32) {
        self.state
            .borrow_mut()
            .presses
            .push((level_high, start_ms, end_ms));
    }

    pub fn roles_taken(&self) -> Vec<PinRole> {
        self.state.borrow().roles_taken.clone()
    }
}

impl ButtonPin for MockPin {
    fn role(&self) -> PinRole {
        self.state.borrow().role
    }

    fn set_role(&mut self, role: PinRole) {
        let state = self.state.get_mut();
        state.role = role;
        state.roles_taken.push(role);
    }

    fn set_input(&mut self, pull: Pull) {
        let state = self.state.get_mut();
        match pull {
            Pull::Up => state.level = true,
            Pull::Down => state.level = false,
            Pull::Floating => (),
        }
    }

    fn drive_low(&mut self) {
        self.state.get_mut().level = false;
    }

    fn is_high(&mut self) -> bool {
        let now = self.clock.now_ms();
        let state = self.state.get_mut();
        state
            .presses
            .iter()
            .find(|(_, start, end)| (*start..*end).contains(&now))
            .map_or(state.level, |(level, _, _)| *level)
    }
}

#[derive(Debug, Default)]
pub struct MockEncoder {
    edges: VecDeque<EncoderEdge>,
}

impl MockEncoder {
    pub fn push(&mut self, edge: EncoderEdge) {
        self.edges.push_back(edge);
    }
}

impl Encoder for MockEncoder {
    fn poll(&mut self) -> Option<EncoderEdge> {
        self.edges.pop_front()
    }
}

#[derive(Debug)]
pub struct MockCurrent {
    current_ma: f32,
    readings: usize,
}

impl MockCurrent {
    pub fn new(current_ma: f32) -> Self {
        Self {
            current_ma,
            readings: 0,
        }
    }

    pub fn set(&mut self, current_ma: f32) {
        self.current_ma = current_ma;
    }

    pub fn readings(&self) -> usize {
        self.readings
    }
}

impl CurrentSense for MockCurrent {
    fn current_ma(&mut self) -> f32 {
        self.readings += 1;
        self.current_ma
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCall {
    Refresh(RefreshKind),
    Highlight(PadId, i16),
    ClearHighlight,
    Glyph(Glyph),
}

/// Breadboard keeping its node list in memory and recording feedback.
#[derive(Debug, Default)]
pub struct MockBoard<'a> {
    coordinator: Option<&'a Coordinator>,
    pub staged: Bridges,
    pub durable: Bridges,
    pub unconnectable: Vec<PadId>,
    pub disallowed: Vec<Bridge>,
    pub fail_writes: bool,
    pub feedback: Vec<FeedbackCall>,
    /// Feedback calls made without holding the shared devices.
    pub unclaimed_feedback: usize,
    pub writes: usize,
}

impl<'a> MockBoard<'a> {
    pub fn new(coordinator: &'a Coordinator) -> Self {
        Self {
            coordinator: Some(coordinator),
            ..Self::default()
        }
    }

    fn record(&mut self, call: FeedbackCall) {
        if let Some(coordinator) = self.coordinator {
            if !coordinator.is_busy(Core::Logic) {
                self.unclaimed_feedback += 1;
            }
        }
        self.feedback.push(call);
    }

    fn write(&mut self) -> Result<(), StorageError> {
        self.writes += 1;
        if self.fail_writes {
            Err(StorageError::Write)
        } else {
            Ok(())
        }
    }
}

impl Connectivity for MockBoard<'_> {
    fn is_connectable(&self, pad: PadId) -> bool {
        !self.unconnectable.contains(&pad)
    }

    fn connection_allowed(&self, a: PadId, b: PadId) -> bool {
        !self.disallowed.contains(&Bridge::new(a, b))
    }
}

impl NodeList for MockBoard<'_> {
    fn add_bridge(
        &mut self,
        a: PadId,
        b: PadId,
        _slot: u8,
        staged: bool,
    ) -> Result<(), StorageError> {
        if staged {
            return self
                .staged
                .add(Bridge::new(a, b))
                .map_err(|_| StorageError::Full);
        }
        self.write()?;
        self.durable
            .add(Bridge::new(a, b))
            .map_err(|_| StorageError::Full)
    }

    fn remove_bridge(
        &mut self,
        pad: PadId,
        other: Option<PadId>,
        _slot: u8,
        staged: bool,
    ) -> Result<usize, StorageError> {
        if staged {
            return Ok(self.staged.remove(pad, other));
        }
        self.write()?;
        Ok(self.durable.remove(pad, other))
    }

    fn connected_to(&self, pad: PadId, _slot: u8) -> Nodes {
        let mut nodes = self.durable.connected_to(pad);
        for other in self.staged.connected_to(pad) {
            if !nodes.contains(&other) {
                let _: Result<_, _> = nodes.push(other);
            }
        }
        nodes
    }

    fn flush_staged(&mut self, _slot: u8) -> Result<(), StorageError> {
        self.write()?;
        self.staged
            .drain_into(&mut self.durable)
            .map_err(|_| StorageError::Full)
    }
}

impl Feedback for MockBoard<'_> {
    fn request_refresh(&mut self, kind: RefreshKind) {
        self.record(FeedbackCall::Refresh(kind));
    }

    fn highlight(&mut self, pad: PadId, brightness_delta: i16) {
        self.record(FeedbackCall::Highlight(pad, brightness_delta));
    }

    fn clear_highlight(&mut self) {
        self.record(FeedbackCall::ClearHighlight);
    }

    fn show_glyph(&mut self, glyph: Glyph) {
        self.record(FeedbackCall::Glyph(glyph));
    }
}
