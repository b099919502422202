//! Shared test infrastructure for moka-core integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use moka_core::{
    ButtonMatrix, Config, Device, Dispatcher, PulseGenerator, PulseTiming, TimeDuration,
    TimeInstant, TimeSource, Transmitter,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Pulse Generator
// ============================================================================

/// Records every call the transmitter makes on the timer/pin pair
#[derive(Debug, Default)]
pub struct MockPulse {
    pub period: Option<u8>,
    pub widths: Vec<u8>,
    pub running: bool,
    pub pin_low: bool,
    pub starts: usize,
    pub stops: usize,
}

impl MockPulse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PulseGenerator for MockPulse {
    fn configure_period(&mut self, period: u8) {
        self.period = Some(period);
    }

    fn load_pulse_width(&mut self, width: u8) {
        self.widths.push(width);
    }

    fn start(&mut self) {
        self.running = true;
        self.pin_low = false;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.pin_low = true;
        self.stops += 1;
    }
}

/// Drives the timer interrupt until the transmitter goes idle.
/// Returns the number of interrupts taken.
pub fn run_to_completion(tx: &mut Transmitter<MockPulse>) -> usize {
    let mut interrupts = 0;
    while tx.is_busy() {
        tx.on_period_elapsed();
        interrupts += 1;
        assert!(interrupts <= moka_core::TABLE_LEN, "transmitter never finished");
    }
    interrupts
}

// ============================================================================
// Mock Key Matrix
// ============================================================================

/// Key matrix with active-low columns and a settable set of pressed keys
#[derive(Debug, Default)]
pub struct MockMatrix {
    pub pressed: u16,
    pub selected: Option<usize>,
    pub rows_selected: Vec<usize>,
    pub released: bool,
}

impl MockMatrix {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ButtonMatrix for MockMatrix {
    fn select_row(&mut self, row: usize) {
        self.selected = Some(row);
        self.rows_selected.push(row);
        self.released = false;
    }

    fn read_columns(&mut self) -> u8 {
        let row = self.selected.expect("columns read with no row selected");
        let pressed = ((self.pressed >> (row * 4)) & 0x0F) as u8;
        // Pull-ups: released keys read high
        !pressed & 0x0F
    }

    fn release(&mut self) {
        self.selected = None;
        self.released = true;
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub fn new_device() -> Device<TestInstant> {
    Device::new(Config::default())
}

pub fn new_transmitter() -> Transmitter<MockPulse> {
    new_transmitter_with(Config::default().pulse)
}

pub fn new_transmitter_with(timing: PulseTiming) -> Transmitter<MockPulse> {
    Transmitter::new(MockPulse::new(), timing).expect("valid pulse timing")
}

/// Device and dispatcher in power-on state
pub fn new_board() -> (Device<TestInstant>, Dispatcher) {
    (new_device(), Dispatcher::default())
}

/// Number of `1` bits in the table of the last armed frame
pub fn one_bits(tx: &Transmitter<MockPulse>) -> usize {
    let one = tx.timing().one_high;
    tx.table().as_slice().iter().filter(|&&w| w == one).count()
}
