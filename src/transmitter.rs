//! Interrupt-driven bitstream transmitter for the SK6812 ring.
//!
//! The LEDs take a return-to-zero code on a single wire: every bit period
//! starts with a rising edge and the high time decides the bit value. The
//! periods must follow each other without gaps, so the whole frame is turned
//! into a table of compare values before the timer starts and the interrupt
//! handler only copies the next entry into the compare register.
//!
//! Ownership is handed over explicitly. [`Transmitter::arm`] fills the table
//! and starts the timer; from then on only [`Transmitter::on_period_elapsed`]
//! touches the table and cursor until the last bit has gone out. Re-arming
//! while busy is refused, so the table can never change under the interrupt.

use crate::config::{ConfigError, PulseTiming};
use crate::leds::Frame;
use crate::types::TABLE_LEN;

/// Trait for abstracting the timer/GPIO pair that generates bit pulses.
///
/// Implement this for a timer in a PWM-like mode: the output goes high at the
/// start of each period, is cleared when the counter matches the loaded pulse
/// width, and an interrupt fires once per period. That interrupt must call
/// [`Transmitter::on_period_elapsed`].
pub trait PulseGenerator {
    /// Sets the counter top, in counts, of one bit period.
    fn configure_period(&mut self, period: u8);

    /// Loads the compare value used for the next bit period.
    fn load_pulse_width(&mut self, width: u8);

    /// Enables the data output and starts the counter.
    fn start(&mut self);

    /// Stops the counter and forces the data output low.
    fn stop(&mut self);
}

/// Precomputed compare values, one per transmitted bit.
///
/// Bits are laid out LED by LED, channel by channel in wire order, most
/// significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitTimingTable {
    entries: [u8; TABLE_LEN],
}

impl BitTimingTable {
    /// Creates a table encoding an all-zero frame.
    pub fn new(timing: &PulseTiming) -> Self {
        Self {
            entries: [timing.zero_high; TABLE_LEN],
        }
    }

    /// Rewrites every entry from `frame`.
    pub fn fill(&mut self, frame: &Frame, timing: &PulseTiming) {
        let bytes = frame.iter().flat_map(|led| led.iter());
        for (chunk, byte) in self.entries.chunks_exact_mut(8).zip(bytes) {
            for (bit, entry) in chunk.iter_mut().enumerate() {
                *entry = timing.width(byte & (0x80 >> bit) != 0);
            }
        }
    }

    /// Always [`TABLE_LEN`].
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.entries.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.entries
    }
}

/// Whether a frame is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitState {
    /// Timer stopped, table free to rebuild.
    Idle,
    /// Timer running, table and cursor owned by the interrupt handler.
    Busy,
}

/// Transmitter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// A frame is still being sent; the request was ignored.
    Busy {
        /// Bits already sent from the in-flight frame.
        cursor: usize,
    },
}

impl core::fmt::Display for TransmitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransmitError::Busy { cursor } => {
                write!(f, "transmission in progress ({}/{} bits sent)", cursor, TABLE_LEN)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransmitError {}

/// Streams frames to the LED ring through a [`PulseGenerator`].
///
/// On a microcontroller this usually lives in a critical-section mutex shared
/// between the main loop (which arms it) and the timer interrupt (which
/// advances it).
pub struct Transmitter<P: PulseGenerator> {
    pulse: P,
    timing: PulseTiming,
    table: BitTimingTable,
    cursor: usize,
    state: TransmitState,
}

impl<P: PulseGenerator> Transmitter<P> {
    /// Takes ownership of the pulse generator and leaves it stopped.
    ///
    /// Usually called with [`Config::pulse`](crate::Config::pulse).
    ///
    /// # Errors
    /// * `InvalidPulseTiming` - the two widths are not distinct and inside the
    ///   period; the generator is not touched
    pub fn new(mut pulse: P, timing: PulseTiming) -> Result<Self, ConfigError> {
        timing.validate()?;
        pulse.stop();
        pulse.configure_period(timing.period);

        Ok(Self {
            pulse,
            timing,
            table: BitTimingTable::new(&timing),
            cursor: 0,
            state: TransmitState::Idle,
        })
    }

    /// Snapshots `frame` into the timing table and starts sending it.
    ///
    /// # Errors
    /// * `Busy` - a frame is in flight; the active table is left untouched
    pub fn arm(&mut self, frame: &Frame) -> Result<(), TransmitError> {
        if self.state == TransmitState::Busy {
            return Err(TransmitError::Busy {
                cursor: self.cursor,
            });
        }

        self.table.fill(frame, &self.timing);
        self.cursor = 0;
        self.pulse.load_pulse_width(self.table.entries[0]);
        self.state = TransmitState::Busy;
        self.pulse.start();
        Ok(())
    }

    /// Advances the stream by one bit. Call from the per-period interrupt.
    ///
    /// Returns true when the last bit has been sent and the line was released.
    /// Spurious calls while idle are ignored.
    pub fn on_period_elapsed(&mut self) -> bool {
        if self.state != TransmitState::Busy {
            return false;
        }

        self.cursor += 1;
        if self.cursor >= TABLE_LEN {
            self.pulse.stop();
            self.state = TransmitState::Idle;
            return true;
        }

        self.pulse.load_pulse_width(self.table.entries[self.cursor]);
        false
    }

    pub fn state(&self) -> TransmitState {
        self.state
    }

    /// Returns true while a frame is being sent.
    pub fn is_busy(&self) -> bool {
        self.state == TransmitState::Busy
    }

    /// Index of the bit currently on the wire.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The table of the last armed frame.
    pub fn table(&self) -> &BitTimingTable {
        &self.table
    }

    pub fn timing(&self) -> PulseTiming {
        self.timing
    }

    /// Returns a reference to the underlying pulse generator.
    pub fn pulse(&self) -> &P {
        &self.pulse
    }
}
