//! 4x4 key matrix scanning and per-key debouncing.
//!
//! Keys are numbered `row * 4 + column`. A set bit in any state word means
//! the key is pressed.

use core::marker::PhantomData;

use crate::device::Device;
use crate::time::{TimeInstant, TimeSource};
use crate::types::{BUTTON_COUNT, IndexError, MATRIX_COLS, MATRIX_ROWS};

const COLUMN_MASK: u8 = (1 << MATRIX_COLS) - 1;

/// Trait for abstracting the key matrix pins.
///
/// Rows are outputs driven low to select them; columns are pulled-up inputs
/// that read low when the key at the selected row is pressed.
pub trait ButtonMatrix {
    /// Drives `row` active and every other row inactive.
    fn select_row(&mut self, row: usize);

    /// Reads the column input levels, bit n for column n, high = released.
    fn read_columns(&mut self) -> u8;

    /// Returns every matrix pin to its idle, high-impedance configuration.
    fn release(&mut self);
}

/// Debounced key state with an independent timer per key.
///
/// A raw change restarts that key's timer. Once the raw value has been
/// stable for at least the debounce delay and differs from the published
/// value, it is committed. A delay of zero publishes every change on the
/// scan that sees it.
#[derive(Debug, Clone)]
pub struct Debouncer<I: TimeInstant> {
    raw: u16,
    debounced: u16,
    last_change: [Option<I>; BUTTON_COUNT],
    delay_ms: u16,
    changed: bool,
}

impl<I: TimeInstant> Debouncer<I> {
    /// Creates a debouncer with every key released.
    pub fn new(delay_ms: u16) -> Self {
        Self {
            raw: 0,
            debounced: 0,
            last_change: [None; BUTTON_COUNT],
            delay_ms,
            changed: false,
        }
    }

    pub fn set_debounce_delay(&mut self, delay_ms: u16) {
        self.delay_ms = delay_ms;
    }

    pub fn debounce_delay(&self) -> u16 {
        self.delay_ms
    }

    /// Feeds one full matrix sample taken at `now`.
    ///
    /// Returns true if the published state changed. The published word is
    /// replaced in one store, so readers never observe a partly applied scan.
    pub fn update(&mut self, raw: u16, now: I) -> bool {
        let toggled = raw ^ self.raw;
        let mut next = self.debounced;

        for (bit, since) in self.last_change.iter_mut().enumerate() {
            let mask = 1u16 << bit;
            if toggled & mask != 0 {
                *since = Some(now);
            }
            if (raw ^ next) & mask == 0 {
                continue;
            }
            let stable = match *since {
                Some(since) => now.millis_since(since) >= u64::from(self.delay_ms),
                None => true,
            };
            if stable {
                next = (next & !mask) | (raw & mask);
            }
        }

        self.raw = raw;
        if next == self.debounced {
            return false;
        }

        debug!("keys {=u16:x} -> {=u16:x}", self.debounced, next);
        self.debounced = next;
        self.changed = true;
        true
    }

    /// Returns the debounced state of key `id`.
    pub fn button(&self, id: usize) -> Result<bool, IndexError> {
        if id >= BUTTON_COUNT {
            return Err(IndexError::ButtonOutOfRange(id));
        }
        Ok(self.debounced & (1 << id) != 0)
    }

    /// Returns the debounced state of all keys.
    pub fn buttons(&self) -> u16 {
        self.debounced
    }

    /// Returns the last undebounced sample.
    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Returns true if the debounced state changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }
}

/// Drives the matrix rows and feeds complete samples to a [`Device`].
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `M` - Matrix pin implementation
/// * `T` - Time source implementation type
pub struct Scanner<'t, I: TimeInstant, M: ButtonMatrix, T: TimeSource<I>> {
    matrix: M,
    time_source: &'t T,
    _instant: PhantomData<I>,
}

impl<'t, I: TimeInstant, M: ButtonMatrix, T: TimeSource<I>> Scanner<'t, I, M, T> {
    /// Takes ownership of the matrix pins and parks them idle.
    pub fn new(mut matrix: M, time_source: &'t T) -> Self {
        matrix.release();
        Self {
            matrix,
            time_source,
            _instant: PhantomData,
        }
    }

    /// Samples the whole matrix and debounces it into `device`.
    ///
    /// One timestamp is taken per scan so all keys are judged against the
    /// same instant. Returns true if the debounced state changed.
    pub fn scan(&mut self, device: &mut Device<I>) -> bool {
        let now = self.time_source.now();
        let raw = self.read_matrix();
        device.pad_mut().update(raw, now)
    }

    /// Reads every row once and returns the pressed keys.
    ///
    /// The pins are released before returning.
    pub fn read_matrix(&mut self) -> u16 {
        let mut raw = 0u16;
        for row in 0..MATRIX_ROWS {
            self.matrix.select_row(row);
            let pressed = !self.matrix.read_columns() & COLUMN_MASK;
            raw |= u16::from(pressed) << (row * MATRIX_COLS);
        }
        self.matrix.release();
        raw
    }

    /// Returns a reference to the matrix pins.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }
}
