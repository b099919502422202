//! LED ring state: colors, per-LED mask, display switch and blinking.
//!
//! Nothing here touches hardware. [`LedBuffer::frame`] snapshots the visible
//! state in wire order, which is what a commit latches for the transmitter.

use crate::colors::{self, BLACK, Rgb8};
use crate::config::Config;
use crate::time::TimeInstant;
use crate::types::{CHANNELS, IndexError, LED_COUNT};

/// Channel bytes for every LED in wire (GRB) order, LED 0 first.
pub type Frame = [[u8; CHANNELS]; LED_COUNT];

/// A frame with every LED dark.
pub const BLANK: Frame = [[0; CHANNELS]; LED_COUNT];

/// Requested colors plus the masks that decide what is actually shown.
#[derive(Debug, Clone, PartialEq)]
pub struct LedBuffer {
    colors: [Rgb8; LED_COUNT],
    mask: u16,
    display_on: bool,
}

impl LedBuffer {
    /// Creates a buffer with every color black.
    pub fn new(config: &Config) -> Self {
        Self {
            colors: [BLACK; LED_COUNT],
            mask: config.led_mask,
            display_on: config.display_on,
        }
    }

    /// Stores the color for LED `id`. No hardware effect until the next commit.
    pub fn set_color(&mut self, id: usize, color: Rgb8) -> Result<(), IndexError> {
        let slot = self.colors.get_mut(id).ok_or(IndexError::LedOutOfRange(id))?;
        *slot = color;
        Ok(())
    }

    /// Stores a packed `0bIIRRGGBB` color for LED `id`.
    pub fn set_color_packed(&mut self, id: usize, packed: u8) -> Result<(), IndexError> {
        self.set_color(id, colors::unpack(packed))
    }

    /// Stores a `0xRRGGBB` color for LED `id`.
    pub fn set_color_u24(&mut self, id: usize, value: u32) -> Result<(), IndexError> {
        self.set_color(id, colors::from_u24(value))
    }

    /// Requested colors, LED 0 first.
    pub fn colors(&self) -> &[Rgb8; LED_COUNT] {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut [Rgb8; LED_COUNT] {
        &mut self.colors
    }

    /// Sets every LED to the same color.
    pub fn set_all(&mut self, color: Rgb8) {
        self.colors = [color; LED_COUNT];
    }

    /// Returns the requested color of LED `id`, regardless of masking.
    pub fn color(&self, id: usize) -> Option<Rgb8> {
        self.colors.get(id).copied()
    }

    /// Returns the requested color of LED `id` as `0xRRGGBB`.
    pub fn color_u24(&self, id: usize) -> Option<u32> {
        self.color(id).map(colors::to_u24)
    }

    /// Sets every color to black. Mask and display state are untouched.
    pub fn clear(&mut self) {
        self.set_all(BLACK);
    }

    /// Replaces the whole on/off mask (bit n = LED n).
    pub fn set_mask(&mut self, mask: u16) {
        self.mask = mask;
    }

    /// Switches a single LED on or off without changing its color.
    pub fn set_mask_bit(&mut self, id: usize, on: bool) -> Result<(), IndexError> {
        if id >= LED_COUNT {
            return Err(IndexError::LedOutOfRange(id));
        }
        if on {
            self.mask |= 1 << id;
        } else {
            self.mask &= !(1 << id);
        }
        Ok(())
    }

    pub fn mask(&self) -> u16 {
        self.mask
    }

    /// Returns true if LED `id` is enabled by the mask.
    pub fn is_masked_on(&self, id: usize) -> bool {
        id < LED_COUNT && self.mask & (1 << id) != 0
    }

    pub fn set_display_state(&mut self, on: bool) {
        self.display_on = on;
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    /// Snapshots what the ring should show right now.
    ///
    /// Masked-off LEDs, a switched-off display and the dark half of a blink
    /// cycle all produce zero bytes.
    pub fn frame(&self, blink_lit: bool) -> Frame {
        let mut frame = BLANK;
        if !(self.display_on && blink_lit) {
            return frame;
        }
        for (id, (slot, color)) in frame.iter_mut().zip(self.colors.iter()).enumerate() {
            if self.is_masked_on(id) {
                *slot = colors::to_grb(*color);
            }
        }
        frame
    }
}

impl Default for LedBuffer {
    fn default() -> Self {
        Self::new(&Config::DEFAULT)
    }
}

/// Blink configuration and the current lit/dark phase.
///
/// The phase only moves when [`Blink::service`] is called, so it runs on
/// whatever clock the main loop already uses for debouncing.
#[derive(Debug, Clone, Copy)]
pub struct Blink<I: TimeInstant> {
    enabled: bool,
    on_ms: u16,
    off_ms: u16,
    lit: bool,
    phase_start: Option<I>,
    reported_lit: bool,
}

impl<I: TimeInstant> Blink<I> {
    /// Creates a disabled blinker with the configured delays.
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: false,
            on_ms: config.blink_on_ms,
            off_ms: config.blink_off_ms,
            lit: true,
            phase_start: None,
            reported_lit: true,
        }
    }

    /// Enables or disables blinking. A new cycle starts lit.
    pub fn set_state(&mut self, on: bool) {
        if on == self.enabled {
            return;
        }
        self.enabled = on;
        self.lit = true;
        self.phase_start = None;
    }

    /// Enables or disables blinking and sets both delays at once.
    pub fn configure(&mut self, on: bool, on_ms: u16, off_ms: u16) {
        self.on_ms = on_ms;
        self.off_ms = off_ms;
        self.set_state(on);
    }

    pub fn set_on_delay(&mut self, ms: u16) {
        self.on_ms = ms;
    }

    pub fn set_off_delay(&mut self, ms: u16) {
        self.off_ms = ms;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn on_delay(&self) -> u16 {
        self.on_ms
    }

    pub fn off_delay(&self) -> u16 {
        self.off_ms
    }

    /// Returns true if the display should currently be shown.
    pub fn is_lit(&self) -> bool {
        !self.enabled || self.lit
    }

    /// Advances the blink phase to `now`.
    ///
    /// Returns true when the visible state differs from the one reported by
    /// the previous call, i.e. when the LEDs need to be retransmitted. This
    /// includes the return to lit after blinking is disabled mid-cycle.
    pub fn service(&mut self, now: I) -> bool {
        if self.enabled {
            match self.phase_start {
                None => {
                    self.phase_start = Some(now);
                }
                Some(start) => {
                    let hold = if self.lit { self.on_ms } else { self.off_ms };
                    if now.millis_since(start) >= u64::from(hold) {
                        self.lit = !self.lit;
                        self.phase_start = Some(now);
                    }
                }
            }
        }

        let lit = self.is_lit();
        let changed = lit != self.reported_lit;
        self.reported_lit = lit;
        changed
    }
}
