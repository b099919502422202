//! Fixed board dimensions and shared small types.

/// Number of LEDs on the ring.
pub const LED_COUNT: usize = 16;

/// Color channels per LED.
pub const CHANNELS: usize = 3;

/// Number of keys on the pad.
pub const BUTTON_COUNT: usize = 16;

/// Rows driven by the matrix scanner.
pub const MATRIX_ROWS: usize = 4;

/// Columns sampled for each row.
pub const MATRIX_COLS: usize = 4;

/// Entries in a bit timing table: one per transmitted bit.
pub const TABLE_LEN: usize = LED_COUNT * CHANNELS * 8;

/// Payload encoding for the color-setting opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorMode {
    /// One byte per LED, packed as `0bIIRRGGBB`.
    #[default]
    Packed8,

    /// Three bytes per LED, R then G then B.
    Rgb24,
}

impl ColorMode {
    /// Decodes the mode bit carried by the color-mode opcode.
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit { ColorMode::Rgb24 } else { ColorMode::Packed8 }
    }

    /// Number of payload bytes describing one LED in this mode.
    #[inline]
    pub const fn bytes_per_led(self) -> usize {
        match self {
            ColorMode::Packed8 => 1,
            ColorMode::Rgb24 => CHANNELS,
        }
    }
}

/// An index did not name an existing LED or key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndexError {
    /// LED index outside `0..LED_COUNT`.
    LedOutOfRange(usize),

    /// Key index outside `0..BUTTON_COUNT`.
    ButtonOutOfRange(usize),
}

impl core::fmt::Display for IndexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexError::LedOutOfRange(id) => {
                write!(f, "LED {} does not exist (ring has {} LEDs)", id, LED_COUNT)
            }
            IndexError::ButtonOutOfRange(id) => {
                write!(f, "button {} does not exist (pad has {} keys)", id, BUTTON_COUNT)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IndexError {}
