//! Power-on configuration and LED bit timing.

use crate::types::ColorMode;

/// SK6812 bit period in nanoseconds.
const PERIOD_NS: u64 = 1_250;

/// High time encoding a `0` bit.
const ZERO_HIGH_NS: u64 = 300;

/// High time encoding a `1` bit.
const ONE_HIGH_NS: u64 = 600;

/// Counter values for one bit period of the LED data line.
///
/// The counter runs from zero to `period`; the output goes high at zero and
/// is cleared when the counter reaches the loaded pulse width. Only two widths
/// are ever loaded, one per bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTiming {
    /// Counter top, in counts, for one bit period.
    pub period: u8,

    /// Compare value for a `0` bit.
    pub zero_high: u8,

    /// Compare value for a `1` bit.
    pub one_high: u8,
}

impl PulseTiming {
    /// Timing for an unprescaled counter clocked at 16 MHz.
    pub const SK6812_16MHZ: Self = Self {
        period: 20,
        zero_high: 5,
        one_high: 10,
    };

    /// Derives counts from the SK6812 timing for a counter clocked at `clock_hz`.
    ///
    /// # Errors
    /// * `InvalidPulseTiming` - the clock is too slow to tell the two widths apart
    /// * `ClockTooFast` - the period does not fit the 8-bit compare register
    pub fn for_clock_hz(clock_hz: u32) -> Result<Self, ConfigError> {
        let period = cycles(clock_hz, PERIOD_NS);
        let zero_high = cycles(clock_hz, ZERO_HIGH_NS);
        let one_high = cycles(clock_hz, ONE_HIGH_NS);

        if period > u64::from(u8::MAX) {
            return Err(ConfigError::ClockTooFast { clock_hz });
        }

        let timing = Self {
            period: period as u8,
            zero_high: zero_high as u8,
            one_high: one_high as u8,
        };
        timing.validate().map(|()| timing)
    }

    /// Checks that both widths are non-zero, distinct and inside the period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zero_high == 0 || self.zero_high >= self.one_high || self.one_high >= self.period {
            return Err(ConfigError::InvalidPulseTiming);
        }
        Ok(())
    }

    /// Compare value encoding `bit`.
    #[inline]
    pub const fn width(&self, bit: bool) -> u8 {
        if bit { self.one_high } else { self.zero_high }
    }
}

impl Default for PulseTiming {
    fn default() -> Self {
        Self::SK6812_16MHZ
    }
}

/// Rounds `ns` nanoseconds to the nearest whole count at `clock_hz`.
fn cycles(clock_hz: u32, ns: u64) -> u64 {
    (u64::from(clock_hz) * ns + 500_000_000) / 1_000_000_000
}

/// Power-on state of the board. [`crate::Device::reset`] returns here too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Debounce threshold in milliseconds, shared by every key.
    pub debounce_ms: u16,

    /// Lit duration of a blink cycle.
    pub blink_on_ms: u16,

    /// Dark duration of a blink cycle.
    pub blink_off_ms: u16,

    /// Global display switch.
    pub display_on: bool,

    /// Initial per-LED on/off mask (bit n = LED n).
    pub led_mask: u16,

    /// Payload format for color commands.
    pub color_mode: ColorMode,

    /// Bit timing for the LED data line.
    pub pulse: PulseTiming,
}

impl Config {
    /// Defaults matching the shipped firmware.
    pub const DEFAULT: Self = Self {
        debounce_ms: 5,
        blink_on_ms: 1000,
        blink_off_ms: 1000,
        display_on: true,
        led_mask: 0,
        color_mode: ColorMode::Packed8,
        pulse: PulseTiming::SK6812_16MHZ,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse widths are zero, equal, or do not fit inside the period.
    InvalidPulseTiming,

    /// The bit period needs more counts than the compare register holds.
    ClockTooFast {
        /// Requested counter clock.
        clock_hz: u32,
    },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidPulseTiming => {
                write!(f, "pulse widths must satisfy 0 < zero_high < one_high < period")
            }
            ConfigError::ClockTooFast { clock_hz } => {
                write!(f, "a {} Hz counter overflows the 8-bit bit period", clock_hz)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_mhz_matches_the_reference_counts() {
        assert_eq!(PulseTiming::for_clock_hz(16_000_000), Ok(PulseTiming::SK6812_16MHZ));
    }

    #[test]
    fn eight_mhz_rounds_to_nearest_count() {
        let timing = PulseTiming::for_clock_hz(8_000_000).unwrap();
        assert_eq!(timing.period, 10);
        assert_eq!(timing.zero_high, 2);
        assert_eq!(timing.one_high, 5);
    }

    #[test]
    fn slow_clock_is_rejected() {
        assert_eq!(
            PulseTiming::for_clock_hz(1_000_000),
            Err(ConfigError::InvalidPulseTiming)
        );
    }

    #[test]
    fn fast_clock_is_rejected() {
        assert_eq!(
            PulseTiming::for_clock_hz(250_000_000),
            Err(ConfigError::ClockTooFast { clock_hz: 250_000_000 })
        );
    }

    #[test]
    fn default_config_is_the_firmware_power_on_state() {
        let config = Config::default();
        assert_eq!(config.debounce_ms, 5);
        assert_eq!(config.blink_on_ms, 1000);
        assert_eq!(config.blink_off_ms, 1000);
        assert!(config.display_on);
        assert_eq!(config.color_mode, ColorMode::Packed8);
    }
}
