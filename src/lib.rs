#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Device`**: Owns LED colors, mask, display and blink state, and the debounced keys
//! - **`Transmitter`**: Streams a frame to the SK6812 ring from a timer interrupt
//! - **`PulseGenerator`**: Trait to implement for your timer/GPIO pair
//! - **`Scanner`** / **`Debouncer`**: Sample the 4x4 matrix and debounce each key independently
//! - **`ButtonMatrix`**: Trait to implement for your row/column pins
//! - **`Dispatcher`**: Decodes bus write transactions and answers bus reads
//! - **`TimeSource`**: Trait to implement for your millisecond clock
//!
//! The main loop owns the `Device`, `Scanner` and `Dispatcher`. The
//! `Transmitter` is shared with the timer interrupt, typically inside a
//! critical-section mutex, and only ever receives full frame snapshots.

#[macro_use]
mod fmt;

pub mod colors;
pub mod config;
pub mod device;
pub mod leds;
pub mod pad;
pub mod protocol;
pub mod time;
pub mod transmitter;
pub mod types;

pub use colors::{BLACK, Rgb8, WHITE};
pub use config::{Config, ConfigError, PulseTiming};
pub use device::Device;
pub use leds::{BLANK, Blink, Frame, LedBuffer};
pub use pad::{ButtonMatrix, Debouncer, Scanner};
pub use protocol::{Command, Dispatcher, ReadState, Response};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use transmitter::{BitTimingTable, PulseGenerator, TransmitError, TransmitState, Transmitter};
pub use types::{BUTTON_COUNT, ColorMode, IndexError, LED_COUNT, TABLE_LEN};
