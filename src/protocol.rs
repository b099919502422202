//! Two-wire command protocol, target side.
//!
//! A write transaction carries one opcode byte followed by its payload. The
//! high nibble selects the command family and the low bits carry an LED or
//! key index, an on/off flag or a mode bit. Multi-byte integers are
//! big-endian.
//!
//! | Opcode        | Payload             | Effect                                   |
//! |---------------|---------------------|------------------------------------------|
//! | `0x0n`        | 1 or 3 bytes        | set LED `n`                              |
//! | `0x1_`        | 1 or 3 bytes        | set every LED to one color               |
//! | `0x2_`        | 16 x (1 or 3) bytes | set every LED, one color each            |
//! | `0x3n`        | -                   | next read returns key `n` (1 byte)       |
//! | `0x4_`        | -                   | next read returns all keys (2 bytes)     |
//! | `0x50`        | 2 bytes             | LED on/off mask                          |
//! | `0x6_`        | -                   | display on (bit 0 set) or off            |
//! | `0x7_`        | -                   | blink on (bit 0 set) or off              |
//! | `0x80`        | 2 bytes             | blink on-delay, ms                       |
//! | `0x81`        | 2 bytes             | blink off-delay, ms                      |
//! | `0x82`        | 1 byte              | debounce delay, ms                       |
//! | `0x83`        | -                   | next read returns the has-changed flag   |
//! | `0x84`/`0x85` | -                   | color payloads are 1 byte / 3 bytes      |
//! | `0xF0`        | -                   | clear all colors                         |
//! | `0xF5`        | -                   | transmit the current frame               |
//! | `0xFF`        | -                   | return to power-on defaults              |
//!
//! Other opcodes are ignored together with whatever payload follows them.
//! A transaction shorter than its opcode requires reads the last latched
//! byte in place of each missing one, as the bus peripheral would.

use heapless::Vec;

use crate::colors::{self, Rgb8};
use crate::config::Config;
use crate::device::Device;
use crate::time::TimeInstant;
use crate::types::{ColorMode, LED_COUNT};

/// Opcode values and family prefixes.
pub mod opcode {
    pub const SET_ONE_LED: u8 = 0x00;
    pub const SET_GLOBAL_LED: u8 = 0x10;
    pub const SET_ALL_LED: u8 = 0x20;
    pub const GET_BUTTON: u8 = 0x30;
    pub const GET_BUTTONS: u8 = 0x40;
    pub const LED_STATE: u8 = 0x50;
    pub const DISPLAY_STATE: u8 = 0x60;
    pub const BLINK_STATE: u8 = 0x70;
    pub const BLINK_ON_DELAY: u8 = 0x80;
    pub const BLINK_OFF_DELAY: u8 = 0x81;
    pub const DEBOUNCE_DELAY: u8 = 0x82;
    pub const HAS_CHANGED: u8 = 0x83;
    pub const COLOR_MODE: u8 = 0x84;
    pub const CLR_DISPLAY: u8 = 0xF0;
    pub const UPDATE_LEDS: u8 = 0xF5;
    pub const RESET: u8 = 0xFF;

    /// Selects the command family.
    pub const FAMILY_MASK: u8 = 0xF0;

    /// Immediate parameter carried next to the family.
    pub const PARAM_MASK: u8 = 0x0F;
}

/// Longest read response.
pub const MAX_RESPONSE_LEN: usize = 2;

/// Bytes returned to the bus master on a read.
pub type Response = Vec<u8, MAX_RESPONSE_LEN>;

/// A decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    SetOneLed(u8),
    SetGlobalLed,
    SetAllLeds,
    QueryButton(u8),
    QueryButtons,
    LedMask,
    DisplayState(bool),
    BlinkState(bool),
    BlinkOnDelay,
    BlinkOffDelay,
    DebounceDelay,
    HasChanged,
    ColorMode(ColorMode),
    ClearDisplay,
    UpdateLeds,
    Reset,
    /// Not a recognised opcode; ignored.
    Unknown(u8),
}

impl Command {
    /// Decodes an opcode byte. Exact opcodes take precedence over families.
    pub const fn decode(op: u8) -> Self {
        match op {
            opcode::LED_STATE => Command::LedMask,
            opcode::BLINK_ON_DELAY => Command::BlinkOnDelay,
            opcode::BLINK_OFF_DELAY => Command::BlinkOffDelay,
            opcode::DEBOUNCE_DELAY => Command::DebounceDelay,
            opcode::HAS_CHANGED => Command::HasChanged,
            0x84 | 0x85 => Command::ColorMode(ColorMode::from_bit(op & 0x01 != 0)),
            opcode::CLR_DISPLAY => Command::ClearDisplay,
            opcode::UPDATE_LEDS => Command::UpdateLeds,
            opcode::RESET => Command::Reset,
            _ => {
                let param = op & opcode::PARAM_MASK;
                match op & opcode::FAMILY_MASK {
                    opcode::SET_ONE_LED => Command::SetOneLed(param),
                    opcode::SET_GLOBAL_LED => Command::SetGlobalLed,
                    opcode::SET_ALL_LED => Command::SetAllLeds,
                    opcode::GET_BUTTON => Command::QueryButton(param),
                    opcode::GET_BUTTONS => Command::QueryButtons,
                    opcode::DISPLAY_STATE => Command::DisplayState(param & 0x01 != 0),
                    opcode::BLINK_STATE => Command::BlinkState(param & 0x01 != 0),
                    _ => Command::Unknown(op),
                }
            }
        }
    }

    /// Payload bytes this command consumes in `mode`.
    pub const fn payload_len(self, mode: ColorMode) -> usize {
        match self {
            Command::SetOneLed(_) | Command::SetGlobalLed => mode.bytes_per_led(),
            Command::SetAllLeds => LED_COUNT * mode.bytes_per_led(),
            Command::LedMask | Command::BlinkOnDelay | Command::BlinkOffDelay => 2,
            Command::DebounceDelay => 1,
            _ => 0,
        }
    }
}

/// What the next bus read returns, captured when the query was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadState {
    /// Nothing pending; reads return no data.
    #[default]
    Idle,
    /// One key, as 0 or 1.
    Button(bool),
    /// All keys, big-endian.
    Buttons(u16),
    /// Whether the keys changed since the previous has-changed query.
    Changed(bool),
}

/// Payload cursor over one write transaction.
struct Payload<'a> {
    bytes: &'a [u8],
    pos: usize,
    latched: u8,
    underrun: bool,
}

impl<'a> Payload<'a> {
    fn new(bytes: &'a [u8], latched: u8) -> Self {
        Self {
            bytes,
            pos: 0,
            latched,
            underrun: false,
        }
    }

    fn next_u8(&mut self) -> u8 {
        match self.bytes.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                self.latched = byte;
            }
            None => self.underrun = true,
        }
        self.latched
    }

    fn next_u16(&mut self) -> u16 {
        let high = self.next_u8();
        let low = self.next_u8();
        u16::from_be_bytes([high, low])
    }

    fn next_color(&mut self, mode: ColorMode) -> Rgb8 {
        match mode {
            ColorMode::Packed8 => colors::unpack(self.next_u8()),
            ColorMode::Rgb24 => {
                let red = self.next_u8();
                let green = self.next_u8();
                let blue = self.next_u8();
                Rgb8::new(red, green, blue)
            }
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }
}

/// Decodes write transactions into device changes and answers reads.
///
/// The write path runs to completion inside [`Dispatcher::receive`] and only
/// touches the [`Device`]; a commit opcode queues the frame for
/// [`Device::service`] to send, so decoding never needs the transmitter. The
/// read path is a single slot: a query command fills it and the next
/// [`Dispatcher::respond`] drains it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    default_mode: ColorMode,
    color_mode: ColorMode,
    read_state: ReadState,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            default_mode: config.color_mode,
            color_mode: config.color_mode,
            read_state: ReadState::Idle,
        }
    }

    /// Handles one complete write transaction (opcode first).
    ///
    /// Returns the decoded command, or `None` for an empty transaction.
    pub fn receive<I: TimeInstant>(
        &mut self,
        device: &mut Device<I>,
        transaction: &[u8],
    ) -> Option<Command> {
        let (&op, rest) = transaction.split_first()?;
        let command = Command::decode(op);
        trace!("command {}", command);

        // The opcode is the first latched byte
        let mut payload = Payload::new(rest, op);
        self.execute(command, &mut payload, device);

        if payload.underrun {
            warn!(
                "{} short by {} bytes",
                command,
                command.payload_len(self.color_mode).saturating_sub(rest.len())
            );
        } else if payload.remaining() > 0 {
            trace!("dropped {} trailing bytes", payload.remaining());
        }
        Some(command)
    }

    fn execute<I: TimeInstant>(
        &mut self,
        command: Command,
        payload: &mut Payload<'_>,
        device: &mut Device<I>,
    ) {
        let mode = self.color_mode;
        match command {
            Command::SetOneLed(id) => {
                // 4-bit field, always a valid LED
                device.leds_mut().colors_mut()[usize::from(id)] = payload.next_color(mode);
            }
            Command::SetGlobalLed => {
                let color = payload.next_color(mode);
                device.leds_mut().set_all(color);
            }
            Command::SetAllLeds => {
                for slot in device.leds_mut().colors_mut() {
                    *slot = payload.next_color(mode);
                }
            }
            Command::QueryButton(id) => {
                let pressed = device.pad().button(usize::from(id)).unwrap_or(false);
                self.read_state = ReadState::Button(pressed);
            }
            Command::QueryButtons => {
                self.read_state = ReadState::Buttons(device.pad().buttons());
            }
            Command::LedMask => {
                let mask = payload.next_u16();
                device.leds_mut().set_mask(mask);
            }
            Command::DisplayState(on) => device.leds_mut().set_display_state(on),
            Command::BlinkState(on) => device.blink_mut().set_state(on),
            Command::BlinkOnDelay => {
                let ms = payload.next_u16();
                device.blink_mut().set_on_delay(ms);
            }
            Command::BlinkOffDelay => {
                let ms = payload.next_u16();
                device.blink_mut().set_off_delay(ms);
            }
            Command::DebounceDelay => {
                let ms = payload.next_u8();
                device.pad_mut().set_debounce_delay(u16::from(ms));
            }
            Command::HasChanged => {
                self.read_state = ReadState::Changed(device.pad_mut().take_changed());
            }
            Command::ColorMode(new_mode) => self.color_mode = new_mode,
            Command::ClearDisplay => device.leds_mut().clear(),
            Command::UpdateLeds => device.request_commit(),
            Command::Reset => {
                device.reset();
                self.reset();
            }
            Command::Unknown(_) => {}
        }
    }

    /// Produces the bytes for a bus read and returns the read path to idle.
    ///
    /// An idle read yields an empty response rather than blocking the bus.
    pub fn respond(&mut self) -> Response {
        let mut response = Response::new();
        // Every variant fits in MAX_RESPONSE_LEN
        match core::mem::take(&mut self.read_state) {
            ReadState::Idle => {}
            ReadState::Button(pressed) => {
                response.push(pressed as u8).ok();
            }
            ReadState::Buttons(state) => {
                response.extend_from_slice(&state.to_be_bytes()).ok();
            }
            ReadState::Changed(changed) => {
                response.push(changed as u8).ok();
            }
        }
        response
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn read_state(&self) -> ReadState {
        self.read_state
    }

    /// Restores the power-on color mode and clears any pending read.
    pub fn reset(&mut self) {
        self.color_mode = self.default_mode;
        self.read_state = ReadState::Idle;
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&Config::DEFAULT)
    }
}
