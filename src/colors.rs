//! Color conversions between bus payloads and the LED buffer.
//!
//! Colors are stored as 8-bit sRGB triples. The bus can send them either as
//! three raw channel bytes or as a single packed byte, see [`unpack`].

use palette::Srgb;

/// An 8-bit-per-channel color as stored in the LED buffer.
pub type Rgb8 = Srgb<u8>;

/// All channels off.
pub const BLACK: Rgb8 = Srgb::new(0, 0, 0);

/// All channels at full scale.
pub const WHITE: Rgb8 = Srgb::new(255, 255, 255);

/// Expands a packed `0bIIRRGGBB` byte into a full color.
///
/// Each channel has four levels and the two intensity bits scale all three
/// channels in four steps, so `0xFF` is full white and `0x00` is black.
#[inline]
pub const fn unpack(packed: u8) -> Rgb8 {
    let intensity = ((packed >> 6) & 0x03) as u16 + 1;
    Srgb::new(
        scale((packed >> 4) & 0x03, intensity),
        scale((packed >> 2) & 0x03, intensity),
        scale(packed & 0x03, intensity),
    )
}

const fn scale(level: u8, intensity: u16) -> u8 {
    (level as u16 * 85 * intensity / 4) as u8
}

/// Builds a color from `0xRRGGBB`. The top byte is ignored.
#[inline]
pub const fn from_u24(value: u32) -> Rgb8 {
    Srgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

/// Packs a color as `0xRRGGBB`.
#[inline]
pub const fn to_u24(color: Rgb8) -> u32 {
    ((color.red as u32) << 16) | ((color.green as u32) << 8) | color.blue as u32
}

/// Channel bytes in the order the LEDs expect them on the wire (G, R, B).
#[inline]
pub const fn to_grb(color: Rgb8) -> [u8; 3] {
    [color.green, color.red, color.blue]
}
