//! LED family descriptors
//!
//! A family fixes the number of bytes per pixel, the order the channels are
//! shifted out in, and the bit timing of the one-wire protocol. Families
//! differ only in those three things, so adding one means adding an arm to
//! each match below.

use crate::color::Color;

/// Widest pixel of any supported family (RGBW).
pub const MAX_BYTES_PER_PIXEL: usize = 4;

/// Bit timing of a one-wire LED protocol, in nanoseconds.
///
/// A `0` bit is `t0h` high followed by `t0l` low, a `1` bit is `t1h` high
/// followed by `t1l` low. The frame is latched after at least `reset` low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    pub t0h: u32,
    pub t0l: u32,
    pub t1h: u32,
    pub t1l: u32,
    pub reset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
    White,
}

impl Channel {
    const fn read(self, color: Color) -> u8 {
        match self {
            Channel::Red => color.red,
            Channel::Green => color.green,
            Channel::Blue => color.blue,
            Channel::White => color.white,
        }
    }

    #[cfg(test)]
    fn write(self, color: &mut Color, value: u8) {
        match self {
            Channel::Red => color.red = value,
            Channel::Green => color.green = value,
            Channel::Blue => color.blue = value,
            Channel::White => color.white = value,
        }
    }
}

/// Supported addressable LED families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedFamily {
    /// WS2812 / WS2812B, GRB order
    Ws2812,
    /// WS2811 in 800 kHz mode, RGB order
    Ws2811,
    /// SK6812 RGBW, GRBW order
    Sk6812Rgbw,
}

impl LedFamily {
    const fn wire_order(self) -> &'static [Channel] {
        match self {
            LedFamily::Ws2812 => &[Channel::Green, Channel::Red, Channel::Blue],
            LedFamily::Ws2811 => &[Channel::Red, Channel::Green, Channel::Blue],
            LedFamily::Sk6812Rgbw => &[
                Channel::Green,
                Channel::Red,
                Channel::Blue,
                Channel::White,
            ],
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        self.wire_order().len()
    }

    pub const fn timing(self) -> BitTiming {
        match self {
            // Newer WS2812B revisions latch only after 280 us low.
            LedFamily::Ws2812 => BitTiming {
                t0h: 400,
                t0l: 850,
                t1h: 800,
                t1l: 450,
                reset: 280_000,
            },
            LedFamily::Ws2811 => BitTiming {
                t0h: 250,
                t0l: 1000,
                t1h: 600,
                t1l: 650,
                reset: 50_000,
            },
            LedFamily::Sk6812Rgbw => BitTiming {
                t0h: 300,
                t0l: 900,
                t1h: 600,
                t1l: 600,
                reset: 80_000,
            },
        }
    }

    /// Permute a logical color into this family's wire order.
    pub fn encode(self, color: Color) -> WirePixel {
        let order = self.wire_order();
        let mut bytes = [0u8; MAX_BYTES_PER_PIXEL];
        for (byte, channel) in bytes.iter_mut().zip(order) {
            *byte = channel.read(color);
        }
        WirePixel {
            bytes,
            len: order.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn decode(self, wire: &[u8]) -> Color {
        let mut color = Color::OFF;
        for (channel, value) in self.wire_order().iter().zip(wire) {
            channel.write(&mut color, *value);
        }
        color
    }
}

/// One pixel in wire order, `bytes_per_pixel` bytes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirePixel {
    bytes: [u8; MAX_BYTES_PER_PIXEL],
    len: usize,
}

impl WirePixel {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILIES: [LedFamily; 3] = [LedFamily::Ws2812, LedFamily::Ws2811, LedFamily::Sk6812Rgbw];

    #[test]
    fn round_trip_for_every_family() {
        let colors = [
            Color::OFF,
            Color::rgb(0x0f, 0x03, 0x03),
            Color::rgb(0x01, 0x80, 0xfe),
            Color::rgbw(0x11, 0x22, 0x33, 0x44),
        ];
        for family in FAMILIES {
            for color in colors {
                let wire = family.encode(color);
                let mut expected = color;
                if family.bytes_per_pixel() == 3 {
                    expected.white = 0;
                }
                assert_eq!(family.decode(wire.as_bytes()), expected, "{family:?}");
            }
        }
    }

    #[test]
    fn ws2812_sends_green_first() {
        let wire = LedFamily::Ws2812.encode(Color::rgb(1, 2, 3));
        assert_eq!(wire.as_bytes(), &[2, 1, 3]);
    }

    #[test]
    fn ws2811_keeps_rgb_order() {
        let wire = LedFamily::Ws2811.encode(Color::rgb(0, 0x0f, 0));
        assert_eq!(wire.as_bytes(), &[0x00, 0x0f, 0x00]);
    }

    #[test]
    fn sk6812_appends_white() {
        let wire = LedFamily::Sk6812Rgbw.encode(Color::rgbw(1, 2, 3, 4));
        assert_eq!(wire.as_bytes(), &[2, 1, 3, 4]);
        assert_eq!(LedFamily::Sk6812Rgbw.bytes_per_pixel(), 4);
    }

    #[test]
    fn one_bits_are_high_longer_than_zero_bits() {
        for family in FAMILIES {
            let timing = family.timing();
            assert!(timing.t1h > timing.t0h, "{family:?}");
            assert!(timing.t0l > timing.t1l, "{family:?}");
        }
    }
}
