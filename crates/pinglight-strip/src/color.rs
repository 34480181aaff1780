use smart_leds::RGB8;

/// Logical pixel color, independent of the order the LEDs expect on the wire.
///
/// Three-channel families ignore `white`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

impl Color {
    pub const OFF: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white: 0,
        }
    }

    pub const fn rgbw(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }
}

impl From<RGB8> for Color {
    fn from(value: RGB8) -> Self {
        Self::rgb(value.r, value.g, value.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb8_has_no_white() {
        let color = Color::from(RGB8::new(0x0f, 0x03, 0x03));
        assert_eq!(color, Color::rgb(0x0f, 0x03, 0x03));
        assert_eq!(color.white, 0);
    }
}
