//! Pulse codes for the one-wire LED protocol
//!
//! A [`PulseCode`] is one entry of a pulse-peripheral program: a level held
//! for `duration0` ticks followed by a level held for `duration1` ticks.
//! Every data bit maps to exactly one code, so a frame of `n` bytes is
//! `8 * n` bit codes, the reset gap and the end marker.

use alloc::vec::Vec;

use crate::{error::StripError, family::BitTiming};

/// Longest duration one half of a code can hold (15 bit field).
pub const MAX_PULSE_TICKS: u16 = 0x7fff;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseCode {
    pub level0: bool,
    pub duration0: u16,
    pub level1: bool,
    pub duration1: u16,
}

impl PulseCode {
    /// Zero-length code, the peripheral stops when it reaches it.
    pub const END: Self = Self {
        level0: false,
        duration0: 0,
        level1: false,
        duration1: 0,
    };

    pub const fn high_low(high: u16, low: u16) -> Self {
        Self {
            level0: true,
            duration0: high,
            level1: false,
            duration1: low,
        }
    }

    pub const fn low(first: u16, second: u16) -> Self {
        Self {
            level0: false,
            duration0: first,
            level1: false,
            duration1: second,
        }
    }

    pub const fn is_end(&self) -> bool {
        self.duration0 == 0 || self.duration1 == 0
    }

    /// Pack into the ESP32 RMT RAM word layout.
    pub const fn to_bits(self) -> u32 {
        (self.duration0 as u32 & 0x7fff)
            | ((self.level0 as u32) << 15)
            | ((self.duration1 as u32 & 0x7fff) << 16)
            | ((self.level1 as u32) << 31)
    }
}

/// Bit timing converted to ticks of a concrete pulse channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTicks {
    pub zero: PulseCode,
    pub one: PulseCode,
    pub reset: u32,
}

impl BitTicks {
    pub fn from_timing(timing: &BitTiming, tick_hz: u32) -> Result<Self, StripError> {
        if tick_hz == 0 {
            return Err(StripError::InvalidConfiguration);
        }
        let reset = u32::try_from(ns_to_ticks(timing.reset, tick_hz))
            .map_err(|_| StripError::InvalidConfiguration)?;

        Ok(Self {
            zero: PulseCode::high_low(
                bit_ticks(timing.t0h, tick_hz)?,
                bit_ticks(timing.t0l, tick_hz)?,
            ),
            one: PulseCode::high_low(
                bit_ticks(timing.t1h, tick_hz)?,
                bit_ticks(timing.t1l, tick_hz)?,
            ),
            reset: reset.max(2),
        })
    }

    pub const fn code(&self, bit: bool) -> PulseCode {
        if bit { self.one } else { self.zero }
    }

    /// Inverse of [`BitTicks::code`] for codes this timing produced.
    pub fn bit(&self, code: PulseCode) -> Option<bool> {
        if code == self.one {
            Some(true)
        } else if code == self.zero {
            Some(false)
        } else {
            None
        }
    }

    /// Number of low/low codes needed to hold the reset gap.
    pub fn reset_code_count(&self) -> usize {
        self.reset.div_ceil(2 * u32::from(MAX_PULSE_TICKS)) as usize
    }

    /// Codes per frame of `bits` data bits, end marker included.
    pub fn frame_len(&self, bits: usize) -> usize {
        bits + self.reset_code_count() + 1
    }
}

fn ns_to_ticks(ns: u32, tick_hz: u32) -> u64 {
    (u64::from(ns) * u64::from(tick_hz) + NANOS_PER_SECOND / 2) / NANOS_PER_SECOND
}

fn bit_ticks(ns: u32, tick_hz: u32) -> Result<u16, StripError> {
    match u16::try_from(ns_to_ticks(ns, tick_hz)) {
        Ok(ticks) if (1..=MAX_PULSE_TICKS).contains(&ticks) => Ok(ticks),
        _ => Err(StripError::InvalidConfiguration),
    }
}

/// Append the codes of `bytes`, MSB first, then the reset gap and the end
/// marker.
pub fn encode_frame(bytes: &[u8], ticks: &BitTicks, frame: &mut Vec<PulseCode>) {
    for byte in bytes {
        for shift in (0..8).rev() {
            frame.push(ticks.code((byte >> shift) & 1 == 1));
        }
    }

    let per_code = 2 * u32::from(MAX_PULSE_TICKS);
    let mut remaining = ticks.reset;
    for _ in 0..ticks.reset_code_count() {
        // Both halves must stay non-zero, a zero half ends the transmission.
        let chunk = remaining.min(per_code).max(2);
        remaining = remaining.saturating_sub(chunk);
        let first = chunk.div_ceil(2);
        #[allow(clippy::cast_possible_truncation)]
        frame.push(PulseCode::low(first as u16, (chunk - first) as u16));
    }
    frame.push(PulseCode::END);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::LedFamily;

    const TICK_HZ: u32 = 40_000_000;

    #[test]
    fn ws2812_ticks_at_40mhz() {
        let ticks = BitTicks::from_timing(&LedFamily::Ws2812.timing(), TICK_HZ).unwrap();
        assert_eq!(ticks.zero, PulseCode::high_low(16, 34));
        assert_eq!(ticks.one, PulseCode::high_low(32, 18));
        assert_eq!(ticks.reset, 11_200);
        assert_eq!(ticks.reset_code_count(), 1);
    }

    #[test]
    fn bits_are_msb_first() {
        let ticks = BitTicks::from_timing(&LedFamily::Ws2812.timing(), TICK_HZ).unwrap();
        let mut frame = Vec::new();
        encode_frame(&[0b1000_0001], &ticks, &mut frame);

        let bits: Vec<bool> = frame[..8].iter().map(|c| ticks.bit(*c).unwrap()).collect();
        assert_eq!(
            bits,
            [true, false, false, false, false, false, false, true]
        );
        assert_eq!(frame.len(), ticks.frame_len(8));
        assert_eq!(frame.last(), Some(&PulseCode::END));
    }

    #[test]
    fn long_reset_is_split_over_codes() {
        let timing = BitTiming {
            reset: 2_000_000,
            ..LedFamily::Ws2812.timing()
        };
        let ticks = BitTicks::from_timing(&timing, 80_000_000).unwrap();
        let mut frame = Vec::new();
        encode_frame(&[], &ticks, &mut frame);

        let gap = &frame[..frame.len() - 1];
        assert_eq!(gap.len(), 3);
        assert!(gap.iter().all(|c| !c.level0 && !c.level1 && !c.is_end()));
        let total: u32 = gap
            .iter()
            .map(|c| u32::from(c.duration0) + u32::from(c.duration1))
            .sum();
        assert!(total >= ticks.reset);
    }

    #[test]
    fn rejects_timings_the_channel_cannot_hold() {
        let timing = LedFamily::Ws2812.timing();
        assert_eq!(
            BitTicks::from_timing(&timing, 0),
            Err(StripError::InvalidConfiguration)
        );
        // 1 kHz rounds every bit to zero ticks.
        assert_eq!(
            BitTicks::from_timing(&timing, 1_000),
            Err(StripError::InvalidConfiguration)
        );
        // 1 ms at 80 MHz does not fit in 15 bits.
        let slow = BitTiming {
            t0l: 1_000_000,
            ..timing
        };
        assert_eq!(
            BitTicks::from_timing(&slow, 80_000_000),
            Err(StripError::InvalidConfiguration)
        );
    }

    #[test]
    fn rmt_word_layout() {
        let code = PulseCode::high_low(32, 18);
        assert_eq!(code.to_bits(), 32 | 1 << 15 | 18 << 16);
        assert_eq!(PulseCode::END.to_bits(), 0);
    }

    #[test]
    fn only_the_last_word_is_an_end_marker() {
        // The RMT driver stops at the first word with a zero length field.
        for (family, tick_hz) in [
            (LedFamily::Ws2812, TICK_HZ),
            (LedFamily::Ws2811, TICK_HZ),
            (LedFamily::Sk6812Rgbw, 80_000_000),
        ] {
            let ticks = BitTicks::from_timing(&family.timing(), tick_hz).unwrap();
            let mut frame = Vec::new();
            encode_frame(&[0x00, 0xff, 0x5a], &ticks, &mut frame);

            let words: Vec<u32> = frame.iter().map(|code| code.to_bits()).collect();
            let ends = |word: u32| word & 0x7fff == 0 || (word >> 16) & 0x7fff == 0;
            assert_eq!(
                words.iter().position(|word| ends(*word)),
                Some(words.len() - 1),
                "{family:?}"
            );
        }
    }
}
