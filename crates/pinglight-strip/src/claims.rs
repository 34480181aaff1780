use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::error::StripError;

/// ESP32 has 8 RMT channels.
pub const MAX_CHANNELS: u8 = 8;
/// GPIO numbers fit in one 64 bit mask.
pub const MAX_PINS: u8 = 64;

/// Pulse peripheral channel number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId(pub u8);

/// GPIO number of a data output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPin(pub u8);

#[derive(Debug, Clone, Copy, Default)]
struct Claimed {
    channels: u8,
    pins: u64,
}

/// Registry of claimed pulse channels and output pins.
///
/// Usually one `static` per firmware image; claims are all-or-nothing.
pub struct HardwareClaims {
    claimed: Mutex<CriticalSectionRawMutex, Cell<Claimed>>,
}

impl HardwareClaims {
    pub const fn new() -> Self {
        Self {
            claimed: Mutex::new(Cell::new(Claimed {
                channels: 0,
                pins: 0,
            })),
        }
    }

    /// Claim `channel` and `pin` together.
    pub fn claim(&self, channel: ChannelId, pin: OutputPin) -> Result<(), StripError> {
        let (channel_bit, pin_bit) = masks(channel, pin)?;
        self.claimed.lock(|cell| {
            let mut claimed = cell.get();
            if claimed.channels & channel_bit != 0 || claimed.pins & pin_bit != 0 {
                return Err(StripError::ResourceUnavailable);
            }
            claimed.channels |= channel_bit;
            claimed.pins |= pin_bit;
            cell.set(claimed);
            Ok(())
        })
    }

    pub fn release(&self, channel: ChannelId, pin: OutputPin) {
        let Ok((channel_bit, pin_bit)) = masks(channel, pin) else {
            return;
        };
        self.claimed.lock(|cell| {
            let mut claimed = cell.get();
            claimed.channels &= !channel_bit;
            claimed.pins &= !pin_bit;
            cell.set(claimed);
        });
    }

    pub fn is_channel_claimed(&self, channel: ChannelId) -> bool {
        channel.0 < MAX_CHANNELS && self.claimed.lock(|cell| cell.get().channels & (1 << channel.0) != 0)
    }

    pub fn is_pin_claimed(&self, pin: OutputPin) -> bool {
        pin.0 < MAX_PINS && self.claimed.lock(|cell| cell.get().pins & (1 << pin.0) != 0)
    }
}

impl Default for HardwareClaims {
    fn default() -> Self {
        Self::new()
    }
}

fn masks(channel: ChannelId, pin: OutputPin) -> Result<(u8, u64), StripError> {
    if channel.0 >= MAX_CHANNELS || pin.0 >= MAX_PINS {
        return Err(StripError::InvalidConfiguration);
    }
    Ok((1 << channel.0, 1 << pin.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_of_channel_or_pin_fails() {
        let claims = HardwareClaims::new();
        claims.claim(ChannelId(0), OutputPin(27)).unwrap();

        assert_eq!(
            claims.claim(ChannelId(0), OutputPin(25)),
            Err(StripError::ResourceUnavailable)
        );
        assert_eq!(
            claims.claim(ChannelId(1), OutputPin(27)),
            Err(StripError::ResourceUnavailable)
        );
        // Failed claims do not leak a half claim.
        assert!(!claims.is_channel_claimed(ChannelId(1)));
        assert!(!claims.is_pin_claimed(OutputPin(25)));
    }

    #[test]
    fn release_frees_both() {
        let claims = HardwareClaims::new();
        claims.claim(ChannelId(3), OutputPin(4)).unwrap();
        claims.release(ChannelId(3), OutputPin(4));
        assert!(claims.claim(ChannelId(3), OutputPin(4)).is_ok());
    }

    #[test]
    fn out_of_range_ids_are_invalid() {
        let claims = HardwareClaims::new();
        assert_eq!(
            claims.claim(ChannelId(8), OutputPin(0)),
            Err(StripError::InvalidConfiguration)
        );
        assert_eq!(
            claims.claim(ChannelId(0), OutputPin(64)),
            Err(StripError::InvalidConfiguration)
        );
    }
}
