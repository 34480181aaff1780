//! Signal generator
//!
//! Turns wire-order bytes into pulse codes and hands them to a hardware
//! pulse channel. The channel does the timing; the generator only builds
//! the program and tracks the channel state.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::{
    claims::{ChannelId, HardwareClaims, OutputPin},
    error::StripError,
    family::BitTiming,
    pulse::{self, BitTicks, PulseCode},
};

/// Error reported by a pulse channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The peripheral rejected the pulse program
    Rejected,
    /// The peripheral stopped before the end marker
    Aborted,
}

/// Hardware pulse channel
///
/// Implement this trait to support a pulse peripheral. Codes are emitted
/// with hardware timing, the call returns once the end marker was reached.
pub trait PulseChannel {
    /// Tick rate of the code durations, in Hz
    fn tick_hz(&self) -> u32;

    /// Emit `codes` and block until the peripheral reports completion
    fn send(&mut self, codes: &[PulseCode]) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Uninitialized,
    Configured,
    Transmitting,
    Idle,
}

pub struct SignalGenerator<C: PulseChannel> {
    channel: C,
    state: GeneratorState,
    claim: Option<(ChannelId, OutputPin)>,
    total_bits: usize,
    ticks: Option<BitTicks>,
    frame: Vec<PulseCode>,
    loaded: bool,
}

impl<C: PulseChannel> SignalGenerator<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            state: GeneratorState::Uninitialized,
            claim: None,
            total_bits: 0,
            ticks: None,
            frame: Vec::new(),
            loaded: false,
        }
    }

    /// Claim the channel and pin and size the generator for `total_bits`.
    pub fn initialize(
        &mut self,
        claims: &HardwareClaims,
        channel_id: ChannelId,
        pin: OutputPin,
        total_bits: usize,
    ) -> Result<(), StripError> {
        if self.state != GeneratorState::Uninitialized || total_bits == 0 {
            return Err(StripError::InvalidConfiguration);
        }
        claims.claim(channel_id, pin)?;

        // Bit codes plus the end marker, the reset gap is added once the
        // timing is known.
        if self.frame.try_reserve_exact(total_bits + 1).is_err() {
            claims.release(channel_id, pin);
            return Err(StripError::AllocationError);
        }

        self.claim = Some((channel_id, pin));
        self.total_bits = total_bits;
        self.state = GeneratorState::Configured;
        debug!(
            "strip: channel {} on gpio {} configured for {} bits",
            channel_id.0, pin.0, total_bits
        );
        Ok(())
    }

    /// Bind the bit timing used by every following transmission.
    pub fn configure_protocol(&mut self, timing: &BitTiming) -> Result<(), StripError> {
        if self.state == GeneratorState::Uninitialized {
            return Err(StripError::NotConfigured);
        }
        let ticks = BitTicks::from_timing(timing, self.channel.tick_hz())?;
        let frame_len = ticks.frame_len(self.total_bits);
        self.frame
            .try_reserve_exact(frame_len.saturating_sub(self.frame.len()))
            .map_err(|_| StripError::AllocationError)?;
        self.ticks = Some(ticks);
        self.loaded = false;
        Ok(())
    }

    /// Encode `bytes` and emit them, blocking until the channel is done.
    pub fn transmit(&mut self, bytes: &[u8]) -> Result<(), StripError> {
        self.load(bytes)?;
        self.emit()
    }

    /// Encode `bytes` into the pulse frame without touching the hardware.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), StripError> {
        let ticks = self.bound_ticks()?;
        if bytes.len() * 8 > self.total_bits {
            return Err(StripError::InvalidConfiguration);
        }
        self.frame.clear();
        pulse::encode_frame(bytes, &ticks, &mut self.frame);
        self.loaded = true;
        Ok(())
    }

    /// Emit the loaded frame.
    pub fn emit(&mut self) -> Result<(), StripError> {
        self.bound_ticks()?;
        if !self.loaded {
            return Err(StripError::NotConfigured);
        }

        self.state = GeneratorState::Transmitting;
        let result = self.channel.send(&self.frame);
        self.state = GeneratorState::Idle;

        result.map_err(|e| {
            warn!("strip: transmission aborted: {:?}", e);
            StripError::TransmissionFailure
        })
    }

    /// Give the channel and pin back, the generator is unusable afterwards.
    pub fn release(&mut self, claims: &HardwareClaims) {
        if let Some((channel_id, pin)) = self.claim.take() {
            claims.release(channel_id, pin);
        }
        self.state = GeneratorState::Uninitialized;
        self.ticks = None;
        self.loaded = false;
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    pub fn ticks(&self) -> Option<BitTicks> {
        self.ticks
    }

    /// Pulse codes of the last loaded frame
    pub fn last_frame(&self) -> &[PulseCode] {
        &self.frame
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    fn bound_ticks(&self) -> Result<BitTicks, StripError> {
        if self.state == GeneratorState::Uninitialized {
            return Err(StripError::NotConfigured);
        }
        self.ticks.ok_or(StripError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::LedFamily;

    #[derive(Default)]
    struct Loopback {
        sent: Vec<Vec<PulseCode>>,
        fail_next: bool,
    }

    impl PulseChannel for Loopback {
        fn tick_hz(&self) -> u32 {
            40_000_000
        }

        fn send(&mut self, codes: &[PulseCode]) -> Result<(), ChannelError> {
            if core::mem::take(&mut self.fail_next) {
                return Err(ChannelError::Aborted);
            }
            self.sent.push(codes.to_vec());
            Ok(())
        }
    }

    fn configured(bits: usize) -> SignalGenerator<Loopback> {
        let claims = HardwareClaims::new();
        let mut generator = SignalGenerator::new(Loopback::default());
        generator
            .initialize(&claims, ChannelId(0), OutputPin(27), bits)
            .unwrap();
        generator
    }

    #[test]
    fn zero_bits_is_invalid() {
        let claims = HardwareClaims::new();
        let mut generator = SignalGenerator::new(Loopback::default());
        assert_eq!(
            generator.initialize(&claims, ChannelId(0), OutputPin(27), 0),
            Err(StripError::InvalidConfiguration)
        );
        assert_eq!(generator.state(), GeneratorState::Uninitialized);
        assert!(!claims.is_channel_claimed(ChannelId(0)));
    }

    #[test]
    fn claimed_channel_is_unavailable() {
        let claims = HardwareClaims::new();
        let mut first = SignalGenerator::new(Loopback::default());
        first
            .initialize(&claims, ChannelId(0), OutputPin(27), 24)
            .unwrap();

        let mut second = SignalGenerator::new(Loopback::default());
        assert_eq!(
            second.initialize(&claims, ChannelId(0), OutputPin(26), 24),
            Err(StripError::ResourceUnavailable)
        );

        first.release(&claims);
        assert!(
            second
                .initialize(&claims, ChannelId(0), OutputPin(26), 24)
                .is_ok()
        );
    }

    #[test]
    fn transmit_before_protocol_is_not_configured() {
        let mut generator = configured(24);
        assert_eq!(
            generator.transmit(&[1, 2, 3]),
            Err(StripError::NotConfigured)
        );
        assert!(generator.channel().sent.is_empty());
        assert_eq!(generator.state(), GeneratorState::Configured);
    }

    #[test]
    fn uninitialized_generator_rejects_everything() {
        let mut generator = SignalGenerator::new(Loopback::default());
        assert_eq!(
            generator.configure_protocol(&LedFamily::Ws2812.timing()),
            Err(StripError::NotConfigured)
        );
        assert_eq!(generator.transmit(&[0]), Err(StripError::NotConfigured));
    }

    #[test]
    fn transmit_goes_idle_and_sends_one_frame() {
        let mut generator = configured(24);
        generator
            .configure_protocol(&LedFamily::Ws2812.timing())
            .unwrap();
        generator.transmit(&[0xff, 0x00, 0x0f]).unwrap();

        assert_eq!(generator.state(), GeneratorState::Idle);
        let sent = &generator.channel().sent;
        assert_eq!(sent.len(), 1);
        let ticks = generator.ticks().unwrap();
        assert_eq!(sent[0].len(), ticks.frame_len(24));
        assert_eq!(sent[0].as_slice(), generator.last_frame());
    }

    #[test]
    fn frame_longer_than_configured_is_rejected() {
        let mut generator = configured(16);
        generator
            .configure_protocol(&LedFamily::Ws2812.timing())
            .unwrap();
        assert_eq!(
            generator.transmit(&[0, 0, 0]),
            Err(StripError::InvalidConfiguration)
        );
        assert!(generator.channel().sent.is_empty());
    }

    #[test]
    fn hardware_error_is_transient() {
        let mut generator = configured(8);
        generator
            .configure_protocol(&LedFamily::Ws2812.timing())
            .unwrap();
        generator.channel_mut().fail_next = true;

        assert_eq!(
            generator.transmit(&[0xaa]),
            Err(StripError::TransmissionFailure)
        );
        assert_eq!(generator.state(), GeneratorState::Idle);

        generator.emit().unwrap();
        assert_eq!(generator.channel().sent.len(), 1);
    }
}
