use alloc::vec::Vec;

use esp_hal::Blocking;
use esp_hal::gpio::{Level, interconnect::PeripheralOutput};
use esp_hal::peripherals::RMT;
use esp_hal::rmt::{self, Channel, Rmt, Tx, TxChannelConfig, TxChannelCreator};
use esp_hal::time::Rate;
use esp_hal::xtensa_lx::interrupt;
use log::warn;
use pinglight_strip::{ChannelError, PulseChannel, PulseCode};

const SOURCE_CLOCK_MHZ: u32 = 80;
const CLOCK_DIVIDER: u8 = 2;

/// RMT channel 0 as a strip pulse channel
///
/// The peripheral is fed from the 80 MHz APB clock divided by two, so every
/// code duration is counted in 25 ns ticks.
pub(crate) struct RmtPulseChannel {
    channel: Option<Channel<'static, Blocking, Tx>>,
    words: Vec<u32>,
}

impl RmtPulseChannel {
    pub(crate) fn new<O>(rmt: RMT<'static>, pin: O) -> Result<Self, rmt::Error>
    where
        O: PeripheralOutput<'static>,
    {
        let rmt = Rmt::new(rmt, Rate::from_mhz(SOURCE_CLOCK_MHZ))?;
        let config = TxChannelConfig::default()
            .with_clk_divider(CLOCK_DIVIDER)
            .with_idle_output_level(Level::Low)
            .with_idle_output(true)
            .with_carrier_modulation(false);
        let channel = rmt.channel0.configure_tx(pin, config)?;

        Ok(Self {
            channel: Some(channel),
            words: Vec::new(),
        })
    }
}

impl PulseChannel for RmtPulseChannel {
    fn tick_hz(&self) -> u32 {
        SOURCE_CLOCK_MHZ * 1_000_000 / u32::from(CLOCK_DIVIDER)
    }

    fn send(&mut self, codes: &[PulseCode]) -> Result<(), ChannelError> {
        // `transmit` consumes the channel when it rejects a program, so the
        // end marker is checked before the channel is handed over.
        if !codes.last().is_some_and(PulseCode::is_end) {
            return Err(ChannelError::Rejected);
        }
        self.words.clear();
        self.words.extend(codes.iter().map(|code| code.to_bits()));

        let channel = self.channel.take().ok_or(ChannelError::Rejected)?;
        // The strip latches on any gap longer than its reset time, refills
        // of the channel memory must not be delayed by interrupts.
        interrupt::free(|| match channel.transmit(&self.words) {
            Ok(transaction) => match transaction.wait() {
                Ok(channel) => {
                    self.channel = Some(channel);
                    Ok(())
                }
                Err((e, channel)) => {
                    self.channel = Some(channel);
                    warn!("strip: rmt transmission error: {:?}", e);
                    Err(ChannelError::Aborted)
                }
            },
            Err(e) => {
                warn!("strip: rmt rejected frame, channel lost: {:?}", e);
                Err(ChannelError::Rejected)
            }
        })
    }
}
