//! Strip handle shared by every probe task
//!
//! Pixel writes and transmissions are guarded separately. Writing a slot is
//! a short critical section. Pushing takes the output lock, snapshots the
//! pixels into the pulse frame under the pixel lock and emits outside of
//! it, so a frame in flight is never interrupted and writers never wait for
//! the hardware.

use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex as BlockingMutex, raw::CriticalSectionRawMutex};
use embassy_sync::mutex::Mutex;
use log::info;

use crate::{
    buffer::PixelBuffer,
    claims::{ChannelId, HardwareClaims, OutputPin},
    color::Color,
    controller::StripController,
    error::StripError,
    family::LedFamily,
    generator::{PulseChannel, SignalGenerator},
};

/// Physical strip wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripSetup {
    pub channel: ChannelId,
    pub pin: OutputPin,
    pub family: LedFamily,
    pub length: usize,
}

impl StripSetup {
    /// Bits per frame for this strip
    pub const fn total_bits(&self) -> usize {
        self.length * self.family.bytes_per_pixel() * 8
    }
}

/// Controller and generator, owned by whoever holds the output lock
pub struct StripOutput<C: PulseChannel> {
    pub controller: StripController,
    pub generator: SignalGenerator<C>,
}

pub struct SharedStrip<C: PulseChannel> {
    pixels: BlockingMutex<CriticalSectionRawMutex, RefCell<PixelBuffer>>,
    output: Mutex<CriticalSectionRawMutex, StripOutput<C>>,
}

impl<C: PulseChannel> SharedStrip<C> {
    pub fn new(buffer: PixelBuffer, output: StripOutput<C>) -> Self {
        Self {
            pixels: BlockingMutex::new(RefCell::new(buffer)),
            output: Mutex::new(output),
        }
    }

    /// Allocate the pixels, claim the channel and bind the family.
    ///
    /// Nothing is transmitted yet, the first [`SharedStrip::push`] turns
    /// the strip off.
    pub fn bring_up(
        claims: &HardwareClaims,
        setup: StripSetup,
        channel: C,
    ) -> Result<Self, StripError> {
        let buffer = PixelBuffer::create(setup.length, setup.family)?;
        let mut generator = SignalGenerator::new(channel);
        generator.initialize(claims, setup.channel, setup.pin, setup.total_bits())?;

        let mut controller = StripController::new();
        if let Err(e) = controller.select_family(setup.family, &mut generator) {
            generator.release(claims);
            return Err(e);
        }

        info!(
            "strip: {} leds on gpio {}, rmt channel {}",
            setup.length, setup.pin.0, setup.channel.0
        );
        Ok(Self::new(
            buffer,
            StripOutput {
                controller,
                generator,
            },
        ))
    }

    pub fn len(&self) -> usize {
        self.pixels.lock(|pixels| pixels.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write one slot, the hardware is not touched.
    pub fn set_pixel(&self, index: usize, color: Color) -> Result<(), StripError> {
        self.pixels
            .lock(|pixels| pixels.borrow_mut().set_pixel(index, color))
    }

    /// Transmit a snapshot of the whole buffer.
    pub async fn push(&self) -> Result<(), StripError> {
        let mut output = self.output.lock().await;
        let StripOutput {
            controller,
            generator,
        } = &mut *output;
        self.pixels
            .lock(|pixels| controller.load(&pixels.borrow(), generator))?;
        generator.emit()
    }

    /// Write one slot and push.
    pub async fn update(&self, index: usize, color: Color) -> Result<(), StripError> {
        self.set_pixel(index, color)?;
        self.push().await
    }

    /// Copy of the wire-order pixel bytes
    pub fn snapshot(&self) -> Vec<u8> {
        self.pixels.lock(|pixels| pixels.borrow().raw_bytes().to_vec())
    }

    /// Run `f` with the output locked.
    pub async fn with_output<R>(&self, f: impl FnOnce(&mut StripOutput<C>) -> R) -> R {
        let mut output = self.output.lock().await;
        f(&mut output)
    }
}
