use log::info;

use crate::{
    buffer::PixelBuffer,
    error::StripError,
    family::LedFamily,
    generator::{PulseChannel, SignalGenerator},
};

/// Binds the LED family once and pushes pixel buffers through a generator.
#[derive(Debug, Default)]
pub struct StripController {
    family: Option<LedFamily>,
}

impl StripController {
    pub const fn new() -> Self {
        Self { family: None }
    }

    /// Select the LED family and bind its timing to `generator`.
    ///
    /// The family is fixed for the lifetime of the controller, selecting the
    /// same family again is a no-op.
    pub fn select_family<C: PulseChannel>(
        &mut self,
        family: LedFamily,
        generator: &mut SignalGenerator<C>,
    ) -> Result<(), StripError> {
        match self.family {
            Some(bound) if bound == family => return Ok(()),
            Some(_) => return Err(StripError::InvalidConfiguration),
            None => {}
        }
        generator.configure_protocol(&family.timing())?;
        self.family = Some(family);
        info!("strip: led family {:?} selected", family);
        Ok(())
    }

    pub fn family(&self) -> Option<LedFamily> {
        self.family
    }

    /// Transmit the whole buffer once.
    pub fn push<C: PulseChannel>(
        &self,
        buffer: &PixelBuffer,
        generator: &mut SignalGenerator<C>,
    ) -> Result<(), StripError> {
        self.load(buffer, generator)?;
        generator.emit()
    }

    /// Encode the buffer into the generator's frame without emitting it.
    pub(crate) fn load<C: PulseChannel>(
        &self,
        buffer: &PixelBuffer,
        generator: &mut SignalGenerator<C>,
    ) -> Result<(), StripError> {
        let family = self.family.ok_or(StripError::NotConfigured)?;
        if buffer.family() != family {
            return Err(StripError::InvalidConfiguration);
        }
        generator.load(buffer.raw_bytes())
    }
}
