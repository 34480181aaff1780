use alloc::vec::Vec;

use crate::{color::Color, error::StripError, family::LedFamily};

/// Wire-order pixel bytes for the whole strip.
///
/// Slot `i` occupies `[i * bpp, (i + 1) * bpp)`. The buffer is sized once
/// and never grows.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    family: LedFamily,
    length: usize,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate `length` pixels for `family`, all off.
    pub fn create(length: usize, family: LedFamily) -> Result<Self, StripError> {
        let size = length
            .checked_mul(family.bytes_per_pixel())
            .ok_or(StripError::AllocationError)?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| StripError::AllocationError)?;
        bytes.resize(size, 0);

        Ok(Self {
            family,
            length,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn family(&self) -> LedFamily {
        self.family
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.family.bytes_per_pixel()
    }

    /// Write `color` into slot `index` in the family's wire order.
    pub fn set_pixel(&mut self, index: usize, color: Color) -> Result<(), StripError> {
        let range = self.slot(index)?;
        let wire = self.family.encode(color);
        self.bytes[range].copy_from_slice(wire.as_bytes());
        Ok(())
    }

    /// Wire bytes of slot `index`.
    pub fn pixel(&self, index: usize) -> Result<&[u8], StripError> {
        let range = self.slot(index)?;
        Ok(&self.bytes[range])
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn slot(&self, index: usize) -> Result<core::ops::Range<usize>, StripError> {
        if index >= self.length {
            return Err(StripError::IndexOutOfRange);
        }
        let bpp = self.bytes_per_pixel();
        Ok(index * bpp..(index + 1) * bpp)
    }
}
