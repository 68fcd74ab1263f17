//! Fixed-width storage cell shared by every register-like chip.

use std::cell::Cell;

use crate::{Error, Result};

/// A value of `width` bits held in a cell.
///
/// The 8-bit registers, the program counter and the 4-bit flags register
/// differ only in width and wiring; this is the part they share.
#[derive(Debug)]
pub struct Latch {
    value: Cell<u8>,
    width: u8,
}

impl Latch {
    /// # Panics
    ///
    /// Panics if `width` is 0 or greater than 8.
    #[must_use]
    pub const fn new(width: u8) -> Self {
        assert!(width >= 1 && width <= 8, "latch width must be 1-8 bits");
        Self {
            value: Cell::new(0),
            width,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Largest value the latch can hold.
    #[must_use]
    pub const fn max_value(&self) -> u8 {
        (((1u16) << self.width) - 1) as u8
    }

    #[must_use]
    pub fn get(&self) -> u8 {
        self.value.get()
    }

    /// Store `value`, masked to the latch width.
    pub fn set(&self, value: u8) {
        self.value.set(value & self.max_value());
    }

    pub fn clear(&self) {
        self.value.set(0);
    }

    /// Set (`on = true`) or clear a single bit.
    pub fn set_bit(&self, bit: u8, on: bool) -> Result<()> {
        let mask = self.mask(bit)?;
        let value = self.value.get();
        self.value.set(if on { value | mask } else { value & !mask });
        Ok(())
    }

    pub fn get_bit(&self, bit: u8) -> Result<bool> {
        let mask = self.mask(bit)?;
        Ok(self.value.get() & mask != 0)
    }

    /// Binary rendering padded to the latch width.
    #[must_use]
    pub fn binary(&self) -> String {
        format!("{:0width$b}", self.value.get(), width = usize::from(self.width))
    }

    fn mask(&self, bit: u8) -> Result<u8> {
        if bit >= self.width {
            return Err(Error::bit(bit, self.width));
        }
        Ok(1 << bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RangeError;

    #[test]
    fn set_bit_touches_only_that_bit() {
        let latch = Latch::new(8);
        latch.set(0b1010_0000);
        latch.set_bit(0, true).unwrap();
        assert_eq!(latch.get(), 0b1010_0001);
        latch.set_bit(7, false).unwrap();
        assert_eq!(latch.get(), 0b0010_0001);
    }

    #[test]
    fn out_of_range_bit_leaves_value_alone() {
        let latch = Latch::new(4);
        latch.set(0b0101);
        assert_eq!(
            latch.set_bit(4, true),
            Err(Error::Range(RangeError::Bit { bit: 4, max: 3 }))
        );
        assert!(latch.get_bit(4).is_err());
        assert_eq!(latch.get(), 0b0101);
    }

    #[test]
    fn set_masks_to_width() {
        let latch = Latch::new(4);
        latch.set(0xFF);
        assert_eq!(latch.get(), 0x0F);
        assert_eq!(latch.max_value(), 15);
        assert_eq!(Latch::new(8).max_value(), 255);
    }

    #[test]
    fn binary_pads_to_width() {
        let latch = Latch::new(4);
        latch.set(0b0011);
        assert_eq!(latch.binary(), "0011");
        let latch = Latch::new(8);
        latch.set(5);
        assert_eq!(latch.binary(), "00000101");
    }
}
