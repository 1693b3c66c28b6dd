mod decoder;
mod encoder;
pub mod io;
#[cfg(test)]
mod tests;

pub use decoder::ArithmeticDecoder;
pub use encoder::ArithmeticEncoder;

use crate::error::{Error, Result};
use crate::frequency_table::FrequencyTable;

/// Coding interval `[low, high]` together with the constants of its state width.
///
/// Both bounds live in `num_state_bits` bits. After every symbol:
/// `low < high` and `minimum_range <= high - low + 1 <= full_range`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoderState {
    num_state_bits: u32,
    full_range: u64,
    half_range: u64,
    quarter_range: u64,
    minimum_range: u64,
    maximum_total: u64,
    state_mask: u64,

    low: u64,
    high: u64,
}

impl CoderState {
    pub fn new(num_bits: u32) -> Result<Self> {
        if !(1..=63).contains(&num_bits) {
            return Err(Error::StateBitsOutOfRange(num_bits));
        }
        let full_range = 1u64 << num_bits;
        let half_range = full_range >> 1;
        let quarter_range = half_range >> 1;
        let minimum_range = quarter_range + 2;
        let maximum_total = (u64::MAX / full_range).min(minimum_range);
        let state_mask = full_range - 1;

        Ok(Self {
            num_state_bits: num_bits,
            full_range,
            half_range,
            quarter_range,
            minimum_range,
            maximum_total,
            state_mask,
            low: 0,
            high: state_mask,
        })
    }

    pub fn num_state_bits(&self) -> u32 {
        self.num_state_bits
    }

    pub fn full_range(&self) -> u64 {
        self.full_range
    }

    pub fn half_range(&self) -> u64 {
        self.half_range
    }

    pub fn quarter_range(&self) -> u64 {
        self.quarter_range
    }

    pub fn minimum_range(&self) -> u64 {
        self.minimum_range
    }

    /// Largest table total this precision can code without overflowing `u64`.
    pub fn maximum_total(&self) -> u64 {
        self.maximum_total
    }

    pub fn state_mask(&self) -> u64 {
        self.state_mask
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    /// Validates the interval and returns its width.
    pub fn checked_scope(&self) -> Result<u64> {
        if self.low >= self.high
            || (self.low & self.state_mask) != self.low
            || (self.high & self.state_mask) != self.high
        {
            return Err(Error::InvalidState("low or high out of range"));
        }

        let scope = self.high - self.low + 1;
        if !(self.minimum_range..=self.full_range).contains(&scope) {
            return Err(Error::InvalidState("scope out of range"));
        }
        Ok(scope)
    }

    fn top_bits_equal(&self) -> bool {
        ((self.low ^ self.high) & self.half_range) == 0
    }

    // low = 01..., high = 10...
    fn straddles_middle(&self) -> bool {
        (self.low & !self.high & self.quarter_range) != 0
    }

    fn shift_out(&mut self) {
        self.low = (self.low << 1) & self.state_mask;
        self.high = ((self.high << 1) & self.state_mask) | 1;
    }

    fn recenter(&mut self) {
        self.low = (self.low << 1) ^ self.half_range;
        self.high = ((self.high ^ self.half_range) << 1) | self.half_range | 1;
    }
}

/// Renormalization callbacks, the part where encoding and decoding differ.
///
/// Both are invoked with the interval as it was *before* the corresponding
/// shift is applied to it.
pub trait Renormalize {
    /// Called when the top bits of `low` and `high` are equal.
    fn shift(&mut self, state: &CoderState) -> Result<()>;
    /// Called when `low = 01...` and `high = 10...`.
    fn underflow(&mut self, state: &CoderState) -> Result<()>;
}

/// The interval state machine shared by [`ArithmeticEncoder`] and [`ArithmeticDecoder`].
pub struct ArithmeticCoder<H> {
    state: CoderState,
    hooks: H,
}

impl<H: Renormalize> ArithmeticCoder<H> {
    pub fn new(num_bits: u32, hooks: H) -> Result<Self> {
        Ok(Self { state: CoderState::new(num_bits)?, hooks })
    }

    pub fn state(&self) -> &CoderState {
        &self.state
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Narrows the interval to the slice of `symbol` in `freqs`, then renormalizes.
    pub fn update<T>(&mut self, freqs: &mut T, symbol: u32) -> Result<()>
    where
        T: FrequencyTable + ?Sized,
    {
        let scope = self.state.checked_scope()?;

        let total = freqs.total();
        if total > self.state.maximum_total {
            return Err(Error::TotalTooLarge { total, maximum: self.state.maximum_total });
        }
        let sym_low = freqs.low(symbol)?;
        let sym_high = freqs.high(symbol)?;
        if sym_low == sym_high {
            return Err(Error::ZeroFrequency(symbol));
        }

        // total <= maximum_total keeps both products within u64
        let new_low = self.state.low + sym_low * scope / total;
        let new_high = self.state.low + sym_high * scope / total - 1;
        self.state.low = new_low;
        self.state.high = new_high;

        while self.state.top_bits_equal() {
            self.hooks.shift(&self.state)?;
            self.state.shift_out();
        }

        while self.state.straddles_middle() {
            self.hooks.underflow(&self.state)?;
            self.state.recenter();
        }

        Ok(())
    }
}
