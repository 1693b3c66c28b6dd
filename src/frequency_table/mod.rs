pub mod flat;
pub mod simple;

pub use self::{flat::FlatFrequencyTable, simple::SimpleFrequencyTable};

use crate::error::Result;

/// Symbol frequencies and cumulative frequencies over the alphabet `[0, symbol_limit)`.
///
/// Cumulative queries take `&mut self` so implementations can rebuild cached
/// sums lazily.
pub trait FrequencyTable {
    /// Returns the number of symbols in this frequency table.
    fn symbol_limit(&self) -> u32;
    /// Returns the frequency of the given symbol.
    fn get(&self, symbol: u32) -> Result<u32>;
    /// Sets the frequency of the given symbol to the given value.
    fn set(&mut self, symbol: u32, freq: u32) -> Result<()>;
    /// Increments the frequency of the given symbol.
    fn increment(&mut self, symbol: u32) -> Result<()>;
    /// Returns the total of all symbol frequencies.
    /// Always equal to `high(symbol_limit() - 1)`.
    fn total(&self) -> u64;
    /// Returns the sum of the frequencies of all the symbols strictly below the given symbol.
    fn low(&mut self, symbol: u32) -> Result<u64>;
    /// Returns the sum of the frequencies of the given symbol and all the symbols below.
    fn high(&mut self, symbol: u32) -> Result<u64>;
}
