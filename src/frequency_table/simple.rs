use std::fmt;

use super::FrequencyTable;
use crate::error::{Error, Result};
use crate::usize;

/// Mutable frequency table, the adaptive model used while coding.
///
/// Cumulative frequencies are rebuilt lazily: mutations only mark them stale
/// and the next `low`/`high` query pays for one linear pass.
#[derive(Clone, Debug)]
pub struct SimpleFrequencyTable {
    frequencies: Vec<u32>,
    cumulative: Vec<u64>, // len = frequencies.len() + 1, cumulative[0] = 0
    total: u64,
    stale: bool,
}

impl SimpleFrequencyTable {
    /// Copies the frequencies of `freqs` into a new mutable table.
    pub fn new<T: FrequencyTable + ?Sized>(freqs: &T) -> Result<Self> {
        let size = freqs.symbol_limit();
        if size < 1 {
            return Err(Error::NoSymbols);
        }
        let frequencies = (0..size).map(|symbol| freqs.get(symbol)).collect::<Result<Vec<_>>>()?;
        Self::from_frequencies(frequencies)
    }

    pub fn from_frequencies(frequencies: Vec<u32>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::NoSymbols);
        }
        if u32::try_from(frequencies.len()).is_err() {
            return Err(Error::SymbolLimitTooLarge(frequencies.len()));
        }

        let mut table = Self {
            cumulative: vec![0; frequencies.len() + 1],
            frequencies,
            total: 0,
            stale: false,
        };
        // total is derived here, not checked
        table.total = table.init_cumulative();
        Ok(table)
    }

    fn check_symbol(&self, symbol: u32) -> Result<usize> {
        let index = usize!(symbol);
        if index >= self.frequencies.len() {
            return Err(Error::SymbolOutOfRange { symbol, limit: self.symbol_limit() });
        }
        Ok(index)
    }

    /// Recomputes the cumulative array and returns its final sum.
    fn init_cumulative(&mut self) -> u64 {
        let mut sum = 0;
        for (i, &freq) in self.frequencies.iter().enumerate() {
            sum += u64::from(freq);
            self.cumulative[i + 1] = sum;
        }
        self.stale = false;
        sum
    }

    fn refresh(&mut self) -> Result<()> {
        if self.stale {
            let sum = self.init_cumulative();
            if sum != self.total {
                return Err(Error::TotalMismatch { expected: self.total, actual: sum });
            }
        }
        Ok(())
    }
}

impl FrequencyTable for SimpleFrequencyTable {
    fn symbol_limit(&self) -> u32 {
        // length fits, checked on construction
        self.frequencies.len() as u32
    }

    fn get(&self, symbol: u32) -> Result<u32> {
        let index = self.check_symbol(symbol)?;
        Ok(self.frequencies[index])
    }

    fn set(&mut self, symbol: u32, freq: u32) -> Result<()> {
        let index = self.check_symbol(symbol)?;
        let rest = self
            .total
            .checked_sub(u64::from(self.frequencies[index]))
            .ok_or(Error::InvalidState("total underflow"))?;
        self.total = rest + u64::from(freq);
        self.frequencies[index] = freq;
        self.stale = true;
        Ok(())
    }

    fn increment(&mut self, symbol: u32) -> Result<()> {
        let index = self.check_symbol(symbol)?;
        self.frequencies[index] =
            self.frequencies[index].checked_add(1).ok_or(Error::FrequencyOverflow)?;
        self.total += 1;
        self.stale = true;
        Ok(())
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn low(&mut self, symbol: u32) -> Result<u64> {
        let index = self.check_symbol(symbol)?;
        self.refresh()?;
        Ok(self.cumulative[index])
    }

    fn high(&mut self, symbol: u32) -> Result<u64> {
        let index = self.check_symbol(symbol)?;
        self.refresh()?;
        Ok(self.cumulative[index + 1])
    }
}

impl fmt::Display for SimpleFrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleFrequencyTable(frequencies={:?})", self.frequencies)
    }
}
