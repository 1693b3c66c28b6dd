use std::fmt;

use super::FrequencyTable;
use crate::error::{Error, Result};

/// Uniform distribution where every symbol has frequency 1. Never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatFrequencyTable {
    num_symbols: u32,
}

impl FlatFrequencyTable {
    pub fn new(num_symbols: u32) -> Result<Self> {
        if num_symbols < 1 {
            return Err(Error::NoSymbols);
        }
        Ok(Self { num_symbols })
    }

    fn check_symbol(&self, symbol: u32) -> Result<()> {
        if symbol >= self.num_symbols {
            return Err(Error::SymbolOutOfRange { symbol, limit: self.num_symbols });
        }
        Ok(())
    }
}

impl FrequencyTable for FlatFrequencyTable {
    fn symbol_limit(&self) -> u32 {
        self.num_symbols
    }

    fn get(&self, symbol: u32) -> Result<u32> {
        self.check_symbol(symbol)?;
        Ok(1)
    }

    fn set(&mut self, _symbol: u32, _freq: u32) -> Result<()> {
        Err(Error::ImmutableTable)
    }

    fn increment(&mut self, _symbol: u32) -> Result<()> {
        Err(Error::ImmutableTable)
    }

    fn total(&self) -> u64 {
        u64::from(self.num_symbols)
    }

    fn low(&mut self, symbol: u32) -> Result<u64> {
        self.check_symbol(symbol)?;
        Ok(u64::from(symbol))
    }

    fn high(&mut self, symbol: u32) -> Result<u64> {
        self.check_symbol(symbol)?;
        Ok(u64::from(symbol) + 1)
    }
}

impl fmt::Display for FlatFrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlatFrequencyTable(numSymbols={})", self.num_symbols)
    }
}
