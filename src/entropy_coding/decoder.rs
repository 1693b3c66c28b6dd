use log::debug;

use super::{io::BitRead, ArithmeticCoder, CoderState, Renormalize};
use crate::error::{Error, Result};
use crate::frequency_table::FrequencyTable;

/// Decoder side of renormalization: pulls fresh bits into `code`.
struct CodeReader<R> {
    input: R,
    code: u64,
    // mirrors the encoder's deferred underflow count
    pending: u64,
}

impl<R: BitRead> CodeReader<R> {
    fn read_code_bit(&mut self) -> Result<u64> {
        Ok(u64::from(self.input.read_bit()?))
    }
}

impl<R: BitRead> Renormalize for CodeReader<R> {
    fn shift(&mut self, state: &CoderState) -> Result<()> {
        self.code = ((self.code << 1) & state.state_mask()) | self.read_code_bit()?;
        self.pending = 0;
        Ok(())
    }

    fn underflow(&mut self, state: &CoderState) -> Result<()> {
        self.pending += 1;
        self.code = (self.code & state.half_range())
            | ((self.code << 1) & (state.state_mask() >> 1))
            | self.read_code_bit()?;
        Ok(())
    }
}

/// Decodes symbols from a bit stream produced by [`ArithmeticEncoder`](super::ArithmeticEncoder).
///
/// The caller has to apply the same model updates as the encoder did, and
/// stop on its own end-of-stream symbol.
pub struct ArithmeticDecoder<R> {
    coder: ArithmeticCoder<CodeReader<R>>,
    strict: bool,
}

impl<R: BitRead> ArithmeticDecoder<R> {
    /// Reads past the end of input are treated as zeros.
    pub fn new(num_bits: u32, input: R) -> Result<Self> {
        let reader = CodeReader { input, code: 0, pending: 0 };
        let mut coder = ArithmeticCoder::new(num_bits, reader)?;
        for _ in 0..num_bits {
            let hooks = coder.hooks_mut();
            hooks.code = (hooks.code << 1) | hooks.read_code_bit()?;
        }
        Ok(Self { coder, strict: false })
    }

    /// Like [`new`](Self::new), but [`finish`](Self::finish) also checks that
    /// the input length matches the decoded content exactly.
    pub fn new_strict(num_bits: u32, input: R) -> Result<Self> {
        let mut decoder = Self::new(num_bits, input)?;
        decoder.strict = true;
        Ok(decoder)
    }

    /// Decodes the next symbol. Does not update `freqs`.
    pub fn read<T>(&mut self, freqs: &mut T) -> Result<u32>
    where
        T: FrequencyTable + ?Sized,
    {
        let state = self.coder.state();
        let total = freqs.total();
        if total > state.maximum_total() {
            return Err(Error::TotalTooLarge { total, maximum: state.maximum_total() });
        }
        if total == 0 {
            return Err(Error::InvalidState("frequency table total is zero"));
        }

        // Translate from coding range scale to frequency table scale
        let scope = state.checked_scope()?;
        let offset = self
            .code()
            .checked_sub(state.low())
            .ok_or(Error::InvalidState("code below low"))?;
        let value = ((offset + 1) * total - 1) / scope;
        if value * scope / total > offset {
            return Err(Error::InvalidState("value overflow"));
        }
        if value >= total {
            return Err(Error::InvalidState("value too high"));
        }

        // Find highest symbol such that low(symbol) <= value.
        // Only valid because cumulative frequencies never decrease.
        let mut start = 0;
        let mut end = freqs.symbol_limit();
        while end - start > 1 {
            let middle = (start + end) >> 1;
            if freqs.low(middle)? > value {
                end = middle;
            } else {
                start = middle;
            }
        }
        if start + 1 != end {
            return Err(Error::InvalidState("expected start + 1 == end"));
        }

        let symbol = start;
        let sym_low = freqs.low(symbol)? * scope / total;
        let sym_high = freqs.high(symbol)? * scope / total;
        if !(sym_low <= offset && offset < sym_high) {
            return Err(Error::InvalidState("symbol out of range"));
        }

        self.coder.update(freqs, symbol)?;
        let state = self.coder.state();
        if !(state.low()..=state.high()).contains(&self.code()) {
            return Err(Error::InvalidState("code out of range"));
        }
        Ok(symbol)
    }

    /// Ends decoding and returns the bit source.
    ///
    /// In strict mode this fails with [`Error::Truncated`] or
    /// [`Error::TrailingData`] when the input is not exactly as long as an
    /// encoder would have made it for the symbols read so far.
    pub fn finish(self) -> Result<R> {
        let strict = self.strict;
        let num_bits = u64::from(self.coder.state().num_state_bits());
        let mut reader = self.coder.into_hooks();
        if !strict {
            return Ok(reader.input);
        }

        // The encoder wrote every bit we consumed except the `num_bits` of
        // lookahead and the still pending underflow bits, plus its final 1 bit.
        let consumed = reader.input.position();
        let written_bits = (consumed + 1).saturating_sub(num_bits + reader.pending);
        let expected = written_bits.div_ceil(8);
        let actual = reader.input.stream_len()?;
        debug!("strict check: consumed {consumed} bits, expected {expected} bytes, got {actual}");

        if actual < expected {
            return Err(Error::Truncated { expected, actual });
        }
        if actual > expected {
            return Err(Error::TrailingData { expected, actual });
        }
        Ok(reader.input)
    }

    pub fn state(&self) -> &CoderState {
        self.coder.state()
    }

    /// The decoder's current position inside the interval.
    pub fn code(&self) -> u64 {
        self.coder.hooks().code
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}
