use super::{io::BitWrite, ArithmeticCoder, CoderState, Renormalize};
use crate::error::{Error, Result};
use crate::frequency_table::FrequencyTable;

/// Encoder side of renormalization: emits settled bits, defers underflow ones.
struct BitEmitter<W> {
    output: W,
    num_underflow: u64,
}

impl<W: BitWrite> Renormalize for BitEmitter<W> {
    fn shift(&mut self, state: &CoderState) -> Result<()> {
        let bit = match state.low() >> (state.num_state_bits() - 1) {
            0 => 0,
            1 => 1,
            _ => return Err(Error::InvalidState("arithmetic underflow")),
        };
        self.output.write_bit(bit)?;

        // the pending bits are now known to be the opposite of `bit`
        for _ in 0..self.num_underflow {
            self.output.write_bit(bit ^ 1)?;
        }
        self.num_underflow = 0;
        Ok(())
    }

    fn underflow(&mut self, _state: &CoderState) -> Result<()> {
        self.num_underflow += 1;
        Ok(())
    }
}

/// Encodes symbols into a bit stream.
///
/// ```
/// use arcoder::entropy_coding::{io::ACWriter, ArithmeticEncoder};
/// use arcoder::frequency_table::{FlatFrequencyTable, FrequencyTable, SimpleFrequencyTable};
///
/// let mut freqs = SimpleFrequencyTable::new(&FlatFrequencyTable::new(257)?)?;
/// let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new()))?;
/// for symbol in [65, 66, 65] {
///     enc.write(&mut freqs, symbol)?;
///     freqs.increment(symbol)?;
/// }
/// enc.write(&mut freqs, 256)?;
/// let out = enc.finish()?.into_inner();
/// assert_eq!(out, [0x41, 0x01, 0xbb, 0x04]);
/// # Ok::<(), arcoder::Error>(())
/// ```
pub struct ArithmeticEncoder<W> {
    coder: ArithmeticCoder<BitEmitter<W>>,
}

impl<W: BitWrite> ArithmeticEncoder<W> {
    pub fn new(num_bits: u32, output: W) -> Result<Self> {
        let emitter = BitEmitter { output, num_underflow: 0 };
        Ok(Self { coder: ArithmeticCoder::new(num_bits, emitter)? })
    }

    /// Encodes `symbol` with the probabilities in `freqs`. Does not update `freqs`.
    pub fn write<T>(&mut self, freqs: &mut T, symbol: u32) -> Result<()>
    where
        T: FrequencyTable + ?Sized,
    {
        self.coder.update(freqs, symbol)
    }

    /// Terminates the stream and returns the bit sink.
    ///
    /// The end-of-stream symbol has to be written before this, otherwise a
    /// decoder cannot tell where the data stops.
    pub fn finish(self) -> Result<W> {
        let mut output = self.coder.into_hooks().output;
        output.write_bit(1)?;
        output.flush(0)?;
        Ok(output)
    }

    pub fn state(&self) -> &CoderState {
        self.coder.state()
    }

    /// Underflow bits waiting for the next settled bit.
    pub fn pending_bits(&self) -> u64 {
        self.coder.hooks().num_underflow
    }
}
