//! Byte stream compression with an adaptive order-0 model.
//!
//! Every byte is a symbol of a 257 symbol alphabet, the extra symbol marks the
//! end of the stream. Both directions seed the model with a flat distribution
//! and increment the coded symbol afterwards, so they stay in lockstep.

use std::io::{BufReader, BufWriter, Read, Write};

use log::debug;

use crate::entropy_coding::{
    io::{ACReader, ACWriter},
    ArithmeticDecoder, ArithmeticEncoder,
};
use crate::error::{Error, Result};
use crate::frequency_table::{FlatFrequencyTable, FrequencyTable, SimpleFrequencyTable};

/// Number of bits for the arithmetic coding range.
pub const NUM_STATE_BITS: u32 = 32;
/// 256 byte values and the end marker.
pub const NUM_SYMBOLS: u32 = 257;
pub const EOF_SYMBOL: u32 = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Coding precision, has to match between compression and decompression.
    pub num_state_bits: u32,
    /// Reject input that is longer or shorter than its encoded content.
    pub strict: bool,
    /// Stop decoding after this many output bytes.
    pub max_output: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self { num_state_bits: NUM_STATE_BITS, strict: false, max_output: None }
    }
}

/// Byte counts of one compression or decompression run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub input_bytes: u64,
    pub output_bytes: u64,
}

fn init_model() -> Result<SimpleFrequencyTable> {
    let flat = FlatFrequencyTable::new(NUM_SYMBOLS)?;
    SimpleFrequencyTable::new(&flat)
}

pub fn compress<R: Read, W: Write>(input: R, output: W, options: &Options) -> Result<Summary> {
    debug!("compressing with {} state bits", options.num_state_bits);
    let reader = BufReader::new(input);
    let writer = ACWriter::new(BufWriter::new(output));

    let mut freqs = init_model()?;
    let mut enc = ArithmeticEncoder::new(options.num_state_bits, writer)?;
    let mut input_bytes = 0;

    for byte_res in reader.bytes() {
        let symbol = u32::from(byte_res?);
        enc.write(&mut freqs, symbol)?;
        freqs.increment(symbol)?;
        input_bytes += 1;
    }
    enc.write(&mut freqs, EOF_SYMBOL)?;

    let writer = enc.finish()?;
    let summary = Summary { input_bytes, output_bytes: writer.bytes_written() };
    debug!("compressed {} bytes into {}", summary.input_bytes, summary.output_bytes);
    Ok(summary)
}

pub fn decompress<R: Read, W: Write>(input: R, output: W, options: &Options) -> Result<Summary> {
    debug!(
        "decompressing with {} state bits{}",
        options.num_state_bits,
        if options.strict { ", strict" } else { "" }
    );
    let reader = ACReader::new(BufReader::new(input));
    let mut writer = BufWriter::new(output);

    let mut freqs = init_model()?;
    let mut dec = if options.strict {
        ArithmeticDecoder::new_strict(options.num_state_bits, reader)?
    } else {
        ArithmeticDecoder::new(options.num_state_bits, reader)?
    };
    let mut output_bytes = 0;

    loop {
        let symbol = dec.read(&mut freqs)?;
        if symbol == EOF_SYMBOL {
            break;
        }
        let byte = u8::try_from(symbol).map_err(|_| Error::UnexpectedSymbol(symbol))?;
        if options.max_output.is_some_and(|limit| output_bytes >= limit) {
            return Err(Error::OutputLimit(output_bytes));
        }
        writer.write_all(&[byte])?;
        freqs.increment(symbol)?;
        output_bytes += 1;
    }
    writer.flush()?;

    let reader = dec.finish()?;
    let summary = Summary { input_bytes: reader.bytes_read(), output_bytes };
    debug!("decompressed {} bytes into {}", summary.input_bytes, summary.output_bytes);
    Ok(summary)
}

pub fn compress_to_vec(input: &[u8], options: &Options) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    compress(input, &mut out, options)?;
    Ok(out)
}

pub fn decompress_to_vec(input: &[u8], options: &Options) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress(input, &mut out, options)?;
    Ok(out)
}
