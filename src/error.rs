//! Error types for frequency tables, the arithmetic coder and the stream driver.

use std::path::PathBuf;

use thiserror::Error;

/// Error variants for coding operations.
///
/// Everything except `Io` and the CLI variants is a logic or data error: a
/// broken model, a corrupted stream or a caller bug. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// State width must be within [1, 63] bits.
    #[error("state size out of range: {0} bits")]
    StateBitsOutOfRange(u32),

    /// A frequency table needs at least one symbol.
    #[error("at least 1 symbol required")]
    NoSymbols,

    /// More symbols than a `u32` symbol index can address.
    #[error("too many symbols: {0}")]
    SymbolLimitTooLarge(usize),

    #[error("symbol {symbol} out of range [0, {limit})")]
    SymbolOutOfRange { symbol: u32, limit: u32 },

    /// Mutation attempted on a table that never changes.
    #[error("frequency table is immutable")]
    ImmutableTable,

    /// A frequency or total would not fit its integer width.
    #[error("frequency overflow")]
    FrequencyOverflow,

    /// Recomputed cumulative sum disagrees with the tracked total.
    #[error("total frequency mismatch: tracked {expected}, summed {actual}")]
    TotalMismatch { expected: u64, actual: u64 },

    #[error("symbol {0} has zero frequency")]
    ZeroFrequency(u32),

    /// The table total exceeds what the coder precision can represent.
    #[error("cannot code symbol because total is too large: {total} > {maximum}")]
    TotalTooLarge { total: u64, maximum: u64 },

    /// Interval state or decoder arithmetic broke an invariant.
    #[error("invalid coder state: {0}")]
    InvalidState(&'static str),

    /// Decoded a symbol that is neither a byte nor the end marker.
    #[error("unexpected symbol {0}")]
    UnexpectedSymbol(u32),

    /// Input ended before the encoded content did (strict mode).
    #[error("truncated stream: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },

    /// Input continues past the end of the encoded content (strict mode).
    #[error("trailing data: expected {expected} bytes, got {actual}")]
    TrailingData { expected: u64, actual: u64 },

    /// Decoding produced more bytes than allowed.
    #[error("output limit of {0} bytes exceeded")]
    OutputLimit(u64),

    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// An output path resolves to a file that is read in the same run.
    #[error("output would overwrite an input: {}", .0.display())]
    OutputIsInput(PathBuf),

    /// Two outputs of one run resolve to the same file.
    #[error("output path used more than once: {}", .0.display())]
    OutputCollision(PathBuf),

    /// Round trip verification found differing bytes.
    #[error("files differ at byte {position}")]
    Mismatch { position: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for coding operations.
pub type Result<T> = std::result::Result<T, Error>;
