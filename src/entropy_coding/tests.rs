use super::{
    io::{ACReader, ACWriter},
    ArithmeticCoder, ArithmeticDecoder, ArithmeticEncoder, CoderState, Renormalize,
};
use crate::error::{Error, Result};
use crate::frequency_table::{FlatFrequencyTable, FrequencyTable, SimpleFrequencyTable};

const EOF: u32 = 256;

fn adaptive_model() -> SimpleFrequencyTable {
    SimpleFrequencyTable::new(&FlatFrequencyTable::new(257).unwrap()).unwrap()
}

fn encode(num_bits: u32, input: &[u8]) -> Result<Vec<u8>> {
    let mut freqs = adaptive_model();
    let mut enc = ArithmeticEncoder::new(num_bits, ACWriter::new(Vec::new()))?;
    for &byte in input {
        enc.write(&mut freqs, u32::from(byte))?;
        freqs.increment(u32::from(byte))?;
    }
    enc.write(&mut freqs, EOF)?;
    Ok(enc.finish()?.into_inner())
}

fn decode(num_bits: u32, input: &[u8], strict: bool) -> Result<Vec<u8>> {
    let mut freqs = adaptive_model();
    let reader = ACReader::new(input);
    let mut dec = if strict {
        ArithmeticDecoder::new_strict(num_bits, reader)?
    } else {
        ArithmeticDecoder::new(num_bits, reader)?
    };
    let mut out = Vec::new();
    loop {
        let symbol = dec.read(&mut freqs)?;
        if symbol == EOF {
            break;
        }
        out.push(u8::try_from(symbol).unwrap());
        freqs.increment(symbol)?;
    }
    dec.finish()?;
    Ok(out)
}

#[test]
fn state_constants() {
    let state = CoderState::new(32).unwrap();
    assert_eq!(state.full_range(), 1 << 32);
    assert_eq!(state.half_range(), 1 << 31);
    assert_eq!(state.quarter_range(), 1 << 30);
    assert_eq!(state.minimum_range(), (1 << 30) + 2);
    assert_eq!(state.maximum_total(), (1 << 30) + 2);
    assert_eq!(state.state_mask(), u64::from(u32::MAX));
    assert_eq!((state.low(), state.high()), (0, u64::from(u32::MAX)));

    let state = CoderState::new(1).unwrap();
    assert_eq!(state.full_range(), 2);
    assert_eq!(state.half_range(), 1);
    assert_eq!(state.quarter_range(), 0);
    assert_eq!(state.minimum_range(), 2);
    assert_eq!(state.maximum_total(), 2);

    // u64::MAX / 2^63 == 1
    assert_eq!(CoderState::new(63).unwrap().maximum_total(), 1);

    assert!(matches!(CoderState::new(0), Err(Error::StateBitsOutOfRange(0))));
    assert!(matches!(CoderState::new(64), Err(Error::StateBitsOutOfRange(64))));
}

#[test]
fn known_streams_at_other_precisions() {
    assert_eq!(encode(16, b"ABA").unwrap(), [0x41, 0x01, 0x79, 0x2f]);
    assert_eq!(encode(12, b"ABA").unwrap(), [0x40, 0xf2, 0xa2, 0x1f]);
    assert_eq!(encode(20, b"A").unwrap(), [0x41, 0xbe]);

    assert_eq!(decode(16, &[0x41, 0x01, 0x79, 0x2f], false).unwrap(), b"ABA");
    assert_eq!(decode(12, &[0x40, 0xf2, 0xa2, 0x1f], false).unwrap(), b"ABA");
    assert_eq!(decode(20, &[0x41, 0xbe], false).unwrap(), b"A");
}

#[test]
fn roundtrip_across_precisions() {
    let input = b"hello arithmetic coding";
    for num_bits in 11..=55 {
        let compressed = encode(num_bits, input).unwrap();
        assert_eq!(decode(num_bits, &compressed, false).unwrap(), input, "{num_bits} bits");
        assert_eq!(decode(num_bits, &compressed, true).unwrap(), input, "{num_bits} bits, strict");
    }

    // 2^64 / 2^56 = 256 < 257 symbols
    assert!(matches!(encode(56, input), Err(Error::TotalTooLarge { total: 257, maximum: 255 })));
}

/// Checks the renormalization preconditions from inside the state machine.
#[derive(Default)]
struct Witness {
    shifts: usize,
    underflows: usize,
}

impl Renormalize for Witness {
    fn shift(&mut self, state: &CoderState) -> Result<()> {
        assert!(state.top_bits_equal());
        self.shifts += 1;
        Ok(())
    }

    fn underflow(&mut self, state: &CoderState) -> Result<()> {
        assert!(!state.top_bits_equal());
        assert!(state.straddles_middle());
        self.underflows += 1;
        Ok(())
    }
}

#[test]
fn interval_stays_valid() {
    for num_bits in [12, 16, 24, 32, 40] {
        let mut coder = ArithmeticCoder::new(num_bits, Witness::default()).unwrap();
        let mut freqs = adaptive_model();
        let mut seed = 0x2545_f491_u64;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            // every other symbol comes from a small range so the model skews
            let range = if seed & 1 == 0 { 8 } else { 257 };
            let symbol = ((seed >> 33) % range) as u32;
            if freqs.total() >= coder.state().maximum_total() {
                break;
            }
            coder.update(&mut freqs, symbol).unwrap();
            freqs.increment(symbol).unwrap();

            let state = coder.state();
            let scope = state.checked_scope().unwrap();
            assert!(scope >= state.minimum_range() && scope <= state.full_range());
            assert!(!state.top_bits_equal());
            assert!(!state.straddles_middle());
        }
        let hooks = coder.hooks();
        assert!(hooks.shifts > 0 && hooks.underflows > 0);
    }
}

#[test]
fn middle_symbol_defers_bits() {
    let mut flat = FlatFrequencyTable::new(257).unwrap();
    let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new())).unwrap();
    enc.write(&mut flat, 128).unwrap();
    // the interval straddles the half point and nothing is settled yet
    assert_eq!(enc.pending_bits(), 8);
    enc.state().checked_scope().unwrap();

    enc.write(&mut flat, EOF).unwrap();
    assert_eq!(enc.pending_bits(), 0);
    let out = enc.finish().unwrap().into_inner();

    let mut dec = ArithmeticDecoder::new(32, ACReader::new(out.as_slice())).unwrap();
    assert_eq!(dec.read(&mut flat).unwrap(), 128);
    assert_eq!(dec.read(&mut flat).unwrap(), EOF);
}

#[test]
fn zero_frequency_leaves_state_alone() {
    let mut freqs = adaptive_model();
    freqs.set(5, 0).unwrap();
    let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new())).unwrap();
    enc.write(&mut freqs, 65).unwrap();
    let before = enc.state().clone();

    assert!(matches!(enc.write(&mut freqs, 5), Err(Error::ZeroFrequency(5))));
    assert_eq!(enc.state(), &before);
    enc.write(&mut freqs, 6).unwrap();
}

#[test]
fn symbol_out_of_range() {
    let mut freqs = adaptive_model();
    let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new())).unwrap();
    assert!(matches!(
        enc.write(&mut freqs, 257),
        Err(Error::SymbolOutOfRange { symbol: 257, limit: 257 })
    ));
}

#[test]
fn total_over_capacity() {
    // 10 bits: maximum_total = 2^8 + 2
    let mut freqs = SimpleFrequencyTable::from_frequencies(vec![1; 300]).unwrap();
    let mut enc = ArithmeticEncoder::new(10, ACWriter::new(Vec::new())).unwrap();
    assert!(matches!(
        enc.write(&mut freqs, 0),
        Err(Error::TotalTooLarge { total: 300, maximum: 258 })
    ));

    let mut dec = ArithmeticDecoder::new(10, ACReader::new(&[0u8; 4][..])).unwrap();
    assert!(matches!(dec.read(&mut freqs), Err(Error::TotalTooLarge { total: 300, maximum: 258 })));
}

#[test]
fn tables_behind_trait_objects() {
    let mut flat = FlatFrequencyTable::new(257).unwrap();
    let mut simple = adaptive_model();
    let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new())).unwrap();
    {
        let tables: [&mut dyn FrequencyTable; 2] = [&mut flat, &mut simple];
        for table in tables {
            enc.write(&mut *table, 7).unwrap();
            enc.write(&mut *table, EOF).unwrap();
        }
    }
    let out = enc.finish().unwrap().into_inner();

    let mut dec = ArithmeticDecoder::new(32, ACReader::new(out.as_slice())).unwrap();
    let tables: [&mut dyn FrequencyTable; 2] = [&mut flat, &mut simple];
    for table in tables {
        assert_eq!(dec.read(&mut *table).unwrap(), 7);
        assert_eq!(dec.read(&mut *table).unwrap(), EOF);
    }
}

#[test]
fn static_flat_model() {
    let mut flat = FlatFrequencyTable::new(257).unwrap();
    let input: Vec<u32> = (0..4).flat_map(|_| 0..256).collect();

    let mut enc = ArithmeticEncoder::new(32, ACWriter::new(Vec::new())).unwrap();
    for &symbol in &input {
        enc.write(&mut flat, symbol).unwrap();
    }
    enc.write(&mut flat, EOF).unwrap();
    let out = enc.finish().unwrap().into_inner();
    // a uniform model cannot do better than one byte per byte
    assert_eq!(out.len(), 1026);

    let mut dec = ArithmeticDecoder::new_strict(32, ACReader::new(out.as_slice())).unwrap();
    let mut decoded = Vec::new();
    loop {
        match dec.read(&mut flat).unwrap() {
            EOF => break,
            symbol => decoded.push(symbol),
        }
    }
    assert_eq!(decoded, input);
    assert_eq!(dec.finish().unwrap().bytes_read(), 1026);
}

#[test]
fn garbage_input_does_not_panic() {
    let mut seed = 7u64;
    for len in 0..64 {
        let input: Vec<u8> = (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                (seed >> 56) as u8
            })
            .collect();

        let mut freqs = adaptive_model();
        let mut dec = ArithmeticDecoder::new(32, ACReader::new(input.as_slice())).unwrap();
        for _ in 0..2000 {
            match dec.read(&mut freqs) {
                Ok(EOF) | Err(_) => break,
                Ok(symbol) => freqs.increment(symbol).unwrap(),
            }
        }
    }
}

#[test]
fn strict_length_check() {
    let input = b"hello arithmetic coding";
    let compressed = encode(32, input).unwrap();
    assert_eq!(compressed.len(), 24);

    let mut padded = compressed.clone();
    padded.extend_from_slice(&[0, 0]);
    assert_eq!(decode(32, &padded, false).unwrap(), input);
    assert!(matches!(
        decode(32, &padded, true),
        Err(Error::TrailingData { expected: 24, actual: 26 })
    ));

    // a cut stream decodes to garbage that ends well before the cut
    let cut = &compressed[..18];
    assert_eq!(decode(32, cut, false).unwrap().len(), 803);
    assert!(matches!(decode(32, cut, true), Err(Error::TrailingData { expected: 17, actual: 18 })));
}
