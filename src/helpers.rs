use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::error::{Error, Result};

/// Compares two files byte by byte.
pub fn cmp(file1: impl AsRef<Path>, file2: impl AsRef<Path>) -> Result<()> {
    let f1 = File::open(file1)?;
    let f2 = File::open(file2)?;

    let l1 = f1.metadata()?.len();
    let l2 = f2.metadata()?.len();

    let bytes1 = BufReader::new(f1).bytes();
    let bytes2 = BufReader::new(f2).bytes();
    for (pos, (b1, b2)) in (0..).zip(bytes1.zip(bytes2)) {
        if b1? != b2? {
            return Err(Error::Mismatch { position: pos });
        }
    }

    if l1 != l2 {
        return Err(Error::Mismatch { position: l1.min(l2) });
    }
    Ok(())
}

pub fn histogram(buf: &[u8]) -> Vec<u64> {
    let mut res = vec![0; 256];
    for &byte in buf {
        res[usize::from(byte)] += 1;
    }
    res
}

/// Order-0 Shannon entropy in bits per byte.
pub fn entropy(buf: &[u8]) -> f64 {
    if buf.is_empty() {
        return 0.0;
    }
    let len = buf.len() as f64;
    histogram(buf)
        .into_iter()
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

pub fn file_entropy(path: impl AsRef<Path>) -> Result<f64> {
    let buf = std::fs::read(path)?;
    Ok(entropy(&buf))
}
