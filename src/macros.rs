/// Lossless integer to `usize` conversion for symbol indices.
///
/// Symbols are `u32`, so this only fails on 16-bit targets.
#[macro_export]
macro_rules! usize {
    ($a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { usize::try_from($a).unwrap_unchecked() }
        } else {
            usize::try_from($a).unwrap()
        }
    };
}
