//! Adaptive arithmetic coding.
//!
//! [`entropy_coding`] holds the interval state machine and its encoder and
//! decoder, [`frequency_table`] the models it codes against and [`codec`]
//! ties them together for whole byte streams.

pub mod codec;
pub mod entropy_coding;
pub mod error;
pub mod frequency_table;
pub mod helpers;
pub mod macros;

pub use error::{Error, Result};
