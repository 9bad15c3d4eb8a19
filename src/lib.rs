//! De-framing of telegrams sent by Aidon electricity meters over their HAN serial port
//!
//! [`reader::FrameAssembler`] is fed the serial stream one byte at a time and reassembles the
//! byte stuffed telegrams, [`telegram::Telegram`] reads their header fields.

#![cfg_attr(any(not(feature = "std"), not(test)), no_std)]

pub mod framing;
pub mod reader;
pub mod telegram;

// include defmt::Format implementations
// we don't want them derive()d in the modules unless defmt-impl feature is set
#[cfg(feature = "defmt-impl")]
pub mod defmt;

// reexport heapless
pub use heapless;
