//! Wire framing used on the meter's HAN port
//!
//! Telegrams are sent between a start and an end marker. Two byte values are reserved inside a
//! frame and are byte stuffed when they occur in the payload:
//!
//! | literal          | on the wire                   |
//! |------------------|-------------------------------|
//! | end marker       | escape introducer, `ESC_END`  |
//! | escape introducer| escape introducer, `ESC_ESC`  |
//!
//! The start marker is only meaningful while the reader is waiting for a new frame, so it is
//! never escaped.

/// Wire constants of one framing variant.
///
/// [`FrameAssembler`](crate::reader::FrameAssembler) is generic over this trait so that other
/// meter variants can be plugged in without touching the state machine.
pub trait Framing {
    const START: u8;
    const END: u8;
    const ESCAPE: u8;
    /// Sent after [`Framing::ESCAPE`] in place of a literal [`Framing::END`]
    const ESC_END: u8;
    /// Sent after [`Framing::ESCAPE`] in place of a literal [`Framing::ESCAPE`]
    const ESC_ESC: u8;
    /// An end marker only closes the frame once more than this many bytes were stored
    const MIN_FRAME_LENGTH: usize;
    const VALID_FRAME_FORMAT: u8;

    fn is_valid_frame_format(frame_format: u8) -> bool {
        frame_format == Self::VALID_FRAME_FORMAT
    }
}

/// Framing emitted by Aidon meters
pub struct Aidon {}

impl Framing for Aidon {
    const START: u8 = 0x37;
    const END: u8 = 0xc0;
    const ESCAPE: u8 = 0xdb;
    const ESC_END: u8 = 0xdc;
    const ESC_ESC: u8 = 0xdd;
    const MIN_FRAME_LENGTH: usize = 80;
    const VALID_FRAME_FORMAT: u8 = 0xa0;
}

/// Outcome of pushing one wire byte through the escape decoder
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Unescaped {
    /// Escape introducer consumed, nothing to store
    Introducer,
    /// Byte produced by an escape sequence, never a frame boundary
    Literal(u8),
    /// Byte taken as is from the wire
    Plain(u8),
}

/// Decodes a single wire byte.
///
/// `escape_pending` tells whether the previous byte was the escape introducer. An introducer
/// followed by anything other than the two escape codes is dropped and the byte is handled as a
/// plain one.
pub fn unescape<F: Framing>(escape_pending: bool, byte: u8) -> Unescaped {
    match byte {
        b if b == F::ESCAPE => Unescaped::Introducer,
        b if escape_pending && b == F::ESC_END => Unescaped::Literal(F::END),
        b if escape_pending && b == F::ESC_ESC => Unescaped::Literal(F::ESCAPE),
        b => Unescaped::Plain(b),
    }
}

#[derive(PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum EncodeError {
    BufferTooSmall,
}

/// Worst case length of a frame carrying `payload_length` bytes: every byte escaped plus both
/// markers.
pub const fn max_encoding_length(payload_length: usize) -> usize {
    2 * payload_length + 2
}

/// Writes `payload` to `out` as a complete wire frame, start marker first and end marker last.
///
/// Returns the number of bytes written.
pub fn encode_frame<F: Framing>(payload: &[u8], out: &mut [u8]) -> Result<usize, EncodeError> {
    let mut written = 0;
    let mut put = |byte: u8| -> Result<(), EncodeError> {
        let slot = out.get_mut(written).ok_or(EncodeError::BufferTooSmall)?;
        *slot = byte;
        written += 1;
        Ok(())
    };

    put(F::START)?;
    for &byte in payload {
        match byte {
            b if b == F::END => {
                put(F::ESCAPE)?;
                put(F::ESC_END)?;
            }
            b if b == F::ESCAPE => {
                put(F::ESCAPE)?;
                put(F::ESC_ESC)?;
            }
            b => put(b)?,
        }
    }
    put(F::END)?;
    Ok(written)
}
