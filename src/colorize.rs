use std::f64::consts::PI;
use std::fmt::{self, Write};

/// Phase shift between the red, green and blue channels (a third of a turn).
const CHANNEL_SHIFT: f64 = 2.0 * PI / 3.0;

/// Largest sequence we ever emit is `ESC[48;2;255;255;255m` (19 bytes).
const ESCAPE_CAPACITY: usize = 32;

/// Resets the terminal to its default colors.
pub(crate) const RESET: &[u8] = b"\x1b[0m";

/// Color depth the generator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorDepth {
    /// 256-color palette, using the 6x6x6 color cube.
    Ansi256,
    /// 24-bit direct RGB.
    Truecolor,
}

/// Errors that can occur when formatting an escape sequence.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EscapeError {
    #[error("escape sequence exceeds buffer capacity")]
    Overflow,
}

/// Fixed-capacity, stack-allocated buffer for a single escape sequence.
///
/// The generator formats into this instead of allocating. Overflow is a
/// programming error for the bounded sequences we produce, so it surfaces
/// as a distinct [`EscapeError`] and is asserted against in debug builds.
pub(crate) struct EscapeBuffer {
    bytes: [u8; ESCAPE_CAPACITY],
    len: usize,
}

impl EscapeBuffer {
    pub(crate) fn new() -> Self {
        Self { bytes: [0; ESCAPE_CAPACITY], len: 0 }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Write for EscapeBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let incoming = s.as_bytes();
        if self.len + incoming.len() > ESCAPE_CAPACITY {
            return Err(fmt::Error);
        }
        self.bytes[self.len..self.len + incoming.len()].copy_from_slice(incoming);
        self.len += incoming.len();
        Ok(())
    }
}

/// Samples the three color channels of the rainbow at the given phase.
///
/// Each channel is `sin(phase + shift) * amplitude + center`, truncated.
/// With amplitude 127 / center 128 this lands in 1..=255.
fn truecolor_channels(phase: f64) -> (u8, u8, u8) {
    let red = phase.sin() * 127.0 + 128.0;
    let green = (phase + CHANNEL_SHIFT).sin() * 127.0 + 128.0;
    let blue = (phase + 2.0 * CHANNEL_SHIFT).sin() * 127.0 + 128.0;
    (red as u8, green as u8, blue as u8)
}

/// Maps the phase onto the 256-color palette's 6x6x6 cube.
///
/// Channels use amplitude 2 / center 2, truncating to 0..=4, so the
/// brightest cube level is never produced. The combined index is
/// `16 + 36r + 6g + b`.
fn palette_index(phase: f64) -> u8 {
    let red = (phase.sin() * 2.0 + 2.0) as u8;
    let green = ((phase + CHANNEL_SHIFT).sin() * 2.0 + 2.0) as u8;
    let blue = ((phase + 2.0 * CHANNEL_SHIFT).sin() * 2.0 + 2.0) as u8;
    16 + 36 * red + 6 * green + blue
}

/// Formats the escape sequence selecting the rainbow color for one cell.
///
/// The color is sampled at `base_phase + frequency * cycle_position`.
/// `invert` selects a background instead of a foreground sequence. The
/// result is written into `buf`, which the caller is expected to have
/// cleared.
pub(crate) fn write_color(
    buf: &mut EscapeBuffer,
    base_phase: f64,
    frequency: f64,
    cycle_position: f64,
    depth: ColorDepth,
    invert: bool,
) -> Result<(), EscapeError> {
    let phase = base_phase + frequency * cycle_position;
    let plane = if invert { 48 } else { 38 };
    let outcome = match depth {
        ColorDepth::Truecolor => {
            let (r, g, b) = truecolor_channels(phase);
            write!(buf, "\x1b[{plane};2;{r};{g};{b}m")
        }
        ColorDepth::Ansi256 => {
            let index = palette_index(phase);
            write!(buf, "\x1b[{plane};5;{index}m")
        }
    };
    debug_assert!(outcome.is_ok(), "escape sequence overflowed its buffer");
    outcome.map_err(|_| EscapeError::Overflow)
}
