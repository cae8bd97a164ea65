use std::io::Write;
use std::thread;

use crate::colorize::{self, EscapeBuffer, EscapeError, RESET};
use crate::runtime::{RainbowState, TermEvents};

/// Saves the cursor position before a segment's redraw frames.
const SAVE_CURSOR: &[u8] = b"\x1b[s";
/// Returns the cursor to the saved position at the start of each frame.
const RESTORE_CURSOR: &[u8] = b"\x1b[u";

/// Errors that can occur while rendering to the output stream.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to write to output: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Escape(#[from] EscapeError),
}

/// Colors a chunk of input once, character by character.
///
/// Each non-newline character is preceded by its rainbow escape; a newline
/// resets the terminal colors and restarts the horizontal position. The
/// terminate flag is polled before every character, and an early stop
/// leaves a valid truncated stream behind. With color disabled the bytes
/// pass through untouched.
pub(crate) fn render_plain<W: Write>(
    out: &mut W,
    chunk: &[u8],
    state: &mut RainbowState,
    events: &TermEvents,
) -> Result<(), RenderError> {
    if !state.config.color_enabled {
        if events.is_terminated() {
            return Ok(());
        }
        out.write_all(chunk)?;
        return Ok(());
    }

    let text = String::from_utf8_lossy(chunk);
    let mut buf = EscapeBuffer::new();
    let mut utf8 = [0u8; 4];
    for ch in text.chars() {
        if events.is_terminated() {
            return Ok(());
        }
        if state.char_count == 0 {
            state.advance_line();
        }
        if ch == '\n' {
            out.write_all(RESET)?;
            out.write_all(b"\n")?;
            state.char_count = 0;
            state.line_count += 1;
        } else {
            buf.clear();
            colorize::write_color(
                &mut buf,
                state.line_base,
                state.config.frequency,
                state.char_count as f64 * state.spread_inverse,
                state.config.depth,
                state.config.invert,
            )?;
            out.write_all(buf.as_bytes())?;
            out.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
            state.char_count += 1;
        }
    }
    Ok(())
}

/// Redraws one input line in place as a timed animation.
///
/// The line is split into wrap-segments of at most the terminal width
/// (embedded newlines also end a segment). Each segment saves the cursor
/// once, then redraws itself `duration` times with the color band shifted
/// by `spread` per frame, sleeping the frame interval in between, and
/// finally resets colors and moves to the next line.
///
/// The terminal width is snapshotted when a segment starts; a resize
/// arriving mid-segment applies from the next segment on.
pub(crate) fn render_animated<W: Write>(
    out: &mut W,
    chunk: &[u8],
    state: &mut RainbowState,
    events: &TermEvents,
) -> Result<(), RenderError> {
    let text = String::from_utf8_lossy(chunk);
    let chars: Vec<char> = text.chars().collect();
    let mut buf = EscapeBuffer::new();
    let mut utf8 = [0u8; 4];

    let mut start = 0;
    while start < chars.len() {
        if events.is_terminated() {
            return Ok(());
        }
        let width = events.columns() as usize;
        let remaining = &chars[start..];
        let newline_at = remaining.iter().position(|&c| c == '\n');
        let segment_len = newline_at.map_or(remaining.len(), |at| at).min(width);
        let segment = &remaining[..segment_len];

        state.advance_line();
        out.write_all(SAVE_CURSOR)?;
        for frame in 0..state.config.duration {
            if events.is_terminated() {
                return Ok(());
            }
            out.write_all(RESTORE_CURSOR)?;
            for (index, &ch) in segment.iter().enumerate() {
                // The per-frame term shifts the whole band, which is what
                // makes the segment appear to scroll through the rainbow.
                let cycle_position = state.spread_inverse * index as f64
                    + state.config.spread * f64::from(frame);
                buf.clear();
                colorize::write_color(
                    &mut buf,
                    state.line_base,
                    state.config.frequency,
                    cycle_position,
                    state.config.depth,
                    state.config.invert,
                )?;
                out.write_all(buf.as_bytes())?;
                out.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
            }
            out.flush()?;
            thread::sleep(state.frame_interval);
        }
        out.write_all(RESET)?;
        out.write_all(b"\n")?;
        state.line_count += 1;

        start += segment_len;
        if newline_at == Some(segment_len) {
            start += 1;
        }
    }
    Ok(())
}
