use std::f64::consts::PI;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{env, io};

use crate::colorize::ColorDepth;

/// Width assumed when stdout is not a terminal or the size query fails.
pub(crate) const DEFAULT_COLUMNS: u16 = 80;

/// Caller-supplied knobs, immutable once rendering begins.
#[derive(Debug, Clone)]
pub(crate) struct RainbowConfig {
    /// Horizontal color density; its inverse scales the per-character step.
    pub spread: f64,
    /// Horizontal hue angular speed.
    pub frequency: f64,
    /// Hue increment applied at each new output line.
    pub vertical_frequency: f64,
    /// Seed for the starting phase; 0 draws one from the clock.
    pub seed: u64,
    /// Redraw each line in place instead of printing it once.
    pub animate: bool,
    /// Frames rendered per line when animating.
    pub duration: u32,
    /// Animation frames per second.
    pub speed: f64,
    /// Color the background instead of the foreground.
    pub invert: bool,
    pub depth: ColorDepth,
    /// Whether escapes are emitted at all (tty or forced).
    pub color_enabled: bool,
}

/// Mutable per-run rendering state, owned by the render loop.
#[derive(Debug)]
pub(crate) struct RainbowState {
    pub config: RainbowConfig,
    /// `1 / spread`, derived once; always positive (spread is >= 0.1).
    pub spread_inverse: f64,
    /// Phase offset of the current line; advances monotonically and wraps
    /// naturally through the sine, so no modulus is applied.
    pub line_base: f64,
    /// Horizontal position within the current line; reset at each newline.
    pub char_count: u64,
    /// Output lines produced so far (diagnostic only).
    pub line_count: u64,
    /// Pause between animation frames, `1 / speed` seconds.
    pub frame_interval: Duration,
}

impl RainbowState {
    pub(crate) fn new(config: RainbowConfig) -> Self {
        let seed = match config.seed {
            0 => clock_seed(),
            explicit => explicit,
        };
        let mut rng = fastrand::Rng::with_seed(seed);
        let line_base = rng.f64() * PI;
        let spread_inverse = 1.0 / config.spread;
        let frame_interval = Duration::from_secs_f64(1.0 / config.speed);
        Self {
            config,
            spread_inverse,
            line_base,
            char_count: 0,
            line_count: 0,
            frame_interval,
        }
    }

    /// Advances the phase for a new output line.
    pub(crate) fn advance_line(&mut self) {
        self.line_base += self.config.vertical_frequency * self.spread_inverse;
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(1)
}

/// Scalars mutated by asynchronous terminal notifications.
///
/// Each field has exactly one writer (a signal handler) and one reader (the
/// render loop), and each is an independent atomic, so no read can observe
/// a torn value. Handlers hold a non-owning clone of the [`std::sync::Arc`]
/// wrapping this and touch their single field only.
#[derive(Debug)]
pub(crate) struct TermEvents {
    columns: AtomicU16,
    terminate: AtomicBool,
}

impl TermEvents {
    pub(crate) fn new(columns: u16) -> Self {
        Self {
            columns: AtomicU16::new(columns.max(1)),
            terminate: AtomicBool::new(false),
        }
    }

    /// Current terminal width in columns, at least 1.
    pub(crate) fn columns(&self) -> u16 {
        self.columns.load(Ordering::SeqCst).max(1)
    }

    pub(crate) fn set_columns(&self, columns: u16) {
        self.columns.store(columns.max(1), Ordering::SeqCst);
    }

    /// Requests cooperative termination; polled at render boundaries.
    pub(crate) fn terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }
}

/// Queries the terminal width, falling back to [`DEFAULT_COLUMNS`].
pub(crate) fn detect_columns() -> u16 {
    match crossterm::terminal::size() {
        Ok((columns, _rows)) if columns > 0 => columns,
        _ => DEFAULT_COLUMNS,
    }
}

pub(crate) fn stdout_is_tty() -> bool {
    io::stdout().is_terminal()
}

/// Whether `COLORTERM` advertises 24-bit color support.
pub(crate) fn detect_truecolor() -> bool {
    truecolor_advertised(env::var("COLORTERM").ok().as_deref())
}

fn truecolor_advertised(colorterm: Option<&str>) -> bool {
    matches!(colorterm, Some("truecolor") | Some("24bit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config_with_seed(seed: u64) -> RainbowConfig {
        RainbowConfig {
            spread: 3.0,
            frequency: 0.1,
            vertical_frequency: 1.0,
            seed,
            animate: false,
            duration: 12,
            speed: 20.0,
            invert: false,
            depth: ColorDepth::Ansi256,
            color_enabled: true,
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let first = RainbowState::new(config_with_seed(42));
        let second = RainbowState::new(config_with_seed(42));
        assert_eq!(first.line_base, second.line_base);
        assert!((0.0..PI).contains(&first.line_base));
    }

    #[test]
    fn test_derived_fields() {
        let state = RainbowState::new(config_with_seed(7));
        assert_eq!(state.spread_inverse, 1.0 / 3.0);
        assert_eq!(state.frame_interval, Duration::from_secs_f64(0.05));
        assert_eq!(state.char_count, 0);
        assert_eq!(state.line_count, 0);
    }

    #[test]
    fn test_advance_line_is_monotone() {
        let mut state = RainbowState::new(config_with_seed(7));
        let start = state.line_base;
        state.advance_line();
        let after_one = state.line_base;
        state.advance_line();
        assert!(after_one > start);
        assert!(state.line_base > after_one);
        assert!((after_one - start - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_term_events_columns_clamped() {
        let events = TermEvents::new(0);
        assert_eq!(events.columns(), 1);
        events.set_columns(120);
        assert_eq!(events.columns(), 120);
        events.set_columns(0);
        assert_eq!(events.columns(), 1);
    }

    #[test]
    fn test_terminate_flag() {
        let events = TermEvents::new(80);
        assert!(!events.is_terminated());
        events.terminate();
        assert!(events.is_terminated());
    }

    #[rstest]
    #[case(Some("truecolor"), true)]
    #[case(Some("24bit"), true)]
    #[case(Some("yes"), false)]
    #[case(Some("256color"), false)]
    #[case(None, false)]
    fn test_truecolor_advertised(#[case] value: Option<&str>, #[case] expected: bool) {
        assert_eq!(truecolor_advertised(value), expected);
    }
}
