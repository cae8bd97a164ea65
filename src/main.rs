use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;

use crate::colorize::ColorDepth;
use crate::input::LineSource;
use crate::render::RenderError;
use crate::runtime::{RainbowConfig, RainbowState, TermEvents};

mod colorize;
mod input;
mod render;
mod runtime;
mod signals;

const AFTER_HELP: &str = "\
Examples:
  lolcat f - g      Output f's contents, then standard input, then g's contents.
  lolcat            Copy standard input to standard output.
  fortune | lolcat  Display a rainbow cookie.";

/// Concatenate files to standard output in rainbow colors.
#[derive(Parser, Debug)]
#[command(name = "lolcat", after_help = AFTER_HELP)]
struct Cli {
    /// Rainbow spread across characters
    #[arg(short = 'p', long, default_value_t = 3.0, value_parser = parse_spread)]
    spread: f64,

    /// Rainbow frequency across characters
    #[arg(short = 'F', long, default_value_t = 0.1)]
    freq: f64,

    /// Rainbow frequency across lines
    #[arg(short = 'V', long, default_value_t = 1.0)]
    vertical: f64,

    /// Random seed for the starting color; 0 means randomize
    #[arg(short = 'S', long, default_value_t = 0)]
    seed: u64,

    /// Animate each line before moving on
    #[arg(short = 'a', long)]
    animate: bool,

    /// Number of animation frames per line
    #[arg(short = 'd', long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..))]
    duration: u32,

    /// Animation speed in frames per second
    #[arg(short = 's', long, default_value_t = 20.0, value_parser = parse_speed)]
    speed: f64,

    /// Color the background instead of the text
    #[arg(short = 'i', long)]
    invert: bool,

    /// Force 24-bit color output
    #[arg(short = 't', long)]
    truecolor: bool,

    /// Force color even when standard output is not a terminal
    #[arg(short = 'f', long)]
    force: bool,

    /// Print version information and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// Files to read; `-` or no files means standard input
    files: Vec<String>,
}

fn parse_spread(raw: &str) -> Result<f64, String> {
    parse_min_float(raw, 0.1, "spread")
}

fn parse_speed(raw: &str) -> Result<f64, String> {
    parse_min_float(raw, 0.1, "speed")
}

fn parse_min_float(raw: &str, minimum: f64, name: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("invalid {name} '{raw}'"))?;
    if !value.is_finite() || value < minimum {
        return Err(format!("{name} must be at least {minimum}"));
    }
    Ok(value)
}

fn build_config(cli: &Cli) -> RainbowConfig {
    let color_enabled = cli.force || runtime::stdout_is_tty();
    let depth = if cli.truecolor || runtime::detect_truecolor() {
        ColorDepth::Truecolor
    } else {
        ColorDepth::Ansi256
    };
    RainbowConfig {
        spread: cli.spread,
        frequency: cli.freq,
        vertical_frequency: cli.vertical,
        seed: cli.seed,
        animate: cli.animate,
        duration: cli.duration,
        speed: cli.speed,
        invert: cli.invert,
        depth,
        color_enabled,
    }
}

/// Feeds every input source through the selected renderer.
///
/// Sources open lazily, so a bad file name stops the run at that point
/// but leaves output already produced for earlier sources intact.
/// Animation needs a cursor to redraw against, so without color the
/// animated mode falls back to plain passthrough.
fn render_sources<W: Write>(
    out: &mut W,
    names: &[String],
    state: &mut RainbowState,
    events: &TermEvents,
) -> anyhow::Result<()> {
    let animated = state.config.animate && state.config.color_enabled;
    let mut line = Vec::new();
    for name in names {
        let mut source = LineSource::open(name)?;
        while source.next_line(&mut line)? {
            if events.is_terminated() {
                return Ok(());
            }
            if animated {
                render::render_animated(out, &line, state, events)?;
            } else {
                render::render_plain(out, &line, state, events)?;
            }
        }
    }
    Ok(())
}

/// Ends the output on default colors after an early stop.
///
/// A completed run already resets at each newline; an interrupt can land
/// mid-line and leave the terminal on a rainbow color.
fn restore_colors<W: Write>(
    out: &mut W,
    state: &RainbowState,
    events: &TermEvents,
) -> Result<(), RenderError> {
    if state.config.color_enabled && events.is_terminated() {
        out.write_all(colorize::RESET)?;
        out.flush()?;
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = build_config(cli);
    let events = Arc::new(TermEvents::new(runtime::detect_columns()));
    signals::install(&events)?;

    let names = input::source_names(&cli.files);
    let mut state = RainbowState::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = render_sources(&mut out, &names, &mut state, &events);
    restore_colors(&mut out, &state, &events)?;
    outcome
}

fn main() {
    let cli = Cli::parse();
    if cli.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return;
    }
    if let Err(error) = run(&cli) {
        eprintln!("lolcat: {error:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(arguments: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("lolcat").chain(arguments.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).expect("parse failed");
        assert_eq!(cli.spread, 3.0);
        assert_eq!(cli.freq, 0.1);
        assert_eq!(cli.vertical, 1.0);
        assert_eq!(cli.seed, 0);
        assert!(!cli.animate);
        assert_eq!(cli.duration, 12);
        assert_eq!(cli.speed, 20.0);
        assert!(!cli.invert);
        assert!(!cli.truecolor);
        assert!(!cli.force);
        assert!(!cli.version);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["-a", "-i", "-t", "-f", "-p", "8.5", "-d", "24", "-s", "30"])
            .expect("parse failed");
        assert!(cli.animate);
        assert!(cli.invert);
        assert!(cli.truecolor);
        assert!(cli.force);
        assert_eq!(cli.spread, 8.5);
        assert_eq!(cli.duration, 24);
        assert_eq!(cli.speed, 30.0);
    }

    #[test]
    fn test_positional_files_keep_order() {
        let cli = parse(&["f", "-", "g"]).expect("parse failed");
        assert_eq!(cli.files, vec!["f", "-", "g"]);
    }

    #[test]
    fn test_spread_below_minimum_is_rejected() {
        assert!(parse(&["--spread", "0.05"]).is_err());
        assert!(parse(&["--spread", "nan"]).is_err());
        assert!(parse(&["--spread", "bogus"]).is_err());
    }

    #[test]
    fn test_speed_below_minimum_is_rejected() {
        assert!(parse(&["--speed", "0"]).is_err());
    }

    #[test]
    fn test_duration_zero_is_rejected() {
        assert!(parse(&["--duration", "0"]).is_err());
    }

    #[test]
    fn test_version_flag_parses() {
        let cli = parse(&["-v"]).expect("parse failed");
        assert!(cli.version);
    }

    #[test]
    fn test_config_carries_cli_values() {
        let cli = parse(&["-p", "5", "-F", "0.3", "-V", "2", "-S", "9", "-a", "-i"])
            .expect("parse failed");
        let config = build_config(&cli);
        assert_eq!(config.spread, 5.0);
        assert_eq!(config.frequency, 0.3);
        assert_eq!(config.vertical_frequency, 2.0);
        assert_eq!(config.seed, 9);
        assert!(config.animate);
        assert!(config.invert);
    }

    #[test]
    fn test_truecolor_flag_selects_depth() {
        let cli = parse(&["--truecolor"]).expect("parse failed");
        let config = build_config(&cli);
        assert_eq!(config.depth, ColorDepth::Truecolor);
    }
}
