//! Command-line argument parsing and runtime configuration.

use clap::Parser;

use crate::error::{Error, ErrorDetails, Result};

/// Extracts DVB teletext closed-caption subtitles from an MPEG transport
/// stream into SubRip (SRT).
#[derive(Parser, Debug)]
#[command(name = "telx2srt", version, about)]
struct Args {
    /// Teletext page number carrying closed captioning (100..899, default: auto).
    #[arg(short = 'p', long = "page")]
    page: Option<u16>,

    /// Transport stream PID of the teletext sub-stream (default: auto).
    #[arg(short = 't', long = "pid")]
    pid: Option<u16>,

    /// Subtitle offset in seconds.
    #[arg(short = 'o', long = "offset", default_value_t = 0.0)]
    offset: f64,

    /// Do not print a UTF-8 BOM at the start of output.
    #[arg(short = 'n', long = "no-bom")]
    no_bom: bool,

    /// Produce at least one (placeholder) cue when no subtitles are found.
    #[arg(short = '1', long = "nonempty")]
    nonempty: bool,

    /// Emit colour information as `<font>` tags.
    #[arg(short = 'c', long = "colours")]
    colours: bool,

    /// Be verbose.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Runtime configuration threaded down the pipeline by reference, in place
/// of process-wide globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// BCD-encoded page number (`(hundreds << 8) | (tens << 4) | units`), or
    /// `None` to auto-latch onto the first subtitle-bearing page seen.
    pub page: Option<u16>,
    /// Transport stream PID of the teletext sub-stream, or `None` to auto-latch.
    pub pid: Option<u16>,
    /// Offset applied to every cue's show/hide timestamps, in seconds.
    pub offset_seconds: f64,
    /// Whether to emit a leading UTF-8 BOM.
    pub bom: bool,
    /// Whether to emit a placeholder cue when no subtitles are found.
    pub nonempty: bool,
    /// Whether to render colour-control bytes as `<font>` tags.
    pub colours: bool,
    /// Whether to log at `trace`/`debug` verbosity.
    pub verbose: bool,
}

/// Parses `std::env::args()` into a [`Config`], converting the decimal page
/// number to the BCD form used internally (ETS 300 706 stores page numbers
/// in BCD) and validating its range.
pub fn parse_config() -> Result<Config> {
    let args = Args::parse();
    from_args(args)
}

fn from_args(args: Args) -> Result<Config> {
    let page = match args.page {
        None => None,
        Some(p) if (100..=899).contains(&p) => Some(decimal_to_bcd(p)),
        Some(p) => return Err(Error::new(0, ErrorDetails::PageOutOfRange(p))),
    };

    Ok(Config {
        page,
        pid: args.pid,
        offset_seconds: args.offset,
        bom: !args.no_bom,
        nonempty: args.nonempty,
        colours: args.colours,
        verbose: args.verbose,
    })
}

fn decimal_to_bcd(page: u16) -> u16 {
    ((page / 100) << 8) | ((page / 10 % 10) << 4) | (page % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_to_bcd_matches_hex_digit_layout() {
        assert_eq!(decimal_to_bcd(888), 0x888);
        assert_eq!(decimal_to_bcd(199), 0x199);
        assert_eq!(decimal_to_bcd(100), 0x100);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let args = Args {
            page: Some(50),
            pid: None,
            offset: 0.0,
            no_bom: false,
            nonempty: false,
            colours: false,
            verbose: false,
        };
        let err = from_args(args).unwrap_err();
        assert!(matches!(err.details, ErrorDetails::PageOutOfRange(50)));
    }
}
