//! Extracts DVB/EBU teletext closed-caption subtitles from an MPEG transport
//! stream and renders them as SubRip (SRT).
//!
//! # Usage
//!
//! ```no_run
//! use std::io::{stdin, stdout};
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! use telx_srt::cli::parse_config;
//! use telx_srt::pipeline::run;
//!
//! let config = parse_config().expect("bad arguments");
//! let stop_requested = Arc::new(AtomicBool::new(false));
//! run(stdin().lock(), stdout().lock(), &config, &stop_requested).expect("extraction failed");
//! ```

#![allow(unused)]
#![deny(missing_docs, unsafe_code)]

pub mod cli;
pub mod demux;
pub mod error;
pub mod pes;
pub mod pipeline;
pub mod slice_reader;
pub mod teletext;

pub use error::{Error, ErrorDetails, Result, RunError};
pub use slice_reader::SliceReader;
