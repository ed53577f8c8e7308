//! Drives TS packets from a byte stream through the demultiplexer, PES
//! framer, and teletext decoder, writing finished pages out as SRT.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::cli::Config;
use crate::demux::Demux;
use crate::error::RunError;
use crate::pes::{self, Clock};
use crate::teletext::{page, Decoder, Page};

const TS_PACKET_SIZE: usize = 188;
const PLACEHOLDER_CUE: &str = "1\r\n00:00:00,000 --> 00:00:01,000\r\n(no closed captioning available)\r\n\r\n";

/// Reads a transport stream from `input` and writes SRT cues to `output`,
/// stopping early if `stop_requested` becomes `true` (set by the binary's
/// SIGINT/SIGTERM handler). Returns the number of cues written.
pub fn run<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    config: &Config,
    stop_requested: &Arc<AtomicBool>,
) -> Result<u32, RunError> {
    if config.bom {
        output.write_all(&[0xef, 0xbb, 0xbf])?;
    }

    let mut demux = Demux::new(config.pid);
    let mut clock = Clock::new(config.offset_seconds);
    let mut decoder = Decoder::new(config.page);
    let mut packet_counter: u32 = 0;
    let mut cue_number: u32 = 0;
    let mut packet = [0u8; TS_PACKET_SIZE];

    while !stop_requested.load(Ordering::Relaxed) {
        let n = read_full(&mut input, &mut packet)?;
        if n < TS_PACKET_SIZE {
            break;
        }
        packet_counter += 1;

        if let Some(mut pes_buffer) = demux.process_packet(&packet, &mut clock)? {
            emit_pes(&mut pes_buffer, &mut clock, &mut decoder, config, &mut output, &mut cue_number)?;
        }
    }

    if let Some(mut pes_buffer) = demux.take_pending() {
        emit_pes(&mut pes_buffer, &mut clock, &mut decoder, config, &mut output, &mut cue_number)?;
    }

    if cue_number == 0 {
        info!("no frames produced; teletext page number was probably wrong");
    }
    log_seen_pages(decoder.cc_map());

    if cue_number == 0 && config.nonempty {
        output.write_all(PLACEHOLDER_CUE.as_bytes())?;
        cue_number += 1;
    }

    output.flush()?;
    info!("done ({packet_counter} transport packets processed, {cue_number} SRT frames written)");
    Ok(cue_number)
}

fn emit_pes<W: Write>(
    pes_buffer: &mut [u8],
    clock: &mut Clock,
    decoder: &mut Decoder,
    config: &Config,
    output: &mut W,
    cue_number: &mut u32,
) -> Result<(), RunError> {
    let mut finished = None;
    pes::process_pes_packet(pes_buffer, clock, |pkt, timestamp| {
        if let Some(page) = decoder.process_packet(pkt, timestamp) {
            finished = Some(page);
        }
    })?;

    if let Some(finished_page) = finished {
        write_cue(&finished_page, config, output, cue_number)?;
    }
    Ok(())
}

fn write_cue<W: Write>(finished: &Page, config: &Config, output: &mut W, cue_number: &mut u32) -> Result<(), RunError> {
    let mut out = String::new();
    if page::render(finished, *cue_number + 1, config.colours, &mut out) {
        *cue_number += 1;
        output.write_all(out.as_bytes())?;
        output.flush()?;
    }
    Ok(())
}

fn log_seen_pages(cc_map: &[u8; 256]) {
    let mut seen = String::new();
    for (i, &bits) in cc_map.iter().enumerate().take(0xff) {
        for j in 0..8u8 {
            if bits & (1 << j) != 0 {
                seen.push_str(&format!("{:03x} ", ((j as u16 + 1) << 8) | i as u16));
            }
        }
    }
    if !seen.is_empty() {
        info!("closed captioning was carried via pages: {seen}");
    }
}

fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
