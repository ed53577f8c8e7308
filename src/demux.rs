//! TS demultiplexer: sync-byte validation, PID latching, continuity
//! tracking, adaptation-field/PCR parsing, and bounded PES reassembly.

use log::warn;
use modular_bitfield_msb::prelude::*;

use crate::error::{ErrorDetails, Result};
use crate::pes::Clock;
use crate::read_bitfield;
use crate::slice_reader::SliceReader;

/// Link-layer header found at the start of every 188-byte MPEG-TS packet.
/// Mirrors `mpegts-io`'s `PacketHeader`.
#[bitfield]
#[derive(Debug)]
struct PacketHeader {
    sync_byte: B8,
    tei: bool,
    pusi: bool,
    priority: bool,
    pid: B13,
    tsc: B2,
    has_adaptation_field: bool,
    has_payload: bool,
    continuity_counter: B4,
}

/// Adaptation-field flags, mirroring `mpegts-io`'s `AdaptationFieldHeader`.
#[bitfield]
#[derive(Debug)]
struct AdaptationFieldHeader {
    length: B8,
    discontinuity: bool,
    random_access: bool,
    priority: bool,
    has_pcr: bool,
    has_opcr: bool,
    has_splice_countdown: bool,
    has_transport_private_data: bool,
    has_adaptation_field_extension: bool,
}

fn parse_pcr_ms(b: &[u8; 6]) -> i64 {
    let mut base: u64 = (b[0] as u64) << 25;
    base |= (b[1] as u64) << 17;
    base |= (b[2] as u64) << 9;
    base |= (b[3] as u64) << 1;
    base |= (b[4] as u64) >> 7;

    let mut extension: u64 = ((b[4] & 0x1) as u64) << 8;
    extension |= b[5] as u64;

    (base / 90) as i64 + (extension / 27000) as i64
}

const PES_BUFFER_CAP: usize = 4096;
const PES_PREFIX_BD: [u8; 4] = [0x00, 0x00, 0x01, 0xbd];

/// Demultiplexer state: latched PID, continuity counter, and the bounded
/// in-progress PES accumulation buffer.
pub struct Demux {
    configured_pid: Option<u16>,
    latched_pid: Option<u16>,
    continuity: Option<u8>,
    buffer: Vec<u8>,
    buffering: bool,
}

impl Demux {
    /// Builds a demultiplexer. `configured_pid` pins the target PID; `None`
    /// auto-latches onto the first PID carrying a PES blob with a private
    /// stream 1 (`0xbd`) prefix.
    pub fn new(configured_pid: Option<u16>) -> Self {
        Self {
            configured_pid,
            latched_pid: None,
            continuity: None,
            buffer: Vec::with_capacity(PES_BUFFER_CAP),
            buffering: false,
        }
    }

    fn target_pid(&self) -> Option<u16> {
        self.configured_pid.or(self.latched_pid)
    }

    /// Processes one 188-byte transport packet. Returns a completed PES
    /// blob if this packet's payload-unit-start flushed a previously
    /// buffered one.
    pub fn process_packet(&mut self, packet: &[u8; 188], clock: &mut Clock) -> Result<Option<Vec<u8>>> {
        let mut reader = SliceReader::new(packet);
        let header: PacketHeader = read_bitfield!(reader, PacketHeader);

        if header.sync_byte() != 0x47 {
            return Err(reader.make_error(ErrorDetails::LostSync));
        }

        let pid = header.pid();
        if pid == 0x1fff {
            return Ok(None);
        }
        if header.tei() {
            warn!("transport-error indicator set on PID {pid:#x}, skipping packet");
            return Ok(None);
        }

        if header.has_adaptation_field() {
            let af_header: AdaptationFieldHeader = read_bitfield!(reader, AdaptationFieldHeader);
            let af_length = af_header.length() as usize;
            if !(1..=183).contains(&af_length) {
                return Err(reader.make_error(ErrorDetails::BadAdaptationHeader));
            }
            let mut af_reader = reader.new_sub_reader(af_length - 1)?;
            if af_header.has_pcr() {
                if af_reader.remaining_len() < 6 {
                    return Err(reader.make_error(ErrorDetails::BadAdaptationHeader));
                }
                let pcr_ms = parse_pcr_ms(&af_reader.read_array_ref::<6>()?);
                clock.observe_pcr(pcr_ms);
            }
            if header.has_payload()
                && af_header.discontinuity()
                && self.target_pid() == Some(pid)
            {
                self.continuity = None;
            }
        }

        if !header.has_payload() {
            return Ok(None);
        }

        if self.target_pid().is_none() && header.pusi() {
            let peek = reader.peek(reader.remaining_len().min(4))?;
            if peek.len() == 4 && peek == PES_PREFIX_BD {
                log::info!("no teletext PID specified, auto-latched PID {pid:#x}");
                self.latched_pid = Some(pid);
            }
        }

        if self.target_pid() != Some(pid) {
            return Ok(None);
        }

        let continuity_counter = header.continuity_counter();
        if let Some(expected) = self.continuity {
            if continuity_counter != expected {
                warn!("continuity counter gap on PID {pid:#x}: expected {expected}, got {continuity_counter}");
                self.buffer.clear();
                self.buffering = false;
            }
        }
        self.continuity = Some((continuity_counter + 1) & 0x0f);

        let payload = reader.read_to_end()?;
        let mut flushed = None;
        if header.pusi() {
            if self.buffering && !self.buffer.is_empty() {
                flushed = Some(std::mem::take(&mut self.buffer));
            }
            self.buffer.clear();
            self.buffer.extend_from_slice(payload);
            self.buffering = true;
        } else if self.buffering {
            if self.buffer.len() + payload.len() > PES_BUFFER_CAP {
                warn!("PES reassembly buffer overflow on PID {pid:#x}, dropping packet payload");
            } else {
                self.buffer.extend_from_slice(payload);
            }
        }

        Ok(flushed)
    }

    /// Flushes whatever PES data remains buffered at end of input.
    pub fn take_pending(&mut self) -> Option<Vec<u8>> {
        if self.buffering && !self.buffer.is_empty() {
            self.buffering = false;
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> [u8; 188] {
        let mut pkt = [0xffu8; 188];
        pkt[0] = 0x47;
        pkt[1] = ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1f);
        pkt[2] = (pid & 0xff) as u8;
        pkt[3] = 0x10 | (cc & 0x0f); // no adaptation field, payload present
        let n = payload.len().min(184);
        pkt[4..4 + n].copy_from_slice(&payload[..n]);
        pkt
    }

    #[test]
    fn rejects_bad_sync_byte() {
        let mut pkt = ts_packet(100, true, 0, &[]);
        pkt[0] = 0x00;
        let mut demux = Demux::new(Some(100));
        let mut clock = Clock::new(0.0);
        let err = demux.process_packet(&pkt, &mut clock).unwrap_err();
        assert!(matches!(err.details, ErrorDetails::LostSync));
    }

    #[test]
    fn auto_latches_on_pes_bd_prefix() {
        let payload = [0x00, 0x00, 0x01, 0xbd, 0x00, 0x10];
        let pkt = ts_packet(200, true, 0, &payload);
        let mut demux = Demux::new(None);
        let mut clock = Clock::new(0.0);
        demux.process_packet(&pkt, &mut clock).unwrap();
        assert_eq!(demux.target_pid(), Some(200));
    }

    #[test]
    fn continuity_gap_discards_buffer() {
        let mut demux = Demux::new(Some(100));
        let mut clock = Clock::new(0.0);
        let start = ts_packet(100, true, 0, &[0x00, 0x00, 0x01, 0xbd]);
        demux.process_packet(&start, &mut clock).unwrap();
        let cont = ts_packet(100, false, 1, &[0xaa; 180]);
        demux.process_packet(&cont, &mut clock).unwrap();
        assert!(!demux.buffer.is_empty());
        let gap = ts_packet(100, false, 3, &[0xbb; 180]);
        demux.process_packet(&gap, &mut clock).unwrap();
        assert!(demux.buffer.is_empty());
    }

    #[test]
    fn new_unit_start_flushes_previous_buffer() {
        let mut demux = Demux::new(Some(100));
        let mut clock = Clock::new(0.0);
        let first = ts_packet(100, true, 0, &[0x11, 0x22]);
        assert!(demux.process_packet(&first, &mut clock).unwrap().is_none());
        let second = ts_packet(100, true, 1, &[0x33, 0x44]);
        let flushed = demux.process_packet(&second, &mut clock).unwrap();
        assert_eq!(flushed.unwrap()[0], 0x11);
    }
}
