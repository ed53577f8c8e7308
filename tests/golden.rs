//! End-to-end tests: synthetic transport streams built byte-by-byte from
//! Hamming(8,4)/Hamming(24,18)-encoded teletext packets, run through the
//! full pipeline, and checked against the SRT text that comes out.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use telx_srt::cli::Config;
use telx_srt::pipeline::run;

/// Same parity-check-matrix construction as `UNHAM_8_4`'s encode counterpart:
/// P1 checks {D1,D2,D4}, P2 checks {D1,D3,D4}, P3 checks {D2,D3,D4}, and the
/// top bit is chosen so the whole byte has even population count.
fn encode_hamm84(nibble: u8) -> u8 {
    let d1 = nibble & 1;
    let d2 = (nibble >> 1) & 1;
    let d3 = (nibble >> 2) & 1;
    let d4 = (nibble >> 3) & 1;
    let p1 = d1 ^ d2 ^ d4;
    let p2 = d1 ^ d3 ^ d4;
    let p3 = d2 ^ d3 ^ d4;
    let mut byte = p1 | (p2 << 1) | (d1 << 2) | (p3 << 3) | (d2 << 4) | (d3 << 5) | (d4 << 6);
    if byte.count_ones() % 2 != 0 {
        byte |= 0x80;
    }
    byte
}

/// Builds a valid Hamming(24,18) codeword from an 18-bit data value, using
/// the same column-id parity-check-matrix scheme as `UNHAM_24_18_PAR`.
fn encode_hamm24_18(d: u32) -> (u8, u8, u8) {
    const NON_POWERS_OF_TWO: [u8; 18] = [3, 5, 6, 7, 9, 10, 11, 12, 13, 14, 15, 17, 18, 19, 20, 21, 22, 23];

    let d1_d4 = (d & 0xf) as u8;
    let d5_d11 = ((d >> 4) & 0x7f) as u8;
    let d12_d18 = ((d >> 11) & 0x7f) as u8;

    let mut needed = 0u8;
    for (i, &col) in NON_POWERS_OF_TWO.iter().enumerate() {
        if (d >> i) & 1 == 1 {
            needed ^= col;
        }
    }

    let mut b0 = d1_d4 << 2;
    let mut b1 = d5_d11;
    let mut b2 = d12_d18;
    if needed & 1 != 0 {
        b0 |= 1;
    }
    if needed & 2 != 0 {
        b0 |= 2;
    }
    if needed & 4 != 0 {
        b0 |= 1 << 6;
    }
    if needed & 8 != 0 {
        b0 |= 1 << 7;
    }
    if needed & 16 != 0 {
        b1 |= 1 << 7;
    }
    if needed & 32 != 0 {
        b2 |= 1 << 7;
    }
    (b0, b1, b2)
}

/// Flips the top bit of `v` when needed so the byte carries odd parity
/// (ETS 300 706 §7.1); a no-op when `v` already does.
fn parity_encode(v: u8) -> u8 {
    if v.count_ones() % 2 == 0 {
        v | 0x80
    } else {
        v
    }
}

/// Packs `(y, m)` into the two Hamming(8,4) address bytes a teletext packet
/// carries, in the bit-reversed-on-the-wire, not-yet-reversed form.
fn address_bytes(y: u8, m: u8) -> [u8; 2] {
    let full = (y as u16 * 8 + m as u16) as u8;
    [encode_hamm84(full & 0x0f), encode_hamm84((full >> 4) & 0x0f)]
}

/// Assembles a 44-byte teletext data unit in wire (LSB-first) order from its
/// natural-order address and payload bytes.
fn data_unit(address: [u8; 2], data: [u8; 40]) -> [u8; 44] {
    let mut unit = [0u8; 44];
    unit[2] = address[0].reverse_bits();
    unit[3] = address[1].reverse_bits();
    for (i, &b) in data.iter().enumerate() {
        unit[4 + i] = b.reverse_bits();
    }
    unit
}

fn make_pes(pts_ms: u64, units: &[[u8; 44]]) -> Vec<u8> {
    let mut buf = vec![0x00, 0x00, 0x01, 0xbd, 0x00, 0x00, 0x80, 0x80, 0x05];
    let pts = pts_ms * 90;
    let b9 = 0x21 | (((pts >> 29) & 0x0e) as u8);
    let b10 = ((pts >> 22) & 0xff) as u8;
    let b11 = (((pts >> 14) & 0xfe) as u8) | 0x01;
    let b12 = ((pts >> 7) & 0xff) as u8;
    let b13 = (((pts << 1) & 0xfe) as u8) | 0x01;
    buf.extend_from_slice(&[b9, b10, b11, b12, b13]);
    buf.push(0x10); // EN 301 775 data_identifier
    for unit in units {
        buf.push(0x03); // Subtitle data-unit id
        buf.push(0x2c);
        buf.extend_from_slice(unit);
    }
    let payload_len = buf.len() - 6;
    buf[4] = (payload_len >> 8) as u8;
    buf[5] = (payload_len & 0xff) as u8;
    buf
}

fn ts_packet(pid: u16, cc: u8, payload: &[u8]) -> [u8; 188] {
    let mut pkt = [0xffu8; 188];
    pkt[0] = 0x47;
    pkt[1] = 0x40 | ((pid >> 8) as u8 & 0x1f); // pusi always set: one PES per packet
    pkt[2] = (pid & 0xff) as u8;
    pkt[3] = 0x10 | (cc & 0x0f);
    let n = payload.len().min(184);
    pkt[4..4 + n].copy_from_slice(&payload[..n]);
    pkt
}

fn stream(pid: u16, pes_blobs: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, pes) in pes_blobs.iter().enumerate() {
        out.extend_from_slice(&ts_packet(pid, i as u8, pes));
    }
    out
}

fn config() -> Config {
    Config {
        page: Some(0x199),
        pid: Some(100),
        offset_seconds: 0.0,
        bom: false,
        nonempty: false,
        colours: false,
        verbose: false,
    }
}

/// A page header: establishes (or re-establishes) page 0x199 on magazine 1
/// under the given G0 national subset, or finalizes the prior reception if
/// one is in progress.
fn header_unit(charset: u8) -> [u8; 44] {
    let mut data = [0u8; 40];
    data[0] = encode_hamm84(9); // page units digit
    data[1] = encode_hamm84(9); // page tens digit
    data[6] = encode_hamm84(0); // suppress_header = 0
    data[7] = encode_hamm84(1 | (charset << 1)); // serial_mode=1, charset bits
    data_unit(address_bytes(0, 1), data)
}

#[test]
fn hello_boxed_row_round_trip() {
    // The very first PTS processed calibrates the clock to t=0, so a
    // throwaway packet for an unconfigured page establishes the epoch
    // before the real subtitle page's header sets show_timestamp=10000.
    let calibration = make_pes(0, &[header_unit_for_page(0, 0)]);

    let mut body = [0u8; 40];
    body[4] = parity_encode(0x0b); // box start
    body[5] = parity_encode(b'H');
    body[6] = parity_encode(b'E');
    body[7] = parity_encode(b'L');
    body[8] = parity_encode(b'L');
    body[9] = parity_encode(b'O');
    let body_unit = data_unit(address_bytes(20, 1), body);

    let blobs = vec![
        calibration,
        make_pes(10_000, &[header_unit(0)]),
        make_pes(10_500, &[body_unit]),
        make_pes(12_000, &[header_unit(0)]),
    ];

    let mut output = Vec::new();
    let stop = Arc::new(AtomicBool::new(false));
    let cues = run(&stream(100, &blobs)[..], &mut output, &config(), &stop).unwrap();
    assert_eq!(cues, 1);

    let srt = String::from_utf8(output).unwrap();
    assert!(srt.starts_with("1\n00:00:10,000 --> 00:00:11,960\n"), "{srt:?}");
    assert!(srt.contains("HELLO"), "{srt:?}");
}

fn header_unit_for_page(page_i: u8, m: u8) -> [u8; 44] {
    let mut data = [0u8; 40];
    data[0] = encode_hamm84(page_i % 10);
    data[1] = encode_hamm84((page_i / 10) % 10);
    data[6] = encode_hamm84(0);
    data[7] = encode_hamm84(1);
    data_unit(address_bytes(0, m), data)
}

#[test]
fn german_national_subset_remaps_bracket_to_a_umlaut() {
    let mut body = [0u8; 40];
    body[0] = parity_encode(0x0b); // box start
    body[1] = parity_encode(0x5b); // '[' remapped under the German overlay
    let body_unit = data_unit(address_bytes(3, 1), body);

    // charset index 1 = German (ETS 300 706 Table 36).
    let blobs = vec![
        make_pes(1_000, &[header_unit(1)]),
        make_pes(1_500, &[body_unit]),
        make_pes(2_000, &[header_unit(1)]),
    ];

    let mut output = Vec::new();
    let stop = Arc::new(AtomicBool::new(false));
    let cues = run(&stream(100, &blobs)[..], &mut output, &config(), &stop).unwrap();
    assert_eq!(cues, 1);
    assert!(String::from_utf8(output).unwrap().contains('\u{c4}'));
}

#[test]
fn x26_overlay_composes_grave_accent() {
    let mut box_row = [0u8; 40];
    box_row[0] = parity_encode(0x0b); // box start on row 5
    let box_row_unit = data_unit(address_bytes(5, 1), box_row);

    // Triplet 1: row-address group, mode 0x04, address 45 -> row 5.
    let (b0, b1, b2) = encode_hamm24_18(45 | (0x04 << 6));
    // Triplet 2: mode 0x12 (grave accent), column 10, triplet_data 'e'.
    let (b3, b4, b5) = encode_hamm24_18(10 | (0x12 << 6) | ((b'e' as u32) << 11));
    let mut x26 = [0u8; 40];
    x26[1] = b0;
    x26[2] = b1;
    x26[3] = b2;
    x26[4] = b3;
    x26[5] = b4;
    x26[6] = b5;
    let x26_unit = data_unit(address_bytes(26, 1), x26);

    let blobs = vec![
        make_pes(1_000, &[header_unit(0)]),
        make_pes(1_500, &[box_row_unit]),
        make_pes(1_600, &[x26_unit]),
        make_pes(2_000, &[header_unit(0)]),
    ];

    let mut output = Vec::new();
    let stop = Arc::new(AtomicBool::new(false));
    let cues = run(&stream(100, &blobs)[..], &mut output, &config(), &stop).unwrap();
    assert_eq!(cues, 1);
    assert!(String::from_utf8(output).unwrap().contains('\u{e8}'));
}

#[test]
fn empty_stream_with_nonempty_flag_emits_placeholder() {
    let mut cfg = config();
    cfg.nonempty = true;
    let mut output = Vec::new();
    let stop = Arc::new(AtomicBool::new(false));
    let cues = run(&[][..], &mut output, &cfg, &stop).unwrap();
    assert_eq!(cues, 1);
    assert!(String::from_utf8(output).unwrap().contains("no closed captioning"));
}
