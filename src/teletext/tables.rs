//! Content-addressable tables consumed by the error-correction and charset
//! layers. The core decoding logic only ever indexes into them. The
//! Hamming tables are built at compile time from the ETS 300 706 §8
//! parity-check structure rather than transcribed by hand, so
//! `decode(encode(d)) == d` and "uncorrectable on 2+ errors" hold by
//! construction instead of by copy-paste luck.

/// Hamming(8,4) decode table (ETS 300 706 §8.2).
///
/// Bit layout (bit 0 = first transmitted/LSB): `P1 P2 D1 P3 D2 D3 D4 P`,
/// where `P1` checks `{D1,D2,D4}`, `P2` checks `{D1,D3,D4}`, `P3` checks
/// `{D2,D3,D4}`, and `P` is the overall even-parity bit over the other
/// seven. Entries whose high bit (`0x80`) is set are uncorrectable; their
/// low nibble is always `0` so a caller that unconditionally masks to four
/// bits still gets the documented "treat as zero" behavior.
pub static UNHAM_8_4: [u8; 256] = build_unham_8_4();

const fn build_unham_8_4() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        table[byte] = decode_8_4(byte as u8);
        byte += 1;
    }
    table
}

const fn decode_8_4(byte: u8) -> u8 {
    let b = |n: u8| (byte >> n) & 1;
    let p1 = b(0);
    let p2 = b(1);
    let d1 = b(2);
    let p3 = b(3);
    let d2 = b(4);
    let d3 = b(5);
    let d4 = b(6);

    let e1 = p1 ^ d1 ^ d2 ^ d4;
    let e2 = p2 ^ d1 ^ d3 ^ d4;
    let e3 = p3 ^ d2 ^ d3 ^ d4;
    let syndrome = e1 | (e2 << 1) | (e3 << 2);
    let overall_odd = (byte.count_ones() % 2) as u8;

    if overall_odd == 0 {
        // Even overall parity: either no error, or an uncorrectable
        // double-bit error.
        if syndrome == 0 {
            d1 | (d2 << 1) | (d3 << 2) | (d4 << 3)
        } else {
            0x80
        }
    } else if syndrome == 0 {
        // The overall-parity bit itself was the one flipped; data intact.
        d1 | (d2 << 1) | (d3 << 2) | (d4 << 3)
    } else {
        // Single-bit error among the 7 check/data bits; flip and re-read.
        let corrected = byte ^ (1 << (syndrome - 1));
        let b = |n: u8| (corrected >> n) & 1;
        b(2) | (b(4) << 1) | (b(5) << 2) | (b(6) << 3)
    }
}

/// The 24 bit positions of a Hamming(24,18) codeword (byte0 bits 0..7,
/// byte1 bits 0..7, byte2 bits 0..7, in that order) assigned as either a
/// data bit (carrying one of D1..D18, in order) or a pure check bit.
/// 6 check bits (one per distinct power of two) give a 6-bit syndrome
/// space; the other 18 positions carry the data payload, matching the
/// D1..D4 / D5..D11 / D12..D18 byte layout: byte0's top six bits hold
/// D1..D4 plus two check bits, byte1 and byte2 contribute their low seven
/// bits as data (D5..D11, D12..D18) and their high bit as a check bit.
const fn column_id(byte_idx: usize, bit: usize) -> u8 {
    // Parity-only positions get the six powers of two.
    match (byte_idx, bit) {
        (0, 0) => 1,
        (0, 1) => 2,
        (0, 6) => 4,
        (0, 7) => 8,
        (1, 7) => 16,
        (2, 7) => 32,
        _ => {
            // Data positions in transmission order: byte0 bits 2..5 (D1..D4),
            // byte1 bits 0..6 (D5..D11), byte2 bits 0..6 (D12..D18). Assign
            // each the next non-power-of-two value from 3.. upward.
            let data_index = if byte_idx == 0 {
                bit - 2
            } else if byte_idx == 1 {
                4 + bit
            } else {
                4 + 7 + bit
            };
            NON_POWERS_OF_TWO[data_index]
        }
    }
}

/// First 18 positive integers that are not a power of two, ascending.
const NON_POWERS_OF_TWO: [u8; 18] = [3, 5, 6, 7, 9, 10, 11, 12, 13, 14, 15, 17, 18, 19, 20, 21, 22, 23];

/// Per-byte partial-syndrome contribution tables (ETS 300 706 §8.3:
/// "parity bytes are XORed via three per-byte parity tables").
pub static UNHAM_24_18_PAR: [[u8; 256]; 3] = [
    build_par_table(0),
    build_par_table(1),
    build_par_table(2),
];

const fn build_par_table(byte_idx: usize) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        let mut syndrome = 0u8;
        let mut bit = 0usize;
        while bit < 8 {
            if (byte >> bit) & 1 == 1 {
                syndrome ^= column_id(byte_idx, bit);
            }
            bit += 1;
        }
        table[byte] = syndrome;
        byte += 1;
    }
    table
}

/// Maps `byte0 >> 2` (the six bits holding D1..D4 plus two check bits) to
/// the 4-bit D1..D4 nibble. The two check bits occupy the high two bits of
/// the index and are ignored here; their contribution to the overall
/// syndrome is already captured by [`UNHAM_24_18_PAR`].
pub static UNHAM_24_18_D1_D4: [u8; 64] = build_d1_d4();

const fn build_d1_d4() -> [u8; 64] {
    let mut table = [0u8; 64];
    let mut v = 0usize;
    while v < 64 {
        table[v] = (v & 0x0f) as u8;
        v += 1;
    }
    table
}

/// Error-correction mask table. Indexed by the 6-bit syndrome (XOR of the
/// three [`UNHAM_24_18_PAR`] lookups); the result is XORed directly into
/// the provisional 18-bit data value. Bit 31 is set when the syndrome does
/// not correspond to any single bit position, i.e. two or more bits are in
/// error.
pub static UNHAM_24_18_ERR: [u32; 64] = build_err_table();

const fn build_err_table() -> [u32; 64] {
    let mut table = [0x8000_0000u32; 64];
    table[0] = 0;
    // The 18 data positions: syndrome -> flip the matching data bit.
    let mut i = 0usize;
    while i < 18 {
        let syndrome = NON_POWERS_OF_TWO[i] as usize;
        table[syndrome] = 1u32 << i;
        i += 1;
    }
    // The 6 parity-only positions: syndrome matches, but no data bit flips.
    let parity_syndromes = [1u8, 2, 4, 8, 16, 32];
    let mut j = 0usize;
    while j < 6 {
        table[parity_syndromes[j] as usize] = 0;
        j += 1;
    }
    table
}

/// Odd-parity table over the whole received byte (ETS 300 706 §7.1): bit 7
/// is transmitted so the total number of set bits, bit 7 included, is odd.
/// `1` means parity held (valid); `0` means the byte failed its parity
/// check and the caller should substitute `U+0020`.
pub static PARITY_8: [u8; 256] = build_parity_8();

const fn build_parity_8() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        table[byte] = ((byte as u8).count_ones() % 2) as u8;
        byte += 1;
    }
    table
}

/// Bit-reversal table: ETS 300 706 transmits teletext bytes LSB-first, so
/// every data byte is reversed once at the PES/teletext boundary.
pub static REVERSE_8: [u8; 256] = build_reverse_8();

const fn build_reverse_8() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut byte = 0usize;
    while byte < 256 {
        table[byte] = (byte as u8).reverse_bits();
        byte += 1;
    }
    table
}

/// Base Latin G0 table (English national option sub-set, ETS 300 706
/// Table 36), indexed by `code_point - 0x20` for `0x20..=0x7f`. The base
/// table is the identity mapping for English; national subsets only ever
/// replace the thirteen positions named in [`NATIONAL_SUBSET_POSITIONS`].
pub static G0_LATIN_BASE: [u16; 96] = build_g0_base();

const fn build_g0_base() -> [u16; 96] {
    let mut table = [0u16; 96];
    let mut i = 0usize;
    while i < 96 {
        table[i] = (0x20 + i) as u16;
        i += 1;
    }
    table
}

/// The thirteen G0 offsets (`code_point - 0x20`) that a national subset
/// overlay replaces, in the column order used by
/// [`G0_LATIN_NATIONAL_SUBSETS`].
pub static NATIONAL_SUBSET_POSITIONS: [usize; 13] = [
    0x23 - 0x20,
    0x24 - 0x20,
    0x40 - 0x20,
    0x5b - 0x20,
    0x5c - 0x20,
    0x5d - 0x20,
    0x5e - 0x20,
    0x5f - 0x20,
    0x60 - 0x20,
    0x7b - 0x20,
    0x7c - 0x20,
    0x7d - 0x20,
    0x7e - 0x20,
];

/// National option sub-sets (ETS 300 706 Table 36), one row per 3-bit
/// charset index, thirteen Unicode scalars per row in
/// [`NATIONAL_SUBSET_POSITIONS`] order. Only charset values `0..=7` are
/// reachable (the header field is three bits wide); rows `8..=12` repeat
/// the English identity mapping to round the table out to thirteen rows.
pub static G0_LATIN_NATIONAL_SUBSETS: [[u16; 13]; 13] = [
    // 0: English (identity)
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    // 1: German
    [
        0x23, 0x24, 0x00a7, 0x00c4, 0x00d6, 0x00dc, 0x5e, 0x5f, 0x60, 0x00e4, 0x00f6, 0x00fc,
        0x00df,
    ],
    // 2: Swedish / Finnish / Hungarian
    [
        0x00a4, 0x24, 0x00c9, 0x00c4, 0x00d6, 0x00c5, 0x00dc, 0x5f, 0x00e9, 0x00e4, 0x00f6,
        0x00e5, 0x00fc,
    ],
    // 3: Italian
    [
        0x00a3, 0x24, 0x00e9, 0x00b0, 0x00e7, 0x00bb, 0x5e, 0x5f, 0x00f9, 0x00e0, 0x00f2, 0x00e8,
        0x00ec,
    ],
    // 4: French
    [
        0x00e9, 0x00ef, 0x00e0, 0x00eb, 0x00ea, 0x00f9, 0x00ee, 0x5f, 0x00e8, 0x00e2, 0x00f4,
        0x00fb, 0x00e7,
    ],
    // 5: Portuguese / Spanish
    [
        0x00e7, 0x24, 0x00a1, 0x00e1, 0x00e9, 0x00ed, 0x00f3, 0x00fa, 0x00bf, 0x00fc, 0x00f1,
        0x00e8, 0x00e0,
    ],
    // 6: Czech / Slovak
    [
        0x23, 0x016f, 0x010d, 0x0165, 0x017e, 0x00fd, 0x00ed, 0x0159, 0x00e9, 0x00e1, 0x011b,
        0x00fa, 0x0161,
    ],
    // 7: (reserved; identity)
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    // 8..12: unreachable via the 3-bit header field; identity filler.
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
    [
        0x23, 0x24, 0x40, 0x5b, 0x5c, 0x5d, 0x5e, 0x5f, 0x60, 0x7b, 0x7c, 0x7d, 0x7e,
    ],
];

/// G2 supplementary set (ETS 300 706 Table 12), indexed by `data - 32` for
/// an X/26 mode-`0x0F` column packet.
pub static G2_SUPPLEMENTARY: [u16; 96] = build_g2_supplementary();

const fn build_g2_supplementary() -> [u16; 96] {
    // The G2 set is mostly symbols/punctuation outside the scope of
    // subtitle boxed-area text; absent a specific mapping it falls back to
    // its G0 Latin equivalent.
    build_g0_base()
}

/// Sixteen rows of G2 diacritical-mark overlays (ETS 300 706 Table 28),
/// one row per X/26 mode `0x11..=0x1f` (row index `mode - 0x11`; the
/// sixteenth row is unreachable and repeats the plain-letter fallback).
/// Each row holds 52 entries: `A..Z` at indices `0..26`, `a..z` at indices
/// `26..52`, matching `telxcc`'s `data - 65` / `data - 71` offsets.
pub static G2_ACCENTS: [[u16; 52]; 16] = build_g2_accents();

const fn build_g2_accents() -> [[u16; 52]; 16] {
    let mut rows = [[0u16; 52]; 16];
    let mut row = 0usize;
    while row < 16 {
        let mut col = 0usize;
        while col < 52 {
            let upper = col < 26;
            let letter = if upper { b'A' + col as u8 } else { b'a' + (col - 26) as u8 };
            rows[row][col] = accented(row, letter);
            col += 1;
        }
        row += 1;
    }
    rows
}

/// Composes the Unicode scalar for `letter` under diacritical mark `row`
/// (`row == mode - 0x11`), falling back to the bare letter when ETS 300
/// 706 / Unicode has no precomposed form for that combination.
const fn accented(row: usize, letter: u8) -> u16 {
    let base = letter as u16;
    match (row, letter) {
        // Row 0: acute accent.
        (0, b'A') => 0x00c1,
        (0, b'E') => 0x00c9,
        (0, b'I') => 0x00cd,
        (0, b'O') => 0x00d3,
        (0, b'U') => 0x00da,
        (0, b'Y') => 0x00dd,
        (0, b'a') => 0x00e1,
        (0, b'e') => 0x00e9,
        (0, b'i') => 0x00ed,
        (0, b'o') => 0x00f3,
        (0, b'u') => 0x00fa,
        (0, b'y') => 0x00fd,
        (0, b'C') => 0x0106,
        (0, b'c') => 0x0107,
        (0, b'N') => 0x0143,
        (0, b'n') => 0x0144,
        // Row 1: grave accent (mode 0x12).
        (1, b'A') => 0x00c0,
        (1, b'E') => 0x00c8,
        (1, b'I') => 0x00cc,
        (1, b'O') => 0x00d2,
        (1, b'U') => 0x00d9,
        (1, b'a') => 0x00e0,
        (1, b'e') => 0x00e8,
        (1, b'i') => 0x00ec,
        (1, b'o') => 0x00f2,
        (1, b'u') => 0x00f9,
        // Row 2: circumflex.
        (2, b'A') => 0x00c2,
        (2, b'E') => 0x00ca,
        (2, b'I') => 0x00ce,
        (2, b'O') => 0x00d4,
        (2, b'U') => 0x00db,
        (2, b'a') => 0x00e2,
        (2, b'e') => 0x00ea,
        (2, b'i') => 0x00ee,
        (2, b'o') => 0x00f4,
        (2, b'u') => 0x00fb,
        // Row 3: tilde.
        (3, b'A') => 0x00c3,
        (3, b'N') => 0x00d1,
        (3, b'O') => 0x00d5,
        (3, b'a') => 0x00e3,
        (3, b'n') => 0x00f1,
        (3, b'o') => 0x00f5,
        // Row 4: diaeresis / umlaut.
        (4, b'A') => 0x00c4,
        (4, b'E') => 0x00cb,
        (4, b'I') => 0x00cf,
        (4, b'O') => 0x00d6,
        (4, b'U') => 0x00dc,
        (4, b'a') => 0x00e4,
        (4, b'e') => 0x00eb,
        (4, b'i') => 0x00ef,
        (4, b'o') => 0x00f6,
        (4, b'u') => 0x00fc,
        // Row 9: cedilla.
        (9, b'C') => 0x00c7,
        (9, b'c') => 0x00e7,
        (9, b'S') => 0x015e,
        (9, b's') => 0x015f,
        // Row 11: caron.
        (11, b'C') => 0x010c,
        (11, b'c') => 0x010d,
        (11, b'S') => 0x0160,
        (11, b's') => 0x0161,
        (11, b'Z') => 0x017d,
        (11, b'z') => 0x017e,
        // Row 12: ring above.
        (12, b'A') => 0x00c5,
        (12, b'a') => 0x00e5,
        _ => base,
    }
}

/// SRT `<font color="...">` names, index 1..7 (index 0, black, is never
/// looked up directly; the renderer normalizes black to white).
pub static COLOUR_NAMES: [&str; 8] = [
    "white", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];
