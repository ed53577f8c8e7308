//! Teletext packet decoder: the (magazine, row) dispatch state machine,
//! X/26 overlay handling, and Broadcast Service Data.
//!
//! Variable names follow ETS 300 706 chapter 7.1.2, matching the original
//! decoder this crate's behavior is grounded on.

use log::info;

use crate::pes::{DataUnitId, TeletextPacket};

use super::charset::Charset;
use super::hamming::{unham_24_18, unham_8_4};
use super::page::Page;

/// BCD-to-page-number encoding of a magazine/subpage pair, matching the
/// `(magazine << 8) | subpage_low` shape used throughout this decoder and
/// the CLI's `-p` page argument.
pub type PageNumber = u16;

fn magazine_of(page: PageNumber) -> u8 {
    ((page >> 8) & 0xf) as u8
}

#[derive(Debug, Default)]
struct X26Position {
    row: usize,
    col: usize,
}

/// The (magazine, row) dispatch state machine: tracks the page currently
/// being received, the active charset overlay, and the per-magazine
/// subtitle-page map reported in the end-of-run summary.
pub struct Decoder {
    page: Page,
    charset: Charset,
    configured_page: Option<PageNumber>,
    auto_latched: bool,
    receiving: bool,
    serial_mode: bool,
    cc_map: [u8; 256],
    bsd_processed: bool,
    x28_notice_given: bool,
    m29_notice_given: bool,
}

impl Decoder {
    /// `configured_page` is `Some` if the user pinned a page with `-p`.
    pub fn new(configured_page: Option<PageNumber>) -> Self {
        Self {
            page: Page::new(),
            charset: Charset::new(),
            configured_page,
            auto_latched: false,
            receiving: false,
            serial_mode: true,
            cc_map: [0u8; 256],
            bsd_processed: false,
            x28_notice_given: false,
            m29_notice_given: false,
        }
    }

    /// The per-page subtitle-flag bitmap observed across all received
    /// page headers, keyed by page low-byte with one bit per magazine.
    pub fn cc_map(&self) -> &[u8; 256] {
        &self.cc_map
    }

    /// Processes one decoded teletext packet, returning a finalized page
    /// ready for rendering when a new matching header terminates the prior
    /// transmission.
    pub fn process_packet(&mut self, pkt: &TeletextPacket, timestamp: i64) -> Option<Page> {
        let address = ((unham_8_4(pkt.address[1]) as u16) << 4) | unham_8_4(pkt.address[0]) as u16;
        let address = address as u8;
        let m = if address & 0x7 == 0 { 8 } else { address & 0x7 };
        let y = (address >> 3) & 0x1f;

        if y == 0 {
            self.observe_subtitle_map(m, &pkt.data);
        }

        if y == 0 && pkt.data_unit_id == DataUnitId::Subtitle {
            return self.process_header(m, pkt, timestamp);
        } else if (1..=23).contains(&y) && m == magazine_of(self.configured_page.unwrap_or(0)) {
            self.process_body_row(y as usize, pkt);
        } else if y == 26 && m == magazine_of(self.configured_page.unwrap_or(0)) {
            self.process_x26(pkt);
        } else if y == 28 {
            if !self.x28_notice_given {
                info!("packet X/28 received; not implemented (no secondary-language support)");
                self.x28_notice_given = true;
            }
        } else if y == 29 {
            if !self.m29_notice_given {
                info!("packet M/29 received; not implemented (no secondary-language support)");
                self.m29_notice_given = true;
            }
        } else if y == 30 && m == 8 {
            self.process_bsd(pkt);
        }

        None
    }

    fn observe_subtitle_map(&mut self, m: u8, data: &[u8; 40]) {
        let i = ((unham_8_4(data[1]) as u16) << 4) | unham_8_4(data[0]) as u16;
        let i = i as u8;
        let flag_subtitle = (unham_8_4(data[5]) & 0x08) >> 3;
        self.cc_map[i as usize] |= flag_subtitle << (m - 1);

        if self.configured_page.is_none() && flag_subtitle > 0 && i < 0xff {
            let page = ((m as u16) << 8) | i as u16;
            info!("no teletext page specified; auto-latched onto page {page:03x} (first suitable page seen)");
            self.configured_page = Some(page);
            self.auto_latched = true;
        }
    }

    fn process_header(&mut self, m: u8, pkt: &TeletextPacket, timestamp: i64) -> Option<Page> {
        let data = &pkt.data;
        let page_number = ((m as u16) << 8) | ((unham_8_4(data[1]) as u16) << 4) | unham_8_4(data[0]) as u16;
        let d7 = unham_8_4(data[7]);
        let charset = ((d7 & 0x08) | (d7 & 0x04) | (d7 & 0x02)) >> 1;
        let flag_suppress_header = unham_8_4(data[6]) & 0x01;
        self.serial_mode = (unham_8_4(data[7]) & 0x01) != 0;

        if self.configured_page != Some(page_number) {
            self.receiving = false;
            return None;
        }

        let mut finalized = None;
        if self.page.tainted {
            self.page.hide_timestamp = timestamp - 40;
            finalized = Some(std::mem::replace(&mut self.page, Page::new()));
        }

        self.page.show_timestamp = timestamp;
        self.page.hide_timestamp = 0;
        self.page.clear();
        self.receiving = true;

        if charset != self.charset.current() {
            self.charset.select_charset(charset);
            info!("G0 charset remapped to national subset {charset:#x}");
        }

        if flag_suppress_header == 0 {
            for i in 14..40 {
                let scalar = self.charset.telx_to_ucs(data[i]);
                self.page.set(0, i, scalar);
            }
        }

        finalized
    }

    fn process_body_row(&mut self, y: usize, pkt: &TeletextPacket) {
        if self.serial_mode && pkt.data_unit_id != DataUnitId::Subtitle {
            return;
        }
        if !self.receiving {
            return;
        }
        for (col, &byte) in pkt.data.iter().enumerate() {
            if self.page.get(y, col) == 0 {
                let scalar = self.charset.telx_to_ucs(byte);
                self.page.set(y, col, scalar);
            }
        }
        self.page.tainted = true;
    }

    fn process_x26(&mut self, pkt: &TeletextPacket) {
        if self.serial_mode && pkt.data_unit_id != DataUnitId::Subtitle {
            return;
        }
        if !self.receiving {
            return;
        }

        let mut pos = X26Position::default();
        let data = &pkt.data;
        let mut i = 1usize;
        while i + 2 < data.len() {
            let word = (data[i + 2] as u32) << 16 | (data[i + 1] as u32) << 8 | data[i] as u32;
            let mut decoded = unham_24_18(word);
            if decoded & 0x8000_0000 != 0 {
                decoded = 0;
            }

            let triplet_data = ((decoded & 0x3_f800) >> 11) as u8;
            let mode = ((decoded & 0x7c0) >> 6) as u8;
            let address = (decoded & 0x3f) as u8;
            let row_address_group = (40..=63).contains(&address);

            if mode == 0x04 && row_address_group {
                pos.row = if address == 40 { 24 } else { (address - 40) as usize };
                pos.col = 0;
            }
            if (0x11..=0x1f).contains(&mode) && row_address_group {
                break;
            }
            if mode == 0x0f && !row_address_group {
                pos.col = address as usize;
                if triplet_data > 31 {
                    let scalar = super::tables::G2_SUPPLEMENTARY[(triplet_data - 32) as usize];
                    self.page.set(pos.row, pos.col, scalar);
                }
            }
            if (0x11..=0x1f).contains(&mode) && !row_address_group {
                pos.col = address as usize;
                let scalar = if (65..=90).contains(&triplet_data) {
                    super::tables::G2_ACCENTS[(mode - 0x11) as usize][(triplet_data - 65) as usize]
                } else if (97..=122).contains(&triplet_data) {
                    super::tables::G2_ACCENTS[(mode - 0x11) as usize][(triplet_data - 71) as usize]
                } else {
                    self.charset.telx_to_ucs(triplet_data)
                };
                self.page.set(pos.row, pos.col, scalar);
            }

            i += 3;
        }
    }

    fn process_bsd(&mut self, pkt: &TeletextPacket) {
        if self.bsd_processed {
            return;
        }
        let data = &pkt.data;
        if unham_8_4(data[0]) >= 2 {
            return;
        }

        let mut title = String::new();
        for &byte in &data[20..40] {
            let scalar = self.charset.telx_to_ucs(byte);
            if let Some(c) = char::from_u32(scalar as u32) {
                title.push(c);
            }
        }

        let mut t: i64 = 0;
        t += ((data[10] & 0x0f) as i64) * 10000;
        t += (((data[11] & 0xf0) >> 4) as i64) * 1000;
        t += ((data[11] & 0x0f) as i64) * 100;
        t += (((data[12] & 0xf0) >> 4) as i64) * 10;
        t += (data[12] & 0x0f) as i64;
        t -= 11111;
        t = (t - 40587) * 86400;
        t += 3600 * ((((data[13] & 0xf0) >> 4) as i64) * 10 + (data[13] & 0x0f) as i64);
        t += 60 * ((((data[14] & 0xf0) >> 4) as i64) * 10 + (data[14] & 0x0f) as i64);
        t += (((data[15] & 0xf0) >> 4) as i64) * 10 + (data[15] & 0x0f) as i64;
        t -= 40271;

        info!("programme identification = {title}");
        info!("universal time coordinated (unix epoch) = {t}");
        self.bsd_processed = true;
    }
}
