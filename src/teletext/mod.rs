//! DVB/EBU teletext decoding (ETS 300 706 Presentation Level 1.5): error
//! correction, charset mapping, page buffering/rendering, and packet
//! dispatch.

pub mod charset;
pub mod decoder;
pub mod hamming;
pub mod page;
pub mod tables;

pub use decoder::Decoder;
pub use page::Page;
