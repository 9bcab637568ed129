//! store/page — page header and CRC32C trailer.
//!
//! Every page carries a 32-byte header and a 16-byte trailer:
//! - header (LE): [magic4][ver u16][type u16][page_id u64][next_page_id u64][frag_len u32][reserved u32]
//! - trailer: [crc32c u32 LE][12 zero bytes], CRC computed over the whole
//!   page with the trailer zeroed. A zero stored CRC never verifies.

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{PAGE_HDR_SIZE, PAGE_MAGIC, PAGE_TRAILER_LEN, PAGE_VERSION};
use crate::errors::StoreError;

#[derive(Debug, Clone, Copy)]
pub struct PageHdr {
    pub ptype: u16,
    pub page_id: u64,
    pub next_page_id: u64,
    pub frag_len: u32,
}

pub fn page_write_header(page: &mut [u8], h: &PageHdr) {
    page[0..4].copy_from_slice(PAGE_MAGIC);
    LittleEndian::write_u16(&mut page[4..6], PAGE_VERSION);
    LittleEndian::write_u16(&mut page[6..8], h.ptype);
    LittleEndian::write_u64(&mut page[8..16], h.page_id);
    LittleEndian::write_u64(&mut page[16..24], h.next_page_id);
    LittleEndian::write_u32(&mut page[24..28], h.frag_len);
    LittleEndian::write_u32(&mut page[28..32], 0);
}

pub fn page_read_header(page: &[u8]) -> Result<PageHdr, StoreError> {
    if page.len() < PAGE_HDR_SIZE + PAGE_TRAILER_LEN {
        return Err(StoreError::Corrupt("page buffer too small".into()));
    }
    if &page[0..4] != PAGE_MAGIC {
        return Err(StoreError::Corrupt(format!(
            "bad page magic {:?}",
            &page[0..4]
        )));
    }
    let ver = LittleEndian::read_u16(&page[4..6]);
    if ver != PAGE_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported page version {ver}"
        )));
    }
    Ok(PageHdr {
        ptype: LittleEndian::read_u16(&page[6..8]),
        page_id: LittleEndian::read_u64(&page[8..16]),
        next_page_id: LittleEndian::read_u64(&page[16..24]),
        frag_len: LittleEndian::read_u32(&page[24..28]),
    })
}

/// Recompute the CRC32C trailer in place.
pub fn page_update_checksum(page: &mut [u8]) {
    let ps = page.len();
    for b in &mut page[ps - PAGE_TRAILER_LEN..ps] {
        *b = 0;
    }
    let digest = crc32c::crc32c(page);
    LittleEndian::write_u32(&mut page[ps - PAGE_TRAILER_LEN..ps - PAGE_TRAILER_LEN + 4], digest);
}

/// Verify the CRC32C trailer. A stored CRC of zero is treated as invalid.
pub fn page_verify_checksum(page: &[u8]) -> bool {
    let ps = page.len();
    if ps < PAGE_TRAILER_LEN {
        return false;
    }
    let stored = LittleEndian::read_u32(&page[ps - PAGE_TRAILER_LEN..ps - PAGE_TRAILER_LEN + 4]);
    if stored == 0 {
        return false;
    }
    let mut copy = page.to_vec();
    for b in &mut copy[ps - PAGE_TRAILER_LEN..ps] {
        *b = 0;
    }
    stored == crc32c::crc32c(&copy)
}
