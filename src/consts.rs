//! On-disk format constants (meta pages, node pages).

// -------- Meta --------
pub const META_MAGIC: &[u8; 8] = b"MVSTORE1";
pub const META_VERSION: u32 = 1;
// Meta payload (LE):
// [magic8][version u32][page_size u32][root_pid u64][page_count u64][txid u64]
pub const META_PAYLOAD_SIZE: usize = 8 + 4 + 4 + 8 + 8 + 8;
// Two meta slots (pages 0 and 1); the writer alternates by txid parity.
pub const META_SLOTS: u64 = 2;

// -------- Pages --------
pub const PAGE_SIZE: usize = 4096;
pub const PAGE_MAGIC: &[u8; 4] = b"MVPG";
pub const PAGE_VERSION: u16 = 1;
pub const PAGE_TYPE_NODE: u16 = 1;
// Page header (LE):
// [magic4][ver u16][type u16][page_id u64][next_page_id u64][frag_len u32][reserved u32]
pub const PAGE_HDR_SIZE: usize = 32;
// Trailer: [crc32c u32 LE][12 zero bytes], CRC over the page with a zeroed trailer.
pub const PAGE_TRAILER_LEN: usize = 16;

pub const NO_PAGE: u64 = u64::MAX;

// -------- Node payload --------
// [count u32] then `count` entries, keys strictly ascending:
// [tag u8][klen u32][vlen u32][key][value bytes | child page_id u64]
pub const TAG_VALUE: u8 = 1;
pub const TAG_BUCKET: u8 = 2;

/// Payload bytes available in a single node page.
pub const fn page_payload_capacity(page_size: usize) -> usize {
    page_size - PAGE_HDR_SIZE - PAGE_TRAILER_LEN
}
