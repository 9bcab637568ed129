//! store/meta — dual meta pages.
//!
//! Pages 0 and 1 each hold a meta payload plus the standard CRC trailer.
//! A commit writes slot (txid % 2), so the previous meta stays intact until
//! the new one is fully on disk. Open reads both slots and picks the valid
//! one with the highest txid; a torn copy of a mid-commit store therefore
//! still opens on the previous root.

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{META_MAGIC, META_PAYLOAD_SIZE, META_VERSION, PAGE_SIZE, PAGE_TRAILER_LEN};
use crate::errors::StoreError;
use crate::store::page::{page_update_checksum, page_verify_checksum};

#[derive(Debug, Clone, Copy)]
pub struct Meta {
    pub version: u32,
    pub page_size: u32,
    pub root_pid: u64,
    pub page_count: u64,
    pub txid: u64,
}

impl Meta {
    /// Meta slot (page id) this state would be committed into.
    pub fn slot(&self) -> u64 {
        self.txid % 2
    }
}

/// Serialize `m` into a full page buffer (payload + CRC trailer).
pub fn meta_encode(page: &mut [u8], m: &Meta) {
    debug_assert!(page.len() >= META_PAYLOAD_SIZE + PAGE_TRAILER_LEN);
    for b in page.iter_mut() {
        *b = 0;
    }
    page[0..8].copy_from_slice(META_MAGIC);
    LittleEndian::write_u32(&mut page[8..12], m.version);
    LittleEndian::write_u32(&mut page[12..16], m.page_size);
    LittleEndian::write_u64(&mut page[16..24], m.root_pid);
    LittleEndian::write_u64(&mut page[24..32], m.page_count);
    LittleEndian::write_u64(&mut page[32..40], m.txid);
    page_update_checksum(page);
}

/// Decode one meta slot. Corrupt/foreign/unsupported pages are errors.
pub fn meta_decode(page: &[u8]) -> Result<Meta, StoreError> {
    if page.len() < META_PAYLOAD_SIZE + PAGE_TRAILER_LEN {
        return Err(StoreError::Corrupt("meta page too small".into()));
    }
    if &page[0..8] != META_MAGIC {
        return Err(StoreError::Corrupt(format!(
            "bad meta magic {:?}",
            &page[0..8]
        )));
    }
    if !page_verify_checksum(page) {
        return Err(StoreError::Corrupt("meta page checksum mismatch".into()));
    }
    let version = LittleEndian::read_u32(&page[8..12]);
    if version != META_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported store version {version} (expected {META_VERSION})"
        )));
    }
    let page_size = LittleEndian::read_u32(&page[12..16]);
    if page_size as usize != PAGE_SIZE {
        return Err(StoreError::Corrupt(format!(
            "unsupported page size {page_size} (expected {PAGE_SIZE})"
        )));
    }
    Ok(Meta {
        version,
        page_size,
        root_pid: LittleEndian::read_u64(&page[16..24]),
        page_count: LittleEndian::read_u64(&page[24..32]),
        txid: LittleEndian::read_u64(&page[32..40]),
    })
}

/// Pick the live meta out of the two slots: valid and highest txid wins.
pub fn meta_select(slot0: &[u8], slot1: &[u8]) -> Result<Meta, StoreError> {
    let m0 = meta_decode(slot0);
    let m1 = meta_decode(slot1);
    match (m0, m1) {
        (Ok(a), Ok(b)) => Ok(if a.txid >= b.txid { a } else { b }),
        (Ok(a), Err(_)) => Ok(a),
        (Err(_), Ok(b)) => Ok(b),
        (Err(e), Err(_)) => Err(match e {
            StoreError::Corrupt(msg) => {
                StoreError::Corrupt(format!("no valid meta page: {msg}"))
            }
            other => other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(txid: u64) -> Meta {
        Meta {
            version: META_VERSION,
            page_size: PAGE_SIZE as u32,
            root_pid: 2,
            page_count: 3,
            txid,
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let mut page = vec![0u8; PAGE_SIZE];
        meta_encode(&mut page, &sample(9));
        let m = meta_decode(&page).unwrap();
        assert_eq!(m.root_pid, 2);
        assert_eq!(m.page_count, 3);
        assert_eq!(m.txid, 9);
        assert_eq!(m.slot(), 1);
    }

    #[test]
    fn select_prefers_highest_valid_txid() {
        let mut a = vec![0u8; PAGE_SIZE];
        let mut b = vec![0u8; PAGE_SIZE];
        meta_encode(&mut a, &sample(4));
        meta_encode(&mut b, &sample(5));
        assert_eq!(meta_select(&a, &b).unwrap().txid, 5);

        // corrupt the newer slot -> falls back to the older one
        b[10] ^= 0xFF;
        assert_eq!(meta_select(&a, &b).unwrap().txid, 4);

        // both bad -> error
        a[10] ^= 0xFF;
        assert!(meta_select(&a, &b).is_err());
    }
}
