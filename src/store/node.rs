//! store/node — bucket node serialization.
//!
//! A node is one bucket's direct content: a strictly ascending list of
//! entries, each either an inline value or a reference to a child bucket's
//! node. Payload layout (LE):
//! [count u32] then per entry [tag u8][klen u32][vlen u32][key][payload]
//! where payload is the raw value bytes (tag=1) or a u64 child page id
//! (tag=2, vlen=8).

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{TAG_BUCKET, TAG_VALUE};
use crate::errors::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Inline scalar value.
    Value(Vec<u8>),
    /// Child bucket, by node page id.
    Bucket(u64),
}

impl Entry {
    pub fn is_bucket(&self) -> bool {
        matches!(self, Entry::Bucket(_))
    }
}

/// Decoded bucket node. Entries are kept sorted by raw key bytes, which is
/// also the iteration order every read path exposes.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub entries: Vec<(Vec<u8>, Entry)>,
}

impl Node {
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        self.entries
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 * self.entries.len() + 4);
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for (key, entry) in &self.entries {
            match entry {
                Entry::Value(v) => {
                    out.push(TAG_VALUE);
                    out.extend_from_slice(&(key.len() as u32).to_le_bytes());
                    out.extend_from_slice(&(v.len() as u32).to_le_bytes());
                    out.extend_from_slice(key);
                    out.extend_from_slice(v);
                }
                Entry::Bucket(pid) => {
                    out.push(TAG_BUCKET);
                    out.extend_from_slice(&(key.len() as u32).to_le_bytes());
                    out.extend_from_slice(&8u32.to_le_bytes());
                    out.extend_from_slice(key);
                    out.extend_from_slice(&pid.to_le_bytes());
                }
            }
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Node, StoreError> {
        let mut cur = Cursor { buf, off: 0 };
        let count = cur.read_u32()? as usize;
        let mut entries = Vec::with_capacity(count);
        let mut prev: Option<Vec<u8>> = None;
        for _ in 0..count {
            let tag = cur.read_u8()?;
            let klen = cur.read_u32()? as usize;
            let vlen = cur.read_u32()? as usize;
            let key = cur.read_bytes(klen)?.to_vec();
            if let Some(p) = &prev {
                if p.as_slice() >= key.as_slice() {
                    return Err(StoreError::Corrupt(
                        "node entries out of order".into(),
                    ));
                }
            }
            let entry = match tag {
                TAG_VALUE => Entry::Value(cur.read_bytes(vlen)?.to_vec()),
                TAG_BUCKET => {
                    if vlen != 8 {
                        return Err(StoreError::Corrupt(format!(
                            "bucket entry payload length {vlen} (expected 8)"
                        )));
                    }
                    Entry::Bucket(LittleEndian::read_u64(cur.read_bytes(8)?))
                }
                other => {
                    return Err(StoreError::Corrupt(format!(
                        "unknown node entry tag {other}"
                    )))
                }
            };
            prev = Some(key.clone());
            entries.push((key, entry));
        }
        if cur.off != buf.len() {
            return Err(StoreError::Corrupt(format!(
                "{} trailing bytes after node payload",
                buf.len() - cur.off
            )));
        }
        Ok(Node { entries })
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], StoreError> {
        let end = self
            .off
            .checked_add(n)
            .filter(|&e| e <= self.buf.len())
            .ok_or_else(|| StoreError::Corrupt("truncated node payload".into()))?;
        let s = &self.buf[self.off..end];
        self.off = end;
        Ok(s)
    }

    fn read_u8(&mut self) -> Result<u8, StoreError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, StoreError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }
}
