//! Content hashing of compiled kernels.
//!
//! Plans are written into a tagged canonical byte stream and hashed with
//! BLAKE3. Two compilations of the same inputs produce the same hash.

use std::fmt;

mod serialize;
#[cfg(test)]
mod tests;

/// A 256-bit content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn zero() -> Self {
        ContentHash([0u8; 32])
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 8 hex digits, for logs.
    pub fn to_short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ─── Tags ──────────────────────────────────────────────────────────

pub(crate) const TAG_PHASE: u8 = 0x01;
pub(crate) const TAG_ASSIGN: u8 = 0x02;
pub(crate) const TAG_OP: u8 = 0x03;
pub(crate) const TAG_EMIT: u8 = 0x04;
pub(crate) const TAG_COND: u8 = 0x05;
pub(crate) const TAG_LOOP: u8 = 0x06;
pub(crate) const TAG_SYMBOL: u8 = 0x07;
pub(crate) const TAG_CONST: u8 = 0x08;
pub(crate) const TAG_TRANSFORM: u8 = 0x09;

pub(crate) const TAG_PACKING: u8 = 0x20;
pub(crate) const TAG_PIPELINE: u8 = 0x21;
pub(crate) const TAG_PARALLEL: u8 = 0x22;
pub(crate) const TAG_LAYOUT: u8 = 0x23;
pub(crate) const TAG_BINDING: u8 = 0x24;
pub(crate) const TAG_CONTROL: u8 = 0x25;
pub(crate) const TAG_NAMING: u8 = 0x26;

// ─── Hasher ────────────────────────────────────────────────────────

/// Accumulates the canonical byte stream.
#[derive(Default)]
pub struct PlanHasher {
    buf: Vec<u8>,
}

impl PlanHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&self) -> ContentHash {
        ContentHash(*blake3::hash(&self.buf).as_bytes())
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn write_len(&mut self, n: usize) {
        self.write_u32(n as u32);
    }

    /// Length-prefixed so adjacent strings cannot run together.
    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub(crate) fn write_opt_u32(&mut self, v: Option<u32>) {
        match v {
            Some(v) => {
                self.write_u8(1);
                self.write_u32(v);
            }
            None => self.write_u8(0),
        }
    }
}
