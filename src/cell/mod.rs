//! TON Cell Model
//!
//! Cells are the content-addressed data unit of the chain: up to 1023 data
//! bits plus up to 4 references to child cells. Everything the signer
//! produces (transfer payloads, state init, the external message itself) is
//! a tree of cells, identified by its representation hash and shipped as a
//! bag-of-cells (`boc`).

pub mod boc;
pub mod builder;

pub use boc::{parse, serialize};
pub use builder::CellBuilder;

use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Maximum number of data bits a single cell can hold.
pub const MAX_BITS: usize = 1023;
/// Maximum number of child references a single cell can hold.
pub const MAX_REFS: usize = 4;

/// Error types for cell construction and bag-of-cells codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("Cell data overflows {MAX_BITS} bits: {0}")]
    CellOverflow(usize),

    #[error("Cell has too many references: {0}")]
    TooManyRefs(usize),

    #[error("Cell data length does not match bit length")]
    DataLengthMismatch,

    #[error("Bag of cells truncated")]
    BocTooShort,

    #[error("Bad bag of cells magic")]
    BadMagic,

    #[error("Unsupported bag of cells layout: {0}")]
    UnsupportedBoc(&'static str),

    #[error("Bag of cells checksum mismatch")]
    ChecksumMismatch,

    #[error("Unresolvable cell reference at index {0}")]
    BadReference(usize),

    #[error("Invalid completion tag in cell data")]
    InvalidPadding,

    #[error("Bag of cells exceeds single-root serialization limits")]
    BocTooLarge,
}

pub type CellResult<T> = Result<T, CellError>;

/// An immutable cell: packed data bits plus child references.
///
/// The representation hash and depth are fixed at construction, so a built
/// cell is a plain value that can be shared freely across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Build a cell from packed data bits (most significant bit first) and
    /// child references. `data` must be exactly `ceil(bit_len / 8)` bytes;
    /// unused low bits of the final byte are cleared.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> CellResult<Self> {
        if bit_len > MAX_BITS {
            return Err(CellError::CellOverflow(bit_len));
        }
        if refs.len() > MAX_REFS {
            return Err(CellError::TooManyRefs(refs.len()));
        }
        if data.len() != (bit_len + 7) / 8 {
            return Err(CellError::DataLengthMismatch);
        }
        if bit_len % 8 != 0 {
            let keep = 0xFFu8 << (8 - bit_len % 8);
            if let Some(last) = data.last_mut() {
                *last &= keep;
            }
        }

        let depth = refs
            .iter()
            .map(|r| r.depth)
            .max()
            .map_or(0, |d| d.saturating_add(1));

        let mut cell = Self {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_repr_hash();
        Ok(cell)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// The cell's representation hash, the value that gets signed.
    pub fn repr_hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Tree depth: 0 for a leaf, else one more than the deepest child.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// First descriptor byte: the reference count (ordinary cells only).
    pub fn d1(&self) -> u8 {
        self.refs.len() as u8
    }

    /// Second descriptor byte: `floor(bits / 8) + ceil(bits / 8)`. An odd
    /// value marks a final partial byte carrying a completion tag.
    pub fn d2(&self) -> u8 {
        ((self.bit_len / 8) + ((self.bit_len + 7) / 8)) as u8
    }

    /// Data bytes with the completion tag applied: when the bit length is
    /// not a whole number of bytes, a single 1 bit then zeros pad the final
    /// byte.
    pub fn data_with_completion_tag(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.bit_len % 8 != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 1 << (7 - self.bit_len % 8);
            }
        }
        out
    }

    pub(crate) fn bit(&self, index: usize) -> bool {
        let byte = self.data[index / 8];
        (byte >> (7 - index % 8)) & 1 == 1
    }

    fn compute_repr_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([self.d1(), self.d2()]);
        hasher.update(self.data_with_completion_tag());
        for r in &self.refs {
            hasher.update(r.depth.to_be_bytes());
        }
        for r in &self.refs {
            hasher.update(r.hash);
        }
        hasher.finalize().into()
    }
}
