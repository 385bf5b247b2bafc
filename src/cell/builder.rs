//! Bit-level cell construction.
//!
//! The builder accumulates bits and references without bounds checking;
//! `build` validates capacity and produces the immutable [`Cell`]. Each
//! append method encodes exactly one field kind, composed by callers in a
//! fixed order.

use super::{Cell, CellResult};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Append a single bit.
    pub fn append_bit(&mut self, bit: bool) -> &mut Self {
        let byte_index = self.bit_len / 8;
        if byte_index == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte_index] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        self
    }

    /// Append the low `width` bits of `value`, most significant bit first.
    pub fn append_uint(&mut self, value: u64, width: usize) -> &mut Self {
        debug_assert!(width <= 64);
        for i in (0..width).rev() {
            self.append_bit((value >> i) & 1 == 1);
        }
        self
    }

    pub fn append_u8(&mut self, value: u8) -> &mut Self {
        self.append_uint(value as u64, 8)
    }

    pub fn append_u32(&mut self, value: u32) -> &mut Self {
        self.append_uint(value as u64, 32)
    }

    pub fn append_u64(&mut self, value: u64) -> &mut Self {
        self.append_uint(value, 64)
    }

    pub fn append_i8(&mut self, value: i8) -> &mut Self {
        self.append_uint(value as u8 as u64, 8)
    }

    /// Append raw bytes as 8 bits each.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for b in bytes {
            self.append_u8(*b);
        }
        self
    }

    /// Append a variable-length coin amount: a 4-bit byte-length prefix
    /// followed by the minimal big-endian representation. Zero encodes as
    /// length 0 with no value bytes.
    pub fn append_coins(&mut self, amount: u64) -> &mut Self {
        if amount == 0 {
            return self.append_uint(0, 4);
        }
        let byte_len = (64 - amount.leading_zeros() as usize + 7) / 8;
        self.append_uint(byte_len as u64, 4);
        self.append_uint(amount, byte_len * 8)
    }

    /// Append a standard internal address: `addr_std$10`, no anycast,
    /// 8-bit workchain, 256-bit account id.
    pub fn append_addr_std(&mut self, workchain: i8, account_id: &[u8; 32]) -> &mut Self {
        self.append_uint(0b100, 3);
        self.append_i8(workchain);
        self.append_bytes(account_id)
    }

    /// Append the empty address `addr_none$00`.
    pub fn append_addr_none(&mut self) -> &mut Self {
        self.append_uint(0, 2)
    }

    /// Append another cell's data bits and references inline.
    pub fn append_cell(&mut self, cell: &Cell) -> &mut Self {
        for i in 0..cell.bit_len() {
            self.append_bit(cell.bit(i));
        }
        for r in cell.refs() {
            self.refs.push(r.clone());
        }
        self
    }

    /// Append a reference to a child cell.
    pub fn append_ref(&mut self, cell: Arc<Cell>) -> &mut Self {
        self.refs.push(cell);
        self
    }

    /// Validate capacity and produce the cell.
    pub fn build(self) -> CellResult<Cell> {
        Cell::new(self.data, self.bit_len, self.refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellError;

    #[test]
    fn test_uint_packing() {
        let mut b = CellBuilder::new();
        b.append_uint(0x0f8a7ea5, 32);
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 32);
        assert_eq!(cell.data(), &[0x0f, 0x8a, 0x7e, 0xa5]);
        assert_eq!(
            hex::encode(cell.repr_hash()),
            "1204352a90cd2724c2313d6537d71d7975bbd9b9295600042cfa134bd4d45326"
        );
    }

    #[test]
    fn test_coins_matches_explicit_encoding() {
        let mut a = CellBuilder::new();
        a.append_coins(10);
        let mut b = CellBuilder::new();
        b.append_uint(1, 4).append_uint(10, 8);
        assert_eq!(a.build().unwrap(), b.build().unwrap());

        let mut zero = CellBuilder::new();
        zero.append_coins(0);
        let mut nibble = CellBuilder::new();
        nibble.append_uint(0, 4);
        assert_eq!(zero.build().unwrap(), nibble.build().unwrap());
    }

    #[test]
    fn test_coins_width() {
        // 1_000_000_000 needs four bytes
        let mut b = CellBuilder::new();
        b.append_coins(1_000_000_000);
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 4 + 32);
    }

    #[test]
    fn test_addr_std_layout() {
        let mut b = CellBuilder::new();
        b.append_addr_std(0, &[0u8; 32]);
        let cell = b.build().unwrap();
        // 3 tag bits + 8 workchain bits + 256 account bits
        assert_eq!(cell.bit_len(), 267);

        let mut n = CellBuilder::new();
        n.append_addr_none();
        assert_eq!(n.build().unwrap().bit_len(), 2);
    }

    #[test]
    fn test_append_cell_inlines_bits_and_refs() {
        let leaf = Arc::new(CellBuilder::new().build().unwrap());
        let mut inner = CellBuilder::new();
        inner.append_uint(0b101, 3).append_ref(leaf);
        let inner = inner.build().unwrap();

        let mut outer = CellBuilder::new();
        outer.append_bit(true).append_cell(&inner);
        let outer = outer.build().unwrap();

        assert_eq!(outer.bit_len(), 4);
        assert_eq!(outer.data(), &[0b1101_0000]);
        assert_eq!(outer.refs().len(), 1);
    }

    #[test]
    fn test_build_rejects_overflow() {
        let mut b = CellBuilder::new();
        for _ in 0..1024 {
            b.append_bit(false);
        }
        assert!(matches!(b.build(), Err(CellError::CellOverflow(1024))));
    }
}
