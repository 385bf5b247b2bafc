//! Bag-of-cells wire codec.
//!
//! Single-root serialization without index or checksum, matching the layout
//! the wallet contract tooling expects: a fixed magic, 2-byte cell counts
//! and offsets, then each cell as descriptor bytes, tagged data and big-endian
//! reference indices. Cell order is a stack traversal from the root with
//! subtree deduplication by representation hash. The parser additionally
//! accepts index and checksum sections so foreign bags can be loaded.

use super::{Cell, CellError, CellResult, MAX_REFS};
use std::collections::HashMap;
use std::sync::Arc;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC: u8 = 0x40;

/// Serialize a cell tree into a single-root bag of cells.
pub fn serialize(root: &Cell) -> CellResult<Vec<u8>> {
    let mut order: Vec<&Cell> = Vec::new();
    let mut index: HashMap<[u8; 32], u16> = HashMap::new();

    let mut stack: Vec<&Cell> = vec![root];
    while let Some(cell) = stack.pop() {
        let hash = cell.repr_hash();
        if index.contains_key(&hash) {
            continue;
        }
        if order.len() == usize::from(u16::MAX) {
            return Err(CellError::BocTooLarge);
        }
        index.insert(hash, order.len() as u16);
        order.push(cell);
        for r in cell.refs() {
            stack.push(r.as_ref());
        }
    }

    let mut cells_data = Vec::new();
    for cell in &order {
        cells_data.push(cell.d1());
        cells_data.push(cell.d2());
        cells_data.extend_from_slice(&cell.data_with_completion_tag());
        for r in cell.refs() {
            cells_data.extend_from_slice(&index[&r.repr_hash()].to_be_bytes());
        }
    }
    if cells_data.len() > usize::from(u16::MAX) {
        return Err(CellError::BocTooLarge);
    }

    let mut out = Vec::with_capacity(15 + cells_data.len());
    out.extend_from_slice(&BOC_MAGIC);
    out.push(0x02); // flags clear, 2-byte reference indices
    out.push(0x02); // 2-byte total-size field
    out.extend_from_slice(&(order.len() as u16).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // roots
    out.extend_from_slice(&0u16.to_be_bytes()); // absent
    out.extend_from_slice(&(cells_data.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // root index
    out.extend_from_slice(&cells_data);
    Ok(out)
}

/// Parse a bag of cells and return its first root.
pub fn parse(data: &[u8]) -> CellResult<Arc<Cell>> {
    if data.len() < 6 {
        return Err(CellError::BocTooShort);
    }
    if data[..4] != BOC_MAGIC {
        return Err(CellError::BadMagic);
    }

    let flags = data[4];
    let ref_size = (flags & 0x07) as usize;
    if ref_size == 0 || ref_size > 4 {
        return Err(CellError::UnsupportedBoc("reference index size"));
    }
    let off_size = data[5] as usize;
    if off_size == 0 || off_size > 8 {
        return Err(CellError::UnsupportedBoc("offset size"));
    }

    let mut body = data;
    if flags & FLAG_HAS_CRC != 0 {
        if body.len() < 10 {
            return Err(CellError::BocTooShort);
        }
        let (payload, tail) = body.split_at(body.len() - 4);
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        if crc32c(payload) != expected {
            return Err(CellError::ChecksumMismatch);
        }
        body = payload;
    }

    let mut reader = Reader {
        data: body,
        pos: 6,
    };

    let cell_count = reader.read_uint(ref_size)? as usize;
    let root_count = reader.read_uint(ref_size)? as usize;
    let absent_count = reader.read_uint(ref_size)? as usize;
    let _total_size = reader.read_uint(off_size)?;

    if root_count == 0 {
        return Err(CellError::UnsupportedBoc("no root cell"));
    }
    if absent_count != 0 {
        return Err(CellError::UnsupportedBoc("absent cells"));
    }

    // Every root index occupies ref_size bytes and every cell at least
    // two descriptor bytes, so counts the remaining input cannot hold
    // are malformed. Checked before the counts size any allocation.
    let remaining = body.len() - reader.pos;
    let minimum = root_count
        .saturating_mul(ref_size)
        .saturating_add(cell_count.saturating_mul(2));
    if minimum > remaining {
        return Err(CellError::BocTooShort);
    }

    let mut root_indices = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        root_indices.push(reader.read_uint(ref_size)? as usize);
    }
    let root_index = root_indices[0];
    if root_index >= cell_count {
        return Err(CellError::BadReference(root_index));
    }

    if flags & FLAG_HAS_INDEX != 0 {
        reader.skip(cell_count * off_size)?;
    }

    struct RawCell {
        data: Vec<u8>,
        bit_len: usize,
        refs: Vec<usize>,
    }

    let mut raw: Vec<RawCell> = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        let d1 = reader.read_uint(1)? as usize;
        if d1 > MAX_REFS {
            return Err(CellError::UnsupportedBoc("exotic or leveled cell"));
        }
        let d2 = reader.read_uint(1)? as usize;
        let byte_len = (d2 + 1) / 2;
        let mut cell_data = reader.read_bytes(byte_len)?.to_vec();

        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            let last = *cell_data.last().ok_or(CellError::InvalidPadding)?;
            if last == 0 {
                return Err(CellError::InvalidPadding);
            }
            let tag_pos = last.trailing_zeros() as usize;
            let partial_bits = 7 - tag_pos;
            if partial_bits == 0 {
                cell_data.pop();
            }
            (byte_len - 1) * 8 + partial_bits
        };

        let mut refs = Vec::with_capacity(d1);
        for _ in 0..d1 {
            let r = reader.read_uint(ref_size)? as usize;
            if r >= cell_count || r == i {
                return Err(CellError::BadReference(i));
            }
            refs.push(r);
        }

        raw.push(RawCell {
            data: cell_data,
            bit_len,
            refs,
        });
    }

    // Resolve cells whose references are all built, repeating until the root
    // is available; a pass without progress means a reference cycle.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    while built[root_index].is_none() {
        let mut progress = false;
        for i in (0..cell_count).rev() {
            if built[i].is_some() {
                continue;
            }
            if raw[i].refs.iter().all(|&r| built[r].is_some()) {
                let refs = raw[i]
                    .refs
                    .iter()
                    .map(|&r| built[r].clone().ok_or(CellError::BadReference(i)))
                    .collect::<CellResult<Vec<_>>>()?;
                let cell = Cell::new(raw[i].data.clone(), raw[i].bit_len, refs)?;
                built[i] = Some(Arc::new(cell));
                progress = true;
            }
        }
        if !progress {
            return Err(CellError::BadReference(root_index));
        }
    }

    built[root_index].clone().ok_or(CellError::BadReference(root_index))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_uint(&mut self, len: usize) -> CellResult<u64> {
        let bytes = self.read_bytes(len)?;
        let mut value = 0u64;
        for b in bytes {
            value = (value << 8) | *b as u64;
        }
        Ok(value)
    }

    fn read_bytes(&mut self, len: usize) -> CellResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(CellError::BocTooShort);
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn skip(&mut self, len: usize) -> CellResult<()> {
        self.read_bytes(len).map(|_| ())
    }
}

/// CRC-32C (Castagnoli), the checksum variant bag-of-cells files carry.
fn crc32c(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for byte in data {
        crc ^= *byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0x82F6_3B78
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;

    #[test]
    fn test_serialize_empty_cell() {
        let cell = CellBuilder::new().build().unwrap();
        let boc = serialize(&cell).unwrap();
        assert_eq!(hex::encode(boc), "b5ee9c720202000100010000000200000000");
    }

    #[test]
    fn test_serialize_shared_subtree() {
        let g = {
            let mut b = CellBuilder::new();
            b.append_u8(7);
            Arc::new(b.build().unwrap())
        };
        let a = {
            let mut b = CellBuilder::new();
            b.append_bit(true).append_ref(g.clone());
            Arc::new(b.build().unwrap())
        };
        let bb = {
            let mut b = CellBuilder::new();
            b.append_bit(false).append_ref(g);
            Arc::new(b.build().unwrap())
        };
        let root = {
            let mut b = CellBuilder::new();
            b.append_uint(5, 3).append_ref(a).append_ref(bb);
            b.build().unwrap()
        };

        let boc = serialize(&root).unwrap();
        assert_eq!(
            hex::encode(&boc),
            "b5ee9c720202000400010000001400000201b00003000101014000020002070101c00002"
        );
        // the shared grandchild serializes once
        assert_eq!(u16::from_be_bytes([boc[6], boc[7]]), 4);

        let parsed = parse(&boc).unwrap();
        assert_eq!(parsed.repr_hash(), root.repr_hash());
    }

    #[test]
    fn test_round_trip_preserves_hash() {
        let leaf = {
            let mut b = CellBuilder::new();
            b.append_u64(0xdead_beef_cafe_f00d);
            Arc::new(b.build().unwrap())
        };
        let root = {
            let mut b = CellBuilder::new();
            b.append_uint(0b1011, 4)
                .append_coins(1_000_000_000)
                .append_ref(leaf);
            b.build().unwrap()
        };

        let boc = serialize(&root).unwrap();
        let parsed = parse(&boc).unwrap();
        assert_eq!(parsed.repr_hash(), root.repr_hash());
        assert_eq!(parsed.bit_len(), root.bit_len());
        assert_eq!(parsed.refs().len(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        assert_eq!(
            parse(&[0xde, 0xad, 0xbe, 0xef, 0x02, 0x02]),
            Err(CellError::BadMagic)
        );
        assert_eq!(parse(&[0xb5, 0xee]), Err(CellError::BocTooShort));
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let cell = CellBuilder::new().build().unwrap();
        let boc = serialize(&cell).unwrap();
        assert_eq!(parse(&boc[..boc.len() - 1]), Err(CellError::BocTooShort));
    }

    #[test]
    fn test_parse_rejects_oversized_counts() {
        // Header claims u32::MAX cells but carries no cell data; the
        // counts must be rejected without sizing anything by them.
        let mut boc = Vec::new();
        boc.extend_from_slice(&BOC_MAGIC);
        boc.push(0x04); // 4-byte reference indices
        boc.push(0x01); // 1-byte offsets
        boc.extend_from_slice(&u32::MAX.to_be_bytes()); // cells
        boc.extend_from_slice(&1u32.to_be_bytes()); // roots
        boc.extend_from_slice(&0u32.to_be_bytes()); // absent
        boc.push(0); // total size
        boc.extend_from_slice(&0u32.to_be_bytes()); // root index
        assert_eq!(boc.len(), 23);
        assert_eq!(parse(&boc), Err(CellError::BocTooShort));
    }

    #[test]
    fn test_crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xE306_9283);
    }

    #[test]
    fn test_parse_checksummed_boc() {
        let cell = {
            let mut b = CellBuilder::new();
            b.append_u32(42);
            b.build().unwrap()
        };
        let mut boc = serialize(&cell).unwrap();
        boc[4] |= FLAG_HAS_CRC;
        let crc = crc32c(&boc);
        boc.extend_from_slice(&crc.to_le_bytes());

        let parsed = parse(&boc).unwrap();
        assert_eq!(parsed.repr_hash(), cell.repr_hash());

        // flipping a payload byte must be caught
        let last = boc.len() - 5;
        boc[last] ^= 0xFF;
        assert_eq!(parse(&boc), Err(CellError::ChecksumMismatch));
    }
}
