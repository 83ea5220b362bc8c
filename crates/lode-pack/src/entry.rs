//! Pack entry header codec.
//!
//! Every entry starts with a type-and-size varint: bits 6-4 of the first
//! byte carry the numeric object kind, bits 3-0 the low nibble of the
//! inflated size, and the continuation bit extends the size seven bits at
//! a time. Delta entries carry an extra base reference between the header
//! and the compressed payload.

use lode_types::{ObjectId, ObjectKind, OBJECT_ID_LEN};

use crate::error::{PackError, PackResult};

/// What a pack entry contains: a complete object or a delta against a base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackEntryKind {
    /// Complete object with its full (compressed) data.
    Base(ObjectKind),
    /// Delta against the object starting at an earlier absolute offset.
    OfsDelta { base_offset: u64 },
    /// Delta against the object named by id.
    RefDelta { base: ObjectId },
}

/// Decoded entry header: the entry kind, the declared inflated size of the
/// payload, and where the compressed stream begins.
#[derive(Clone, Copy, Debug)]
pub struct PackEntryHeader {
    pub kind: PackEntryKind,
    pub size: u64,
    pub data_offset: usize,
}

/// Decode the type-and-size header of the entry starting at `offset`.
pub fn parse_entry_header(data: &[u8], offset: u64) -> PackResult<PackEntryHeader> {
    let corrupt = |reason: &str| PackError::CorruptEntry {
        offset,
        reason: reason.to_string(),
    };

    let mut pos = offset as usize;
    let mut byte = *data.get(pos).ok_or_else(|| corrupt("offset beyond pack data"))?;
    pos += 1;

    let type_bits = (byte >> 4) & 0x07;
    let mut size = u64::from(byte & 0x0f);
    let mut shift = 4;
    while byte & 0x80 != 0 {
        byte = *data.get(pos).ok_or_else(|| corrupt("truncated size varint"))?;
        pos += 1;
        if shift > 57 {
            return Err(corrupt("size varint overflow"));
        }
        size |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }

    let kind = match ObjectKind::from_raw(type_bits) {
        Some(ObjectKind::OfsDelta) => {
            let (distance, consumed) = decode_ofs_delta_base(&data[pos..], offset)?;
            pos += consumed;
            if distance > offset {
                return Err(corrupt("ofs-delta base precedes the pack"));
            }
            PackEntryKind::OfsDelta {
                base_offset: offset - distance,
            }
        }
        Some(ObjectKind::RefDelta) => {
            let end = pos + OBJECT_ID_LEN;
            if end > data.len() {
                return Err(corrupt("truncated ref-delta base id"));
            }
            let base = ObjectId::try_from_slice(&data[pos..end])
                .map_err(|e| corrupt(&e.to_string()))?;
            pos = end;
            PackEntryKind::RefDelta { base }
        }
        Some(kind) if kind.is_loose() => PackEntryKind::Base(kind),
        _ => return Err(corrupt(&format!("invalid entry type {type_bits}"))),
    };

    Ok(PackEntryHeader {
        kind,
        size,
        data_offset: pos,
    })
}

/// Decode the negative-offset varint that follows an ofs-delta header.
///
/// The encoding is big-endian base-128 with an off-by-one per continuation
/// byte, so consecutive lengths do not overlap in value.
fn decode_ofs_delta_base(data: &[u8], entry_offset: u64) -> PackResult<(u64, usize)> {
    let corrupt = |reason: &str| PackError::CorruptEntry {
        offset: entry_offset,
        reason: reason.to_string(),
    };

    let mut pos = 0;
    let mut byte = *data.get(pos).ok_or_else(|| corrupt("truncated ofs-delta offset"))?;
    pos += 1;
    let mut value = u64::from(byte & 0x7f);
    while byte & 0x80 != 0 {
        byte = *data.get(pos).ok_or_else(|| corrupt("truncated ofs-delta offset"))?;
        pos += 1;
        value = value
            .checked_add(1)
            .and_then(|v| v.checked_shl(7))
            .ok_or_else(|| corrupt("ofs-delta offset overflow"))?
            | u64::from(byte & 0x7f);
    }
    Ok((value, pos))
}

/// Decode a plain little-endian base-128 varint (used by delta payload
/// headers for the source and target sizes).
pub(crate) fn decode_varint(data: &[u8]) -> PackResult<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        if shift > 63 {
            break;
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(PackError::CorruptDelta("truncated size varint".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_base_entry() {
        // blob (type 3), size 5: 0b0011_0101
        let header = parse_entry_header(&[0x35, 0xff], 0).unwrap();
        assert_eq!(header.kind, PackEntryKind::Base(ObjectKind::Blob));
        assert_eq!(header.size, 5);
        assert_eq!(header.data_offset, 1);
    }

    #[test]
    fn multi_byte_size() {
        // commit (type 1), size 0b1_0101_0000 = 336:
        // first byte: cont|001|0000, second byte: 0b0010101 << 4
        let header = parse_entry_header(&[0x90, 0x15], 0).unwrap();
        assert_eq!(header.kind, PackEntryKind::Base(ObjectKind::Commit));
        assert_eq!(header.size, 336);
        assert_eq!(header.data_offset, 2);
    }

    #[test]
    fn ref_delta_carries_base_id() {
        let mut data = vec![0x75]; // ref-delta (type 7), size 5
        data.extend_from_slice(&[0xaa; 20]);
        let header = parse_entry_header(&data, 0).unwrap();
        assert_eq!(
            header.kind,
            PackEntryKind::RefDelta {
                base: ObjectId::from_raw([0xaa; 20])
            }
        );
        assert_eq!(header.data_offset, 21);
    }

    #[test]
    fn ofs_delta_single_byte() {
        // entry at offset 100, delta base 10 bytes back
        let mut data = vec![0u8; 100];
        data.push(0x65); // ofs-delta (type 6), size 5
        data.push(10);
        let header = parse_entry_header(&data, 100).unwrap();
        assert_eq!(header.kind, PackEntryKind::OfsDelta { base_offset: 90 });
    }

    #[test]
    fn ofs_delta_two_byte_offset() {
        // two-byte encoding: (b0 & 0x7f + 1) << 7 | b1; 0x80,0x00 -> 128
        let mut data = vec![0u8; 200];
        data.push(0x65);
        data.push(0x80);
        data.push(0x00);
        let header = parse_entry_header(&data, 200).unwrap();
        assert_eq!(header.kind, PackEntryKind::OfsDelta { base_offset: 72 });
    }

    #[test]
    fn base_before_pack_start_is_corrupt() {
        let data = [0x65, 0x09]; // entry at 0 claiming base 9 bytes back
        assert!(matches!(
            parse_entry_header(&data, 0),
            Err(PackError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn reserved_types_rejected() {
        // type 0 and type 5 are reserved
        assert!(parse_entry_header(&[0x05], 0).is_err());
        assert!(parse_entry_header(&[0x55], 0).is_err());
    }

    #[test]
    fn truncated_header_rejected() {
        assert!(parse_entry_header(&[0x95], 0).is_err()); // continuation, no next byte
        assert!(parse_entry_header(&[], 0).is_err());
    }

    #[test]
    fn plain_varint_roundtrip() {
        assert_eq!(decode_varint(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_varint(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(decode_varint(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_varint(&[0xff, 0x01]).unwrap(), (255, 2));
        assert!(decode_varint(&[0x80]).is_err());
    }
}
